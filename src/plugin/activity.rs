//! Tracks how lively each channel is.
//!
//! Every channel message bumps an in-memory counter and timestamp; `.active` prints the
//! channels ordered by most recent activity. The counters live and die with the process.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Instant;

use crate::plugin::prelude::*;

pub struct Activity {
    command: Trigger,
    channels: Mutex<HashMap<String, ChannelActivity>>,
}

struct ChannelActivity {
    messages: u64,
    last: Instant,
}

const SETTINGS: &[Setting] = &[Setting {
    name: "max_channels",
    default: "8",
    description: "how many channels `.active` lists",
}];

#[async_trait]
impl Plugin for Activity {
    fn name() -> Name {
        Name::from("activity")
    }

    fn author() -> Author {
        Author::from("Mikkel Kroman <mk@maero.dk>")
    }

    fn version() -> Version {
        Version::from("0.1")
    }

    fn settings() -> &'static [Setting] {
        SETTINGS
    }

    fn new(_ctx: &Context) -> Self {
        Activity {
            command: Trigger::new(".active"),
            channels: Mutex::new(HashMap::new()),
        }
    }

    async fn handle_message(
        &self,
        ctx: &Context,
        client: &Client,
        message: &Message,
    ) -> Result<(), IotaError> {
        let Command::PRIVMSG(ref target, ref text) = message.command else {
            return Ok(());
        };

        if target.starts_with('#') {
            let mut channels = self.channels.lock().expect("channels lock poisoned");
            let entry = channels
                .entry(target.clone())
                .or_insert_with(|| ChannelActivity {
                    messages: 0,
                    last: Instant::now(),
                });

            entry.messages += 1;
            entry.last = Instant::now();
        }

        if self.command.parse(text).is_some() {
            let max_channels = ctx
                .settings
                .int_value("activity.max_channels")
                .and_then(|value| usize::try_from(value).ok())
                .unwrap_or(8);

            let mut entries: Vec<(String, u64, u64)> = {
                let channels = self.channels.lock().expect("channels lock poisoned");

                channels
                    .iter()
                    .map(|(name, activity)| {
                        (name.clone(), activity.messages, activity.last.elapsed().as_secs())
                    })
                    .collect()
            };

            sort_entries(&mut entries);
            entries.truncate(max_channels);

            let report = if entries.is_empty() {
                "No channel activity yet".to_string()
            } else {
                format!("\x0310> {}", format_entries(&entries))
            };

            client.send_privmsg(target, report)?;
        }

        Ok(())
    }
}

/// Orders channels by recency, then message count, then name.
fn sort_entries(entries: &mut [(String, u64, u64)]) {
    entries.sort_by(|a, b| a.2.cmp(&b.2).then(b.1.cmp(&a.1)).then(a.0.cmp(&b.0)));
}

fn format_entries(entries: &[(String, u64, u64)]) -> String {
    entries
        .iter()
        .map(|(name, messages, secs_ago)| {
            format!("{name}:\x0f {messages} msgs, {} ago\x0310", format_ago(*secs_ago))
        })
        .collect::<Vec<_>>()
        .join(", ")
}

/// Renders an age in the largest sensible unit.
fn format_ago(secs: u64) -> String {
    match secs {
        0..=59 => format!("{secs}s"),
        60..=3599 => format!("{}m", secs / 60),
        3600..=86_399 => format!("{}h", secs / 3600),
        _ => format!("{}d", secs / 86_400),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn it_should_sort_by_recency_then_count() {
        let mut entries = vec![
            ("#slow".to_string(), 100, 3600),
            ("#busy".to_string(), 50, 10),
            ("#quiet".to_string(), 2, 10),
        ];

        sort_entries(&mut entries);

        let names: Vec<&str> = entries.iter().map(|(name, ..)| name.as_str()).collect();
        assert_eq!(names, vec!["#busy", "#quiet", "#slow"]);
    }

    #[test]
    fn it_should_format_ages() {
        assert_eq!(format_ago(0), "0s");
        assert_eq!(format_ago(59), "59s");
        assert_eq!(format_ago(60), "1m");
        assert_eq!(format_ago(3700), "1h");
        assert_eq!(format_ago(200_000), "2d");
    }
}
