//! Announces the currently playing track.
//!
//! The track information comes from an external player status command such as `mpc current`
//! or `cmus-remote -Q`, run through the subprocess module. A new `.np` while a lookup is
//! still running replaces it.

use std::time::Duration;

use tracing::warn;

use crate::consts;
use crate::plugin::prelude::*;
use crate::process::{self, TaskSlot};

pub struct NowPlaying {
    command: Trigger,
    slot: TaskSlot,
}

const SETTINGS: &[Setting] = &[
    Setting {
        name: "status_command",
        default: "mpc current",
        description: "command that prints the playing track on its first line",
    },
    Setting {
        name: "timeout",
        default: "10",
        description: "seconds before the status command is killed",
    },
];

#[async_trait]
impl Plugin for NowPlaying {
    fn name() -> Name {
        Name::from("now_playing")
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
        NowPlaying {
            command: Trigger::new(".np"),
            slot: TaskSlot::new(),
        }
    }

    async fn handle_message(
        &self,
        ctx: &Context,
        client: &Client,
        message: &Message,
    ) -> Result<(), IotaError> {
        if let Command::PRIVMSG(ref channel, ref text) = message.command
            && self.command.parse(text).is_some()
        {
            let command_line = ctx
                .settings
                .get("now_playing.status_command")
                .unwrap_or_else(|| "mpc current".to_string());
            let timeout = ctx
                .settings
                .int_value("now_playing.timeout")
                .and_then(|value| u64::try_from(value).ok())
                .map_or(consts::PROCESS_TIMEOUT, Duration::from_secs);

            let sender = client.sender();
            let channel = channel.clone();

            self.slot.replace(tokio::spawn(async move {
                let line = match process::run(&command_line, timeout).await {
                    Ok(output) => match output.first_line() {
                        Some(line) if output.success => {
                            format!("\x0310>\x0f\x02 Now playing:\x02\x0310 {line}")
                        }
                        _ => "\x0310> Nothing is playing".to_string(),
                    },
                    Err(err) => {
                        warn!(error = ?err, "player status command failed");
                        "\x0310> Could not query the player".to_string()
                    }
                };

                if let Err(err) = sender.send_privmsg(&channel, line) {
                    warn!(error = ?err, "could not announce track");
                }
            }));
        }

        Ok(())
    }
}
