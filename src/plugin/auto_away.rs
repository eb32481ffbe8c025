//! Marks the bot away when its owners go quiet.
//!
//! Owner activity anywhere the bot can see resets an idle clock; timer ticks compare the
//! clock against the configured threshold. The plugin only ever clears an away status it set
//! itself, so a manually-set away message survives owner activity.

use std::sync::Mutex;
use std::time::{Duration, Instant};

use tracing::debug;

use crate::plugin::prelude::*;

pub struct AutoAway {
    state: Mutex<State>,
}

struct State {
    last_activity: Instant,
    marked_away: bool,
}

const SETTINGS: &[Setting] = &[
    Setting {
        name: "enabled",
        default: "on",
        description: "whether idle tracking is active",
    },
    Setting {
        name: "idle_timeout",
        default: "600",
        description: "seconds of owner silence before going away",
    },
    Setting {
        name: "message",
        default: "idle",
        description: "the away message to set",
    },
];

#[async_trait]
impl Plugin for AutoAway {
    fn name() -> Name {
        Name::from("auto_away")
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
        AutoAway {
            state: Mutex::new(State {
                last_activity: Instant::now(),
                marked_away: false,
            }),
        }
    }

    async fn handle_message(
        &self,
        ctx: &Context,
        client: &Client,
        message: &Message,
    ) -> Result<(), IotaError> {
        let Command::PRIVMSG(..) = message.command else {
            return Ok(());
        };
        let Some(nick) = message.source_nickname() else {
            return Ok(());
        };

        if !ctx.config.irc.is_owner(nick) {
            return Ok(());
        }

        let mut state = self.state.lock().expect("state lock poisoned");
        state.last_activity = Instant::now();

        if state.marked_away {
            state.marked_away = false;
            debug!("owner is active again, clearing away status");
            client.send(Command::AWAY(None))?;
        }

        Ok(())
    }

    async fn handle_tick(&self, ctx: &Context, client: &Client) -> Result<(), IotaError> {
        if !ctx.settings.bool_value("auto_away.enabled") {
            return Ok(());
        }

        let threshold = ctx
            .settings
            .int_value("auto_away.idle_timeout")
            .and_then(|value| u64::try_from(value).ok())
            .map_or(Duration::from_secs(600), Duration::from_secs);

        let mut state = self.state.lock().expect("state lock poisoned");

        if should_mark_away(state.marked_away, state.last_activity.elapsed(), threshold) {
            state.marked_away = true;

            let message = ctx
                .settings
                .get("auto_away.message")
                .unwrap_or_else(|| "idle".to_string());

            debug!(?threshold, "owners idle, setting away status");
            client.send(Command::AWAY(Some(message)))?;
        }

        Ok(())
    }
}

/// Whether a tick should transition the bot to away.
fn should_mark_away(already_away: bool, idle: Duration, threshold: Duration) -> bool {
    !already_away && idle >= threshold
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn it_should_mark_away_after_threshold() {
        let threshold = Duration::from_secs(600);

        assert!(!should_mark_away(false, Duration::from_secs(10), threshold));
        assert!(should_mark_away(false, Duration::from_secs(600), threshold));
        // Once away, stay away until activity clears the flag.
        assert!(!should_mark_away(true, Duration::from_secs(9000), threshold));
    }
}
