//! Forwards highlights and private messages to a push notification endpoint.
//!
//! Deliveries are signed so the receiving service can verify them: the request carries a
//! timestamp and a random nonce, and an `X-Signature` header holding the hex-encoded SHA-256
//! over the shared secret and the payload fields. Notifications are rate limited and can be
//! restricted to the times the bot is marked away, which the plugin tracks from the server's
//! away numerics.

use std::sync::Mutex;
use std::time::{Duration, Instant};

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use irc::proto::Response;
use rand::RngExt;
use sha2::{Digest, Sha256};
use time::OffsetDateTime;
use tracing::{debug, warn};

use crate::plugin::prelude::*;
use crate::process::TaskSlot;

pub struct Pushover {
    slot: TaskSlot,
    last_notification: Mutex<Option<Instant>>,
    away: Mutex<bool>,
}

const SETTINGS: &[Setting] = &[
    Setting {
        name: "token",
        default: "",
        description: "application token for the push service",
    },
    Setting {
        name: "user",
        default: "",
        description: "user key for the push service",
    },
    Setting {
        name: "secret",
        default: "",
        description: "shared secret used to sign deliveries",
    },
    Setting {
        name: "endpoint",
        default: "https://api.pushover.net/1/messages.json",
        description: "where deliveries are posted",
    },
    Setting {
        name: "away_only",
        default: "off",
        description: "only forward while marked away",
    },
    Setting {
        name: "subscribed_channels",
        default: "",
        description: "when non-empty, only these channels are forwarded",
    },
    Setting {
        name: "ignored_channels",
        default: "",
        description: "channels never forwarded",
    },
    Setting {
        name: "min_notify_interval",
        default: "60",
        description: "minimum seconds between notifications",
    },
];

#[async_trait]
impl Plugin for Pushover {
    fn name() -> Name {
        Name::from("pushover")
    }

    fn author() -> Author {
        Author::from("Mikkel Kroman <mk@maero.dk>")
    }

    fn version() -> Version {
        Version::from("0.3")
    }

    fn settings() -> &'static [Setting] {
        SETTINGS
    }

    fn new(_ctx: &Context) -> Self {
        Pushover {
            slot: TaskSlot::new(),
            last_notification: Mutex::new(None),
            away: Mutex::new(false),
        }
    }

    async fn handle_message(
        &self,
        ctx: &Context,
        client: &Client,
        message: &Message,
    ) -> Result<(), IotaError> {
        match message.command {
            Command::Response(Response::RPL_NOWAWAY, _) => {
                *self.away.lock().expect("away lock poisoned") = true;
                return Ok(());
            }
            Command::Response(Response::RPL_UNAWAY, _) => {
                *self.away.lock().expect("away lock poisoned") = false;
                return Ok(());
            }
            Command::PRIVMSG(..) => {}
            _ => return Ok(()),
        }

        let Command::PRIVMSG(ref target, ref text) = message.command else {
            return Ok(());
        };
        let Some(nick) = message.source_nickname() else {
            return Ok(());
        };

        let own_nick = client.current_nickname();

        if nick == own_nick {
            return Ok(());
        }

        let is_private = target == own_nick;

        if !is_private && !mentions(text, own_nick) {
            return Ok(());
        }

        if !is_private && !channel_wanted(
            target,
            &ctx.settings.list_value("pushover.subscribed_channels"),
            &ctx.settings.list_value("pushover.ignored_channels"),
        ) {
            return Ok(());
        }

        if ctx.settings.bool_value("pushover.away_only")
            && !*self.away.lock().expect("away lock poisoned")
        {
            return Ok(());
        }

        let token = ctx.settings.get("pushover.token").unwrap_or_default();
        let user = ctx.settings.get("pushover.user").unwrap_or_default();

        if token.is_empty() || user.is_empty() {
            debug!("pushover.token or pushover.user is not set, not forwarding");
            return Ok(());
        }

        let min_interval = ctx
            .settings
            .int_value("pushover.min_notify_interval")
            .and_then(|value| u64::try_from(value).ok())
            .map_or(Duration::from_secs(60), Duration::from_secs);

        {
            let mut last = self.last_notification.lock().expect("lock poisoned");

            if last.is_some_and(|at| at.elapsed() < min_interval) {
                debug!("notification rate limit hit, dropping");
                return Ok(());
            }

            *last = Some(Instant::now());
        }

        let secret = ctx.settings.get("pushover.secret").unwrap_or_default();
        let endpoint = ctx
            .settings
            .get("pushover.endpoint")
            .unwrap_or_else(|| "https://api.pushover.net/1/messages.json".to_string());

        let timestamp = OffsetDateTime::now_utc().unix_timestamp();
        let nonce = nonce();
        let body = format!("{nick} on {target}: {text}");
        let signature = sign(&secret, timestamp, &nonce, &body);

        let payload = serde_json::json!({
            "token": token,
            "user": user,
            "title": format!("{nick} on {target}"),
            "message": text,
            "timestamp": timestamp,
            "nonce": nonce,
        });

        let http = ctx.http.clone();

        self.slot.replace(tokio::spawn(async move {
            let result = http
                .post(&endpoint)
                .header("X-Signature", signature)
                .json(&payload)
                .send()
                .await;

            match result {
                Ok(response) if !response.status().is_success() => {
                    warn!(status = %response.status(), "push delivery was rejected");
                }
                Ok(_) => debug!("push delivery accepted"),
                Err(err) => warn!(error = ?err, "push delivery failed"),
            }
        }));

        Ok(())
    }
}

/// Whether `text` mentions `nick`, ignoring case.
fn mentions(text: &str, nick: &str) -> bool {
    text.to_lowercase().contains(&nick.to_lowercase())
}

/// Applies the subscription and ignore lists to a channel name.
fn channel_wanted(channel: &str, subscribed: &[String], ignored: &[String]) -> bool {
    if ignored.iter().any(|name| name == channel) {
        return false;
    }

    subscribed.is_empty() || subscribed.iter().any(|name| name == channel)
}

/// Computes the delivery signature: SHA-256 over the secret, timestamp, nonce, and payload.
fn sign(secret: &str, timestamp: i64, nonce: &str, body: &str) -> String {
    let mut hasher = Sha256::new();

    hasher.update(secret.as_bytes());
    hasher.update(timestamp.to_string().as_bytes());
    hasher.update(nonce.as_bytes());
    hasher.update(body.as_bytes());

    hex::encode(hasher.finalize())
}

/// A random URL-safe nonce for each delivery.
fn nonce() -> String {
    let bytes: [u8; 12] = rand::rng().random();

    URL_SAFE_NO_PAD.encode(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn it_should_detect_mentions() {
        assert!(mentions("hey iota, ping", "iota"));
        assert!(mentions("HEY IOTA", "iota"));
        assert!(!mentions("nothing to see", "iota"));
    }

    #[test]
    fn it_should_filter_channels() {
        let subscribed = vec!["#rust".to_string()];
        let ignored = vec!["#spam".to_string()];

        assert!(channel_wanted("#rust", &subscribed, &ignored));
        assert!(!channel_wanted("#other", &subscribed, &ignored));
        assert!(!channel_wanted("#spam", &[], &ignored));
        assert!(channel_wanted("#anything", &[], &[]));
    }

    #[test]
    fn it_should_sign_deterministically() {
        let signature = sign("secret", 1_700_000_000, "nonce", "body");

        assert_eq!(signature.len(), 64);
        assert!(signature.chars().all(|c| c.is_ascii_hexdigit()));
        assert_eq!(signature, sign("secret", 1_700_000_000, "nonce", "body"));
        assert_ne!(signature, sign("other", 1_700_000_000, "nonce", "body"));
        assert_ne!(signature, sign("secret", 1_700_000_001, "nonce", "body"));
        assert_ne!(signature, sign("secret", 1_700_000_000, "other", "body"));
    }

    #[test]
    fn it_should_generate_unique_nonces() {
        assert_ne!(nonce(), nonce());
    }
}
