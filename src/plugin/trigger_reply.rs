//! Replies automatically when a stored trigger matches a channel message.
//!
//! Triggers live in the database and are managed from IRC with `.trigger`. A pattern is
//! matched as a case-insensitive regular expression; patterns that fail to parse fall back to
//! a plain substring match, so `c++` keeps working as a trigger.

use regex::RegexBuilder;

use crate::plugin::prelude::*;

pub struct TriggerReply {
    command: Trigger,
}

#[async_trait]
impl Plugin for TriggerReply {
    fn name() -> Name {
        Name::from("trigger_reply")
    }

    fn author() -> Author {
        Author::from("Mikkel Kroman <mk@maero.dk>")
    }

    fn version() -> Version {
        Version::from("0.2")
    }

    fn new(_ctx: &Context) -> Self {
        TriggerReply {
            command: Trigger::new(".trigger"),
        }
    }

    async fn handle_message(
        &self,
        ctx: &Context,
        client: &Client,
        message: &Message,
    ) -> Result<(), IotaError> {
        let Command::PRIVMSG(ref channel, ref text) = message.command else {
            return Ok(());
        };
        let Some(nick) = message.source_nickname() else {
            return Ok(());
        };

        // Never reply to our own output, a trigger matching a reply would loop forever.
        if nick == client.current_nickname() {
            return Ok(());
        }

        if let Some(args) = self.command.parse(text) {
            return self.handle_command(ctx, client, message, args).await;
        }

        let ignored: Vec<(String,)> = sqlx::query_as("SELECT channel FROM trigger_ignores")
            .fetch_all(&ctx.db)
            .await?;

        if ignored.iter().any(|(ignored,)| ignored == channel) {
            return Ok(());
        }

        let triggers: Vec<(String, String)> = sqlx::query_as("SELECT pattern, reply FROM triggers")
            .fetch_all(&ctx.db)
            .await?;

        for (pattern, reply) in triggers {
            if pattern_matches(&pattern, text) {
                client.send_privmsg(channel, reply)?;
                break;
            }
        }

        Ok(())
    }
}

impl TriggerReply {
    async fn handle_command(
        &self,
        ctx: &Context,
        client: &Client,
        message: &Message,
        args: Args<'_>,
    ) -> Result<(), IotaError> {
        let Some(target) = message.response_target() else {
            return Ok(());
        };
        let nick = message.source_nickname().unwrap_or_default();
        let is_owner = ctx.config.irc.is_owner(nick);

        match args.shift() {
            Some(("list", _)) => {
                let triggers: Vec<(String, String)> =
                    sqlx::query_as("SELECT pattern, reply FROM triggers ORDER BY pattern")
                        .fetch_all(&ctx.db)
                        .await?;

                if triggers.is_empty() {
                    client.send_privmsg(target, "No triggers configured")?;
                } else {
                    for (pattern, reply) in triggers {
                        client.send_privmsg(target, format!("{pattern} => {reply}"))?;
                    }
                }
            }
            Some(("add", rest)) if is_owner => match parse_pair(rest.rest()) {
                Some((pattern, reply)) => {
                    sqlx::query(
                        "INSERT INTO triggers (pattern, reply) VALUES (?1, ?2) \
                         ON CONFLICT (pattern) DO UPDATE SET reply = excluded.reply",
                    )
                    .bind(pattern)
                    .bind(reply)
                    .execute(&ctx.db)
                    .await?;

                    client.send_privmsg(target, format!("Added trigger {pattern}"))?;
                }
                None => client.send_privmsg(target, "Usage: .trigger add <pattern>:<reply>")?,
            },
            Some(("remove", rest)) if is_owner && !rest.is_empty() => {
                let pattern = rest.rest().trim();
                let result = sqlx::query("DELETE FROM triggers WHERE pattern = ?1")
                    .bind(pattern)
                    .execute(&ctx.db)
                    .await?;

                if result.rows_affected() == 0 {
                    client.send_privmsg(target, format!("No such trigger: {pattern}"))?;
                } else {
                    client.send_privmsg(target, format!("Removed trigger {pattern}"))?;
                }
            }
            Some(("ignore", rest)) if is_owner && !rest.is_empty() => {
                sqlx::query("INSERT OR IGNORE INTO trigger_ignores (channel) VALUES (?1)")
                    .bind(rest.rest().trim())
                    .execute(&ctx.db)
                    .await?;

                client.send_privmsg(target, format!("Ignoring {}", rest.rest().trim()))?;
            }
            Some(("unignore", rest)) if is_owner && !rest.is_empty() => {
                sqlx::query("DELETE FROM trigger_ignores WHERE channel = ?1")
                    .bind(rest.rest().trim())
                    .execute(&ctx.db)
                    .await?;

                client.send_privmsg(target, format!("No longer ignoring {}", rest.rest().trim()))?;
            }
            _ => {
                client.send_privmsg(
                    target,
                    "Usage: .trigger [list | add <pattern>:<reply> | remove <pattern> \
                     | ignore <channel> | unignore <channel>]",
                )?;
            }
        }

        Ok(())
    }
}

/// Splits `pattern:reply` at the first colon.
fn parse_pair(s: &str) -> Option<(&str, &str)> {
    let (pattern, reply) = s.split_once(':')?;
    let pattern = pattern.trim();
    let reply = reply.trim();

    (!pattern.is_empty() && !reply.is_empty()).then_some((pattern, reply))
}

/// Matches a stored pattern against a message, regex first, substring as fallback.
fn pattern_matches(pattern: &str, text: &str) -> bool {
    match RegexBuilder::new(pattern).case_insensitive(true).build() {
        Ok(regex) => regex.is_match(text),
        Err(_) => text.to_lowercase().contains(&pattern.to_lowercase()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn it_should_match_regex_patterns() {
        assert!(pattern_matches("^hello", "Hello world"));
        assert!(!pattern_matches("^hello", "say Hello"));
        assert!(pattern_matches(r"trigge\.rs", "try trigge.rs today"));
    }

    #[test]
    fn it_should_fall_back_to_substring_for_invalid_regex() {
        assert!(pattern_matches("c++", "I like C++ a lot"));
        assert!(!pattern_matches("c++", "plain c here"));
    }

    #[test]
    fn it_should_parse_trigger_pairs() {
        assert_eq!(parse_pair("foo:bar"), Some(("foo", "bar")));
        assert_eq!(parse_pair("foo : bar baz "), Some(("foo", "bar baz")));
        // The reply may contain colons, only the first one splits.
        assert_eq!(parse_pair("time:it is 12:00"), Some(("time", "it is 12:00")));
        assert_eq!(parse_pair("no reply"), None);
        assert_eq!(parse_pair(":"), None);
    }
}
