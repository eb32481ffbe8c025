//! Announces the `<title>` of links posted to a channel.
//!
//! Lookups run in the background so a slow page never stalls event dispatch; each posted URL
//! is remembered, and reposts credit whoever posted the link first. Channels can be excluded
//! with wildcard patterns, where a leading `!` marks an exception that wins over the other
//! patterns.

use irc::client::Sender;
use scraper::{Html, Selector};
use tracing::warn;
use url::Url;
use wildmatch::WildMatch;

use crate::database::Database;
use crate::plugin::prelude::*;

pub struct UrlTitle;

const SETTINGS: &[Setting] = &[
    Setting {
        name: "ignored_channels",
        default: "",
        description: "comma-separated wildcard patterns for channels to skip, `!` negates",
    },
    Setting {
        name: "ignored_urls",
        default: "",
        description: "comma-separated substrings of urls to skip",
    },
    Setting {
        name: "max_title_length",
        default: "100",
        description: "titles longer than this are cut off",
    },
    Setting {
        name: "announce_reposts",
        default: "on",
        description: "credit the first poster when a url is posted again",
    },
];

#[async_trait]
impl Plugin for UrlTitle {
    fn name() -> Name {
        Name::from("url_title")
    }

    fn author() -> Author {
        Author::from("Mikkel Kroman <mk@maero.dk>")
    }

    fn version() -> Version {
        Version::from("0.2")
    }

    fn settings() -> &'static [Setting] {
        SETTINGS
    }

    fn new(_ctx: &Context) -> Self {
        UrlTitle
    }

    async fn handle_message(
        &self,
        ctx: &Context,
        client: &Client,
        message: &Message,
    ) -> Result<(), IotaError> {
        if let Command::PRIVMSG(ref channel, ref text) = message.command {
            let urls = extract_urls(text);

            if urls.is_empty() {
                return Ok(());
            }

            let ignored_channels = ctx.settings.list_value("url_title.ignored_channels");

            if channel_ignored(&ignored_channels, channel) {
                return Ok(());
            }

            let ignored_urls = ctx.settings.list_value("url_title.ignored_urls");
            let max_length = ctx
                .settings
                .int_value("url_title.max_title_length")
                .and_then(|value| usize::try_from(value).ok())
                .unwrap_or(100);
            let announce_reposts = ctx.settings.bool_value("url_title.announce_reposts");
            let nick = message.source_nickname().unwrap_or_default().to_string();

            for url in urls {
                if ignored_urls
                    .iter()
                    .any(|fragment| url.as_str().contains(fragment.as_str()))
                {
                    continue;
                }

                let http = ctx.http.clone();
                let db = ctx.db.clone();
                let sender = client.sender();
                let channel = channel.clone();
                let nick = nick.clone();

                tokio::spawn(async move {
                    if let Err(err) =
                        announce(&http, &db, &sender, &channel, &nick, &url, max_length, announce_reposts)
                            .await
                    {
                        warn!(url = %url, error = ?err, "url title lookup failed");
                    }
                });
            }
        }

        Ok(())
    }
}

/// Fetches the page behind `url` and announces its title to `channel`.
#[allow(clippy::too_many_arguments)]
async fn announce(
    http: &reqwest::Client,
    db: &Database,
    sender: &Sender,
    channel: &str,
    nick: &str,
    url: &Url,
    max_length: usize,
    announce_reposts: bool,
) -> Result<(), IotaError> {
    let body = http.get(url.clone()).send().await?.text().await?;

    let Some(title) = extract_title(&body) else {
        return Ok(());
    };

    let title = tidy_title(&title, max_length);

    if title.is_empty() {
        return Ok(());
    }

    let first_poster: Option<(String,)> = sqlx::query_as("SELECT nick FROM urls WHERE url = ?1")
        .bind(url.as_str())
        .fetch_optional(db)
        .await?;

    let line = match &first_poster {
        Some((first,)) if announce_reposts && first != nick => {
            format!("\x0310>\x0f\x02 Title:\x02\x0310 {title}\x0f (first posted by {first})")
        }
        _ => format!("\x0310>\x0f\x02 Title:\x02\x0310 {title}"),
    };

    if first_poster.is_none() {
        sqlx::query("INSERT OR IGNORE INTO urls (url, nick, channel) VALUES (?1, ?2, ?3)")
            .bind(url.as_str())
            .bind(nick)
            .bind(channel)
            .execute(db)
            .await?;
    }

    sender.send_privmsg(channel, line)?;

    Ok(())
}

/// Extracts HTTP(s) URLs from a message, trimming the punctuation people leave attached.
fn extract_urls(s: &str) -> Vec<Url> {
    s.split_whitespace()
        .map(|word| word.trim_end_matches(['.', ',', ';', ')', '>']))
        .filter(|word| {
            let lowered = word.to_ascii_lowercase();
            lowered.starts_with("http://") || lowered.starts_with("https://")
        })
        .filter_map(|word| Url::parse(word).ok())
        .collect()
}

/// Returns the text of the document's `<title>` element, if it has one.
fn extract_title(body: &str) -> Option<String> {
    let document = Html::parse_document(body);
    let selector = Selector::parse("title").expect("could not parse title selector");

    document
        .select(&selector)
        .next()
        .map(|element| element.text().collect::<String>())
}

/// Collapses runs of whitespace and cuts the title off at `max_length` characters.
fn tidy_title(title: &str, max_length: usize) -> String {
    let collapsed = title.split_whitespace().collect::<Vec<_>>().join(" ");

    match collapsed.char_indices().nth(max_length) {
        Some((byte_idx, _)) => format!("{}…", &collapsed[..byte_idx]),
        None => collapsed,
    }
}

/// Matches `channel` against ignore patterns, where a `!`-prefixed pattern is an exception
/// that overrides the rest.
fn channel_ignored(patterns: &[String], channel: &str) -> bool {
    let mut ignored = false;

    for pattern in patterns {
        if let Some(exception) = pattern.strip_prefix('!') {
            if WildMatch::new(exception).matches(channel) {
                return false;
            }
        } else if WildMatch::new(pattern).matches(channel) {
            ignored = true;
        }
    }

    ignored
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn it_should_extract_urls() {
        let urls = extract_urls("see https://example.com/page, or http://other.org");

        assert_eq!(urls.len(), 2);
        assert_eq!(urls[0].as_str(), "https://example.com/page");
        assert_eq!(urls[1].as_str(), "http://other.org/");
    }

    #[test]
    fn it_should_skip_other_schemes() {
        assert!(extract_urls("ftp://example.com/file.zip gopher://x").is_empty());
    }

    #[test]
    fn it_should_extract_the_title() {
        let body = "<html><head><title>An
            Example   Page</title></head><body></body></html>";

        let title = extract_title(body).unwrap();

        assert_eq!(tidy_title(&title, 100), "An Example Page");
    }

    #[test]
    fn it_should_handle_missing_titles() {
        assert_eq!(extract_title("<html><body>hi</body></html>"), None);
    }

    #[test]
    fn it_should_truncate_long_titles() {
        assert_eq!(tidy_title("aaaa aaaa", 4), "aaaa…");
        assert_eq!(tidy_title("short", 100), "short");
    }

    #[test]
    fn it_should_honor_ignore_exceptions() {
        let patterns = vec!["*ubuntu*".to_string(), "!#ubuntu-offtopic".to_string()];

        assert!(channel_ignored(&patterns, "#ubuntu"));
        assert!(channel_ignored(&patterns, "#kubuntu-devel"));
        assert!(!channel_ignored(&patterns, "#ubuntu-offtopic"));
        assert!(!channel_ignored(&patterns, "#rust"));
    }
}
