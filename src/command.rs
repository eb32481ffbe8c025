//! User command parsing
//!
//! Plugins expose small command surfaces such as `.np` or `.trigger add foo:bar`. A
//! [`Trigger`] matches the leading command word and hands the remainder to the caller as
//! [`Args`], which offers the usual ad-hoc splitting helpers.

/// Matches a leading command word such as `.dig`.
pub struct Trigger {
    word: String,
}

impl Trigger {
    /// Creates a trigger for the given command word, including its prefix character.
    #[must_use]
    pub fn new(word: &str) -> Trigger {
        Trigger {
            word: word.to_string(),
        }
    }

    /// Checks whether `input` starts with the command word followed by a word boundary, and if
    /// so returns the argument text.
    ///
    /// `.dig example.com` matches the trigger `.dig`, while `.digest` does not.
    #[must_use]
    pub fn parse<'a>(&self, input: &'a str) -> Option<Args<'a>> {
        let rest = input.strip_prefix(&self.word)?;

        match rest.chars().next() {
            Some(' ') => Some(Args::new(&rest[1..])),
            Some(_) => None,
            None => Some(Args::new("")),
        }
    }
}

/// The argument text following a matched command word.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Args<'a> {
    rest: &'a str,
}

impl<'a> Args<'a> {
    fn new(rest: &'a str) -> Self {
        Self { rest }
    }

    /// The raw argument text, whitespace preserved.
    #[must_use]
    pub fn rest(&self) -> &'a str {
        self.rest
    }

    /// Whether there is any argument text at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rest.trim().is_empty()
    }

    /// Splits off the first word, returning it and the remaining argument text.
    #[must_use]
    pub fn shift(&self) -> Option<(&'a str, Args<'a>)> {
        let trimmed = self.rest.trim_start();

        if trimmed.is_empty() {
            return None;
        }

        match trimmed.split_once(' ') {
            Some((word, rest)) => Some((word, Args::new(rest.trim_start()))),
            None => Some((trimmed, Args::new(""))),
        }
    }

    /// Iterates over whitespace-separated words.
    pub fn words(&self) -> impl Iterator<Item = &'a str> {
        self.rest.split_whitespace()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matches_bare_command() {
        let trigger = Trigger::new(".np");

        assert_eq!(trigger.parse(".np").map(|args| args.rest()), Some(""));
    }

    #[test]
    fn matches_command_with_args() {
        let trigger = Trigger::new(".dig");

        assert_eq!(
            trigger.parse(".dig example.com MX").map(|args| args.rest()),
            Some("example.com MX")
        );
    }

    #[test]
    fn rejects_longer_words() {
        let trigger = Trigger::new(".dig");

        assert!(trigger.parse(".digest something").is_none());
        assert!(trigger.parse(".mirror").is_none());
    }

    #[test]
    fn shift_walks_subcommands() {
        let trigger = Trigger::new(".trigger");
        let args = trigger.parse(".trigger add foo:bar baz").unwrap();

        let (subcommand, rest) = args.shift().unwrap();
        assert_eq!(subcommand, "add");
        assert_eq!(rest.rest(), "foo:bar baz");
        assert!(Args::new("   ").shift().is_none());
    }

    #[test]
    fn words_splits_on_whitespace() {
        let args = Args::new("example.com   MX");

        assert_eq!(args.words().collect::<Vec<_>>(), vec!["example.com", "MX"]);
    }
}
