//! Substitution-table text transformations: `.leet` and `.mirror`.

use crate::plugin::prelude::*;

pub struct Leet {
    leet_command: Trigger,
    mirror_command: Trigger,
}

/// Lowercased input character to its leetspeak rendering.
const LEET_TABLE: &[(char, &str)] = &[
    ('a', "4"),
    ('b', "8"),
    ('c', "("),
    ('d', "|)"),
    ('e', "3"),
    ('g', "6"),
    ('h', "|-|"),
    ('i', "1"),
    ('k', "|<"),
    ('l', "£"),
    ('m', "|\\/|"),
    ('n', "|\\|"),
    ('o', "0"),
    ('s', "5"),
    ('t', "7"),
    ('u', "|_|"),
    ('v', "\\/"),
    ('z', "%"),
];

/// Asymmetric glyphs and their horizontal counterparts.
const MIRROR_TABLE: &[(char, char)] = &[
    ('(', ')'),
    (')', '('),
    ('<', '>'),
    ('>', '<'),
    ('[', ']'),
    (']', '['),
    ('{', '}'),
    ('}', '{'),
    ('/', '\\'),
    ('\\', '/'),
    ('b', 'd'),
    ('d', 'b'),
    ('p', 'q'),
    ('q', 'p'),
];

#[async_trait]
impl Plugin for Leet {
    fn name() -> Name {
        Name::from("leet")
    }

    fn author() -> Author {
        Author::from("Mikkel Kroman <mk@maero.dk>")
    }

    fn version() -> Version {
        Version::from("0.1")
    }

    fn new(_ctx: &Context) -> Self {
        Leet {
            leet_command: Trigger::new(".leet"),
            mirror_command: Trigger::new(".mirror"),
        }
    }

    async fn handle_message(
        &self,
        _ctx: &Context,
        client: &Client,
        message: &Message,
    ) -> Result<(), IotaError> {
        if let Command::PRIVMSG(ref channel, ref text) = message.command {
            if let Some(args) = self.leet_command.parse(text) {
                if args.is_empty() {
                    client.send_privmsg(channel, "\x0310> Usage: .leet\x0f <text>")?;
                } else {
                    client.send_privmsg(channel, leetify(args.rest()))?;
                }
            } else if let Some(args) = self.mirror_command.parse(text) {
                if args.is_empty() {
                    client.send_privmsg(channel, "\x0310> Usage: .mirror\x0f <text>")?;
                } else {
                    client.send_privmsg(channel, mirror(args.rest()))?;
                }
            }
        }

        Ok(())
    }
}

/// Applies the leetspeak table, keeping characters it has no replacement for.
fn leetify(s: &str) -> String {
    let mut result = String::with_capacity(s.len() * 2);

    for c in s.chars() {
        let lowered = c.to_ascii_lowercase();

        match LEET_TABLE.iter().find(|(from, _)| *from == lowered) {
            Some((_, to)) => result.push_str(to),
            None => result.push(c),
        }
    }

    result
}

/// Reverses the line and swaps asymmetric glyphs, so mirrored ASCII art still points the
/// right way.
fn mirror(s: &str) -> String {
    s.chars()
        .rev()
        .map(|c| {
            MIRROR_TABLE
                .iter()
                .find(|(from, _)| *from == c)
                .map_or(c, |(_, to)| *to)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn it_should_leetify() {
        assert_eq!(leetify("leet"), "£337");
        assert_eq!(leetify("Rust"), "R|_|57");
        assert_eq!(leetify("123 !?"), "123 !?");
    }

    #[test]
    fn it_should_mirror_with_glyph_swaps() {
        assert_eq!(mirror("abc"), "cba");
        assert_eq!(mirror("(foo)"), "(oof)");
        assert_eq!(mirror("->"), "<-");
        assert_eq!(mirror("bq"), "pd");
    }

    #[test]
    fn mirroring_twice_is_identity() {
        for input in ["(hello)", "o/ <o> \\o", "bdpq"] {
            assert_eq!(mirror(&mirror(input)), input);
        }
    }
}
