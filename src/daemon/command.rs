//! Command lines: the closed set of command names and the tokenizer.

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CommandKind {
    Register,
    Win,
    Loss,
    Draw,
    Verify,
    Reject,
    Cancel,
    Incoming,
    Outgoing,
    Top,
    Help,
}

impl CommandKind {
    /// Help-listing order.
    pub const ALL: [CommandKind; 11] = [
        CommandKind::Register,
        CommandKind::Win,
        CommandKind::Loss,
        CommandKind::Draw,
        CommandKind::Verify,
        CommandKind::Reject,
        CommandKind::Cancel,
        CommandKind::Incoming,
        CommandKind::Outgoing,
        CommandKind::Top,
        CommandKind::Help,
    ];

    /// Exact, case-sensitive name lookup.
    pub fn parse(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.as_str() == name)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            CommandKind::Register => "register",
            CommandKind::Win => "win",
            CommandKind::Loss => "loss",
            CommandKind::Draw => "draw",
            CommandKind::Verify => "verify",
            CommandKind::Reject => "reject",
            CommandKind::Cancel => "cancel",
            CommandKind::Incoming => "incoming",
            CommandKind::Outgoing => "outgoing",
            CommandKind::Top => "top",
            CommandKind::Help => "help",
        }
    }

    pub fn needs_registration(self) -> bool {
        !matches!(self, CommandKind::Register | CommandKind::Top | CommandKind::Help)
    }
}

impl fmt::Display for CommandKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command<'a> {
    pub kind: CommandKind,
    pub args: Vec<&'a str>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Parsed<'a> {
    /// Ordinary chatter; no prefix.
    NotCommand,
    Unknown(&'a str),
    Known(Command<'a>),
}

/// Splits `text` into a command. Tokens are separated by single spaces, so
/// doubled spaces produce empty tokens and fail argument checks downstream.
pub fn parse<'a>(text: &'a str, prefix: &str) -> Parsed<'a> {
    let Some(rest) = text.strip_prefix(prefix) else {
        return Parsed::NotCommand;
    };
    let mut tokens = rest.split(' ');
    let name = tokens.next().unwrap_or_default();
    match CommandKind::parse(name) {
        Some(kind) => Parsed::Known(Command {
            kind,
            args: tokens.collect(),
        }),
        None => Parsed::Unknown(name),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_roundtrip() {
        for kind in CommandKind::ALL {
            assert_eq!(CommandKind::parse(kind.as_str()), Some(kind));
        }
        assert_eq!(CommandKind::parse("Register"), None);
        assert_eq!(CommandKind::parse(""), None);
    }

    #[test]
    fn parse_splits_on_single_spaces() {
        assert_eq!(
            parse(".win vs bob", "."),
            Parsed::Known(Command {
                kind: CommandKind::Win,
                args: vec!["vs", "bob"],
            })
        );
        assert_eq!(
            parse(".win  vs bob", "."),
            Parsed::Known(Command {
                kind: CommandKind::Win,
                args: vec!["", "vs", "bob"],
            })
        );
        assert_eq!(
            parse(".incoming", "."),
            Parsed::Known(Command {
                kind: CommandKind::Incoming,
                args: vec![],
            })
        );
    }

    #[test]
    fn parse_without_prefix_is_chatter() {
        assert_eq!(parse("win vs bob", "."), Parsed::NotCommand);
        assert_eq!(parse("", "."), Parsed::NotCommand);
        assert_eq!(parse("!top", "!"), parse(".top", "."));
    }

    #[test]
    fn parse_unknown_names() {
        assert_eq!(parse(".", "."), Parsed::Unknown(""));
        assert_eq!(parse(".WIN vs bob", "."), Parsed::Unknown("WIN"));
        assert_eq!(parse(". top", "."), Parsed::Unknown(""));
    }

    #[test]
    fn registration_requirements() {
        assert!(!CommandKind::Top.needs_registration());
        assert!(!CommandKind::Help.needs_registration());
        assert!(!CommandKind::Register.needs_registration());
        assert!(CommandKind::Incoming.needs_registration());
    }
}
