//! IRC line codec (RFC 1459 framing, tags ignored).

/// Max line length including the trailing CRLF.
pub const MAX_LINE: usize = 512;

/// One parsed server line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub prefix: Option<String>,
    pub command: String,
    pub params: Vec<String>,
}

impl Message {
    /// Parses a line with or without its CRLF. Returns `None` for blank
    /// lines or lines with no command.
    pub fn parse(line: &str) -> Option<Self> {
        let mut rest = line.trim_end_matches(['\r', '\n']);
        if let Some(tagged) = rest.strip_prefix('@') {
            rest = tagged.split_once(' ').map(|(_, tail)| tail)?;
        }
        rest = rest.trim_start_matches(' ');

        let prefix = match rest.strip_prefix(':') {
            Some(prefixed) => {
                let (prefix, tail) = prefixed.split_once(' ')?;
                rest = tail.trim_start_matches(' ');
                Some(prefix.to_string())
            }
            None => None,
        };

        let (head, trailing) = match rest.split_once(" :") {
            Some((head, trailing)) => (head, Some(trailing)),
            None => match rest.strip_prefix(':') {
                Some(trailing) => ("", Some(trailing)),
                None => (rest, None),
            },
        };
        let mut words = head.split(' ').filter(|word| !word.is_empty());
        let command = words.next()?.to_ascii_uppercase();
        let mut params: Vec<String> = words.map(str::to_string).collect();
        if let Some(trailing) = trailing {
            params.push(trailing.to_string());
        }

        Some(Self {
            prefix,
            command,
            params,
        })
    }

    /// Nick part of a `nick!user@host` prefix.
    pub fn nick(&self) -> Option<&str> {
        let prefix = self.prefix.as_deref()?;
        let nick = prefix.split_once('!').map_or(prefix, |(nick, _)| nick);
        (!nick.is_empty()).then_some(nick)
    }

    pub fn param(&self, index: usize) -> Option<&str> {
        self.params.get(index).map(String::as_str)
    }
}

/// A `PRIVMSG` seen by the bot, already resolved to a nick.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrivMsg<'a> {
    pub sender: &'a str,
    pub target: &'a str,
    pub text: &'a str,
}

impl Message {
    pub fn as_privmsg(&self) -> Option<PrivMsg<'_>> {
        if self.command != "PRIVMSG" {
            return None;
        }
        Some(PrivMsg {
            sender: self.nick()?,
            target: self.param(0)?,
            text: self.param(1)?,
        })
    }
}

pub fn is_channel(target: &str) -> bool {
    target.starts_with(['#', '&', '+', '!'])
}

pub fn nick(nickname: &str) -> String {
    format!("NICK {}", sanitize(nickname))
}

pub fn user(nickname: &str) -> String {
    let nickname = sanitize(nickname);
    format!("USER {nickname} 0 * :{nickname}")
}

pub fn join(channel: &str) -> String {
    format!("JOIN {}", sanitize(channel))
}

pub fn pong(token: &str) -> String {
    format!("PONG :{}", sanitize(token))
}

pub fn quit(reason: &str) -> String {
    format!("QUIT :{}", sanitize(reason))
}

pub fn privmsg(target: &str, text: &str) -> String {
    addressed("PRIVMSG", target, text)
}

pub fn notice(target: &str, text: &str) -> String {
    addressed("NOTICE", target, text)
}

fn addressed(command: &str, target: &str, text: &str) -> String {
    let head = format!("{command} {} :", sanitize(target));
    let budget = MAX_LINE.saturating_sub(2 + head.len());
    let mut line = head;
    line.push_str(truncate(&sanitize(text), budget));
    line
}

/// Line breaks and NULs would let text inject extra commands.
fn sanitize(text: &str) -> String {
    text.chars()
        .map(|c| if matches!(c, '\r' | '\n' | '\0') { ' ' } else { c })
        .collect()
}

fn truncate(text: &str, max_bytes: usize) -> &str {
    if text.len() <= max_bytes {
        return text;
    }
    let mut end = max_bytes;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    &text[..end]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_privmsg() {
        let msg = Message::parse(":alice!~a@host.example PRIVMSG #openra :.win vs bob\r\n")
            .expect("parse");
        assert_eq!(msg.command, "PRIVMSG");
        assert_eq!(msg.nick(), Some("alice"));
        assert_eq!(
            msg.as_privmsg(),
            Some(PrivMsg {
                sender: "alice",
                target: "#openra",
                text: ".win vs bob",
            })
        );
    }

    #[test]
    fn parses_server_lines() {
        let ping = Message::parse("PING :irc.example.net").expect("ping");
        assert_eq!(ping.command, "PING");
        assert_eq!(ping.params, vec!["irc.example.net"]);
        assert_eq!(ping.nick(), None);

        let welcome = Message::parse(":irc.example.net 001 elobot :Welcome to the network")
            .expect("welcome");
        assert_eq!(welcome.command, "001");
        assert_eq!(welcome.param(0), Some("elobot"));
        assert_eq!(welcome.param(1), Some("Welcome to the network"));

        let tagged = Message::parse("@time=2026-01-01T00:00:00Z :bob!b@h PRIVMSG elobot :hi")
            .expect("tagged");
        assert_eq!(tagged.as_privmsg().map(|p| p.target), Some("elobot"));

        let bare = Message::parse("PRIVMSG #chan :").expect("empty trailing");
        assert_eq!(bare.param(1), Some(""));
    }

    #[test]
    fn rejects_blank_lines() {
        assert_eq!(Message::parse(""), None);
        assert_eq!(Message::parse("\r\n"), None);
        assert_eq!(Message::parse(":prefix.only"), None);
    }

    #[test]
    fn outbound_lines_are_single_lines() {
        assert_eq!(
            privmsg("#openra", "Rejected claim."),
            "PRIVMSG #openra :Rejected claim."
        );
        assert_eq!(notice("bob", "a\r\nQUIT :x"), "NOTICE bob :a  QUIT :x");
        assert_eq!(pong("token"), "PONG :token");
        assert_eq!(user("elobot"), "USER elobot 0 * :elobot");
    }

    #[test]
    fn long_lines_are_truncated_on_char_boundaries() {
        let text = "é".repeat(400);
        let line = privmsg("#openra", &text);
        assert!(line.len() + 2 <= MAX_LINE);
        assert!(line.starts_with("PRIVMSG #openra :é"));
        assert!(line.ends_with('é'));
    }

    #[test]
    fn channel_detection() {
        assert!(is_channel("#openra"));
        assert!(is_channel("&local"));
        assert!(!is_channel("elobot"));
    }
}
