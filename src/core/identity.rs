//! Identities: who is playing, and which claim is meant.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::error::LadderError;

/// Player identity - the channel handle supplied by the transport.
///
/// Case-sensitive. No validation beyond non-empty and no whitespace, since
/// the transport already guarantees a well-formed nick.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlayerId(String);

impl PlayerId {
    pub fn new(s: impl Into<String>) -> Option<Self> {
        let s = s.into();
        if s.is_empty() || s.chars().any(char::is_whitespace) {
            None
        } else {
            Some(Self(s))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PlayerId({:?})", self.0)
    }
}

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for PlayerId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::borrow::Borrow<str> for PlayerId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

/// Claim identifier. Assigned from the ledger counter, never reused.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClaimId(u64);

impl ClaimId {
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    pub const fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Debug for ClaimId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ClaimId({})", self.0)
    }
}

impl fmt::Display for ClaimId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for ClaimId {
    type Err = LadderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse::<u64>()
            .map(ClaimId)
            .map_err(|_| LadderError::InvalidId { raw: s.to_string() })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn player_id_rejects_empty_and_whitespace() {
        assert!(PlayerId::new("").is_none());
        assert!(PlayerId::new("two words").is_none());
        assert_eq!(PlayerId::new("Alice").unwrap().as_str(), "Alice");
        assert_ne!(PlayerId::new("alice"), PlayerId::new("Alice"));
    }

    #[test]
    fn claim_id_parse() {
        assert_eq!("17".parse::<ClaimId>().unwrap(), ClaimId::new(17));
        assert_eq!(
            "-1".parse::<ClaimId>().unwrap_err(),
            LadderError::InvalidId { raw: "-1".into() }
        );
        assert!("abc".parse::<ClaimId>().is_err());
    }
}
