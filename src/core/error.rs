//! Ladder refusal states.
//!
//! Every variant is a recoverable, user-facing outcome: the command is refused,
//! nothing changes, and the `Display` text is the line the channel sees.

use thiserror::Error;

use super::claim::Outcome;

/// Canonical error enum for ladder operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LadderError {
    #[error("Already registered!")]
    AlreadyRegistered,

    #[error("Register first!")]
    NotRegistered,

    #[error("Verify or reject your incoming claims first.")]
    HasPendingIncoming,

    #[error("Expected \"{outcome} vs <player>\". Sorry")]
    InvalidOutcomeArgs { outcome: Outcome },

    #[error("Don't play with yourself in public.")]
    SelfPlay,

    #[error("Can't find player \"{name}\"")]
    UnknownOpponent { name: String },

    #[error("Sorry, couldn't find your game")]
    ClaimNotFound,

    #[error("Not your game!")]
    NotYourClaim,

    #[error("Sorry, expected game id")]
    InvalidId { raw: String },
}

impl LadderError {
    /// Stable machine-readable code, used as a log field.
    pub fn code(&self) -> &'static str {
        match self {
            LadderError::AlreadyRegistered => "already_registered",
            LadderError::NotRegistered => "not_registered",
            LadderError::HasPendingIncoming => "has_pending_incoming",
            LadderError::InvalidOutcomeArgs { .. } => "invalid_outcome_args",
            LadderError::SelfPlay => "self_play",
            LadderError::UnknownOpponent { .. } => "unknown_opponent",
            LadderError::ClaimNotFound => "claim_not_found",
            LadderError::NotYourClaim => "not_your_claim",
            LadderError::InvalidId { .. } => "invalid_id",
        }
    }
}
