#![forbid(unsafe_code)]

#[cfg(feature = "cli")]
pub mod cli;
pub mod config;
pub mod core;
pub mod daemon;
pub mod error;
pub mod irc;
pub mod paths;
pub mod telemetry;

pub use error::{Error, Transience};
pub type Result<T> = std::result::Result<T, Error>;

// Re-export core types at crate root for convenience
pub use crate::core::{
    Claim, ClaimId, LadderError, LadderState, Ledger, Outcome, Player, PlayerId, RatingChange,
    RatingPolicy, Registry, Resolution,
};
