//! Core domain types for the ladder.
//!
//! Module hierarchy follows type dependency order:
//! - identity: PlayerId, ClaimId
//! - rating: expected score and deltas (pure)
//! - player: Player, Registry
//! - claim: Outcome, Claim, Ledger
//! - state: LadderState (registry + ledger, all transitions)

pub mod claim;
pub mod error;
pub mod identity;
pub mod player;
pub mod rating;
pub mod state;

pub use claim::{Claim, Ledger, Outcome};
pub use error::LadderError;
pub use identity::{ClaimId, PlayerId};
pub use player::{Player, Registry};
pub use rating::{INITIAL_RATING, K_FACTOR, RatingChange};
pub use state::{LadderState, RatingPolicy, Resolution};

// Calendar dates persist as `YYYY-MM-DD`.
time::serde::format_description!(iso_date, Date, "[year]-[month]-[day]");
