//! Rating engine.
//!
//! Logistic expected score with a 400-point scale and a fixed K-factor.
//! Deltas are rounded half away from zero (`f64::round`). The two deltas
//! are rounded separately, so their sum is within one point of zero rather
//! than exactly zero.

use serde::{Deserialize, Serialize};

/// Rating assigned at registration.
pub const INITIAL_RATING: i64 = 1200;

/// Maximum points swung by a single decisive game.
pub const K_FACTOR: i64 = 32;

const LOGISTIC_SCALE: f64 = 400.0;

/// Rating deltas for one decisive game.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RatingChange {
    /// `>= 0` for any `k_factor >= 1`.
    pub winner_delta: i64,
    /// `<= 0` for any `k_factor >= 1`.
    pub loser_delta: i64,
}

/// Probability that a player rated `own` beats one rated `other`.
pub fn expected_score(own: i64, other: i64) -> f64 {
    let exponent = (other - own) as f64 / LOGISTIC_SCALE;
    1.0 / (1.0 + 10f64.powf(exponent))
}

/// Deltas for `winner` beating `loser` with the given K-factor.
pub fn decisive(winner: i64, loser: i64, k_factor: i64) -> RatingChange {
    let ea = expected_score(winner, loser);
    let eb = expected_score(loser, winner);
    let k = k_factor as f64;
    RatingChange {
        winner_delta: (k * (1.0 - ea)).round() as i64,
        loser_delta: (k * (0.0 - eb)).round() as i64,
    }
}
