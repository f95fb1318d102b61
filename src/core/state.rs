//! Ladder state: registry + ledger, and every transition between them.
//!
//! This is the whole durable snapshot. It serializes to
//! `{next_id, players, pending, archived}`.

use serde::{Deserialize, Serialize};
use time::Date;

use super::claim::{Claim, Ledger, Lookup, Outcome, Side};
use super::error::LadderError;
use super::identity::{ClaimId, PlayerId};
use super::player::{Player, Registry};
use super::rating::{self, RatingChange};

/// Parameters that shape new players and rating swings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RatingPolicy {
    pub initial_rating: i64,
    pub k_factor: i64,
}

impl Default for RatingPolicy {
    fn default() -> Self {
        Self {
            initial_rating: rating::INITIAL_RATING,
            k_factor: rating::K_FACTOR,
        }
    }
}

/// What a successful verification changed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// No rating change; both players gained a draw and a game.
    Draw { claim: Claim },
    /// Ratings moved; `*_rating` are the post-game values.
    Decisive {
        claim: Claim,
        winner: PlayerId,
        winner_rating: i64,
        loser: PlayerId,
        loser_rating: i64,
        change: RatingChange,
    },
}

impl Resolution {
    pub fn claim(&self) -> &Claim {
        match self {
            Resolution::Draw { claim } | Resolution::Decisive { claim, .. } => claim,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LadderState {
    #[serde(flatten)]
    ledger: Ledger,
    #[serde(rename = "players")]
    registry: Registry,
}

impl LadderState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    pub fn player(&self, id: &str) -> Result<&Player, LadderError> {
        self.registry.get(id)
    }

    pub fn register(
        &mut self,
        id: PlayerId,
        joined: Date,
        policy: RatingPolicy,
    ) -> Result<&Player, LadderError> {
        self.registry.register(id, policy.initial_rating, joined)
    }

    /// Opens a claim. Refusals are checked in a fixed order: claimant
    /// registered, claimant inbox empty, not self-play, respondent registered.
    pub fn file_claim(
        &mut self,
        claimant: &PlayerId,
        respondent: &str,
        outcome: Outcome,
        filed: Date,
    ) -> Result<&Claim, LadderError> {
        self.ensure_can_file(claimant.as_str())?;
        if respondent == claimant.as_str() {
            return Err(LadderError::SelfPlay);
        }
        let known = PlayerId::new(respondent).filter(|id| self.registry.contains(id.as_str()));
        let Some(respondent) = known else {
            return Err(LadderError::UnknownOpponent {
                name: respondent.to_string(),
            });
        };
        Ok(self
            .ledger
            .open(claimant.clone(), respondent, outcome, filed))
    }

    /// The first two filing checks, usable before argument parsing.
    pub fn ensure_can_file(&self, claimant: &str) -> Result<(), LadderError> {
        self.registry.get(claimant)?;
        if self.ledger.has_incoming(claimant) {
            return Err(LadderError::HasPendingIncoming);
        }
        Ok(())
    }

    pub fn incoming<'a>(&'a self, id: &'a str) -> impl Iterator<Item = &'a Claim> + 'a {
        self.ledger.pending_for(id, Side::Respondent)
    }

    pub fn outgoing<'a>(&'a self, id: &'a str) -> impl Iterator<Item = &'a Claim> + 'a {
        self.ledger.pending_for(id, Side::Claimant)
    }

    /// Respondent confirms a claim: archive it and apply the result.
    pub fn verify(
        &mut self,
        respondent: &str,
        claim_id: ClaimId,
        policy: RatingPolicy,
    ) -> Result<Resolution, LadderError> {
        let index = self.owned_index(claim_id, respondent, Side::Respondent)?;
        let claim = self.ledger.archive(index).clone();

        let parties = claim
            .decisive_parties()
            .map(|(winner, loser)| (winner.clone(), loser.clone()));
        let Some((winner, loser)) = parties else {
            self.registry.get_mut(claim.claimant.as_str())?.record_draw();
            self.registry.get_mut(claim.respondent.as_str())?.record_draw();
            return Ok(Resolution::Draw { claim });
        };

        let change = rating::decisive(
            self.registry.get(winner.as_str())?.rating(),
            self.registry.get(loser.as_str())?.rating(),
            policy.k_factor,
        );
        let winner_entry = self.registry.get_mut(winner.as_str())?;
        winner_entry.record_win(change.winner_delta);
        let winner_rating = winner_entry.rating();
        let loser_entry = self.registry.get_mut(loser.as_str())?;
        loser_entry.record_loss(change.loser_delta);
        let loser_rating = loser_entry.rating();

        Ok(Resolution::Decisive {
            claim,
            winner,
            winner_rating,
            loser,
            loser_rating,
            change,
        })
    }

    /// Respondent disputes a claim: drop it and count the rejection.
    pub fn reject(&mut self, respondent: &str, claim_id: ClaimId) -> Result<Claim, LadderError> {
        let index = self.owned_index(claim_id, respondent, Side::Respondent)?;
        self.registry.get_mut(respondent)?.record_reject();
        Ok(self.ledger.discard(index))
    }

    /// Claimant withdraws a claim. No counters move.
    pub fn cancel(&mut self, claimant: &str, claim_id: ClaimId) -> Result<Claim, LadderError> {
        let index = self.owned_index(claim_id, claimant, Side::Claimant)?;
        Ok(self.ledger.discard(index))
    }

    pub fn standings(&self, count: usize) -> Vec<(&PlayerId, &Player)> {
        self.registry.standings(count)
    }

    /// Structural checks applied to loaded snapshots.
    pub fn check_invariants(&self) -> Result<(), String> {
        self.ledger.check_invariants()?;
        for (id, player) in self.registry.iter() {
            if !player.is_consistent() {
                return Err(format!("player {id} has games != wins + losses + draws"));
            }
        }
        for claim in self.ledger.pending() {
            for party in [&claim.claimant, &claim.respondent] {
                if !self.registry.contains(party.as_str()) {
                    return Err(format!(
                        "pending claim {} names unregistered player {party}",
                        claim.id
                    ));
                }
            }
        }
        Ok(())
    }

    fn owned_index(
        &self,
        claim_id: ClaimId,
        player: &str,
        side: Side,
    ) -> Result<usize, LadderError> {
        match self.ledger.lookup(claim_id, player, side) {
            Lookup::Missing => Err(LadderError::ClaimNotFound),
            Lookup::Foreign => Err(LadderError::NotYourClaim),
            Lookup::Owned(index) => Ok(index),
        }
    }
}
