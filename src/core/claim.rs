//! Claims and the ledger that orders them.
//!
//! A claim lives in exactly one of two collections: `pending` (mutable,
//! insertion-ordered) or `archived` (append-only). Rejected and cancelled
//! claims leave `pending` without ever entering `archived`.

use std::fmt;

use serde::{Deserialize, Serialize};
use time::Date;

use super::identity::{ClaimId, PlayerId};

/// Match outcome, from the claimant's perspective.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    Win,
    Loss,
    Draw,
}

impl Outcome {
    pub fn as_str(self) -> &'static str {
        match self {
            Outcome::Win => "win",
            Outcome::Loss => "loss",
            Outcome::Draw => "draw",
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One player's assertion of a result against another.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claim {
    pub id: ClaimId,
    #[serde(rename = "p1")]
    pub claimant: PlayerId,
    #[serde(rename = "p2")]
    pub respondent: PlayerId,
    pub outcome: Outcome,
    #[serde(rename = "date", with = "super::iso_date")]
    pub filed: Date,
}

impl Claim {
    /// `(winner, loser)` for a decisive claim, `None` for a draw.
    pub fn decisive_parties(&self) -> Option<(&PlayerId, &PlayerId)> {
        match self.outcome {
            Outcome::Win => Some((&self.claimant, &self.respondent)),
            Outcome::Loss => Some((&self.respondent, &self.claimant)),
            Outcome::Draw => None,
        }
    }
}

impl fmt::Display for Claim {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {} {} vs {} ({})",
            self.id, self.claimant, self.outcome, self.respondent, self.filed
        )
    }
}

/// Which side of a claim a lookup must match.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Claimant,
    Respondent,
}

impl Side {
    fn holder(self, claim: &Claim) -> &PlayerId {
        match self {
            Side::Claimant => &claim.claimant,
            Side::Respondent => &claim.respondent,
        }
    }
}

/// Pending and archived claims plus the id counter.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ledger {
    next_id: u64,
    pending: Vec<Claim>,
    archived: Vec<Claim>,
}

/// Result of looking a claim id up for a specific player.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lookup {
    Missing,
    Foreign,
    Owned(usize),
}

impl Ledger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next_id(&self) -> ClaimId {
        ClaimId::new(self.next_id)
    }

    pub fn pending(&self) -> &[Claim] {
        &self.pending
    }

    pub fn archived(&self) -> &[Claim] {
        &self.archived
    }

    /// Pending claims held by `id` on `side`, in insertion order.
    pub fn pending_for<'a>(
        &'a self,
        id: &'a str,
        side: Side,
    ) -> impl Iterator<Item = &'a Claim> + 'a {
        self.pending
            .iter()
            .filter(move |claim| side.holder(claim).as_str() == id)
    }

    pub fn has_incoming(&self, id: &str) -> bool {
        self.pending_for(id, Side::Respondent).next().is_some()
    }

    /// Appends a new pending claim. Callers validate the parties.
    pub(crate) fn open(
        &mut self,
        claimant: PlayerId,
        respondent: PlayerId,
        outcome: Outcome,
        filed: Date,
    ) -> &Claim {
        let claim = Claim {
            id: ClaimId::new(self.next_id),
            claimant,
            respondent,
            outcome,
            filed,
        };
        self.next_id += 1;
        self.pending.push(claim);
        &self.pending[self.pending.len() - 1]
    }

    /// Finds the first pending claim with `claim_id`, then checks that `player`
    /// holds it on `side`. Ownership is only judged after an id match.
    pub fn lookup(&self, claim_id: ClaimId, player: &str, side: Side) -> Lookup {
        match self.pending.iter().position(|claim| claim.id == claim_id) {
            None => Lookup::Missing,
            Some(index) if side.holder(&self.pending[index]).as_str() != player => {
                Lookup::Foreign
            }
            Some(index) => Lookup::Owned(index),
        }
    }

    /// Moves a pending claim into the archive.
    pub(crate) fn archive(&mut self, index: usize) -> &Claim {
        let claim = self.pending.remove(index);
        self.archived.push(claim);
        &self.archived[self.archived.len() - 1]
    }

    /// Drops a pending claim without archiving it.
    pub(crate) fn discard(&mut self, index: usize) -> Claim {
        self.pending.remove(index)
    }

    /// Checks id uniqueness, pending/archived disjointness and the counter.
    pub fn check_invariants(&self) -> Result<(), String> {
        let mut seen = std::collections::BTreeSet::new();
        for claim in self.pending.iter().chain(self.archived.iter()) {
            if !seen.insert(claim.id) {
                return Err(format!("claim id {} appears more than once", claim.id));
            }
            if claim.id.get() >= self.next_id {
                return Err(format!(
                    "claim id {} is not below next_id {}",
                    claim.id, self.next_id
                ));
            }
            if claim.claimant == claim.respondent {
                return Err(format!("claim {} names the same player twice", claim.id));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::date;

    fn pid(s: &str) -> PlayerId {
        PlayerId::new(s).expect("valid player id")
    }

    fn ledger_with_two() -> Ledger {
        let mut ledger = Ledger::new();
        ledger.open(pid("alice"), pid("bob"), Outcome::Win, date!(2024 - 03 - 01));
        ledger.open(pid("carol"), pid("alice"), Outcome::Draw, date!(2024 - 03 - 02));
        ledger
    }

    #[test]
    fn ids_increase_and_are_never_reused() {
        let mut ledger = ledger_with_two();
        let index = match ledger.lookup(ClaimId::new(0), "bob", Side::Respondent) {
            Lookup::Owned(index) => index,
            other => panic!("unexpected lookup {other:?}"),
        };
        ledger.discard(index);
        let claim = ledger.open(pid("bob"), pid("carol"), Outcome::Loss, date!(2024 - 03 - 03));
        assert_eq!(claim.id, ClaimId::new(2));
        assert_eq!(ledger.next_id(), ClaimId::new(3));
        ledger.check_invariants().expect("invariants hold");
    }

    #[test]
    fn listing_follows_insertion_order() {
        let ledger = ledger_with_two();
        let incoming: Vec<_> = ledger
            .pending_for("alice", Side::Respondent)
            .map(|c| c.id)
            .collect();
        let outgoing: Vec<_> = ledger
            .pending_for("alice", Side::Claimant)
            .map(|c| c.id)
            .collect();
        assert_eq!(incoming, [ClaimId::new(1)]);
        assert_eq!(outgoing, [ClaimId::new(0)]);
        assert!(ledger.has_incoming("alice"));
        assert!(!ledger.has_incoming("carol"));
    }

    #[test]
    fn lookup_reports_foreign_before_missing() {
        let ledger = ledger_with_two();
        assert_eq!(
            ledger.lookup(ClaimId::new(0), "alice", Side::Respondent),
            Lookup::Foreign
        );
        assert_eq!(
            ledger.lookup(ClaimId::new(0), "alice", Side::Claimant),
            Lookup::Owned(0)
        );
        assert_eq!(
            ledger.lookup(ClaimId::new(99), "alice", Side::Claimant),
            Lookup::Missing
        );
    }

    #[test]
    fn archive_moves_claim_once() {
        let mut ledger = ledger_with_two();
        let archived = ledger.archive(1).clone();
        assert_eq!(archived.id, ClaimId::new(1));
        assert!(ledger.pending().iter().all(|c| c.id != archived.id));
        assert_eq!(ledger.archived(), [archived]);
        ledger.check_invariants().expect("invariants hold");
    }

    #[test]
    fn claim_display_matches_listing_format() {
        let ledger = ledger_with_two();
        assert_eq!(
            ledger.pending()[0].to_string(),
            "0: alice win vs bob (2024-03-01)"
        );
    }

    #[test]
    fn decisive_parties_follow_claimant_perspective() {
        let ledger = ledger_with_two();
        let win = &ledger.pending()[0];
        assert_eq!(
            win.decisive_parties(),
            Some((&pid("alice"), &pid("bob")))
        );
        assert_eq!(ledger.pending()[1].decisive_parties(), None);
        let loss = Claim {
            outcome: Outcome::Loss,
            ..win.clone()
        };
        assert_eq!(
            loss.decisive_parties(),
            Some((&pid("bob"), &pid("alice")))
        );
    }

    #[test]
    fn invariants_catch_duplicate_ids() {
        let mut ledger = ledger_with_two();
        let dup = ledger.pending()[0].clone();
        ledger.archived.push(dup);
        assert!(ledger.check_invariants().is_err());
    }
}
