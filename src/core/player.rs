//! Player profiles and the registry that owns them.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use time::Date;

use super::error::LadderError;
use super::identity::PlayerId;

/// A registered player's profile and statistics.
///
/// Counters only move through the `record_*` methods, which keep
/// `games == wins + losses + draws`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Player {
    rating: i64,
    #[serde(with = "super::iso_date")]
    joined: Date,
    games: u64,
    wins: u64,
    losses: u64,
    draws: u64,
    // Snapshots written before rejections were counted lack this field.
    #[serde(default)]
    rejects: u64,
}

impl Player {
    pub fn new(rating: i64, joined: Date) -> Self {
        Self {
            rating,
            joined,
            games: 0,
            wins: 0,
            losses: 0,
            draws: 0,
            rejects: 0,
        }
    }

    pub fn rating(&self) -> i64 {
        self.rating
    }

    pub fn joined(&self) -> Date {
        self.joined
    }

    pub fn games(&self) -> u64 {
        self.games
    }

    pub fn wins(&self) -> u64 {
        self.wins
    }

    pub fn losses(&self) -> u64 {
        self.losses
    }

    pub fn draws(&self) -> u64 {
        self.draws
    }

    pub fn rejects(&self) -> u64 {
        self.rejects
    }

    /// True when the game counter agrees with the outcome counters.
    pub fn is_consistent(&self) -> bool {
        self.games == self.wins + self.losses + self.draws
    }

    pub(crate) fn record_win(&mut self, delta: i64) {
        self.rating += delta;
        self.wins += 1;
        self.games += 1;
    }

    pub(crate) fn record_loss(&mut self, delta: i64) {
        self.rating += delta;
        self.losses += 1;
        self.games += 1;
    }

    pub(crate) fn record_draw(&mut self) {
        self.draws += 1;
        self.games += 1;
    }

    pub(crate) fn record_reject(&mut self) {
        self.rejects += 1;
    }
}

/// Durable mapping from identity to profile. Players are never removed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Registry {
    players: BTreeMap<PlayerId, Player>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(
        &mut self,
        id: PlayerId,
        rating: i64,
        joined: Date,
    ) -> Result<&Player, LadderError> {
        if self.players.contains_key(&id) {
            return Err(LadderError::AlreadyRegistered);
        }
        Ok(self
            .players
            .entry(id)
            .or_insert_with(|| Player::new(rating, joined)))
    }

    pub fn get(&self, id: &str) -> Result<&Player, LadderError> {
        self.players.get(id).ok_or(LadderError::NotRegistered)
    }

    pub(crate) fn get_mut(&mut self, id: &str) -> Result<&mut Player, LadderError> {
        self.players.get_mut(id).ok_or(LadderError::NotRegistered)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.players.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.players.len()
    }

    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&PlayerId, &Player)> {
        self.players.iter()
    }

    /// Top `count` players by rating, highest first; equal ratings by name.
    pub fn standings(&self, count: usize) -> Vec<(&PlayerId, &Player)> {
        let mut ranked: Vec<_> = self.players.iter().collect();
        // BTreeMap iteration is name-ordered and the sort is stable.
        ranked.sort_by(|a, b| b.1.rating.cmp(&a.1.rating));
        ranked.truncate(count);
        ranked
    }
}
