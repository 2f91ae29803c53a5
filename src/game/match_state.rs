//! Match State
//!
//! Lives for the whole process, across round restarts. Owned by the
//! driver and passed by reference into each simulation hook.

use std::collections::BTreeMap;

use serde::{Serialize, Deserialize};
use tracing::info;

use crate::game::state::PlayerId;

/// Win tallies, pause flag and round counter.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchState {
    wins: BTreeMap<PlayerId, u32>,
    paused: bool,
    round: u32,
    round_winner: Option<PlayerId>,
}

impl Default for MatchState {
    fn default() -> Self {
        Self::new()
    }
}

impl MatchState {
    /// Fresh match: no wins, round 1, running.
    pub fn new() -> Self {
        Self {
            wins: PlayerId::ALL.iter().map(|id| (*id, 0)).collect(),
            paused: false,
            round: 1,
            round_winner: None,
        }
    }

    /// Is the round over and input locked?
    pub fn is_paused(&self) -> bool {
        self.paused
    }

    /// Current round number (starts at 1).
    pub fn round(&self) -> u32 {
        self.round
    }

    /// Wins credited to a player.
    pub fn wins(&self, id: PlayerId) -> u32 {
        self.wins.get(&id).copied().unwrap_or(0)
    }

    /// Winner of the current round, once decided.
    pub fn round_winner(&self) -> Option<PlayerId> {
        self.round_winner
    }

    /// React to an elimination.
    ///
    /// The first elimination of a running round finishes it and credits
    /// the victim's opponent. Returns the winner in that case, None if
    /// the round was already over.
    pub fn record_elimination(&mut self, victim: PlayerId) -> Option<PlayerId> {
        if self.paused {
            return None;
        }

        let winner = victim.opponent();
        self.paused = true;
        self.round_winner = Some(winner);
        *self.wins.entry(winner).or_insert(0) += 1;

        info!(
            round = self.round,
            winner = %winner,
            loser = %victim,
            wins = self.wins(winner),
            "round finished"
        );
        Some(winner)
    }

    /// Unpause and move to the next round. Tallies are kept.
    pub fn begin_next_round(&mut self) {
        self.paused = false;
        self.round_winner = None;
        self.round += 1;
    }

    /// Explicit new game: zero every tally and go back to round 1.
    pub fn reset_tallies(&mut self) {
        *self = Self::new();
    }
}
