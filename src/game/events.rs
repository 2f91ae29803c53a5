//! Game Events
//!
//! Events generated during simulation for logging, replay and verification.
//!
//! Events are delivered in the order they were raised, which is causal:
//! an explosion precedes the tiles it clears and the eliminations it
//! causes, and an elimination precedes the round result.

use serde::{Serialize, Deserialize};

use crate::core::cell::Cell;
use crate::game::bomb::BombId;
use crate::game::state::PlayerId;

/// Game event data.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameEventData {
    /// A bomb was placed
    BombPlaced {
        bomb_id: BombId,
        owner: PlayerId,
        cell: Cell,
    },

    /// A bomb's fuse ran out
    BombExploded {
        bomb_id: BombId,
        owner: PlayerId,
        cell: Cell,
        /// Number of blast segments spawned
        segments: u32,
    },

    /// A destructible tile was cleared by a blast
    TileDestroyed {
        bomb_id: BombId,
        cell: Cell,
    },

    /// Player touched a blast
    PlayerEliminated {
        victim_id: PlayerId,
        /// Owner of the bomb whose blast did it
        bomb_owner: PlayerId,
    },

    /// A round was decided
    RoundFinished {
        round: u32,
        winner_id: PlayerId,
        loser_id: PlayerId,
    },

    /// The arena was rebuilt for a new round
    RoundRestarted {
        round: u32,
    },
}

/// A game event stamped with its frame.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameEvent {
    /// Frame when event occurred
    pub frame: u32,

    /// Player the event is about, if any
    pub player_id: Option<PlayerId>,

    /// Event data
    pub data: GameEventData,
}

impl GameEvent {
    /// Create a new event.
    pub fn new(frame: u32, data: GameEventData) -> Self {
        let player_id = match &data {
            GameEventData::BombPlaced { owner, .. } => Some(*owner),
            GameEventData::BombExploded { owner, .. } => Some(*owner),
            GameEventData::PlayerEliminated { victim_id, .. } => Some(*victim_id),
            GameEventData::RoundFinished { winner_id, .. } => Some(*winner_id),
            _ => None,
        };

        Self {
            frame,
            player_id,
            data,
        }
    }

    /// Create bomb placed event.
    pub fn bomb_placed(frame: u32, bomb_id: BombId, owner: PlayerId, cell: Cell) -> Self {
        Self::new(frame, GameEventData::BombPlaced { bomb_id, owner, cell })
    }

    /// Create bomb exploded event.
    pub fn bomb_exploded(frame: u32, bomb_id: BombId, owner: PlayerId, cell: Cell, segments: u32) -> Self {
        Self::new(
            frame,
            GameEventData::BombExploded {
                bomb_id,
                owner,
                cell,
                segments,
            },
        )
    }

    /// Create tile destroyed event.
    pub fn tile_destroyed(frame: u32, bomb_id: BombId, cell: Cell) -> Self {
        Self::new(frame, GameEventData::TileDestroyed { bomb_id, cell })
    }

    /// Create player eliminated event.
    pub fn player_eliminated(frame: u32, victim_id: PlayerId, bomb_owner: PlayerId) -> Self {
        Self::new(frame, GameEventData::PlayerEliminated { victim_id, bomb_owner })
    }

    /// Create round finished event.
    pub fn round_finished(frame: u32, round: u32, winner_id: PlayerId) -> Self {
        Self::new(
            frame,
            GameEventData::RoundFinished {
                round,
                winner_id,
                loser_id: winner_id.opponent(),
            },
        )
    }

    /// Create round restarted event.
    pub fn round_restarted(round: u32) -> Self {
        Self::new(0, GameEventData::RoundRestarted { round })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_events_compare_by_content() {
        let first = GameEvent::tile_destroyed(5, BombId(0), Cell::new(1, 1));
        let other = GameEvent::tile_destroyed(5, BombId(7), Cell::new(9, 9));
        assert_ne!(first, other);
        assert_eq!(first, GameEvent::tile_destroyed(5, BombId(0), Cell::new(1, 1)));
    }

    #[test]
    fn test_player_id_follows_subject() {
        let placed = GameEvent::bomb_placed(9, BombId(0), PlayerId::Two, Cell::new(1, 1));
        assert_eq!(placed.player_id, Some(PlayerId::Two));

        let eliminated = GameEvent::player_eliminated(10, PlayerId::One, PlayerId::Two);
        assert_eq!(eliminated.player_id, Some(PlayerId::One));

        let tile = GameEvent::tile_destroyed(10, BombId(0), Cell::new(2, 2));
        assert_eq!(tile.player_id, None);
    }

    #[test]
    fn test_round_finished_names_loser() {
        let event = GameEvent::round_finished(3, 1, PlayerId::Two);
        assert_eq!(event.player_id, Some(PlayerId::Two));
        assert_eq!(
            event.data,
            GameEventData::RoundFinished {
                round: 1,
                winner_id: PlayerId::Two,
                loser_id: PlayerId::One,
            }
        );
    }
}
