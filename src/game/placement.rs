//! Bomb Placement
//!
//! Each player owns a [`BombController`] holding its configuration, the
//! set of its ticking bombs and its placement indicator. Placement and
//! the indicator use the same obstruction predicate, evaluated on the
//! same frame.

use std::collections::BTreeSet;

use serde::{Serialize, Deserialize};
use tracing::debug;

use crate::core::cell::Cell;
use crate::game::bomb::{arm_bomb, BombId};
use crate::game::config::{BombConfig, ControllerConfig};
use crate::game::events::GameEvent;
use crate::game::grid::OccupancyQuery;
use crate::game::state::{ArenaState, PlayerId};

/// Preview marker for where a bomb would go.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BombIndicator {
    /// Fresh on every recompute
    pub id: u32,
    /// Cell previewed
    pub cell: Cell,
}

/// Per-player bomb bookkeeping.
#[derive(Clone, Debug)]
pub struct BombController {
    config: ControllerConfig,
    active: BTreeSet<BombId>,
    indicator: Option<BombIndicator>,
}

impl BombController {
    /// New controller with no bombs out.
    pub fn new(config: ControllerConfig) -> Self {
        Self {
            config,
            active: BTreeSet::new(),
            indicator: None,
        }
    }

    /// Controller settings.
    pub fn config(&self) -> &ControllerConfig {
        &self.config
    }

    /// Bomb settings.
    pub fn bomb_config(&self) -> &BombConfig {
        &self.config.bomb
    }

    /// Bombs currently ticking.
    pub fn active_count(&self) -> usize {
        self.active.len()
    }

    /// Ids of bombs currently ticking.
    pub fn active_bombs(&self) -> impl Iterator<Item = BombId> + '_ {
        self.active.iter().copied()
    }

    /// Is `id` one of this controller's ticking bombs?
    pub fn is_active(&self, id: BombId) -> bool {
        self.active.contains(&id)
    }

    /// Below the bomb limit?
    pub fn has_free_slot(&self) -> bool {
        (self.active.len() as u64) < u64::from(self.config.bomb.bomb_limit)
    }

    /// Current indicator.
    pub fn indicator(&self) -> Option<BombIndicator> {
        self.indicator
    }

    /// Drop a bomb from the active set. Returns false if it was not there.
    pub(crate) fn release(&mut self, id: BombId) -> bool {
        self.active.remove(&id)
    }

    /// Hide the indicator.
    pub(crate) fn clear_indicator(&mut self) {
        self.indicator = None;
    }
}

/// Cell a live player would drop a bomb on.
fn candidate_cell(state: &ArenaState, player: PlayerId) -> Option<Cell> {
    state
        .player(player)
        .filter(|p| p.alive)
        .map(|p| p.cell())
}

/// Try to drop a bomb at the player's cell.
///
/// Refused silently (None) when the player is out, at the bomb limit, or
/// standing on an obstructed cell.
pub fn request_placement(state: &mut ArenaState, player: PlayerId) -> Option<BombId> {
    let Some(cell) = candidate_cell(state, player) else {
        debug!(player = %player, "placement refused: player not in play");
        return None;
    };

    let controller = state.controller(player)?;
    if !controller.has_free_slot() {
        debug!(
            player = %player,
            active = controller.active_count(),
            limit = controller.bomb_config().bomb_limit,
            "placement refused: bomb limit reached"
        );
        return None;
    }

    if state.is_blocked(cell) {
        debug!(player = %player, cell = %cell, "placement refused: cell obstructed");
        return None;
    }

    let id = arm_bomb(state, player, cell)?;
    if let Some(controller) = state.controllers.get_mut(&player) {
        controller.active.insert(id);
    }

    let frame = state.frame;
    state.push_event(GameEvent::bomb_placed(frame, id, player, cell));
    debug!(player = %player, bomb = id.0, cell = %cell, "bomb placed");
    Some(id)
}

/// Recompute the placement indicator.
///
/// The previous indicator is always dropped. A new one (with a fresh id)
/// appears unless the candidate cell is obstructed.
pub fn update_indicator(state: &mut ArenaState, player: PlayerId) -> Option<Cell> {
    let candidate = candidate_cell(state, player).filter(|cell| !state.is_blocked(*cell));

    let indicator = candidate.map(|cell| BombIndicator {
        id: state.alloc_indicator_id(),
        cell,
    });
    let controller = state.controllers.get_mut(&player)?;
    controller.indicator = indicator;
    candidate
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::fixed::to_fixed;
    use crate::game::bomb::detonate_bomb;
    use crate::game::config::{test_controller_config, ArenaConfig};
    use crate::game::grid::Tile;
    use crate::game::state::{test_arena, ArenaBuilder};
    use proptest::prelude::*;

    const MAP: &str = "\
#######
#1....#
#.#.#.#
#....2#
#######
";

    fn arena_with_limit(limit: u32) -> ArenaState {
        let mut controller = test_controller_config();
        controller.bomb.bomb_limit = limit;
        ArenaBuilder::new()
            .layout(MAP.parse().unwrap())
            .config(ArenaConfig::uniform(controller))
            .build()
            .unwrap()
    }

    fn move_to(state: &mut ArenaState, player: PlayerId, cell: Cell) {
        state.player_mut(player).unwrap().position = cell.to_world();
    }

    #[test]
    fn test_limit_one_scenario() {
        let mut state = test_arena(MAP);

        let a = request_placement(&mut state, PlayerId::One).expect("bomb A placed");
        move_to(&mut state, PlayerId::One, Cell::new(2, 3));
        assert!(request_placement(&mut state, PlayerId::One).is_none());
        assert_eq!(state.controller(PlayerId::One).unwrap().active_count(), 1);

        detonate_bomb(&mut state, a);
        assert_eq!(state.controller(PlayerId::One).unwrap().active_count(), 0);

        move_to(&mut state, PlayerId::One, Cell::new(5, 2));
        assert!(request_placement(&mut state, PlayerId::One).is_some());
    }

    #[test]
    fn test_obstructed_cell_refused() {
        let mut state = test_arena(MAP);
        request_placement(&mut state, PlayerId::Two).unwrap();

        // Player_1 walks onto Player_2's bomb
        move_to(&mut state, PlayerId::One, Cell::new(5, 1));
        let bombs_before = state.bombs.len();
        assert!(request_placement(&mut state, PlayerId::One).is_none());
        assert_eq!(state.bombs.len(), bombs_before);
        assert_eq!(state.controller(PlayerId::One).unwrap().active_count(), 0);
    }

    #[test]
    fn test_destructible_blocks_placement() {
        let mut state = test_arena(MAP);
        state.grid.set_tile(Cell::new(1, 3), Tile::Destructible);
        assert!(request_placement(&mut state, PlayerId::One).is_none());
        assert!(update_indicator(&mut state, PlayerId::One).is_none());
    }

    #[test]
    fn test_zero_limit_never_places() {
        let mut state = arena_with_limit(0);
        assert!(request_placement(&mut state, PlayerId::One).is_none());
    }

    #[test]
    fn test_eliminated_player_cannot_place() {
        let mut state = test_arena(MAP);
        state.eliminate_player(PlayerId::One, None);
        assert!(request_placement(&mut state, PlayerId::One).is_none());
        assert!(update_indicator(&mut state, PlayerId::One).is_none());
    }

    #[test]
    fn test_placement_rounds_position() {
        let mut state = test_arena(MAP);
        let player = state.player_mut(PlayerId::One).unwrap();
        player.position.x += to_fixed(0.49);

        let id = request_placement(&mut state, PlayerId::One).unwrap();
        assert_eq!(state.bombs[&id].cell, Cell::new(1, 3));
    }

    #[test]
    fn test_indicator_refreshes_with_new_id() {
        let mut state = test_arena(MAP);

        assert_eq!(update_indicator(&mut state, PlayerId::One), Some(Cell::new(1, 3)));
        let first = state.controller(PlayerId::One).unwrap().indicator().unwrap();
        update_indicator(&mut state, PlayerId::One);
        let second = state.controller(PlayerId::One).unwrap().indicator().unwrap();
        assert_eq!(first.cell, second.cell);
        assert_ne!(first.id, second.id);

        // Standing on own bomb hides it
        request_placement(&mut state, PlayerId::One).unwrap();
        assert!(update_indicator(&mut state, PlayerId::One).is_none());
        assert!(state.controller(PlayerId::One).unwrap().indicator().is_none());
    }

    proptest! {
        #[test]
        fn prop_active_never_exceeds_limit(
            limit in 0u32..4,
            cells in proptest::collection::vec(0usize..5, 1..20),
        ) {
            let mut state = arena_with_limit(limit);
            let free = [
                Cell::new(1, 3), Cell::new(2, 3), Cell::new(3, 3),
                Cell::new(4, 3), Cell::new(5, 3),
            ];

            for index in cells {
                move_to(&mut state, PlayerId::One, free[index]);
                request_placement(&mut state, PlayerId::One);
                let active = state.controller(PlayerId::One).unwrap().active_count();
                prop_assert!(active as u32 <= limit);
            }
        }
    }
}
