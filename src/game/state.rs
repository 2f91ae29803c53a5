//! Arena State Definitions
//!
//! Everything that exists during one round: tiles, players, bombs, live
//! blast effects and the timers driving them. Uses BTreeMap for
//! deterministic iteration order.
//!
//! A round is rebuilt from its [`ArenaLayout`] on restart; the win
//! tallies live in [`crate::game::match_state::MatchState`] instead and
//! survive restarts.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Serialize, Deserialize};
use thiserror::Error;
use tracing::{debug, info};

use crate::core::cell::Cell;
use crate::core::fixed::Fixed;
use crate::core::hash::{compute_state_hash, StateHash};
use crate::core::vec2::FixedVec2;
use crate::game::bomb::{Bomb, BombId, BombState};
use crate::game::config::{ArenaConfig, BombConfig, ConfigError, ControllerConfig};
use crate::game::events::GameEvent;
use crate::game::explosion::{BlastEffect, BlastId};
use crate::game::grid::{ArenaGrid, OccupancyQuery, TileStore};
use crate::game::layout::{ArenaLayout, LayoutError};
use crate::game::placement::BombController;
use crate::game::scheduler::Scheduler;

// =============================================================================
// PLAYER ID
// =============================================================================

/// Stable player slot.
///
/// Serialized as `"Player_1"` / `"Player_2"`, the names the match
/// controller credits wins by.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum PlayerId {
    /// First player
    #[serde(rename = "Player_1")]
    One,
    /// Second player
    #[serde(rename = "Player_2")]
    Two,
}

impl PlayerId {
    /// Both slots in order.
    pub const ALL: [PlayerId; 2] = [PlayerId::One, PlayerId::Two];

    /// The other player.
    #[inline]
    pub fn opponent(self) -> PlayerId {
        match self {
            PlayerId::One => PlayerId::Two,
            PlayerId::Two => PlayerId::One,
        }
    }

    /// Stable name.
    pub fn name(self) -> &'static str {
        match self {
            PlayerId::One => "Player_1",
            PlayerId::Two => "Player_2",
        }
    }

    /// Parse a stable name.
    pub fn from_name(name: &str) -> Option<Self> {
        PlayerId::ALL.into_iter().find(|id| id.name() == name)
    }
}

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// =============================================================================
// PLAYER STATE
// =============================================================================

/// State of a single player in the arena.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PlayerState {
    /// Player slot
    pub id: PlayerId,

    /// Continuous world position
    pub position: FixedVec2,

    /// Velocity applied on the next fixed step (units/second)
    pub velocity: FixedVec2,

    /// Last movement axes read from input, each in {-1, 0, 1}
    pub move_axes: (i8, i8),

    /// Sprite rotation in degrees, kept from the last non-idle input
    pub facing_angle: i32,

    /// Is player still in play?
    pub alive: bool,

    /// Frame the player was eliminated on
    pub eliminated_frame: Option<u32>,

    /// Owner of the bomb that eliminated this player
    pub eliminated_by: Option<PlayerId>,
}

impl PlayerState {
    /// Create a live player standing on `cell`.
    pub fn new(id: PlayerId, cell: Cell) -> Self {
        Self {
            id,
            position: cell.to_world(),
            velocity: FixedVec2::ZERO,
            move_axes: (0, 0),
            facing_angle: 0,
            alive: true,
            eliminated_frame: None,
            eliminated_by: None,
        }
    }

    /// Cell the player would drop a bomb on.
    #[inline]
    pub fn cell(&self) -> Cell {
        Cell::from_world(self.position)
    }
}

// =============================================================================
// SETUP
// =============================================================================

/// Errors raised while assembling an arena. These are fatal: an arena
/// with a missing collaborator is never built.
#[derive(Debug, Error)]
pub enum SetupError {
    /// No layout, so no destructible tile store.
    #[error("no arena layout (destructible tile store) supplied")]
    MissingLayout,

    /// No configuration supplied.
    #[error("no arena configuration supplied")]
    MissingConfig,

    /// Configuration rejected.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Layout rejected.
    #[error(transparent)]
    Layout(#[from] LayoutError),
}

/// Assembles an [`ArenaState`] from its injected collaborators.
#[derive(Default)]
pub struct ArenaBuilder {
    layout: Option<ArenaLayout>,
    config: Option<ArenaConfig>,
}

impl ArenaBuilder {
    /// Start an empty builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Supply the layout (tiles + spawns).
    pub fn layout(mut self, layout: ArenaLayout) -> Self {
        self.layout = Some(layout);
        self
    }

    /// Supply the controller configuration.
    pub fn config(mut self, config: ArenaConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Validate and build. Fails fast on any missing piece.
    pub fn build(self) -> Result<ArenaState, SetupError> {
        let layout = self.layout.ok_or(SetupError::MissingLayout)?;
        let config = self.config.ok_or(SetupError::MissingConfig)?;
        config.validate()?;
        for id in PlayerId::ALL {
            if layout.spawn(id).is_none() {
                return Err(LayoutError::MissingSpawn(id).into());
            }
        }

        let mut state = ArenaState {
            frame: 0,
            grid: layout.grid().clone(),
            layout,
            config,
            players: BTreeMap::new(),
            controllers: BTreeMap::new(),
            bombs: BTreeMap::new(),
            blasts: BTreeMap::new(),
            scheduler: Scheduler::new(),
            next_bomb_id: 0,
            next_blast_id: 0,
            next_indicator_id: 0,
            pending_events: Vec::new(),
        };
        state.populate();
        info!(
            width = state.grid.width(),
            height = state.grid.height(),
            destructibles = state.grid.destructible_count(),
            "arena built"
        );
        Ok(state)
    }
}

// =============================================================================
// ARENA STATE
// =============================================================================

/// Complete state of one round.
#[derive(Clone, Debug)]
pub struct ArenaState {
    /// Frames simulated this round
    pub frame: u32,

    /// Blueprint the round was built from
    layout: ArenaLayout,

    /// Controller settings
    config: ArenaConfig,

    /// Live tiles (destructibles disappear as blasts hit them)
    pub grid: ArenaGrid,

    /// Players (BTreeMap for deterministic iteration)
    pub players: BTreeMap<PlayerId, PlayerState>,

    /// One bomb controller per player
    pub controllers: BTreeMap<PlayerId, BombController>,

    /// Bomb entities, placed or mid-explosion
    pub bombs: BTreeMap<BombId, Bomb>,

    /// Live blast effects
    pub blasts: BTreeMap<BlastId, BlastEffect>,

    /// Fuse, pulse and blast timers
    pub scheduler: Scheduler,

    next_bomb_id: u32,
    next_blast_id: u32,
    next_indicator_id: u32,

    /// Events generated this frame
    pending_events: Vec<GameEvent>,
}

impl ArenaState {
    /// Place players and controllers according to the layout.
    fn populate(&mut self) {
        for (id, spawn) in self.layout.spawns() {
            self.players.insert(*id, PlayerState::new(*id, *spawn));
        }
        for (id, controller) in &self.config.controllers {
            if self.players.contains_key(id) {
                self.controllers.insert(*id, BombController::new(controller.clone()));
            }
        }
    }

    /// Tear the round down and rebuild it from the layout.
    ///
    /// Every queued timer is cancelled first, so nothing scheduled in the
    /// old round can fire into the new one.
    pub fn reset_round(&mut self) {
        let cancelled = self.scheduler.cancel_all();
        debug!(cancelled, "cancelled in-flight timers");

        self.frame = 0;
        self.grid = self.layout.grid().clone();
        self.players.clear();
        self.controllers.clear();
        self.bombs.clear();
        self.blasts.clear();
        self.pending_events.clear();
        self.populate();
    }

    /// The layout this arena rebuilds from.
    pub fn layout(&self) -> &ArenaLayout {
        &self.layout
    }

    /// Controller settings for a player.
    pub fn controller_config(&self, id: PlayerId) -> Option<&ControllerConfig> {
        self.controllers.get(&id).map(|c| c.config())
    }

    /// Bomb settings for a player.
    pub fn bomb_config(&self, id: PlayerId) -> Option<&BombConfig> {
        self.controller_config(id).map(|c| &c.bomb)
    }

    /// Get a player by ID.
    pub fn player(&self, id: PlayerId) -> Option<&PlayerState> {
        self.players.get(&id)
    }

    /// Get a player mutably by ID.
    pub fn player_mut(&mut self, id: PlayerId) -> Option<&mut PlayerState> {
        self.players.get_mut(&id)
    }

    /// Get a bomb controller by player.
    pub fn controller(&self, id: PlayerId) -> Option<&BombController> {
        self.controllers.get(&id)
    }

    /// Players still in play.
    pub fn alive_players(&self) -> impl Iterator<Item = &PlayerState> {
        self.players.values().filter(|p| p.alive)
    }

    /// Bomb entity sitting on `cell`, if any.
    pub fn bomb_at(&self, cell: Cell) -> Option<&Bomb> {
        self.bombs
            .values()
            .find(|b| b.cell == cell && b.state != BombState::Removed)
    }

    /// Fuse time left on a bomb (None once it has gone off).
    pub fn fuse_remaining(&self, id: BombId) -> Option<Fixed> {
        let bomb = self.bombs.get(&id)?;
        self.scheduler.remaining(bomb.fuse_timer)
    }

    /// Remove a player from play.
    ///
    /// Returns false if the player was already out.
    pub fn eliminate_player(&mut self, victim: PlayerId, by: Option<PlayerId>) -> bool {
        let frame = self.frame;
        let Some(player) = self.players.get_mut(&victim) else {
            return false;
        };
        if !player.alive {
            return false;
        }

        player.alive = false;
        player.velocity = FixedVec2::ZERO;
        player.move_axes = (0, 0);
        player.eliminated_frame = Some(frame);
        player.eliminated_by = by;

        if let Some(controller) = self.controllers.get_mut(&victim) {
            controller.clear_indicator();
        }
        true
    }

    /// Stop every player where they stand (round over).
    pub fn freeze_players(&mut self) {
        for player in self.players.values_mut() {
            player.velocity = FixedVec2::ZERO;
            player.move_axes = (0, 0);
        }
        for controller in self.controllers.values_mut() {
            controller.clear_indicator();
        }
    }

    /// Allocate a bomb id.
    pub(crate) fn alloc_bomb_id(&mut self) -> BombId {
        let id = BombId(self.next_bomb_id);
        self.next_bomb_id += 1;
        id
    }

    /// Allocate a blast id.
    pub(crate) fn alloc_blast_id(&mut self) -> BlastId {
        let id = BlastId(self.next_blast_id);
        self.next_blast_id += 1;
        id
    }

    /// Allocate an indicator id.
    pub(crate) fn alloc_indicator_id(&mut self) -> u32 {
        let id = self.next_indicator_id;
        self.next_indicator_id += 1;
        id
    }

    /// Take pending events (consumes them).
    pub fn take_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.pending_events)
    }

    /// Push a game event.
    pub fn push_event(&mut self, event: GameEvent) {
        self.pending_events.push(event);
    }

    /// Compute hash of current state for verification.
    pub fn compute_hash(&self) -> StateHash {
        compute_state_hash(self.frame, |hasher| {
            for player in self.players.values() {
                hasher.update_u8(player.id as u8);
                hasher.update_vec2(player.position);
                hasher.update_vec2(player.velocity);
                hasher.update_i32(player.facing_angle);
                hasher.update_bool(player.alive);
            }

            self.grid.hash_into(hasher);

            for bomb in self.bombs.values() {
                hasher.update_u32(bomb.id.0);
                hasher.update_cell(bomb.cell);
                hasher.update_u8(bomb.state as u8);
                hasher.update_fixed(bomb.pulse.scale);
            }

            for blast in self.blasts.values() {
                hasher.update_u32(blast.id.0);
                hasher.update_cell(blast.segment.cell);
                hasher.update_fixed(blast.scale);
            }

            self.scheduler.hash_into(hasher);
        })
    }
}

impl OccupancyQuery for ArenaState {
    /// Tiles and bombs both block.
    fn is_blocked(&self, cell: Cell) -> bool {
        self.grid.is_blocked(cell) || self.bomb_at(cell).is_some()
    }
}

impl TileStore for ArenaState {
    fn destroy_tile(&mut self, cell: Cell) -> bool {
        self.grid.destroy_tile(cell)
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
pub(crate) fn test_arena(map: &str) -> ArenaState {
    use crate::game::config::test_controller_config;

    ArenaBuilder::new()
        .layout(map.parse().expect("test map parses"))
        .config(ArenaConfig::uniform(test_controller_config()))
        .build()
        .expect("test arena builds")
}
