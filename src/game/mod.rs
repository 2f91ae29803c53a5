//! Game Logic Module
//!
//! All game simulation code. 100% deterministic.
//!
//! ## Module Structure
//!
//! - `grid`: Tile grid, occupancy query, destructible tile store
//! - `layout`: Arena blueprints (ASCII maps, seeded generation)
//! - `config`: Per-controller tuning loaded from JSON
//! - `scheduler`: Timer queue for fuses, pulses and blasts
//! - `bomb`: Bomb lifecycle and pulse animation
//! - `placement`: Bomb limit, placement legality, indicator
//! - `explosion`: Blast propagation, blast effects, player hits
//! - `collision`: Box overlap tests
//! - `input`: Input flags, facing, recording
//! - `movement`: Velocity from input, fixed-step integration
//! - `state`: One round's world and its builder
//! - `match_state`: Wins and pause flag across rounds
//! - `events`: Game events for logging/replay
//! - `tick`: Simulation hooks, restart, replay

pub mod grid;
pub mod layout;
pub mod config;
pub mod scheduler;
pub mod bomb;
pub mod placement;
pub mod explosion;
pub mod collision;
pub mod input;
pub mod movement;
pub mod state;
pub mod match_state;
pub mod events;
pub mod tick;

// Re-export key types
pub use input::{InputFrame, InputDelta, PlayerInputBuffer};
pub use state::{ArenaBuilder, ArenaState, PlayerState, PlayerId};
pub use match_state::MatchState;
pub use tick::{ArenaSession, SimulationLoop, TickResult};
pub use events::GameEvent;
