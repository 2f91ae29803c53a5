//! # Blast Arena
//!
//! Deterministic two-player bomb arena simulation.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                        BLAST ARENA                           │
//! ├─────────────────────────────────────────────────────────────┤
//! │  core/           - Deterministic primitives                  │
//! │  ├── fixed.rs    - Q16.16 fixed-point arithmetic             │
//! │  ├── vec2.rs     - 2D vector with fixed-point                │
//! │  ├── cell.rs     - Grid cells and directions                 │
//! │  ├── rng.rs      - Deterministic Xorshift128+ PRNG           │
//! │  └── hash.rs     - State hashing for verification            │
//! │                                                              │
//! │  game/           - Game logic (deterministic)                │
//! │  ├── grid.rs     - Tiles, occupancy, destructible store      │
//! │  ├── layout.rs   - Map parsing and generation                │
//! │  ├── config.rs   - Controller configuration                  │
//! │  ├── scheduler.rs- Cooperative timer queue                   │
//! │  ├── bomb.rs     - Bomb fuse and pulse                       │
//! │  ├── placement.rs- Bomb limit, legality, indicator           │
//! │  ├── explosion.rs- Blast propagation and hits                │
//! │  ├── collision.rs- Box overlap tests                         │
//! │  ├── input.rs    - Input flags and recording                 │
//! │  ├── movement.rs - Player movement                           │
//! │  ├── state.rs    - Arena state and builder                   │
//! │  ├── match_state.rs - Win tallies and pause flag             │
//! │  ├── events.rs   - Game events                               │
//! │  └── tick.rs     - Frame / fixed-step hooks, replay          │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Determinism Guarantee
//!
//! - No floating-point arithmetic in game logic (config floats are
//!   converted once at load)
//! - No HashMap (uses BTreeMap for sorted iteration)
//! - No system time dependencies; the driver supplies every `dt`
//! - All randomness from seeded Xorshift128+
//!
//! Given identical layout, config, inputs and `dt` sequence, a round
//! produces an identical state hash.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]

pub mod core;
pub mod game;

// Re-export commonly used types
pub use core::fixed::{Fixed, FIXED_ONE, FIXED_HALF, FIXED_SCALE};
pub use core::vec2::FixedVec2;
pub use core::cell::{Cell, Direction};
pub use core::rng::DeterministicRng;
pub use game::input::{InputFrame, InputDelta, PlayerInputBuffer};
pub use game::state::{ArenaBuilder, ArenaState, PlayerId, PlayerState};
pub use game::match_state::MatchState;
pub use game::tick::{ArenaSession, SimulationLoop, TickResult};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Render frame rate the bundled timings assume (Hz)
pub const FRAME_RATE: u32 = 60;

/// Fixed physics step rate (Hz)
pub const FIXED_STEP_RATE: u32 = 50;
