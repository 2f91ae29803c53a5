//! Core deterministic primitives.
//!
//! Fixed-point math, grid coordinates, seeded randomness and state
//! hashing. Nothing here knows about bombs or players.

pub mod fixed;
pub mod vec2;
pub mod cell;
pub mod rng;
pub mod hash;

// Re-export core types
pub use fixed::{Fixed, FIXED_ONE, FIXED_HALF, FIXED_SCALE};
pub use vec2::FixedVec2;
pub use cell::{Cell, Direction};
pub use rng::DeterministicRng;
pub use hash::{compute_state_hash, StateHash};
