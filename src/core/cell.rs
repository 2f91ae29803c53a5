//! Grid Cells and Directions
//!
//! Integer lattice coordinates. A cell is the unit of bomb placement,
//! blast propagation and tile storage.

use std::fmt;
use serde::{Serialize, Deserialize};

use super::fixed::fixed_round;
use super::vec2::FixedVec2;

/// Integer (x, y) grid coordinate. +y is up.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub struct Cell {
    /// Column
    pub x: i32,
    /// Row (grows upward)
    pub y: i32,
}

impl Cell {
    /// Create a cell.
    #[inline]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Snap a continuous world position to the nearest lattice point.
    #[inline]
    pub fn from_world(position: FixedVec2) -> Self {
        Self {
            x: fixed_round(position.x),
            y: fixed_round(position.y),
        }
    }

    /// World-space center of this cell.
    #[inline]
    pub fn to_world(self) -> FixedVec2 {
        FixedVec2::from_ints(self.x, self.y)
    }

    /// The neighbouring cell one step in `direction`.
    #[inline]
    pub fn step(self, direction: Direction) -> Self {
        let (dx, dy) = direction.delta();
        Self {
            x: self.x.wrapping_add(dx),
            y: self.y.wrapping_add(dy),
        }
    }

    /// Manhattan distance to another cell.
    #[inline]
    pub fn manhattan(self, other: Self) -> u32 {
        self.x.abs_diff(other.x) + self.y.abs_diff(other.y)
    }
}

impl fmt::Debug for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// Cardinal direction of a blast arm.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum Direction {
    /// +y
    Up = 0,
    /// -y
    Down = 1,
    /// -x
    Left = 2,
    /// +x
    Right = 3,
}

impl Direction {
    /// All four directions in propagation order.
    pub const ALL: [Direction; 4] = [
        Direction::Up,
        Direction::Down,
        Direction::Left,
        Direction::Right,
    ];

    /// Unit offset for this direction.
    #[inline]
    pub const fn delta(self) -> (i32, i32) {
        match self {
            Direction::Up => (0, 1),
            Direction::Down => (0, -1),
            Direction::Left => (-1, 0),
            Direction::Right => (1, 0),
        }
    }
}
