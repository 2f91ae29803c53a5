//! Arena Layouts
//!
//! A layout is the immutable blueprint a round is built from: the tile
//! grid plus one spawn cell per player. Restarting a round rebuilds the
//! arena from the same layout.
//!
//! ## Map format
//!
//! ```text
//! #######
//! #1.+..#
//! #.#.#.#
//! #..+.2#
//! #######
//! ```
//!
//! `#` wall, `+` destructible, `.` floor, `1`/`2` player spawns (floor).
//! The first line is the top row.

use std::collections::BTreeMap;
use std::str::FromStr;

use thiserror::Error;

use crate::core::cell::Cell;
use crate::core::fixed::Fixed;
use crate::core::rng::DeterministicRng;
use crate::game::grid::{ArenaGrid, Tile};
use crate::game::state::PlayerId;

/// Smallest generated arena edge (border + one corridor + pillar row).
pub const MIN_GENERATED_EDGE: u32 = 5;

/// Layout errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LayoutError {
    /// Map text had no rows.
    #[error("map is empty")]
    Empty,

    /// A row's width differs from the first row.
    #[error("row {row} has {found} cells, expected {expected}")]
    RaggedRow {
        /// Zero-based text row
        row: usize,
        /// Width of the first row
        expected: usize,
        /// Width of this row
        found: usize,
    },

    /// Unrecognized map character.
    #[error("unknown glyph {glyph:?} at row {row}, column {column}")]
    UnknownGlyph {
        /// Offending character
        glyph: char,
        /// Zero-based text row
        row: usize,
        /// Zero-based column
        column: usize,
    },

    /// A spawn marker appeared twice.
    #[error("duplicate spawn for {0}")]
    DuplicateSpawn(PlayerId),

    /// A player has no spawn marker.
    #[error("no spawn for {0}")]
    MissingSpawn(PlayerId),

    /// Requested generated arena is too small.
    #[error("arena {width}x{height} is smaller than 5x5")]
    TooSmall {
        /// Requested width
        width: u32,
        /// Requested height
        height: u32,
    },
}

/// Blueprint for one round: tiles and spawn cells.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ArenaLayout {
    grid: ArenaGrid,
    spawns: BTreeMap<PlayerId, Cell>,
}

impl ArenaLayout {
    /// Build a layout from parts, checking every player has a spawn.
    pub fn new(grid: ArenaGrid, spawns: BTreeMap<PlayerId, Cell>) -> Result<Self, LayoutError> {
        for id in PlayerId::ALL {
            if !spawns.contains_key(&id) {
                return Err(LayoutError::MissingSpawn(id));
            }
        }
        Ok(Self { grid, spawns })
    }

    /// Generate a classic arena: border walls, pillars on even interior
    /// coordinates, and destructibles scattered with `density`
    /// (FIXED_ONE = every free cell). Player_1 spawns top-left,
    /// Player_2 bottom-right; cells next to a spawn stay clear.
    pub fn generate(width: u32, height: u32, seed: u64, density: Fixed) -> Result<Self, LayoutError> {
        if width < MIN_GENERATED_EDGE || height < MIN_GENERATED_EDGE {
            return Err(LayoutError::TooSmall { width, height });
        }

        let mut rng = DeterministicRng::new(seed);
        let mut grid = ArenaGrid::new(width, height);
        let (w, h) = (width as i32, height as i32);

        let mut spawns = BTreeMap::new();
        spawns.insert(PlayerId::One, Cell::new(1, h - 2));
        spawns.insert(PlayerId::Two, Cell::new(w - 2, 1));

        for y in 0..h {
            for x in 0..w {
                let cell = Cell::new(x, y);
                let border = x == 0 || y == 0 || x == w - 1 || y == h - 1;
                let pillar = x % 2 == 0 && y % 2 == 0;
                let tile = if border || pillar {
                    Tile::Wall
                } else if spawns.values().any(|s| s.manhattan(cell) <= 1) {
                    Tile::Empty
                } else if rng.next_bool(density) {
                    Tile::Destructible
                } else {
                    Tile::Empty
                };
                grid.set_tile(cell, tile);
            }
        }

        Self::new(grid, spawns)
    }

    /// The pristine tile grid.
    pub fn grid(&self) -> &ArenaGrid {
        &self.grid
    }

    /// Spawn cell for a player.
    pub fn spawn(&self, id: PlayerId) -> Option<Cell> {
        self.spawns.get(&id).copied()
    }

    /// All spawns in player order.
    pub fn spawns(&self) -> &BTreeMap<PlayerId, Cell> {
        &self.spawns
    }
}

impl FromStr for ArenaLayout {
    type Err = LayoutError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let rows: Vec<&str> = s
            .lines()
            .map(str::trim_end)
            .filter(|line| !line.is_empty())
            .collect();

        let expected = match rows.first() {
            Some(first) => first.chars().count(),
            None => return Err(LayoutError::Empty),
        };

        let height = rows.len();
        let mut grid = ArenaGrid::new(expected as u32, height as u32);
        let mut spawns = BTreeMap::new();

        for (row, line) in rows.iter().enumerate() {
            let found = line.chars().count();
            if found != expected {
                return Err(LayoutError::RaggedRow { row, expected, found });
            }

            // Text rows run top-down, grid rows bottom-up
            let y = (height - 1 - row) as i32;
            for (column, glyph) in line.chars().enumerate() {
                let cell = Cell::new(column as i32, y);
                let tile = match glyph {
                    '#' => Tile::Wall,
                    '+' => Tile::Destructible,
                    '.' => Tile::Empty,
                    '1' | '2' => {
                        let id = if glyph == '1' { PlayerId::One } else { PlayerId::Two };
                        if spawns.insert(id, cell).is_some() {
                            return Err(LayoutError::DuplicateSpawn(id));
                        }
                        Tile::Empty
                    }
                    _ => return Err(LayoutError::UnknownGlyph { glyph, row, column }),
                };
                grid.set_tile(cell, tile);
            }
        }

        Self::new(grid, spawns)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::fixed::{FIXED_ONE, FIXED_HALF};

    const SMALL_MAP: &str = "\
#####
#1.+#
#.#.#
#+.2#
#####
";

    #[test]
    fn test_parse_small_map() {
        let layout: ArenaLayout = SMALL_MAP.parse().unwrap();
        let grid = layout.grid();

        assert_eq!(grid.width(), 5);
        assert_eq!(grid.height(), 5);
        assert_eq!(layout.spawn(PlayerId::One), Some(Cell::new(1, 3)));
        assert_eq!(layout.spawn(PlayerId::Two), Some(Cell::new(3, 1)));
        assert_eq!(grid.tile(Cell::new(3, 3)), Tile::Destructible);
        assert_eq!(grid.tile(Cell::new(2, 2)), Tile::Wall);
        assert_eq!(grid.tile(Cell::new(1, 3)), Tile::Empty);
        assert_eq!(grid.destructible_count(), 2);
    }

    #[test]
    fn test_parse_errors() {
        assert_eq!("".parse::<ArenaLayout>(), Err(LayoutError::Empty));

        assert_eq!(
            "###\n#1\n###".parse::<ArenaLayout>(),
            Err(LayoutError::RaggedRow { row: 1, expected: 3, found: 2 })
        );

        assert_eq!(
            "#1x2#".parse::<ArenaLayout>(),
            Err(LayoutError::UnknownGlyph { glyph: 'x', row: 0, column: 2 })
        );

        assert_eq!(
            "#11#".parse::<ArenaLayout>(),
            Err(LayoutError::DuplicateSpawn(PlayerId::One))
        );

        assert_eq!(
            "#1.#".parse::<ArenaLayout>(),
            Err(LayoutError::MissingSpawn(PlayerId::Two))
        );
    }

    #[test]
    fn test_generate_structure() {
        let layout = ArenaLayout::generate(9, 7, 42, FIXED_HALF).unwrap();
        let grid = layout.grid();

        // Border and pillars
        assert_eq!(grid.tile(Cell::new(0, 3)), Tile::Wall);
        assert_eq!(grid.tile(Cell::new(8, 3)), Tile::Wall);
        assert_eq!(grid.tile(Cell::new(2, 2)), Tile::Wall);
        assert_eq!(grid.tile(Cell::new(4, 4)), Tile::Wall);

        // Spawn corners stay clear
        for id in PlayerId::ALL {
            let spawn = layout.spawn(id).unwrap();
            assert_eq!(grid.tile(spawn), Tile::Empty);
            for dir in crate::core::cell::Direction::ALL {
                assert_ne!(grid.tile(spawn.step(dir)), Tile::Destructible);
            }
        }
    }

    #[test]
    fn test_generate_deterministic() {
        let a = ArenaLayout::generate(11, 11, 7, FIXED_HALF).unwrap();
        let b = ArenaLayout::generate(11, 11, 7, FIXED_HALF).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_generate_density_extremes() {
        let empty = ArenaLayout::generate(9, 9, 1, 0).unwrap();
        assert_eq!(empty.grid().destructible_count(), 0);

        let full = ArenaLayout::generate(9, 9, 1, FIXED_ONE).unwrap();
        assert!(full.grid().destructible_count() > 0);
    }

    #[test]
    fn test_generate_too_small() {
        assert_eq!(
            ArenaLayout::generate(3, 9, 1, 0),
            Err(LayoutError::TooSmall { width: 3, height: 9 })
        );
    }
}
