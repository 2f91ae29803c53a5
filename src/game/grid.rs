//! Tile Grid and Occupancy
//!
//! The two collaborators the bomb core talks to: an occupancy query
//! ("is this cell blocked?") and a destructible tile store.

use serde::{Serialize, Deserialize};

use crate::core::cell::Cell;
use crate::core::hash::StateHasher;

/// Answers whether a cell is blocked for placement and blast purposes.
pub trait OccupancyQuery {
    /// Is `cell` obstructed (wall, destructible, bomb, or off-grid)?
    fn is_blocked(&self, cell: Cell) -> bool;
}

/// Storage for tiles a blast can remove.
pub trait TileStore {
    /// Clear a destructible tile at `cell`.
    ///
    /// Idempotent: returns `true` only if a destructible was removed.
    /// Walls and empty cells are left alone.
    fn destroy_tile(&mut self, cell: Cell) -> bool;
}

/// Contents of a single grid cell.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u8)]
pub enum Tile {
    /// Open floor
    #[default]
    Empty = 0,
    /// Indestructible wall
    Wall = 1,
    /// Breakable block
    Destructible = 2,
}

impl Tile {
    /// Does this tile obstruct placement, blasts and movement?
    #[inline]
    pub fn is_solid(self) -> bool {
        !matches!(self, Tile::Empty)
    }
}

/// Rectangular tile grid with its origin at cell (0, 0), bottom-left.
///
/// Anything outside the rectangle reads as `Tile::Wall`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArenaGrid {
    width: u32,
    height: u32,
    tiles: Vec<Tile>,
}

impl ArenaGrid {
    /// Create an all-empty grid.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            tiles: vec![Tile::Empty; (width as usize) * (height as usize)],
        }
    }

    /// Width in cells.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Height in cells.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Is the cell inside the grid rectangle?
    #[inline]
    pub fn in_bounds(&self, cell: Cell) -> bool {
        cell.x >= 0 && cell.y >= 0 && (cell.x as u32) < self.width && (cell.y as u32) < self.height
    }

    #[inline]
    fn index(&self, cell: Cell) -> Option<usize> {
        if self.in_bounds(cell) {
            Some(cell.y as usize * self.width as usize + cell.x as usize)
        } else {
            None
        }
    }

    /// Tile at `cell`; off-grid cells are walls.
    #[inline]
    pub fn tile(&self, cell: Cell) -> Tile {
        self.index(cell).map(|i| self.tiles[i]).unwrap_or(Tile::Wall)
    }

    /// Overwrite a tile. Off-grid writes are ignored.
    pub fn set_tile(&mut self, cell: Cell, tile: Tile) {
        if let Some(i) = self.index(cell) {
            self.tiles[i] = tile;
        }
    }

    /// Number of destructible tiles left.
    pub fn destructible_count(&self) -> usize {
        self.tiles.iter().filter(|t| **t == Tile::Destructible).count()
    }

    /// Iterate all cells with their tiles, row by row from y = 0.
    pub fn cells(&self) -> impl Iterator<Item = (Cell, Tile)> + '_ {
        let width = self.width as usize;
        self.tiles.iter().enumerate().map(move |(i, tile)| {
            let cell = Cell::new((i % width) as i32, (i / width) as i32);
            (cell, *tile)
        })
    }

    /// Hash all tiles in storage order.
    pub fn hash_into(&self, hasher: &mut StateHasher) {
        hasher.update_u32(self.width);
        hasher.update_u32(self.height);
        for tile in &self.tiles {
            hasher.update_u8(*tile as u8);
        }
    }
}

impl OccupancyQuery for ArenaGrid {
    fn is_blocked(&self, cell: Cell) -> bool {
        self.tile(cell).is_solid()
    }
}

impl TileStore for ArenaGrid {
    fn destroy_tile(&mut self, cell: Cell) -> bool {
        match self.index(cell) {
            Some(i) if self.tiles[i] == Tile::Destructible => {
                self.tiles[i] = Tile::Empty;
                true
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_out_of_bounds_is_wall() {
        let grid = ArenaGrid::new(3, 3);
        assert_eq!(grid.tile(Cell::new(-1, 0)), Tile::Wall);
        assert_eq!(grid.tile(Cell::new(0, 3)), Tile::Wall);
        assert!(grid.is_blocked(Cell::new(3, 3)));
        assert!(!grid.is_blocked(Cell::new(1, 1)));
    }

    #[test]
    fn test_destroy_tile_idempotent() {
        let mut grid = ArenaGrid::new(3, 3);
        let cell = Cell::new(1, 2);
        grid.set_tile(cell, Tile::Destructible);
        assert!(grid.is_blocked(cell));

        assert!(grid.destroy_tile(cell));
        assert!(!grid.is_blocked(cell));
        assert!(!grid.destroy_tile(cell), "second destroy is a no-op");
    }

    #[test]
    fn test_destroy_leaves_walls() {
        let mut grid = ArenaGrid::new(3, 3);
        let cell = Cell::new(0, 0);
        grid.set_tile(cell, Tile::Wall);
        assert!(!grid.destroy_tile(cell));
        assert_eq!(grid.tile(cell), Tile::Wall);
        assert!(!grid.destroy_tile(Cell::new(10, 10)));
    }

    #[test]
    fn test_cells_iteration() {
        let mut grid = ArenaGrid::new(2, 2);
        grid.set_tile(Cell::new(1, 1), Tile::Destructible);
        let cells: Vec<_> = grid.cells().collect();
        assert_eq!(cells.len(), 4);
        assert_eq!(cells[3], (Cell::new(1, 1), Tile::Destructible));
        assert_eq!(grid.destructible_count(), 1);
    }
}
