//! Collision Detection
//!
//! Deterministic axis-aligned box tests. Players are squares of a
//! configured half extent; tiles and blast cells are unit squares
//! centred on their lattice point.

use crate::core::cell::Cell;
use crate::core::fixed::{fixed_abs, fixed_round, Fixed, FIXED_HALF};
use crate::core::vec2::FixedVec2;
use crate::game::grid::OccupancyQuery;

/// Check if two axis-aligned boxes overlap.
///
/// Touching edges do not count.
#[inline]
pub fn boxes_overlap(
    pos_a: FixedVec2,
    half_a: Fixed,
    pos_b: FixedVec2,
    half_b: Fixed,
) -> bool {
    let reach = half_a + half_b;
    fixed_abs(pos_a.x - pos_b.x) < reach && fixed_abs(pos_a.y - pos_b.y) < reach
}

/// Does a player box touch the unit square of `cell`?
#[inline]
pub fn player_touches_cell(position: FixedVec2, half_extent: Fixed, cell: Cell) -> bool {
    boxes_overlap(position, half_extent, cell.to_world(), FIXED_HALF)
}

/// Would a box at `center` overlap any blocked cell of `tiles`?
pub fn box_hits_blocked<Q: OccupancyQuery + ?Sized>(tiles: &Q, center: FixedVec2, half_extent: Fixed) -> bool {
    // One cell of margin each side; the exact test below filters
    let min_x = fixed_round(center.x - half_extent) - 1;
    let max_x = fixed_round(center.x + half_extent) + 1;
    let min_y = fixed_round(center.y - half_extent) - 1;
    let max_y = fixed_round(center.y + half_extent) + 1;

    for y in min_y..=max_y {
        for x in min_x..=max_x {
            let cell = Cell::new(x, y);
            if tiles.is_blocked(cell) && player_touches_cell(center, half_extent, cell) {
                return true;
            }
        }
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::fixed::{to_fixed, FIXED_ONE};
    use crate::game::grid::{ArenaGrid, Tile};

    #[test]
    fn test_boxes_overlap() {
        let a = FixedVec2::from_ints(0, 0);
        let b = FixedVec2::new(to_fixed(0.8), 0);
        assert!(boxes_overlap(a, to_fixed(0.5), b, to_fixed(0.35)));
        assert!(!boxes_overlap(a, to_fixed(0.4), b, to_fixed(0.4)), "touching is not overlap");
        assert!(!boxes_overlap(a, FIXED_HALF, FixedVec2::from_ints(1, 1), to_fixed(0.3)));
    }

    #[test]
    fn test_player_touches_cell() {
        let half = to_fixed(0.35);
        let cell = Cell::new(2, 2);
        assert!(player_touches_cell(cell.to_world(), half, cell));

        // Standing on the neighbour, not touching
        assert!(!player_touches_cell(Cell::new(3, 2).to_world(), half, cell));

        // Straddling the border
        let straddle = FixedVec2::new(to_fixed(2.7), to_fixed(2.0));
        assert!(player_touches_cell(straddle, half, cell));
        assert!(player_touches_cell(straddle, half, Cell::new(3, 2)));
    }

    #[test]
    fn test_box_hits_blocked() {
        let mut grid = ArenaGrid::new(5, 5);
        grid.set_tile(Cell::new(3, 2), Tile::Wall);
        let half = to_fixed(0.35);

        assert!(!box_hits_blocked(&grid, Cell::new(2, 2).to_world(), half));
        let nudged = FixedVec2::new(2 * FIXED_ONE + to_fixed(0.2), 2 * FIXED_ONE);
        assert!(box_hits_blocked(&grid, nudged, half));

        // Off-grid counts as blocked
        assert!(box_hits_blocked(&grid, FixedVec2::new(0, to_fixed(-0.2)), half));
    }
}
