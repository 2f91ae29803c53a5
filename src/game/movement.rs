//! Player Movement
//!
//! Input sets velocity and facing once per frame; position integrates on
//! the fixed step. Each axis moves separately and is rejected if the
//! player box would end up inside a wall or destructible, which lets
//! players slide along corridors. Bombs never block movement.

use std::collections::BTreeMap;

use crate::core::fixed::{fixed_mul, Fixed};
use crate::core::vec2::FixedVec2;
use crate::game::collision::box_hits_blocked;
use crate::game::input::{facing_angle, InputFrame};
use crate::game::state::{ArenaState, PlayerId};

/// Turn this frame's inputs into velocity and facing.
///
/// Players without an entry are treated as idle. Diagonals are not
/// normalized.
pub fn apply_inputs(state: &mut ArenaState, inputs: &BTreeMap<PlayerId, InputFrame>) {
    let controllers = &state.controllers;

    // BTreeMap iterates in sorted key order
    for (id, player) in state.players.iter_mut() {
        if !player.alive {
            continue;
        }
        let Some(controller) = controllers.get(id) else {
            continue;
        };

        let input = inputs.get(id).copied().unwrap_or_default();
        let (x, y) = input.move_axes();
        player.move_axes = (x, y);
        player.velocity = FixedVec2::from_ints(i32::from(x), i32::from(y))
            .scale(controller.config().movement.speed);

        if let Some(angle) = facing_angle(x, y) {
            player.facing_angle = angle;
        }
    }
}

/// Integrate player positions over `dt`.
pub fn update_movement(state: &mut ArenaState, dt: Fixed) {
    let grid = &state.grid;
    let controllers = &state.controllers;

    for (id, player) in state.players.iter_mut() {
        if !player.alive || player.velocity.is_zero() {
            continue;
        }
        let Some(controller) = controllers.get(id) else {
            continue;
        };
        let half = controller.config().movement.hitbox_half_extent;

        let dx = fixed_mul(player.velocity.x, dt);
        let moved_x = FixedVec2::new(player.position.x.wrapping_add(dx), player.position.y);
        if !box_hits_blocked(grid, moved_x, half) {
            player.position = moved_x;
        }

        let dy = fixed_mul(player.velocity.y, dt);
        let moved_y = FixedVec2::new(player.position.x, player.position.y.wrapping_add(dy));
        if !box_hits_blocked(grid, moved_y, half) {
            player.position = moved_y;
        }
    }
}
