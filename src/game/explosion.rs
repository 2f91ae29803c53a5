//! Explosion Propagation and Blast Effects
//!
//! A detonating bomb produces a cross of blast segments: the origin cell
//! plus up to `radius` cells in each direction. Each direction walks
//! independently and stops at the first obstructed cell, which still
//! receives a segment and one destroy attempt.
//!
//! Every segment turns into a [`BlastEffect`] that grows over its
//! lifetime and eliminates any live player it overlaps.

use serde::{Serialize, Deserialize};
use tracing::info;

use crate::core::cell::{Cell, Direction};
use crate::core::fixed::{fixed_div, fixed_mul, fixed_smoothstep, from_int, step_fraction, Fixed, FIXED_ONE};
use crate::game::bomb::BombId;
use crate::game::collision::player_touches_cell;
use crate::game::events::GameEvent;
use crate::game::grid::{OccupancyQuery, TileStore};
use crate::game::config::BombConfig;
use crate::game::scheduler::{catch_up, TimerId, TimerTask};
use crate::game::state::{ArenaState, PlayerId};

/// Unique identifier for a blast effect within a round.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct BlastId(pub u32);

/// One cell of an explosion.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlastSegment {
    /// Cell covered
    pub cell: Cell,
    /// Travel direction (None for the origin)
    pub direction: Option<Direction>,
    /// Cells this direction could still have reached
    pub remaining_length: u32,
}

/// Result of propagating one explosion.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BlastPattern {
    /// Origin first, then each direction outward in `Direction::ALL` order
    pub segments: Vec<BlastSegment>,
    /// Destructibles cleared, in the order they were hit
    pub destroyed: Vec<Cell>,
}

impl BlastPattern {
    /// Does any segment cover `cell`?
    pub fn covers(&self, cell: Cell) -> bool {
        self.segments.iter().any(|s| s.cell == cell)
    }

    /// Segments travelling in `direction`.
    pub fn arm(&self, direction: Direction) -> impl Iterator<Item = &BlastSegment> {
        self.segments
            .iter()
            .filter(move |s| s.direction == Some(direction))
    }
}

/// Walk the blast cross from `origin`.
///
/// The origin is never tested. Each obstructed cell gets a segment and a
/// destroy attempt, then its direction stops. Destruction is written to
/// `world` immediately.
pub fn propagate<W: OccupancyQuery + TileStore>(world: &mut W, origin: Cell, radius: u32) -> BlastPattern {
    let mut pattern = BlastPattern::default();
    pattern.segments.push(BlastSegment {
        cell: origin,
        direction: None,
        remaining_length: radius,
    });

    for direction in Direction::ALL {
        let mut cell = origin;
        let mut remaining = radius;

        while remaining > 0 {
            cell = cell.step(direction);
            remaining -= 1;
            pattern.segments.push(BlastSegment {
                cell,
                direction: Some(direction),
                remaining_length: remaining,
            });

            if world.is_blocked(cell) {
                if world.destroy_tile(cell) {
                    pattern.destroyed.push(cell);
                }
                break;
            }
        }
    }

    pattern
}

/// A live blast cell.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct BlastEffect {
    /// Unique identifier
    pub id: BlastId,
    /// Where it sits
    pub segment: BlastSegment,
    /// Owner of the bomb that spawned it
    pub owner: PlayerId,
    /// Bomb that spawned it
    pub bomb: BombId,
    /// Current render scale
    pub scale: Fixed,
    /// Growth sub-steps taken
    pub step: u32,
    /// Next growth sub-step, if still growing
    pub grow_timer: Option<TimerId>,
    /// End of life
    pub expire_timer: TimerId,
}

/// Propagate a detonating bomb's blast and spawn its effects.
///
/// Emits `BombExploded` and one `TileDestroyed` per cleared tile.
pub fn spawn_explosion(state: &mut ArenaState, bomb: BombId, owner: PlayerId, origin: Cell) -> BlastPattern {
    let Some(config) = state.bomb_config(owner).cloned() else {
        return BlastPattern::default();
    };

    let pattern = propagate(state, origin, config.blast_radius);
    let step_time = blast_step_time(&config);

    for segment in &pattern.segments {
        let id = state.alloc_blast_id();
        let grow_timer = state.scheduler.schedule(step_time, TimerTask::BlastGrow(id));
        let expire_timer = state
            .scheduler
            .schedule(config.blast_lifetime, TimerTask::BlastExpire(id));

        state.blasts.insert(
            id,
            BlastEffect {
                id,
                segment: *segment,
                owner,
                bomb,
                scale: FIXED_ONE,
                step: 0,
                grow_timer: Some(grow_timer),
                expire_timer,
            },
        );
    }

    let frame = state.frame;
    state.push_event(GameEvent::bomb_exploded(
        frame,
        bomb,
        owner,
        origin,
        pattern.segments.len() as u32,
    ));
    for cell in &pattern.destroyed {
        state.push_event(GameEvent::tile_destroyed(frame, bomb, *cell));
    }

    info!(
        bomb = bomb.0,
        owner = %owner,
        cell = %origin,
        segments = pattern.segments.len(),
        "explosion"
    );
    pattern
}

/// Time between growth sub-steps.
///
/// The lifetime is split into `blast_steps + 1` intervals, so the last
/// growth step lands one interval before the blast expires.
pub fn blast_step_time(config: &BombConfig) -> Fixed {
    let intervals = config.blast_steps.saturating_add(1).min(i32::MAX as u32) as i32;
    fixed_div(config.blast_lifetime, from_int(intervals)).max(1)
}

/// Growth timer handler. `overdue` sub-steps are applied at once.
pub fn grow_blast(state: &mut ArenaState, id: BlastId, overdue: Fixed) {
    let Some(owner) = state.blasts.get(&id).map(|b| b.owner) else {
        return;
    };
    let Some(config) = state.bomb_config(owner).cloned() else {
        return;
    };
    let Some(blast) = state.blasts.get_mut(&id) else {
        return;
    };

    let (due, delay) = catch_up(blast_step_time(&config), overdue);
    blast.step = blast.step.saturating_add(due).min(config.blast_steps);
    let eased = fixed_smoothstep(step_fraction(blast.step, config.blast_steps));
    blast.scale = FIXED_ONE + fixed_mul(config.blast_growth, eased);

    blast.grow_timer = if blast.step < config.blast_steps {
        Some(state.scheduler.schedule(delay, TimerTask::BlastGrow(id)))
    } else {
        None
    };
}

/// Expiry timer handler: the blast disappears.
pub fn expire_blast(state: &mut ArenaState, id: BlastId) {
    if let Some(blast) = state.blasts.remove(&id) {
        if let Some(timer) = blast.grow_timer {
            state.scheduler.cancel(timer);
        }
    }
}

/// A live player overlapping a live blast.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BlastHit {
    /// Blast that touched the player
    pub blast: BlastId,
    /// Player touched
    pub victim: PlayerId,
    /// Owner of the blast's bomb
    pub owner: PlayerId,
}

/// Find every live player touching a blast.
///
/// At most one hit per player (lowest blast id). Sorted by blast id,
/// then player.
pub fn collect_blast_hits(state: &ArenaState) -> Vec<BlastHit> {
    let mut hits = Vec::new();

    for player in state.alive_players() {
        let Some(movement) = state.controller_config(player.id).map(|c| &c.movement) else {
            continue;
        };
        let touching = state.blasts.values().find(|blast| {
            player_touches_cell(player.position, movement.hitbox_half_extent, blast.segment.cell)
        });
        if let Some(blast) = touching {
            hits.push(BlastHit {
                blast: blast.id,
                victim: player.id,
                owner: blast.owner,
            });
        }
    }

    hits.sort_by_key(|hit| (hit.blast, hit.victim));
    hits
}

/// Eliminate every live player touching a blast.
///
/// Each elimination raises its own `PlayerEliminated` event. Returns the
/// victims in event order.
pub fn resolve_blast_hits(state: &mut ArenaState) -> Vec<PlayerId> {
    let mut victims = Vec::new();

    for hit in collect_blast_hits(state) {
        if state.eliminate_player(hit.victim, Some(hit.owner)) {
            let frame = state.frame;
            state.push_event(GameEvent::player_eliminated(frame, hit.victim, hit.owner));
            info!(victim = %hit.victim, bomb_owner = %hit.owner, blast = hit.blast.0, "player eliminated");
            victims.push(hit.victim);
        }
    }

    victims
}
