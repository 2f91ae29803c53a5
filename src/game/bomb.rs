//! Bomb Entities
//!
//! A bomb sits on one cell from placement until its fuse runs out. While
//! waiting it pulses (grow, shrink, repeat) on its own sub-step timer.
//! When the fuse fires, [`detonate_bomb`] runs the whole explosion
//! sequence in a fixed order.

use serde::{Serialize, Deserialize};
use tracing::{debug, warn};

use crate::core::cell::Cell;
use crate::core::fixed::{fixed_mul, fixed_smoothstep, step_fraction, Fixed, FIXED_ONE};
use crate::game::explosion::spawn_explosion;
use crate::game::scheduler::{catch_up, TimerId, TimerTask};
use crate::game::state::{ArenaState, PlayerId};

/// Unique identifier for a bomb within a round.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct BombId(pub u32);

/// Lifecycle of a bomb.
///
/// `Placed -> Exploding -> Removed`, never backwards.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u8)]
pub enum BombState {
    /// Fuse is burning
    Placed = 0,
    /// Fuse ran out, blast being spawned
    Exploding = 1,
    /// Gone from the arena
    Removed = 2,
}

/// Which half of the pulse cycle is running.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum PulsePhase {
    /// Scaling up towards 1 + amount
    Grow,
    /// Scaling back down to 1
    Shrink,
}

/// Idle "breathing" animation of a placed bomb.
///
/// Scale is computed from the step index each time, so it never
/// compounds: it stays within [1, 1 + amount] however long it runs.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PulseCycle {
    /// Current half-cycle
    pub phase: PulsePhase,
    /// Sub-step within the half-cycle
    pub step: u32,
    /// Current render scale
    pub scale: Fixed,
}

impl Default for PulseCycle {
    fn default() -> Self {
        Self {
            phase: PulsePhase::Grow,
            step: 0,
            scale: FIXED_ONE,
        }
    }
}

impl PulseCycle {
    /// Move one sub-step forward.
    pub fn advance(&mut self, steps: u32, amount: Fixed) {
        self.step += 1;
        let eased = fixed_mul(amount, fixed_smoothstep(step_fraction(self.step, steps)));
        self.scale = match self.phase {
            PulsePhase::Grow => FIXED_ONE + eased,
            PulsePhase::Shrink => FIXED_ONE + amount - eased,
        };

        if self.step >= steps {
            self.step = 0;
            self.phase = match self.phase {
                PulsePhase::Grow => PulsePhase::Shrink,
                PulsePhase::Shrink => PulsePhase::Grow,
            };
        }
    }
}

/// A placed bomb.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Bomb {
    /// Unique identifier
    pub id: BombId,
    /// Player whose controller placed it
    pub owner: PlayerId,
    /// Cell it sits on
    pub cell: Cell,
    /// Lifecycle stage
    pub state: BombState,
    /// Idle animation
    pub pulse: PulseCycle,
    /// Fuse timer handle
    pub fuse_timer: TimerId,
    /// Pending pulse sub-step, if any
    pub pulse_timer: Option<TimerId>,
}

impl Bomb {
    /// Enter the Exploding stage.
    ///
    /// Returns the pulse timer that must be cancelled, or None if the
    /// bomb was not in the Placed stage.
    pub fn begin_explosion(&mut self) -> Option<Option<TimerId>> {
        if self.state != BombState::Placed {
            return None;
        }
        self.state = BombState::Exploding;
        Some(self.pulse_timer.take())
    }
}

/// Put a bomb on `cell` and start its fuse and pulse timers.
///
/// Legality (limit, obstruction) is the caller's job.
pub(crate) fn arm_bomb(state: &mut ArenaState, owner: PlayerId, cell: Cell) -> Option<BombId> {
    let config = state.bomb_config(owner)?.clone();
    let id = state.alloc_bomb_id();

    let fuse_timer = state.scheduler.schedule(config.fuse_time, TimerTask::BombFuse(id));
    let pulse_timer = state
        .scheduler
        .schedule(config.pulse_step_time, TimerTask::BombPulse(id));

    state.bombs.insert(
        id,
        Bomb {
            id,
            owner,
            cell,
            state: BombState::Placed,
            pulse: PulseCycle::default(),
            fuse_timer,
            pulse_timer: Some(pulse_timer),
        },
    );
    Some(id)
}

/// Pulse timer handler: advance the animation and queue the next sub-step.
///
/// `overdue` is how late the timer fired. Sub-steps that fell inside it
/// are applied now and the next one keeps the original cadence.
pub fn pulse_bomb(state: &mut ArenaState, id: BombId, overdue: Fixed) {
    let Some(owner) = state.bombs.get(&id).map(|b| b.owner) else {
        return;
    };
    let Some(config) = state.bomb_config(owner).cloned() else {
        return;
    };
    let Some(bomb) = state.bombs.get_mut(&id) else {
        return;
    };
    if bomb.state != BombState::Placed {
        return;
    }

    let (due, delay) = catch_up(config.pulse_step_time, overdue);
    // A full grow+shrink cycle returns to the same phase and scale
    let cycle = config.pulse_steps.saturating_mul(2).max(1);
    let due = if due > cycle { cycle + due % cycle } else { due };
    for _ in 0..due {
        bomb.pulse.advance(config.pulse_steps, config.pulse_amount);
    }
    bomb.pulse_timer = Some(state.scheduler.schedule(delay, TimerTask::BombPulse(id)));
}

/// Fuse timer handler.
///
/// Runs, in order: free the owner's slot, enter Exploding, stop the
/// pulse, propagate and spawn the blast, enter Removed, dispose. Returns
/// the disposed bomb, or None if `id` is not a placed bomb.
pub fn detonate_bomb(state: &mut ArenaState, id: BombId) -> Option<Bomb> {
    let bomb = state.bombs.get_mut(&id)?;
    if bomb.state != BombState::Placed {
        warn!(bomb = id.0, state = ?bomb.state, "fuse fired on bomb that is not placed");
        return None;
    }
    let (owner, cell, fuse_timer) = (bomb.owner, bomb.cell, bomb.fuse_timer);

    if let Some(controller) = state.controllers.get_mut(&owner) {
        controller.release(id);
    }

    if let Some(Some(pulse_timer)) = bomb.begin_explosion() {
        state.scheduler.cancel(pulse_timer);
    }
    state.scheduler.cancel(fuse_timer);

    let pattern = spawn_explosion(state, id, owner, cell);
    debug!(
        bomb = id.0,
        owner = %owner,
        cell = %cell,
        segments = pattern.segments.len(),
        destroyed = pattern.destroyed.len(),
        "bomb detonated"
    );

    let mut bomb = state.bombs.remove(&id)?;
    bomb.state = BombState::Removed;
    Some(bomb)
}
