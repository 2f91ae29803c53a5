//! Cooperative Timer Scheduler
//!
//! Every fuse, pulse sub-step and blast lifetime is a timer record in one
//! queue, advanced once per frame. There is no hidden suspension: a
//! timer fires by being returned from [`Scheduler::advance`], and is
//! cancelled by being removed from the queue.

use std::collections::BTreeMap;

use serde::{Serialize, Deserialize};
use tracing::trace;

use crate::core::fixed::Fixed;
use crate::core::hash::StateHasher;
use crate::game::bomb::BombId;
use crate::game::explosion::BlastId;

/// Handle to a scheduled timer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TimerId(pub u64);

/// What happens when a timer fires.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum TimerTask {
    /// Bomb fuse ran out
    BombFuse(BombId),
    /// Next pulse sub-step of a bomb
    BombPulse(BombId),
    /// Next growth sub-step of a blast effect
    BlastGrow(BlastId),
    /// Blast effect lifetime is over
    BlastExpire(BlastId),
}

impl TimerTask {
    fn tag(self) -> (u8, u32) {
        match self {
            TimerTask::BombFuse(id) => (0, id.0),
            TimerTask::BombPulse(id) => (1, id.0),
            TimerTask::BlastGrow(id) => (2, id.0),
            TimerTask::BlastExpire(id) => (3, id.0),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
struct Timer {
    remaining: Fixed,
    task: TimerTask,
}

/// A timer that reached zero during [`Scheduler::advance`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FiredTimer {
    /// Handle the timer had while queued
    pub id: TimerId,
    /// Task to run
    pub task: TimerTask,
    /// How far past zero the timer went (>= 0)
    pub overdue: Fixed,
}

/// Split a repeating timer's lateness into whole sub-steps.
///
/// Returns how many sub-steps of `interval` are due now (at least 1) and
/// the delay that keeps the next one on the original cadence.
pub fn catch_up(interval: Fixed, overdue: Fixed) -> (u32, Fixed) {
    let interval = interval.max(1);
    let overdue = overdue.max(0);
    let due = (overdue / interval) as u32 + 1;
    (due, interval - overdue % interval)
}

/// Single-threaded timer queue.
///
/// Uses BTreeMap so iteration (and therefore firing order among equal
/// expiry times) is deterministic.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Scheduler {
    timers: BTreeMap<TimerId, Timer>,
    next_id: u64,
}

impl Scheduler {
    /// Create an empty scheduler.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue `task` to fire after `delay` seconds.
    pub fn schedule(&mut self, delay: Fixed, task: TimerTask) -> TimerId {
        let id = TimerId(self.next_id);
        self.next_id += 1;
        self.timers.insert(id, Timer { remaining: delay, task });
        id
    }

    /// Remove a timer. Returns false if it already fired or was cancelled.
    pub fn cancel(&mut self, id: TimerId) -> bool {
        self.timers.remove(&id).is_some()
    }

    /// Remove every timer at once. Returns how many were dropped.
    pub fn cancel_all(&mut self) -> usize {
        let dropped = self.timers.len();
        self.timers.clear();
        dropped
    }

    /// Time left on a queued timer.
    pub fn remaining(&self, id: TimerId) -> Option<Fixed> {
        self.timers.get(&id).map(|t| t.remaining)
    }

    /// Is the timer still queued?
    pub fn is_pending(&self, id: TimerId) -> bool {
        self.timers.contains_key(&id)
    }

    /// Number of queued timers.
    pub fn len(&self) -> usize {
        self.timers.len()
    }

    /// Is the queue empty?
    pub fn is_empty(&self) -> bool {
        self.timers.is_empty()
    }

    /// Advance all timers by `dt` and dequeue the ones that reached zero.
    ///
    /// Fired timers are returned in expiry order: most overdue first,
    /// ties broken by timer id (scheduling order).
    pub fn advance(&mut self, dt: Fixed) -> Vec<FiredTimer> {
        let mut fired = Vec::new();

        for (id, timer) in self.timers.iter_mut() {
            timer.remaining = timer.remaining.saturating_sub(dt);
            if timer.remaining <= 0 {
                fired.push(FiredTimer {
                    id: *id,
                    task: timer.task,
                    overdue: timer.remaining.saturating_neg(),
                });
            }
        }

        for f in &fired {
            self.timers.remove(&f.id);
            trace!(timer = f.id.0, task = ?f.task, "timer fired");
        }

        fired.sort_by(|a, b| b.overdue.cmp(&a.overdue).then(a.id.cmp(&b.id)));
        fired
    }

    /// Hash queued timers in id order.
    pub fn hash_into(&self, hasher: &mut StateHasher) {
        for (id, timer) in &self.timers {
            let (kind, target) = timer.task.tag();
            hasher.update_u64(id.0);
            hasher.update_u8(kind);
            hasher.update_u32(target);
            hasher.update_fixed(timer.remaining);
        }
    }
}
