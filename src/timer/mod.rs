//! Named countdown timers owned by the boss or the player.
//!
//! Every piece of scheduled combat work (attack windups, explosions, re-arming
//! the decision timer, the invincibility window) runs on a [`TimerEngine`].
//! Completions are edge-triggered: [`TimerEngine::has_finished`] reports a
//! completion once and then reads `false` until the timer completes again.
//!
//! Short fixed-duration effects use the coarser [`deferred::DeferredQueue`].

pub mod deferred;

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;

pub use deferred::DeferredQueue;

/// Convert frame seconds to a [`Duration`], rounded to whole microseconds.
///
/// Rounding keeps decimal frame steps (0.1, 0.05, 1/60 …) from drifting when
/// they are summed over many ticks.
pub fn secs(seconds: f32) -> Duration {
    if !seconds.is_finite() || seconds <= 0.0 {
        return Duration::ZERO;
    }
    Duration::from_micros((seconds as f64 * 1_000_000.0).round() as u64)
}

/// Monotonic encounter clock advanced by the frame tick.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Clock {
    now: Duration,
}

impl Clock {
    pub fn now(&self) -> Duration {
        self.now
    }

    /// Advance by `elapsed` frame seconds and return the step as a duration.
    pub fn advance(&mut self, elapsed: f32) -> Duration {
        let step = secs(elapsed);
        self.now += step;
        step
    }

    pub fn reset(&mut self) {
        self.now = Duration::ZERO;
    }
}

/// Entity that scheduled a timer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TimerOwner {
    Boss,
    Player,
}

/// Closed set of timer names used by the encounter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TimerName {
    /// Completion makes the boss choose its next attack
    AttackDecision,
    /// Delay between choosing an attack and executing it
    Windup,
    /// Boss returns to its idle pose
    BackToIdle,
    FloorBlastExplosion,
    AirBlastExplosion,
    /// Repeating step of the chained attacks
    ChainShot,
    HealTick,
    HealEnd,
    Invincibility,
    Blink,
}

impl TimerName {
    /// Subsystem expected to schedule this timer
    pub fn expected_owner(&self) -> TimerOwner {
        match self {
            TimerName::Invincibility | TimerName::Blink => TimerOwner::Player,
            _ => TimerOwner::Boss,
        }
    }
}

/// Repeat policy of a timer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RepeatMode {
    Once,
    Repeating,
}

#[derive(Debug, Clone)]
struct Timer {
    owner: TimerOwner,
    duration: Duration,
    remaining: Duration,
    repeat: RepeatMode,
    active: bool,
    finished: bool,
}

/// Scheduler for named, cancelable, repeatable countdowns.
#[derive(Debug, Default, Clone)]
pub struct TimerEngine {
    timers: HashMap<TimerName, Timer>,
}

impl TimerEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Schedule `name` for `owner`, replacing any timer with the same name.
    pub fn start(
        &mut self,
        owner: TimerOwner,
        name: TimerName,
        duration: Duration,
        repeat: RepeatMode,
    ) {
        if let Some(existing) = self.timers.get(&name) {
            debug_assert!(
                existing.owner == owner,
                "timer {name:?} owned by {:?} restarted by {owner:?}",
                existing.owner
            );
        }
        debug_assert!(
            name.expected_owner() == owner,
            "timer {name:?} started by unexpected owner {owner:?}"
        );

        tracing::trace!(target: "arena_core::timer", ?owner, ?name, ?duration, ?repeat, "timer started");
        self.timers.insert(
            name,
            Timer {
                owner,
                duration,
                remaining: duration,
                repeat,
                active: true,
                finished: false,
            },
        );
    }

    /// Convenience for [`RepeatMode::Once`] timers given in seconds.
    pub fn start_once(&mut self, owner: TimerOwner, name: TimerName, seconds: f32) {
        self.start(owner, name, secs(seconds), RepeatMode::Once);
    }

    /// Convenience for [`RepeatMode::Repeating`] timers given in seconds.
    pub fn start_repeating(&mut self, owner: TimerOwner, name: TimerName, seconds: f32) {
        self.start(owner, name, secs(seconds), RepeatMode::Repeating);
    }

    /// Count every active timer down by `elapsed`.
    ///
    /// A timer completes at most once per call; repeating timers re-arm and
    /// carry the overshoot into their next period.
    pub fn tick(&mut self, elapsed: Duration) {
        for (name, timer) in self.timers.iter_mut() {
            if !timer.active {
                continue;
            }
            if elapsed < timer.remaining {
                timer.remaining -= elapsed;
                continue;
            }

            let overshoot = elapsed - timer.remaining;
            timer.finished = true;
            tracing::trace!(target: "arena_core::timer", owner = ?timer.owner, ?name, "timer finished");

            match timer.repeat {
                RepeatMode::Once => {
                    timer.active = false;
                    timer.remaining = Duration::ZERO;
                }
                RepeatMode::Repeating => {
                    timer.remaining = if timer.duration.is_zero() {
                        Duration::ZERO
                    } else {
                        let carried = Duration::from_nanos(
                            (overshoot.as_nanos() % timer.duration.as_nanos()) as u64,
                        );
                        timer.duration - carried
                    };
                }
            }
        }
    }

    /// Edge-triggered completion check: `true` once per completion.
    pub fn has_finished(&mut self, owner: TimerOwner, name: TimerName) -> bool {
        let Some(timer) = self.timers.get_mut(&name) else {
            return false;
        };
        if timer.owner != owner || !timer.finished {
            return false;
        }
        timer.finished = false;
        if !timer.active {
            self.timers.remove(&name);
        }
        true
    }

    /// Cancel one timer without firing its completion.
    pub fn stop(&mut self, owner: TimerOwner, name: TimerName) {
        if self.timers.get(&name).is_some_and(|t| t.owner == owner) {
            self.timers.remove(&name);
        }
    }

    /// Cancel every timer of `owner` without firing completions.
    pub fn stop_all(&mut self, owner: TimerOwner) {
        self.timers.retain(|_, timer| timer.owner != owner);
    }

    pub fn clear(&mut self) {
        self.timers.clear();
    }

    pub fn is_active(&self, owner: TimerOwner, name: TimerName) -> bool {
        self.timers
            .get(&name)
            .is_some_and(|t| t.owner == owner && t.active)
    }

    pub fn remaining(&self, owner: TimerOwner, name: TimerName) -> Option<Duration> {
        self.timers
            .get(&name)
            .filter(|t| t.owner == owner && t.active)
            .map(|t| t.remaining)
    }

    /// Number of running timers for `owner`
    pub fn active_count(&self, owner: TimerOwner) -> usize {
        self.timers
            .values()
            .filter(|t| t.owner == owner && t.active)
            .count()
    }
}
