//! Cooperative timer queue.
//!
//! Mirrors the firmware's tick-based timer facility: every armed timer has
//! one wake time, the earliest one is popped and its callback runs to
//! completion, and the callback's [`TimerOutcome`] decides whether it is
//! re-armed.  Nothing here blocks or allocates.
//!
//! ```text
//!   schedule(id, t) ──▶ ┌──────────────────────┐
//!   cancel(id)      ──▶ │  slots: (id, wake)   │ ──▶ pop earliest ──▶ callback(id)
//!                       └──────────────────────┘                         │
//!                               ▲                                        │
//!                               └──── Reschedule(wake) ◀─────────────────┘
//! ```
//!
//! The queue owns a simulated clock so host tests and the simulation
//! binary can drive it deterministically.  On target the same
//! [`TimerPort`] is implemented by the firmware's own scheduler.

use heapless::Vec;
use log::{debug, trace};

use crate::app::ports::TimerPort;

/// Scheduler clock ticks.  Wraps at `u32::MAX` like the MCU timer.
pub type Ticks = u32;

/// Wrap-safe "a happens before b" for tick timestamps.
pub fn is_before(a: Ticks, b: Ticks) -> bool {
    (a.wrapping_sub(b) as i32) < 0
}

/// The timer bindings a probe instance owns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimerId {
    /// Idle baseline refresh.
    Baseline,
    /// Session polling and the terminator phase.
    Session,
}

/// What a callback asks the scheduler to do with its binding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerOutcome {
    /// Re-arm for the given wake time.
    Reschedule(Ticks),
    /// Leave the binding disarmed.
    Done,
}

#[derive(Debug, Clone, Copy)]
struct Armed {
    id: TimerId,
    waketime: Ticks,
}

/// Maximum number of concurrently armed timers (stack-allocated).
pub const MAX_TIMERS: usize = 4;

/// Slot-based timer queue with a simulated tick clock.
pub struct TimerQueue<const N: usize = MAX_TIMERS> {
    armed: Vec<Armed, N>,
    now: Ticks,
    ticks_per_us: u32,
}

impl<const N: usize> TimerQueue<N> {
    /// Create a queue whose clock runs at `ticks_per_us` ticks per microsecond.
    pub fn new(ticks_per_us: u32) -> Self {
        Self {
            armed: Vec::new(),
            now: 0,
            ticks_per_us: ticks_per_us.max(1),
        }
    }

    /// Start the clock at an arbitrary value (wrap-around tests).
    pub fn with_start(mut self, now: Ticks) -> Self {
        self.now = now;
        self
    }

    /// Wake time of an armed timer.
    pub fn waketime(&self, id: TimerId) -> Option<Ticks> {
        self.armed.iter().find(|a| a.id == id).map(|a| a.waketime)
    }

    pub fn is_armed(&self, id: TimerId) -> bool {
        self.waketime(id).is_some()
    }

    /// Number of armed timers.
    pub fn armed_count(&self) -> usize {
        self.armed.len()
    }

    /// The earliest armed timer.
    pub fn next_due(&self) -> Option<(TimerId, Ticks)> {
        self.armed
            .iter()
            .copied()
            .reduce(|best, a| if is_before(a.waketime, best.waketime) { a } else { best })
            .map(|a| (a.id, a.waketime))
    }

    /// Run every callback due at or before `deadline`, in wake-time order,
    /// then park the clock at `deadline`.  Returns the number of callbacks run.
    pub fn run_until(
        &mut self,
        deadline: Ticks,
        mut callback: impl FnMut(TimerId, &mut Self) -> TimerOutcome,
    ) -> usize {
        let mut ran = 0;
        while let Some((id, waketime)) = self.next_due() {
            if is_before(deadline, waketime) {
                break;
            }
            self.remove(id);
            self.now = waketime;
            trace!("TimerQueue: {:?} fired at {}", id, waketime);
            ran += 1;
            if let TimerOutcome::Reschedule(next) = callback(id, self) {
                self.schedule(id, next);
            }
        }
        self.now = deadline;
        ran
    }

    /// Advance the clock by `ticks`, running whatever falls due.
    pub fn advance(
        &mut self,
        ticks: Ticks,
        callback: impl FnMut(TimerId, &mut Self) -> TimerOutcome,
    ) -> usize {
        let deadline = self.now.wrapping_add(ticks);
        self.run_until(deadline, callback)
    }

    fn remove(&mut self, id: TimerId) -> bool {
        match self.armed.iter().position(|a| a.id == id) {
            Some(i) => {
                self.armed.swap_remove(i);
                true
            }
            None => false,
        }
    }
}

impl<const N: usize> TimerPort for TimerQueue<N> {
    fn now(&self) -> Ticks {
        self.now
    }

    /// Saturates at `Ticks::MAX` so an oversized duration stays out of range
    /// instead of wrapping to a short one.
    fn ticks_from_us(&self, us: u32) -> Ticks {
        us.saturating_mul(self.ticks_per_us)
    }

    fn schedule(&mut self, id: TimerId, waketime: Ticks) {
        if let Some(slot) = self.armed.iter_mut().find(|a| a.id == id) {
            // Re-arming replaces; a binding is never queued twice.
            slot.waketime = waketime;
            return;
        }
        if self.armed.push(Armed { id, waketime }).is_err() {
            log::error!("TimerQueue: no free slot for {:?}", id);
            return;
        }
        debug!("TimerQueue: armed {:?} for {}", id, waketime);
    }

    fn cancel(&mut self, id: TimerId) {
        if self.remove(id) {
            debug!("TimerQueue: cancelled {:?}", id);
        }
    }
}

// ═══════════════════════════════════════════════════════════════
//  Tests
// ═══════════════════════════════════════════════════════════════
