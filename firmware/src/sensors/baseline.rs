//! Idle baseline estimator.
//!
//! Wraps a [`RollingAverage`] with the periodic-refresh binding: the
//! refresh interval, the `running` flag, and pause/resume against the
//! [`TimerId::Baseline`] timer.  The refresh callback itself lives in the
//! service because it needs the hardware and the report sink.
//!
//! `running` and the armed state of the timer move together inside a
//! critical section, so an interrupt-driven scheduler can never observe
//! one without the other.

use log::{info, warn};

use super::rolling_average::RollingAverage;
use crate::app::ports::TimerPort;
use crate::config::MAX_WINDOW;
use crate::error::Result;
use crate::scheduler::{Ticks, TimerId};

pub struct BaselineEstimator {
    avg: RollingAverage<MAX_WINDOW>,
    refresh_interval: Ticks,
    running: bool,
}

impl BaselineEstimator {
    /// A stopped estimator with an empty window.
    pub fn new(window: usize, refresh_interval: Ticks) -> Result<Self> {
        Ok(Self {
            avg: RollingAverage::new(window)?,
            refresh_interval,
            running: false,
        })
    }

    /// Reset counters and rebind the refresh interval.  Leaves the timer
    /// alone; callers pause first if it may be armed.
    pub fn reinit(&mut self, window: usize, refresh_interval: Ticks) -> Result<()> {
        self.avg = RollingAverage::new(window)?;
        self.refresh_interval = refresh_interval;
        self.running = false;
        Ok(())
    }

    pub fn push(&mut self, sample: u16) -> f32 {
        self.avg.push(f32::from(sample))
    }

    /// Current baseline, truncated to ADC units.
    pub fn baseline(&self) -> u16 {
        self.avg.last_value() as u16
    }

    pub fn average(&self) -> &RollingAverage<MAX_WINDOW> {
        &self.avg
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Wake time for the next refresh, measured from `now`.
    pub fn next_waketime(&self, now: Ticks) -> Ticks {
        now.wrapping_add(self.refresh_interval)
    }

    /// Stop periodic refresh.  Idempotent.
    pub fn pause(&mut self, timers: &mut impl TimerPort) {
        critical_section::with(|_cs| {
            timers.cancel(TimerId::Baseline);
            self.running = false;
        });
    }

    /// Arm periodic refresh at "now + interval".  Refuses (returns `false`)
    /// when already running so the binding is never queued twice.
    pub fn resume(&mut self, timers: &mut impl TimerPort) -> bool {
        let armed = critical_section::with(|_cs| {
            if self.running {
                return false;
            }
            let wake = self.next_waketime(timers.now());
            timers.schedule(TimerId::Baseline, wake);
            self.running = true;
            true
        });
        if !armed {
            warn!("Baseline refresh already running");
            return false;
        }
        info!(
            "Baseline refresh resumed (every {} ticks, {} samples held)",
            self.refresh_interval,
            self.avg.len()
        );
        true
    }

    /// Zero the window without touching the refresh binding.
    pub fn reset(&mut self) {
        self.avg.reset();
    }
}
