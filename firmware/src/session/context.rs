//! Shared mutable context threaded through every session handler.
//!
//! The service writes the per-tick inputs (`now`, `sample`, `baseline`)
//! before each FSM tick and applies the outputs (`pins`, `report`,
//! `resume_baseline`) after it.  Handlers never see the hardware.

use crate::app::events::ProbeReport;
use crate::config::{CompareStrategy, MAX_WINDOW};
use crate::error::Result;
use crate::scheduler::Ticks;
use crate::sensors::RollingAverage;

// ---------------------------------------------------------------------------
// Pin commands (written by handlers; applied by the service)
// ---------------------------------------------------------------------------

/// `None` leaves the pin as it is.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PinCommands {
    pub trigger: Option<bool>,
    pub enable: Option<bool>,
}

impl PinCommands {
    pub fn take(&mut self) -> Self {
        core::mem::take(self)
    }
}

// ---------------------------------------------------------------------------
// SessionContext
// ---------------------------------------------------------------------------

pub struct SessionContext {
    // -- Identity / policy --
    pub oid: u8,
    pub compare: CompareStrategy,
    pub auto_resume: bool,

    // -- Session parameters (set at start) --
    /// Poll ticks left; reaching zero ends the session.
    pub remaining_cycles: u32,
    pub tick_interval: Ticks,
    /// Minimum baseline − sample delta that counts as contact.
    pub sensitivity: u16,
    /// Trigger hold time after detection, already in ticks.
    pub terminator_delay: Ticks,

    // -- Timing --
    /// Scheduler time when the current handler chain started.
    pub now: Ticks,
    /// Next wake time for the session timer; advanced cumulatively.
    pub waketime: Ticks,

    // -- Per-tick inputs --
    /// Sample read this tick, `None` if the ADC was not ready.
    pub sample: Option<u16>,
    /// Idle baseline to compare against.
    pub baseline: u16,
    /// Session-local average for [`CompareStrategy::AveragedCompare`].
    pub probe_avg: RollingAverage<MAX_WINDOW>,

    // -- Outcome --
    pub session_active: bool,
    pub detected: bool,
    /// Most recent sample read during the session.
    pub last_value: u16,

    // -- Outputs --
    pub pins: PinCommands,
    /// Session result waiting to be emitted.
    pub report: Option<ProbeReport>,
    /// Set when a finished session should re-arm baseline refresh.
    pub resume_baseline: bool,
}

impl SessionContext {
    pub fn new(oid: u8, window: usize, compare: CompareStrategy) -> Result<Self> {
        Ok(Self {
            oid,
            compare,
            auto_resume: false,
            remaining_cycles: 0,
            tick_interval: 0,
            sensitivity: 0,
            terminator_delay: 0,
            now: 0,
            waketime: 0,
            sample: None,
            baseline: 0,
            probe_avg: RollingAverage::new(window)?,
            session_active: false,
            detected: false,
            last_value: 0,
            pins: PinCommands::default(),
            report: None,
            resume_baseline: false,
        })
    }

    /// Clear per-session outcome so a new session starts clean.
    pub fn clear_outcome(&mut self) {
        self.detected = false;
        self.last_value = 0;
        self.sample = None;
        self.report = None;
    }

    /// Signed baseline − reference delta; negative when the reading rose.
    pub fn delta(&self, reference: u16) -> i32 {
        i32::from(self.baseline) - i32::from(reference)
    }
}
