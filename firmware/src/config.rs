//! Controller configuration parameters
//!
//! Compile-time defaults for the probe controller.  The per-session
//! values (cycles, tick interval, sensitivity) and the baseline refresh
//! period arrive with host commands; everything here is policy.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Largest baseline window the estimator can hold.
pub const MAX_WINDOW: usize = 32;

/// MCP3462R static read of the ADCDATA register.
pub const MCP3462R_READ_ADCDATA: u8 = 0b0100_0011;

/// How a session sample is compared against the idle baseline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CompareStrategy {
    /// Compare each raw sample directly; the trigger pin is driven low on
    /// every tick that does not detect.
    RawCompare,
    /// Compare a session-local rolling average seeded from the idle window;
    /// the trigger pin is left alone until detection.
    AveragedCompare,
}

/// Hold time for the trigger pin after a detected touch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TerminatorDelay {
    /// A multiple of the session's tick interval.
    TickMultiple(u32),
    /// An absolute duration.
    Micros(u32),
}

/// Core controller configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProbeConfig {
    // --- Baseline ---
    /// Number of samples averaged for the idle baseline (1..=MAX_WINDOW)
    pub window: usize,
    /// Default refresh period for the idle baseline (microseconds)
    pub refresh_interval_us: u32,

    // --- Session policy ---
    /// Sample comparison strategy during a session
    pub compare: CompareStrategy,
    /// Resume baseline refresh automatically when a session ends
    pub auto_resume_after_session: bool,
    /// Trigger hold time after a detected touch
    pub terminator_delay: TerminatorDelay,

    // --- ADC ---
    /// SPI command byte that reads one conversion
    pub read_opcode: u8,
    /// Data-ready pin is asserted low
    pub ready_active_low: bool,

    // --- Reporting ---
    /// Emit a report for every sample read
    pub stream_samples: bool,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            window: 15,
            refresh_interval_us: 50_000, // 20 Hz

            compare: CompareStrategy::RawCompare,
            auto_resume_after_session: false,
            terminator_delay: TerminatorDelay::TickMultiple(5),

            read_opcode: MCP3462R_READ_ADCDATA,
            ready_active_low: true,

            stream_samples: true,
        }
    }
}

impl ProbeConfig {
    /// Reject out-of-range values rather than clamping them.
    pub fn validate(&self) -> Result<()> {
        if self.window == 0 {
            return Err(Error::Config("window must be at least 1"));
        }
        if self.window > MAX_WINDOW {
            return Err(Error::Config("window exceeds estimator capacity"));
        }
        if self.refresh_interval_us == 0 {
            return Err(Error::Config("refresh interval must be nonzero"));
        }
        match self.terminator_delay {
            TerminatorDelay::TickMultiple(0) | TerminatorDelay::Micros(0) => {
                Err(Error::Config("terminator delay must be nonzero"))
            }
            _ => Ok(()),
        }
    }
}
