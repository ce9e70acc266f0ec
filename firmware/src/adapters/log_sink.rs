//! Log-based report sink adapter.
//!
//! Implements [`ReportSink`] by writing each probe report to the logger in
//! the same `name key=value` shape the host parses off the serial console.
//! A binary transport would implement the same trait over
//! [`ProbeReport::encode`].

use log::{debug, info};

use crate::app::events::ProbeReport;
use crate::app::ports::ReportSink;

/// Adapter that logs every [`ProbeReport`] to the serial console.
#[derive(Debug, Default)]
pub struct LogReportSink {
    emitted: u32,
}

impl LogReportSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reports emitted since construction.
    pub fn emitted(&self) -> u32 {
        self.emitted
    }
}

impl ReportSink for LogReportSink {
    fn emit(&mut self, report: &ProbeReport) {
        self.emitted = self.emitted.wrapping_add(1);
        match *report {
            ProbeReport::SessionResult {
                oid,
                detected,
                last_value,
            } => {
                info!(
                    "Ts_session_result oid={} status={} value={}",
                    oid, detected as u8, last_value
                );
            }
            ProbeReport::PeriodicRead { oid, raw, avg } => {
                debug!("Periodic_read oid={} value={} avg={}", oid, raw, avg);
            }
            ProbeReport::ProbingRead { oid, raw, avg } => {
                debug!("Probing_read oid={} value={} avg={}", oid, raw, avg);
            }
        }
    }
}
