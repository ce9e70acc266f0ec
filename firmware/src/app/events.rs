//! Outbound host reports.
//!
//! The [`ProbeService`](super::service::ProbeService) emits these through
//! the [`ReportSink`](super::ports::ReportSink) port.  On the wire they are
//! postcard-encoded into a fixed-size frame.

use heapless::Vec;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Upper bound on an encoded report.
pub const REPORT_FRAME_MAX: usize = 16;

/// Structured messages sent back to the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProbeReport {
    /// Sent exactly once per session, when its cycles run out.
    SessionResult {
        oid: u8,
        detected: bool,
        last_value: u16,
    },
    /// One idle baseline sample.
    PeriodicRead { oid: u8, raw: u16, avg: u16 },
    /// One session sample and the baseline it was compared against.
    ProbingRead { oid: u8, raw: u16, avg: u16 },
}

impl ProbeReport {
    pub fn oid(&self) -> u8 {
        match *self {
            Self::SessionResult { oid, .. }
            | Self::PeriodicRead { oid, .. }
            | Self::ProbingRead { oid, .. } => oid,
        }
    }

    /// Encode into a wire frame.
    pub fn encode(&self) -> Result<Vec<u8, REPORT_FRAME_MAX>> {
        let mut buf = [0u8; REPORT_FRAME_MAX];
        let used = postcard::to_slice(self, &mut buf).map_err(|_| Error::Encode)?;
        Vec::from_slice(used).map_err(|()| Error::Encode)
    }

    /// Decode a wire frame produced by [`encode`](Self::encode).
    pub fn decode(frame: &[u8]) -> Result<Self> {
        postcard::from_bytes(frame).map_err(|_| Error::Encode)
    }
}
