//! Port traits — the boundary between the probe controller and the firmware
//! around it.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ ProbeService (domain)
//! ```
//!
//! The GPIO/SPI wrappers, the timer facility and the host channel all sit
//! behind these traits.  [`ProbeService`](super::service::ProbeService)
//! takes them as generics at each call, so the controller never touches a
//! peripheral directly and runs unchanged against the mocks in `tests/`.

use crate::error::HardwareError;
use crate::scheduler::{Ticks, TimerId};

// ───────────────────────────────────────────────────────────────
// Hardware port (driven adapter: domain ↔ GPIO / SPI)
// ───────────────────────────────────────────────────────────────

/// The probe's pins and ADC bus.
pub trait ProbeHardware {
    /// Sample the ADC "data ready" line.  `true` means asserted, whatever
    /// the electrical polarity.
    fn adc_ready(&mut self) -> Result<bool, HardwareError>;

    /// Synchronous full-duplex transfer; the reply overwrites `buf`.
    fn spi_exchange(&mut self, buf: &mut [u8; 3]) -> Result<(), HardwareError>;

    /// Drive the trigger output seen by the motion controller.
    fn set_trigger(&mut self, high: bool);

    /// Drive the probe power-enable output.
    fn set_enable(&mut self, high: bool);
}

// ───────────────────────────────────────────────────────────────
// Timer port (driven adapter: domain ↔ cooperative scheduler)
// ───────────────────────────────────────────────────────────────

/// The firmware's tick-based timer facility.
///
/// `schedule` on an id that is already armed moves it; the facility never
/// holds two entries for the same binding.
pub trait TimerPort {
    fn now(&self) -> Ticks;

    fn ticks_from_us(&self, us: u32) -> Ticks;

    fn schedule(&mut self, id: TimerId, waketime: Ticks);

    fn cancel(&mut self, id: TimerId);
}

// ───────────────────────────────────────────────────────────────
// Report sink (driven adapter: domain → host channel)
// ───────────────────────────────────────────────────────────────

/// Outbound host messages.  Adapters decide where they go.
pub trait ReportSink {
    fn emit(&mut self, report: &super::events::ProbeReport);
}
