//! Adapters — concrete implementations of the hexagonal port traits.
//!
//! | Adapter       | Implements    | Connects to                        |
//! |---------------|---------------|------------------------------------|
//! | `hal`         | ProbeHardware | embedded-hal SPI device + GPIO     |
//! | `sim`         | ProbeHardware | Scripted ADC for host simulation   |
//! | `log_sink`    | ReportSink    | Serial log output                  |
//! | `console_log` | log::Log      | stderr (host builds only)          |
//!
//! [`TimerPort`](crate::app::ports::TimerPort) is implemented by
//! [`TimerQueue`](crate::scheduler::TimerQueue) directly.

#[cfg(feature = "std")]
pub mod console_log;
pub mod hal;
pub mod log_sink;
pub mod sim;
