//! Inbound commands to the probe service.
//!
//! The firmware's command dispatcher hands each handler a command name and
//! the decoded argument array.  [`ProbeCommand::decode`] turns that into a
//! typed command for [`ProbeService`](super::service::ProbeService).

use crate::error::{Error, Result};

/// `cfg_ts_adc oid=%c spi_oid=%c adc_int_pin=%u trigger_out_pin=%u PI_EN_pin=%u cycle_us=%u`
pub const CMD_CONFIGURE: &str = "cfg_ts_adc";
/// `start_ts_session oid=%c timeout_cycles=%u rest_ticks=%u sensitivity=%u`
pub const CMD_START_SESSION: &str = "start_ts_session";
/// `resume_rolling_avg oid=%c`
pub const CMD_RESUME_BASELINE: &str = "resume_rolling_avg";

/// Opaque handles for the peripherals bound at configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HardwareBinding {
    pub spi_oid: u8,
    pub ready_pin: u32,
    pub trigger_pin: u32,
    pub enable_pin: u32,
}

/// Commands the host can send into the controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbeCommand {
    /// One-time hardware setup; (re)starts baseline refresh.
    Configure {
        oid: u8,
        binding: HardwareBinding,
        refresh_interval_us: u32,
    },

    /// Run one bounded polling session.
    StartSession {
        oid: u8,
        cycles: u32,
        tick_interval: u32,
        sensitivity: u16,
    },

    /// Re-arm idle baseline refresh after a session.
    ResumeBaseline { oid: u8 },
}

impl ProbeCommand {
    /// Build a command from its dispatcher name and argument array.
    pub fn decode(name: &str, args: &[u32]) -> Result<Self> {
        match name {
            CMD_CONFIGURE => {
                let [oid, spi_oid, ready_pin, trigger_pin, enable_pin, cycle_us] = *args else {
                    return Err(Error::Command("cfg_ts_adc takes 6 arguments"));
                };
                Ok(Self::Configure {
                    oid: narrow_u8(oid)?,
                    binding: HardwareBinding {
                        spi_oid: narrow_u8(spi_oid)?,
                        ready_pin,
                        trigger_pin,
                        enable_pin,
                    },
                    refresh_interval_us: cycle_us,
                })
            }
            CMD_START_SESSION => {
                let [oid, cycles, tick_interval, sensitivity] = *args else {
                    return Err(Error::Command("start_ts_session takes 4 arguments"));
                };
                let sensitivity = u16::try_from(sensitivity)
                    .map_err(|_| Error::Command("sensitivity does not fit in 16 bits"))?;
                Ok(Self::StartSession {
                    oid: narrow_u8(oid)?,
                    cycles,
                    tick_interval,
                    sensitivity,
                })
            }
            CMD_RESUME_BASELINE => {
                let [oid] = *args else {
                    return Err(Error::Command("resume_rolling_avg takes 1 argument"));
                };
                Ok(Self::ResumeBaseline { oid: narrow_u8(oid)? })
            }
            _ => Err(Error::Command("unknown command")),
        }
    }

    /// The instance this command addresses.
    pub fn oid(&self) -> u8 {
        match *self {
            Self::Configure { oid, .. }
            | Self::StartSession { oid, .. }
            | Self::ResumeBaseline { oid } => oid,
        }
    }
}

fn narrow_u8(v: u32) -> Result<u8> {
    u8::try_from(v).map_err(|_| Error::Command("oid does not fit in 8 bits"))
}
