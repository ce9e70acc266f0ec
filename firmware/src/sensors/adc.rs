//! MCP3462R conversion read.
//!
//! One read is a 3-byte full-duplex transfer: the read opcode followed by
//! two dummy bytes.  The conversion comes back big-endian in bytes 1..3 of
//! the same buffer.

use log::warn;

use crate::app::ports::ProbeHardware;
use crate::error::HardwareError;

/// Request frame for one conversion read.
pub fn read_frame(opcode: u8) -> [u8; 3] {
    [opcode, 0x00, 0x00]
}

/// Extract the 16-bit sample from a reply frame.
pub fn decode_sample(reply: &[u8; 3]) -> u16 {
    u16::from_be_bytes([reply[1], reply[2]])
}

/// Read one sample if the ADC has one ready.
///
/// `Ok(None)` means "not ready this tick"; the caller skips the tick.
pub fn try_read(hw: &mut impl ProbeHardware, opcode: u8) -> Result<Option<u16>, HardwareError> {
    if !hw.adc_ready()? {
        return Ok(None);
    }
    let mut buf = read_frame(opcode);
    hw.spi_exchange(&mut buf)?;
    Ok(Some(decode_sample(&buf)))
}

/// [`try_read`], folding transient hardware errors into "not ready".
pub fn read_or_skip(hw: &mut impl ProbeHardware, opcode: u8) -> Option<u16> {
    match try_read(hw, opcode) {
        Ok(sample) => sample,
        Err(e) => {
            warn!("ADC read skipped: {}", e);
            None
        }
    }
}
