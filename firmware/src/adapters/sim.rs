//! Simulated probe for host runs.
//!
//! Plays back a fixed script of ADC conversions and remembers the last
//! level written to each output, so the simulation binary can run a full
//! session without hardware.  Once the script runs out the last sample
//! repeats.

use heapless::Vec;

use crate::app::ports::ProbeHardware;
use crate::error::HardwareError;

/// Longest conversion script the simulator holds.
pub const SIM_SCRIPT_MAX: usize = 64;

#[derive(Debug)]
pub struct SimProbe {
    script: Vec<u16, SIM_SCRIPT_MAX>,
    cursor: usize,
    trigger: bool,
    enable: bool,
    trigger_edges: u32,
}

impl SimProbe {
    /// Script longer than [`SIM_SCRIPT_MAX`] is truncated.
    pub fn new(script: &[u16]) -> Self {
        let len = script.len().min(SIM_SCRIPT_MAX);
        let mut buf = Vec::new();
        // Fits by construction.
        let _ = buf.extend_from_slice(&script[..len]);
        Self {
            script: buf,
            cursor: 0,
            trigger: false,
            enable: false,
            trigger_edges: 0,
        }
    }

    pub fn trigger(&self) -> bool {
        self.trigger
    }

    pub fn enable(&self) -> bool {
        self.enable
    }

    /// Rising edges seen on the trigger output.
    pub fn trigger_edges(&self) -> u32 {
        self.trigger_edges
    }

    /// Conversions consumed so far.
    pub fn reads(&self) -> usize {
        self.cursor
    }

    fn next_sample(&mut self) -> u16 {
        let sample = match self.script.get(self.cursor) {
            Some(&s) => s,
            None => self.script.last().copied().unwrap_or(0),
        };
        self.cursor += 1;
        sample
    }
}

impl ProbeHardware for SimProbe {
    fn adc_ready(&mut self) -> Result<bool, HardwareError> {
        Ok(!self.script.is_empty())
    }

    fn spi_exchange(&mut self, frame: &mut [u8; 3]) -> Result<(), HardwareError> {
        let [hi, lo] = self.next_sample().to_be_bytes();
        *frame = [0x00, hi, lo];
        Ok(())
    }

    fn set_trigger(&mut self, high: bool) {
        if high && !self.trigger {
            self.trigger_edges += 1;
        }
        self.trigger = high;
    }

    fn set_enable(&mut self, high: bool) {
        self.enable = high;
    }
}
