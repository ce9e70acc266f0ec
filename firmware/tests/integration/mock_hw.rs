//! Mock hardware adapter for integration tests.
//!
//! Plays a queue of ADC conversions and records every pin call so tests
//! can assert on the full output history without real GPIO/SPI.

use std::collections::VecDeque;

use touchprobe::ProbeService;
use touchprobe::app::commands::{HardwareBinding, ProbeCommand};
use touchprobe::app::events::ProbeReport;
use touchprobe::app::ports::{ProbeHardware, ReportSink};
use touchprobe::config::ProbeConfig;
use touchprobe::error::{HardwareError, Result};
use touchprobe::scheduler::{Ticks, TimerQueue};

pub const OID: u8 = 3;
pub const REFRESH_US: u32 = 50_000;
pub const BINDING: HardwareBinding = HardwareBinding {
    spi_oid: 1,
    ready_pin: 10,
    trigger_pin: 11,
    enable_pin: 12,
};

// ── Pin call record ───────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PinCall {
    Trigger(bool),
    Enable(bool),
}

// ── MockProbe ─────────────────────────────────────────────────

pub struct MockProbe {
    /// `None` entries read as "not ready" for one poll.
    pub samples: VecDeque<Option<u16>>,
    pub calls: Vec<PinCall>,
    pub frames_sent: Vec<[u8; 3]>,
}

#[allow(dead_code)]
impl MockProbe {
    pub fn new() -> Self {
        Self {
            samples: VecDeque::new(),
            calls: Vec::new(),
            frames_sent: Vec::new(),
        }
    }

    pub fn queue(&mut self, samples: &[u16]) {
        self.samples.extend(samples.iter().copied().map(Some));
    }

    pub fn queue_not_ready(&mut self, polls: usize) {
        self.samples.extend(std::iter::repeat_n(None, polls));
    }

    pub fn trigger(&self) -> bool {
        self.calls
            .iter()
            .rev()
            .find_map(|c| match c {
                PinCall::Trigger(level) => Some(*level),
                PinCall::Enable(_) => None,
            })
            .unwrap_or(false)
    }

    pub fn enable(&self) -> bool {
        self.calls
            .iter()
            .rev()
            .find_map(|c| match c {
                PinCall::Enable(level) => Some(*level),
                PinCall::Trigger(_) => None,
            })
            .unwrap_or(false)
    }

    pub fn trigger_raised(&self) -> bool {
        self.calls.contains(&PinCall::Trigger(true))
    }
}

impl Default for MockProbe {
    fn default() -> Self {
        Self::new()
    }
}

impl ProbeHardware for MockProbe {
    fn adc_ready(&mut self) -> std::result::Result<bool, HardwareError> {
        match self.samples.front() {
            Some(Some(_)) => Ok(true),
            Some(None) => {
                self.samples.pop_front();
                Ok(false)
            }
            None => Ok(false),
        }
    }

    fn spi_exchange(&mut self, buf: &mut [u8; 3]) -> std::result::Result<(), HardwareError> {
        self.frames_sent.push(*buf);
        let sample = self.samples.pop_front().flatten().ok_or(HardwareError::SpiTransfer)?;
        let [hi, lo] = sample.to_be_bytes();
        *buf = [0xA5, hi, lo];
        Ok(())
    }

    fn set_trigger(&mut self, high: bool) {
        self.calls.push(PinCall::Trigger(high));
    }

    fn set_enable(&mut self, high: bool) {
        self.calls.push(PinCall::Enable(high));
    }
}

// ── RecordingSink ─────────────────────────────────────────────

#[derive(Default)]
pub struct RecordingSink {
    pub reports: Vec<ProbeReport>,
}

#[allow(dead_code)]
impl RecordingSink {
    pub fn session_results(&self) -> Vec<ProbeReport> {
        self.reports
            .iter()
            .copied()
            .filter(|r| matches!(r, ProbeReport::SessionResult { .. }))
            .collect()
    }

    pub fn periodic_reads(&self) -> usize {
        self.reports
            .iter()
            .filter(|r| matches!(r, ProbeReport::PeriodicRead { .. }))
            .count()
    }

    pub fn probing_reads(&self) -> usize {
        self.reports
            .iter()
            .filter(|r| matches!(r, ProbeReport::ProbingRead { .. }))
            .count()
    }
}

impl ReportSink for RecordingSink {
    fn emit(&mut self, report: &ProbeReport) {
        self.reports.push(*report);
    }
}

// ── Rig: service + mocks + simulated clock ────────────────────

pub struct Rig {
    pub service: ProbeService,
    pub hw: MockProbe,
    pub timers: TimerQueue,
    pub sink: RecordingSink,
}

#[allow(dead_code)]
impl Rig {
    /// One tick per microsecond, clock at zero.
    pub fn new(config: ProbeConfig) -> Self {
        Self::starting_at(config, 0)
    }

    pub fn starting_at(config: ProbeConfig, now: Ticks) -> Self {
        Self {
            service: ProbeService::new(config).unwrap(),
            hw: MockProbe::new(),
            timers: TimerQueue::new(1).with_start(now),
            sink: RecordingSink::default(),
        }
    }

    /// Default config with a short window.
    pub fn with_window(window: usize) -> Self {
        Self::new(ProbeConfig {
            window,
            ..ProbeConfig::default()
        })
    }

    pub fn send(&mut self, cmd: ProbeCommand) -> Result<()> {
        self.service.handle_command(cmd, &mut self.hw, &mut self.timers)
    }

    pub fn configure(&mut self) {
        self.send(ProbeCommand::Configure {
            oid: OID,
            binding: BINDING,
            refresh_interval_us: REFRESH_US,
        })
        .unwrap();
    }

    pub fn start(&mut self, cycles: u32, tick_interval: u32, sensitivity: u16) -> Result<()> {
        self.send(ProbeCommand::StartSession {
            oid: OID,
            cycles,
            tick_interval,
            sensitivity,
        })
    }

    pub fn resume(&mut self) -> Result<()> {
        self.send(ProbeCommand::ResumeBaseline { oid: OID })
    }

    /// Advance the clock, running every callback that falls due.
    pub fn advance(&mut self, ticks: Ticks) -> usize {
        let Self {
            service,
            hw,
            timers,
            sink,
        } = self;
        timers.advance(ticks, |id, t| service.on_timer(id, &mut *hw, t, &mut *sink))
    }

    /// Configure, then feed `samples` through baseline refresh until the
    /// window holds all of them.
    pub fn settle_baseline(&mut self, samples: &[u16]) {
        self.configure();
        self.hw.queue(samples);
        self.advance(REFRESH_US * samples.len() as u32);
    }
}
