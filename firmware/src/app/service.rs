//! Probe service — the owning context for one sensor instance.
//!
//! [`ProbeService`] owns the baseline estimator, the session FSM and its
//! context.  Commands and timer callbacks come in through plain methods;
//! hardware, timers and the host channel are passed in as port traits at
//! each call.
//!
//! ```text
//!  ProbeCommand ──▶ ┌──────────────────────────────┐ ──▶ ReportSink
//!                   │         ProbeService         │
//!  TimerId      ──▶ │  BaselineEstimator · Fsm     │ ──▶ ProbeHardware
//!                   └──────────────────────────────┘ ──▶ TimerPort
//! ```
//!
//! A fatal fault latches the service: both pins are driven low, both
//! timers are cancelled, and everything afterwards is refused.

use log::{debug, error, info, trace, warn};

use crate::config::{CompareStrategy, ProbeConfig, TerminatorDelay};
use crate::error::{Error, Fault, Result};
use crate::scheduler::{Ticks, TimerId, TimerOutcome};
use crate::sensors::{BaselineEstimator, adc};
use crate::session::context::SessionContext;
use crate::session::states::build_state_table;
use crate::session::{Fsm, StateId};

use super::commands::{HardwareBinding, ProbeCommand};
use super::events::ProbeReport;
use super::ports::{ProbeHardware, ReportSink, TimerPort};

/// Identity and peripherals of the configured sensor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SensorInstance {
    pub oid: u8,
    pub binding: HardwareBinding,
}

/// Longest delay the wrapping tick comparison can order.
const MAX_DELAY: Ticks = i32::MAX as Ticks;

// ───────────────────────────────────────────────────────────────
// ProbeService
// ───────────────────────────────────────────────────────────────

pub struct ProbeService {
    config: ProbeConfig,
    /// `None` until `cfg_ts_adc`.
    instance: Option<SensorInstance>,
    baseline: BaselineEstimator,
    fsm: Fsm,
    ctx: SessionContext,
    halted: Option<Error>,
}

impl ProbeService {
    /// Build an unconfigured service.  Nothing is scheduled until the
    /// configure command arrives.
    pub fn new(config: ProbeConfig) -> Result<Self> {
        config.validate()?;
        let baseline = BaselineEstimator::new(config.window, 0)?;
        let mut ctx = SessionContext::new(0, config.window, config.compare)?;
        ctx.auto_resume = config.auto_resume_after_session;

        let mut fsm = Fsm::new(build_state_table(), StateId::Idle);
        fsm.start(&mut ctx);

        Ok(Self {
            config,
            instance: None,
            baseline,
            fsm,
            ctx,
            halted: None,
        })
    }

    // ── Command handling ──────────────────────────────────────

    /// Decode and run a dispatcher command.
    pub fn dispatch(
        &mut self,
        name: &str,
        args: &[u32],
        hw: &mut impl ProbeHardware,
        timers: &mut impl TimerPort,
    ) -> Result<()> {
        let cmd = ProbeCommand::decode(name, args)?;
        self.handle_command(cmd, hw, timers)
    }

    /// Run one command.  A fatal error halts the service before it is
    /// returned to the caller.
    pub fn handle_command(
        &mut self,
        cmd: ProbeCommand,
        hw: &mut impl ProbeHardware,
        timers: &mut impl TimerPort,
    ) -> Result<()> {
        if self.halted.is_some() {
            return Err(Fault::Halted.into());
        }

        let result = match cmd {
            ProbeCommand::Configure {
                oid,
                binding,
                refresh_interval_us,
            } => self.configure(oid, binding, refresh_interval_us, hw, timers),
            ProbeCommand::StartSession {
                oid,
                cycles,
                tick_interval,
                sensitivity,
            } => self.start_session(oid, cycles, tick_interval, sensitivity, hw, timers),
            ProbeCommand::ResumeBaseline { oid } => self.resume_baseline(oid, timers),
        };

        if let Err(e) = result {
            if e.is_fatal() {
                self.halt(e, hw, timers);
            }
        }
        result
    }

    /// One-time hardware setup.  Calling it again re-initialises everything,
    /// including an in-flight session.
    fn configure(
        &mut self,
        oid: u8,
        binding: HardwareBinding,
        refresh_interval_us: u32,
        hw: &mut impl ProbeHardware,
        timers: &mut impl TimerPort,
    ) -> Result<()> {
        if refresh_interval_us == 0 {
            return Err(Error::Config("cycle_us must be nonzero"));
        }

        critical_section::with(|_cs| timers.cancel(TimerId::Session));
        self.baseline.pause(timers);
        hw.set_trigger(false);
        hw.set_enable(false);

        self.instance = Some(SensorInstance { oid, binding });
        self.ctx.oid = oid;
        self.ctx.session_active = false;
        self.ctx.resume_baseline = false;
        self.ctx.pins.take();
        self.ctx.clear_outcome();
        self.fsm.reset_to(StateId::Idle);

        let interval = timers.ticks_from_us(refresh_interval_us);
        self.baseline.reinit(self.config.window, interval)?;

        info!(
            "Touch sensor ADC configured oid={} spi_oid={} ready_pin={} trigger_pin={} enable_pin={} cycle_us={}",
            oid,
            binding.spi_oid,
            binding.ready_pin,
            binding.trigger_pin,
            binding.enable_pin,
            refresh_interval_us
        );

        self.baseline.resume(timers);
        Ok(())
    }

    /// Validate and arm one polling session.
    fn start_session(
        &mut self,
        oid: u8,
        cycles: u32,
        tick_interval: Ticks,
        sensitivity: u16,
        hw: &mut impl ProbeHardware,
        timers: &mut impl TimerPort,
    ) -> Result<()> {
        self.check_oid(oid)?;
        if cycles == 0 {
            return Err(Fault::ZeroCycles.into());
        }
        if tick_interval == 0 {
            return Err(Fault::ZeroTickInterval.into());
        }
        if sensitivity == 0 {
            return Err(Fault::ZeroSensitivity.into());
        }
        if self.ctx.session_active {
            return Err(Fault::SessionActive.into());
        }

        let terminator_delay = match self.config.terminator_delay {
            TerminatorDelay::TickMultiple(k) => tick_interval.checked_mul(k),
            TerminatorDelay::Micros(us) => Some(timers.ticks_from_us(us)),
        }
        .filter(|&d| d <= MAX_DELAY)
        .ok_or(Error::Config("terminator delay out of range"))?;

        self.baseline.pause(timers);

        self.ctx.remaining_cycles = cycles;
        self.ctx.tick_interval = tick_interval;
        self.ctx.sensitivity = sensitivity;
        self.ctx.terminator_delay = terminator_delay;
        self.ctx.baseline = self.baseline.baseline();
        self.ctx.probe_avg.reset();
        if self.config.compare == CompareStrategy::AveragedCompare {
            self.ctx.probe_avg.extend_from(self.baseline.average());
        }

        critical_section::with(|_cs| {
            timers.cancel(TimerId::Session);
            self.ctx.now = timers.now();
            self.fsm.force_transition(StateId::Arming, &mut self.ctx);
            timers.schedule(TimerId::Session, self.ctx.waketime);
        });
        self.apply_pins(hw);
        Ok(())
    }

    /// Re-arm idle baseline refresh.
    fn resume_baseline(&mut self, oid: u8, timers: &mut impl TimerPort) -> Result<()> {
        self.check_oid(oid)?;
        if self.ctx.session_active {
            warn!("Baseline resume refused for oid={}: session active", oid);
            return Ok(());
        }
        if self.baseline.resume(timers) {
            info!("Resuming rolling average for oid={}", oid);
        } else {
            info!("Rolling average is already running for oid={}", oid);
        }
        Ok(())
    }

    // ── Timer callbacks ───────────────────────────────────────

    /// Entry point for the scheduler.
    pub fn on_timer(
        &mut self,
        id: TimerId,
        hw: &mut impl ProbeHardware,
        timers: &mut impl TimerPort,
        sink: &mut impl ReportSink,
    ) -> TimerOutcome {
        if self.halted.is_some() {
            return TimerOutcome::Done;
        }
        match id {
            TimerId::Baseline => self.refresh_baseline(hw, timers, sink),
            TimerId::Session => self.poll_session(hw, timers, sink),
        }
    }

    fn refresh_baseline(
        &mut self,
        hw: &mut impl ProbeHardware,
        timers: &mut impl TimerPort,
        sink: &mut impl ReportSink,
    ) -> TimerOutcome {
        let Some(instance) = self.instance else {
            warn!("Periodic read with no configured ADC, pausing");
            self.baseline.pause(timers);
            return TimerOutcome::Done;
        };
        if self.ctx.session_active {
            debug!("Session active, pausing periodic read");
            self.baseline.pause(timers);
            return TimerOutcome::Done;
        }
        if !self.baseline.is_running() {
            return TimerOutcome::Done;
        }

        let next = self.baseline.next_waketime(timers.now());
        match adc::read_or_skip(hw, self.config.read_opcode) {
            Some(raw) => {
                let avg = self.baseline.push(raw) as u16;
                trace!("Periodic read: raw={} avg={}", raw, avg);
                if self.config.stream_samples {
                    sink.emit(&ProbeReport::PeriodicRead {
                        oid: instance.oid,
                        raw,
                        avg,
                    });
                }
            }
            None => trace!("Periodic read: ADC not ready"),
        }
        TimerOutcome::Reschedule(next)
    }

    fn poll_session(
        &mut self,
        hw: &mut impl ProbeHardware,
        timers: &mut impl TimerPort,
        sink: &mut impl ReportSink,
    ) -> TimerOutcome {
        let state = self.fsm.current_state();
        if !state.wants_timer() {
            warn!("Session timer fired in {:?}, ignoring", state);
            return TimerOutcome::Done;
        }

        self.ctx.now = timers.now();
        if state == StateId::Polling {
            self.ctx.baseline = self.baseline.baseline();
            self.ctx.sample = adc::read_or_skip(hw, self.config.read_opcode);
            if let (Some(raw), true) = (self.ctx.sample, self.config.stream_samples) {
                sink.emit(&ProbeReport::ProbingRead {
                    oid: self.ctx.oid,
                    raw,
                    avg: self.ctx.baseline,
                });
            }
        }

        self.fsm.tick(&mut self.ctx);
        self.apply_outputs(hw, timers, sink);

        if self.fsm.current_state().wants_timer() {
            TimerOutcome::Reschedule(self.ctx.waketime)
        } else {
            critical_section::with(|_cs| timers.cancel(TimerId::Session));
            TimerOutcome::Done
        }
    }

    // ── Queries ───────────────────────────────────────────────

    pub fn state(&self) -> StateId {
        self.fsm.current_state()
    }

    pub fn is_configured(&self) -> bool {
        self.instance.is_some()
    }

    pub fn instance(&self) -> Option<SensorInstance> {
        self.instance
    }

    pub fn session_active(&self) -> bool {
        self.ctx.session_active
    }

    pub fn remaining_cycles(&self) -> u32 {
        self.ctx.remaining_cycles
    }

    pub fn baseline_running(&self) -> bool {
        self.baseline.is_running()
    }

    /// Idle baseline in ADC units.
    pub fn baseline(&self) -> u16 {
        self.baseline.baseline()
    }

    pub fn estimator(&self) -> &BaselineEstimator {
        &self.baseline
    }

    /// The fault that halted the service, if any.
    pub fn halted(&self) -> Option<Error> {
        self.halted
    }

    pub fn config(&self) -> &ProbeConfig {
        &self.config
    }

    // ── Internal ──────────────────────────────────────────────

    fn check_oid(&self, oid: u8) -> Result<()> {
        let instance = self.instance.ok_or(Fault::NotConfigured)?;
        if instance.oid != oid {
            return Err(Fault::OidMismatch {
                expected: instance.oid,
                got: oid,
            }
            .into());
        }
        Ok(())
    }

    /// Translate FSM outputs into port calls.
    fn apply_outputs(
        &mut self,
        hw: &mut impl ProbeHardware,
        timers: &mut impl TimerPort,
        sink: &mut impl ReportSink,
    ) {
        self.apply_pins(hw);

        if let Some(report) = self.ctx.report.take() {
            info!("Session result: {:?}", report);
            sink.emit(&report);
        }

        if core::mem::take(&mut self.ctx.resume_baseline) {
            self.baseline.resume(timers);
        }
    }

    fn apply_pins(&mut self, hw: &mut impl ProbeHardware) {
        let pins = self.ctx.pins.take();
        if let Some(level) = pins.trigger {
            hw.set_trigger(level);
        }
        if let Some(level) = pins.enable {
            hw.set_enable(level);
        }
    }

    fn halt(&mut self, e: Error, hw: &mut impl ProbeHardware, timers: &mut impl TimerPort) {
        error!("Touch probe shutdown: {}", e);
        critical_section::with(|_cs| timers.cancel(TimerId::Session));
        self.baseline.pause(timers);
        hw.set_trigger(false);
        hw.set_enable(false);
        self.halted = Some(e);
    }
}
