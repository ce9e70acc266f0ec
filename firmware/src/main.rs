//! touchprobe-sim — host simulation of one probe instance.
//!
//! Hexagonal architecture, with simulated adapters in the outer ring.
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────┐
//! │                      Adapters (outer ring)                     │
//! │                                                                │
//! │  SimProbe          LogReportSink      ConsoleLogger            │
//! │  (ProbeHardware)   (ReportSink)       (log::Log)               │
//! │                                                                │
//! │  ──────────────── Port Trait Boundary ───────────────────      │
//! │                                                                │
//! │  ┌────────────────────────────────────────────────────────┐    │
//! │  │              ProbeService (pure logic)                 │    │
//! │  │  BaselineEstimator · Session FSM                       │    │
//! │  └────────────────────────────────────────────────────────┘    │
//! │                                                                │
//! │  TimerQueue (simulated clock, implements TimerPort)            │
//! └────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The run configures the sensor, lets the baseline settle, starts one
//! session against a script whose reading dips partway through, and then
//! resumes baseline refresh.

use anyhow::{Result, anyhow, bail};
use log::{LevelFilter, info};

use touchprobe::ProbeService;
use touchprobe::adapters::console_log::ConsoleLogger;
use touchprobe::adapters::log_sink::LogReportSink;
use touchprobe::adapters::sim::SimProbe;
use touchprobe::app::commands::{CMD_CONFIGURE, CMD_RESUME_BASELINE, CMD_START_SESSION};
use touchprobe::config::ProbeConfig;
use touchprobe::scheduler::{Ticks, TimerQueue};
use touchprobe::session::StateId;

static LOGGER: ConsoleLogger = ConsoleLogger::new(LevelFilter::Debug);

const OID: u32 = 1;
/// Simulated timer clock, in ticks per microsecond.
const TICKS_PER_US: u32 = 12;
const SESSION_CYCLES: u32 = 40;
const SESSION_TICK_US: u32 = 1_000;
const SENSITIVITY: u32 = 200;

/// Baseline settles around 12000; the probe touches after a few polls.
const SCRIPT: [u16; 26] = [
    12_010, 11_995, 12_004, 12_000, 11_990, 12_008, 12_001, 11_997, 12_003, 12_000, 11_999, 12_002,
    12_006, 11_994, 12_000, 12_001, 11_998, 12_000, 11_996, 12_004, 12_002, 11_998, 11_980, 11_750,
    11_600, 11_590,
];

fn main() -> Result<()> {
    LOGGER.install().map_err(|e| anyhow!("logger init: {e}"))?;

    info!("touchprobe-sim v{}", env!("CARGO_PKG_VERSION"));

    let config = ProbeConfig::default();
    let refresh_us = config.refresh_interval_us;
    let mut service = ProbeService::new(config)?;
    let mut hw = SimProbe::new(&SCRIPT);
    let mut timers: TimerQueue = TimerQueue::new(TICKS_PER_US);
    let mut sink = LogReportSink::new();

    // cfg_ts_adc oid spi_oid adc_int_pin trigger_out_pin PI_EN_pin cycle_us
    service.dispatch(CMD_CONFIGURE, &[OID, 0, 4, 5, 6, refresh_us], &mut hw, &mut timers)?;

    // Let the baseline window fill.
    let settle = ticks(refresh_us) * (service.config().window as Ticks + 1);
    timers.advance(settle, |id, t| service.on_timer(id, &mut hw, t, &mut sink));
    info!("Baseline settled at {}", service.baseline());

    service.dispatch(
        CMD_START_SESSION,
        &[OID, SESSION_CYCLES, ticks(SESSION_TICK_US), SENSITIVITY],
        &mut hw,
        &mut timers,
    )?;

    // Run until the session and its terminator phase finish.
    let mut guard = 0;
    while service.state() != StateId::Idle {
        timers.advance(ticks(SESSION_TICK_US), |id, t| {
            service.on_timer(id, &mut hw, t, &mut sink)
        });
        guard += 1;
        if guard > 10 * SESSION_CYCLES {
            bail!("session never finished (state {:?})", service.state());
        }
    }

    service.dispatch(CMD_RESUME_BASELINE, &[OID], &mut hw, &mut timers)?;
    timers.advance(ticks(refresh_us) * 3, |id, t| {
        service.on_timer(id, &mut hw, t, &mut sink)
    });

    info!(
        "Done: {} reports, {} trigger edge(s), {} ADC reads, baseline running={}",
        sink.emitted(),
        hw.trigger_edges(),
        hw.reads(),
        service.baseline_running()
    );

    if let Some(e) = service.halted() {
        bail!("service halted: {e}");
    }
    Ok(())
}

fn ticks(us: u32) -> Ticks {
    us * TICKS_PER_US
}
