//! Command handling: dispatcher decoding, misuse faults and the halted
//! latch.

use touchprobe::app::commands::{CMD_CONFIGURE, CMD_RESUME_BASELINE, CMD_START_SESSION, ProbeCommand};
use touchprobe::config::{ProbeConfig, TerminatorDelay};
use touchprobe::error::{Error, Fault};
use touchprobe::scheduler::TimerId;
use touchprobe::session::StateId;

use super::mock_hw::{BINDING, OID, PinCall, Rig};

const TICK: u32 = 1_000;

fn assert_halted_with(rig: &Rig, fault: Fault) {
    assert_eq!(rig.service.halted(), Some(Error::Fault(fault)));
    assert!(!rig.hw.trigger(), "trigger must be low after shutdown");
    assert!(!rig.hw.enable(), "enable must be low after shutdown");
    assert_eq!(rig.timers.armed_count(), 0, "no timer may survive shutdown");
}

// ── Dispatcher ────────────────────────────────────────────────

#[test]
fn dispatch_runs_a_full_session() {
    let mut rig = Rig::with_window(3);
    rig.service
        .dispatch(
            CMD_CONFIGURE,
            &[u32::from(OID), 1, 10, 11, 12, 50_000],
            &mut rig.hw,
            &mut rig.timers,
        )
        .unwrap();
    assert_eq!(
        rig.service.instance().map(|i| i.binding),
        Some(BINDING),
        "pins bound from the argument array"
    );

    rig.hw.queue(&[100, 100, 100]);
    rig.advance(150_000);

    rig.service
        .dispatch(CMD_START_SESSION, &[u32::from(OID), 2, TICK, 10], &mut rig.hw, &mut rig.timers)
        .unwrap();
    rig.advance(TICK * 2);
    assert_eq!(rig.service.state(), StateId::Idle);

    rig.service
        .dispatch(CMD_RESUME_BASELINE, &[u32::from(OID)], &mut rig.hw, &mut rig.timers)
        .unwrap();
    assert!(rig.service.baseline_running());
}

#[test]
fn malformed_commands_are_rejected_without_shutdown() {
    let mut rig = Rig::with_window(3);
    rig.configure();

    let cases: [(&str, &[u32]); 4] = [
        ("no_such_cmd", &[1]),
        (CMD_START_SESSION, &[u32::from(OID), 5]),
        (CMD_START_SESSION, &[u32::from(OID), 5, TICK, 70_000]),
        (CMD_RESUME_BASELINE, &[300]),
    ];
    for (name, args) in cases {
        let err = rig.service.dispatch(name, args, &mut rig.hw, &mut rig.timers);
        assert!(matches!(err, Err(Error::Command(_))), "{name} {args:?} -> {err:?}");
    }
    assert!(rig.service.halted().is_none());
    assert!(rig.service.baseline_running());
}

// ── Misuse is fatal ───────────────────────────────────────────

#[test]
fn start_before_configure_halts() {
    let mut rig = Rig::with_window(3);
    assert_eq!(rig.start(3, TICK, 10), Err(Error::Fault(Fault::NotConfigured)));
    assert_eq!(rig.service.halted(), Some(Error::Fault(Fault::NotConfigured)));
    assert_eq!(rig.hw.calls, vec![PinCall::Trigger(false), PinCall::Enable(false)]);
}

#[test]
fn resume_before_configure_halts() {
    let mut rig = Rig::with_window(3);
    assert_eq!(rig.resume(), Err(Error::Fault(Fault::NotConfigured)));
    assert!(rig.service.halted().is_some());
}

#[test]
fn wrong_oid_halts() {
    let mut rig = Rig::with_window(3);
    rig.configure();
    let err = rig.send(ProbeCommand::StartSession {
        oid: OID + 1,
        cycles: 3,
        tick_interval: TICK,
        sensitivity: 10,
    });
    let fault = Fault::OidMismatch {
        expected: OID,
        got: OID + 1,
    };
    assert_eq!(err, Err(Error::Fault(fault)));
    assert_halted_with(&rig, fault);
}

#[test]
fn zero_session_parameters_halt() {
    let cases = [
        ((0, TICK, 10), Fault::ZeroCycles),
        ((3, 0, 10), Fault::ZeroTickInterval),
        ((3, TICK, 0), Fault::ZeroSensitivity),
    ];
    for ((cycles, interval, sensitivity), fault) in cases {
        let mut rig = Rig::with_window(3);
        rig.configure();
        assert_eq!(rig.start(cycles, interval, sensitivity), Err(Error::Fault(fault)));
        assert_halted_with(&rig, fault);
        assert!(!rig.service.session_active());
    }
}

#[test]
fn zero_refresh_interval_halts() {
    let mut rig = Rig::with_window(3);
    let err = rig.send(ProbeCommand::Configure {
        oid: OID,
        binding: BINDING,
        refresh_interval_us: 0,
    });
    assert!(matches!(err, Err(Error::Config(_))));
    assert!(rig.service.halted().is_some());
    assert!(!rig.service.is_configured());
}

#[test]
fn second_start_while_active_halts_the_session() {
    let mut rig = Rig::with_window(3);
    rig.configure();
    rig.hw.queue(&[100; 10]);
    rig.advance(150_000);
    rig.start(5, TICK, 10).unwrap();
    rig.advance(TICK);

    assert_eq!(rig.start(5, TICK, 10), Err(Error::Fault(Fault::SessionActive)));
    assert_halted_with(&rig, Fault::SessionActive);

    // Nothing runs after shutdown.
    assert_eq!(rig.advance(TICK * 100), 0);
    assert!(rig.sink.session_results().is_empty());
}

#[test]
fn halted_service_refuses_everything() {
    let mut rig = Rig::with_window(3);
    let _ = rig.start(3, TICK, 10);

    assert_eq!(
        rig.send(ProbeCommand::Configure {
            oid: OID,
            binding: BINDING,
            refresh_interval_us: 50_000,
        }),
        Err(Error::Fault(Fault::Halted))
    );
    assert_eq!(rig.resume(), Err(Error::Fault(Fault::Halted)));
    assert!(!rig.service.is_configured());

    // A stale timer entry from the host scheduler is ignored.
    let calls_before = rig.hw.calls.len();
    let outcome = rig
        .service
        .on_timer(TimerId::Session, &mut rig.hw, &mut rig.timers, &mut rig.sink);
    assert_eq!(outcome, touchprobe::scheduler::TimerOutcome::Done);
    assert_eq!(rig.hw.calls.len(), calls_before);
}

#[test]
fn reconfigure_is_not_misuse() {
    let mut rig = Rig::with_window(3);
    rig.configure();
    rig.configure();
    assert!(rig.service.halted().is_none());
    assert_eq!(rig.timers.armed_count(), 1);
}

// ── Terminator delay range ────────────────────────────────────

fn assert_delay_rejected(rig: &Rig, err: Result<(), Error>) {
    assert!(matches!(err, Err(Error::Config(_))), "{err:?}");
    assert!(matches!(rig.service.halted(), Some(Error::Config(_))));
    assert!(!rig.service.session_active());
    assert_eq!(rig.service.state(), StateId::Idle);
    assert!(!rig.hw.trigger() && !rig.hw.enable());
    assert_eq!(rig.timers.armed_count(), 0);
}

#[test]
fn tick_multiple_delay_that_overflows_halts() {
    for tick in [1_000_000_000, 500_000_000] {
        let mut rig = Rig::with_window(3);
        rig.configure();
        let err = rig.start(3, tick, 10);
        assert_delay_rejected(&rig, err);
    }
}

#[test]
fn oversized_absolute_delay_halts() {
    let mut rig = Rig::new(ProbeConfig {
        window: 3,
        terminator_delay: TerminatorDelay::Micros(u32::MAX),
        ..ProbeConfig::default()
    });
    rig.configure();
    let err = rig.start(3, TICK, 10);
    assert_delay_rejected(&rig, err);
}

#[test]
fn largest_orderable_delay_is_accepted() {
    let mut rig = Rig::new(ProbeConfig {
        window: 3,
        terminator_delay: TerminatorDelay::Micros(i32::MAX as u32),
        ..ProbeConfig::default()
    });
    rig.configure();
    rig.start(3, TICK, 10).unwrap();
    assert!(rig.service.session_active());
    assert!(rig.service.halted().is_none());
}

// ── Halt latch through the dispatcher ─────────────────────────

#[test]
fn dispatched_misuse_latches_and_blocks_a_later_start() {
    let mut rig = Rig::with_window(3);
    let err = rig
        .service
        .dispatch(CMD_START_SESSION, &[u32::from(OID), 3, TICK, 10], &mut rig.hw, &mut rig.timers);
    assert_eq!(err, Err(Error::Fault(Fault::NotConfigured)));

    let configure = [u32::from(OID), 1, 10, 11, 12, 50_000];
    let start = [u32::from(OID), 3, TICK, 10];
    for (name, args) in [(CMD_CONFIGURE, &configure[..]), (CMD_START_SESSION, &start[..])] {
        let again = rig.service.dispatch(name, args, &mut rig.hw, &mut rig.timers);
        assert_eq!(again, Err(Error::Fault(Fault::Halted)), "{name}");
    }
    assert_halted_with(&rig, Fault::NotConfigured);
    assert!(!rig.service.session_active());
}
