//! Concrete state handler functions and table builder.
//!
//! Each state is three plain `fn` pointers: no closures, no dynamic
//! dispatch, no heap.
//!
//! ```text
//!  IDLE ──[start_ts_session]──▶ ARMING ──▶ POLLING ◀──┐
//!    ▲                                      │  │      │ [cycles left]
//!    │                         [delta > sens]  └──────┘
//!    │                                      ▼
//!    │                                 TRIGGERING
//!    │                                      │
//!    │               [cycles exhausted]     ▼
//!    ├────────[not detected]──────────── REPORTING
//!    │                                      │ [detected]
//!    │                                      ▼
//!    └────────[settle delay]──────────── TERMINATING
//! ```

use super::context::SessionContext;
use super::{StateDescriptor, StateId};
use crate::app::events::ProbeReport;
use crate::config::CompareStrategy;
use log::{info, trace};

// ═══════════════════════════════════════════════════════════════════════════
//  Table builder
// ═══════════════════════════════════════════════════════════════════════════

/// Build the static state table.  Called once at startup.
pub fn build_state_table() -> [StateDescriptor; StateId::COUNT] {
    [
        StateDescriptor {
            id: StateId::Idle,
            name: "Idle",
            on_enter: Some(idle_enter),
            on_exit: None,
            on_update: idle_update,
            transient: false,
        },
        StateDescriptor {
            id: StateId::Arming,
            name: "Arming",
            on_enter: Some(arming_enter),
            on_exit: None,
            on_update: arming_update,
            transient: true,
        },
        StateDescriptor {
            id: StateId::Polling,
            name: "Polling",
            on_enter: None,
            on_exit: None,
            on_update: polling_update,
            transient: false,
        },
        StateDescriptor {
            id: StateId::Triggering,
            name: "Triggering",
            on_enter: Some(triggering_enter),
            on_exit: None,
            on_update: triggering_update,
            transient: true,
        },
        StateDescriptor {
            id: StateId::Reporting,
            name: "Reporting",
            on_enter: Some(reporting_enter),
            on_exit: None,
            on_update: reporting_update,
            transient: true,
        },
        StateDescriptor {
            id: StateId::Terminating,
            name: "Terminating",
            on_enter: None,
            on_exit: None,
            on_update: terminating_update,
            transient: false,
        },
    ]
}

// ═══════════════════════════════════════════════════════════════════════════
//  IDLE
// ═══════════════════════════════════════════════════════════════════════════

fn idle_enter(ctx: &mut SessionContext) {
    if ctx.session_active {
        ctx.session_active = false;
        info!("Session finished for oid={}, detected={}", ctx.oid, ctx.detected);
        if ctx.auto_resume {
            ctx.resume_baseline = true;
        }
    }
}

fn idle_update(_ctx: &mut SessionContext) -> Option<StateId> {
    None
}

// ═══════════════════════════════════════════════════════════════════════════
//  ARMING
// ═══════════════════════════════════════════════════════════════════════════

fn arming_enter(ctx: &mut SessionContext) {
    ctx.clear_outcome();
    ctx.session_active = true;
    ctx.pins.enable = Some(true);
    ctx.waketime = ctx.now.wrapping_add(ctx.tick_interval);
    info!(
        "Starting touch sensing session oid={} cycles={} rest_ticks={} sensitivity={} baseline={}",
        ctx.oid, ctx.remaining_cycles, ctx.tick_interval, ctx.sensitivity, ctx.baseline
    );
}

fn arming_update(_ctx: &mut SessionContext) -> Option<StateId> {
    Some(StateId::Polling)
}

// ═══════════════════════════════════════════════════════════════════════════
//  POLLING
// ═══════════════════════════════════════════════════════════════════════════

fn polling_update(ctx: &mut SessionContext) -> Option<StateId> {
    if let Some(sample) = ctx.sample.take() {
        ctx.last_value = sample;

        let reference = match ctx.compare {
            CompareStrategy::RawCompare => sample,
            CompareStrategy::AveragedCompare => ctx.probe_avg.push(f32::from(sample)) as u16,
        };
        let delta = ctx.delta(reference);
        trace!(
            "Poll: raw={} ref={} baseline={} delta={} cycles={}",
            sample, reference, ctx.baseline, delta, ctx.remaining_cycles
        );

        if delta > i32::from(ctx.sensitivity) {
            info!(
                "Touch detected: raw={}, baseline={}, sensitivity={}, cycle={}",
                sample, ctx.baseline, ctx.sensitivity, ctx.remaining_cycles
            );
            return Some(StateId::Triggering);
        }

        if ctx.compare == CompareStrategy::RawCompare {
            ctx.pins.trigger = Some(false);
        }
    }

    finish_tick(ctx)
}

/// Advance the wake time by one interval and spend a cycle.
fn finish_tick(ctx: &mut SessionContext) -> Option<StateId> {
    ctx.waketime = ctx.waketime.wrapping_add(ctx.tick_interval);
    ctx.remaining_cycles = ctx.remaining_cycles.saturating_sub(1);
    if ctx.remaining_cycles == 0 {
        Some(StateId::Reporting)
    } else {
        None
    }
}

// ═══════════════════════════════════════════════════════════════════════════
//  TRIGGERING
// ═══════════════════════════════════════════════════════════════════════════

fn triggering_enter(ctx: &mut SessionContext) {
    ctx.pins.trigger = Some(true);
    ctx.detected = true;
    // This tick is the last one.
    ctx.remaining_cycles = 1;
}

fn triggering_update(ctx: &mut SessionContext) -> Option<StateId> {
    finish_tick(ctx)
}

// ═══════════════════════════════════════════════════════════════════════════
//  REPORTING
// ═══════════════════════════════════════════════════════════════════════════

fn reporting_enter(ctx: &mut SessionContext) {
    ctx.report = Some(ProbeReport::SessionResult {
        oid: ctx.oid,
        detected: ctx.detected,
        last_value: ctx.last_value,
    });
    ctx.pins.enable = Some(false);
}

fn reporting_update(ctx: &mut SessionContext) -> Option<StateId> {
    if ctx.detected {
        ctx.waketime = ctx.waketime.wrapping_add(ctx.terminator_delay);
        Some(StateId::Terminating)
    } else {
        Some(StateId::Idle)
    }
}

// ═══════════════════════════════════════════════════════════════════════════
//  TERMINATING
// ═══════════════════════════════════════════════════════════════════════════

fn terminating_update(ctx: &mut SessionContext) -> Option<StateId> {
    ctx.pins.trigger = Some(false);
    info!("Terminator phase done for oid={}", ctx.oid);
    Some(StateId::Idle)
}

// ═══════════════════════════════════════════════════════════════════════════
//  Tests
// ═══════════════════════════════════════════════════════════════════════════
