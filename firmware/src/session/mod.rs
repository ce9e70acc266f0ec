//! Function-pointer finite state machine for the touch session.
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────┐
//! │  StateTable                                                      │
//! │  ┌─────────────┬──────────┬───────────────────┬───────────┐      │
//! │  │ StateId     │ on_enter │ on_update         │ transient │      │
//! │  ├─────────────┼──────────┼───────────────────┼───────────┤      │
//! │  │ Idle        │ fn(ctx)  │ fn(ctx)->Option<> │ no        │      │
//! │  │ Arming      │ fn(ctx)  │ fn(ctx)->Option<> │ yes       │      │
//! │  │ Polling     │ -        │ fn(ctx)->Option<> │ no        │      │
//! │  │ Triggering  │ fn(ctx)  │ fn(ctx)->Option<> │ yes       │      │
//! │  │ Reporting   │ fn(ctx)  │ fn(ctx)->Option<> │ yes       │      │
//! │  │ Terminating │ -        │ fn(ctx)->Option<> │ no        │      │
//! │  └─────────────┴──────────┴───────────────────┴───────────┘      │
//! └──────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Each timer firing the engine calls `on_update` for the **current**
//! state.  If it returns `Some(next_id)`, the engine runs `on_exit` for the
//! current state, then `on_enter` for the next.  A transient state's
//! `on_update` then runs straight away, inside the same firing, so one
//! poll tick can go Polling → Triggering → Reporting → Terminating.
//! Resting states wait for the next firing.

pub mod context;
pub mod states;

use context::SessionContext;
use log::info;

// ---------------------------------------------------------------------------
// State identity
// ---------------------------------------------------------------------------

/// Every state a probe session can be in.
/// Must stay in sync with the table built in [`states::build_state_table`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum StateId {
    Idle = 0,
    Arming = 1,
    Polling = 2,
    Triggering = 3,
    Reporting = 4,
    Terminating = 5,
}

impl StateId {
    /// Total number of states; sizes the table array.
    pub const COUNT: usize = 6;

    /// Convert an index back to `StateId`.  Panics on out-of-range in
    /// debug builds; returns `Idle` in release.
    pub fn from_index(idx: usize) -> Self {
        match idx {
            0 => Self::Idle,
            1 => Self::Arming,
            2 => Self::Polling,
            3 => Self::Triggering,
            4 => Self::Reporting,
            5 => Self::Terminating,
            _ => {
                debug_assert!(false, "invalid state index: {idx}");
                Self::Idle
            }
        }
    }

    /// States that keep the session timer armed.
    pub fn wants_timer(self) -> bool {
        matches!(self, Self::Polling | Self::Terminating)
    }
}

// ---------------------------------------------------------------------------
// Function-pointer type aliases
// ---------------------------------------------------------------------------

/// Signature for `on_enter` and `on_exit` actions.
pub type StateActionFn = fn(&mut SessionContext);

/// Signature for the update handler.
/// Returns `Some(next)` to trigger a transition, or `None` to stay.
pub type StateUpdateFn = fn(&mut SessionContext) -> Option<StateId>;

// ---------------------------------------------------------------------------
// State descriptor (one row in the table)
// ---------------------------------------------------------------------------

/// Static descriptor for a single session state.
pub struct StateDescriptor {
    pub id: StateId,
    pub name: &'static str,
    pub on_enter: Option<StateActionFn>,
    pub on_exit: Option<StateActionFn>,
    pub on_update: StateUpdateFn,
    /// Run `on_update` immediately after entry instead of waiting a tick.
    pub transient: bool,
}

// ---------------------------------------------------------------------------
// FSM engine
// ---------------------------------------------------------------------------

pub struct Fsm {
    /// Fixed-size table indexed by `StateId as usize`.
    table: [StateDescriptor; StateId::COUNT],
    current: usize,
}

impl Fsm {
    pub fn new(table: [StateDescriptor; StateId::COUNT], initial: StateId) -> Self {
        Self {
            table,
            current: initial as usize,
        }
    }

    /// Run the initial `on_enter` for the starting state.
    pub fn start(&mut self, ctx: &mut SessionContext) {
        info!("Session FSM starting in state: {}", self.table[self.current].name);
        if let Some(enter) = self.table[self.current].on_enter {
            enter(ctx);
        }
    }

    /// Advance the FSM by one timer firing.
    pub fn tick(&mut self, ctx: &mut SessionContext) {
        let next = (self.table[self.current].on_update)(ctx);

        if let Some(next_id) = next {
            self.transition(next_id, ctx);
            self.settle(ctx);
        }
    }

    /// Jump straight to `next` (session start, re-configuration), then run
    /// any transient states that follow.
    pub fn force_transition(&mut self, next: StateId, ctx: &mut SessionContext) {
        if next as usize != self.current {
            self.transition(next, ctx);
            self.settle(ctx);
        }
    }

    /// Put the engine back in `state` without running any handlers.
    pub fn reset_to(&mut self, state: StateId) {
        self.current = state as usize;
    }

    pub fn current_state(&self) -> StateId {
        StateId::from_index(self.current)
    }

    // -----------------------------------------------------------------------
    // Internal
    // -----------------------------------------------------------------------

    fn settle(&mut self, ctx: &mut SessionContext) {
        // A transient chain can visit each state at most once.
        for _ in 0..StateId::COUNT {
            let row = &self.table[self.current];
            if !row.transient {
                return;
            }
            match (row.on_update)(ctx) {
                Some(next_id) => self.transition(next_id, ctx),
                None => return,
            }
        }
    }

    fn transition(&mut self, next_id: StateId, ctx: &mut SessionContext) {
        let next_idx = next_id as usize;

        log::debug!(
            "Session transition: {} -> {}",
            self.table[self.current].name,
            self.table[next_idx].name
        );

        if let Some(exit) = self.table[self.current].on_exit {
            exit(ctx);
        }

        self.current = next_idx;

        if let Some(enter) = self.table[self.current].on_enter {
            enter(ctx);
        }
    }
}
