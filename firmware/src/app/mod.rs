//! Application core — controller logic, zero direct I/O.
//!
//! This module holds the command surface, the host reports and the
//! [`service::ProbeService`] that ties the baseline estimator and the
//! session state machine together.  Every peripheral is reached through
//! the **port traits** in [`ports`].

pub mod commands;
pub mod events;
pub mod ports;
pub mod service;
