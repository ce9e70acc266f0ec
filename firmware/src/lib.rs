//! Touch-probe session controller library.
//!
//! Exposes the pure-logic modules for integration testing and for embedding
//! in firmware.  With the default `std` feature off the crate is `no_std`;
//! the host-only console logger and simulation binary need `std`.

#![cfg_attr(not(feature = "std"), no_std)]
#![deny(unused_must_use)]

pub mod adapters;
pub mod app;
pub mod config;
pub mod error;
pub mod scheduler;
pub mod sensors;
pub mod session;

pub use app::service::ProbeService;
pub use config::ProbeConfig;
pub use error::{Error, Fault, Result};
