//! Unified error types for the touch-probe controller.
//!
//! Two tiers only.  [`Fault`] is caller misuse and is fatal: the service
//! latches it and refuses all further work until the device is reset.
//! [`HardwareError`] is transient: the affected tick is skipped and the
//! session carries on.  All variants are `Copy` so they pass through the
//! timer callbacks without allocation.

use core::fmt;

// ---------------------------------------------------------------------------
// Top-level error
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// Fatal misuse of the command surface.
    Fault(Fault),
    /// A bus or pin transaction failed.
    Hardware(HardwareError),
    /// Configuration is out of range.
    Config(&'static str),
    /// A command could not be decoded from its argument array.
    Command(&'static str),
    /// A report did not fit the output buffer.
    Encode,
}

impl Error {
    /// True for errors that must halt the controller.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Fault(_) | Self::Config(_))
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Fault(e) => write!(f, "fault: {e}"),
            Self::Hardware(e) => write!(f, "hardware: {e}"),
            Self::Config(msg) => write!(f, "config: {msg}"),
            Self::Command(msg) => write!(f, "command: {msg}"),
            Self::Encode => write!(f, "report encode failed"),
        }
    }
}

impl core::error::Error for Error {}

// ---------------------------------------------------------------------------
// Fatal faults
// ---------------------------------------------------------------------------

/// Host or caller programming errors.  None of these are retried.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fault {
    /// A session command arrived before `cfg_ts_adc`.
    NotConfigured,
    /// The command's oid does not match the configured instance.
    OidMismatch { expected: u8, got: u8 },
    /// `timeout_cycles` was zero.
    ZeroCycles,
    /// `rest_ticks` was zero.
    ZeroTickInterval,
    /// `sensitivity` was zero.
    ZeroSensitivity,
    /// A session start arrived while another session is in flight.
    SessionActive,
    /// An earlier fault already halted the controller.
    Halted,
}

impl fmt::Display for Fault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotConfigured => write!(f, "touch sensor ADC is not configured"),
            Self::OidMismatch { expected, got } => {
                write!(f, "oid {got} does not match configured oid {expected}")
            }
            Self::ZeroCycles => write!(f, "timeout cycles must be greater than 0"),
            Self::ZeroTickInterval => write!(f, "rest ticks must be greater than 0"),
            Self::ZeroSensitivity => write!(f, "sensitivity must be greater than 0"),
            Self::SessionActive => write!(f, "touch sensing session is already active"),
            Self::Halted => write!(f, "controller halted by an earlier fault"),
        }
    }
}

impl From<Fault> for Error {
    fn from(e: Fault) -> Self {
        Self::Fault(e)
    }
}

// ---------------------------------------------------------------------------
// Hardware errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HardwareError {
    /// SPI full-duplex transfer failed.
    SpiTransfer,
    /// Data-ready pin could not be read.
    PinRead,
    /// Trigger or enable pin could not be driven.
    PinWrite,
}

impl fmt::Display for HardwareError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SpiTransfer => write!(f, "SPI transfer failed"),
            Self::PinRead => write!(f, "GPIO read failed"),
            Self::PinWrite => write!(f, "GPIO write failed"),
        }
    }
}

impl From<HardwareError> for Error {
    fn from(e: HardwareError) -> Self {
        Self::Hardware(e)
    }
}

// ---------------------------------------------------------------------------
// Convenience Result alias
// ---------------------------------------------------------------------------

/// Crate-wide `Result` alias.
pub type Result<T> = core::result::Result<T, Error>;
