//! Unified error types for the node firmware.
//!
//! A single small enum per subsystem, all `Copy`, so failures can be passed
//! through the wake cycle without allocation. Every fallible operation
//! returns an explicit `Result` the caller must check — no panics, no
//! exceptions-as-control-flow.

use core::fmt;

// ---------------------------------------------------------------------------
// Sensor errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SensorError {
    /// The device did not respond or identified incorrectly at init.
    InitFailed,
    /// ADC read returned an error or timed out.
    AdcReadFailed,
    /// I2C transaction failed.
    BusError,
    /// Reading is outside the physically plausible range.
    OutOfRange,
}

impl fmt::Display for SensorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InitFailed => write!(f, "sensor init failed"),
            Self::AdcReadFailed => write!(f, "ADC read failed"),
            Self::BusError => write!(f, "I2C bus error"),
            Self::OutOfRange => write!(f, "reading out of range"),
        }
    }
}

// ---------------------------------------------------------------------------
// Network errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NetworkError {
    /// WiFi association did not complete within the attempt budget.
    AssociationFailed,
    /// SNTP did not report completion within the attempt budget.
    SyncTimeout,
    /// The HTTP round-trip failed below the status-code level.
    Transport,
    /// The endpoint answered with a non-success status.
    HttpStatus(u16),
}

impl fmt::Display for NetworkError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AssociationFailed => write!(f, "WiFi association failed"),
            Self::SyncTimeout => write!(f, "clock sync timed out"),
            Self::Transport => write!(f, "HTTP transport error"),
            Self::HttpStatus(code) => write!(f, "HTTP status {}", code),
        }
    }
}

// ---------------------------------------------------------------------------
// Fatal conditions
// ---------------------------------------------------------------------------

/// The two conditions that end a wake cycle in the terminal
/// error-indication state instead of deep sleep. Everything else degrades
/// gracefully and is retried on the next wake.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FatalError {
    /// Cold start could not acquire network time after bounded retries —
    /// without it, night/day logic cannot be trusted at all.
    ColdStartFailed,
    /// No configured sensor could be initialised.
    NoSensors,
}

impl fmt::Display for FatalError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ColdStartFailed => write!(f, "cold start: clock acquisition failed"),
            Self::NoSensors => write!(f, "no sensor could be initialised"),
        }
    }
}

impl core::error::Error for FatalError {}
