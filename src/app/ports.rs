//! Port traits — the boundary between the wake-cycle core and the outside
//! world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ run_wake_cycle (core)
//! ```
//!
//! Driven adapters (the sensor set, the WiFi/SNTP/HTTP stack, the system
//! clock) implement these traits. The core consumes them via generics and
//! never touches hardware directly.

use crate::error::NetworkError;
use crate::store::{Sample, StoredReading};

// ───────────────────────────────────────────────────────────────
// Sensor port (hardware → core)
// ───────────────────────────────────────────────────────────────

/// The configured sensor suite as the core sees it: a fallible operation
/// producing zero or more named float measurements.
pub trait SensorBank {
    /// Initialise every configured sensor. Failures are independent per
    /// sensor; a failed sensor is disabled for the rest of the wake.
    /// Returns how many sensors came up.
    fn init_all(&mut self) -> usize;

    /// Read every initialised sensor and aggregate the results into one
    /// combined sample. A sensor whose read fails contributes nothing;
    /// the others still contribute.
    fn read_all(&mut self) -> Sample;
}

// ───────────────────────────────────────────────────────────────
// Network port (core → WiFi/SNTP/HTTP stack)
// ───────────────────────────────────────────────────────────────

/// The network stack as the core sees it. Every operation is bounded —
/// attempt ceilings and inter-attempt delays live in the adapter, so a
/// call terminates rather than blocking indefinitely.
pub trait NetworkPort {
    /// Associate with the configured AP and obtain an address.
    fn connect(&mut self) -> Result<(), NetworkError>;

    /// Tear the connection down. Idempotent.
    fn disconnect(&mut self);

    fn is_connected(&self) -> bool;

    /// Signal strength of the current association, if any.
    fn rssi(&self) -> Option<i8>;

    /// Acquire wall-clock time over the network. Returns the epoch on
    /// success; leaves nothing changed on failure.
    fn sync_clock(&mut self) -> Result<i64, NetworkError>;

    /// Deliver the entire batch. `Ok` means the remote endpoint
    /// acknowledged acceptance of every record — there is no partial
    /// acknowledgment; on `Err` the whole batch remains pending.
    fn send(&mut self, readings: &[StoredReading]) -> Result<(), NetworkError>;
}

// ───────────────────────────────────────────────────────────────
// Wall clock port (core → system clock)
// ───────────────────────────────────────────────────────────────

/// Pushes the controller's authoritative time into the system clock so
/// that everything outside the core (TLS, logs) sees consistent time.
pub trait WallClock {
    fn apply(&mut self, epoch: i64);
}
