//! Application core — pure wake-cycle logic, zero I/O.
//!
//! The orchestrator in [`cycle`] sequences one full wake: state validation,
//! sleep-duration accounting, day/night bookkeeping, sensor sampling,
//! storage, and the conditional network drain. All interaction with
//! hardware happens through the **port traits** in [`ports`], keeping this
//! layer fully testable with mock adapters.

pub mod cycle;
pub mod ports;
