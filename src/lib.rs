//! TerraNode firmware library.
//!
//! Battery-powered environmental logging node: wake from deep sleep on a
//! timer, sample the sensor suite, persist the reading in RTC memory, and
//! upload the accumulated batch over HTTPS outside the configured night
//! window. Exposes the pure-logic modules for integration testing; all
//! ESP-IDF-specific code is guarded by `#[cfg(target_os = "espidf")]`
//! within each module.

#![deny(unused_must_use)]

pub mod app;
pub mod config;
pub mod duty_cycle;
pub mod payload;
pub mod retry;
pub mod store;

pub mod error;
pub mod pins;

// ESP-IDF-backed layers; the implementations are guarded by cfg attributes
// inside so the crate stays host-buildable.
pub mod adapters;
pub mod drivers;
pub mod sensors;
