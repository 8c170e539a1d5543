//! Hardware drivers — peripheral init and the raw register-level facade.
//!
//! Everything here is `cfg`-gated per target: real ESP-IDF sys calls on
//! `target_os = "espidf"`, in-memory stubs everywhere else so the sensor
//! and core logic stay host-testable.

pub mod hw;
pub mod status_led;
