//! Adapters — implementations of the port traits plus the RTC-persisted
//! state regions.
//!
//! The network adapter only exists on the ESP-IDF target; the core is
//! exercised against mock ports on the host.

pub mod clock;
#[cfg(target_os = "espidf")]
pub mod network;
pub mod rtc_state;
