//! System wall-clock adapter.
//!
//! The controller's time anchor is authoritative; this adapter pushes it
//! into the OS clock so TLS certificate validation and log timestamps see
//! consistent time even before the next SNTP sync.
//!
//! - **`target_os = "espidf"`** — `settimeofday()` on the ESP-IDF libc.
//! - **all other targets** — records the last applied epoch for tests.

use crate::app::ports::WallClock;

pub struct SystemClock {
    #[cfg(not(target_os = "espidf"))]
    last_applied: Option<i64>,
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            #[cfg(not(target_os = "espidf"))]
            last_applied: None,
        }
    }

    #[cfg(not(target_os = "espidf"))]
    pub fn last_applied(&self) -> Option<i64> {
        self.last_applied
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl WallClock for SystemClock {
    #[cfg(target_os = "espidf")]
    fn apply(&mut self, epoch: i64) {
        let tv = esp_idf_svc::sys::timeval {
            tv_sec: epoch,
            tv_usec: 0,
        };
        // SAFETY: settimeofday with a valid timeval and a null timezone is
        // a plain libc call; single-threaded wake path.
        unsafe {
            esp_idf_svc::sys::settimeofday(&tv, core::ptr::null());
        }
    }

    #[cfg(not(target_os = "espidf"))]
    fn apply(&mut self, epoch: i64) {
        self.last_applied = Some(epoch);
    }
}

#[cfg(all(test, not(target_os = "espidf")))]
mod tests {
    use super::*;

    #[test]
    fn records_applied_epoch() {
        let mut clock = SystemClock::new();
        assert_eq!(clock.last_applied(), None);
        clock.apply(1_735_689_600);
        assert_eq!(clock.last_applied(), Some(1_735_689_600));
    }
}
