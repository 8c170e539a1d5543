//! Node configuration.
//!
//! All tunable parameters for the logging node. Loaded before the core
//! runs; the wake cycle itself treats the config as read-only. Device
//! identity and endpoint credentials are compile-time environment values
//! consumed by the ESP-IDF binary, not part of this struct.

use serde::{Deserialize, Serialize};

use crate::duty_cycle::NightWindow;
use crate::retry::RetryPolicy;

/// Core node configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeConfig {
    // --- Duty cycle ---
    /// Deep-sleep interval between wakes (seconds).
    pub sleep_secs: u32,
    /// First hour of the night window (inclusive, 0-23).
    pub night_start_hour: u8,
    /// First hour after the night window (exclusive, 0-23).
    pub night_end_hour: u8,
    /// Fixed local-time offset from UTC (seconds). No DST handling — the
    /// node cares about a coarse night window, not civil time.
    pub utc_offset_secs: i32,

    // --- Network retry budgets ---
    /// WiFi association attempts per connect call.
    pub wifi_max_attempts: u32,
    /// Delay between association polls (milliseconds).
    pub wifi_poll_delay_ms: u32,
    /// Batch-send attempts per wake.
    pub send_max_attempts: u32,
    /// Delay between send attempts (milliseconds).
    pub send_retry_delay_ms: u32,
    /// Cold-start clock acquisition attempts.
    pub sync_max_attempts: u32,
    /// Delay between clock-sync attempts (milliseconds).
    pub sync_retry_delay_ms: u32,
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            // Duty cycle
            sleep_secs: 15 * 60,
            night_start_hour: 21,
            night_end_hour: 6,
            utc_offset_secs: 11 * 3600, // AEDT

            // Network
            wifi_max_attempts: 20,
            wifi_poll_delay_ms: 500,
            send_max_attempts: 3,
            send_retry_delay_ms: 5_000,
            sync_max_attempts: 5,
            sync_retry_delay_ms: 1_000,
        }
    }
}

impl NodeConfig {
    pub fn night_window(&self) -> NightWindow {
        NightWindow {
            start_hour: self.night_start_hour,
            end_hour: self.night_end_hour,
        }
    }

    pub fn sync_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.sync_max_attempts,
            delay_ms: self.sync_retry_delay_ms,
        }
    }

    pub fn send_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.send_max_attempts,
            delay_ms: self.send_retry_delay_ms,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_sane() {
        let c = NodeConfig::default();
        assert!(c.sleep_secs > 0);
        assert!(c.night_start_hour < 24 && c.night_end_hour < 24);
        assert!(c.wifi_max_attempts > 0);
        assert!(c.send_max_attempts > 0);
        assert!(c.sync_max_attempts > 0);
        // A night shorter than the sleep interval would make the cycle
        // budget zero and disable the counter invariant.
        assert!(c.night_window().duration_secs() >= c.sleep_secs);
    }

    #[test]
    fn serde_roundtrip() {
        let c = NodeConfig::default();
        let json = serde_json::to_string(&c).unwrap();
        let c2: NodeConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(c.sleep_secs, c2.sleep_secs);
        assert_eq!(c.night_start_hour, c2.night_start_hour);
        assert_eq!(c.utc_offset_secs, c2.utc_offset_secs);
        assert_eq!(c.send_retry_delay_ms, c2.send_retry_delay_ms);
    }

    #[test]
    fn default_window_wraps_midnight() {
        let w = NodeConfig::default().night_window();
        assert!(w.contains(23));
        assert!(w.contains(2));
        assert!(!w.contains(12));
    }
}
