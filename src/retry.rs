//! Bounded synchronous retry: fixed attempt ceiling, fixed inter-attempt
//! delay. One implementation shared by WiFi association, clock sync, and
//! the batch send, instead of a hand-rolled `while` loop per call site.
//!
//! There is no cancellation — once a retry loop starts it runs to success
//! or exhaustion (the node is single-threaded and asleep most of the time,
//! so the only cost is airtime).

use core::fmt;
use log::warn;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first. Zero is treated as one.
    pub max_attempts: u32,
    pub delay_ms: u32,
}

/// Run `op` until it succeeds or the attempt budget is exhausted, sleeping
/// `delay_ms` between attempts. Returns the last error on exhaustion.
pub fn retry<T, E: fmt::Display>(
    policy: RetryPolicy,
    label: &str,
    mut op: impl FnMut() -> Result<T, E>,
) -> Result<T, E> {
    let budget = policy.max_attempts.max(1);
    let mut attempt = 1;
    loop {
        match op() {
            Ok(value) => return Ok(value),
            Err(e) if attempt >= budget => {
                warn!("{}: giving up after {} attempts: {}", label, attempt, e);
                return Err(e);
            }
            Err(e) => {
                warn!(
                    "{}: attempt {} of {} failed ({}), retrying in {} ms",
                    label, attempt, budget, e, policy.delay_ms
                );
                delay_ms(policy.delay_ms);
                attempt += 1;
            }
        }
    }
}

/// Blocking delay. FreeRTOS tick sleep on target, thread sleep on host.
#[cfg(target_os = "espidf")]
pub fn delay_ms(ms: u32) {
    esp_idf_hal::delay::FreeRtos::delay_ms(ms);
}

#[cfg(not(target_os = "espidf"))]
pub fn delay_ms(ms: u32) {
    std::thread::sleep(std::time::Duration::from_millis(u64::from(ms)));
}

#[cfg(test)]
mod tests {
    use super::*;

    const FAST: RetryPolicy = RetryPolicy {
        max_attempts: 3,
        delay_ms: 0,
    };

    #[test]
    fn first_success_makes_one_attempt() {
        let mut calls = 0;
        let result: Result<u32, &str> = retry(FAST, "op", || {
            calls += 1;
            Ok(7)
        });
        assert_eq!(result, Ok(7));
        assert_eq!(calls, 1);
    }

    #[test]
    fn recovers_within_budget() {
        let mut calls = 0;
        let result: Result<(), &str> = retry(FAST, "op", || {
            calls += 1;
            if calls < 3 { Err("not yet") } else { Ok(()) }
        });
        assert_eq!(result, Ok(()));
        assert_eq!(calls, 3);
    }

    #[test]
    fn exhaustion_returns_last_error_after_exact_budget() {
        let mut calls = 0;
        let result: Result<(), &str> = retry(FAST, "op", || {
            calls += 1;
            Err("nope")
        });
        assert_eq!(result, Err("nope"));
        assert_eq!(calls, 3);
    }

    #[test]
    fn zero_attempts_still_tries_once() {
        let mut calls = 0;
        let policy = RetryPolicy {
            max_attempts: 0,
            delay_ms: 0,
        };
        let result: Result<(), &str> = retry(policy, "op", || {
            calls += 1;
            Err("nope")
        });
        assert!(result.is_err());
        assert_eq!(calls, 1);
    }
}
