//! Persistent duty-cycle state machine: day/night tracking across wakes.
//!
//! The node has no continuously running process — every wake starts from a
//! cold CPU with only the RTC memory intact. This module owns the small
//! persisted record that makes time-dependent decisions possible anyway:
//! the last known wall-clock time, when it was last confirmed by SNTP, and
//! where we are inside the configured night window.
//!
//! ```text
//!  UNINITIALIZED ──[first clock sync]──▶ DAY or NIGHT (by current hour)
//!        ▲                                   │  ▲
//!        │                    [hour enters   │  │ [hour leaves
//!  [validate() false:          night window] ▼  │  night window]
//!   stale sync, counter                    NIGHT ──┐
//!   overrun]                                 ▲     │ self-loop: each wake
//!                                            └─────┘ increments the counter
//! ```
//!
//! `validate()` must run once near the start of every wake, before any
//! sensor or network action — everything downstream assumes a trustworthy
//! clock.

use log::info;

/// Clock staleness bound: a sync older than this invalidates the state.
pub const MAX_SECS_WITHOUT_SYNC: i64 = 24 * 3600;

const SECS_PER_HOUR: i64 = 3600;
const SECS_PER_DAY: i64 = 86_400;

/// Derived controller state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// No trusted clock yet — night/day decisions must not be made.
    Uninitialized,
    Day,
    Night,
}

/// Configured nightly transmission-deferral window.
///
/// Boundary semantics are fixed: start hour inclusive, end hour exclusive.
/// A window with `start > end` wraps across midnight
/// (`hour >= start || hour < end`); `start <= end` covers the plain
/// in-day range. `start == end` is the empty window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NightWindow {
    /// First night hour, 0-23 inclusive. E.g. 21 = 9 PM.
    pub start_hour: u8,
    /// First day hour, 0-23 exclusive of the window. E.g. 6 = 6 AM.
    pub end_hour: u8,
}

impl NightWindow {
    /// Whether `hour` falls inside the window.
    pub fn contains(&self, hour: u8) -> bool {
        if self.start_hour <= self.end_hour {
            hour >= self.start_hour && hour < self.end_hour
        } else {
            hour >= self.start_hour || hour < self.end_hour
        }
    }

    /// Window length in seconds.
    pub fn duration_secs(&self) -> u32 {
        let hours = (24 + i32::from(self.end_hour) - i32::from(self.start_hour)) % 24;
        hours as u32 * SECS_PER_HOUR as u32
    }
}

/// Local hour-of-day (0-23) for an epoch timestamp, given a fixed UTC
/// offset. Pure arithmetic — no libc time dependency, so the night check
/// is deterministic in host tests.
pub fn hour_of_day(epoch: i64, utc_offset_secs: i32) -> u8 {
    let local = epoch + i64::from(utc_offset_secs);
    (local.rem_euclid(SECS_PER_DAY) / SECS_PER_HOUR) as u8
}

/// How many wake cycles fit into one night at the given sleep interval.
pub fn expected_night_cycles(window: NightWindow, sleep_secs: u32) -> u32 {
    window.duration_secs() / sleep_secs.max(1)
}

/// The persisted record. Lives in RTC memory; every field is mutated only
/// through the methods below, never destroyed — a failed validation resets
/// it in place via [`DutyCycleState::reset`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DutyCycleState {
    /// Authoritative clock anchor, seconds since epoch.
    pub last_known_time: i64,
    /// When SNTP last confirmed the clock.
    pub last_sync_time: i64,
    pub is_night: bool,
    /// Recalculated at each DAY→NIGHT crossing.
    pub wake_cycles_per_night: u32,
    /// Increments once per wake while `is_night` holds.
    pub night_wake_counter: u32,
    /// `false` means the state must not be trusted for night/day decisions.
    pub time_initialized: bool,
}

impl DutyCycleState {
    /// First-ever power-up value. `const` so the RTC static can hold it.
    pub const fn new() -> Self {
        Self {
            last_known_time: 0,
            last_sync_time: 0,
            is_night: false,
            wake_cycles_per_night: 0,
            night_wake_counter: 0,
            time_initialized: false,
        }
    }

    pub fn phase(&self) -> Phase {
        if !self.time_initialized {
            Phase::Uninitialized
        } else if self.is_night {
            Phase::Night
        } else {
            Phase::Day
        }
    }

    /// Whether the persisted state is still trustworthy.
    ///
    /// Returns `false` — forcing a full cold-start reinitialisation — when
    /// the clock was never acquired, the last sync is older than
    /// [`MAX_SECS_WITHOUT_SYNC`], or the night counter has overrun its
    /// expected ceiling (the device slept through an outage or lost track
    /// of night-cycle counting).
    pub fn validate(&self) -> bool {
        if !self.time_initialized {
            return false;
        }
        if self.last_known_time - self.last_sync_time > MAX_SECS_WITHOUT_SYNC {
            return false;
        }
        if self.wake_cycles_per_night > 0 && self.night_wake_counter > self.wake_cycles_per_night {
            return false;
        }
        true
    }

    /// Full reinitialisation to the first-boot value.
    pub fn reset(&mut self) {
        *self = Self::new();
    }

    /// Advance the clock anchor by one sleep interval.
    ///
    /// The RTC timer does not keep wall-clock time through deep sleep, so
    /// this must run immediately on every warm wake, before any
    /// time-dependent decision. While the night window holds, this is also
    /// the NIGHT self-loop that ticks the wake counter.
    pub fn account_for_sleep(&mut self, sleep_secs: u32) {
        self.last_known_time += i64::from(sleep_secs);
        if self.is_night {
            self.night_wake_counter += 1;
            info!(
                "night cycle {} of {}",
                self.night_wake_counter, self.wake_cycles_per_night
            );
        }
    }

    /// Record a successful clock acquisition.
    pub fn record_sync(&mut self, epoch: i64) {
        self.last_known_time = epoch;
        self.last_sync_time = epoch;
        self.night_wake_counter = 0;
        self.time_initialized = true;
    }

    /// Cold-start initialisation after the first successful clock sync:
    /// reset, anchor the clock, compute the night-cycle budget, and
    /// classify the current hour into day or night.
    pub fn initialize(
        &mut self,
        epoch: i64,
        window: NightWindow,
        sleep_secs: u32,
        utc_offset_secs: i32,
    ) {
        self.reset();
        self.record_sync(epoch);
        self.wake_cycles_per_night = expected_night_cycles(window, sleep_secs);
        self.is_night = window.contains(hour_of_day(epoch, utc_offset_secs));
        info!(
            "duty cycle initialised: phase={:?}, {} wake cycles per night",
            self.phase(),
            self.wake_cycles_per_night
        );
    }

    /// Re-classify day/night from the current clock anchor, handling the
    /// transition bookkeeping. Call once per wake after
    /// [`account_for_sleep`](Self::account_for_sleep).
    pub fn update_phase(
        &mut self,
        window: NightWindow,
        sleep_secs: u32,
        utc_offset_secs: i32,
    ) -> Phase {
        let hour = hour_of_day(self.last_known_time, utc_offset_secs);
        let night_now = window.contains(hour);
        match (self.is_night, night_now) {
            (false, true) => {
                self.is_night = true;
                self.night_wake_counter = 0;
                self.wake_cycles_per_night = expected_night_cycles(window, sleep_secs);
                info!(
                    "entering night window at hour {} ({} cycles expected)",
                    hour, self.wake_cycles_per_night
                );
            }
            (true, false) => {
                self.is_night = false;
                self.night_wake_counter = 0;
                info!("leaving night window at hour {}", hour);
            }
            _ => {}
        }
        self.phase()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const WINDOW: NightWindow = NightWindow {
        start_hour: 21,
        end_hour: 6,
    };
    const SLEEP: u32 = 900; // 15 min
    const UTC: i32 = 0;

    /// 2025-01-01T00:00:00Z — midnight, inside the 21-06 window.
    const MIDNIGHT: i64 = 1_735_689_600;
    /// Noon the same day.
    const NOON: i64 = MIDNIGHT + 12 * 3600;

    #[test]
    fn hour_of_day_handles_offsets_and_wrap() {
        assert_eq!(hour_of_day(MIDNIGHT, 0), 0);
        assert_eq!(hour_of_day(NOON, 0), 12);
        assert_eq!(hour_of_day(MIDNIGHT, 11 * 3600), 11);
        assert_eq!(hour_of_day(MIDNIGHT, -3600), 23);
    }

    #[test]
    fn night_window_start_inclusive_end_exclusive() {
        assert!(WINDOW.contains(21));
        assert!(WINDOW.contains(23));
        assert!(WINDOW.contains(0));
        assert!(WINDOW.contains(5));
        assert!(!WINDOW.contains(6));
        assert!(!WINDOW.contains(20));
        assert!(!WINDOW.contains(12));
    }

    #[test]
    fn non_wrapping_window() {
        let w = NightWindow {
            start_hour: 9,
            end_hour: 17,
        };
        assert!(w.contains(9));
        assert!(w.contains(16));
        assert!(!w.contains(17));
        assert!(!w.contains(8));
        assert_eq!(w.duration_secs(), 8 * 3600);
    }

    #[test]
    fn window_duration_wraps_midnight() {
        assert_eq!(WINDOW.duration_secs(), 9 * 3600);
        assert_eq!(expected_night_cycles(WINDOW, SLEEP), 36);
    }

    #[test]
    fn empty_window_has_zero_cycles() {
        let w = NightWindow {
            start_hour: 6,
            end_hour: 6,
        };
        assert_eq!(w.duration_secs(), 0);
        assert_eq!(expected_night_cycles(w, SLEEP), 0);
        assert!(!w.contains(6));
    }

    #[test]
    fn fresh_state_is_untrusted() {
        let state = DutyCycleState::new();
        assert!(!state.validate());
        assert_eq!(state.phase(), Phase::Uninitialized);
    }

    #[test]
    fn initialize_classifies_current_hour() {
        let mut state = DutyCycleState::new();
        state.initialize(MIDNIGHT, WINDOW, SLEEP, UTC);
        assert!(state.validate());
        assert_eq!(state.phase(), Phase::Night);
        assert_eq!(state.wake_cycles_per_night, 36);

        state.initialize(NOON, WINDOW, SLEEP, UTC);
        assert_eq!(state.phase(), Phase::Day);
    }

    #[test]
    fn account_for_sleep_twice_advances_exactly_two_intervals() {
        let mut state = DutyCycleState::new();
        state.initialize(NOON, WINDOW, SLEEP, UTC);
        let t0 = state.last_known_time;
        state.account_for_sleep(SLEEP);
        state.account_for_sleep(SLEEP);
        assert_eq!(state.last_known_time, t0 + 2 * i64::from(SLEEP));
    }

    #[test]
    fn night_counter_ceiling_then_overrun_invalidates() {
        let mut state = DutyCycleState::new();
        state.initialize(MIDNIGHT, WINDOW, SLEEP, UTC);
        state.night_wake_counter = state.wake_cycles_per_night - 1;

        // One more wake without a DAY transition: at the ceiling, still valid.
        state.account_for_sleep(SLEEP);
        assert_eq!(state.night_wake_counter, state.wake_cycles_per_night);
        assert!(state.validate());

        // One further wake: counter overruns, state no longer trusted.
        state.account_for_sleep(SLEEP);
        assert!(!state.validate());
    }

    #[test]
    fn counter_does_not_tick_during_day() {
        let mut state = DutyCycleState::new();
        state.initialize(NOON, WINDOW, SLEEP, UTC);
        state.account_for_sleep(SLEEP);
        state.account_for_sleep(SLEEP);
        assert_eq!(state.night_wake_counter, 0);
    }

    #[test]
    fn stale_sync_invalidates() {
        let mut state = DutyCycleState::new();
        state.initialize(NOON, WINDOW, SLEEP, UTC);
        state.last_known_time = NOON + MAX_SECS_WITHOUT_SYNC + 1;
        assert!(!state.validate());
    }

    #[test]
    fn day_to_night_transition_resets_counter_and_recomputes() {
        let mut state = DutyCycleState::new();
        // 20:30 — half an hour before the window.
        state.initialize(MIDNIGHT + 20 * 3600 + 1800, WINDOW, SLEEP, UTC);
        assert_eq!(state.phase(), Phase::Day);
        state.night_wake_counter = 7; // residue that must be cleared

        state.account_for_sleep(SLEEP * 2); // past 21:00
        assert_eq!(state.update_phase(WINDOW, SLEEP, UTC), Phase::Night);
        assert_eq!(state.night_wake_counter, 0);
        assert_eq!(state.wake_cycles_per_night, 36);
    }

    #[test]
    fn night_to_day_transition_resets_counter() {
        let mut state = DutyCycleState::new();
        // 05:30 — still inside the window.
        state.initialize(MIDNIGHT + 5 * 3600 + 1800, WINDOW, SLEEP, UTC);
        assert_eq!(state.phase(), Phase::Night);

        state.account_for_sleep(SLEEP * 2); // past 06:00
        assert_eq!(state.update_phase(WINDOW, SLEEP, UTC), Phase::Day);
        assert_eq!(state.night_wake_counter, 0);
    }

    #[test]
    fn record_sync_resets_counter_and_refreshes_anchor() {
        let mut state = DutyCycleState::new();
        state.initialize(MIDNIGHT, WINDOW, SLEEP, UTC);
        state.account_for_sleep(SLEEP);
        assert_eq!(state.night_wake_counter, 1);

        let synced = state.last_known_time + 3;
        state.record_sync(synced);
        assert_eq!(state.night_wake_counter, 0);
        assert_eq!(state.last_known_time, synced);
        assert_eq!(state.last_sync_time, synced);
        assert!(state.validate());
    }
}
