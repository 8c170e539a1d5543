//! Property tests for the core data structures.
//!
//! Runs on host (x86_64) only — proptest is not available for ESP32
//! targets. On ESP32, these tests are compiled out.

#![cfg(not(target_os = "espidf"))]

use proptest::prelude::*;

use terranode::duty_cycle::{expected_night_cycles, hour_of_day, NightWindow};
use terranode::payload::iso8601_utc;
use terranode::store::{AppendResult, DataPoint, ReadingStore, Sample, STORE_CAPACITY};

// ── Reading store invariants ──────────────────────────────────

proptest! {
    /// For any append sequence, the count saturates at capacity, epochs
    /// stay in append order, and nothing already stored is disturbed.
    #[test]
    fn store_count_saturates_and_preserves_order(appends in 0usize..60) {
        let mut store = ReadingStore::new();
        let mut sample = Sample::new();
        sample.push(DataPoint { name: "soil_moisture", value: 1.0 }).unwrap();

        for i in 0..appends {
            let result = store.append(&sample, i as i64);
            if i < STORE_CAPACITY {
                prop_assert_eq!(result, AppendResult::Stored);
            } else {
                prop_assert_eq!(result, AppendResult::Full);
            }
        }

        prop_assert_eq!(store.len(), appends.min(STORE_CAPACITY));
        for (i, reading) in store.readings().iter().enumerate() {
            prop_assert_eq!(reading.epoch, i as i64);
        }
    }

    /// Clearing after any fill level leaves an empty store that accepts
    /// appends again from slot zero.
    #[test]
    fn store_clear_always_restores_capacity(appends in 0usize..30) {
        let mut store = ReadingStore::new();
        let mut sample = Sample::new();
        sample.push(DataPoint { name: "battery_voltage", value: 3.7 }).unwrap();

        for i in 0..appends {
            let _ = store.append(&sample, i as i64);
        }
        store.clear();

        prop_assert!(store.is_empty());
        prop_assert_eq!(store.append(&sample, 999), AppendResult::Stored);
        prop_assert_eq!(store.readings()[0].epoch, 999);
    }
}

// ── Night window properties ───────────────────────────────────

proptest! {
    /// The number of hours a window contains always equals its duration.
    #[test]
    fn window_membership_count_matches_duration(start in 0u8..24, end in 0u8..24) {
        let w = NightWindow { start_hour: start, end_hour: end };
        let hours_inside = (0u8..24).filter(|&h| w.contains(h)).count() as u32;
        prop_assert_eq!(hours_inside * 3600, w.duration_secs());
    }

    /// A window and its mirror partition the day: every hour falls in
    /// exactly one of them (when the window is non-empty).
    #[test]
    fn window_and_mirror_partition_the_day(start in 0u8..24, end in 0u8..24, hour in 0u8..24) {
        prop_assume!(start != end);
        let w = NightWindow { start_hour: start, end_hour: end };
        let mirror = NightWindow { start_hour: end, end_hour: start };
        prop_assert!(w.contains(hour) ^ mirror.contains(hour));
    }

    /// The night-cycle budget never exceeds what the sleep interval allows.
    #[test]
    fn night_cycle_budget_is_bounded(start in 0u8..24, end in 0u8..24, sleep in 1u32..7200) {
        let w = NightWindow { start_hour: start, end_hour: end };
        let cycles = expected_night_cycles(w, sleep);
        prop_assert!(cycles * sleep <= w.duration_secs());
    }
}

// ── Time arithmetic properties ────────────────────────────────

proptest! {
    /// Advancing the epoch by one hour advances the local hour by one,
    /// modulo 24, for any offset in the inhabited range.
    #[test]
    fn hour_of_day_advances_with_time(
        epoch in 0i64..4_000_000_000,
        offset_hours in -12i32..=14,
    ) {
        let offset = offset_hours * 3600;
        let h0 = hour_of_day(epoch, offset);
        let h1 = hour_of_day(epoch + 3600, offset);
        prop_assert_eq!(u32::from(h1), (u32::from(h0) + 1) % 24);
        prop_assert!(h0 < 24);
    }

    /// The formatted timestamp's hour field agrees with hour_of_day at
    /// zero offset.
    #[test]
    fn iso8601_hour_matches_hour_of_day(epoch in 0i64..4_000_000_000) {
        let formatted = iso8601_utc(epoch);
        // "YYYY-MM-DDTHH:MM:SS.000Z"
        let hour: u8 = formatted[11..13].parse().unwrap();
        prop_assert_eq!(hour, hour_of_day(epoch, 0));
        prop_assert_eq!(formatted.len(), 24);
        prop_assert!(formatted.ends_with(".000Z"));
    }
}
