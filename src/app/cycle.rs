//! The wake-cycle orchestrator — one execution per wake, no loop.
//!
//! The device's native sleep/wake cycle *is* the loop; everything below
//! happens exactly once between two sleep transitions:
//!
//! ```text
//!  validate state ──▶ [cold start: connect + clock sync, fatal on failure]
//!        │
//!        ▼ (warm)
//!  account for sleep ──▶ day/night bookkeeping ──▶ sensor init (fatal if 0)
//!        │
//!        ▼
//!  pre-connect? ──▶ read sensors ──▶ append ──▶ [connected: tag RSSI,
//!        │                                       re-sync, batch send,
//!        ▼                                       clear on success]
//!  disconnect ──▶ caller arms the sleep timer
//! ```
//!
//! Failure policy: everything network- or sensor-read-shaped is non-fatal
//! and degrades into "more readings accumulate, retried next wake". Only
//! cold-start exhaustion and a completely dead sensor suite are terminal.

use log::{info, warn};

use crate::config::NodeConfig;
use crate::duty_cycle::{DutyCycleState, Phase};
use crate::error::FatalError;
use crate::retry::retry;
use crate::store::{AppendResult, ReadingStore};

use super::ports::{NetworkPort, SensorBank, WallClock};

/// What one wake did — for the log line before sleep and for tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WakeReport {
    pub cold_start: bool,
    pub phase: Phase,
    /// A reading was appended this wake.
    pub stored: bool,
    /// The newest reading was dropped because the store is at capacity.
    pub dropped: bool,
    /// Readings confirmed delivered and cleared this wake.
    pub sent: usize,
    /// Store fill level at the end of the cycle.
    pub store_len: usize,
}

/// Whether to bring the radio up before reading sensors.
///
/// Day with pending readings: drain opportunistically. Full buffer: drain
/// no matter the hour — a full buffer must never silently persist unsent.
fn should_connect(phase: Phase, store: &ReadingStore) -> bool {
    (phase != Phase::Night && !store.is_empty()) || store.is_full()
}

/// Run one full wake cycle. The caller owns the persisted regions and the
/// adapters; on `Ok` it arms the sleep timer, on `Err` it routes to the
/// terminal error indication.
pub fn run_wake_cycle(
    cfg: &NodeConfig,
    state: &mut DutyCycleState,
    store: &mut ReadingStore,
    sensors: &mut impl SensorBank,
    net: &mut impl NetworkPort,
    clock: &mut impl WallClock,
) -> Result<WakeReport, FatalError> {
    let window = cfg.night_window();

    // 1. State validation, before any sensor or network action.
    let cold_start = !state.validate();
    if cold_start {
        info!("persisted state not trustworthy, cold-starting");
        state.reset();

        let epoch = retry(cfg.sync_policy(), "cold-start clock sync", || {
            net.connect()?;
            net.sync_clock()
        })
        .map_err(|_| FatalError::ColdStartFailed)?;

        state.initialize(epoch, window, cfg.sleep_secs, cfg.utc_offset_secs);
        clock.apply(epoch);
        // Radio back off until the send decision; the sync may have
        // happened hours before the first upload window.
        net.disconnect();
    } else {
        // 2. The clock stopped during deep sleep; advance the anchor by
        // the configured interval and push it into the system clock before
        // any time-dependent decision.
        state.account_for_sleep(cfg.sleep_secs);
        clock.apply(state.last_known_time);
    }

    // 3. Day/night bookkeeping (transition counters, cycle budget).
    let phase = state.update_phase(window, cfg.sleep_secs, cfg.utc_offset_secs);

    // 4. Sensor suite. Independent failures are fine; a completely dead
    // suite is not worth waking up for ever again.
    let sensors_up = sensors.init_all();
    if sensors_up == 0 {
        return Err(FatalError::NoSensors);
    }

    // 5. Opportunistic pre-connect. Failure is non-fatal: keep sampling,
    // readings accumulate for the next wake.
    if should_connect(phase, store) && !net.is_connected() {
        if let Err(e) = net.connect() {
            warn!("pre-connect failed ({}), continuing offline", e);
        }
    }

    // 6. Sample and store.
    let mut stored = false;
    let mut dropped = false;
    let sample = sensors.read_all();
    if sample.is_empty() {
        warn!("every sensor read failed, nothing to store this wake");
    } else {
        match store.append(&sample, state.last_known_time) {
            AppendResult::Stored => stored = true,
            AppendResult::Full => {
                // Distinct from ordinary send failures: data is being lost.
                warn!(
                    "store full ({} readings), dropping newest reading",
                    store.len()
                );
                dropped = true;
            }
        }
    }

    // 7. Network phase, only while associated.
    let mut sent = 0;
    if net.is_connected() {
        // Signal strength was unknown before association.
        if let Some(rssi) = net.rssi() {
            store.tag_last_rssi(rssi);
        }

        // Opportunistic clock refresh while the radio is already up; keeps
        // the staleness bound from forcing a nightly cold start. Failure
        // is non-fatal — proceed with the stale clock.
        match net.sync_clock() {
            Ok(epoch) => {
                state.record_sync(epoch);
                clock.apply(epoch);
            }
            Err(e) => warn!("clock refresh failed ({}), keeping stale clock", e),
        }

        // 8. Full-batch send; all-or-nothing from the store's perspective.
        if !store.is_empty() {
            let pending = store.len();
            match net.send(store.readings()) {
                Ok(()) => {
                    info!("delivered {} readings, clearing store", pending);
                    store.clear();
                    sent = pending;
                }
                Err(e) => {
                    warn!("batch send failed ({}), {} readings kept", e, pending);
                }
            }
        }
    }

    // 9. Radio off before sleep.
    net.disconnect();

    Ok(WakeReport {
        cold_start,
        phase,
        stored,
        dropped,
        sent,
        store_len: store.len(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{DataPoint, Sample};

    fn filled(n: usize) -> ReadingStore {
        let mut store = ReadingStore::new();
        let mut sample = Sample::new();
        sample
            .push(DataPoint {
                name: "soil_moisture",
                value: 1.0,
            })
            .unwrap();
        for i in 0..n {
            assert_eq!(store.append(&sample, i as i64), AppendResult::Stored);
        }
        store
    }

    #[test]
    fn day_with_pending_readings_connects() {
        assert!(should_connect(Phase::Day, &filled(1)));
    }

    #[test]
    fn day_with_empty_store_stays_offline() {
        assert!(!should_connect(Phase::Day, &filled(0)));
    }

    #[test]
    fn night_defers_transmission() {
        assert!(!should_connect(Phase::Night, &filled(5)));
    }

    #[test]
    fn full_store_overrides_night() {
        assert!(should_connect(
            Phase::Night,
            &filled(crate::store::STORE_CAPACITY)
        ));
    }
}
