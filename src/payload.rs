//! Wire payload construction.
//!
//! The network layer ships one JSON array per batch: every data point of
//! every stored reading becomes one flat record, plus one synthetic
//! `wifi_rssi` record per reading whose signal-quality tag was back-filled.
//! Timestamps are ISO-8601 UTC derived from the reading's stored epoch.

use serde::Serialize;

use crate::store::StoredReading;

/// One flat record as the ingestion endpoint expects it.
#[derive(Debug, Serialize)]
pub struct WireRecord<'a> {
    #[serde(rename = "type")]
    pub kind: &'a str,
    pub value: f32,
    #[serde(rename = "deviceId")]
    pub device_id: &'a str,
    pub timestamp: String,
}

/// Expand stored readings into the flat record list and serialise it.
pub fn build_payload(readings: &[StoredReading], device_id: &str) -> serde_json::Result<String> {
    let mut records = Vec::new();
    for reading in readings {
        let timestamp = iso8601_utc(reading.epoch);
        for point in &reading.points {
            records.push(WireRecord {
                kind: point.name,
                value: point.value,
                device_id,
                timestamp: timestamp.clone(),
            });
        }
        if let Some(rssi) = reading.rssi {
            records.push(WireRecord {
                kind: "wifi_rssi",
                value: f32::from(rssi),
                device_id,
                timestamp,
            });
        }
    }
    serde_json::to_string(&records)
}

/// `%Y-%m-%dT%H:%M:%S.000Z` for an epoch timestamp.
pub fn iso8601_utc(epoch: i64) -> String {
    let days = epoch.div_euclid(86_400);
    let secs = epoch.rem_euclid(86_400);
    let (year, month, day) = civil_from_days(days);
    format!(
        "{:04}-{:02}-{:02}T{:02}:{:02}:{:02}.000Z",
        year,
        month,
        day,
        secs / 3600,
        (secs % 3600) / 60,
        secs % 60
    )
}

/// Gregorian date for a day count since 1970-01-01 (Howard Hinnant's
/// civil-from-days algorithm).
fn civil_from_days(z: i64) -> (i64, u32, u32) {
    let z = z + 719_468;
    let era = if z >= 0 { z } else { z - 146_096 } / 146_097;
    let doe = z - era * 146_097;
    let yoe = (doe - doe / 1_460 + doe / 36_524 - doe / 146_096) / 365;
    let year = yoe + era * 400;
    let doy = doe - (365 * yoe + yoe / 4 - yoe / 100);
    let mp = (5 * doy + 2) / 153;
    let day = (doy - (153 * mp + 2) / 5 + 1) as u32;
    let month = if mp < 10 { mp + 3 } else { mp - 9 } as u32;
    (if month <= 2 { year + 1 } else { year }, month, day)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{AppendResult, ReadingStore, Sample};
    use crate::store::DataPoint;

    #[test]
    fn iso8601_known_instants() {
        assert_eq!(iso8601_utc(0), "1970-01-01T00:00:00.000Z");
        assert_eq!(iso8601_utc(1_735_689_600), "2025-01-01T00:00:00.000Z");
        assert_eq!(iso8601_utc(951_827_696), "2000-02-29T12:34:56.000Z");
        assert_eq!(iso8601_utc(1_767_225_599), "2025-12-31T23:59:59.000Z");
    }

    fn store_with(points: &[(&'static str, f32)], epoch: i64) -> ReadingStore {
        let mut store = ReadingStore::new();
        let mut sample = Sample::new();
        for &(name, value) in points {
            sample.push(DataPoint { name, value }).unwrap();
        }
        assert_eq!(store.append(&sample, epoch), AppendResult::Stored);
        store
    }

    #[test]
    fn one_record_per_data_point() {
        let store = store_with(
            &[("soil_moisture", 54.5), ("battery_voltage", 3.91)],
            1_735_689_600,
        );
        let json = build_payload(store.readings(), "node-07").unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&json).unwrap();
        let records = parsed.as_array().unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0]["type"], "soil_moisture");
        assert_eq!(records[0]["deviceId"], "node-07");
        assert_eq!(records[0]["timestamp"], "2025-01-01T00:00:00.000Z");
        assert_eq!(records[1]["type"], "battery_voltage");
    }

    #[test]
    fn tagged_reading_gains_synthetic_rssi_record() {
        let mut store = store_with(&[("soil_moisture", 12.0)], 100);
        store.tag_last_rssi(-58);
        let json = build_payload(store.readings(), "node-07").unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&json).unwrap();
        let records = parsed.as_array().unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[1]["type"], "wifi_rssi");
        assert_eq!(records[1]["value"], -58.0);
    }

    #[test]
    fn untagged_reading_has_no_rssi_record() {
        let store = store_with(&[("soil_moisture", 12.0)], 100);
        let json = build_payload(store.readings(), "node-07").unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.as_array().unwrap().len(), 1);
    }

    #[test]
    fn empty_batch_serialises_to_empty_array() {
        let store = ReadingStore::new();
        let json = build_payload(store.readings(), "node-07").unwrap();
        assert_eq!(json, "[]");
    }
}
