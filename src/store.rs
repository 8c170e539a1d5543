//! Fixed-capacity reading buffer persisted across deep sleep.
//!
//! The store lives in RTC memory (see `adapters::rtc_state`), so it must be
//! `const`-constructible and contain no heap pointers. Measurement names are
//! `&'static str` — they point into the flash-resident rodata segment, which
//! is mapped identically on every wake.
//!
//! Buffer policy: appends beyond capacity reject the **newest** reading and
//! report [`AppendResult::Full`] so the caller can log the loss distinctly.
//! History is never overwritten; a full buffer forces a network drain on the
//! next wake regardless of the night window (see `app::cycle`).

use heapless::Vec;
use log::debug;

/// Upper bound on named values a single sensor pass can produce.
pub const MAX_DATA_POINTS: usize = 10;

/// Capacity of the persisted buffer. Sized so the whole store plus the
/// duty-cycle state fits comfortably in the 8 KiB RTC slow memory region.
pub const STORE_CAPACITY: usize = 24;

/// One named measurement.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DataPoint {
    pub name: &'static str,
    pub value: f32,
}

/// The combined output of one sensor pass: zero or more named values.
pub type Sample = Vec<DataPoint, MAX_DATA_POINTS>;

/// One sampled instant, immutable once appended except for the
/// signal-quality tag (back-filled after a successful WiFi association,
/// since RSSI is unknown at capture time).
#[derive(Debug, Clone)]
pub struct StoredReading {
    pub points: Vec<DataPoint, MAX_DATA_POINTS>,
    /// Capture timestamp, seconds since epoch.
    pub epoch: i64,
    /// Last-known WiFi RSSI in dBm. `None` until back-filled.
    pub rssi: Option<i8>,
}

impl StoredReading {
    const EMPTY: Self = Self {
        points: Vec::new(),
        epoch: 0,
        rssi: None,
    };
}

/// Outcome of an append attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[must_use = "a Full result means the reading was dropped and must be logged"]
pub enum AppendResult {
    /// The whole reading was recorded.
    Stored,
    /// The buffer is at capacity; the reading was dropped, nothing changed.
    Full,
}

/// Capacity-bounded sequence of readings plus a count.
///
/// Invariant: `0 <= count <= STORE_CAPACITY`. Exactly one writer exists at
/// any time (the wake-cycle orchestrator); the struct is only ever mutated
/// between sleep transitions.
pub struct ReadingStore {
    readings: [StoredReading; STORE_CAPACITY],
    count: usize,
}

impl ReadingStore {
    /// All-zero store. `const` so it can initialise an RTC-memory static;
    /// runs exactly once, on first-ever power-up.
    pub const fn new() -> Self {
        Self {
            readings: [StoredReading::EMPTY; STORE_CAPACITY],
            count: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    pub fn is_full(&self) -> bool {
        self.count >= STORE_CAPACITY
    }

    /// The currently held readings, oldest first.
    pub fn readings(&self) -> &[StoredReading] {
        &self.readings[..self.count]
    }

    /// Record one sample at `epoch`. All-or-nothing: either the whole
    /// reading lands in the next slot or `Full` is returned and the store
    /// is untouched. The sample must carry at least one named value.
    pub fn append(&mut self, sample: &Sample, epoch: i64) -> AppendResult {
        debug_assert!(!sample.is_empty(), "append requires a non-empty sample");
        if self.is_full() {
            return AppendResult::Full;
        }

        let slot = &mut self.readings[self.count];
        slot.points.clear();
        // Cannot overflow: Sample and the slot share MAX_DATA_POINTS.
        let _ = slot.points.extend_from_slice(sample);
        slot.epoch = epoch;
        slot.rssi = None;
        self.count += 1;

        debug!("store: reading #{} recorded ({} points)", self.count, sample.len());
        AppendResult::Stored
    }

    /// Unconditional reset. Only called after the network layer confirmed
    /// the entire batch was accepted by the remote endpoint.
    pub fn clear(&mut self) {
        self.count = 0;
    }

    /// Back-fill the signal-quality tag of the most recently appended
    /// reading. No-op when the store is empty.
    pub fn tag_last_rssi(&mut self, rssi: i8) {
        if self.count > 0 {
            self.readings[self.count - 1].rssi = Some(rssi);
        }
    }
}
