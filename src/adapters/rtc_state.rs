//! RTC slow-memory persisted state.
//!
//! Deep sleep powers down the CPU and main RAM; the RTC slow memory stays
//! powered, so statics placed in `.rtc.data` survive every timer wake (but
//! not a power cycle or reflash — that is what `DutyCycleState::validate`
//! catches). On the host the statics are ordinary process memory.

use crate::duty_cycle::DutyCycleState;
use crate::store::ReadingStore;

#[cfg_attr(target_os = "espidf", unsafe(link_section = ".rtc.data"))]
static mut DUTY_STATE: DutyCycleState = DutyCycleState::new();

#[cfg_attr(target_os = "espidf", unsafe(link_section = ".rtc.data"))]
static mut READING_STORE: ReadingStore = ReadingStore::new();

#[cfg_attr(target_os = "espidf", unsafe(link_section = ".rtc.data"))]
static mut BOOT_COUNT: u32 = 0;

/// Hand out the persisted regions.
///
/// SAFETY contract: call once per wake, from the single-threaded main path,
/// before any task is spawned. The returned references alias the statics,
/// so a second call within one wake would create aliasing `&mut`s.
pub unsafe fn take() -> (&'static mut DutyCycleState, &'static mut ReadingStore) {
    // SAFETY: caller upholds the once-per-wake, single-threaded contract.
    unsafe { (&mut *(&raw mut DUTY_STATE), &mut *(&raw mut READING_STORE)) }
}

/// Bump and return the wake counter. Wraps on overflow (a node waking every
/// 15 minutes would need two millennia to get there).
pub fn bump_boot_count() -> u32 {
    // SAFETY: single-threaded main path, called once per wake.
    unsafe {
        let p = &raw mut BOOT_COUNT;
        *p = (*p).wrapping_add(1);
        *p
    }
}
