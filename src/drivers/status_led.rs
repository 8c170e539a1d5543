//! On-module status LED.
//!
//! The node sleeps almost all the time, so the LED has exactly two jobs:
//! a short blip right after wake (field debugging aid), and the terminal
//! fast-blink pattern that signals an unrecoverable fault to whoever walks
//! up to the box.
//!
//! ## Dual-target design
//!
//! On ESP-IDF: drives the LED GPIO via the hw facade.
//! On host/test: gpio_write is a no-op; `error_blink_forever` still loops.

use crate::drivers::hw;
use crate::pins;
use crate::retry::delay_ms;

/// Short single blink after wake.
pub fn boot_blip() {
    hw::gpio_write(pins::LED_GPIO, true);
    delay_ms(50);
    hw::gpio_write(pins::LED_GPIO, false);
}

/// Terminal fault indication. Never returns — the node is in a state where
/// sleeping and retrying would drain the battery without ever succeeding,
/// so it blinks until someone power-cycles or reflashes it.
pub fn error_blink_forever() -> ! {
    loop {
        hw::gpio_write(pins::LED_GPIO, true);
        delay_ms(150);
        hw::gpio_write(pins::LED_GPIO, false);
        delay_ms(150);
    }
}
