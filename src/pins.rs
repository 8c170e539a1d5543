//! GPIO / peripheral pin assignments for the TerraNode sensor board.
//!
//! Single source of truth — every driver references this module rather than
//! hard-coding pin numbers.  Change a pin here and it propagates everywhere.

// ---------------------------------------------------------------------------
// Soil moisture probe (capacitive, analog output)
// ---------------------------------------------------------------------------

/// Probe analog output. ADC1 channel 4 (GPIO 32 on ESP32).
pub const SOIL_ADC_GPIO: i32 = 32;
pub const SOIL_ADC_CHANNEL: u32 = 4;
/// Digital output powering the probe. Driven HIGH only for the duration of
/// a read — continuous excitation corrodes the probe and wastes battery.
pub const SOIL_POWER_GPIO: i32 = 27;

// ---------------------------------------------------------------------------
// Battery voltage monitor
// ---------------------------------------------------------------------------

/// Pack voltage through a 100k/100k divider. ADC1 channel 7 (GPIO 35,
/// input-only pin).
pub const BATTERY_ADC_GPIO: i32 = 35;
pub const BATTERY_ADC_CHANNEL: u32 = 7;
/// Ratio of the external resistor divider on the battery sense line.
pub const BATTERY_DIVIDER: f32 = 2.0;

// ---------------------------------------------------------------------------
// I²C bus (BME680 environmental sensor)
// ---------------------------------------------------------------------------

pub const I2C_SDA_GPIO: i32 = 21;
pub const I2C_SCL_GPIO: i32 = 22;
pub const I2C_FREQ_HZ: u32 = 100_000;

/// BME680 with SDO tied high.
pub const BME680_I2C_ADDR: u8 = 0x77;

// ---------------------------------------------------------------------------
// Status LED (on-module blue LED)
// ---------------------------------------------------------------------------

pub const LED_GPIO: i32 = 2;
