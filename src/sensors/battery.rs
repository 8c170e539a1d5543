//! Battery pack voltage monitor.
//!
//! Three AA cells behind a 2:1 resistor divider into an input-only ADC
//! pin. The raw count converts to pack volts through the divider ratio,
//! and to a rough percentage against the usable AA range. The percentage
//! is a field-maintenance hint, not a coulomb counter.
//!
//! ## Dual-target design
//!
//! On ESP-IDF: reads ADC1_CH7 via the oneshot API (initialised by hw).
//! On host/test: reads from a static `AtomicU16` for injection.

use core::sync::atomic::{AtomicU16, Ordering};

use crate::error::SensorError;
use crate::pins;

static SIM_BATTERY_ADC: AtomicU16 = AtomicU16::new(0);

#[cfg(not(target_os = "espidf"))]
pub fn sim_set_battery_adc(raw: u16) {
    SIM_BATTERY_ADC.store(raw, Ordering::Relaxed);
}

/// Full-scale ADC count at 12-bit resolution.
const ADC_FULL_SCALE: f32 = 4095.0;
/// Full-scale input voltage at 12 dB attenuation.
const ADC_FULL_SCALE_VOLTS: f32 = 3.3;

/// Usable voltage range of a 3×AA alkaline pack.
const PACK_EMPTY_VOLTS: f32 = 3.0;
const PACK_FULL_VOLTS: f32 = 4.5;

#[derive(Debug, Clone, Copy)]
pub struct BatteryReading {
    pub raw: u16,
    pub volts: f32,
    pub percent: f32,
}

pub struct BatterySensor {
    divider: f32,
}

impl BatterySensor {
    pub fn new() -> Self {
        Self {
            divider: pins::BATTERY_DIVIDER,
        }
    }

    pub fn read(&mut self) -> Result<BatteryReading, SensorError> {
        let raw = self.read_adc();
        // The sense line is hard-wired; a floored count means the ADC
        // read itself failed.
        if raw == 0 {
            return Err(SensorError::AdcReadFailed);
        }
        let volts = self.raw_to_volts(raw);
        Ok(BatteryReading {
            raw,
            volts,
            percent: Self::volts_to_percent(volts),
        })
    }

    #[cfg(target_os = "espidf")]
    fn read_adc(&self) -> u16 {
        crate::drivers::hw::adc1_read(pins::BATTERY_ADC_CHANNEL)
    }

    #[cfg(not(target_os = "espidf"))]
    fn read_adc(&self) -> u16 {
        SIM_BATTERY_ADC.load(Ordering::Relaxed)
    }

    fn raw_to_volts(&self, raw: u16) -> f32 {
        f32::from(raw) / ADC_FULL_SCALE * ADC_FULL_SCALE_VOLTS * self.divider
    }

    fn volts_to_percent(volts: f32) -> f32 {
        ((volts - PACK_EMPTY_VOLTS) / (PACK_FULL_VOLTS - PACK_EMPTY_VOLTS) * 100.0)
            .clamp(0.0, 100.0)
    }
}

impl Default for BatterySensor {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn divider_doubles_pin_voltage() {
        let sensor = BatterySensor::new();
        // Mid-scale count reads 1.65 V at the pin, 3.3 V at the pack.
        let volts = sensor.raw_to_volts(2048);
        assert!((volts - 3.301).abs() < 0.01);
    }

    #[test]
    fn percent_clamps_to_pack_range() {
        assert_eq!(BatterySensor::volts_to_percent(2.5), 0.0);
        assert_eq!(BatterySensor::volts_to_percent(5.0), 100.0);
        let mid = BatterySensor::volts_to_percent(3.75);
        assert!((mid - 50.0).abs() < 0.1);
    }

    #[test]
    fn injected_raw_drives_read() {
        let mut sensor = BatterySensor::new();

        sim_set_battery_adc(0);
        assert!(matches!(sensor.read(), Err(SensorError::AdcReadFailed)));

        sim_set_battery_adc(2048);
        let reading = sensor.read().unwrap();
        assert_eq!(reading.raw, 2048);
        assert!(reading.volts > 3.0 && reading.volts < 3.6);
    }
}
