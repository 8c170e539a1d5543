//! Sensor subsystem — individual drivers and the aggregating [`SensorSet`].
//!
//! The set owns every configured sensor driver and implements the
//! [`SensorBank`] port: independent per-sensor init, one combined
//! [`Sample`] per wake. A sensor that fails init is disabled for the rest
//! of the wake; a sensor whose read fails contributes nothing that cycle.

pub mod battery;
pub mod bme680;
pub mod soil_moisture;

use log::{info, warn};

use crate::app::ports::SensorBank;
use crate::store::{DataPoint, Sample};
use battery::BatterySensor;
use bme680::Bme680Sensor;
use soil_moisture::SoilMoistureSensor;

/// One slot per driver; `None` once the sensor is not configured or its
/// init failed.
pub struct SensorSet {
    soil: Option<SoilMoistureSensor>,
    battery: Option<BatterySensor>,
    bme680: Option<Bme680Sensor>,
}

impl SensorSet {
    /// The deployed probe complement: soil moisture plus battery monitor.
    pub fn new() -> Self {
        Self {
            soil: Some(SoilMoistureSensor::new()),
            battery: Some(BatterySensor::new()),
            bme680: None,
        }
    }

    /// Full complement including the BME680 environmental sensor.
    pub fn with_bme680() -> Self {
        Self {
            bme680: Some(Bme680Sensor::new()),
            ..Self::new()
        }
    }

    fn push(sample: &mut Sample, name: &'static str, value: f32) {
        // Capacity covers every configured sensor; overflow only happens if
        // a new driver is added without bumping MAX_DATA_POINTS.
        if sample.push(DataPoint { name, value }).is_err() {
            warn!("sample full, dropping data point '{}'", name);
        }
    }
}

impl SensorBank for SensorSet {
    fn init_all(&mut self) -> usize {
        let mut up = 0;

        // Analog sensors have no probe-able init; they come up with the ADC.
        if self.soil.is_some() {
            up += 1;
        }
        if self.battery.is_some() {
            up += 1;
        }

        if let Some(bme) = &mut self.bme680 {
            match bme.init() {
                Ok(()) => up += 1,
                Err(e) => {
                    warn!("BME680 init failed ({}), disabling for this wake", e);
                    self.bme680 = None;
                }
            }
        }

        info!("sensors: {} up", up);
        up
    }

    fn read_all(&mut self) -> Sample {
        let mut sample = Sample::new();

        if let Some(soil) = &mut self.soil {
            match soil.read() {
                Ok(r) => Self::push(&mut sample, "soil_moisture", r.percent),
                Err(e) => warn!("soil moisture read failed: {}", e),
            }
        }

        if let Some(battery) = &mut self.battery {
            match battery.read() {
                Ok(r) => {
                    Self::push(&mut sample, "battery_voltage", r.volts);
                    Self::push(&mut sample, "battery_percent", r.percent);
                }
                Err(e) => warn!("battery read failed: {}", e),
            }
        }

        if let Some(bme) = &mut self.bme680 {
            match bme.read() {
                Ok(r) => {
                    Self::push(&mut sample, "temperature", r.temp_c);
                    Self::push(&mut sample, "humidity", r.hum_pct);
                    Self::push(&mut sample, "pressure", r.press_hpa);
                }
                Err(e) => warn!("BME680 read failed: {}", e),
            }
        }

        sample
    }
}

impl Default for SensorSet {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(all(test, not(target_os = "espidf")))]
mod tests {
    use super::*;

    #[test]
    fn default_set_counts_analog_sensors() {
        let mut set = SensorSet::new();
        assert_eq!(set.init_all(), 2);
    }

    #[test]
    fn bme680_init_failure_disables_only_that_slot() {
        // Sim backend has no BME680 present unless injected.
        let mut set = SensorSet::with_bme680();
        assert_eq!(set.init_all(), 2);
    }

    // The sim ADC line is shared with the driver's own tests, which may
    // transiently inject a fault value; assert the pairing property rather
    // than a fixed sample shape.
    #[test]
    fn battery_points_come_in_pairs() {
        let mut set = SensorSet::new();
        set.init_all();
        battery::sim_set_battery_adc(2048);
        let sample = set.read_all();
        let volts = sample.iter().any(|p| p.name == "battery_voltage");
        let percent = sample.iter().any(|p| p.name == "battery_percent");
        assert_eq!(volts, percent);
    }
}
