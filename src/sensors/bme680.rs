//! BME680 environmental sensor driver (temperature, humidity, pressure).
//!
//! Register-level I²C driver: one forced-mode conversion per wake, no
//! continuous mode, no IIR filter history to warm up. Gas measurement is
//! left disabled — the heater draws tens of milliamps and the deployment
//! only charts temperature, humidity, and pressure.
//!
//! Compensation uses the floating-point formulas from the datasheet; the
//! raw-to-physical math is pure and kept independent of the bus so it can
//! be exercised on the host.
//!
//! ## Dual-target design
//!
//! On ESP-IDF: raw register access through the hw I²C facade.
//! On host/test: readings come from static atomics for injection.

use core::sync::atomic::{AtomicBool, AtomicU32, Ordering};

use crate::error::SensorError;
use crate::pins;
#[cfg(target_os = "espidf")]
use crate::retry::delay_ms;

// ── Host simulation backend ───────────────────────────────────

static SIM_BME_PRESENT: AtomicBool = AtomicBool::new(false);
static SIM_TEMP_C: AtomicU32 = AtomicU32::new(0);
static SIM_HUM_PCT: AtomicU32 = AtomicU32::new(0);
static SIM_PRESS_HPA: AtomicU32 = AtomicU32::new(0);

#[cfg(not(target_os = "espidf"))]
pub fn sim_set_bme680(temp_c: f32, hum_pct: f32, press_hpa: f32) {
    SIM_TEMP_C.store(temp_c.to_bits(), Ordering::Relaxed);
    SIM_HUM_PCT.store(hum_pct.to_bits(), Ordering::Relaxed);
    SIM_PRESS_HPA.store(press_hpa.to_bits(), Ordering::Relaxed);
    SIM_BME_PRESENT.store(true, Ordering::Relaxed);
}

// ── Register map ──────────────────────────────────────────────

#[cfg(target_os = "espidf")]
const REG_CHIP_ID: u8 = 0xD0;
#[cfg(target_os = "espidf")]
const CHIP_ID: u8 = 0x61;
#[cfg(target_os = "espidf")]
const REG_RESET: u8 = 0xE0;
#[cfg(target_os = "espidf")]
const RESET_CMD: u8 = 0xB6;
#[cfg(target_os = "espidf")]
const REG_CTRL_HUM: u8 = 0x72;
#[cfg(target_os = "espidf")]
const REG_CTRL_MEAS: u8 = 0x74;
#[cfg(target_os = "espidf")]
const REG_MEAS_STATUS: u8 = 0x1D;
#[cfg(target_os = "espidf")]
const REG_PRESS_MSB: u8 = 0x1F;
#[cfg(target_os = "espidf")]
const REG_COEFF1: u8 = 0x89;
#[cfg(target_os = "espidf")]
const REG_COEFF2: u8 = 0xE1;
const COEFF1_LEN: usize = 25;
const COEFF2_LEN: usize = 16;

/// osrs_t = 2x, osrs_p = 4x, mode = forced.
#[cfg(target_os = "espidf")]
const CTRL_MEAS_FORCED: u8 = 0b010_011_01;
/// osrs_h = 1x.
#[cfg(target_os = "espidf")]
const CTRL_HUM_1X: u8 = 0b001;

/// Worst-case conversion time at the configured oversampling.
#[cfg(target_os = "espidf")]
const CONVERSION_MS: u32 = 200;

// ── Calibration ───────────────────────────────────────────────

/// Factory trim coefficients, read once at init.
#[derive(Debug, Clone, Copy, Default)]
pub struct Calib {
    pub par_t1: u16,
    pub par_t2: i16,
    pub par_t3: i8,
    pub par_p1: u16,
    pub par_p2: i16,
    pub par_p3: i8,
    pub par_p4: i16,
    pub par_p5: i16,
    pub par_p6: i8,
    pub par_p7: i8,
    pub par_p8: i16,
    pub par_p9: i16,
    pub par_p10: u8,
    pub par_h1: u16,
    pub par_h2: u16,
    pub par_h3: i8,
    pub par_h4: i8,
    pub par_h5: i8,
    pub par_h6: u8,
    pub par_h7: i8,
}

impl Calib {
    /// Unpack the two coefficient blocks (0x89.. and 0xE1..) as laid out
    /// in the datasheet's memory map.
    fn parse(coeff: &[u8; COEFF1_LEN + COEFF2_LEN]) -> Self {
        let u16le = |lsb: usize| u16::from_le_bytes([coeff[lsb], coeff[lsb + 1]]);
        let i16le = |lsb: usize| i16::from_le_bytes([coeff[lsb], coeff[lsb + 1]]);
        Self {
            par_t2: i16le(1),
            par_t3: coeff[3] as i8,
            par_p1: u16le(5),
            par_p2: i16le(7),
            par_p3: coeff[9] as i8,
            par_p4: i16le(11),
            par_p5: i16le(13),
            par_p7: coeff[15] as i8,
            par_p6: coeff[16] as i8,
            par_p8: i16le(19),
            par_p9: i16le(21),
            par_p10: coeff[23],
            // H1/H2 share the nibble register at 0xE2.
            par_h2: (u16::from(coeff[25]) << 4) | (u16::from(coeff[26]) >> 4),
            par_h1: (u16::from(coeff[27]) << 4) | (u16::from(coeff[26]) & 0x0F),
            par_h3: coeff[28] as i8,
            par_h4: coeff[29] as i8,
            par_h5: coeff[30] as i8,
            par_h6: coeff[31],
            par_h7: coeff[32] as i8,
            par_t1: u16le(33),
        }
    }

    /// Temperature in °C plus the `t_fine` carrier used by the pressure
    /// and humidity formulas.
    fn compensate_temp(&self, temp_adc: u32) -> (f32, f32) {
        let adc = temp_adc as f32;
        let var1 = (adc / 16384.0 - f32::from(self.par_t1) / 1024.0) * f32::from(self.par_t2);
        let d = adc / 131072.0 - f32::from(self.par_t1) / 8192.0;
        let var2 = d * d * f32::from(self.par_t3) * 16.0;
        let t_fine = var1 + var2;
        (t_fine / 5120.0, t_fine)
    }

    /// Pressure in hPa.
    fn compensate_press(&self, press_adc: u32, t_fine: f32) -> f32 {
        let mut var1 = t_fine / 2.0 - 64000.0;
        let mut var2 = var1 * var1 * f32::from(self.par_p6) / 131072.0;
        var2 += var1 * f32::from(self.par_p5) * 2.0;
        var2 = var2 / 4.0 + f32::from(self.par_p4) * 65536.0;
        var1 = (f32::from(self.par_p3) * var1 * var1 / 16384.0 + f32::from(self.par_p2) * var1)
            / 524288.0;
        var1 = (1.0 + var1 / 32768.0) * f32::from(self.par_p1);
        if var1 == 0.0 {
            return 0.0;
        }
        let mut press = 1048576.0 - press_adc as f32;
        press = (press - var2 / 4096.0) * 6250.0 / var1;
        let var1 = f32::from(self.par_p9) * press * press / 2147483648.0;
        let var2 = press * f32::from(self.par_p8) / 32768.0;
        let p256 = press / 256.0;
        let var3 = p256 * p256 * p256 * f32::from(self.par_p10) / 131072.0;
        press += (var1 + var2 + var3 + f32::from(self.par_p7) * 128.0) / 16.0;
        press / 100.0
    }

    /// Relative humidity in %, clamped to 0–100.
    fn compensate_hum(&self, hum_adc: u16, temp_c: f32) -> f32 {
        let var1 = f32::from(hum_adc)
            - (f32::from(self.par_h1) * 16.0 + f32::from(self.par_h3) / 2.0 * temp_c);
        let var2 = var1
            * (f32::from(self.par_h2) / 262144.0
                * (1.0
                    + f32::from(self.par_h4) / 16384.0 * temp_c
                    + f32::from(self.par_h5) / 1048576.0 * temp_c * temp_c));
        let var3 = f32::from(self.par_h6) / 16384.0;
        let var4 = f32::from(self.par_h7) / 2097152.0;
        (var2 + (var3 + var4 * temp_c) * var2 * var2).clamp(0.0, 100.0)
    }
}

// ── Driver ────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy)]
pub struct Bme680Reading {
    pub temp_c: f32,
    pub hum_pct: f32,
    pub press_hpa: f32,
}

pub struct Bme680Sensor {
    addr: u8,
    calib: Calib,
}

impl Bme680Sensor {
    pub fn new() -> Self {
        Self {
            addr: pins::BME680_I2C_ADDR,
            calib: Calib::default(),
        }
    }

    /// Probe the chip, soft-reset it, and pull the factory trim.
    #[cfg(target_os = "espidf")]
    pub fn init(&mut self) -> Result<(), SensorError> {
        use crate::drivers::hw;

        let mut id = [0u8; 1];
        if !hw::i2c_read_regs(self.addr, REG_CHIP_ID, &mut id) {
            return Err(SensorError::BusError);
        }
        if id[0] != CHIP_ID {
            return Err(SensorError::InitFailed);
        }

        if !hw::i2c_write_reg(self.addr, REG_RESET, RESET_CMD) {
            return Err(SensorError::BusError);
        }
        delay_ms(10);

        let mut coeff = [0u8; COEFF1_LEN + COEFF2_LEN];
        let (block1, block2) = coeff.split_at_mut(COEFF1_LEN);
        if !hw::i2c_read_regs(self.addr, REG_COEFF1, block1)
            || !hw::i2c_read_regs(self.addr, REG_COEFF2, block2)
        {
            return Err(SensorError::BusError);
        }
        self.calib = Calib::parse(&coeff);
        Ok(())
    }

    #[cfg(not(target_os = "espidf"))]
    pub fn init(&mut self) -> Result<(), SensorError> {
        if SIM_BME_PRESENT.load(Ordering::Relaxed) {
            Ok(())
        } else {
            Err(SensorError::InitFailed)
        }
    }

    /// One forced-mode conversion: trigger, wait, read, compensate.
    #[cfg(target_os = "espidf")]
    pub fn read(&mut self) -> Result<Bme680Reading, SensorError> {
        use crate::drivers::hw;

        if !hw::i2c_write_reg(self.addr, REG_CTRL_HUM, CTRL_HUM_1X)
            || !hw::i2c_write_reg(self.addr, REG_CTRL_MEAS, CTRL_MEAS_FORCED)
        {
            return Err(SensorError::BusError);
        }
        delay_ms(CONVERSION_MS);

        let mut status = [0u8; 1];
        if !hw::i2c_read_regs(self.addr, REG_MEAS_STATUS, &mut status) {
            return Err(SensorError::BusError);
        }
        // new_data_0 flag; clear means the conversion never completed.
        if status[0] & 0x80 == 0 {
            return Err(SensorError::InitFailed);
        }

        // press[0..3], temp[3..6], hum[6..8] as one burst.
        let mut data = [0u8; 8];
        if !hw::i2c_read_regs(self.addr, REG_PRESS_MSB, &mut data) {
            return Err(SensorError::BusError);
        }
        let press_adc = (u32::from(data[0]) << 12)
            | (u32::from(data[1]) << 4)
            | (u32::from(data[2]) >> 4);
        let temp_adc = (u32::from(data[3]) << 12)
            | (u32::from(data[4]) << 4)
            | (u32::from(data[5]) >> 4);
        let hum_adc = (u16::from(data[6]) << 8) | u16::from(data[7]);

        let (temp_c, t_fine) = self.calib.compensate_temp(temp_adc);
        let reading = Bme680Reading {
            temp_c,
            hum_pct: self.calib.compensate_hum(hum_adc, temp_c),
            press_hpa: self.calib.compensate_press(press_adc, t_fine),
        };
        if !(-45.0..=90.0).contains(&reading.temp_c) {
            return Err(SensorError::OutOfRange);
        }
        Ok(reading)
    }

    #[cfg(not(target_os = "espidf"))]
    pub fn read(&mut self) -> Result<Bme680Reading, SensorError> {
        if !SIM_BME_PRESENT.load(Ordering::Relaxed) {
            return Err(SensorError::InitFailed);
        }
        Ok(Bme680Reading {
            temp_c: f32::from_bits(SIM_TEMP_C.load(Ordering::Relaxed)),
            hum_pct: f32::from_bits(SIM_HUM_PCT.load(Ordering::Relaxed)),
            press_hpa: f32::from_bits(SIM_PRESS_HPA.load(Ordering::Relaxed)),
        })
    }
}

impl Default for Bme680Sensor {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Trim values captured from a real sensor; the compensated outputs
    // below are sanity ranges, not golden vectors.
    fn calib() -> Calib {
        Calib {
            par_t1: 26126,
            par_t2: 26253,
            par_t3: 3,
            par_p1: 36673,
            par_p2: -10515,
            par_p3: 88,
            par_p4: 7310,
            par_p5: -104,
            par_p6: 30,
            par_p7: 47,
            par_p8: -3688,
            par_p9: -2344,
            par_p10: 30,
            par_h1: 674,
            par_h2: 1021,
            par_h3: 0,
            par_h4: 45,
            par_h5: 20,
            par_h6: 120,
            par_h7: -100,
        }
    }

    #[test]
    fn room_temperature_compensates_plausibly() {
        let (temp, t_fine) = calib().compensate_temp(501_000);
        assert!(temp > 20.0 && temp < 30.0, "temp = {}", temp);
        assert!((t_fine / 5120.0 - temp).abs() < f32::EPSILON);
    }

    #[test]
    fn sea_level_pressure_compensates_plausibly() {
        let c = calib();
        let (_, t_fine) = c.compensate_temp(501_000);
        let hpa = c.compensate_press(345_000, t_fine);
        assert!(hpa > 950.0 && hpa < 1050.0, "press = {}", hpa);
    }

    #[test]
    fn indoor_humidity_compensates_plausibly() {
        let c = calib();
        let (temp, _) = c.compensate_temp(501_000);
        let hum = c.compensate_hum(21_000, temp);
        assert!(hum > 30.0 && hum < 80.0, "hum = {}", hum);
    }

    #[test]
    fn humidity_clamps_to_percent_range() {
        let c = calib();
        assert_eq!(c.compensate_hum(0, 25.0), 0.0);
        assert_eq!(c.compensate_hum(u16::MAX, 25.0), 100.0);
    }

    #[test]
    fn coefficient_blocks_unpack_nibble_registers() {
        let mut raw = [0u8; COEFF1_LEN + COEFF2_LEN];
        raw[25] = 0x3F; // par_h2 msb
        raw[26] = 0xAB; // shared nibble register
        raw[27] = 0x2A; // par_h1 msb
        let c = Calib::parse(&raw);
        assert_eq!(c.par_h2, (0x3F << 4) | 0x0A);
        assert_eq!(c.par_h1, (0x2A << 4) | 0x0B);
    }
}
