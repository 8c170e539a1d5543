//! TerraNode firmware — main entry point.
//!
//! One wake, one cycle, back to sleep:
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │                   Adapters (outer ring)                  │
//! │                                                          │
//! │  SensorSet        EspNetwork          SystemClock        │
//! │  (SensorBank)     (NetworkPort)       (WallClock)        │
//! │                                                          │
//! │  ─────────────── Port Trait Boundary ───────────────     │
//! │                                                          │
//! │  ┌────────────────────────────────────────────────┐      │
//! │  │        run_wake_cycle (pure logic)             │      │
//! │  │  DutyCycleState · ReadingStore (RTC memory)    │      │
//! │  └────────────────────────────────────────────────┘      │
//! │                                                          │
//! │  deep sleep timer · status LED fault indication          │
//! └──────────────────────────────────────────────────────────┘
//! ```
#![deny(unused_must_use)]

use anyhow::Result;
use log::{error, info};

use esp_idf_hal::peripherals::Peripherals;
use esp_idf_svc::eventloop::EspSystemEventLoop;
use esp_idf_svc::nvs::EspDefaultNvsPartition;

use terranode::adapters::clock::SystemClock;
use terranode::adapters::network::{Credentials, EspNetwork};
use terranode::adapters::rtc_state;
use terranode::app::cycle::run_wake_cycle;
use terranode::config::NodeConfig;
use terranode::drivers::{hw, status_led};
use terranode::sensors::SensorSet;

// Deployment identity, injected at build time.
const WIFI_SSID: &str = env!("WIFI_SSID");
const WIFI_PASSWORD: &str = env!("WIFI_PASSWORD");
const API_ENDPOINT: &str = env!("API_ENDPOINT");
const API_TOKEN: &str = env!("API_TOKEN");
const DEVICE_ID: &str = env!("DEVICE_ID");

fn main() -> Result<()> {
    // ── 1. ESP-IDF bootstrap ──────────────────────────────────
    esp_idf_svc::sys::link_patches();
    esp_idf_logger::init()?;

    let wake = rtc_state::bump_boot_count();
    info!(
        "TerraNode v{} — wake #{}",
        env!("CARGO_PKG_VERSION"),
        wake
    );

    // ── 2. Peripherals ────────────────────────────────────────
    if let Err(e) = hw::init_peripherals() {
        // Without working peripherals there is nothing to retry.
        error!("peripheral init failed: {}", e);
        status_led::error_blink_forever();
    }
    status_led::boot_blip();

    // ── 3. Adapter wiring ─────────────────────────────────────
    let cfg = NodeConfig::default();

    let peripherals = Peripherals::take()?;
    let sysloop = EspSystemEventLoop::take()?;
    let nvs = EspDefaultNvsPartition::take()?;
    let mut net = EspNetwork::new(
        peripherals.modem,
        sysloop,
        nvs,
        Credentials {
            ssid: WIFI_SSID,
            password: WIFI_PASSWORD,
            endpoint: API_ENDPOINT,
            token: API_TOKEN,
            device_id: DEVICE_ID,
        },
        &cfg,
    )?;
    let mut clock = SystemClock::new();
    let mut sensors = SensorSet::new();

    // SAFETY: once per wake, single-threaded, before anything else touches
    // the RTC regions.
    let (state, store) = unsafe { rtc_state::take() };

    // ── 4. One cycle, then sleep ──────────────────────────────
    match run_wake_cycle(&cfg, state, store, &mut sensors, &mut net, &mut clock) {
        Ok(report) => {
            info!("wake complete: {:?}", report);
            deep_sleep(cfg.sleep_secs)
        }
        Err(e) => {
            error!("unrecoverable fault: {}", e);
            status_led::error_blink_forever()
        }
    }
}

fn deep_sleep(secs: u32) -> ! {
    info!("deep sleep for {} s", secs);
    // SAFETY: arming the wake timer and entering deep sleep are plain
    // ESP-IDF calls; deep sleep never returns.
    unsafe {
        esp_idf_svc::sys::esp_sleep_enable_timer_wakeup(u64::from(secs) * 1_000_000);
        esp_idf_svc::sys::esp_deep_sleep_start();
    }
    unreachable!("esp_deep_sleep_start returned");
}
