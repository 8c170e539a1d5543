//! ESP-IDF network adapter: WiFi STA association, SNTP clock acquisition,
//! and the HTTPS batch upload.
//!
//! Implements [`NetworkPort`]. Every operation is bounded — association
//! polls a fixed number of times, SNTP sync polls a fixed number of times,
//! and the upload retries through the shared retry helper — so the core
//! never blocks on the radio indefinitely.
//!
//! TLS trust comes from the ESP-IDF certificate bundle
//! (`esp_crt_bundle_attach`), so no server certificate is baked into the
//! firmware.

use std::time::{SystemTime, UNIX_EPOCH};

use esp_idf_hal::modem::Modem;
use esp_idf_svc::eventloop::EspSystemEventLoop;
use esp_idf_svc::http::client::{Configuration as HttpConfiguration, EspHttpConnection};
use esp_idf_svc::http::Method;
use esp_idf_svc::io::Write;
use esp_idf_svc::nvs::EspDefaultNvsPartition;
use esp_idf_svc::sntp::{EspSntp, SyncStatus};
use esp_idf_svc::sys::{esp_crt_bundle_attach, esp_wifi_sta_get_ap_info, wifi_ap_record_t, ESP_OK};
use esp_idf_svc::wifi::{AuthMethod, ClientConfiguration, Configuration, EspWifi};
use log::{info, warn};

use crate::app::ports::NetworkPort;
use crate::config::NodeConfig;
use crate::error::NetworkError;
use crate::payload::build_payload;
use crate::retry::{delay_ms, retry, RetryPolicy};
use crate::store::StoredReading;

/// Compile-time deployment identity, injected through the environment at
/// build time so no credentials live in the source tree.
pub struct Credentials {
    pub ssid: &'static str,
    pub password: &'static str,
    pub endpoint: &'static str,
    pub token: &'static str,
    pub device_id: &'static str,
}

pub struct EspNetwork<'a> {
    wifi: EspWifi<'a>,
    creds: Credentials,
    assoc_policy: RetryPolicy,
    sync_policy: RetryPolicy,
    send_policy: RetryPolicy,
    connected: bool,
}

impl EspNetwork<'_> {
    pub fn new(
        modem: Modem,
        sysloop: EspSystemEventLoop,
        nvs: EspDefaultNvsPartition,
        creds: Credentials,
        cfg: &NodeConfig,
    ) -> anyhow::Result<Self> {
        let wifi = EspWifi::new(modem, sysloop, Some(nvs))?;
        Ok(Self {
            wifi,
            creds,
            assoc_policy: RetryPolicy {
                max_attempts: cfg.wifi_max_attempts,
                delay_ms: cfg.wifi_poll_delay_ms,
            },
            sync_policy: cfg.sync_policy(),
            send_policy: cfg.send_policy(),
            connected: false,
        })
    }

    /// One POST of the whole batch. The connection is rebuilt per attempt —
    /// a failed TLS session is not worth resuming.
    fn post(&self, payload: &str) -> Result<(), NetworkError> {
        let config = HttpConfiguration {
            crt_bundle_attach: Some(esp_crt_bundle_attach),
            ..Default::default()
        };
        let mut conn = EspHttpConnection::new(&config).map_err(|e| {
            warn!("http client init failed: {}", e);
            NetworkError::Transport
        })?;

        let auth = format!("Bearer {}", self.creds.token);
        let content_length = payload.len().to_string();
        let headers = [
            ("Authorization", auth.as_str()),
            ("Content-Type", "application/json"),
            ("Content-Length", content_length.as_str()),
        ];

        conn.initiate_request(Method::Post, self.creds.endpoint, &headers)
            .map_err(|_| NetworkError::Transport)?;
        conn.write_all(payload.as_bytes())
            .map_err(|_| NetworkError::Transport)?;
        conn.initiate_response()
            .map_err(|_| NetworkError::Transport)?;

        let status = conn.status();
        if (200..300).contains(&status) {
            Ok(())
        } else {
            Err(NetworkError::HttpStatus(status))
        }
    }
}

impl NetworkPort for EspNetwork<'_> {
    fn connect(&mut self) -> Result<(), NetworkError> {
        if self.connected && self.wifi.is_up().unwrap_or(false) {
            return Ok(());
        }

        let client_cfg = ClientConfiguration {
            ssid: self
                .creds
                .ssid
                .try_into()
                .map_err(|_| NetworkError::AssociationFailed)?,
            password: self
                .creds
                .password
                .try_into()
                .map_err(|_| NetworkError::AssociationFailed)?,
            auth_method: AuthMethod::WPA2Personal,
            ..Default::default()
        };
        self.wifi
            .set_configuration(&Configuration::Client(client_cfg))
            .map_err(|_| NetworkError::Transport)?;
        self.wifi.start().map_err(|_| NetworkError::Transport)?;
        self.wifi.connect().map_err(|_| NetworkError::Transport)?;

        // Association + DHCP poll, bounded by the configured budget.
        for _ in 0..self.assoc_policy.max_attempts {
            if self.wifi.is_up().unwrap_or(false) {
                self.connected = true;
                info!("wifi: up (RSSI={:?})", self.rssi());
                return Ok(());
            }
            delay_ms(self.assoc_policy.delay_ms);
        }

        warn!(
            "wifi: no address after {} polls",
            self.assoc_policy.max_attempts
        );
        let _ = self.wifi.stop();
        Err(NetworkError::AssociationFailed)
    }

    fn disconnect(&mut self) {
        let _ = self.wifi.disconnect();
        let _ = self.wifi.stop();
        self.connected = false;
        info!("wifi: down");
    }

    fn is_connected(&self) -> bool {
        self.connected
    }

    fn rssi(&self) -> Option<i8> {
        if !self.connected {
            return None;
        }
        let mut ap: wifi_ap_record_t = Default::default();
        // SAFETY: esp_wifi_sta_get_ap_info fills the record for the current
        // association; the driver was started by connect().
        if unsafe { esp_wifi_sta_get_ap_info(&mut ap) } == ESP_OK {
            Some(ap.rssi)
        } else {
            None
        }
    }

    fn sync_clock(&mut self) -> Result<i64, NetworkError> {
        if !self.connected {
            return Err(NetworkError::SyncTimeout);
        }

        let sntp = EspSntp::new_default().map_err(|e| {
            warn!("sntp init failed: {}", e);
            NetworkError::Transport
        })?;

        for _ in 0..self.sync_policy.max_attempts.max(1) {
            if matches!(sntp.get_sync_status(), SyncStatus::Completed) {
                let epoch = SystemTime::now()
                    .duration_since(UNIX_EPOCH)
                    .map_err(|_| NetworkError::SyncTimeout)?
                    .as_secs() as i64;
                info!("sntp: synced, epoch={}", epoch);
                return Ok(epoch);
            }
            delay_ms(self.sync_policy.delay_ms);
        }
        Err(NetworkError::SyncTimeout)
    }

    fn send(&mut self, readings: &[StoredReading]) -> Result<(), NetworkError> {
        let payload = build_payload(readings, self.creds.device_id).map_err(|e| {
            warn!("payload serialisation failed: {}", e);
            NetworkError::Transport
        })?;

        retry(self.send_policy, "batch upload", || self.post(&payload))
    }
}
