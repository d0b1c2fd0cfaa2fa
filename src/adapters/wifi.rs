//! WiFi station-mode adapter.
//!
//! Implements [`WirelessPort`].  The adapter only starts association and
//! reports status; polling, retry budgets and the restart decision live in
//! the connectivity supervisor.
//!
//! ## cfg gating
//!
//! - **`target_os = "espidf"`**: real ESP-IDF WiFi driver calls via `esp_idf_svc::wifi`.
//! - **all other targets**: simulation stubs for host-side runs.

use core::net::Ipv4Addr;

use log::{info, warn};

use crate::app::ports::WirelessPort;
use crate::config::BridgeConfig;
use crate::error::WirelessError;

// ───────────────────────────────────────────────────────────────
// ESP-IDF
// ───────────────────────────────────────────────────────────────

#[cfg(target_os = "espidf")]
pub struct WifiAdapter {
    wifi: esp_idf_svc::wifi::EspWifi<'static>,
    ssid: heapless::String<32>,
    password: heapless::String<64>,
    started: bool,
}

#[cfg(target_os = "espidf")]
impl WifiAdapter {
    pub fn new(wifi: esp_idf_svc::wifi::EspWifi<'static>, config: &BridgeConfig) -> Self {
        Self {
            wifi,
            ssid: config.wifi_ssid.clone(),
            password: config.wifi_password.clone(),
            started: false,
        }
    }

    fn configure(&mut self) -> Result<(), WirelessError> {
        use esp_idf_svc::wifi::{AuthMethod, ClientConfiguration, Configuration};

        let auth_method = if self.password.is_empty() {
            AuthMethod::None
        } else {
            AuthMethod::WPA2Personal
        };
        let client = ClientConfiguration {
            ssid: self.ssid.as_str().try_into().map_err(|_| WirelessError::ConfigRejected)?,
            password: self
                .password
                .as_str()
                .try_into()
                .map_err(|_| WirelessError::ConfigRejected)?,
            auth_method,
            ..Default::default()
        };
        self.wifi
            .set_configuration(&Configuration::Client(client))
            .map_err(|_| WirelessError::ConfigRejected)
    }
}

#[cfg(target_os = "espidf")]
impl WirelessPort for WifiAdapter {
    fn is_associated(&self) -> bool {
        self.wifi.is_connected().unwrap_or(false) && self.wifi.is_up().unwrap_or(false)
    }

    fn begin_association(&mut self) -> Result<(), WirelessError> {
        if !self.started {
            self.configure()?;
            self.wifi.start().map_err(|e| WirelessError::StartFailed(e.code()))?;
            self.started = true;
        }
        info!("WiFi: associating with '{}'", self.ssid);
        self.wifi.connect().map_err(|e| WirelessError::StartFailed(e.code()))
    }

    fn local_ip(&self) -> Option<Ipv4Addr> {
        match self.wifi.sta_netif().get_ip_info() {
            Ok(info) => Some(info.ip),
            Err(e) => {
                warn!("WiFi: IP query failed: {}", e);
                None
            }
        }
    }
}

// ───────────────────────────────────────────────────────────────
// Host simulation
// ───────────────────────────────────────────────────────────────

/// Polls before a simulated association completes.
#[cfg(not(target_os = "espidf"))]
const SIM_ASSOCIATION_POLLS: u32 = 3;

#[cfg(not(target_os = "espidf"))]
pub struct WifiAdapter {
    ssid: heapless::String<32>,
    associating: bool,
    reachable: bool,
    polls: core::cell::Cell<u32>,
}

#[cfg(not(target_os = "espidf"))]
impl WifiAdapter {
    pub fn new(config: &BridgeConfig) -> Self {
        Self {
            ssid: config.wifi_ssid.clone(),
            associating: false,
            reachable: true,
            polls: core::cell::Cell::new(0),
        }
    }

    /// Simulate the access point going away (or coming back).
    pub fn set_reachable(&mut self, reachable: bool) {
        self.reachable = reachable;
        if !reachable && self.associating {
            warn!("WiFi(sim): link dropped");
            self.associating = false;
        }
    }
}

#[cfg(not(target_os = "espidf"))]
impl WirelessPort for WifiAdapter {
    fn is_associated(&self) -> bool {
        if !self.associating {
            return false;
        }
        let polls = self.polls.get().saturating_add(1);
        self.polls.set(polls);
        polls >= SIM_ASSOCIATION_POLLS
    }

    fn begin_association(&mut self) -> Result<(), WirelessError> {
        if !self.reachable {
            info!("WiFi(sim): '{}' not reachable", self.ssid);
            return Ok(());
        }
        info!("WiFi(sim): associating with '{}'", self.ssid);
        self.associating = true;
        self.polls.set(0);
        Ok(())
    }

    fn local_ip(&self) -> Option<Ipv4Addr> {
        (self.associating && self.polls.get() >= SIM_ASSOCIATION_POLLS)
            .then_some(Ipv4Addr::new(192, 168, 4, 2))
    }
}
