//! MQTT client adapter.
//!
//! Implements [`BrokerPort`].  Publishes are QoS 0 and never retained.
//!
//! ## cfg gating
//!
//! - **`target_os = "espidf"`**: `esp_idf_svc::mqtt::client::EspMqttClient`.
//!   Each connect attempt builds a fresh client and waits for the
//!   `Connected` event up to the socket timeout.  Session state is tracked
//!   through atomics shared with the client's event callback.
//! - **all other targets**: simulation stub that accepts connects and counts
//!   publishes.

use log::{info, warn};

use crate::app::ports::BrokerPort;
use crate::config::BridgeConfig;
use crate::error::PublishError;

/// Status code reported when the `Connected` event never arrived.
pub const CONNECT_TIMEOUT_RC: i32 = -4;

// ───────────────────────────────────────────────────────────────
// ESP-IDF
// ───────────────────────────────────────────────────────────────

#[cfg(target_os = "espidf")]
mod esp {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicBool, AtomicI32, Ordering};
    use std::time::Duration;

    use esp_idf_svc::hal::delay::FreeRtos;
    use esp_idf_svc::mqtt::client::{EventPayload, EspMqttClient, MqttClientConfiguration, QoS};

    use super::*;

    /// Step between connection-flag checks while waiting for the broker.
    const CONNECT_POLL_MS: u32 = 100;

    pub struct MqttAdapter {
        client: Option<EspMqttClient<'static>>,
        url: heapless::String<96>,
        client_id: heapless::String<32>,
        username: heapless::String<32>,
        password: heapless::String<64>,
        keep_alive_secs: u16,
        socket_timeout_secs: u16,
        connected: Arc<AtomicBool>,
        last_error: Arc<AtomicI32>,
    }

    impl MqttAdapter {
        pub fn new(config: &BridgeConfig) -> Self {
            Self {
                client: None,
                url: config.broker_url(),
                client_id: config.mqtt_client_id.clone(),
                username: config.mqtt_username.clone(),
                password: config.mqtt_password.clone(),
                keep_alive_secs: config.keep_alive_secs,
                socket_timeout_secs: config.socket_timeout_secs,
                connected: Arc::new(AtomicBool::new(false)),
                last_error: Arc::new(AtomicI32::new(0)),
            }
        }

        fn build_client(&self) -> Result<EspMqttClient<'static>, i32> {
            let conf = MqttClientConfiguration {
                client_id: Some(self.client_id.as_str()),
                username: (!self.username.is_empty()).then_some(self.username.as_str()),
                password: (!self.password.is_empty()).then_some(self.password.as_str()),
                keep_alive_interval: Some(Duration::from_secs(u64::from(self.keep_alive_secs))),
                network_timeout: Duration::from_secs(u64::from(self.socket_timeout_secs)),
                ..Default::default()
            };

            let connected = Arc::clone(&self.connected);
            let last_error = Arc::clone(&self.last_error);
            EspMqttClient::new_cb(self.url.as_str(), &conf, move |event| match event.payload() {
                EventPayload::Connected(_) => connected.store(true, Ordering::Release),
                EventPayload::Disconnected => connected.store(false, Ordering::Release),
                EventPayload::Error(e) => last_error.store(e.code(), Ordering::Relaxed),
                _ => {}
            })
            .map_err(|e| e.code())
        }
    }

    impl BrokerPort for MqttAdapter {
        fn is_connected(&self) -> bool {
            self.client.is_some() && self.connected.load(Ordering::Acquire)
        }

        fn connect(&mut self) -> Result<(), i32> {
            // Drop any half-open session before starting over.
            self.client = None;
            self.connected.store(false, Ordering::Release);
            self.last_error.store(0, Ordering::Relaxed);

            info!("MQTT: connecting to {} as '{}'", self.url, self.client_id);
            self.client = Some(self.build_client()?);

            let mut waited_ms = 0u32;
            let budget_ms = u32::from(self.socket_timeout_secs) * 1000;
            while waited_ms < budget_ms {
                if self.connected.load(Ordering::Acquire) {
                    return Ok(());
                }
                FreeRtos::delay_ms(CONNECT_POLL_MS);
                waited_ms += CONNECT_POLL_MS;
            }

            self.client = None;
            match self.last_error.load(Ordering::Relaxed) {
                0 => Err(CONNECT_TIMEOUT_RC),
                code => Err(code),
            }
        }

        fn publish(&mut self, topic: &str, payload: &[u8]) -> Result<(), PublishError> {
            if !self.connected.load(Ordering::Acquire) {
                return Err(PublishError::Disconnected);
            }
            let client = self.client.as_mut().ok_or(PublishError::Disconnected)?;
            client
                .publish(topic, QoS::AtMostOnce, false, payload)
                .map(|_| ())
                .map_err(|e| PublishError::Rejected(e.code()))
        }

        fn poll(&mut self) {
            // The ESP-IDF client services keep-alive on its own task.
            let code = self.last_error.swap(0, Ordering::Relaxed);
            if code != 0 {
                warn!("MQTT: client reported error rc={}", code);
            }
        }
    }
}

#[cfg(target_os = "espidf")]
pub use esp::MqttAdapter;

// ───────────────────────────────────────────────────────────────
// Host simulation
// ───────────────────────────────────────────────────────────────

#[cfg(not(target_os = "espidf"))]
pub struct MqttAdapter {
    url: heapless::String<96>,
    connected: bool,
    reachable: bool,
    published: u32,
}

#[cfg(not(target_os = "espidf"))]
impl MqttAdapter {
    pub fn new(config: &BridgeConfig) -> Self {
        Self {
            url: config.broker_url(),
            connected: false,
            reachable: true,
            published: 0,
        }
    }

    /// Simulate the broker going away (or coming back).
    pub fn set_reachable(&mut self, reachable: bool) {
        self.reachable = reachable;
        if !reachable {
            self.connected = false;
        }
    }

    pub fn published(&self) -> u32 {
        self.published
    }
}

#[cfg(not(target_os = "espidf"))]
impl BrokerPort for MqttAdapter {
    fn is_connected(&self) -> bool {
        self.connected
    }

    fn connect(&mut self) -> Result<(), i32> {
        if !self.reachable {
            warn!("MQTT(sim): {} unreachable", self.url);
            return Err(CONNECT_TIMEOUT_RC);
        }
        info!("MQTT(sim): connected to {}", self.url);
        self.connected = true;
        Ok(())
    }

    fn publish(&mut self, topic: &str, payload: &[u8]) -> Result<(), PublishError> {
        if !self.connected {
            return Err(PublishError::Disconnected);
        }
        info!("MQTT(sim): {} <- {}", topic, String::from_utf8_lossy(payload));
        self.published += 1;
        Ok(())
    }

    fn poll(&mut self) {}
}
