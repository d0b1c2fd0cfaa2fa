//! Bridge configuration parameters
//!
//! Everything is fixed at build time.  Defaults mirror the field-tested
//! values; individual identity fields can be overridden with `BRIDGE_*`
//! environment variables at compile time, and a whole (possibly partial)
//! JSON document can be supplied through `BRIDGE_CONFIG_JSON`.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Topic every status message is published on.
pub const STATUS_TOPIC: &str = "esp8266/status";

// ---------------------------------------------------------------------------
// Sub-sections
// ---------------------------------------------------------------------------

/// Outbound topic for every published data point.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TopicTable {
    pub temperature: heapless::String<64>,
    pub humidity: heapless::String<64>,
    pub rpm: heapless::String<64>,
    pub gas: heapless::String<64>,
    pub object_count: heapless::String<64>,
    pub status: heapless::String<64>,
}

impl Default for TopicTable {
    fn default() -> Self {
        Self {
            temperature: bounded("sensors/temperature"),
            humidity: bounded("sensors/humidity"),
            rpm: bounded("sensors/rpm"),
            gas: bounded("sensors/gas"),
            object_count: bounded("sensors/object_count"),
            status: bounded(STATUS_TOPIC),
        }
    }
}

impl TopicTable {
    fn all(&self) -> [&str; 6] {
        [
            self.temperature.as_str(),
            self.humidity.as_str(),
            self.rpm.as_str(),
            self.gas.as_str(),
            self.object_count.as_str(),
            self.status.as_str(),
        ]
    }
}

/// Inclusive plausibility ranges for the mandatory readings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidationLimits {
    pub min_temperature_c: f32,
    pub max_temperature_c: f32,
    pub min_humidity_pct: f32,
    pub max_humidity_pct: f32,
}

impl Default for ValidationLimits {
    fn default() -> Self {
        Self {
            min_temperature_c: -40.0,
            max_temperature_c: 80.0,
            min_humidity_pct: 0.0,
            max_humidity_pct: 100.0,
        }
    }
}

// ---------------------------------------------------------------------------
// BridgeConfig
// ---------------------------------------------------------------------------

/// Core bridge configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BridgeConfig {
    // --- WiFi ---
    pub wifi_ssid: heapless::String<32>,
    pub wifi_password: heapless::String<64>,

    // --- Broker ---
    pub mqtt_host: heapless::String<64>,
    pub mqtt_port: u16,
    pub mqtt_client_id: heapless::String<32>,
    pub mqtt_username: heapless::String<32>,
    pub mqtt_password: heapless::String<64>,
    /// Broker keep-alive interval (seconds)
    pub keep_alive_secs: u16,
    /// Network/socket timeout for broker operations (seconds)
    pub socket_timeout_secs: u16,

    // --- Topics ---
    pub topics: TopicTable,

    // --- Serial link ---
    pub uart_baud: u32,
    /// Reject unparsable numbers instead of substituting zero
    pub strict_numbers: bool,

    // --- Validation ---
    pub limits: ValidationLimits,

    // --- Supervision ---
    /// Association status polls before giving up and restarting
    pub association_poll_limit: u8,
    /// Delay between association polls (milliseconds)
    pub association_poll_delay_ms: u32,
    /// Broker connect attempts per tick
    pub broker_connect_attempts: u8,
    /// Delay between broker connect attempts (milliseconds)
    pub broker_retry_delay_ms: u32,

    // --- Timing ---
    /// Silence on the serial link before a staleness event (milliseconds)
    pub stale_threshold_ms: u32,
    /// Idle delay at the end of every tick (milliseconds)
    pub idle_delay_ms: u32,
    /// Settle delay after boot before the links are brought up (milliseconds)
    pub startup_delay_ms: u32,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            // WiFi
            wifi_ssid: bounded(option_env!("BRIDGE_WIFI_SSID").unwrap_or("telemetry-ap")),
            wifi_password: bounded(option_env!("BRIDGE_WIFI_PASSWORD").unwrap_or("")),

            // Broker
            mqtt_host: bounded(option_env!("BRIDGE_MQTT_HOST").unwrap_or("broker.local")),
            mqtt_port: 1883,
            mqtt_client_id: bounded("ESP8266_TempSensor"),
            mqtt_username: bounded(option_env!("BRIDGE_MQTT_USER").unwrap_or("")),
            mqtt_password: bounded(option_env!("BRIDGE_MQTT_PASSWORD").unwrap_or("")),
            keep_alive_secs: 60,
            socket_timeout_secs: 10,

            topics: TopicTable::default(),

            // Serial
            uart_baud: 9600,
            strict_numbers: false,

            limits: ValidationLimits::default(),

            // Supervision
            association_poll_limit: 20,
            association_poll_delay_ms: 500,
            broker_connect_attempts: 3,
            broker_retry_delay_ms: 2000,

            // Timing
            stale_threshold_ms: 10_000,
            idle_delay_ms: 10,
            startup_delay_ms: 2000,
        }
    }
}

impl BridgeConfig {
    /// Build-time configuration: the JSON override if one was compiled in,
    /// otherwise the defaults.  Always validated.
    pub fn load() -> Result<Self, ConfigError> {
        let config = match option_env!("BRIDGE_CONFIG_JSON") {
            Some(doc) => Self::from_json(doc)?,
            None => Self::default(),
        };
        config.validate()?;
        Ok(config)
    }

    /// Parse a JSON document.  Missing keys keep their default values.
    pub fn from_json(doc: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(doc).map_err(|_| ConfigError::Malformed)
    }

    /// Reject values the bridge cannot run with.  Invalid values are never
    /// clamped.
    #[allow(clippy::neg_cmp_op_on_partial_ord)]
    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_ssid(&self.wifi_ssid)?;
        validate_password(&self.wifi_password)?;

        if self.mqtt_host.is_empty() {
            return Err(ConfigError::ValidationFailed("mqtt_host must not be empty"));
        }
        if self.mqtt_port == 0 {
            return Err(ConfigError::ValidationFailed("mqtt_port must be non-zero"));
        }
        if self.mqtt_client_id.is_empty() {
            return Err(ConfigError::ValidationFailed("mqtt_client_id must not be empty"));
        }
        if self.topics.all().iter().any(|t| t.is_empty()) {
            return Err(ConfigError::ValidationFailed("topics must not be empty"));
        }
        if self.uart_baud == 0 {
            return Err(ConfigError::ValidationFailed("uart_baud must be non-zero"));
        }

        let l = &self.limits;
        if !(l.min_temperature_c < l.max_temperature_c) {
            return Err(ConfigError::ValidationFailed("temperature limits inverted"));
        }
        if !(l.min_humidity_pct < l.max_humidity_pct) {
            return Err(ConfigError::ValidationFailed("humidity limits inverted"));
        }

        if self.association_poll_limit == 0 {
            return Err(ConfigError::ValidationFailed("association_poll_limit must be >= 1"));
        }
        if self.broker_connect_attempts == 0 {
            return Err(ConfigError::ValidationFailed("broker_connect_attempts must be >= 1"));
        }
        if self.stale_threshold_ms == 0 {
            return Err(ConfigError::ValidationFailed("stale_threshold_ms must be non-zero"));
        }
        Ok(())
    }

    /// `mqtt://host:port` URL for the broker client.
    pub fn broker_url(&self) -> heapless::String<96> {
        let mut url = heapless::String::new();
        let _ = fmt::Write::write_fmt(
            &mut url,
            format_args!("mqtt://{}:{}", self.mqtt_host, self.mqtt_port),
        );
        url
    }
}

// ---------------------------------------------------------------------------
// Errors & helpers
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    /// The JSON override could not be parsed.
    Malformed,
    /// A field failed range validation.  Describes which field and why.
    ValidationFailed(&'static str),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Malformed => write!(f, "config document malformed"),
            Self::ValidationFailed(msg) => write!(f, "validation failed: {}", msg),
        }
    }
}

impl std::error::Error for ConfigError {}

/// Copy `s` into a fixed-capacity string, truncating at a char boundary.
pub(crate) fn bounded<const N: usize>(s: &str) -> heapless::String<N> {
    let mut out = heapless::String::new();
    for c in s.chars() {
        if out.push(c).is_err() {
            break;
        }
    }
    out
}

fn validate_ssid(ssid: &str) -> Result<(), ConfigError> {
    if ssid.is_empty() || ssid.len() > 32 {
        return Err(ConfigError::ValidationFailed("SSID must be 1-32 bytes"));
    }
    if !ssid.bytes().all(|b| (0x20..=0x7E).contains(&b)) {
        return Err(ConfigError::ValidationFailed("SSID must be printable ASCII"));
    }
    Ok(())
}

fn validate_password(password: &str) -> Result<(), ConfigError> {
    // Empty means an open network.
    if password.is_empty() {
        return Ok(());
    }
    if password.len() < 8 || password.len() > 64 {
        return Err(ConfigError::ValidationFailed("WPA2 password must be 8-64 bytes"));
    }
    Ok(())
}
