//! Adapters — concrete implementations of the hexagonal port traits.
//!
//! | Adapter     | Implements    | Connects to                 |
//! |-------------|---------------|-----------------------------|
//! | `uart`      | ByteSource    | Sensor controller UART      |
//! | `wifi`      | WirelessPort  | ESP-IDF WiFi STA            |
//! | `mqtt`      | BrokerPort    | ESP-IDF MQTT client         |
//! | `time`      | Clock         | ESP32 high-resolution timer |
//! | `log_sink`  | EventSink     | Serial log output           |

pub mod log_sink;
pub mod mqtt;
pub mod time;
pub mod uart;
pub mod wifi;
