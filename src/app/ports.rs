//! Port traits — the hexagonal boundary between bridge logic and the outside world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ Bridge (domain)
//! ```
//!
//! Driven adapters (UART, WiFi, MQTT client, clock, event sinks) implement
//! these traits.  The [`Bridge`](super::service::Bridge) consumes them via
//! generics, so the domain core never touches a driver directly.  Blocking
//! delays go through [`embedded_hal::delay::DelayNs`].

use core::net::Ipv4Addr;

use crate::error::{LinkError, PublishError, WirelessError};

// ───────────────────────────────────────────────────────────────
// Serial byte source (driven adapter: sensor controller → domain)
// ───────────────────────────────────────────────────────────────

/// Non-blocking byte-oriented input channel.
pub trait ByteSource {
    /// Read up to `buf.len()` bytes into `buf`.
    /// Returns the number of bytes actually read; 0 if none are available.
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, LinkError>;
}

// ───────────────────────────────────────────────────────────────
// Wireless link (driven adapter: domain ↔ WiFi station)
// ───────────────────────────────────────────────────────────────

pub trait WirelessPort {
    /// Whether the station is associated and has an address.
    fn is_associated(&self) -> bool;

    /// Kick off association.  Completion is observed by polling
    /// [`is_associated`](Self::is_associated).
    fn begin_association(&mut self) -> Result<(), WirelessError>;

    /// Station address, once associated.
    fn local_ip(&self) -> Option<Ipv4Addr>;
}

// ───────────────────────────────────────────────────────────────
// Broker session (driven adapter: domain → pub/sub broker)
// ───────────────────────────────────────────────────────────────

pub trait BrokerPort {
    /// Whether the session is currently established.
    fn is_connected(&self) -> bool;

    /// One connect attempt.  `Err` carries the client's status code.
    fn connect(&mut self) -> Result<(), i32>;

    /// At-most-once publish of `payload` to `topic`.
    fn publish(&mut self, topic: &str, payload: &[u8]) -> Result<(), PublishError>;

    /// Service the client (keep-alive, inbound traffic).  Called once per tick.
    fn poll(&mut self);
}

// ───────────────────────────────────────────────────────────────
// Clock
// ───────────────────────────────────────────────────────────────

/// Monotonic millisecond clock.
pub trait Clock {
    fn now_ms(&self) -> u64;
}

// ───────────────────────────────────────────────────────────────
// Event sink (driven adapter: domain → logging)
// ───────────────────────────────────────────────────────────────

/// The domain emits structured [`AppEvent`](super::events::AppEvent)s
/// through this port.  Adapters decide where they go.
pub trait EventSink {
    fn emit(&mut self, event: &super::events::AppEvent);
}
