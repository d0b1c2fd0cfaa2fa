//! Outbound application events.
//!
//! The [`Bridge`](super::service::Bridge) emits these through the
//! [`EventSink`](super::ports::EventSink) port.  Adapters on the other
//! side decide what to do with them; the firmware only logs them.

use core::net::Ipv4Addr;

use crate::connectivity::ConnectionState;
use crate::error::BridgeError;
use crate::publisher::PublishOutcome;
use crate::telemetry::TelemetryRecord;

/// Structured events emitted by the bridge core.
#[derive(Debug, Clone)]
pub enum AppEvent {
    /// The bridge has started.
    Started { version: &'static str },

    /// The connectivity supervisor changed state.
    ConnectionChanged { from: ConnectionState, to: ConnectionState },

    /// The wireless station associated after `polls` status polls.
    WirelessAssociated { ip: Option<Ipv4Addr>, polls: u8 },

    /// One broker connect attempt failed with the client's status code.
    BrokerConnectFailed { attempt: u8, code: i32 },

    /// A validated record went through the publisher.
    Published { record: TelemetryRecord, outcome: PublishOutcome },

    /// A line or record was discarded.
    Dropped(BridgeError),

    /// No decoded line for longer than the staleness threshold.
    DataStale { silent_ms: u64 },
}
