//! Publisher: maps a validated record onto broker topics.
//!
//! One message per present field, in fixed order: temperature, humidity,
//! rpm, gas, object count.  Floats are rendered with exactly two decimals,
//! the object count as a plain integer.  Delivery is at-most-once with no
//! retained flag; nothing is queued while the broker session is down.

use core::fmt::Write as _;

use log::{debug, warn};

use crate::app::ports::BrokerPort;
use crate::config::TopicTable;
use crate::connectivity::ConnectionState;
use crate::error::PublishError;
use crate::telemetry::TelemetryRecord;

/// Formatted payload buffer; fits any `f32` with two decimals.
type Payload = heapless::String<48>;

/// Fixed status messages on the status topic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusMessage {
    /// A broker session was (re)established.
    Connected,
    /// No decoded line within the staleness threshold.
    NoData,
}

impl StatusMessage {
    pub const fn payload(self) -> &'static str {
        match self {
            Self::Connected => "connected",
            Self::NoData => "no_data",
        }
    }
}

/// What happened to one record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PublishOutcome {
    /// The broker session was not up; nothing was sent.
    NotConnected,
    /// Every present field was sent.
    Sent { points: u8 },
    /// At least one send failed.  `failed` is the first error; a rejected
    /// send does not stop the rest of the record, a lost session does.
    Partial { sent: u8, failed: PublishError },
}

impl PublishOutcome {
    /// Messages handed to the broker client.
    pub fn sent(&self) -> u8 {
        match *self {
            Self::NotConnected => 0,
            Self::Sent { points } => points,
            Self::Partial { sent, .. } => sent,
        }
    }
}

pub struct Publisher {
    topics: TopicTable,
}

impl Publisher {
    pub fn new(topics: TopicTable) -> Self {
        Self { topics }
    }

    pub fn topics(&self) -> &TopicTable {
        &self.topics
    }

    /// Publish every present field of `record`.
    ///
    /// Does nothing unless `state` is [`ConnectionState::BrokerUp`].
    pub fn publish(
        &self,
        broker: &mut impl BrokerPort,
        record: &TelemetryRecord,
        state: ConnectionState,
    ) -> PublishOutcome {
        if !state.is_broker_up() {
            debug!("Publisher: broker not up, record dropped");
            return PublishOutcome::NotConnected;
        }

        let mut sent = 0u8;
        let mut first_failure = None;
        for (topic, payload) in self.points(record) {
            match broker.publish(topic, payload.as_bytes()) {
                Ok(()) => sent += 1,
                Err(failed) => {
                    warn!("Publisher: send to {} failed: {}", topic, failed);
                    first_failure.get_or_insert(failed);
                    // A dead session rejects everything that follows.
                    if failed == PublishError::Disconnected {
                        break;
                    }
                }
            }
        }
        match first_failure {
            None => {
                debug!("Publisher: {} points sent", sent);
                PublishOutcome::Sent { points: sent }
            }
            Some(failed) => PublishOutcome::Partial { sent, failed },
        }
    }

    /// Publish a fixed status message.  Only attempted while the broker is up.
    pub fn publish_status(
        &self,
        broker: &mut impl BrokerPort,
        message: StatusMessage,
        state: ConnectionState,
    ) -> Result<(), PublishError> {
        if !state.is_broker_up() {
            return Err(PublishError::Disconnected);
        }
        broker.publish(&self.topics.status, message.payload().as_bytes())
    }

    /// (topic, payload) pairs for the present fields, in publish order.
    fn points<'a>(
        &'a self,
        record: &TelemetryRecord,
    ) -> heapless::Vec<(&'a str, Payload), 5> {
        let t = &self.topics;
        let mut out = heapless::Vec::new();
        let floats = [
            (t.temperature.as_str(), Some(record.temperature_c)),
            (t.humidity.as_str(), Some(record.humidity_pct)),
            (t.rpm.as_str(), record.rpm),
            (t.gas.as_str(), record.gas),
        ];
        for (topic, value) in floats {
            if let Some(v) = value {
                let _ = out.push((topic, format_float(v)));
            }
        }
        if let Some(count) = record.object_count {
            let mut p = Payload::new();
            let _ = write!(p, "{count}");
            let _ = out.push((t.object_count.as_str(), p));
        }
        out
    }
}

/// Two-decimal rendering of a reading.
pub fn format_float(value: f32) -> Payload {
    let mut p = Payload::new();
    // -f32::MAX renders as 43 chars.
    let _ = write!(p, "{value:.2}");
    p
}
