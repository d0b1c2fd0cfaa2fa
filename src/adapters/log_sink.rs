//! Log-based event sink adapter.
//!
//! Implements [`EventSink`] by writing structured bridge events to the
//! ESP-IDF logger (UART0 / USB-CDC in production, stderr on the host).

use log::{info, warn};

use crate::app::events::AppEvent;
use crate::app::ports::EventSink;
use crate::publisher::PublishOutcome;

/// Adapter that logs every [`AppEvent`] to the console.
#[derive(Default)]
pub struct LogEventSink;

impl LogEventSink {
    pub fn new() -> Self {
        Self
    }
}

impl EventSink for LogEventSink {
    fn emit(&mut self, event: &AppEvent) {
        match event {
            AppEvent::Started { version } => {
                info!("START | telemetry-bridge v{}", version);
            }
            AppEvent::ConnectionChanged { from, to } => {
                info!("LINK  | {} -> {}", from.name(), to.name());
            }
            AppEvent::WirelessAssociated { ip, polls } => match ip {
                Some(ip) => info!("LINK  | wifi up, ip={} after {} polls", ip, polls),
                None => info!("LINK  | wifi up, no address yet after {} polls", polls),
            },
            AppEvent::BrokerConnectFailed { attempt, code } => {
                warn!("LINK  | broker attempt {} failed, rc={}", attempt, code);
            }
            AppEvent::Published { record, outcome } => match outcome {
                PublishOutcome::Sent { points } => info!(
                    "PUB   | T={:.2} H={:.2} R={:?} G={:?} O={:?} | {} points",
                    record.temperature_c,
                    record.humidity_pct,
                    record.rpm,
                    record.gas,
                    record.object_count,
                    points,
                ),
                PublishOutcome::Partial { sent, failed } => {
                    warn!("PUB   | partial, {} sent before: {}", sent, failed);
                }
                PublishOutcome::NotConnected => {
                    info!("PUB   | skipped, broker not up");
                }
            },
            AppEvent::Dropped(e) => {
                warn!("DROP  | {}", e);
            }
            AppEvent::DataStale { silent_ms } => {
                warn!("STALE | no data for {} ms", silent_ms);
            }
        }
    }
}
