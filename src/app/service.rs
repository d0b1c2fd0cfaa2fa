//! Bridge service, the hexagonal core.
//!
//! [`Bridge`] owns every pipeline stage and runs one cooperative tick at a
//! time.  All I/O flows through port traits handed in per tick via
//! [`TickContext`], so the whole bridge is testable with mock adapters.
//!
//! ```text
//!  ByteSource ──▶ LineAccumulator ──▶ Decoder ──▶ Validator ──▶ Publisher ──▶ BrokerPort
//!                                        │
//!                                        └──▶ Watchdog ──▶ "no_data"
//!  WirelessPort/BrokerPort ◀── ConnectivitySupervisor (runs first every tick)
//! ```

use embedded_hal::delay::DelayNs;
use log::{debug, info, warn};

use crate::config::BridgeConfig;
use crate::connectivity::{ConnectionState, ConnectivitySupervisor, SupervisorOutcome};
use crate::error::BridgeError;
use crate::publisher::{PublishOutcome, Publisher, StatusMessage};
use crate::telemetry::decoder::{NumberPolicy, TelemetryDecoder};
use crate::telemetry::line::{Line, LineAccumulator};
use crate::telemetry::validator::Validator;
use crate::watchdog::Watchdog;

use super::events::AppEvent;
use super::ports::{BrokerPort, ByteSource, Clock, EventSink, WirelessPort};

/// Serial bytes drained per read call.
const READ_CHUNK: usize = 64;

// ───────────────────────────────────────────────────────────────
// Per-tick port bundle
// ───────────────────────────────────────────────────────────────

/// Borrowed adapters for one tick.
pub struct TickContext<'a, S, W, B, C, D, E> {
    pub serial: &'a mut S,
    pub wifi: &'a mut W,
    pub broker: &'a mut B,
    pub clock: &'a C,
    pub delay: &'a mut D,
    pub sink: &'a mut E,
}

// ───────────────────────────────────────────────────────────────
// Counters
// ───────────────────────────────────────────────────────────────

/// Running counters since startup.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BridgeStats {
    pub ticks: u64,
    pub lines: u32,
    pub decode_failures: u32,
    pub rejected: u32,
    pub published: u32,
    pub not_connected: u32,
    pub partial: u32,
    pub stale_events: u32,
    pub overflow_bytes: u32,
}

// ───────────────────────────────────────────────────────────────
// Bridge
// ───────────────────────────────────────────────────────────────

pub struct Bridge {
    accumulator: LineAccumulator,
    decoder: TelemetryDecoder,
    validator: Validator,
    supervisor: ConnectivitySupervisor,
    watchdog: Watchdog,
    publisher: Publisher,
    idle_delay_ms: u32,
    stats: BridgeStats,
}

impl Bridge {
    /// Build every stage from configuration.  `now_ms` seeds the watchdog.
    pub fn new(config: &BridgeConfig, now_ms: u64) -> Self {
        let policy = if config.strict_numbers {
            NumberPolicy::Strict
        } else {
            NumberPolicy::Permissive
        };
        Self {
            accumulator: LineAccumulator::new(),
            decoder: TelemetryDecoder::new(policy),
            validator: Validator::new(config.limits),
            supervisor: ConnectivitySupervisor::from_config(config),
            watchdog: Watchdog::new(now_ms, u64::from(config.stale_threshold_ms)),
            publisher: Publisher::new(config.topics.clone()),
            idle_delay_ms: config.idle_delay_ms,
            stats: BridgeStats::default(),
        }
    }

    // ── Lifecycle ─────────────────────────────────────────────

    pub fn start(&mut self, sink: &mut impl EventSink) {
        let version = env!("CARGO_PKG_VERSION");
        info!("Bridge v{} started, decoder policy {:?}", version, self.decoder.policy());
        sink.emit(&AppEvent::Started { version });
    }

    // ── Per-tick orchestration ────────────────────────────────

    /// Run one cycle: connectivity → serial drain → staleness check.
    ///
    /// Returns `Err` only for fatal conditions (see
    /// [`BridgeError::is_fatal`]); the caller must restart.
    pub fn tick<S, W, B, C, D, E>(
        &mut self,
        cx: &mut TickContext<'_, S, W, B, C, D, E>,
    ) -> Result<(), BridgeError>
    where
        S: ByteSource,
        W: WirelessPort,
        B: BrokerPort,
        C: Clock,
        D: DelayNs,
        E: EventSink,
    {
        self.stats.ticks += 1;

        // 1. Connectivity
        match self.supervisor.evaluate(cx.wifi, cx.broker, cx.delay, cx.sink)? {
            SupervisorOutcome::BrokerEstablished => {
                if let Err(e) =
                    self.publisher
                        .publish_status(cx.broker, StatusMessage::Connected, self.state())
                {
                    warn!("Bridge: status publish failed: {}", e);
                }
            }
            SupervisorOutcome::BrokerUnavailable { code } => {
                let e = BridgeError::BrokerConnectFailed { code };
                warn!("Bridge: {}, data will be dropped this tick", e);
            }
            SupervisorOutcome::BrokerUp => {}
        }
        cx.broker.poll();

        // 2. Serial drain
        self.drain_serial(cx);

        // 3. Staleness
        if let Some(stale) = self.watchdog.check(cx.clock.now_ms()) {
            self.stats.stale_events += 1;
            warn!("Bridge: no data for {} ms", stale.silent_ms);
            cx.sink.emit(&AppEvent::DataStale { silent_ms: stale.silent_ms });
            if self.state().is_broker_up() {
                if let Err(e) =
                    self.publisher.publish_status(cx.broker, StatusMessage::NoData, self.state())
                {
                    warn!("Bridge: status publish failed: {}", e);
                }
            }
        }

        Ok(())
    }

    /// Block for the inter-tick delay.
    pub fn idle(&self, delay: &mut impl DelayNs) {
        delay.delay_ms(self.idle_delay_ms);
    }

    // ── Accessors ─────────────────────────────────────────────

    pub fn state(&self) -> ConnectionState {
        self.supervisor.state()
    }

    pub fn stats(&self) -> BridgeStats {
        self.stats
    }

    pub fn supervisor(&self) -> &ConnectivitySupervisor {
        &self.supervisor
    }

    pub fn watchdog(&self) -> &Watchdog {
        &self.watchdog
    }

    // ── Internal ──────────────────────────────────────────────

    fn drain_serial<S, W, B, C, D, E>(&mut self, cx: &mut TickContext<'_, S, W, B, C, D, E>)
    where
        S: ByteSource,
        B: BrokerPort,
        C: Clock,
        E: EventSink,
    {
        let mut chunk = [0u8; READ_CHUNK];
        loop {
            let n = match cx.serial.read(&mut chunk) {
                Ok(0) => break,
                Ok(n) => n,
                Err(e) => {
                    warn!("Bridge: {}", e);
                    break;
                }
            };
            for &byte in &chunk[..n] {
                let dropped_before = self.accumulator.dropped();
                let was_overflowing = self.accumulator.is_overflowing();
                let line = self.accumulator.feed(byte);
                if self.accumulator.dropped() != dropped_before {
                    self.stats.overflow_bytes += 1;
                    // One event per overlong line.
                    if !was_overflowing {
                        cx.sink.emit(&AppEvent::Dropped(BridgeError::BufferOverflow));
                    }
                }
                if let Some(line) = line {
                    self.process_line(&line, cx);
                }
            }
        }
    }

    fn process_line<S, W, B, C, D, E>(
        &mut self,
        line: &Line,
        cx: &mut TickContext<'_, S, W, B, C, D, E>,
    ) where
        B: BrokerPort,
        C: Clock,
        E: EventSink,
    {
        self.stats.lines += 1;
        debug!("Bridge: line {:?}", line.as_text());

        let record = match self.decoder.decode_line(line) {
            Ok(r) => r,
            Err(e) => {
                self.stats.decode_failures += 1;
                warn!("Bridge: line dropped: {}", e);
                cx.sink.emit(&AppEvent::Dropped(e.into()));
                return;
            }
        };
        self.watchdog.mark_seen(cx.clock.now_ms());

        let record = match self.validator.validate(record) {
            Ok(r) => r,
            Err(e) => {
                self.stats.rejected += 1;
                warn!("Bridge: record rejected: {}", e);
                cx.sink.emit(&AppEvent::Dropped(e.into()));
                return;
            }
        };

        let outcome = self.publisher.publish(cx.broker, &record, self.state());
        match outcome {
            PublishOutcome::Sent { .. } => self.stats.published += 1,
            PublishOutcome::NotConnected => {
                self.stats.not_connected += 1;
                cx.sink.emit(&AppEvent::Dropped(BridgeError::NotConnected));
            }
            PublishOutcome::Partial { .. } => self.stats.partial += 1,
        }
        cx.sink.emit(&AppEvent::Published { record, outcome });
    }
}
