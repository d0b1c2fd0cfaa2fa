//! Mock adapters for integration tests.
//!
//! Each mock records what the bridge did to it so tests can assert on the
//! full history (publishes, connect attempts, delays, events) without a
//! radio, a broker or a serial port.

use std::cell::Cell;
use std::collections::VecDeque;
use std::net::Ipv4Addr;

use embedded_hal::delay::DelayNs;
use telemetry_bridge::app::events::AppEvent;
use telemetry_bridge::app::ports::{BrokerPort, ByteSource, Clock, EventSink, WirelessPort};
use telemetry_bridge::error::{LinkError, PublishError, WirelessError};

// ── MockSerial ────────────────────────────────────────────────

#[derive(Default)]
pub struct MockSerial {
    rx: VecDeque<u8>,
    pub fail_next_read: bool,
}

#[allow(dead_code)]
impl MockSerial {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, bytes: &[u8]) {
        self.rx.extend(bytes);
    }

    pub fn pending(&self) -> usize {
        self.rx.len()
    }
}

impl ByteSource for MockSerial {
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, LinkError> {
        if std::mem::take(&mut self.fail_next_read) {
            return Err(LinkError::ReadFailed(-1));
        }
        let n = buf.len().min(self.rx.len());
        for (slot, byte) in buf.iter_mut().zip(self.rx.drain(..n)) {
            *slot = byte;
        }
        Ok(n)
    }
}

// ── MockWifi ──────────────────────────────────────────────────

/// Station that is either up, down, or comes up after a number of polls.
pub struct MockWifi {
    pub up: bool,
    /// When set, association completes after this many status polls.
    pub associate_after: Option<u32>,
    pub begin_calls: u32,
    polls: Cell<u32>,
}

#[allow(dead_code)]
impl MockWifi {
    pub fn up() -> Self {
        Self { up: true, associate_after: None, begin_calls: 0, polls: Cell::new(0) }
    }

    pub fn down() -> Self {
        Self { up: false, associate_after: None, begin_calls: 0, polls: Cell::new(0) }
    }

    pub fn up_after(polls: u32) -> Self {
        Self { up: false, associate_after: Some(polls), begin_calls: 0, polls: Cell::new(0) }
    }
}

impl WirelessPort for MockWifi {
    fn is_associated(&self) -> bool {
        if self.up {
            return true;
        }
        if self.begin_calls == 0 {
            return false;
        }
        self.polls.set(self.polls.get() + 1);
        self.associate_after.is_some_and(|n| self.polls.get() >= n)
    }

    fn begin_association(&mut self) -> Result<(), WirelessError> {
        self.begin_calls += 1;
        self.polls.set(0);
        Ok(())
    }

    fn local_ip(&self) -> Option<Ipv4Addr> {
        Some(Ipv4Addr::new(10, 0, 0, 42))
    }
}

// ── MockBroker ────────────────────────────────────────────────

pub struct MockBroker {
    pub connected: bool,
    /// Connect attempts that fail before one succeeds (`u32::MAX`: never).
    pub fail_connects: u32,
    /// Reject every publish after this many succeeded.
    pub fail_publish_after: Option<usize>,
    pub connect_attempts: u32,
    pub polls: u32,
    pub published: Vec<(String, String)>,
}

#[allow(dead_code)]
impl MockBroker {
    pub fn new() -> Self {
        Self {
            connected: false,
            fail_connects: 0,
            fail_publish_after: None,
            connect_attempts: 0,
            polls: 0,
            published: Vec::new(),
        }
    }

    pub fn unreachable() -> Self {
        Self { fail_connects: u32::MAX, ..Self::new() }
    }

    /// Payloads sent to `topic`, in order.
    pub fn payloads(&self, topic: &str) -> Vec<&str> {
        self.published
            .iter()
            .filter(|(t, _)| t == topic)
            .map(|(_, p)| p.as_str())
            .collect()
    }

    /// Data points published (status messages excluded).
    pub fn data_points(&self) -> usize {
        self.published.iter().filter(|(t, _)| t != "esp8266/status").count()
    }
}

impl BrokerPort for MockBroker {
    fn is_connected(&self) -> bool {
        self.connected
    }

    fn connect(&mut self) -> Result<(), i32> {
        self.connect_attempts += 1;
        if self.connect_attempts > self.fail_connects {
            self.connected = true;
            Ok(())
        } else {
            Err(-2)
        }
    }

    fn publish(&mut self, topic: &str, payload: &[u8]) -> Result<(), PublishError> {
        if !self.connected {
            return Err(PublishError::Disconnected);
        }
        if self.fail_publish_after.is_some_and(|n| self.published.len() >= n) {
            return Err(PublishError::Rejected(-1));
        }
        self.published
            .push((topic.to_string(), String::from_utf8_lossy(payload).into_owned()));
        Ok(())
    }

    fn poll(&mut self) {
        self.polls += 1;
    }
}

// ── MockClock ─────────────────────────────────────────────────

#[derive(Default)]
pub struct MockClock {
    now: Cell<u64>,
}

#[allow(dead_code)]
impl MockClock {
    pub fn at(ms: u64) -> Self {
        Self { now: Cell::new(ms) }
    }

    pub fn advance(&self, ms: u64) {
        self.now.set(self.now.get() + ms);
    }
}

impl Clock for MockClock {
    fn now_ms(&self) -> u64 {
        self.now.get()
    }
}

// ── RecordingDelay ────────────────────────────────────────────

/// Records requested delays instead of sleeping.
#[derive(Default)]
pub struct RecordingDelay {
    pub total_ns: u64,
    pub calls: u32,
}

#[allow(dead_code)]
impl RecordingDelay {
    pub fn total_ms(&self) -> u64 {
        self.total_ns / 1_000_000
    }
}

impl DelayNs for RecordingDelay {
    fn delay_ns(&mut self, ns: u32) {
        self.total_ns += u64::from(ns);
        self.calls += 1;
    }

    fn delay_ms(&mut self, ms: u32) {
        self.total_ns += u64::from(ms) * 1_000_000;
        self.calls += 1;
    }
}

// ── RecordingSink ─────────────────────────────────────────────

#[derive(Default)]
pub struct RecordingSink {
    pub events: Vec<AppEvent>,
}

#[allow(dead_code)]
impl RecordingSink {
    pub fn count(&self, pred: impl Fn(&AppEvent) -> bool) -> usize {
        self.events.iter().filter(|e| pred(e)).count()
    }
}

impl EventSink for RecordingSink {
    fn emit(&mut self, event: &AppEvent) {
        self.events.push(event.clone());
    }
}
