//! End-to-end tests for the Bridge tick: serial bytes in, broker messages out.
//!
//! Everything runs on the host against the mocks in `mock_hw`.

use crate::mock_hw::{MockBroker, MockClock, MockSerial, MockWifi, RecordingDelay, RecordingSink};

use telemetry_bridge::app::events::AppEvent;
use telemetry_bridge::app::service::{Bridge, TickContext};
use telemetry_bridge::config::BridgeConfig;
use telemetry_bridge::connectivity::ConnectionState;
use telemetry_bridge::error::{BridgeError, DecodeError};
use telemetry_bridge::publisher::PublishOutcome;

const STATUS: &str = "esp8266/status";

struct Harness {
    bridge: Bridge,
    serial: MockSerial,
    wifi: MockWifi,
    broker: MockBroker,
    clock: MockClock,
    delay: RecordingDelay,
    sink: RecordingSink,
}

impl Harness {
    fn new(wifi: MockWifi, broker: MockBroker) -> Self {
        let config = BridgeConfig::default();
        let clock = MockClock::at(0);
        Self {
            bridge: Bridge::new(&config, 0),
            serial: MockSerial::new(),
            wifi,
            broker,
            clock,
            delay: RecordingDelay::default(),
            sink: RecordingSink::default(),
        }
    }

    fn online() -> Self {
        Self::new(MockWifi::up(), MockBroker::new())
    }

    fn tick(&mut self) -> Result<(), BridgeError> {
        let mut cx = TickContext {
            serial: &mut self.serial,
            wifi: &mut self.wifi,
            broker: &mut self.broker,
            clock: &self.clock,
            delay: &mut self.delay,
            sink: &mut self.sink,
        };
        self.bridge.tick(&mut cx)
    }
}

// ── Happy path ────────────────────────────────────────────────

#[test]
fn line_with_optional_count_publishes_three_points() {
    let mut h = Harness::online();
    h.serial.push(b"T:20.00,H:50.00,O:7\n");
    h.tick().unwrap();

    assert_eq!(h.bridge.state(), ConnectionState::BrokerUp);
    assert_eq!(h.broker.data_points(), 3);
    assert_eq!(h.broker.payloads("sensors/temperature"), ["20.00"]);
    assert_eq!(h.broker.payloads("sensors/humidity"), ["50.00"]);
    assert_eq!(h.broker.payloads("sensors/object_count"), ["7"]);
    assert!(h.broker.payloads("sensors/rpm").is_empty());
    assert_eq!(h.bridge.stats().published, 1);
}

#[test]
fn connected_status_precedes_data() {
    let mut h = Harness::online();
    h.serial.push(b"T:21.5,H:40,R:1200,G:0.5,O:3\n");
    h.tick().unwrap();

    let topics: Vec<&str> = h.broker.published.iter().map(|(t, _)| t.as_str()).collect();
    assert_eq!(
        topics,
        [
            STATUS,
            "sensors/temperature",
            "sensors/humidity",
            "sensors/rpm",
            "sensors/gas",
            "sensors/object_count",
        ]
    );
    assert_eq!(h.broker.payloads(STATUS), ["connected"]);
}

#[test]
fn lines_split_across_reads_are_reassembled() {
    let mut h = Harness::online();
    h.serial.push(b"T:19.");
    h.tick().unwrap();
    assert_eq!(h.broker.data_points(), 0);

    h.serial.push(b"25,H:33.3\nT:20,H:34\n");
    h.tick().unwrap();
    assert_eq!(h.broker.payloads("sensors/temperature"), ["19.25", "20.00"]);
    assert_eq!(h.bridge.stats().lines, 2);
}

#[test]
fn broker_is_polled_every_tick() {
    let mut h = Harness::online();
    for _ in 0..5 {
        h.tick().unwrap();
    }
    assert_eq!(h.broker.polls, 5);
    assert_eq!(h.bridge.stats().ticks, 5);
}

// ── Dropped data ──────────────────────────────────────────────

#[test]
fn bad_lines_are_dropped_without_publishing() {
    let mut h = Harness::online();
    h.serial.push(b"T:99,H:50\n");
    h.serial.push(b"garbage\n");
    h.serial.push(b"T:1\n");
    h.tick().unwrap();

    let stats = h.bridge.stats();
    assert_eq!(stats.rejected, 1);
    assert_eq!(stats.decode_failures, 2);
    assert_eq!(h.broker.data_points(), 0);
    assert_eq!(h.sink.count(|e| matches!(e, AppEvent::Dropped(_))), 3);
}

#[test]
fn short_binary_line_is_too_short() {
    let mut h = Harness::online();
    h.serial.push(b"\xff\xff\xff\xff\n");
    h.tick().unwrap();

    assert_eq!(h.bridge.stats().decode_failures, 1);
    assert_eq!(
        h.sink.count(|e| matches!(
            e,
            AppEvent::Dropped(BridgeError::Decode(DecodeError::TooShort { len: 4 }))
        )),
        1
    );
    assert_eq!(h.broker.data_points(), 0);
}

#[test]
fn overlong_line_is_truncated_and_stream_recovers() {
    let mut h = Harness::online();
    h.serial.push(&[b'X'; 200]);
    h.serial.push(b"\nT:22,H:45\n");
    h.tick().unwrap();

    let stats = h.bridge.stats();
    assert_eq!(stats.overflow_bytes, 200 - 127);
    assert_eq!(stats.decode_failures, 1);
    assert_eq!(stats.published, 1);
    assert_eq!(
        h.sink.count(|e| matches!(e, AppEvent::Dropped(BridgeError::BufferOverflow))),
        1
    );
    assert_eq!(h.broker.payloads("sensors/temperature"), ["22.00"]);
}

#[test]
fn nothing_published_while_broker_unreachable() {
    let mut h = Harness::new(MockWifi::up(), MockBroker::unreachable());
    h.serial.push(b"T:20,H:50\n");
    h.tick().unwrap();

    assert_eq!(h.bridge.state(), ConnectionState::WirelessUp);
    assert_eq!(h.broker.connect_attempts, 3);
    assert!(h.broker.published.is_empty());
    assert_eq!(h.bridge.stats().not_connected, 1);
    // Two pauses between three attempts.
    assert_eq!(h.delay.total_ms(), 2 * 2000);
}

#[test]
fn rejected_sends_report_partial() {
    let mut h = Harness::online();
    // "connected" plus one data point get through; the rest are rejected.
    h.broker.fail_publish_after = Some(2);
    h.serial.push(b"T:20,H:50,O:1\n");
    h.tick().unwrap();

    assert_eq!(h.broker.data_points(), 1);
    assert_eq!(h.bridge.stats().partial, 1);
    let partials = h.sink.count(|e| {
        matches!(
            e,
            AppEvent::Published { outcome: PublishOutcome::Partial { sent: 1, .. }, .. }
        )
    });
    assert_eq!(partials, 1);
}

#[test]
fn serial_read_error_skips_the_tick() {
    let mut h = Harness::online();
    h.serial.push(b"T:20,H:50\n");
    h.serial.fail_next_read = true;
    h.tick().unwrap();
    assert_eq!(h.broker.data_points(), 0);
    assert!(h.serial.pending() > 0);

    h.tick().unwrap();
    assert_eq!(h.broker.data_points(), 2);
}

// ── Staleness ─────────────────────────────────────────────────

#[test]
fn silence_publishes_no_data_once_per_interval() {
    let mut h = Harness::online();
    h.tick().unwrap();

    h.clock.advance(10_000);
    h.tick().unwrap();
    assert!(h.broker.payloads(STATUS).iter().all(|p| *p != "no_data"));

    h.clock.advance(1);
    h.tick().unwrap();
    h.tick().unwrap();
    assert_eq!(h.broker.payloads(STATUS), ["connected", "no_data"]);

    h.clock.advance(10_001);
    h.tick().unwrap();
    assert_eq!(h.broker.payloads(STATUS), ["connected", "no_data", "no_data"]);
    assert_eq!(h.bridge.stats().stale_events, 2);
}

#[test]
fn decoded_line_rearms_the_watchdog() {
    let mut h = Harness::online();
    h.clock.advance(9_000);
    h.serial.push(b"T:20,H:50\n");
    h.tick().unwrap();

    h.clock.advance(10_000);
    h.tick().unwrap();
    assert_eq!(h.bridge.stats().stale_events, 0);

    h.clock.advance(1);
    h.tick().unwrap();
    assert_eq!(h.bridge.stats().stale_events, 1);
}

#[test]
fn staleness_without_broker_is_logged_not_published() {
    let mut h = Harness::new(MockWifi::up(), MockBroker::unreachable());
    h.clock.advance(10_001);
    h.tick().unwrap();

    assert_eq!(h.sink.count(|e| matches!(e, AppEvent::DataStale { .. })), 1);
    assert!(h.broker.published.is_empty());
}

// ── Connectivity through the bridge ───────────────────────────

#[test]
fn wireless_exhaustion_is_fatal() {
    let mut h = Harness::new(MockWifi::down(), MockBroker::new());
    let err = h.tick().unwrap_err();

    assert_eq!(err, BridgeError::WirelessAssociationExhausted);
    assert!(err.is_fatal());
    assert_eq!(h.broker.connect_attempts, 0);
    assert_eq!(h.delay.total_ms(), 20 * 500);
}

#[test]
fn broker_session_loss_republishes_connected() {
    let mut h = Harness::online();
    h.tick().unwrap();
    h.broker.connected = false;
    h.tick().unwrap();

    assert_eq!(h.broker.payloads(STATUS), ["connected", "connected"]);
    assert_eq!(h.broker.connect_attempts, 2);
}

#[test]
fn wireless_recovery_republishes_connected() {
    let mut h = Harness::online();
    h.tick().unwrap();

    // The access point drops and the broker session goes with it.
    h.wifi.up = false;
    h.wifi.associate_after = Some(3);
    h.broker.connected = false;
    h.serial.push(b"T:20,H:50\n");
    h.tick().unwrap();

    assert_eq!(h.bridge.state(), ConnectionState::BrokerUp);
    assert_eq!(h.wifi.begin_calls, 1);
    assert_eq!(h.broker.payloads(STATUS), ["connected", "connected"]);
    assert_eq!(h.broker.data_points(), 2);
}
