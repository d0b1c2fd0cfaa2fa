//! Connectivity supervisor against mock radio and broker.

use crate::mock_hw::{MockBroker, MockWifi, RecordingDelay, RecordingSink};

use telemetry_bridge::app::events::AppEvent;
use telemetry_bridge::config::BridgeConfig;
use telemetry_bridge::connectivity::{ConnectionState, ConnectivitySupervisor, SupervisorOutcome};
use telemetry_bridge::error::BridgeError;

use ConnectionState::{BrokerConnecting, BrokerUp, Disconnected, WirelessAssociating, WirelessUp};

fn transitions(sink: &RecordingSink) -> Vec<(ConnectionState, ConnectionState)> {
    sink.events
        .iter()
        .filter_map(|e| match e {
            AppEvent::ConnectionChanged { from, to } => Some((*from, *to)),
            _ => None,
        })
        .collect()
}

#[test]
fn cold_start_walks_every_state() {
    let mut sup = ConnectivitySupervisor::from_config(&BridgeConfig::default());
    let mut wifi = MockWifi::up_after(4);
    let mut broker = MockBroker::new();
    let mut delay = RecordingDelay::default();
    let mut sink = RecordingSink::default();

    let out = sup.evaluate(&mut wifi, &mut broker, &mut delay, &mut sink).unwrap();

    assert_eq!(out, SupervisorOutcome::BrokerEstablished);
    assert_eq!(
        transitions(&sink),
        [
            (Disconnected, WirelessAssociating),
            (WirelessAssociating, WirelessUp),
            (WirelessUp, BrokerConnecting),
            (BrokerConnecting, BrokerUp),
        ]
    );
    assert_eq!(delay.total_ms(), 4 * 500);
    assert_eq!(
        sink.count(|e| matches!(e, AppEvent::WirelessAssociated { polls: 4, ip: Some(_) })),
        1
    );
}

#[test]
fn broker_attempts_never_exceed_three_per_tick() {
    let mut sup = ConnectivitySupervisor::from_config(&BridgeConfig::default());
    let mut wifi = MockWifi::up();
    let mut broker = MockBroker::unreachable();
    let mut delay = RecordingDelay::default();
    let mut sink = RecordingSink::default();

    for tick in 1..=4u32 {
        let out = sup.evaluate(&mut wifi, &mut broker, &mut delay, &mut sink).unwrap();
        assert_eq!(out, SupervisorOutcome::BrokerUnavailable { code: -2 });
        assert!(sup.broker_attempts_this_tick() <= 3);
        assert_eq!(broker.connect_attempts, tick * 3);
    }
    assert_eq!(sup.state(), WirelessUp);
    assert_eq!(sink.count(|e| matches!(e, AppEvent::BrokerConnectFailed { .. })), 12);
}

#[test]
fn custom_retry_budget_is_honoured() {
    let config = BridgeConfig {
        broker_connect_attempts: 5,
        broker_retry_delay_ms: 100,
        ..BridgeConfig::default()
    };
    let mut sup = ConnectivitySupervisor::from_config(&config);
    let mut wifi = MockWifi::up();
    let mut broker = MockBroker::unreachable();
    let mut delay = RecordingDelay::default();
    let mut sink = RecordingSink::default();

    sup.evaluate(&mut wifi, &mut broker, &mut delay, &mut sink).unwrap();
    assert_eq!(broker.connect_attempts, 5);
    assert_eq!(delay.total_ms(), 4 * 100);
}

#[test]
fn losing_wireless_drops_broker_state_and_is_fatal_when_unrecoverable() {
    let mut sup = ConnectivitySupervisor::from_config(&BridgeConfig::default());
    let mut wifi = MockWifi::up();
    let mut broker = MockBroker::new();
    let mut delay = RecordingDelay::default();
    let mut sink = RecordingSink::default();

    sup.evaluate(&mut wifi, &mut broker, &mut delay, &mut sink).unwrap();
    assert_eq!(sup.state(), BrokerUp);
    sink.events.clear();

    wifi.up = false;
    let err = sup.evaluate(&mut wifi, &mut broker, &mut delay, &mut sink).unwrap_err();

    assert_eq!(err, BridgeError::WirelessAssociationExhausted);
    assert_eq!(
        transitions(&sink),
        [
            (BrokerUp, Disconnected),
            (Disconnected, WirelessAssociating),
            (WirelessAssociating, Disconnected),
        ]
    );
    assert_eq!(wifi.begin_calls, 1);
}

#[test]
fn session_that_came_up_on_its_own_counts_as_established() {
    let mut sup = ConnectivitySupervisor::from_config(&BridgeConfig::default());
    let mut wifi = MockWifi::up();
    let mut broker = MockBroker::new();
    broker.connected = true;
    let mut delay = RecordingDelay::default();
    let mut sink = RecordingSink::default();

    let out = sup.evaluate(&mut wifi, &mut broker, &mut delay, &mut sink).unwrap();
    assert_eq!(out, SupervisorOutcome::BrokerEstablished);
    assert_eq!(broker.connect_attempts, 0);

    let out = sup.evaluate(&mut wifi, &mut broker, &mut delay, &mut sink).unwrap();
    assert_eq!(out, SupervisorOutcome::BrokerUp);
}

#[test]
fn wireless_loss_recovers_within_one_tick() {
    let mut sup = ConnectivitySupervisor::from_config(&BridgeConfig::default());
    let mut wifi = MockWifi::up();
    let mut broker = MockBroker::new();
    let mut delay = RecordingDelay::default();
    let mut sink = RecordingSink::default();

    sup.evaluate(&mut wifi, &mut broker, &mut delay, &mut sink).unwrap();
    assert_eq!(sup.state(), BrokerUp);
    sink.events.clear();
    delay = RecordingDelay::default();

    wifi.up = false;
    wifi.associate_after = Some(2);
    broker.connected = false;
    let out = sup.evaluate(&mut wifi, &mut broker, &mut delay, &mut sink).unwrap();

    assert_eq!(out, SupervisorOutcome::BrokerEstablished);
    assert_eq!(sup.state(), BrokerUp);
    assert_eq!(
        transitions(&sink),
        [
            (BrokerUp, Disconnected),
            (Disconnected, WirelessAssociating),
            (WirelessAssociating, WirelessUp),
            (WirelessUp, BrokerConnecting),
            (BrokerConnecting, BrokerUp),
        ]
    );
    assert_eq!(wifi.begin_calls, 1);
    assert_eq!(broker.connect_attempts, 2);
    assert_eq!(delay.total_ms(), 2 * 500);
    assert_eq!(sup.association_count(), 1);
}
