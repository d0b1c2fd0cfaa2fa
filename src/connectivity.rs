//! Connectivity supervisor.
//!
//! Two-level state machine, re-evaluated once per tick before any data is
//! processed:
//!
//! ```text
//!  Disconnected ──▶ WirelessAssociating ──▶ WirelessUp ──▶ BrokerConnecting ──▶ BrokerUp
//!        ▲                  │ (polls exhausted: fatal)        │ (attempts exhausted)
//!        └── link lost ─────┘                                 └──▶ WirelessUp (retry next tick)
//! ```
//!
//! ## Retry policy
//!
//! - Wireless: begin association, then poll up to `association.max_attempts`
//!   times with a fixed delay.  Exhaustion is fatal: the wireless stack is
//!   not trusted after repeated failures and the caller restarts the process.
//! - Broker: up to `broker.max_attempts` connects per tick with a fixed delay
//!   between attempts.  Exhaustion is not fatal; the next tick tries again.
//!
//! Attempt counters are explicit [`RetryBudget`]s so the number of attempts
//! in one evaluation is bounded by construction.  The delays block the tick;
//! nothing else can usefully run while the links are down.

use core::net::Ipv4Addr;

use embedded_hal::delay::DelayNs;
use log::{debug, error, info, warn};

use crate::app::events::AppEvent;
use crate::app::ports::{BrokerPort, EventSink, WirelessPort};
use crate::config::BridgeConfig;
use crate::error::BridgeError;

// ---------------------------------------------------------------------------
// Connection state
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum ConnectionState {
    Disconnected = 0,
    WirelessAssociating = 1,
    WirelessUp = 2,
    BrokerConnecting = 3,
    BrokerUp = 4,
}

impl ConnectionState {
    pub const fn name(self) -> &'static str {
        match self {
            Self::Disconnected => "Disconnected",
            Self::WirelessAssociating => "WirelessAssociating",
            Self::WirelessUp => "WirelessUp",
            Self::BrokerConnecting => "BrokerConnecting",
            Self::BrokerUp => "BrokerUp",
        }
    }

    /// The wireless link is associated in this state.
    pub const fn is_wireless_up(self) -> bool {
        matches!(self, Self::WirelessUp | Self::BrokerConnecting | Self::BrokerUp)
    }

    pub const fn is_broker_up(self) -> bool {
        matches!(self, Self::BrokerUp)
    }
}

// ---------------------------------------------------------------------------
// Retry policy
// ---------------------------------------------------------------------------

/// Fixed-delay bounded retry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u8,
    pub delay_ms: u32,
}

/// Attempt counter for one bounded retry run.
#[derive(Debug, Clone, Copy)]
struct RetryBudget {
    used: u8,
    max: u8,
}

impl RetryBudget {
    fn new(max: u8) -> Self {
        Self { used: 0, max }
    }

    /// Consume one attempt.  `false` once the budget is spent.
    fn take(&mut self) -> bool {
        if self.used < self.max {
            self.used += 1;
            true
        } else {
            false
        }
    }

    fn used(&self) -> u8 {
        self.used
    }

    fn exhausted(&self) -> bool {
        self.used >= self.max
    }
}

// ---------------------------------------------------------------------------
// Supervisor
// ---------------------------------------------------------------------------

/// Result of one non-fatal evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SupervisorOutcome {
    /// The broker session was already up.
    BrokerUp,
    /// The broker session came up during this evaluation.
    BrokerEstablished,
    /// Every connect attempt this tick failed; carries the last status code.
    BrokerUnavailable { code: i32 },
}

pub struct ConnectivitySupervisor {
    state: ConnectionState,
    association: RetryPolicy,
    broker: RetryPolicy,
    broker_attempts_this_tick: u8,
    broker_failures_total: u32,
    association_count: u32,
}

impl ConnectivitySupervisor {
    pub fn new(association: RetryPolicy, broker: RetryPolicy) -> Self {
        Self {
            state: ConnectionState::Disconnected,
            association,
            broker,
            broker_attempts_this_tick: 0,
            broker_failures_total: 0,
            association_count: 0,
        }
    }

    pub fn from_config(config: &BridgeConfig) -> Self {
        Self::new(
            RetryPolicy {
                max_attempts: config.association_poll_limit,
                delay_ms: config.association_poll_delay_ms,
            },
            RetryPolicy {
                max_attempts: config.broker_connect_attempts,
                delay_ms: config.broker_retry_delay_ms,
            },
        )
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    /// Broker connects attempted during the most recent evaluation.
    pub fn broker_attempts_this_tick(&self) -> u8 {
        self.broker_attempts_this_tick
    }

    /// Broker connect failures since startup.
    pub fn broker_failures_total(&self) -> u32 {
        self.broker_failures_total
    }

    /// Successful associations since startup.
    pub fn association_count(&self) -> u32 {
        self.association_count
    }

    /// Run one supervision pass.
    ///
    /// Returns `Err(WirelessAssociationExhausted)` only when the wireless
    /// link could not be brought up; the caller must restart the process.
    pub fn evaluate(
        &mut self,
        wifi: &mut impl WirelessPort,
        broker: &mut impl BrokerPort,
        delay: &mut impl DelayNs,
        sink: &mut impl EventSink,
    ) -> Result<SupervisorOutcome, BridgeError> {
        self.broker_attempts_this_tick = 0;

        // ── Outer: wireless ───────────────────────────────────
        if !wifi.is_associated() {
            if self.state.is_wireless_up() {
                warn!("Supervisor: wireless link lost, reassociating");
            }
            self.set_state(ConnectionState::Disconnected, sink);
            self.associate(wifi, delay, sink)?;
        } else if !self.state.is_wireless_up() {
            self.set_state(ConnectionState::WirelessUp, sink);
        }

        // ── Inner: broker ─────────────────────────────────────
        if broker.is_connected() {
            if self.state.is_broker_up() {
                return Ok(SupervisorOutcome::BrokerUp);
            }
            info!("Supervisor: broker session up");
            self.set_state(ConnectionState::BrokerUp, sink);
            return Ok(SupervisorOutcome::BrokerEstablished);
        }
        if self.state.is_broker_up() {
            warn!("Supervisor: broker session lost");
            self.set_state(ConnectionState::WirelessUp, sink);
        }
        Ok(self.connect_broker(broker, delay, sink))
    }

    // ── Internal ──────────────────────────────────────────────

    fn associate(
        &mut self,
        wifi: &mut impl WirelessPort,
        delay: &mut impl DelayNs,
        sink: &mut impl EventSink,
    ) -> Result<(), BridgeError> {
        self.set_state(ConnectionState::WirelessAssociating, sink);
        if let Err(e) = wifi.begin_association() {
            warn!("Supervisor: association start failed ({}), polling anyway", e);
        }

        let mut budget = RetryBudget::new(self.association.max_attempts);
        while budget.take() {
            delay.delay_ms(self.association.delay_ms);
            if wifi.is_associated() {
                self.association_count = self.association_count.saturating_add(1);
                let ip: Option<Ipv4Addr> = wifi.local_ip();
                info!("Supervisor: wireless associated after {} polls, IP {:?}", budget.used(), ip);
                sink.emit(&AppEvent::WirelessAssociated { ip, polls: budget.used() });
                self.set_state(ConnectionState::WirelessUp, sink);
                return Ok(());
            }
            debug!("Supervisor: association poll {}/{}", budget.used(), self.association.max_attempts);
        }

        error!(
            "Supervisor: wireless association failed after {} polls, restart required",
            budget.used()
        );
        self.set_state(ConnectionState::Disconnected, sink);
        Err(BridgeError::WirelessAssociationExhausted)
    }

    fn connect_broker(
        &mut self,
        broker: &mut impl BrokerPort,
        delay: &mut impl DelayNs,
        sink: &mut impl EventSink,
    ) -> SupervisorOutcome {
        self.set_state(ConnectionState::BrokerConnecting, sink);

        let mut budget = RetryBudget::new(self.broker.max_attempts);
        let mut code = 0;
        while budget.take() {
            self.broker_attempts_this_tick = budget.used();
            info!("Supervisor: broker connect attempt {}/{}", budget.used(), self.broker.max_attempts);
            match broker.connect() {
                Ok(()) => {
                    info!("Supervisor: broker connected");
                    self.set_state(ConnectionState::BrokerUp, sink);
                    return SupervisorOutcome::BrokerEstablished;
                }
                Err(rc) => {
                    code = rc;
                    self.broker_failures_total = self.broker_failures_total.saturating_add(1);
                    warn!("Supervisor: broker connect failed, rc={}", rc);
                    sink.emit(&AppEvent::BrokerConnectFailed { attempt: budget.used(), code: rc });
                    if !budget.exhausted() {
                        delay.delay_ms(self.broker.delay_ms);
                    }
                }
            }
        }

        self.set_state(ConnectionState::WirelessUp, sink);
        SupervisorOutcome::BrokerUnavailable { code }
    }

    fn set_state(&mut self, next: ConnectionState, sink: &mut impl EventSink) {
        if next == self.state {
            return;
        }
        let from = self.state;
        debug!("Supervisor: {} -> {}", from.name(), next.name());
        self.state = next;
        sink.emit(&AppEvent::ConnectionChanged { from, to: next });
    }
}
