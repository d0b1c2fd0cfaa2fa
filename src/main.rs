//! Telemetry bridge firmware entry point.
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────┐
//! │                      Adapters (outer ring)                     │
//! │                                                                │
//! │  UartLink       WifiAdapter     MqttAdapter   MonotonicClock   │
//! │  (ByteSource)   (WirelessPort)  (BrokerPort)  (Clock)          │
//! │  LogEventSink (EventSink)       FreeRtos (DelayNs)             │
//! │                                                                │
//! │  ──────────────── Port Trait Boundary ───────────────────      │
//! │                                                                │
//! │  ┌────────────────────────────────────────────────────────┐    │
//! │  │                 Bridge (pure logic)                    │    │
//! │  │  Lines · Decoder · Validator · Supervisor · Watchdog   │    │
//! │  └────────────────────────────────────────────────────────┘    │
//! └────────────────────────────────────────────────────────────────┘
//! ```
#![deny(unused_must_use)]

use anyhow::Result;
use log::{error, info};

use esp_idf_svc::eventloop::EspSystemEventLoop;
use esp_idf_svc::hal::delay::FreeRtos;
use esp_idf_svc::hal::gpio::AnyIOPin;
use esp_idf_svc::hal::prelude::Peripherals;
use esp_idf_svc::hal::uart::{UartDriver, config::Config};
use esp_idf_svc::hal::units::Hertz;
use esp_idf_svc::nvs::EspDefaultNvsPartition;
use esp_idf_svc::wifi::EspWifi;

use telemetry_bridge::adapters::log_sink::LogEventSink;
use telemetry_bridge::adapters::mqtt::MqttAdapter;
use telemetry_bridge::adapters::time::MonotonicClock;
use telemetry_bridge::adapters::uart::UartLink;
use telemetry_bridge::adapters::wifi::WifiAdapter;
use telemetry_bridge::app::ports::Clock;
use telemetry_bridge::app::service::{Bridge, TickContext};
use telemetry_bridge::config::BridgeConfig;

// ── Main ──────────────────────────────────────────────────────

fn main() -> Result<()> {
    // ── 1. ESP-IDF bootstrap ──────────────────────────────────
    esp_idf_svc::sys::link_patches();
    esp_idf_logger::init()?;

    info!("╔══════════════════════════════════════╗");
    info!("║  Telemetry bridge v{}             ║", env!("CARGO_PKG_VERSION"));
    info!("╚══════════════════════════════════════╝");

    // ── 2. Configuration ──────────────────────────────────────
    let config = BridgeConfig::load()?;
    info!(
        "Config: ssid='{}' broker={} baud={}",
        config.wifi_ssid,
        config.broker_url(),
        config.uart_baud
    );

    // Give the sensor controller time to boot before listening.
    FreeRtos::delay_ms(config.startup_delay_ms);

    // ── 3. Peripherals ────────────────────────────────────────
    let peripherals = Peripherals::take()?;
    let sysloop = EspSystemEventLoop::take()?;
    let nvs = EspDefaultNvsPartition::take()?;

    let uart = UartDriver::new(
        peripherals.uart1,
        peripherals.pins.gpio17, // TX
        peripherals.pins.gpio18, // RX
        Option::<AnyIOPin>::None,
        Option::<AnyIOPin>::None,
        &Config::default().baudrate(Hertz(config.uart_baud)),
    )?;
    info!("UART1 initialised at {} baud", config.uart_baud);

    // ── 4. Adapters ───────────────────────────────────────────
    let mut serial = UartLink::new(uart);
    let mut wifi = WifiAdapter::new(EspWifi::new(peripherals.modem, sysloop, Some(nvs))?, &config);
    let mut broker = MqttAdapter::new(&config);
    let clock = MonotonicClock::new();
    let mut delay = FreeRtos;
    let mut sink = LogEventSink::new();

    // ── 5. Bridge ─────────────────────────────────────────────
    let mut bridge = Bridge::new(&config, clock.now_ms());
    bridge.start(&mut sink);

    // ── 6. Main loop ──────────────────────────────────────────
    loop {
        let mut cx = TickContext {
            serial: &mut serial,
            wifi: &mut wifi,
            broker: &mut broker,
            clock: &clock,
            delay: &mut delay,
            sink: &mut sink,
        };
        if let Err(e) = bridge.tick(&mut cx) {
            error!("Fatal: {} ({:?}), restarting", e, bridge.stats());
            FreeRtos::delay_ms(100);
            esp_idf_svc::hal::reset::restart();
        }
        bridge.idle(&mut delay);
    }
}
