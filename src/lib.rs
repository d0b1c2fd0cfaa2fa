//! Telemetry bridge library.
//!
//! Exposes the pure-logic modules for integration testing and fuzzing.
//! All ESP-IDF-specific code is guarded by `#[cfg(target_os = "espidf")]`
//! within each adapter.

#![deny(unused_must_use)]

pub mod adapters;
pub mod app;
pub mod config;
pub mod connectivity;
pub mod error;
pub mod publisher;
pub mod telemetry;
pub mod watchdog;
