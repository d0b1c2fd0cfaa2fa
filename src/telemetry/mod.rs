//! Telemetry pipeline: raw serial bytes to validated records.
//!
//! ```text
//!  bytes ──▶ LineAccumulator ──▶ TelemetryDecoder ──▶ Validator ──▶ record
//! ```
//!
//! Every stage is pure: no I/O, no clocks, no globals.  The
//! [`Bridge`](crate::app::service::Bridge) drives the stages and decides
//! what to do with each outcome.

pub mod decoder;
pub mod line;
pub mod validator;

/// One decoded telemetry sample.
///
/// Temperature and humidity are always present.  The optional fields carry
/// their presence flag as `Option`: `Some(0.0)` means the marker was present
/// but its value could not be parsed.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct TelemetryRecord {
    /// Degrees Celsius.
    pub temperature_c: f32,
    /// Relative humidity, percent.
    pub humidity_pct: f32,
    pub rpm: Option<f32>,
    pub gas: Option<f32>,
    pub object_count: Option<i32>,
}

impl TelemetryRecord {
    /// Number of data points this record produces when published.
    pub fn point_count(&self) -> usize {
        2 + usize::from(self.rpm.is_some())
            + usize::from(self.gas.is_some())
            + usize::from(self.object_count.is_some())
    }
}
