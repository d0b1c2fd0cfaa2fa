//! Range policy for decoded records.
//!
//! Only the mandatory readings are checked.  A record with either reading
//! out of range is discarded whole; there is no partial publish.

use crate::config::ValidationLimits;
use crate::error::{Field, ValidationError};

use super::TelemetryRecord;

#[derive(Debug, Clone, Copy, Default)]
pub struct Validator {
    limits: ValidationLimits,
}

impl Validator {
    pub fn new(limits: ValidationLimits) -> Self {
        Self { limits }
    }

    /// Accept the record if temperature and humidity lie within their
    /// inclusive limits.  NaN is always out of range.
    pub fn validate(&self, record: TelemetryRecord) -> Result<TelemetryRecord, ValidationError> {
        let l = &self.limits;
        check(Field::Temperature, record.temperature_c, l.min_temperature_c, l.max_temperature_c)?;
        check(Field::Humidity, record.humidity_pct, l.min_humidity_pct, l.max_humidity_pct)?;
        Ok(record)
    }
}

fn check(field: Field, value: f32, min: f32, max: f32) -> Result<(), ValidationError> {
    if (min..=max).contains(&value) {
        Ok(())
    } else {
        Err(ValidationError::OutOfRange { field, value })
    }
}
