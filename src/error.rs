//! Unified error types for the telemetry bridge.
//!
//! A single [`BridgeError`] enum that every pipeline stage converts into,
//! keeping the tick loop's error handling uniform.  All variants are `Copy`
//! so they can be passed through the event sink without allocation.
//!
//! Only [`BridgeError::WirelessAssociationExhausted`] is fatal; everything
//! else is handled by dropping the offending unit of data and logging.

use core::fmt;

// ---------------------------------------------------------------------------
// Top-level bridge error
// ---------------------------------------------------------------------------

/// Every failure the bridge can observe funnels into this type.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BridgeError {
    /// A byte arrived while the line buffer was full and was dropped.
    BufferOverflow,
    /// A complete line could not be decoded.
    Decode(DecodeError),
    /// A decoded record failed the range policy.
    Validation(ValidationError),
    /// A publish was skipped because the broker session is not up.
    NotConnected,
    /// The wireless link could not be associated within the poll budget.
    WirelessAssociationExhausted,
    /// Every broker connect attempt in this tick failed.
    BrokerConnectFailed { code: i32 },
}

impl BridgeError {
    /// Whether the error requires a full process restart.
    pub const fn is_fatal(&self) -> bool {
        matches!(self, Self::WirelessAssociationExhausted)
    }
}

impl fmt::Display for BridgeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::BufferOverflow => write!(f, "line buffer overflow"),
            Self::Decode(e) => write!(f, "decode: {e}"),
            Self::Validation(e) => write!(f, "validation: {e}"),
            Self::NotConnected => write!(f, "broker not connected"),
            Self::WirelessAssociationExhausted => write!(f, "wireless association exhausted"),
            Self::BrokerConnectFailed { code } => write!(f, "broker connect failed, rc={code}"),
        }
    }
}

impl std::error::Error for BridgeError {}

// ---------------------------------------------------------------------------
// Field names
// ---------------------------------------------------------------------------

/// The five fields of the telemetry line schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    Temperature,
    Humidity,
    Rpm,
    Gas,
    ObjectCount,
}

impl Field {
    pub const fn name(self) -> &'static str {
        match self {
            Self::Temperature => "temperature",
            Self::Humidity => "humidity",
            Self::Rpm => "rpm",
            Self::Gas => "gas",
            Self::ObjectCount => "object_count",
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ---------------------------------------------------------------------------
// Decode errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodeError {
    /// Line shorter than the minimum decodable length.
    TooShort { len: usize },
    /// `T:` or `,H:` marker absent.
    MissingMandatoryField(Field),
    /// Strict mode only: a present field had no parsable number.
    InvalidNumber(Field),
}

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TooShort { len } => write!(f, "line too short ({len} bytes)"),
            Self::MissingMandatoryField(field) => write!(f, "missing mandatory field {field}"),
            Self::InvalidNumber(field) => write!(f, "unparsable number in field {field}"),
        }
    }
}

impl From<DecodeError> for BridgeError {
    fn from(e: DecodeError) -> Self {
        Self::Decode(e)
    }
}

// ---------------------------------------------------------------------------
// Validation errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ValidationError {
    /// A mandatory reading lies outside its plausible range.
    OutOfRange { field: Field, value: f32 },
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OutOfRange { field, value } => write!(f, "{field} out of range ({value})"),
        }
    }
}

impl From<ValidationError> for BridgeError {
    fn from(e: ValidationError) -> Self {
        Self::Validation(e)
    }
}

// ---------------------------------------------------------------------------
// Port errors
// ---------------------------------------------------------------------------

/// Errors from the serial byte source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkError {
    /// The driver reported a read failure (carries the platform code).
    ReadFailed(i32),
}

impl fmt::Display for LinkError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ReadFailed(code) => write!(f, "serial read failed (rc={code})"),
        }
    }
}

/// Errors from the wireless station.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WirelessError {
    /// The driver refused the station configuration.
    ConfigRejected,
    /// Starting the driver or the association failed (carries the platform code).
    StartFailed(i32),
}

impl fmt::Display for WirelessError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ConfigRejected => write!(f, "station configuration rejected"),
            Self::StartFailed(code) => write!(f, "association start failed (rc={code})"),
        }
    }
}

/// Errors from a single broker publish.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PublishError {
    /// The session dropped before or during the send.
    Disconnected,
    /// The client rejected the message (carries the platform code).
    Rejected(i32),
}

impl fmt::Display for PublishError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Disconnected => write!(f, "session disconnected"),
            Self::Rejected(code) => write!(f, "publish rejected (rc={code})"),
        }
    }
}

// ---------------------------------------------------------------------------
// Convenience Result alias
// ---------------------------------------------------------------------------

/// Bridge-wide `Result` alias.
pub type Result<T> = core::result::Result<T, BridgeError>;
