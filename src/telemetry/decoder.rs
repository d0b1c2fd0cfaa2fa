//! Telemetry line decoder.
//!
//! Line format:
//! ```text
//! T:<float>,H:<float>[,R:<float>][,G:<float>][,O:<int>]
//! ```
//!
//! Decoding is a small ordered tokenizer: every marker is located once (first
//! occurrence), the present markers are sorted by position, and each field's
//! value runs from just past its marker to the start of the next present
//! marker, or to end-of-line.
//!
//! Numbers are converted permissively by default: the longest leading
//! numeric prefix is used, and a value with no numeric prefix becomes zero
//! while the field stays present.  [`NumberPolicy::Strict`] turns that case
//! into [`DecodeError::InvalidNumber`].

use log::{debug, warn};

use super::TelemetryRecord;
use super::line::Line;
use crate::error::{DecodeError, Field};

/// Lines shorter than this are rejected before any scanning.
pub const MIN_LINE_LEN: usize = 5;

/// Marker table in schema order.
const MARKERS: [(Field, &str); 5] = [
    (Field::Temperature, "T:"),
    (Field::Humidity, ",H:"),
    (Field::Rpm, ",R:"),
    (Field::Gas, ",G:"),
    (Field::ObjectCount, ",O:"),
];

/// What to do with a present field whose value has no numeric prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NumberPolicy {
    /// Substitute zero and keep the field present.
    #[default]
    Permissive,
    /// Reject the whole line.
    Strict,
}

/// A located marker.
#[derive(Debug, Clone, Copy)]
struct Token {
    field: Field,
    /// Byte offset of the marker itself.
    at: usize,
    /// Byte offset just past the marker.
    value_at: usize,
}

/// Stateless line decoder.
#[derive(Debug, Clone, Copy, Default)]
pub struct TelemetryDecoder {
    policy: NumberPolicy,
}

impl TelemetryDecoder {
    pub fn new(policy: NumberPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> NumberPolicy {
        self.policy
    }

    /// Decode a line straight from the accumulator.
    ///
    /// The length gate counts raw bytes, before invalid UTF-8 is replaced.
    pub fn decode_line<const N: usize>(&self, line: &Line<N>) -> Result<TelemetryRecord, DecodeError> {
        if line.len() < MIN_LINE_LEN {
            return Err(DecodeError::TooShort { len: line.len() });
        }
        self.decode(&line.as_text())
    }

    /// Decode one line (terminator already stripped).
    pub fn decode(&self, line: &str) -> Result<TelemetryRecord, DecodeError> {
        if line.len() < MIN_LINE_LEN {
            return Err(DecodeError::TooShort { len: line.len() });
        }

        let tokens = tokenize(line);
        for mandatory in [Field::Temperature, Field::Humidity] {
            if !tokens.iter().any(|t| t.field == mandatory) {
                return Err(DecodeError::MissingMandatoryField(mandatory));
            }
        }

        let mut record = TelemetryRecord::default();
        for (i, tok) in tokens.iter().enumerate() {
            let end = tokens.get(i + 1).map_or(line.len(), |next| next.at);
            let raw = &line[tok.value_at..end.max(tok.value_at)];

            match tok.field {
                Field::Temperature => record.temperature_c = self.float(tok.field, raw)?,
                Field::Humidity => record.humidity_pct = self.float(tok.field, raw)?,
                Field::Rpm => record.rpm = Some(self.float(tok.field, raw)?),
                Field::Gas => record.gas = Some(self.float(tok.field, raw)?),
                Field::ObjectCount => record.object_count = Some(self.int(tok.field, raw)?),
            }
        }

        debug!(
            "Decoded: T={:.2} H={:.2} R={:?} G={:?} O={:?}",
            record.temperature_c, record.humidity_pct, record.rpm, record.gas, record.object_count
        );
        Ok(record)
    }

    fn float(&self, field: Field, raw: &str) -> Result<f32, DecodeError> {
        match leading_float(raw) {
            Some(v) => Ok(v),
            None => self.fallback(field, raw).map(|()| 0.0),
        }
    }

    fn int(&self, field: Field, raw: &str) -> Result<i32, DecodeError> {
        match leading_int(raw) {
            Some(v) => Ok(v),
            None => self.fallback(field, raw).map(|()| 0),
        }
    }

    fn fallback(&self, field: Field, raw: &str) -> Result<(), DecodeError> {
        match self.policy {
            NumberPolicy::Permissive => {
                warn!("Decoder: unparsable {} value {:?}, substituting 0", field, raw);
                Ok(())
            }
            NumberPolicy::Strict => Err(DecodeError::InvalidNumber(field)),
        }
    }
}

/// Locate every present marker (first occurrence) and sort by position.
fn tokenize(line: &str) -> heapless::Vec<Token, 5> {
    let mut tokens: heapless::Vec<Token, 5> = heapless::Vec::new();
    for (field, marker) in MARKERS {
        if let Some(at) = line.find(marker) {
            let pushed = tokens.push(Token {
                field,
                at,
                value_at: at + marker.len(),
            });
            debug_assert!(pushed.is_ok(), "token table sized to the marker count");
        }
    }
    tokens.sort_unstable_by_key(|t| t.at);
    tokens
}

/// Longest leading decimal float (optional sign, fraction and exponent),
/// after leading whitespace.  `None` if there is no digit to parse.
fn leading_float(raw: &str) -> Option<f32> {
    let s = raw.trim_start();
    let b = s.as_bytes();

    let mut end = usize::from(matches!(b.first(), Some(b'+' | b'-')));
    let mut digits = false;
    let mut dot = false;
    while let Some(&c) = b.get(end) {
        match c {
            b'0'..=b'9' => digits = true,
            b'.' if !dot => dot = true,
            _ => break,
        }
        end += 1;
    }
    if !digits {
        return None;
    }

    if matches!(b.get(end), Some(b'e' | b'E')) {
        let mut j = end + 1;
        if matches!(b.get(j), Some(b'+' | b'-')) {
            j += 1;
        }
        let exp_start = j;
        while b.get(j).is_some_and(u8::is_ascii_digit) {
            j += 1;
        }
        if j > exp_start {
            end = j;
        }
    }

    s[..end].parse::<f32>().ok()
}

/// Longest leading decimal integer (optional sign), after leading
/// whitespace.  Saturates at the `i32` bounds.
fn leading_int(raw: &str) -> Option<i32> {
    let s = raw.trim_start();
    let b = s.as_bytes();

    let negative = b.first() == Some(&b'-');
    let start = usize::from(matches!(b.first(), Some(b'+' | b'-')));
    let digits = b[start..].iter().take_while(|c| c.is_ascii_digit());

    let mut value: i64 = 0;
    let mut any = false;
    for &d in digits {
        any = true;
        value = (value * 10 + i64::from(d - b'0')).min(i64::from(i32::MAX) + 1);
    }
    if !any {
        return None;
    }
    let value = if negative { -value } else { value };
    Some(value.clamp(i64::from(i32::MIN), i64::from(i32::MAX)) as i32)
}
