//! Fuzz target: serial bytes → `LineAccumulator` → `TelemetryDecoder`
//!
//! Drives arbitrary byte streams through the line accumulator and decodes
//! every completed line in both number policies.  Asserts that nothing
//! panics, no line exceeds the buffer capacity, and a strict decode never
//! succeeds where the permissive one fails.
//!
//! cargo fuzz run fuzz_line_decoder

#![no_main]

use libfuzzer_sys::fuzz_target;
use telemetry_bridge::telemetry::decoder::{NumberPolicy, TelemetryDecoder};
use telemetry_bridge::telemetry::line::{LINE_CAPACITY, LineAccumulator};

fuzz_target!(|data: &[u8]| {
    let mut acc: LineAccumulator = LineAccumulator::new();
    let permissive = TelemetryDecoder::new(NumberPolicy::Permissive);
    let strict = TelemetryDecoder::new(NumberPolicy::Strict);

    acc.feed_slice(data, |line| {
        assert!(line.len() <= LINE_CAPACITY, "line exceeds buffer capacity");
        let lenient = permissive.decode_line(&line);
        if strict.decode_line(&line).is_ok() {
            assert!(lenient.is_ok(), "strict accepted what permissive rejected");
        }
    });
    assert!(acc.len() <= LINE_CAPACITY);

    // After a reset the accumulator must accept bytes cleanly again.
    acc.reset();
    assert!(acc.is_empty());
});
