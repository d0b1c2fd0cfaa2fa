//! Data-staleness watchdog.
//!
//! Tracks the time since the last successfully decoded line.  When the
//! silence exceeds the threshold, [`Watchdog::check`] reports one
//! [`StaleEvent`] and restarts the interval from "now", so a continuous
//! silence produces one event per threshold interval rather than one per
//! tick.

/// One staleness report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StaleEvent {
    /// Milliseconds since the last decoded line (or the previous event).
    pub silent_ms: u64,
}

pub struct Watchdog {
    threshold_ms: u64,
    last_seen_ms: u64,
    stale: bool,
    events: u32,
}

impl Watchdog {
    /// Start watching at `now_ms`.
    pub fn new(now_ms: u64, threshold_ms: u64) -> Self {
        Self {
            threshold_ms,
            last_seen_ms: now_ms,
            stale: false,
            events: 0,
        }
    }

    /// A line decoded successfully at `now_ms`.
    pub fn mark_seen(&mut self, now_ms: u64) {
        self.last_seen_ms = now_ms;
        self.stale = false;
    }

    /// Sample once per tick.
    pub fn check(&mut self, now_ms: u64) -> Option<StaleEvent> {
        let silent_ms = now_ms.saturating_sub(self.last_seen_ms);
        if silent_ms <= self.threshold_ms {
            return None;
        }
        self.last_seen_ms = now_ms;
        self.stale = true;
        self.events = self.events.saturating_add(1);
        Some(StaleEvent { silent_ms })
    }

    /// Whether no line has been decoded since the last staleness event.
    pub fn is_stale(&self) -> bool {
        self.stale
    }

    pub fn last_seen_ms(&self) -> u64 {
        self.last_seen_ms
    }

    pub fn threshold_ms(&self) -> u64 {
        self.threshold_ms
    }

    /// Staleness events since startup.
    pub fn events(&self) -> u32 {
        self.events
    }
}
