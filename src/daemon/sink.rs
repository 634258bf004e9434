use std::sync::atomic::{AtomicI64, Ordering};

use chrono::{DateTime, Local, TimeZone};

const EMPTY: i64 = i64::MIN;

/// Holds the timestamp of the most recent activity evidence seen by this
/// process. The input listener and the activity signal watcher store into
/// it, the tracker loop reads it at each window boundary.
///
/// The slot is a single atomic word holding epoch milliseconds, so the
/// signal-driven producer never needs a lock or an allocation. Last writer
/// wins, which is enough since only recency matters.
pub struct EvidenceSink {
    last_activity_ms: AtomicI64,
}

impl EvidenceSink {
    pub fn new() -> Self {
        Self {
            last_activity_ms: AtomicI64::new(EMPTY),
        }
    }

    /// Unconditionally stamps the sink with `at`.
    pub fn record(&self, at: DateTime<Local>) {
        self.last_activity_ms
            .store(at.timestamp_millis(), Ordering::Relaxed);
    }

    /// Current value, `None` before any evidence arrived. Reading never
    /// clears the slot: silence after a burst of evidence classifies later
    /// windows as inactive on its own.
    pub fn peek(&self) -> Option<DateTime<Local>> {
        match self.last_activity_ms.load(Ordering::Relaxed) {
            EMPTY => None,
            ms => Local.timestamp_millis_opt(ms).single(),
        }
    }
}

impl Default for EvidenceSink {
    fn default() -> Self {
        Self::new()
    }
}
