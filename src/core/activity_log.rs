//! Time-bounded activity ledger shared by the input producers and the
//! animation timer.
//!
//! Every append evicts entries older than the retention window from the
//! front of the log, so memory stays bounded by the retention window times
//! the worst-case event rate. Events evicted this way are gone for good:
//! a count over a window longer than the retention only sees what is left.

use crate::collector::types::{ActivityEvent, ActivityKind};
use chrono::{DateTime, Duration, Utc};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Default retention window in minutes.
pub const DEFAULT_RETENTION_MINUTES: f64 = 15.0;

/// Convert a (possibly fractional) number of minutes into a duration.
///
/// Negative and non-finite inputs map to zero. Values past the range of
/// [`Duration`] saturate at [`Duration::MAX`].
pub fn minutes(value: f64) -> Duration {
    if !value.is_finite() || value <= 0.0 {
        return Duration::zero();
    }
    // `as` saturates at i64::MAX for out-of-range floats.
    Duration::try_milliseconds((value * 60_000.0).round() as i64).unwrap_or(Duration::MAX)
}

/// Thread-safe, insertion-ordered activity log.
#[derive(Debug)]
pub struct ActivityLog {
    retention: Duration,
    entries: Mutex<VecDeque<ActivityEvent>>,
}

impl ActivityLog {
    /// Create an empty log with the default 15 minute retention.
    pub fn new() -> Self {
        Self::with_retention(minutes(DEFAULT_RETENTION_MINUTES))
    }

    /// Create an empty log with a custom retention window.
    pub fn with_retention(retention: Duration) -> Self {
        Self {
            retention: retention.max(Duration::zero()),
            entries: Mutex::new(VecDeque::new()),
        }
    }

    /// Retention window of this log.
    pub fn retention(&self) -> Duration {
        self.retention
    }

    /// Record an event of the given kind stamped now.
    pub fn record(&self, kind: ActivityKind) {
        self.record_at(kind, Utc::now());
    }

    /// Record an event with an explicit timestamp, then evict everything
    /// older than `at - retention`.
    ///
    /// A retention reaching before the earliest representable timestamp
    /// evicts nothing.
    pub fn record_at(&self, kind: ActivityKind, at: DateTime<Utc>) {
        let cutoff = at.checked_sub_signed(self.retention);
        let mut entries = self.lock();
        entries.push_back(ActivityEvent::at(kind, at));
        let Some(cutoff) = cutoff else {
            return;
        };
        while entries.front().is_some_and(|e| e.timestamp < cutoff) {
            entries.pop_front();
        }
    }

    /// Count events newer than `now - window_minutes`, optionally filtered
    /// by kind.
    pub fn count_within(&self, window_minutes: f64, kind: Option<ActivityKind>) -> usize {
        self.count_within_at(window_minutes, kind, Utc::now())
    }

    /// Count events newer than `now - window_minutes` as of an explicit
    /// `now`. The look-back never reaches past the retention window.
    pub fn count_within_at(
        &self,
        window_minutes: f64,
        kind: Option<ActivityKind>,
        now: DateTime<Utc>,
    ) -> usize {
        let window = minutes(window_minutes).min(self.retention);
        if window <= Duration::zero() {
            return 0;
        }
        let cutoff = now.checked_sub_signed(window);

        self.lock()
            .iter()
            .filter(|e| cutoff.map_or(true, |cutoff| e.timestamp > cutoff) && e.matches(kind))
            .count()
    }

    /// Number of entries currently retained.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Whether the log holds no entries.
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Timestamp of the oldest retained entry.
    pub fn oldest(&self) -> Option<DateTime<Utc>> {
        self.lock().front().map(|e| e.timestamp)
    }

    // Every mutation is a single push or pop, so the deque is consistent
    // even if a holder panicked.
    fn lock(&self) -> MutexGuard<'_, VecDeque<ActivityEvent>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for ActivityLog {
    fn default() -> Self {
        Self::new()
    }
}

/// Activity log shared between producers and the classifier.
pub type SharedActivityLog = Arc<ActivityLog>;

/// Create a new shared activity log with the given retention in minutes.
pub fn create_shared_log(retention_minutes: f64) -> SharedActivityLog {
    Arc::new(ActivityLog::with_retention(minutes(retention_minutes)))
}
