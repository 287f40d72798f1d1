//! Behavior classification from recent activity counts.
//!
//! A short window detects bursts of fast typing (Active). A long window
//! detects sustained low keyboard and pointer activity (Lazy). Anything in
//! between is Idle.

use crate::collector::types::ActivityKind;
use crate::core::activity_log::SharedActivityLog;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Discrete behavioral state driving which animation plays.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BehaviorState {
    Idle,
    Active,
    Lazy,
    /// Transient override entered on direct interaction.
    Interact,
}

impl BehaviorState {
    /// All states, in a stable order.
    pub const ALL: [BehaviorState; 4] = [
        BehaviorState::Idle,
        BehaviorState::Active,
        BehaviorState::Lazy,
        BehaviorState::Interact,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            BehaviorState::Idle => "idle",
            BehaviorState::Active => "active",
            BehaviorState::Lazy => "lazy",
            BehaviorState::Interact => "interact",
        }
    }
}

impl fmt::Display for BehaviorState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Window lengths and rate thresholds for classification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifierConfig {
    /// Short look-back window in minutes
    pub active_window_minutes: f64,
    /// Keys per minute above which the short window counts as Active
    pub active_keys_per_minute: f64,
    /// Long look-back window in minutes
    pub lazy_window_minutes: f64,
    /// Keys per minute below which the long window may count as Lazy
    pub lazy_keys_per_minute: f64,
    /// Pointer moves per minute below which the long window may count as Lazy
    pub lazy_moves_per_minute: f64,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            active_window_minutes: 0.25,
            active_keys_per_minute: 200.0,
            lazy_window_minutes: 5.0,
            lazy_keys_per_minute: 50.0,
            lazy_moves_per_minute: 250.0,
        }
    }
}

impl ClassifierConfig {
    /// Key count the short window must strictly exceed to be Active.
    pub fn active_key_threshold(&self) -> f64 {
        self.active_window_minutes * self.active_keys_per_minute
    }

    /// Key count the long window must stay under to be Lazy.
    pub fn lazy_key_threshold(&self) -> f64 {
        self.lazy_window_minutes * self.lazy_keys_per_minute
    }

    /// Move count the long window must stay under to be Lazy.
    pub fn lazy_move_threshold(&self) -> f64 {
        self.lazy_window_minutes * self.lazy_moves_per_minute
    }
}

/// Counts queried from the log for one classification.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivityCounts {
    pub short_keys: usize,
    /// `None` when the short window already decided Active.
    pub long_keys: Option<usize>,
    pub long_moves: Option<usize>,
}

/// Source of the next behavioral state, consulted once per completed cycle.
pub trait BehaviorClassifier: Send {
    fn classify(&self) -> BehaviorState;
}

/// Classifier backed by the shared activity log.
pub struct ActivityClassifier {
    log: SharedActivityLog,
    config: ClassifierConfig,
}

impl ActivityClassifier {
    pub fn new(log: SharedActivityLog, config: ClassifierConfig) -> Self {
        Self { log, config }
    }

    pub fn config(&self) -> &ClassifierConfig {
        &self.config
    }

    /// Query the counts needed to classify as of `now`.
    ///
    /// The long window is only scanned when the short window is not
    /// already above the Active threshold.
    pub fn counts_at(&self, now: DateTime<Utc>) -> ActivityCounts {
        let short_keys = self.log.count_within_at(
            self.config.active_window_minutes,
            Some(ActivityKind::Key),
            now,
        );
        if short_keys as f64 > self.config.active_key_threshold() {
            return ActivityCounts {
                short_keys,
                long_keys: None,
                long_moves: None,
            };
        }

        let window = self.config.lazy_window_minutes;
        ActivityCounts {
            short_keys,
            long_keys: Some(self.log.count_within_at(window, Some(ActivityKind::Key), now)),
            long_moves: Some(self.log.count_within_at(window, Some(ActivityKind::Mouse), now)),
        }
    }

    /// Map counts to a state. Active wins over everything; the comparison
    /// against the Active threshold is strict.
    pub fn decide(&self, counts: &ActivityCounts) -> BehaviorState {
        if counts.short_keys as f64 > self.config.active_key_threshold() {
            return BehaviorState::Active;
        }

        let long_keys = counts.long_keys.unwrap_or(0) as f64;
        let long_moves = counts.long_moves.unwrap_or(0) as f64;
        if long_keys < self.config.lazy_key_threshold()
            && long_moves < self.config.lazy_move_threshold()
        {
            BehaviorState::Lazy
        } else {
            BehaviorState::Idle
        }
    }

    /// Classify the activity as of `now`.
    pub fn classify_at(&self, now: DateTime<Utc>) -> BehaviorState {
        let counts = self.counts_at(now);
        let state = self.decide(&counts);
        tracing::debug!(
            short_keys = counts.short_keys,
            long_keys = ?counts.long_keys,
            long_moves = ?counts.long_moves,
            %state,
            "classified activity"
        );
        state
    }
}

impl BehaviorClassifier for ActivityClassifier {
    fn classify(&self) -> BehaviorState {
        self.classify_at(Utc::now())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::activity_log::{create_shared_log, DEFAULT_RETENTION_MINUTES};
    use chrono::Duration;

    fn classifier() -> (SharedActivityLog, ActivityClassifier) {
        let log = create_shared_log(DEFAULT_RETENTION_MINUTES);
        let classifier = ActivityClassifier::new(log.clone(), ClassifierConfig::default());
        (log, classifier)
    }

    /// Record `count` events spread evenly over the `span` ending just before `now`.
    fn spread(log: &SharedActivityLog, kind: ActivityKind, count: i64, span: Duration, now: DateTime<Utc>) {
        let step = span.num_milliseconds() / count;
        for i in (0..count).rev() {
            log.record_at(kind, now - Duration::milliseconds(i * step));
        }
    }

    #[test]
    fn test_empty_log_is_lazy() {
        let (_log, classifier) = classifier();
        assert_eq!(classifier.classify_at(Utc::now()), BehaviorState::Lazy);
    }

    #[test]
    fn test_fast_typing_is_active() {
        let (log, classifier) = classifier();
        let now = Utc::now();
        spread(&log, ActivityKind::Key, 60, Duration::seconds(10), now);

        assert_eq!(classifier.classify_at(now), BehaviorState::Active);
        let counts = classifier.counts_at(now);
        assert_eq!(counts.short_keys, 60);
        assert_eq!(counts.long_keys, None);
    }

    #[test]
    fn test_active_threshold_is_strict() {
        let (log, classifier) = classifier();
        let now = Utc::now();
        // Exactly 0.25 * 200 = 50 keys in the short window.
        spread(&log, ActivityKind::Key, 50, Duration::seconds(10), now);

        assert_eq!(classifier.classify_at(now), BehaviorState::Lazy);

        log.record_at(ActivityKind::Key, now);
        assert_eq!(classifier.classify_at(now), BehaviorState::Active);
    }

    #[test]
    fn test_sparse_activity_is_lazy() {
        let (log, classifier) = classifier();
        let now = Utc::now();
        spread(&log, ActivityKind::Key, 5, Duration::minutes(5), now);
        spread(&log, ActivityKind::Mouse, 10, Duration::minutes(5), now);

        assert_eq!(classifier.classify_at(now), BehaviorState::Lazy);
    }

    #[test]
    fn test_steady_typing_is_idle() {
        let (log, classifier) = classifier();
        let now = Utc::now();
        // One key per second: 15 in the short window, 300 >= 250 in the long one.
        spread(&log, ActivityKind::Key, 300, Duration::minutes(5), now);

        assert_eq!(classifier.classify_at(now), BehaviorState::Idle);
    }

    #[test]
    fn test_heavy_pointer_use_is_idle() {
        let (log, classifier) = classifier();
        let now = Utc::now();
        spread(&log, ActivityKind::Mouse, 1_250, Duration::minutes(5), now);

        assert_eq!(classifier.classify_at(now), BehaviorState::Idle);
    }

    #[test]
    fn test_burst_overrides_lazy_history() {
        let (log, classifier) = classifier();
        let now = Utc::now();
        spread(&log, ActivityKind::Key, 3, Duration::minutes(5), now - Duration::seconds(30));
        spread(&log, ActivityKind::Key, 80, Duration::seconds(12), now);

        assert_eq!(classifier.classify_at(now), BehaviorState::Active);
    }

    #[test]
    fn test_thresholds_from_config() {
        let config = ClassifierConfig::default();
        assert_eq!(config.active_key_threshold(), 50.0);
        assert_eq!(config.lazy_key_threshold(), 250.0);
        assert_eq!(config.lazy_move_threshold(), 1250.0);
    }
}
