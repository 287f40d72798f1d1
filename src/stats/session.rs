//! Lock-free counters describing the current session.

use crate::collector::types::ActivityKind;
use crate::core::animation::Advance;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Counters for the current session.
#[derive(Debug)]
pub struct SessionStats {
    /// Number of key events recorded
    key_events: AtomicU64,
    /// Number of pointer events recorded
    mouse_events: AtomicU64,
    /// Number of completed animation cycles
    cycles_completed: AtomicU64,
    /// Number of animation reselections (rerolls, state changes, reverts)
    reselections: AtomicU64,
    /// Number of interact gestures
    interactions: AtomicU64,
    /// Session start time
    session_start: DateTime<Utc>,
}

impl SessionStats {
    pub fn new() -> Self {
        Self {
            key_events: AtomicU64::new(0),
            mouse_events: AtomicU64::new(0),
            cycles_completed: AtomicU64::new(0),
            reselections: AtomicU64::new(0),
            interactions: AtomicU64::new(0),
            session_start: Utc::now(),
        }
    }

    /// Record one activity event of the given kind.
    pub fn record_activity(&self, kind: ActivityKind) {
        let counter = match kind {
            ActivityKind::Key => &self.key_events,
            ActivityKind::Mouse => &self.mouse_events,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    /// Record the outcome of a frame advance.
    pub fn record_advance(&self, advance: &Advance) {
        match advance {
            Advance::Frame => {}
            Advance::Cycle(_) => {
                self.cycles_completed.fetch_add(1, Ordering::Relaxed);
            }
            Advance::Reselected { .. } => {
                // Every reselection from a tick ends a cycle, Interact reverts included.
                self.cycles_completed.fetch_add(1, Ordering::Relaxed);
                self.reselections.fetch_add(1, Ordering::Relaxed);
            }
        }
    }

    /// Record an interact gesture.
    pub fn record_interaction(&self) {
        self.interactions.fetch_add(1, Ordering::Relaxed);
    }

    /// Current counter values.
    pub fn summary(&self) -> SessionSummary {
        SessionSummary {
            key_events: self.key_events.load(Ordering::Relaxed),
            mouse_events: self.mouse_events.load(Ordering::Relaxed),
            cycles_completed: self.cycles_completed.load(Ordering::Relaxed),
            reselections: self.reselections.load(Ordering::Relaxed),
            interactions: self.interactions.load(Ordering::Relaxed),
            session_start: self.session_start,
            session_duration_secs: (Utc::now() - self.session_start).num_seconds().max(0) as u64,
        }
    }

    /// Human-readable summary for the end of a session.
    pub fn report(&self) -> String {
        let summary = self.summary();
        format!(
            "Session Statistics:\n\
             - Key events recorded: {}\n\
             - Mouse events recorded: {}\n\
             - Animation cycles completed: {}\n\
             - Animations reselected: {}\n\
             - Interactions: {}\n\
             - Session duration: {} seconds",
            summary.key_events,
            summary.mouse_events,
            summary.cycles_completed,
            summary.reselections,
            summary.interactions,
            summary.session_duration_secs
        )
    }
}

impl Default for SessionStats {
    fn default() -> Self {
        Self::new()
    }
}

/// Snapshot of session counters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionSummary {
    pub key_events: u64,
    pub mouse_events: u64,
    pub cycles_completed: u64,
    pub reselections: u64,
    pub interactions: u64,
    pub session_start: DateTime<Utc>,
    pub session_duration_secs: u64,
}

/// Thread-safe shared session stats.
pub type SharedSessionStats = Arc<SessionStats>;

/// Create new shared session stats.
pub fn create_shared_stats() -> SharedSessionStats {
    Arc::new(SessionStats::new())
}
