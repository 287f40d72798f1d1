//! Activity event types recorded by the input producers.
//!
//! Only the device class and the time of the event are kept. Key codes and
//! cursor coordinates never leave the collector.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Which device classes to listen to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectorConfig {
    pub capture_keyboard: bool,
    pub capture_mouse: bool,
}

impl Default for CollectorConfig {
    fn default() -> Self {
        Self {
            capture_keyboard: true,
            capture_mouse: true,
        }
    }
}

impl CollectorConfig {
    /// Device classes that get a producer thread.
    pub fn kinds(&self) -> Vec<ActivityKind> {
        let mut kinds = Vec::new();
        if self.capture_keyboard {
            kinds.push(ActivityKind::Key);
        }
        if self.capture_mouse {
            kinds.push(ActivityKind::Mouse);
        }
        kinds
    }
}

/// Errors that can occur while starting event collection.
#[derive(Debug, Error)]
pub enum CollectorError {
    #[error("collector is already running")]
    AlreadyRunning,
    #[error("input monitoring permission not granted")]
    PermissionDenied,
    #[error("failed to spawn {0} listener thread: {1}")]
    Spawn(ActivityKind, std::io::Error),
    #[error("{0} listener exited before its event tap was ready")]
    ListenerExited(ActivityKind),
}

/// Device class an activity event came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActivityKind {
    /// A key press
    Key,
    /// A pointer movement (including drags)
    Mouse,
}

impl fmt::Display for ActivityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ActivityKind::Key => write!(f, "key"),
            ActivityKind::Mouse => write!(f, "mouse"),
        }
    }
}

/// A single recorded activity event. Immutable once recorded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivityEvent {
    pub kind: ActivityKind,
    pub timestamp: DateTime<Utc>,
}

impl ActivityEvent {
    /// Create an event stamped with the current time.
    pub fn new(kind: ActivityKind) -> Self {
        Self::at(kind, Utc::now())
    }

    /// Create an event with an explicit timestamp.
    pub fn at(kind: ActivityKind, timestamp: DateTime<Utc>) -> Self {
        Self { kind, timestamp }
    }

    /// Whether this event matches an optional kind filter (`None` matches all).
    pub fn matches(&self, kind: Option<ActivityKind>) -> bool {
        kind.map_or(true, |k| k == self.kind)
    }
}
