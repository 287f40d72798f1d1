//! Non-macOS (noop) implementation of event collection.
//!
//! This exists so the crate (and binary) can compile on non-Apple targets
//! without pulling in CoreGraphics/CoreFoundation dependencies. The pet
//! still animates; with no producers the log stays empty and the
//! classifier settles on Lazy.

use crate::collector::types::{CollectorConfig, CollectorError};
use crate::core::activity_log::SharedActivityLog;
use crate::stats::SharedSessionStats;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// A noop collector that never records events.
pub struct NoopCollector {
    config: CollectorConfig,
    _log: SharedActivityLog,
    _stats: SharedSessionStats,
    running: Arc<AtomicBool>,
}

impl NoopCollector {
    /// Create a new noop collector.
    pub fn new(config: CollectorConfig, log: SharedActivityLog, stats: SharedSessionStats) -> Self {
        Self {
            config,
            _log: log,
            _stats: stats,
            running: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Start capturing events.
    ///
    /// On non-macOS platforms, this simply marks the collector as running.
    pub fn start(&mut self) -> Result<(), CollectorError> {
        if self.running.load(Ordering::SeqCst) {
            return Err(CollectorError::AlreadyRunning);
        }
        self.running.store(true, Ordering::SeqCst);
        tracing::warn!(
            sources = ?self.config.kinds(),
            "input capture is not supported on this platform; no activity will be recorded"
        );
        Ok(())
    }

    /// Stop capturing events.
    pub fn stop(&mut self) {
        self.running.store(false, Ordering::SeqCst);
    }

    /// Check if the collector is currently running.
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }
}

/// On non-macOS platforms there is no Input Monitoring permission gate.
pub fn check_permission() -> bool {
    true
}
