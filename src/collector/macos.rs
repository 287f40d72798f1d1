//! macOS implementation of event collection using CGEvent taps.
//!
//! Each enabled device class gets its own listen-only event tap running on
//! its own thread, and each tap records straight into the shared activity
//! log. Requires Input Monitoring permission.

use crate::collector::types::{ActivityKind, CollectorConfig, CollectorError};
use crate::core::activity_log::SharedActivityLog;
use crate::stats::SharedSessionStats;
use core_foundation::runloop::{kCFRunLoopCommonModes, CFRunLoop};
use core_graphics::event::{
    CGEventTap, CGEventTapLocation, CGEventTapOptions, CGEventTapPlacement, CGEventType,
    CallbackResult,
};
use crossbeam_channel::{bounded, Sender};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

/// The macOS event collector using CGEvent taps.
pub struct MacOSCollector {
    config: CollectorConfig,
    log: SharedActivityLog,
    stats: SharedSessionStats,
    running: Arc<AtomicBool>,
    handles: Vec<JoinHandle<()>>,
}

impl MacOSCollector {
    /// Create a collector that records into `log`.
    pub fn new(config: CollectorConfig, log: SharedActivityLog, stats: SharedSessionStats) -> Self {
        Self {
            config,
            log,
            stats,
            running: Arc::new(AtomicBool::new(false)),
            handles: Vec::new(),
        }
    }

    /// Start one listener thread per enabled device class.
    ///
    /// Returns once every tap is installed. If any listener fails to set up
    /// its tap, the others are stopped and that listener's error is returned.
    pub fn start(&mut self) -> Result<(), CollectorError> {
        if self.running.load(Ordering::SeqCst) {
            return Err(CollectorError::AlreadyRunning);
        }
        if !check_permission() {
            return Err(CollectorError::PermissionDenied);
        }

        self.running.store(true, Ordering::SeqCst);

        for kind in self.config.kinds() {
            let log = self.log.clone();
            let stats = self.stats.clone();
            let running = self.running.clone();
            let (ready_tx, ready_rx) = bounded(1);

            let spawned = thread::Builder::new()
                .name(format!("{kind}-listener"))
                .spawn(move || {
                    if let Err(e) = run_event_loop(kind, log, stats, &running, &ready_tx) {
                        tracing::error!(%kind, "event loop error: {e}");
                        running.store(false, Ordering::SeqCst);
                        let _ = ready_tx.send(Err(e));
                    }
                });

            match spawned {
                Ok(handle) => self.handles.push(handle),
                Err(e) => {
                    self.stop();
                    return Err(CollectorError::Spawn(kind, e));
                }
            }

            let ready = ready_rx
                .recv()
                .unwrap_or(Err(CollectorError::ListenerExited(kind)));
            if let Err(e) = ready {
                self.stop();
                return Err(e);
            }
        }

        tracing::info!(sources = ?self.config.kinds(), "collector started");
        Ok(())
    }

    /// Stop capturing events. Listener threads notice within one run-loop slice.
    pub fn stop(&mut self) {
        self.running.store(false, Ordering::SeqCst);
        for handle in self.handles.drain(..) {
            let _ = handle.join();
        }
    }

    /// Check if the collector is currently running.
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }
}

impl Drop for MacOSCollector {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Event types a producer of `kind` listens to.
fn event_types(kind: ActivityKind) -> Vec<CGEventType> {
    match kind {
        ActivityKind::Key => vec![CGEventType::KeyDown],
        ActivityKind::Mouse => vec![
            CGEventType::MouseMoved,
            CGEventType::LeftMouseDragged,
            CGEventType::RightMouseDragged,
        ],
    }
}

/// Run one event tap until `running` clears. Reports on `ready` once the
/// tap is enabled.
fn run_event_loop(
    kind: ActivityKind,
    log: SharedActivityLog,
    stats: SharedSessionStats,
    running: &AtomicBool,
    ready: &Sender<Result<(), CollectorError>>,
) -> Result<(), CollectorError> {
    // Passive observer: record and hand the event back untouched.
    let tap = CGEventTap::new(
        CGEventTapLocation::Session,
        CGEventTapPlacement::HeadInsertEventTap,
        CGEventTapOptions::ListenOnly,
        event_types(kind),
        move |_proxy, _event_type, _event| {
            log.record(kind);
            stats.record_activity(kind);
            CallbackResult::Keep
        },
    )
    .map_err(|_| CollectorError::PermissionDenied)?;

    let source = tap
        .mach_port()
        .create_runloop_source(0)
        .map_err(|_| CollectorError::PermissionDenied)?;

    let run_loop = CFRunLoop::get_current();
    unsafe {
        run_loop.add_source(&source, kCFRunLoopCommonModes);
    }
    tap.enable();
    let _ = ready.send(Ok(()));

    while running.load(Ordering::SeqCst) {
        CFRunLoop::run_in_mode(
            unsafe { kCFRunLoopCommonModes },
            Duration::from_millis(100),
            false,
        );
    }

    // The tap is disabled when dropped.
    Ok(())
}

/// Check if the application has Input Monitoring permission.
///
/// macOS has no direct query; creating a passive tap fails without it.
pub fn check_permission() -> bool {
    CGEventTap::new(
        CGEventTapLocation::Session,
        CGEventTapPlacement::HeadInsertEventTap,
        CGEventTapOptions::ListenOnly,
        vec![CGEventType::KeyDown],
        |_proxy, _type, _event| CallbackResult::Keep,
    )
    .is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::activity_log::create_shared_log;
    use crate::stats::create_shared_stats;

    #[test]
    fn test_event_types_per_kind() {
        assert_eq!(event_types(ActivityKind::Key).len(), 1);
        assert_eq!(event_types(ActivityKind::Mouse).len(), 3);
    }

    #[test]
    fn test_collector_creation() {
        let collector = MacOSCollector::new(
            CollectorConfig::default(),
            create_shared_log(15.0),
            create_shared_stats(),
        );
        assert!(!collector.is_running());
    }

    #[test]
    fn test_failed_start_leaves_collector_stopped() {
        let mut collector = MacOSCollector::new(
            CollectorConfig::default(),
            create_shared_log(15.0),
            create_shared_stats(),
        );

        match collector.start() {
            Ok(()) => {
                assert!(collector.is_running());
                collector.stop();
            }
            Err(e) => {
                // No Input Monitoring permission on this host.
                assert!(matches!(e, CollectorError::PermissionDenied));
                assert!(collector.handles.is_empty());
            }
        }
        assert!(!collector.is_running());
    }
}
