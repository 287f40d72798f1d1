//! Core functionality for the desktop pet.
//!
//! This module contains:
//! - The time-bounded activity log written by the input producers
//! - Classification of recent activity into a behavioral state
//! - The animation state machine driven by the render tick

pub mod activity_log;
pub mod animation;
pub mod classifier;
pub mod random;

// Re-export commonly used types
pub use activity_log::{create_shared_log, ActivityLog, SharedActivityLog, DEFAULT_RETENTION_MINUTES};
pub use animation::{
    Advance, AnimationError, AnimationLibrary, AnimationSelection, AnimationStateMachine,
    CycleRange, CycleRanges, FrameRef,
};
pub use classifier::{
    ActivityClassifier, ActivityCounts, BehaviorClassifier, BehaviorState, ClassifierConfig,
};
pub use random::{RandomSource, RngSource};
