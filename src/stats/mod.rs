//! Session statistics for the desktop pet.
//!
//! Counters are lock-free so the input producers can bump them from their
//! own threads without contending with the activity log.

pub mod session;

// Re-export commonly used types
pub use session::{create_shared_stats, SessionStats, SessionSummary, SharedSessionStats};
