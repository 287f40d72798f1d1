//! Desk Pet - an animated desktop companion that reacts to how you work.
//!
//! Two input producers (keyboard and pointer) record activity into a
//! shared, time-bounded log. Once per completed animation cycle the
//! classifier reads recent counts from the log and decides whether the
//! user is Active, Idle or Lazy, which selects the animation the pet
//! plays. Clicking the pet interrupts with a single Interact cycle.
//!
//! # Architecture
//!
//! ```text
//! ┌───────────────────────────────────────────────────────────────┐
//! │                           Desk Pet                            │
//! ├───────────────────────────────────────────────────────────────┤
//! │  ┌────────────┐                                               │
//! │  │  Keyboard  │──┐                                            │
//! │  │  producer  │  │   ┌─────────────┐   ┌─────────────┐        │
//! │  └────────────┘  ├──▶│ ActivityLog │──▶│ Classifier  │        │
//! │  ┌────────────┐  │   │ (15 min)    │   │ (per cycle) │        │
//! │  │  Pointer   │──┘   └─────────────┘   └──────┬──────┘        │
//! │  │  producer  │                               ▼               │
//! │  └────────────┘   gestures ──────────▶ ┌─────────────┐        │
//! │                                        │  Animation  │──▶ sink│
//! │                                        │state machine│        │
//! │                                        └─────────────┘        │
//! └───────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```no_run
//! use desk_pet::core::{
//!     create_shared_log, ActivityClassifier, AnimationStateMachine, ClassifierConfig,
//!     CycleRanges, RngSource,
//! };
//! use desk_pet::sprite::SheetLayout;
//!
//! let log = create_shared_log(15.0);
//! let classifier = ActivityClassifier::new(log.clone(), ClassifierConfig::default());
//! let library = SheetLayout::default().full_library().expect("valid layout");
//! let mut machine = AnimationStateMachine::new(
//!     library,
//!     CycleRanges::default(),
//!     Box::new(classifier),
//!     Box::new(RngSource::from_os()),
//! );
//!
//! // Producers call `log.record(kind)`; the render tick calls:
//! machine.advance_frame();
//! ```

pub mod collector;
pub mod config;
pub mod core;
pub mod runtime;
pub mod sprite;
pub mod stats;

// Re-export key types at crate root for convenience
pub use collector::{ActivityEvent, ActivityKind, Collector, CollectorConfig, CollectorError};
pub use config::{Config, ConfigError, SourceConfig};
pub use crate::core::{
    ActivityClassifier, ActivityLog, AnimationLibrary, AnimationStateMachine, BehaviorState,
    SharedActivityLog,
};
pub use runtime::{FrameSink, PetCommand, PetHandle, PetRuntime};
pub use stats::{SessionStats, SharedSessionStats};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
