//! Animation state machine.
//!
//! Owns the current behavioral state, the selected animation variant and
//! how many cycles of it have played. A fixed external tick advances the
//! frame; once per completed cycle the classifier is asked for the next
//! state. Interact is a depth-1 interrupt: it remembers the state it
//! preempted and returns to it after exactly one cycle.

use crate::core::classifier::{BehaviorClassifier, BehaviorState};
use crate::core::random::RandomSource;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

/// Inclusive range of cycles an animation plays before it is rerolled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CycleRange {
    pub min: u32,
    pub max: u32,
}

impl CycleRange {
    pub const fn new(min: u32, max: u32) -> Self {
        Self { min, max }
    }

    /// Normalized `(low, high)`: ordered, and never below one cycle.
    pub fn bounds(&self) -> (u32, u32) {
        let low = self.min.min(self.max).max(1);
        let high = self.min.max(self.max).max(low);
        (low, high)
    }

    pub fn contains(&self, cycles: u32) -> bool {
        let (low, high) = self.bounds();
        (low..=high).contains(&cycles)
    }
}

/// Per-state cycle ranges.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CycleRanges {
    pub idle: CycleRange,
    pub active: CycleRange,
    pub lazy: CycleRange,
    pub interact: CycleRange,
}

impl Default for CycleRanges {
    fn default() -> Self {
        Self {
            idle: CycleRange::new(10, 15),
            active: CycleRange::new(5, 10),
            lazy: CycleRange::new(15, 30),
            interact: CycleRange::new(1, 1),
        }
    }
}

impl CycleRanges {
    pub fn for_state(&self, state: BehaviorState) -> CycleRange {
        match state {
            BehaviorState::Idle => self.idle,
            BehaviorState::Active => self.active,
            BehaviorState::Lazy => self.lazy,
            BehaviorState::Interact => self.interact,
        }
    }
}

/// Errors building an animation library.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum AnimationError {
    #[error("no animation variants for state {0}")]
    MissingVariants(BehaviorState),
    #[error("variant {variant} of state {state} has no frames")]
    EmptyVariant { state: BehaviorState, variant: usize },
}

/// Frame counts of every pre-authored variant, per state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnimationLibrary {
    variants: HashMap<BehaviorState, Vec<usize>>,
}

impl AnimationLibrary {
    /// Build a library. Every state needs at least one variant and every
    /// variant at least one frame.
    pub fn new(variants: HashMap<BehaviorState, Vec<usize>>) -> Result<Self, AnimationError> {
        for state in BehaviorState::ALL {
            let frames = variants
                .get(&state)
                .filter(|v| !v.is_empty())
                .ok_or(AnimationError::MissingVariants(state))?;
            if let Some(variant) = frames.iter().position(|&n| n == 0) {
                return Err(AnimationError::EmptyVariant { state, variant });
            }
        }
        Ok(Self { variants })
    }

    /// Library where every variant has the same number of frames.
    pub fn uniform(
        variants_per_state: &[(BehaviorState, usize)],
        frames: usize,
    ) -> Result<Self, AnimationError> {
        let mut variants: HashMap<BehaviorState, Vec<usize>> = HashMap::new();
        for &(state, count) in variants_per_state {
            variants
                .entry(state)
                .or_default()
                .extend(std::iter::repeat(frames).take(count));
        }
        Self::new(variants)
    }

    pub fn variant_count(&self, state: BehaviorState) -> usize {
        self.variants.get(&state).map_or(0, Vec::len)
    }

    pub fn frame_count(&self, state: BehaviorState, variant: usize) -> usize {
        self.variants
            .get(&state)
            .and_then(|v| v.get(variant))
            .copied()
            .unwrap_or(0)
    }
}

/// Snapshot of what is currently playing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnimationSelection {
    pub state: BehaviorState,
    pub variant_index: usize,
    pub cycle_count: u32,
    pub target_cycles: u32,
    pub frame_index: usize,
}

/// The frame the render driver should display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrameRef {
    pub state: BehaviorState,
    pub variant_index: usize,
    pub frame_index: usize,
}

/// What a single frame advance did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Advance {
    /// Moved to the next frame of the same cycle.
    Frame,
    /// Completed a cycle and restarted the same variant.
    Cycle(BehaviorState),
    /// Selected a new animation (reroll, state change or Interact revert).
    Reselected {
        from: BehaviorState,
        to: BehaviorState,
    },
}

/// Drives the displayed animation.
pub struct AnimationStateMachine {
    library: AnimationLibrary,
    ranges: CycleRanges,
    classifier: Box<dyn BehaviorClassifier>,
    rng: Box<dyn RandomSource>,
    selection: AnimationSelection,
    previous_state: BehaviorState,
}

impl AnimationStateMachine {
    /// Create the machine in the Lazy state with its animation already
    /// selected, so the first frame can be shown before the first tick.
    pub fn new(
        library: AnimationLibrary,
        ranges: CycleRanges,
        classifier: Box<dyn BehaviorClassifier>,
        rng: Box<dyn RandomSource>,
    ) -> Self {
        let initial = BehaviorState::Lazy;
        let mut machine = Self {
            library,
            ranges,
            classifier,
            rng,
            selection: AnimationSelection {
                state: initial,
                variant_index: 0,
                cycle_count: 0,
                target_cycles: 1,
                frame_index: 0,
            },
            previous_state: initial,
        };
        machine.select_animation(initial);
        machine
    }

    pub fn state(&self) -> BehaviorState {
        self.selection.state
    }

    /// State Interact will return to.
    pub fn previous_state(&self) -> BehaviorState {
        self.previous_state
    }

    pub fn selection(&self) -> AnimationSelection {
        self.selection
    }

    pub fn frame(&self) -> FrameRef {
        FrameRef {
            state: self.selection.state,
            variant_index: self.selection.variant_index,
            frame_index: self.selection.frame_index,
        }
    }

    /// Switch to `target` and roll a fresh variant and cycle target.
    ///
    /// Entering Interact stashes the current state for the revert, unless
    /// the machine is already in Interact: then the stash is kept and only
    /// the Interact animation restarts.
    pub fn select_animation(&mut self, target: BehaviorState) {
        let current = self.selection.state;
        if target == BehaviorState::Interact && current != BehaviorState::Interact {
            self.previous_state = current;
        }

        let variants = self.library.variant_count(target);
        let (low, high) = self.ranges.for_state(target).bounds();

        self.selection = AnimationSelection {
            state: target,
            variant_index: self.rng.index(variants),
            cycle_count: 0,
            target_cycles: self.rng.between(low, high),
            frame_index: 0,
        };
    }

    /// Advance one frame. Called on the fixed render tick.
    pub fn advance_frame(&mut self) -> Advance {
        self.selection.frame_index += 1;

        let frames = self
            .library
            .frame_count(self.selection.state, self.selection.variant_index);
        if self.selection.frame_index < frames {
            return Advance::Frame;
        }

        if self.selection.state == BehaviorState::Interact {
            let to = self.previous_state;
            self.select_animation(to);
            return Advance::Reselected {
                from: BehaviorState::Interact,
                to,
            };
        }

        self.on_cycle_complete()
    }

    /// Bookkeeping after a full pass through the current variant.
    ///
    /// Counts the cycle and classifies. A classified state different from
    /// the current one reselects right away, even when `cycle_count` has not
    /// reached `target_cycles`: the streak restarts with a fresh variant and
    /// a fresh target in the new state instead of carrying the old variant
    /// and count over. Otherwise the same variant replays until its target
    /// is reached, then a new variant and target are drawn for the state.
    pub fn on_cycle_complete(&mut self) -> Advance {
        self.selection.cycle_count += 1;

        let from = self.selection.state;
        let next = self.classifier.classify();

        // A variant index is only meaningful within its own state's table.
        if next != from {
            self.select_animation(next);
            return Advance::Reselected { from, to: next };
        }

        if self.selection.cycle_count >= self.selection.target_cycles {
            self.select_animation(next);
            return Advance::Reselected { from, to: next };
        }

        self.selection.frame_index = 0;
        Advance::Cycle(from)
    }

    /// Preempt whatever is playing with one cycle of Interact.
    pub fn interact(&mut self) {
        self.select_animation(BehaviorState::Interact);
    }
}
