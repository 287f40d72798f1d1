//! Tick driver for the pet.
//!
//! Runs on the thread that owns the display. Each tick drains pending
//! gestures, advances the animation state machine by one frame and hands
//! the frame to a [`FrameSink`]. Gestures come in over a channel so the
//! windowing layer can send them from its own event callbacks.

use crate::config::Config;
use crate::core::animation::{Advance, AnimationStateMachine, FrameRef};
use crate::stats::SharedSessionStats;
use crossbeam_channel::{unbounded, Receiver, Sender};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::Instant;

/// A user gesture forwarded from the windowing layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PetCommand {
    /// Primary-button press or drag start
    Interact,
    /// Drag finished with the window at this position
    DragEnd { x: i32, y: i32 },
    /// Wheel scroll; positive grows the pet
    Scroll { delta: i32 },
    /// Stop the tick loop
    Quit,
}

/// Consumer of the frames the runtime selects.
pub trait FrameSink {
    fn present(&mut self, frame: FrameRef, scale: f64);
}

/// Cloneable sender half for gestures.
#[derive(Debug, Clone)]
pub struct PetHandle {
    sender: Sender<PetCommand>,
}

impl PetHandle {
    pub fn send(&self, command: PetCommand) {
        // The runtime is gone once the receiver drops; nothing left to notify.
        let _ = self.sender.send(command);
    }

    pub fn interact(&self) {
        self.send(PetCommand::Interact);
    }

    pub fn quit(&self) {
        self.send(PetCommand::Quit);
    }
}

/// Owns the state machine and the persisted placement for one session.
pub struct PetRuntime {
    machine: AnimationStateMachine,
    config: Config,
    config_path: Option<PathBuf>,
    stats: SharedSessionStats,
    commands: Receiver<PetCommand>,
}

impl PetRuntime {
    /// Create a runtime. Placement changes are written to `config_path`
    /// when one is given.
    pub fn new(
        machine: AnimationStateMachine,
        config: Config,
        config_path: Option<PathBuf>,
        stats: SharedSessionStats,
    ) -> (Self, PetHandle) {
        let (sender, commands) = unbounded();
        let runtime = Self {
            machine,
            config,
            config_path,
            stats,
            commands,
        };
        (runtime, PetHandle { sender })
    }

    pub fn machine(&self) -> &AnimationStateMachine {
        &self.machine
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Run one tick. Returns `false` once a quit was requested.
    pub fn tick(&mut self, sink: &mut dyn FrameSink) -> bool {
        let mut keep_running = true;
        let mut interrupted = false;

        for command in self.commands.try_iter().collect::<Vec<_>>() {
            match command {
                PetCommand::Interact => {
                    self.machine.interact();
                    self.stats.record_interaction();
                    interrupted = true;
                }
                PetCommand::DragEnd { x, y } => {
                    self.config.set_position(x, y);
                    self.persist();
                }
                PetCommand::Scroll { delta } => {
                    if self.config.adjust_scale(delta) {
                        tracing::debug!(scale = self.config.scale, "scale adjusted");
                        self.persist();
                    }
                }
                PetCommand::Quit => keep_running = false,
            }
        }

        // An interrupt shows its first frame before advancing.
        if !interrupted {
            let advance = self.machine.advance_frame();
            self.stats.record_advance(&advance);
            if let Advance::Reselected { from, to } = advance {
                let selection = self.machine.selection();
                if from == to {
                    tracing::debug!(
                        state = %to,
                        variant = selection.variant_index,
                        target_cycles = selection.target_cycles,
                        "animation rerolled"
                    );
                } else {
                    tracing::info!(%from, %to, variant = selection.variant_index, "state changed");
                }
            }
        }

        sink.present(self.machine.frame(), self.config.scale);
        keep_running
    }

    /// Tick on the configured period until `running` clears or a quit
    /// arrives. A shutdown request lets the current tick finish.
    pub fn run(&mut self, running: &AtomicBool, sink: &mut dyn FrameSink) {
        let period = self.config.tick_interval;
        tracing::info!(period_ms = period.as_millis() as u64, "animation loop started");

        sink.present(self.machine.frame(), self.config.scale);
        let mut next = Instant::now() + period;

        while running.load(Ordering::SeqCst) {
            thread::sleep(next.saturating_duration_since(Instant::now()));
            next += period;

            if !self.tick(sink) {
                break;
            }
        }

        tracing::info!("animation loop stopped");
    }

    fn persist(&self) {
        let Some(path) = &self.config_path else {
            return;
        };
        if let Err(e) = self.config.save_to(path) {
            tracing::warn!(path = %path.display(), "could not save placement: {e}");
        }
    }
}
