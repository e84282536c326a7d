// src/engine/mod.rs

//! Build/run coordination engine.
//!
//! This module ties together:
//! - the event queue between the watchers and the coordinator
//! - the debounce → build → restart cycle, as a pure state machine
//! - the async shell that sleeps, builds and starts/stops processes
//!
//! The pure core state machine lives in [`core`] (with the per-event
//! transitions in [`event_handlers`]); the async/IO shell is implemented in
//! [`runtime`].

use crate::exec::BuildResult;
use crate::watch::ChangeEvent;

/// Which hook script to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HookStage {
    PreBuild,
    PostBuild,
}

/// Where the coordinator is in its cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Idle, nothing has been started yet (or the last instance was stopped
    /// because `run_after_build` is off).
    WaitingForFirstEvent,
    Debouncing,
    Building,
    /// Starting a fresh instance; nothing else is running.
    Starting,
    /// Waiting for the previous instance to go away.
    ShuttingDownOld,
    /// Idle with an instance up.
    Running,
}

impl Phase {
    /// Phases in which the coordinator blocks on the event queue.
    pub fn is_idle(self) -> bool {
        matches!(self, Phase::WaitingForFirstEvent | Phase::Running)
    }
}

/// Inputs to the core state machine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CycleEvent {
    /// A change arrived from the event queue.
    Changed(ChangeEvent),
    /// The debounce delay passed and `discarded` queued events were dropped.
    DebounceElapsed { discarded: usize },
    BuildFinished(BuildResult),
    /// The previous instance is gone.
    InstanceStopped,
    InstanceStarted { pid: u32 },
}

pub mod core;
pub mod event_handlers;
pub mod queue;
pub mod runtime;

pub use self::core::CoordinatorCore;
pub use event_handlers::{CoreCommand, CoreStep};
pub use queue::{EVENT_QUEUE_CAPACITY, EventReceiver, EventSender, event_queue};
pub use runtime::{Coordinator, CycleOptions};
