// src/engine/core.rs

//! Pure core state machine.
//!
//! This module contains a synchronous, deterministic "core" that consumes
//! [`CycleEvent`]s and produces:
//! - an updated phase
//! - a list of [`CoreCommand`]s describing what the IO shell should do next
//!
//! The async shell ([`Coordinator`](crate::engine::runtime::Coordinator)) is
//! responsible for sleeping, draining the queue, running the compiler and
//! starting/stopping processes, and feeds the outcome of each back in as the
//! next event.
//!
//! The core is unit tested without any Tokio, channels, filesystem or
//! processes.

use crate::engine::event_handlers::{
    CoreStep, handle_build_finished, handle_change, handle_debounce_elapsed,
    handle_instance_started, handle_instance_stopped,
};
use crate::engine::{CycleEvent, Phase};

/// Mutable state shared by the transition functions.
#[derive(Debug, Clone)]
pub struct CycleState {
    pub(crate) phase: Phase,
    /// Set by the first successful build, never cleared.
    pub(crate) started: bool,
    pub(crate) has_instance: bool,
    pub(crate) run_after_build: bool,
    pub(crate) cycles: u64,
}

impl CycleState {
    /// The phase to return to when a cycle ends without changing the instance.
    pub(crate) fn idle_phase(&self) -> Phase {
        if self.has_instance {
            Phase::Running
        } else {
            Phase::WaitingForFirstEvent
        }
    }
}

/// Pure coordinator state.
///
/// It has **no** channels, no Tokio types, and does not perform any IO.
#[derive(Debug, Clone)]
pub struct CoordinatorCore {
    state: CycleState,
}

impl CoordinatorCore {
    pub fn new(run_after_build: bool) -> Self {
        Self {
            state: CycleState {
                phase: Phase::WaitingForFirstEvent,
                started: false,
                has_instance: false,
                run_after_build,
                cycles: 0,
            },
        }
    }

    pub fn phase(&self) -> Phase {
        self.state.phase
    }

    /// True once any build has succeeded.
    pub fn has_started(&self) -> bool {
        self.state.started
    }

    pub fn has_instance(&self) -> bool {
        self.state.has_instance
    }

    /// Number of cycles begun so far.
    pub fn cycles(&self) -> u64 {
        self.state.cycles
    }

    /// Handle a single event, updating state and returning the resulting
    /// commands for the IO shell.
    pub fn step(&mut self, event: CycleEvent) -> CoreStep {
        let state = &mut self.state;
        match event {
            CycleEvent::Changed(change) => handle_change(state, change),
            CycleEvent::DebounceElapsed { discarded } => handle_debounce_elapsed(state, discarded),
            CycleEvent::BuildFinished(result) => handle_build_finished(state, result),
            CycleEvent::InstanceStopped => handle_instance_stopped(state),
            CycleEvent::InstanceStarted { pid } => handle_instance_started(state, pid),
        }
    }
}

