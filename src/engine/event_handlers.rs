// src/engine/event_handlers.rs

//! Per-event transitions of the core state machine.

use tracing::{debug, warn};

use crate::engine::core::CycleState;
use crate::engine::{HookStage, Phase};
use crate::exec::BuildResult;
use crate::watch::ChangeEvent;

/// Command produced by the pure core, to be executed by the outer IO shell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CoreCommand {
    /// Sleep for the build delay, then drain the event queue.
    Debounce,
    /// Delete the error log left by a previous failed build.
    ClearErrorLog,
    RunHook(HookStage),
    Build,
    /// Persist the compiler's error output verbatim.
    WriteErrorLog(String),
    /// Stop the current instance and wait for it to exit.
    StopCurrent,
    StartNew,
    /// Stop any process running the artifact that we did not start.
    KillStrays,
    /// The first build failed; nothing to fall back to.
    Abort,
}

/// Decision returned by the core after handling a single `CycleEvent`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoreStep {
    /// Commands the IO shell should execute, in order.
    pub commands: Vec<CoreCommand>,
    /// Whether the outer loop should keep running.
    pub keep_running: bool,
}

impl CoreStep {
    pub(crate) fn continue_with(commands: Vec<CoreCommand>) -> Self {
        Self {
            commands,
            keep_running: true,
        }
    }

    pub(crate) fn nothing() -> Self {
        Self::continue_with(Vec::new())
    }
}

/// A change arrived. Only the first one in an idle phase starts a cycle;
/// everything else is picked up by the next debounce drain.
pub fn handle_change(state: &mut CycleState, event: ChangeEvent) -> CoreStep {
    if !state.phase.is_idle() {
        debug!(%event, phase = ?state.phase, "change during cycle; left for the next drain");
        return CoreStep::nothing();
    }

    state.cycles += 1;
    debug!(%event, cycle = state.cycles, "starting build cycle");
    state.phase = Phase::Debouncing;
    CoreStep::continue_with(vec![CoreCommand::Debounce])
}

pub fn handle_debounce_elapsed(state: &mut CycleState, discarded: usize) -> CoreStep {
    if state.phase != Phase::Debouncing {
        warn!(phase = ?state.phase, "debounce finished outside of debouncing");
        return CoreStep::nothing();
    }

    debug!(discarded, "debounce window closed");
    state.phase = Phase::Building;
    CoreStep::continue_with(vec![
        CoreCommand::ClearErrorLog,
        CoreCommand::RunHook(HookStage::PreBuild),
        CoreCommand::Build,
    ])
}

/// Build finished.
///
/// - Failure before any success: abort.
/// - Failure after a success: keep whatever is running, record the errors.
/// - Success: post-build hook, then replace the instance (or, with
///   `run_after_build` off, make sure nothing is left running).
pub fn handle_build_finished(state: &mut CycleState, result: BuildResult) -> CoreStep {
    if state.phase != Phase::Building {
        warn!(phase = ?state.phase, "build result outside of building");
        return CoreStep::nothing();
    }

    match result {
        BuildResult::Failure(errors) => {
            if !state.started {
                state.phase = Phase::WaitingForFirstEvent;
                return CoreStep {
                    commands: vec![CoreCommand::Abort],
                    keep_running: false,
                };
            }

            state.phase = state.idle_phase();
            CoreStep::continue_with(vec![CoreCommand::WriteErrorLog(errors)])
        }
        BuildResult::Success => {
            state.started = true;
            let mut commands = vec![CoreCommand::RunHook(HookStage::PostBuild)];

            if state.has_instance {
                state.phase = Phase::ShuttingDownOld;
                commands.push(CoreCommand::StopCurrent);
            } else if state.run_after_build {
                state.phase = Phase::Starting;
                commands.push(CoreCommand::StartNew);
            } else {
                state.phase = Phase::WaitingForFirstEvent;
                commands.push(CoreCommand::KillStrays);
            }

            CoreStep::continue_with(commands)
        }
    }
}

pub fn handle_instance_stopped(state: &mut CycleState) -> CoreStep {
    state.has_instance = false;

    if state.phase != Phase::ShuttingDownOld {
        // The instance went away on its own; nothing to chain.
        state.phase = state.idle_phase();
        return CoreStep::nothing();
    }

    if state.run_after_build {
        state.phase = Phase::Starting;
        CoreStep::continue_with(vec![CoreCommand::StartNew])
    } else {
        state.phase = Phase::WaitingForFirstEvent;
        CoreStep::continue_with(vec![CoreCommand::KillStrays])
    }
}

pub fn handle_instance_started(state: &mut CycleState, pid: u32) -> CoreStep {
    if state.phase != Phase::Starting {
        warn!(pid, phase = ?state.phase, "instance started outside of starting");
    }

    debug!(pid, "instance running");
    state.has_instance = true;
    state.phase = Phase::Running;
    CoreStep::nothing()
}
