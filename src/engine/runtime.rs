// src/engine/runtime.rs

use std::collections::VecDeque;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, error, info, warn};

use crate::config::Settings;
use crate::errors::{DevloopError, Result, is_not_found};
use crate::exec::{BuildBackend, ProcessBackend, ProcessHandle, Script};
use crate::fs::FileSystem;
use crate::watch::ChangeEvent;

use super::core::CoordinatorCore;
use super::queue::EventReceiver;
use super::{CoreCommand, CycleEvent, HookStage, Phase};

/// The parts of the settings the coordinator acts on.
#[derive(Debug, Clone)]
pub struct CycleOptions {
    pub build_delay: Duration,
    pub error_log: PathBuf,
    pub pre_build: Script,
    pub post_build: Script,
    pub run_after_build: bool,
}

impl CycleOptions {
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            build_delay: settings.build_delay(),
            error_log: settings.build_errors_path(),
            pre_build: settings.pre_build_script(),
            post_build: settings.post_build_script(),
            run_after_build: settings.run_after_build(),
        }
    }
}

/// Drives the build/run cycle in response to change events, and delegates
/// building and process management to its backends.
///
/// This is an IO shell around [`CoordinatorCore`], which decides what happens;
/// the shell only performs the commands it is handed and feeds their outcome
/// back in.
pub struct Coordinator<B: BuildBackend, P: ProcessBackend> {
    core: CoordinatorCore,
    events: EventReceiver,
    builder: B,
    processes: P,
    current: Option<P::Handle>,
    fs: Arc<dyn FileSystem>,
    options: CycleOptions,
}

impl<B: BuildBackend, P: ProcessBackend> fmt::Debug for Coordinator<B, P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Coordinator")
            .field("core", &self.core)
            .field("current", &self.current)
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

impl<B: BuildBackend, P: ProcessBackend> Coordinator<B, P> {
    pub fn new(
        events: EventReceiver,
        builder: B,
        processes: P,
        fs: Arc<dyn FileSystem>,
        options: CycleOptions,
    ) -> Self {
        Self {
            core: CoordinatorCore::new(options.run_after_build),
            events,
            builder,
            processes,
            current: None,
            fs,
            options,
        }
    }

    pub fn phase(&self) -> Phase {
        self.core.phase()
    }

    pub fn has_started(&self) -> bool {
        self.core.has_started()
    }

    pub fn current_pid(&self) -> Option<u32> {
        self.current.as_ref().map(|handle| handle.pid())
    }

    pub fn processes(&self) -> &P {
        &self.processes
    }

    pub fn builder(&self) -> &B {
        &self.builder
    }

    /// Main loop. Returns `Ok` only if the event queue closes; a first build
    /// that fails, or a backend that cannot run at all, ends it with `Err`.
    pub async fn run(&mut self) -> Result<()> {
        info!("coordinator started");

        loop {
            info!(loop_index = self.core.cycles() + 1, "Waiting");

            let Some(event) = self.events.recv().await else {
                info!("event queue closed; exiting");
                return Ok(());
            };

            if !self.run_cycle(event).await? {
                info!("core requested exit; stopping coordinator");
                return Ok(());
            }
        }
    }

    /// Stop the current instance, if any. Used on the way out.
    pub async fn shutdown(&mut self) -> Result<()> {
        if let Some(handle) = self.current.take() {
            info!(pid = handle.pid(), "stopping instance before exit");
            self.processes.stop(handle).await?;
        }
        Ok(())
    }

    /// Run one full cycle starting from `first`, until the core has nothing
    /// more to do. Returns whether the loop should keep going.
    pub async fn run_cycle(&mut self, first: ChangeEvent) -> Result<bool> {
        let mut pending = VecDeque::from([CycleEvent::Changed(first)]);

        while let Some(event) = pending.pop_front() {
            debug!(?event, "coordinator received event");

            let step = self.core.step(event);

            for command in step.commands {
                if let Some(next) = self.execute_command(command).await? {
                    pending.push_back(next);
                }
            }

            if !step.keep_running {
                return Ok(false);
            }
        }

        info!("{}", "-".repeat(20));
        Ok(true)
    }

    /// Execute a single command from the core, returning the event that
    /// reports its outcome, if it has one.
    async fn execute_command(&mut self, command: CoreCommand) -> Result<Option<CycleEvent>> {
        match command {
            CoreCommand::Debounce => {
                debug!(delay_ms = self.options.build_delay.as_millis() as u64, "sleeping for");
                tokio::time::sleep(self.options.build_delay).await;

                let discarded = self.events.drain().len();
                debug!(discarded, "flushing events");
                Ok(Some(CycleEvent::DebounceElapsed { discarded }))
            }
            CoreCommand::ClearErrorLog => {
                self.clear_error_log();
                Ok(None)
            }
            CoreCommand::RunHook(stage) => {
                self.run_hook(stage).await;
                Ok(None)
            }
            CoreCommand::Build => {
                let result = self.builder.build().await?;
                Ok(Some(CycleEvent::BuildFinished(result)))
            }
            CoreCommand::WriteErrorLog(errors) => {
                error!("Build Failed: \n {}", errors);
                self.write_error_log(&errors);
                Ok(None)
            }
            CoreCommand::StopCurrent => {
                if let Some(handle) = self.current.take() {
                    self.processes.stop(handle).await?;
                }
                Ok(Some(CycleEvent::InstanceStopped))
            }
            CoreCommand::StartNew => {
                let handle = self.processes.start().await?;
                let pid = handle.pid();
                self.current = Some(handle);
                Ok(Some(CycleEvent::InstanceStarted { pid }))
            }
            CoreCommand::KillStrays => {
                self.processes.kill_strays().await?;
                Ok(None)
            }
            CoreCommand::Abort => {
                error!("initial build failed; nothing to run");
                Err(DevloopError::InitialBuildFailed)
            }
        }
    }

    fn clear_error_log(&self) {
        match self.fs.remove_file(&self.options.error_log) {
            Ok(()) => debug!(path = %self.options.error_log.display(), "removed stale error log"),
            Err(e) if is_not_found(&e) => {}
            Err(e) => warn!(error = %format!("{e:#}"), "could not remove error log"),
        }
    }

    fn write_error_log(&self, errors: &str) {
        if let Err(e) = self.fs.write(&self.options.error_log, errors.as_bytes()) {
            error!(error = %format!("{e:#}"), "could not write error log");
        }
    }

    async fn run_hook(&self, stage: HookStage) {
        let script = match stage {
            HookStage::PreBuild => &self.options.pre_build,
            HookStage::PostBuild => &self.options.post_build,
        };
        if !script.exists() {
            return;
        }

        info!(?stage, script = %script.path().display(), "running hook");
        let run = script.run().await;
        if run.success {
            debug!(?stage, "hook succeeded");
        } else {
            warn!(?stage, output = %run.output, "hook failed");
        }
    }
}
