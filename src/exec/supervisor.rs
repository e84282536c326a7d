// src/exec/supervisor.rs

//! Running the built artifact: spawn, stream output, stop.

use std::future::Future;
use std::path::{Path, PathBuf};
use std::pin::Pin;
use std::process::Stdio;
use std::time::Duration;

use anyhow::Context;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::{Child, Command};
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tracing::{debug, info, warn};

use crate::config::Settings;
use crate::errors::Result;
use crate::exec::backend::{ProcessBackend, ProcessHandle};
use crate::exec::environment::child_environment;
#[cfg(unix)]
use crate::exec::signal::send_signal;
use crate::types::ShutdownSignal;

/// How a supervised instance ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InstanceExit {
    /// Exited on its own, before anyone asked it to stop.
    Exited(Option<i32>),
    /// Stopped on request. `forced` if it ignored the signal for the whole
    /// grace period and had to be killed.
    Stopped { signal: ShutdownSignal, forced: bool },
    /// Waiting on the process failed.
    Lost(String),
}

/// Handle to the one child process currently owned by the coordinator.
#[derive(Debug)]
pub struct RunningInstance {
    pid: u32,
    stop_tx: Option<oneshot::Sender<ShutdownSignal>>,
    supervisor: JoinHandle<InstanceExit>,
}

impl RunningInstance {
    pub fn pid(&self) -> u32 {
        self.pid
    }

    /// True once the child has exited (for whatever reason) and been reaped.
    pub fn is_finished(&self) -> bool {
        self.supervisor.is_finished()
    }
}

impl ProcessHandle for RunningInstance {
    fn pid(&self) -> u32 {
        self.pid
    }
}

/// Starts and stops the built artifact.
#[derive(Debug, Clone)]
pub struct ProcessSupervisor {
    program: PathBuf,
    env: Vec<(String, String)>,
    signal: ShutdownSignal,
    grace: Duration,
}

impl ProcessSupervisor {
    pub fn new(
        program: impl Into<PathBuf>,
        env: Vec<(String, String)>,
        signal: ShutdownSignal,
        grace: Duration,
    ) -> Self {
        Self {
            program: program.into(),
            env,
            signal,
            grace,
        }
    }

    pub fn from_settings(settings: &Settings) -> Self {
        Self::new(
            settings.build_path(),
            child_environment(settings),
            settings.shutdown_signal(),
            settings.shutdown_timeout(),
        )
    }

    pub fn program(&self) -> &Path {
        &self.program
    }

    /// Spawn the artifact.
    ///
    /// Its stdout and stderr are each copied into the log by their own task,
    /// and a third task owns the child until it exits or is asked to stop.
    pub fn start_instance(&self) -> anyhow::Result<RunningInstance> {
        info!(program = %self.program.display(), "Running...");

        let mut cmd = Command::new(&self.program);
        cmd.envs(self.env.iter().map(|(k, v)| (k.as_str(), v.as_str())))
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let mut child = cmd
            .spawn()
            .with_context(|| format!("spawning {}", self.program.display()))?;

        let pid = child
            .id()
            .context("spawned child exited before its pid could be read")?;

        if let Some(stdout) = child.stdout.take() {
            pipe_to_log(stdout, pid, "stdout");
        }
        if let Some(stderr) = child.stderr.take() {
            pipe_to_log(stderr, pid, "stderr");
        }

        let (stop_tx, stop_rx) = oneshot::channel();
        let supervisor = tokio::spawn(supervise(child, pid, stop_rx, self.grace));

        info!(pid, "started");
        Ok(RunningInstance {
            pid,
            stop_tx: Some(stop_tx),
            supervisor,
        })
    }

    /// Ask `instance` to stop with the configured signal and wait until it is
    /// gone. Bounded by the grace period plus a forced kill.
    pub async fn stop_instance(&self, mut instance: RunningInstance) -> anyhow::Result<InstanceExit> {
        if let Some(stop_tx) = instance.stop_tx.take() {
            if stop_tx.send(self.signal).is_err() {
                debug!(pid = instance.pid, "instance already exited");
            }
        }

        let exit = instance
            .supervisor
            .await
            .with_context(|| format!("supervisor task for pid {} failed", instance.pid))?;

        info!(pid = instance.pid, ?exit, "instance stopped");
        Ok(exit)
    }

    /// Signal every process whose command line mentions the artifact path.
    /// Used when the artifact is built but not run by us.
    pub async fn kill_strays(&self) -> anyhow::Result<()> {
        // pkill matches an extended regex against the full command line.
        let pattern = regex::escape(&self.program.to_string_lossy());
        info!(%pattern, signal = %self.signal, "shutting down processes by name");

        let status = Command::new("pkill")
            .arg(format!("-{}", self.signal.name()))
            .arg("-f")
            .arg(&pattern)
            .stdin(Stdio::null())
            .status()
            .await
            .context("running pkill")?;

        // pkill: 0 = signalled something, 1 = nothing matched.
        match status.code() {
            Some(0) => debug!(%pattern, "signalled matching processes"),
            Some(1) => debug!(%pattern, "no matching processes"),
            code => warn!(%pattern, ?code, "pkill reported an error"),
        }
        Ok(())
    }
}

fn pipe_to_log<R>(reader: R, pid: u32, stream: &'static str)
where
    R: AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let mut reader = BufReader::new(reader);
        let mut buf = Vec::new();
        loop {
            buf.clear();
            match reader.read_until(b'\n', &mut buf).await {
                Ok(0) => break,
                Ok(_) => {
                    let line = String::from_utf8_lossy(&buf);
                    info!(target: "app", "{}", line.trim_end_matches(['\n', '\r']));
                }
                Err(e) => {
                    // Keep the pipe open until the child closes it, or its
                    // next write dies with SIGPIPE.
                    warn!(pid, stream, error = %e, "failed to read app output; discarding the rest");
                    if let Err(e) = tokio::io::copy(&mut reader, &mut tokio::io::sink()).await {
                        debug!(pid, stream, error = %e, "discarding app output failed");
                    }
                    break;
                }
            }
        }
        debug!(pid, stream, "output stream closed");
    });
}

/// Own `child` until it exits by itself or a stop request arrives.
///
/// A dropped stop sender counts as a request to kill.
async fn supervise(
    mut child: Child,
    pid: u32,
    stop_rx: oneshot::Receiver<ShutdownSignal>,
    grace: Duration,
) -> InstanceExit {
    tokio::select! {
        status = child.wait() => match status {
            Ok(status) => {
                info!(pid, code = ?status.code(), "app exited");
                InstanceExit::Exited(status.code())
            }
            Err(e) => {
                warn!(pid, error = %e, "failed to wait for app");
                InstanceExit::Lost(e.to_string())
            }
        },

        request = stop_rx => {
            let signal = request.unwrap_or(ShutdownSignal::Kill);
            info!(pid, %signal, "Shutdown PID");

            if let Err(e) = deliver(&mut child, pid, signal) {
                warn!(pid, error = %e, "failed to deliver shutdown signal");
            }

            match timeout(grace, child.wait()).await {
                Ok(Ok(_)) => InstanceExit::Stopped { signal, forced: false },
                Ok(Err(e)) => InstanceExit::Lost(e.to_string()),
                Err(_) => {
                    warn!(pid, grace_ms = grace.as_millis() as u64, "app ignored shutdown signal; killing");
                    if let Err(e) = child.kill().await {
                        warn!(pid, error = %e, "failed to kill app");
                    }
                    InstanceExit::Stopped { signal, forced: true }
                }
            }
        }
    }
}

#[cfg(unix)]
fn deliver(_child: &mut Child, pid: u32, signal: ShutdownSignal) -> std::io::Result<()> {
    send_signal(pid, signal)
}

#[cfg(not(unix))]
fn deliver(child: &mut Child, pid: u32, signal: ShutdownSignal) -> std::io::Result<()> {
    debug!(pid, %signal, "no signals on this platform; killing");
    child.start_kill()
}

impl ProcessBackend for ProcessSupervisor {
    type Handle = RunningInstance;

    fn start(&mut self) -> Pin<Box<dyn Future<Output = Result<RunningInstance>> + Send + '_>> {
        Box::pin(async move { Ok(self.start_instance()?) })
    }

    fn stop(
        &mut self,
        instance: RunningInstance,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>> {
        Box::pin(async move {
            self.stop_instance(instance).await?;
            Ok(())
        })
    }

    fn kill_strays(&mut self) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>> {
        Box::pin(async move { Ok(ProcessSupervisor::kill_strays(self).await?) })
    }
}
