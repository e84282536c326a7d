// src/exec/backend.rs

//! Pluggable build/process backends.
//!
//! The coordinator talks to a `BuildBackend` and a `ProcessBackend` instead of
//! spawning commands itself, so tests can swap in fakes that record what was
//! asked of them without touching a compiler or the process table.
//!
//! - [`CommandBuilder`](super::builder::CommandBuilder) runs the real
//!   compiler.
//! - [`ProcessSupervisor`](super::supervisor::ProcessSupervisor) runs the
//!   built artifact.

use std::fmt::Debug;
use std::future::Future;
use std::pin::Pin;

use crate::errors::Result;
use crate::exec::builder::BuildResult;

/// Produces the artifact.
pub trait BuildBackend: Send {
    /// Run one build to completion. `Err` means the build could not even be
    /// attempted (e.g. the compiler is missing); a compile error is an
    /// `Ok(BuildResult::Failure)`.
    fn build(&mut self) -> Pin<Box<dyn Future<Output = Result<BuildResult>> + Send + '_>>;
}

/// A started instance of the artifact.
pub trait ProcessHandle: Send + Debug {
    fn pid(&self) -> u32;
}

/// Starts and stops instances of the artifact.
pub trait ProcessBackend: Send {
    type Handle: ProcessHandle;

    fn start(&mut self) -> Pin<Box<dyn Future<Output = Result<Self::Handle>> + Send + '_>>;

    /// Stop `handle` and wait for it to be gone.
    fn stop(
        &mut self,
        handle: Self::Handle,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>>;

    /// Stop any process running the artifact that we do not own.
    fn kill_strays(&mut self) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>>;
}
