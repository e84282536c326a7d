// src/exec/mod.rs

//! Process execution layer.
//!
//! - [`builder`] runs the compiler and reports a [`BuildResult`].
//! - [`supervisor`] runs the built artifact and stops it again.
//! - [`script`] runs the optional pre/post-build hooks.
//! - [`backend`] holds the traits the coordinator is written against.
//! - [`environment`] and [`signal`] are small helpers for the child process.

pub mod backend;
pub mod builder;
pub mod command;
pub mod environment;
pub mod script;
pub mod signal;
pub mod supervisor;

pub use backend::{BuildBackend, ProcessBackend, ProcessHandle};
pub use builder::{BuildResult, CommandBuilder};
pub use environment::child_environment;
pub use script::{Script, ScriptRun, find_shebang};
pub use supervisor::{InstanceExit, ProcessSupervisor, RunningInstance};
