use std::collections::VecDeque;
use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicU32, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use devloop::errors::Result;
use devloop::exec::{BuildBackend, BuildResult, ProcessBackend, ProcessHandle};

/// A fake compiler that:
/// - counts how often it was invoked
/// - hands out pre-scripted results, then `Success` once the script runs out.
///
/// Clones share state, so a test can keep one to inspect while the
/// coordinator owns the other.
#[derive(Debug, Clone, Default)]
pub struct FakeBuilder {
    results: Arc<Mutex<VecDeque<BuildResult>>>,
    builds: Arc<AtomicUsize>,
}

impl FakeBuilder {
    pub fn new(results: impl IntoIterator<Item = BuildResult>) -> Self {
        Self {
            results: Arc::new(Mutex::new(results.into_iter().collect())),
            builds: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn failing(errors: &str) -> Self {
        Self::new([BuildResult::Failure(errors.to_string())])
    }

    pub fn push(&self, result: BuildResult) {
        self.results.lock().unwrap().push_back(result);
    }

    pub fn builds(&self) -> usize {
        self.builds.load(Ordering::SeqCst)
    }
}

impl BuildBackend for FakeBuilder {
    fn build(&mut self) -> Pin<Box<dyn Future<Output = Result<BuildResult>> + Send + '_>> {
        self.builds.fetch_add(1, Ordering::SeqCst);
        let result = self
            .results
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(BuildResult::Success);
        Box::pin(async move { Ok(result) })
    }
}

/// Stand-in for a running child.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FakeInstance {
    pub pid: u32,
}

impl ProcessHandle for FakeInstance {
    fn pid(&self) -> u32 {
        self.pid
    }
}

/// A fake process backend that records which instances were started and
/// stopped. Pids count up from 1.
#[derive(Debug, Clone, Default)]
pub struct FakeProcessBackend {
    next_pid: Arc<AtomicU32>,
    started: Arc<Mutex<Vec<u32>>>,
    stopped: Arc<Mutex<Vec<u32>>>,
    stray_kills: Arc<AtomicUsize>,
    fail_start: bool,
}

impl FakeProcessBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every `start` fails, as if the artifact could not be spawned.
    pub fn failing_start() -> Self {
        Self {
            fail_start: true,
            ..Self::default()
        }
    }

    pub fn started(&self) -> Vec<u32> {
        self.started.lock().unwrap().clone()
    }

    pub fn stopped(&self) -> Vec<u32> {
        self.stopped.lock().unwrap().clone()
    }

    pub fn stray_kills(&self) -> usize {
        self.stray_kills.load(Ordering::SeqCst)
    }

    /// Instances started and not yet stopped.
    pub fn running(&self) -> Vec<u32> {
        let stopped = self.stopped();
        self.started()
            .into_iter()
            .filter(|pid| !stopped.contains(pid))
            .collect()
    }
}

impl ProcessBackend for FakeProcessBackend {
    type Handle = FakeInstance;

    fn start(&mut self) -> Pin<Box<dyn Future<Output = Result<FakeInstance>> + Send + '_>> {
        Box::pin(async move {
            if self.fail_start {
                return Err(anyhow::anyhow!("spawning fake artifact: no such file").into());
            }
            let pid = self.next_pid.fetch_add(1, Ordering::SeqCst) + 1;
            self.started.lock().unwrap().push(pid);
            Ok(FakeInstance { pid })
        })
    }

    fn stop(
        &mut self,
        handle: FakeInstance,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>> {
        Box::pin(async move {
            self.stopped.lock().unwrap().push(handle.pid);
            Ok(())
        })
    }

    fn kill_strays(&mut self) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>> {
        Box::pin(async move {
            self.stray_kills.fetch_add(1, Ordering::SeqCst);
            Ok(())
        })
    }
}
