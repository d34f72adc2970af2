use std::sync::Arc;

use solti_model::{BuildInfo, Pid};
use tracing::{debug, info, warn};

use crate::{
    outcome::Outcome,
    probe::{ProcessHandle, ProcessProbe},
    registry::{BuildRegistry, Registration},
    sentinel::SentinelStore,
    sink::CompletionSink,
};

/// Supervises one registered worker until its single report is delivered.
pub(crate) struct Watcher {
    pub(crate) registration: Registration,
    pub(crate) build: BuildInfo,
    /// Why the sentinel could not be pre-written, if it could not.
    pub(crate) arm_error: Option<String>,
    pub(crate) registry: BuildRegistry,
    pub(crate) sentinel: SentinelStore,
    pub(crate) probe: Arc<dyn ProcessProbe>,
    pub(crate) sink: Arc<dyn CompletionSink>,
    pub(crate) cleanup_sentinel: bool,
}

enum WatchState {
    Spawned,
    Watching(ProcessHandle),
    Resolved(Outcome),
    Reported,
}

impl Watcher {
    pub(crate) async fn run(self) {
        let pid = self.registration.pid();
        let mut state = WatchState::Spawned;

        loop {
            state = match state {
                WatchState::Spawned => self.locate(pid),
                WatchState::Watching(handle) => self.wait(pid, handle).await,
                WatchState::Resolved(outcome) => self.report(outcome).await,
                WatchState::Reported => break,
            };
        }
    }

    fn locate(&self, pid: Pid) -> WatchState {
        match self.probe.lookup(pid) {
            Ok(handle) => {
                debug!(target: "solti.build.watcher", pid, build_id = %self.build.build_id, "watching worker");
                WatchState::Watching(handle)
            }
            Err(e) => {
                let outcome = Outcome::lookup_failed(pid, &e);
                warn!(target: "solti.build.watcher", pid, build_id = %self.build.build_id, "{}", outcome.message());
                WatchState::Resolved(outcome)
            }
        }
    }

    async fn wait(&self, pid: Pid, handle: ProcessHandle) -> WatchState {
        let waited = self.probe.wait(handle).await;
        let content = self.sentinel.read(&self.build).await;

        match &waited {
            Ok(state) => {
                info!(target: "solti.build.watcher", pid, build_id = %self.build.build_id, %state, msg = %content, "worker finished")
            }
            Err(e) => {
                info!(target: "solti.build.watcher", pid, build_id = %self.build.build_id, error = %e, msg = %content, "worker finished")
            }
        }

        let outcome = match &self.arm_error {
            // An empty read proves nothing when the notice was never written.
            Some(err) if content.is_empty() => Outcome::unarmed(pid, &waited, err),
            _ => Outcome::resolve(pid, &waited, &content),
        };
        WatchState::Resolved(outcome)
    }

    async fn report(&self, outcome: Outcome) -> WatchState {
        if !self.registry.deactivate(self.registration) {
            debug!(target: "solti.build.watcher", pid = self.registration.pid(), build_id = %self.build.build_id, "entry already replaced by a newer registration");
        }
        if self.cleanup_sentinel {
            self.sentinel.clear(&self.build).await;
        }

        debug!(target: "solti.build.watcher", build_id = %self.build.build_id, outcome = outcome.kind(), sink = self.sink.name(), "reporting completion");
        self.sink
            .report(outcome.into_completion(self.build.clone()))
            .await;
        WatchState::Reported
    }
}
