use std::{path::PathBuf, sync::Arc};

use solti_model::{BuildId, BuildInfo, Pid};
use tokio::runtime::Handle;
use tracing::{debug, info, instrument, warn};

use crate::{
    config::TrackerConfig,
    error::BuildError,
    probe::{OsProbe, ProcessProbe},
    registry::BuildRegistry,
    sentinel::SentinelStore,
    sink::CompletionSink,
    watcher::Watcher,
};

/// Tracks claimed and running builds and reports each worker's end exactly once.
///
/// Cheap to clone; clones share all state. Construct one per agent and pass it to the dispatcher.
///
/// The registries are only reachable through the manager, so every active entry has a watcher:
///
/// ```compile_fail
/// fn bypass(mgr: &solti_build::BuildManager) {
///     let _ = mgr.registry();
/// }
/// ```
#[derive(Clone)]
pub struct BuildManager {
    registry: BuildRegistry,
    sentinel: SentinelStore,
    probe: Arc<dyn ProcessProbe>,
    sink: Arc<dyn CompletionSink>,
    runtime: Handle,
    cleanup_sentinel: bool,
}

impl BuildManager {
    /// Must be called from within a tokio runtime; watchers are spawned onto it.
    pub fn new(
        cfg: &TrackerConfig,
        probe: Arc<dyn ProcessProbe>,
        sink: Arc<dyn CompletionSink>,
    ) -> Result<Self, BuildError> {
        let runtime = Handle::try_current().map_err(|e| BuildError::NoRuntime(e.to_string()))?;
        let sentinel = SentinelStore::open(&cfg.sentinel_dir)?;

        info!(target: "solti.build.manager", dir = %sentinel.dir().display(), sink = sink.name(), "build manager ready");
        Ok(Self {
            registry: BuildRegistry::new(),
            sentinel,
            probe,
            sink,
            runtime,
            cleanup_sentinel: cfg.cleanup_sentinel,
        })
    }

    /// Same as [`new`](Self::new) with the host [`OsProbe`].
    pub fn with_os_probe(
        cfg: &TrackerConfig,
        sink: Arc<dyn CompletionSink>,
    ) -> Result<Self, BuildError> {
        Self::new(cfg, Arc::new(OsProbe::new(cfg.poll_interval)), sink)
    }

    /// Remember that the dispatcher took `build_id` and is about to spawn its worker.
    pub fn claim(&self, build_id: impl Into<BuildId>) {
        let build_id = build_id.into();
        debug!(target: "solti.build.manager", %build_id, "build claimed");
        self.registry.claim(build_id);
    }

    /// Forget a claim whose worker will never be spawned.
    pub fn unclaim(&self, build_id: &str) {
        self.registry.unclaim(build_id);
    }

    /// Start tracking the already spawned worker `pid` running `build`.
    ///
    /// Clears the build's claim, arms its sentinel and spawns the watcher.
    /// Returns without waiting for anything. Re-registering a pid overwrites the
    /// previous entry; both builds still get their own report.
    #[instrument(level = "debug", skip(self, build), fields(build_id = %build.build_id))]
    pub fn register(&self, pid: Pid, build: BuildInfo) {
        let payload = serde_json::to_string(&build).unwrap_or_else(|e| format!("<{e}>"));
        info!(target: "solti.build.manager", pid, build = %payload, "add build");

        let (registration, replaced) = self.registry.activate(pid, build.clone());
        if let Some(old) = replaced {
            warn!(target: "solti.build.manager", pid, replaced = %old.build_id, "pid registered twice; entry overwritten");
        }

        let arm_error = self.sentinel.arm(&build).err().map(|e| {
            warn!(target: "solti.build.manager", pid, build_id = %build.build_id, error = %e, "failed to pre-write sentinel");
            e.to_string()
        });

        let watcher = Watcher {
            registration,
            build,
            arm_error,
            registry: self.registry.clone(),
            sentinel: self.sentinel.clone(),
            probe: Arc::clone(&self.probe),
            sink: Arc::clone(&self.sink),
            cleanup_sentinel: self.cleanup_sentinel,
        };
        self.runtime.spawn(watcher.run());
    }

    /// Number of workers currently running.
    pub fn instance_count(&self) -> usize {
        self.registry.active_count()
    }

    /// Copies of the builds currently running.
    pub fn instances(&self) -> Vec<BuildInfo> {
        self.registry.active_builds()
    }

    /// Build running under `pid`, if any.
    pub fn instance(&self, pid: Pid) -> Option<BuildInfo> {
        self.registry.get(pid)
    }

    /// Number of claimed builds without a running worker.
    pub fn pre_instance_count(&self) -> usize {
        self.registry.pending_count()
    }

    pub fn is_pending(&self, build_id: &str) -> bool {
        self.registry.is_pending(build_id)
    }

    /// Where the worker for `build` finds its sentinel file.
    pub fn sentinel_path(&self, build: &BuildInfo) -> PathBuf {
        self.sentinel.path_for(&build.build_id, build.vm_seq_id)
    }
}
