use std::{path::PathBuf, time::Duration};

/// Tunables of the build tracker.
#[derive(Debug, Clone)]
pub struct TrackerConfig {
    /// Directory holding the per-build sentinel files. Created on demand.
    pub sentinel_dir: PathBuf,
    /// Liveness poll period for workers that are not children of this agent.
    pub poll_interval: Duration,
    /// Remove the sentinel file once its build has been resolved.
    pub cleanup_sentinel: bool,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            sentinel_dir: PathBuf::from("build_tmp"),
            poll_interval: Duration::from_millis(500),
            cleanup_sentinel: true,
        }
    }
}

impl TrackerConfig {
    pub fn with_sentinel_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.sentinel_dir = dir.into();
        self
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Leave sentinel files on disk after resolution (debugging aid).
    pub fn keep_sentinel(mut self) -> Self {
        self.cleanup_sentinel = false;
        self
    }
}
