//! Per-build crash marker shared between the agent and the worker process.
//!
//! The agent writes [`KILLED_NOTICE`] into the file when it registers a worker.
//! A worker that shuts down on its own terms truncates the file, or replaces it with
//! its own error text. Whatever is left when the process is gone decides the outcome:
//! an empty file is a clean exit, anything else is the failure message.
use std::{
    fs, io,
    path::{Path, PathBuf},
};

use solti_model::{BuildId, BuildInfo, VmSeqId};
use tracing::{debug, warn};

use crate::error::BuildError;

/// Default sentinel content: what gets reported when the worker never cleared the file.
pub const KILLED_NOTICE: &str = "business build process exited abnormally, likely killed by the OS or \
     another program; check the host, reduce load and retry, or reinstall/restart the agent and retry. \
     (Builder process was killed.)";

const SUFFIX: &str = "_build_msg.log";

#[derive(Debug, Clone)]
pub struct SentinelStore {
    dir: PathBuf,
}

impl SentinelStore {
    /// Store rooted at `dir`; the directory is not touched.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Store rooted at `dir`, creating the directory if needed.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self, BuildError> {
        let dir = dir.into();
        fs::create_dir_all(&dir).map_err(|source| BuildError::SentinelDir {
            path: dir.clone(),
            source,
        })?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Deterministic sentinel location for one (build, slot) pair.
    pub fn path_for(&self, build_id: &BuildId, vm_seq_id: VmSeqId) -> PathBuf {
        self.dir
            .join(format!("{}_{vm_seq_id}{SUFFIX}", file_safe(build_id.as_str())))
    }

    /// Pre-write [`KILLED_NOTICE`] for `build` and open the file up for the worker.
    pub fn arm(&self, build: &BuildInfo) -> io::Result<PathBuf> {
        let path = self.path_for(&build.build_id, build.vm_seq_id);
        fs::write(&path, KILLED_NOTICE)?;
        allow_worker_write(&path)?;
        debug!(target: "solti.build.sentinel", path = %path.display(), "sentinel armed");
        Ok(path)
    }

    /// Current sentinel content, trimmed. Missing or unreadable files read as empty.
    pub async fn read(&self, build: &BuildInfo) -> String {
        let path = self.path_for(&build.build_id, build.vm_seq_id);
        match tokio::fs::read_to_string(&path).await {
            Ok(content) => content.trim().to_string(),
            Err(e) if e.kind() == io::ErrorKind::NotFound => String::new(),
            Err(e) => {
                warn!(target: "solti.build.sentinel", path = %path.display(), error = %e, "sentinel unreadable; treating as empty");
                String::new()
            }
        }
    }

    /// Delete the sentinel of `build`; a missing file is not an error.
    pub async fn clear(&self, build: &BuildInfo) {
        let path = self.path_for(&build.build_id, build.vm_seq_id);
        match tokio::fs::remove_file(&path).await {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => {
                warn!(target: "solti.build.sentinel", path = %path.display(), error = %e, "failed to remove sentinel")
            }
        }
    }
}

/// Keep build ids from escaping the sentinel directory.
///
/// Bytes outside `[A-Za-z0-9._-]` become `%XX`, so distinct ids never share a file.
fn file_safe(id: &str) -> String {
    let mut out = String::with_capacity(id.len());
    for b in id.bytes() {
        if b.is_ascii_alphanumeric() || matches!(b, b'-' | b'_' | b'.') {
            out.push(b as char);
        } else {
            out.push_str(&format!("%{b:02X}"));
        }
    }
    out
}

#[cfg(unix)]
fn allow_worker_write(path: &Path) -> io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(0o666))
}

#[cfg(not(unix))]
fn allow_worker_write(_path: &Path) -> io::Result<()> {
    Ok(())
}
