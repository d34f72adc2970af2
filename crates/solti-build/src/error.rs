use std::{io, path::PathBuf};

use solti_model::Pid;
use thiserror::Error;

/// Failure to observe a worker process through a [`ProcessProbe`](crate::ProcessProbe).
#[derive(Error, Debug)]
pub enum ProbeError {
    #[error("invalid pid {0}")]
    InvalidPid(Pid),
    #[error("process {0} not found")]
    NotFound(Pid),
    #[error("lookup process {pid}: {source}")]
    Lookup {
        pid: Pid,
        #[source]
        source: io::Error,
    },
    #[error("wait: {0}")]
    Wait(#[source] io::Error),
    #[error("wait task aborted: {0}")]
    Join(String),
    #[error("process probing is not supported on this platform")]
    Unsupported,
}

/// Errors raised while constructing a [`BuildManager`](crate::BuildManager).
///
/// Nothing after construction fails: build-level problems end up in the completion report.
#[derive(Error, Debug)]
pub enum BuildError {
    #[error("no tokio runtime available: {0}")]
    NoRuntime(String),
    #[error("sentinel directory {}: {source}", .path.display())]
    SentinelDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}
