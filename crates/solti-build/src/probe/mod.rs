//! Capability interface over OS processes the tracker did not spawn itself.
use std::fmt;

use async_trait::async_trait;
use solti_model::Pid;

use crate::error::ProbeError;

mod os;
pub use os::OsProbe;

/// Proof that a process existed when it was looked up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProcessHandle {
    pid: Pid,
}

impl ProcessHandle {
    pub fn new(pid: Pid) -> Self {
        Self { pid }
    }

    pub fn pid(&self) -> Pid {
        self.pid
    }
}

/// How a watched process ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitState {
    Exited(i32),
    Signaled(i32),
    /// The process is gone but its status was collected by someone else.
    Unknown,
}

impl fmt::Display for ExitState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExitState::Exited(code) => write!(f, "exit status {code}"),
            ExitState::Signaled(sig) => write!(f, "signal {sig}"),
            ExitState::Unknown => f.write_str("exited"),
        }
    }
}

/// Lookup and termination wait for worker processes.
///
/// `lookup` must not block; `wait` resolves once the process is gone.
#[async_trait]
pub trait ProcessProbe: Send + Sync + 'static {
    fn lookup(&self, pid: Pid) -> Result<ProcessHandle, ProbeError>;

    async fn wait(&self, handle: ProcessHandle) -> Result<ExitState, ProbeError>;
}
