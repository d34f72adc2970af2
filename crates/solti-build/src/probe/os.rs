use std::time::Duration;

use async_trait::async_trait;
use solti_model::Pid;

use super::{ExitState, ProcessHandle, ProcessProbe};
use crate::error::ProbeError;

/// [`ProcessProbe`] backed by the host OS.
///
/// On Unix, children of this agent are reaped with `waitpid`; any other process
/// is polled with `kill(pid, 0)` until it disappears.
#[derive(Debug, Clone)]
pub struct OsProbe {
    poll_interval: Duration,
}

impl OsProbe {
    pub fn new(poll_interval: Duration) -> Self {
        Self { poll_interval }
    }
}

impl Default for OsProbe {
    fn default() -> Self {
        Self::new(Duration::from_millis(500))
    }
}

#[cfg(unix)]
#[async_trait]
impl ProcessProbe for OsProbe {
    fn lookup(&self, pid: Pid) -> Result<ProcessHandle, ProbeError> {
        let raw = unix_impl::raw_pid(pid)?;
        match unix_impl::alive(raw) {
            Ok(true) => Ok(ProcessHandle::new(pid)),
            Ok(false) => Err(ProbeError::NotFound(pid)),
            Err(source) => Err(ProbeError::Lookup { pid, source }),
        }
    }

    async fn wait(&self, handle: ProcessHandle) -> Result<ExitState, ProbeError> {
        let pid = handle.pid();
        let raw = unix_impl::raw_pid(pid)?;

        let reaped = tokio::task::spawn_blocking(move || unix_impl::wait_child(raw))
            .await
            .map_err(|e| ProbeError::Join(e.to_string()))?;

        match reaped {
            Ok(state) => Ok(state),
            Err(e) if e.raw_os_error() == Some(libc::ECHILD) => {
                tracing::debug!(target: "solti.build.probe", pid, "not our child; polling liveness");
                loop {
                    match unix_impl::alive(raw) {
                        Ok(true) => tokio::time::sleep(self.poll_interval).await,
                        Ok(false) => return Ok(ExitState::Unknown),
                        Err(e) => return Err(ProbeError::Wait(e)),
                    }
                }
            }
            Err(e) => Err(ProbeError::Wait(e)),
        }
    }
}

#[cfg(not(unix))]
#[async_trait]
impl ProcessProbe for OsProbe {
    fn lookup(&self, _pid: Pid) -> Result<ProcessHandle, ProbeError> {
        Err(ProbeError::Unsupported)
    }

    async fn wait(&self, _handle: ProcessHandle) -> Result<ExitState, ProbeError> {
        Err(ProbeError::Unsupported)
    }
}

#[cfg(unix)]
mod unix_impl {
    use std::io;

    use solti_model::Pid;

    use crate::{error::ProbeError, probe::ExitState};

    pub fn raw_pid(pid: Pid) -> Result<libc::pid_t, ProbeError> {
        match libc::pid_t::try_from(pid) {
            Ok(raw) if raw > 0 => Ok(raw),
            _ => Err(ProbeError::InvalidPid(pid)),
        }
    }

    /// `kill(pid, 0)`: `EPERM` still proves the process exists.
    pub fn alive(raw: libc::pid_t) -> io::Result<bool> {
        let rc = unsafe { libc::kill(raw, 0) };
        if rc == 0 {
            return Ok(true);
        }
        let err = io::Error::last_os_error();
        match err.raw_os_error() {
            Some(libc::EPERM) => Ok(true),
            Some(libc::ESRCH) => Ok(false),
            _ => Err(err),
        }
    }

    /// Blocking `waitpid`; retried on `EINTR`.
    pub fn wait_child(raw: libc::pid_t) -> io::Result<ExitState> {
        let mut status: libc::c_int = 0;
        loop {
            let rc = unsafe { libc::waitpid(raw, &mut status, 0) };
            if rc == raw {
                return Ok(decode(status));
            }
            let err = io::Error::last_os_error();
            if err.kind() != io::ErrorKind::Interrupted {
                return Err(err);
            }
        }
    }

    fn decode(status: libc::c_int) -> ExitState {
        if libc::WIFEXITED(status) {
            ExitState::Exited(libc::WEXITSTATUS(status))
        } else if libc::WIFSIGNALED(status) {
            ExitState::Signaled(libc::WTERMSIG(status))
        } else {
            ExitState::Unknown
        }
    }
}
