use solti_model::{BuildCompletion, BuildInfo, Pid};

use crate::{error::ProbeError, probe::ExitState, sentinel::KILLED_NOTICE};

/// Terminal disposition of a watched worker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Wait succeeded and the sentinel was cleared.
    NormalExit { message: String },
    /// The sentinel still holds text: the crash notice or the worker's own error.
    WorkerReportedFailure { message: String },
    /// Waiting on the process failed; the sentinel text wins over the wait error when present.
    ProcessWaitFailure { message: String },
    /// The pid could not be resolved to a process at all.
    ProcessLookupFailure { message: String },
}

impl Outcome {
    pub fn lookup_failed(pid: Pid, err: &ProbeError) -> Self {
        Outcome::ProcessLookupFailure {
            message: format!("build process err, pid: {pid}, err: {err}"),
        }
    }

    /// Combine the wait result with the (trimmed) sentinel content.
    pub fn resolve(pid: Pid, waited: &Result<ExitState, ProbeError>, sentinel: &str) -> Self {
        match waited {
            Err(e) if sentinel.is_empty() => Outcome::ProcessWaitFailure {
                message: e.to_string(),
            },
            Err(_) => Outcome::ProcessWaitFailure {
                message: sentinel.to_string(),
            },
            Ok(_) if !sentinel.is_empty() => Outcome::WorkerReportedFailure {
                message: sentinel.to_string(),
            },
            Ok(_) => Outcome::NormalExit {
                message: format!("worker pid[{pid}] exit"),
            },
        }
    }

    /// Resolution for a worker whose sentinel could not be pre-written.
    ///
    /// Never a success: without the notice on disk a crash looks exactly like a clean exit.
    pub fn unarmed(pid: Pid, waited: &Result<ExitState, ProbeError>, arm_error: &str) -> Self {
        match waited {
            Err(e) => Outcome::ProcessWaitFailure {
                message: e.to_string(),
            },
            Ok(ExitState::Signaled(_)) => Outcome::WorkerReportedFailure {
                message: KILLED_NOTICE.to_string(),
            },
            Ok(state) => Outcome::WorkerReportedFailure {
                message: format!(
                    "worker pid[{pid}] {state}, exit disposition unknown: build message file not written: {arm_error}"
                ),
            },
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::NormalExit { .. })
    }

    pub fn message(&self) -> &str {
        match self {
            Outcome::NormalExit { message }
            | Outcome::WorkerReportedFailure { message }
            | Outcome::ProcessWaitFailure { message }
            | Outcome::ProcessLookupFailure { message } => message,
        }
    }

    /// Short label for logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Outcome::NormalExit { .. } => "normal_exit",
            Outcome::WorkerReportedFailure { .. } => "worker_reported_failure",
            Outcome::ProcessWaitFailure { .. } => "process_wait_failure",
            Outcome::ProcessLookupFailure { .. } => "process_lookup_failure",
        }
    }

    pub fn into_completion(self, build: BuildInfo) -> BuildCompletion {
        let success = self.is_success();
        let message = match self {
            Outcome::NormalExit { message }
            | Outcome::WorkerReportedFailure { message }
            | Outcome::ProcessWaitFailure { message }
            | Outcome::ProcessLookupFailure { message } => message,
        };
        BuildCompletion {
            build,
            success,
            message,
        }
    }
}
