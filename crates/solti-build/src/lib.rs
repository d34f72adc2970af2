//! Lifecycle tracking for spawned build-worker processes.
//!
//! A dispatcher [`claim`](BuildManager::claim)s a build before it spawns the worker and
//! [`register`](BuildManager::register)s the worker's pid right after.
//! From that point a watcher task owns the process: it waits for it to terminate,
//! decides between a clean exit and a crash using the build's sentinel file,
//! and hands exactly one [`BuildCompletion`] to the configured [`CompletionSink`].

mod config;
pub use config::TrackerConfig;

mod error;
pub use error::{BuildError, ProbeError};

mod manager;
pub use manager::BuildManager;

mod outcome;
pub use outcome::Outcome;

pub mod probe;
pub use probe::{ExitState, OsProbe, ProcessHandle, ProcessProbe};

mod registry;

pub mod sentinel;
pub use sentinel::{KILLED_NOTICE, SentinelStore};

pub mod sink;
pub use sink::{ChannelSink, CompletionSink, LogSink};

mod watcher;

pub use solti_model::{BuildCompletion, BuildId, BuildInfo, Pid, VmSeqId};
