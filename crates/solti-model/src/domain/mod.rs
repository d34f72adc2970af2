mod build_id;
pub use build_id::BuildId;

mod build_info;
pub use build_info::BuildInfo;

mod build_completion;
pub use build_completion::BuildCompletion;

/// OS process identifier of a spawned build worker.
///
/// Matches what `std::process::Child::id` hands out.
pub type Pid = u32;

/// Executor slot sequence number.
///
/// Distinguishes concurrent executors of the same build on one host.
pub type VmSeqId = u32;
