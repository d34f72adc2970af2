use std::{path::PathBuf, time::Duration};

use clap::Parser;
use solti_build::TrackerConfig;
use solti_model::BuildInfo;
use solti_observe::{LoggerConfig, LoggerError, LoggerLevel};

/// Run one build worker under the lifecycle tracker and print its completion as JSON.
#[derive(Parser, Debug)]
#[command(name = "solti-agentd", version)]
pub struct Cli {
    /// Directory for per-build sentinel files.
    #[arg(long, env = "SOLTI_SENTINEL_DIR", default_value = "build_tmp")]
    pub sentinel_dir: PathBuf,

    /// Liveness poll period for workers that are not our children.
    #[arg(long, env = "SOLTI_POLL_INTERVAL_MS", default_value_t = 500)]
    pub poll_interval_ms: u64,

    /// Keep the sentinel file after the build is resolved.
    #[arg(long)]
    pub keep_sentinel: bool,

    /// Log filter directive, e.g. `info` or `warn,solti.build=debug`.
    #[arg(long, env = "SOLTI_LOG_LEVEL", default_value = "info")]
    pub log_level: String,

    /// Log output: text, json or journald.
    #[arg(long, env = "SOLTI_LOG_FORMAT", default_value = "text")]
    pub log_format: String,

    #[arg(long, env = "SOLTI_BUILD_ID")]
    pub build_id: String,

    #[arg(long, env = "SOLTI_VM_SEQ_ID", default_value_t = 1)]
    pub vm_seq_id: u32,

    #[arg(long, default_value = "")]
    pub project_id: String,

    #[arg(long, default_value = "")]
    pub pipeline_id: String,

    /// Worker program and its arguments.
    ///
    /// The worker finds its message file in `SOLTI_BUILD_MSG_FILE`. The crash notice is
    /// written there only after the worker has been spawned, so the worker must not touch
    /// the file until it is done: truncate it on success, or overwrite it with the error.
    /// Anything written earlier is replaced by the notice.
    #[arg(trailing_var_arg = true, required = true, num_args = 1..)]
    pub command: Vec<String>,
}

impl Cli {
    pub fn logger_config(&self) -> Result<LoggerConfig, LoggerError> {
        Ok(LoggerConfig {
            format: self.log_format.parse()?,
            level: LoggerLevel::new(self.log_level.as_str())?,
            ..Default::default()
        })
    }

    pub fn tracker_config(&self) -> TrackerConfig {
        let cfg = TrackerConfig::default()
            .with_sentinel_dir(&self.sentinel_dir)
            .with_poll_interval(Duration::from_millis(self.poll_interval_ms));
        if self.keep_sentinel {
            cfg.keep_sentinel()
        } else {
            cfg
        }
    }

    pub fn build_info(&self) -> BuildInfo {
        BuildInfo::new(self.build_id.as_str(), self.vm_seq_id)
            .with_project(&self.project_id)
            .with_pipeline(&self.pipeline_id)
    }
}
