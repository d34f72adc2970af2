mod cli;

use std::{path::Path, process::Command, sync::Arc};

use anyhow::{Context, bail};
use clap::Parser;
use tracing::{info, warn};

use solti_build::{BuildManager, ChannelSink, CompletionSink, LogSink};
use solti_model::BuildInfo;
use solti_observe::init_logger;

use crate::cli::Cli;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    init_logger(&cli.logger_config()?)?;
    info!("logger initialized");

    let (sink, mut completions) = ChannelSink::new();
    let manager = BuildManager::with_os_probe(&cli.tracker_config(), Arc::new(sink))?;

    let build = cli.build_info();
    manager.claim(build.build_id.clone());

    let sentinel = manager.sentinel_path(&build);
    let child = match spawn_worker(&cli.command, &build, &sentinel) {
        Ok(child) => child,
        Err(e) => {
            manager.unclaim(build.build_id.as_str());
            return Err(e);
        }
    };
    // The watcher reaps the child; the handle is not needed past this point.
    // The sentinel is armed here, after the spawn; see the `command` help.
    manager.register(child.id(), build);

    tokio::select! {
        done = completions.recv() => {
            let Some(done) = done else {
                bail!("completion channel closed before the worker was resolved");
            };
            LogSink.report(done.clone()).await;
            println!("{}", serde_json::to_string(&done)?);
            if !done.success {
                bail!("build {} failed: {}", done.build.build_id, done.message);
            }
        }
        _ = tokio::signal::ctrl_c() => {
            warn!(running = manager.instance_count(), "interrupted; worker left running");
        }
    }

    Ok(())
}

fn spawn_worker(
    command: &[String],
    build: &BuildInfo,
    sentinel: &Path,
) -> anyhow::Result<std::process::Child> {
    let (program, args) = command.split_first().context("empty worker command")?;

    Command::new(program)
        .args(args)
        .env("SOLTI_BUILD_MSG_FILE", sentinel)
        .env("SOLTI_BUILD_ID", build.build_id.as_str())
        .env("SOLTI_VM_SEQ_ID", build.vm_seq_id.to_string())
        .spawn()
        .with_context(|| format!("spawn worker `{program}`"))
}
