//! Receivers of terminal build reports.
use async_trait::async_trait;
use solti_model::BuildCompletion;
use tokio::sync::mpsc;
use tracing::{info, warn};

/// Consumer of build completions.
///
/// The tracker calls [`report`](CompletionSink::report) exactly once per registered build.
/// Should an implementation ever see a second report for the same build, the last one wins.
#[async_trait]
pub trait CompletionSink: Send + Sync + 'static {
    async fn report(&self, completion: BuildCompletion);

    fn name(&self) -> &'static str;
}

/// Writes completions to the log and nothing else.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogSink;

#[async_trait]
impl CompletionSink for LogSink {
    async fn report(&self, c: BuildCompletion) {
        if c.success {
            info!(target: "solti.build.sink", build_id = %c.build.build_id, vm_seq_id = c.build.vm_seq_id, message = %c.message, "build finished");
        } else {
            warn!(target: "solti.build.sink", build_id = %c.build.build_id, vm_seq_id = c.build.vm_seq_id, message = %c.message, "build failed");
        }
    }

    fn name(&self) -> &'static str {
        "log"
    }
}

/// Forwards completions into an unbounded channel.
#[derive(Debug, Clone)]
pub struct ChannelSink {
    tx: mpsc::UnboundedSender<BuildCompletion>,
}

impl ChannelSink {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<BuildCompletion>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

#[async_trait]
impl CompletionSink for ChannelSink {
    async fn report(&self, completion: BuildCompletion) {
        if let Err(e) = self.tx.send(completion) {
            warn!(target: "solti.build.sink", build_id = %e.0.build.build_id, "completion receiver dropped; report lost");
        }
    }

    fn name(&self) -> &'static str {
        "channel"
    }
}

#[cfg(test)]
mod tests {
    use solti_model::BuildInfo;

    use super::*;

    #[tokio::test]
    async fn channel_sink_forwards_in_order() {
        let (sink, mut rx) = ChannelSink::new();
        sink.report(BuildCompletion::succeeded(BuildInfo::new("b1", 1), "ok"))
            .await;
        sink.report(BuildCompletion::failed(BuildInfo::new("b2", 1), "boom"))
            .await;

        assert_eq!(rx.recv().await.unwrap().build.build_id.as_str(), "b1");
        assert!(!rx.recv().await.unwrap().success);
    }

    #[tokio::test]
    async fn dropped_receiver_does_not_panic() {
        let (sink, rx) = ChannelSink::new();
        drop(rx);
        sink.report(BuildCompletion::failed(BuildInfo::new("b1", 1), "lost"))
            .await;
    }

    #[tokio::test]
    async fn log_sink_accepts_both_outcomes() {
        let sink = LogSink;
        assert_eq!(sink.name(), "log");
        sink.report(BuildCompletion::succeeded(BuildInfo::new("b1", 1), "ok"))
            .await;
        sink.report(BuildCompletion::failed(BuildInfo::new("b1", 1), "bad"))
            .await;
    }
}
