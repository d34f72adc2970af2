#![allow(dead_code)]

use std::{
    collections::HashMap,
    fs, io,
    path::Path,
    sync::{Arc, Mutex},
    time::Duration,
};

use async_trait::async_trait;
use solti_build::{
    BuildCompletion, BuildManager, ChannelSink, ExitState, Pid, ProbeError, ProcessHandle,
    ProcessProbe, TrackerConfig,
};
use tokio::sync::{mpsc, watch};

type Exit = Option<Result<ExitState, String>>;

/// Scripted process table: a pid exists once `spawn`ed and ends on `exit`/`fail_wait`.
#[derive(Default)]
pub struct FakeProbe {
    procs: Mutex<HashMap<Pid, watch::Sender<Exit>>>,
}

impl FakeProbe {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn spawn(&self, pid: Pid) {
        let (tx, _) = watch::channel(None);
        self.procs.lock().unwrap().insert(pid, tx);
    }

    pub fn exit(&self, pid: Pid, state: ExitState) {
        self.finish(pid, Ok(state));
    }

    pub fn fail_wait(&self, pid: Pid, reason: &str) {
        self.finish(pid, Err(reason.to_string()));
    }

    fn finish(&self, pid: Pid, exit: Result<ExitState, String>) {
        let procs = self.procs.lock().unwrap();
        procs
            .get(&pid)
            .expect("pid was never spawned")
            .send_replace(Some(exit));
    }
}

#[async_trait]
impl ProcessProbe for FakeProbe {
    fn lookup(&self, pid: Pid) -> Result<ProcessHandle, ProbeError> {
        if self.procs.lock().unwrap().contains_key(&pid) {
            Ok(ProcessHandle::new(pid))
        } else {
            Err(ProbeError::NotFound(pid))
        }
    }

    async fn wait(&self, handle: ProcessHandle) -> Result<ExitState, ProbeError> {
        let mut rx = self
            .procs
            .lock()
            .unwrap()
            .get(&handle.pid())
            .map(|tx| tx.subscribe())
            .ok_or(ProbeError::NotFound(handle.pid()))?;

        let exit = rx
            .wait_for(Option::is_some)
            .await
            .map_err(|_| ProbeError::Wait(io::Error::other("fake process table dropped")))?
            .clone();

        match exit {
            Some(Ok(state)) => Ok(state),
            Some(Err(reason)) => Err(ProbeError::Wait(io::Error::other(reason))),
            None => unreachable!("wait_for only returns on Some"),
        }
    }
}

pub fn manager(
    dir: &Path,
    probe: Arc<dyn ProcessProbe>,
) -> (BuildManager, mpsc::UnboundedReceiver<BuildCompletion>) {
    let (sink, rx) = ChannelSink::new();
    let cfg = TrackerConfig::default()
        .with_sentinel_dir(dir)
        .with_poll_interval(Duration::from_millis(20));
    let mgr = BuildManager::new(&cfg, probe, Arc::new(sink)).unwrap();
    (mgr, rx)
}

pub async fn next(rx: &mut mpsc::UnboundedReceiver<BuildCompletion>) -> BuildCompletion {
    tokio::time::timeout(Duration::from_secs(10), rx.recv())
        .await
        .expect("no completion within 10s")
        .expect("sink channel closed")
}

/// What a well-behaved worker does on its way out.
pub fn clear_sentinel(path: &Path) {
    fs::write(path, "").unwrap();
}
