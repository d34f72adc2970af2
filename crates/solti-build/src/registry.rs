use std::{
    collections::{HashMap, HashSet},
    sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard},
};

use solti_model::{BuildId, BuildInfo, Pid};

/// In-memory record of claimed and running builds.
///
/// Pending claims and active processes live behind one lock, so moving a build
/// from pending to active is a single step for every reader.
#[derive(Clone, Default)]
pub(crate) struct BuildRegistry {
    inner: Arc<RwLock<RegistryInner>>,
}

#[derive(Default)]
struct RegistryInner {
    /// Builds claimed by the dispatcher whose worker is not running yet.
    pending: HashSet<BuildId>,
    /// Running workers indexed by pid.
    active: HashMap<Pid, ActiveEntry>,
    next_generation: u64,
}

struct ActiveEntry {
    generation: u64,
    build: BuildInfo,
}

/// Receipt for one activation; only its holder may deactivate the entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Registration {
    pid: Pid,
    generation: u64,
}

impl Registration {
    pub fn pid(&self) -> Pid {
        self.pid
    }
}

impl BuildRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark a build as claimed but not started.
    pub fn claim(&self, build_id: impl Into<BuildId>) {
        self.write().pending.insert(build_id.into());
    }

    /// Drop a pending claim. Returns `false` if the build was not pending.
    pub fn unclaim(&self, build_id: &str) -> bool {
        self.write().pending.remove(build_id)
    }

    pub fn is_pending(&self, build_id: &str) -> bool {
        self.read().pending.contains(build_id)
    }

    pub fn pending_count(&self) -> usize {
        self.read().pending.len()
    }

    /// Record `build` as running under `pid` and clear its pending claim.
    ///
    /// An existing entry for `pid` is overwritten, never merged; the replaced
    /// build is returned so the caller can log it.
    pub fn activate(&self, pid: Pid, build: BuildInfo) -> (Registration, Option<BuildInfo>) {
        let mut inner = self.write();

        inner.pending.remove(&build.build_id);
        inner.next_generation += 1;
        let generation = inner.next_generation;

        let replaced = inner
            .active
            .insert(pid, ActiveEntry { generation, build })
            .map(|old| old.build);

        (Registration { pid, generation }, replaced)
    }

    /// Remove the entry created by `reg`.
    ///
    /// Returns `false` when the entry is gone or was overwritten by a later activation of the same pid.
    pub fn deactivate(&self, reg: Registration) -> bool {
        let mut inner = self.write();

        match inner.active.get(&reg.pid) {
            Some(entry) if entry.generation == reg.generation => {
                inner.active.remove(&reg.pid);
                true
            }
            _ => false,
        }
    }

    /// Snapshot of the build running under `pid`.
    pub fn get(&self, pid: Pid) -> Option<BuildInfo> {
        self.read().active.get(&pid).map(|e| e.build.clone())
    }

    pub fn active_count(&self) -> usize {
        self.read().active.len()
    }

    /// Copies of all running builds, in no particular order.
    pub fn active_builds(&self) -> Vec<BuildInfo> {
        self.read()
            .active
            .values()
            .map(|e| e.build.clone())
            .collect()
    }

    fn read(&self) -> RwLockReadGuard<'_, RegistryInner> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, RegistryInner> {
        self.inner.write().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn claim_and_unclaim() {
        let reg = BuildRegistry::new();
        reg.claim("b1");
        reg.claim("b2");
        reg.claim("b1");

        assert_eq!(reg.pending_count(), 2);
        assert!(reg.is_pending("b1"));

        assert!(reg.unclaim("b1"));
        assert!(!reg.unclaim("b1"));
        assert_eq!(reg.pending_count(), 1);
    }

    #[test]
    fn activate_clears_pending_claim() {
        let reg = BuildRegistry::new();
        reg.claim("b1");
        reg.claim("b2");

        let (ticket, replaced) = reg.activate(100, BuildInfo::new("b1", 1));

        assert!(replaced.is_none());
        assert_eq!(ticket.pid(), 100);
        assert!(!reg.is_pending("b1"));
        assert!(reg.is_pending("b2"));
        assert_eq!(reg.active_count(), 1);
        assert_eq!(reg.get(100).unwrap().build_id.as_str(), "b1");
    }

    #[test]
    fn claimed_builds_never_show_up_as_active() {
        let reg = BuildRegistry::new();
        reg.claim("b1");

        assert!(reg.active_builds().is_empty());
        assert_eq!(reg.active_count(), 0);
    }

    #[test]
    fn activation_without_claim_is_fine() {
        let reg = BuildRegistry::new();
        reg.activate(5, BuildInfo::new("b5", 1));

        assert_eq!(reg.pending_count(), 0);
        assert_eq!(reg.get(5).unwrap().build_id.as_str(), "b5");
    }

    #[test]
    fn same_pid_overwrites_and_returns_previous() {
        let reg = BuildRegistry::new();
        let (first, _) = reg.activate(7, BuildInfo::new("old", 1));
        let (second, replaced) = reg.activate(7, BuildInfo::new("new", 2));

        assert_eq!(replaced.unwrap().build_id.as_str(), "old");
        assert_eq!(reg.active_count(), 1);
        assert_eq!(reg.get(7).unwrap().build_id.as_str(), "new");

        // The stale ticket must not evict the newer build.
        assert!(!reg.deactivate(first));
        assert_eq!(reg.active_count(), 1);

        assert!(reg.deactivate(second));
        assert_eq!(reg.active_count(), 0);
    }

    #[test]
    fn deactivate_is_single_shot() {
        let reg = BuildRegistry::new();
        let (ticket, _) = reg.activate(9, BuildInfo::new("b9", 1));

        assert!(reg.deactivate(ticket));
        assert!(!reg.deactivate(ticket));
        assert!(reg.get(9).is_none());
    }

    #[test]
    fn snapshots_are_detached_copies() {
        let reg = BuildRegistry::new();
        reg.activate(1, BuildInfo::new("b1", 1));

        let mut snapshot = reg.active_builds();
        snapshot[0].workspace = "/mutated".into();

        assert_eq!(reg.get(1).unwrap().workspace, "");
    }

    #[test]
    fn clones_share_state() {
        let reg = BuildRegistry::new();
        let other = reg.clone();
        other.claim("b1");

        assert!(reg.is_pending("b1"));
    }
}
