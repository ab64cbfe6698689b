//! In-memory resource registries and their lock discipline.
//!
//! Two independent maps, each behind its own reader/writer lock: one for
//! resources present in local storage, one for the remote repository index.
//! Read paths hand out owned snapshots so callers iterate without holding a
//! lock; write paths either swap a whole map (rescan, catalog refresh) or
//! mutate under a guard held across a full install/uninstall (so no reader
//! ever observes a half-applied operation).

use std::collections::HashMap;

use parking_lot::{RwLock, RwLockWriteGuard};

use crate::resource::{LocalResource, RemoteResource};

#[derive(Debug, Default)]
pub(crate) struct ResourceRegistry {
    local: RwLock<HashMap<String, LocalResource>>,
    remote: RwLock<HashMap<String, RemoteResource>>,
}

impl ResourceRegistry {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Owned snapshot of all local resources.
    pub(crate) fn local_snapshot(&self) -> Vec<LocalResource> {
        self.local.read().values().cloned().collect()
    }

    /// Owned copy of one local resource.
    pub(crate) fn local_get(&self, name: &str) -> Option<LocalResource> {
        self.local.read().get(name).cloned()
    }

    pub(crate) fn is_installed(&self, name: &str) -> bool {
        self.local.read().contains_key(name)
    }

    /// Exclusive access to the local map, held across a whole install,
    /// uninstall, or rescan.
    pub(crate) fn local_write(&self) -> RwLockWriteGuard<'_, HashMap<String, LocalResource>> {
        self.local.write()
    }

    /// Owned snapshot of the remote index.
    pub(crate) fn remote_snapshot(&self) -> Vec<RemoteResource> {
        self.remote.read().values().cloned().collect()
    }

    /// Owned copy of one remote resource.
    pub(crate) fn remote_get(&self, name: &str) -> Option<RemoteResource> {
        self.remote.read().get(name).cloned()
    }

    /// Atomically replace the remote index with a fresh catalog.
    pub(crate) fn replace_remote(&self, resources: HashMap<String, RemoteResource>) {
        *self.remote.write() = resources;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resource::ResourceType;

    fn voice(name: &str, timestamp: u64) -> LocalResource {
        LocalResource::voice_pack(name, timestamp, 10, format!("/maps/{}", name)).unwrap()
    }

    fn remote(name: &str, timestamp: u64) -> RemoteResource {
        RemoteResource::new(name, ResourceType::VoicePack, timestamp, 10, 5, "http://u").unwrap()
    }

    #[test]
    fn test_local_snapshot_is_owned() {
        let registry = ResourceRegistry::new();
        registry.local_write().insert("en.voice".into(), voice("en.voice", 1));

        let snapshot = registry.local_snapshot();
        *registry.local_write() = HashMap::new();

        // The snapshot survives the swap.
        assert_eq!(snapshot.len(), 1);
        assert!(registry.local_snapshot().is_empty());
    }

    #[test]
    fn test_local_get_and_is_installed() {
        let registry = ResourceRegistry::new();
        assert!(!registry.is_installed("en.voice"));
        assert!(registry.local_get("en.voice").is_none());

        registry.local_write().insert("en.voice".into(), voice("en.voice", 1));
        assert!(registry.is_installed("en.voice"));
        assert_eq!(registry.local_get("en.voice").unwrap().timestamp(), 1);
    }

    #[test]
    fn test_replace_remote_swaps_whole_map() {
        let registry = ResourceRegistry::new();
        let mut first = HashMap::new();
        first.insert("a".to_string(), remote("a", 1));
        first.insert("b".to_string(), remote("b", 1));
        registry.replace_remote(first);
        assert_eq!(registry.remote_snapshot().len(), 2);

        let mut second = HashMap::new();
        second.insert("c".to_string(), remote("c", 2));
        registry.replace_remote(second);

        assert!(registry.remote_get("a").is_none());
        assert_eq!(registry.remote_get("c").unwrap().timestamp, 2);
    }

    #[test]
    fn test_locks_are_independent() {
        let registry = ResourceRegistry::new();
        let guard = registry.local_write();
        // Remote reads proceed while the local writer is held.
        assert!(registry.remote_snapshot().is_empty());
        drop(guard);
    }
}
