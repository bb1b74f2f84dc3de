use std::collections::HashMap;

use async_trait::async_trait;
use parking_lot::RwLock;

use crate::scheduler::Snapshot;
use crate::store::{ProgressStore, StoreResult};

/// In-process store. Useful for tests and for sessions that never outlive
/// the process.
#[derive(Debug, Default)]
pub struct MemoryStore {
    snapshots: RwLock<HashMap<String, Snapshot>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_snapshot(identity: impl Into<String>, snapshot: Snapshot) -> Self {
        let store = Self::new();
        store.snapshots.write().insert(identity.into(), snapshot);
        store
    }

    pub fn get(&self, identity: &str) -> Option<Snapshot> {
        self.snapshots.read().get(identity).cloned()
    }

    pub fn len(&self) -> usize {
        self.snapshots.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshots.read().is_empty()
    }
}

#[async_trait]
impl ProgressStore for MemoryStore {
    async fn load(&self, identity: &str) -> StoreResult<Option<Snapshot>> {
        Ok(self.get(identity))
    }

    async fn save(&self, identity: &str, snapshot: &Snapshot) -> StoreResult<()> {
        self.snapshots
            .write()
            .insert(identity.to_string(), snapshot.clone());
        Ok(())
    }

    async fn clear(&self, identity: &str) -> StoreResult<()> {
        self.snapshots.write().remove(identity);
        Ok(())
    }
}
