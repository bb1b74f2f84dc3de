//! Persistence port for scheduler snapshots.
//!
//! The scheduler never talks to storage itself; sessions load once, then push
//! debounced saves through a [`ProgressStore`].

pub mod file;
pub mod memory;

use async_trait::async_trait;
use thiserror::Error;

use crate::scheduler::Snapshot;

pub use file::JsonFileStore;
pub use memory::MemoryStore;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("invalid identity: {0:?}")]
    InvalidIdentity(String),
    #[error("store backend error: {0}")]
    Backend(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Keyed snapshot storage.
///
/// Implementations must apply saves for one identity in call order, so the
/// last save wins. Retries, if any, are the implementation's business.
#[async_trait]
pub trait ProgressStore: Send + Sync {
    async fn load(&self, identity: &str) -> StoreResult<Option<Snapshot>>;

    async fn save(&self, identity: &str, snapshot: &Snapshot) -> StoreResult<()>;

    async fn clear(&self, identity: &str) -> StoreResult<()>;

    async fn exists(&self, identity: &str) -> StoreResult<bool> {
        Ok(self.load(identity).await?.is_some())
    }
}
