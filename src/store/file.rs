use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::sync::Mutex;
use tracing::debug;

use crate::scheduler::Snapshot;
use crate::store::{ProgressStore, StoreError, StoreResult};

/// One pretty-printed JSON document per identity under `dir`.
///
/// Writes go to a temporary file that is renamed into place, and are
/// serialized through a store-wide lock so saves land in call order.
#[derive(Debug)]
pub struct JsonFileStore {
    dir: PathBuf,
    write_lock: Mutex<()>,
}

impl JsonFileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_for(&self, identity: &str) -> StoreResult<PathBuf> {
        Ok(self.dir.join(format!("{}.json", file_stem(identity)?)))
    }
}

/// Filesystem-safe stem: ASCII alphanumerics, `-` and `_` pass through,
/// every other byte becomes `%XX`.
fn file_stem(identity: &str) -> StoreResult<String> {
    if identity.trim().is_empty() {
        return Err(StoreError::InvalidIdentity(identity.to_string()));
    }
    let mut stem = String::with_capacity(identity.len());
    for byte in identity.bytes() {
        if byte.is_ascii_alphanumeric() || byte == b'-' || byte == b'_' {
            stem.push(byte as char);
        } else {
            stem.push_str(&format!("%{byte:02X}"));
        }
    }
    Ok(stem)
}

#[async_trait]
impl ProgressStore for JsonFileStore {
    async fn load(&self, identity: &str) -> StoreResult<Option<Snapshot>> {
        let path = self.path_for(identity)?;
        let bytes = match tokio::fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(err.into()),
        };
        let value: serde_json::Value = serde_json::from_slice(&bytes)?;
        Ok(Some(Snapshot::from_value(value)))
    }

    async fn save(&self, identity: &str, snapshot: &Snapshot) -> StoreResult<()> {
        let path = self.path_for(identity)?;
        let payload = serde_json::to_vec_pretty(snapshot)?;

        let _guard = self.write_lock.lock().await;
        tokio::fs::create_dir_all(&self.dir).await?;
        let tmp = path.with_extension("json.tmp");
        tokio::fs::write(&tmp, &payload).await?;
        tokio::fs::rename(&tmp, &path).await?;

        debug!(identity, path = %path.display(), bytes = payload.len(), "snapshot saved");
        Ok(())
    }

    async fn clear(&self, identity: &str) -> StoreResult<()> {
        let path = self.path_for(identity)?;
        let _guard = self.write_lock.lock().await;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scheduler::SnapshotCard;

    #[test]
    fn test_file_stem_escapes() {
        assert_eq!(file_stem("user_42-a").unwrap(), "user_42-a");
        assert_eq!(file_stem("../etc").unwrap(), "%2E%2E%2Fetc");
        assert_eq!(file_stem("a b").unwrap(), "a%20b");
        assert!(matches!(file_stem("  "), Err(StoreError::InvalidIdentity(_))));
    }

    #[tokio::test]
    async fn test_round_trip_on_disk() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path().join("progress"));

        assert!(store.load("learner").await.unwrap().is_none());

        let snapshot = Snapshot {
            learning_cards: vec![SnapshotCard {
                item: Some("E2".to_string()),
                correct_streak: 1,
                total_correct: 1,
                last_seen: Some(10),
                ..SnapshotCard::default()
            }],
            card_id_counter: 3,
            ..Snapshot::default()
        };
        store.save("learner", &snapshot).await.unwrap();

        let loaded = store.load("learner").await.unwrap().unwrap();
        assert_eq!(loaded, snapshot);
        assert!(store.exists("learner").await.unwrap());

        store.clear("learner").await.unwrap();
        assert!(!store.path_for("learner").unwrap().exists());
        store.clear("learner").await.unwrap();
    }

    #[tokio::test]
    async fn test_corrupt_file_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path());
        std::fs::write(store.path_for("x").unwrap(), b"{ not json").unwrap();

        assert!(matches!(
            store.load("x").await,
            Err(StoreError::Serialization(_))
        ));
    }
}
