// SPDX-FileCopyrightText: 2025 Greenbone AG
//
// SPDX-License-Identifier: GPL-2.0-or-later WITH x11vnc-openssl-exception

use std::{
    io,
    path::{Path, PathBuf},
};

use async_trait::async_trait;
use sha2::{Digest, Sha256};

use super::{RecordStore, StorageError, newest_first};
use crate::models::ScanRecord;

/// Stores each record as a JSON document under `<base>/<owner hash>/<id>.json`.
///
/// The owner is hashed so that arbitrary user ids cannot escape the base directory.
#[derive(Debug, Clone)]
pub struct Storage {
    base: PathBuf,
}

impl Storage {
    pub fn new<P>(base: P) -> Self
    where
        P: AsRef<Path>,
    {
        Self {
            base: base.as_ref().to_owned(),
        }
    }

    fn owner_dir(&self, owner: &str) -> PathBuf {
        let mut hasher = Sha256::new();
        hasher.update(owner.as_bytes());
        self.base.join(hex::encode(hasher.finalize()))
    }

    fn record_path(&self, owner: &str, id: &str) -> Option<PathBuf> {
        // ids are generated by us; anything else could point outside of the owner directory
        uuid::Uuid::parse_str(id)
            .ok()
            .map(|id| self.owner_dir(owner).join(format!("{id}.json")))
    }
}

#[async_trait]
impl RecordStore for Storage {
    async fn insert(&self, record: ScanRecord) -> Result<String, StorageError> {
        let path = self
            .record_path(&record.user_id, &record.id)
            .ok_or_else(|| StorageError::Serialization(format!("invalid id {}", record.id)))?;
        let dir = self.owner_dir(&record.user_id);
        tokio::fs::create_dir_all(&dir).await?;
        let content = serde_json::to_vec(&record)?;
        let tmp = dir.join(format!("{}.json.tmp", record.id));
        tokio::fs::write(&tmp, content).await?;
        tokio::fs::rename(&tmp, &path).await?;
        tracing::trace!(path = %path.display(), "stored record");
        Ok(record.id)
    }

    async fn list(&self, owner: &str) -> Result<Vec<ScanRecord>, StorageError> {
        let mut entries = match tokio::fs::read_dir(self.owner_dir(owner)).await {
            Ok(x) => x,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(vec![]),
            Err(e) => return Err(e.into()),
        };
        let mut result = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|x| x.to_str()) != Some("json") {
                continue;
            }
            let content = tokio::fs::read(&path).await?;
            match serde_json::from_slice::<ScanRecord>(&content) {
                Ok(record) if record.user_id == owner => result.push(record),
                Ok(_) => {}
                Err(error) => {
                    tracing::warn!(path = %path.display(), %error, "skipping unreadable record");
                }
            }
        }
        newest_first(&mut result);
        Ok(result)
    }

    async fn remove(&self, owner: &str, id: &str) -> Result<bool, StorageError> {
        let Some(path) = self.record_path(owner, id) else {
            return Ok(false);
        };
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, Utc};

    use super::*;
    use crate::models::{Finding, ScanResults};

    struct TempDir(PathBuf);

    impl TempDir {
        fn new(name: &str) -> Self {
            let path = std::env::temp_dir().join(format!("zaprunner-{name}-{}", uuid::Uuid::new_v4()));
            Self(path)
        }
    }

    impl Drop for TempDir {
        fn drop(&mut self) {
            let _ = std::fs::remove_dir_all(&self.0);
        }
    }

    fn record(owner: &str, age_in_minutes: i64) -> ScanRecord {
        let results = ScanResults {
            alerts: vec![Finding {
                plugin_id: "10020".to_owned(),
                risk: "Medium".into(),
                ..Default::default()
            }],
        };
        let mut record = ScanRecord::new(owner, "http://example.test", results);
        record.timestamp = Utc::now() - Duration::minutes(age_in_minutes);
        record
    }

    #[tokio::test]
    async fn stores_and_lists_per_owner() {
        let dir = TempDir::new("list");
        let storage = Storage::new(&dir.0);
        assert!(storage.list("alice").await.unwrap().is_empty());
        let old = record("alice", 30);
        let new = record("alice", 2);
        storage.insert(old.clone()).await.unwrap();
        storage.insert(new.clone()).await.unwrap();
        storage.insert(record("../bob", 1)).await.unwrap();
        assert_eq!(storage.list("alice").await.unwrap(), vec![new, old]);
        assert_eq!(storage.list("../bob").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn remove_checks_owner_and_id() {
        let dir = TempDir::new("remove");
        let storage = Storage::new(&dir.0);
        let id = storage.insert(record("alice", 0)).await.unwrap();
        assert!(!storage.remove("mallory", &id).await.unwrap());
        assert!(!storage.remove("alice", "../../etc/passwd").await.unwrap());
        assert!(storage.remove("alice", &id).await.unwrap());
        assert!(storage.list("alice").await.unwrap().is_empty());
    }
}
