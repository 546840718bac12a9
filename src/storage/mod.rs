// SPDX-FileCopyrightText: 2025 Greenbone AG
//
// SPDX-License-Identifier: GPL-2.0-or-later WITH x11vnc-openssl-exception

//! Persistence of finished scans per user.
mod error;
pub mod file;
pub mod inmemory;

use std::sync::Arc;

use async_trait::async_trait;

pub use error::StorageError;

use crate::{
    config::{Config, StorageType},
    models::ScanRecord,
};

/// Stores [ScanRecord]s grouped by their owner.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Stores the record and returns its id.
    async fn insert(&self, record: ScanRecord) -> Result<String, StorageError>;

    /// Returns all records of the owner, newest first.
    async fn list(&self, owner: &str) -> Result<Vec<ScanRecord>, StorageError>;

    /// Removes a record of the owner.
    ///
    /// Returns false when no such record exists for that owner.
    async fn remove(&self, owner: &str, id: &str) -> Result<bool, StorageError>;
}

/// Creates the store selected in the configuration.
pub fn from_config(config: &Config) -> Arc<dyn RecordStore> {
    match config.storage.storage_type {
        StorageType::InMemory => Arc::new(inmemory::Storage::default()),
        StorageType::FileSystem => Arc::new(file::Storage::new(&config.storage.path)),
    }
}

fn newest_first(records: &mut [ScanRecord]) {
    records.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
}
