// SPDX-FileCopyrightText: 2025 Greenbone AG
//
// SPDX-License-Identifier: GPL-2.0-or-later WITH x11vnc-openssl-exception

use std::{collections::HashMap, sync::RwLock};

use async_trait::async_trait;

use super::{RecordStore, StorageError, newest_first};
use crate::models::ScanRecord;

/// Keeps records in memory; they are lost on restart.
#[derive(Debug, Default)]
pub struct Storage {
    records: RwLock<HashMap<String, Vec<ScanRecord>>>,
}

#[async_trait]
impl RecordStore for Storage {
    async fn insert(&self, record: ScanRecord) -> Result<String, StorageError> {
        let id = record.id.clone();
        let mut records = self.records.write()?;
        records
            .entry(record.user_id.clone())
            .or_default()
            .push(record);
        Ok(id)
    }

    async fn list(&self, owner: &str) -> Result<Vec<ScanRecord>, StorageError> {
        let mut result = {
            let records = self.records.read()?;
            records.get(owner).cloned().unwrap_or_default()
        };
        newest_first(&mut result);
        Ok(result)
    }

    async fn remove(&self, owner: &str, id: &str) -> Result<bool, StorageError> {
        let mut records = self.records.write()?;
        let Some(owned) = records.get_mut(owner) else {
            return Ok(false);
        };
        let before = owned.len();
        owned.retain(|x| x.id != id);
        let removed = owned.len() != before;
        if owned.is_empty() {
            records.remove(owner);
        }
        Ok(removed)
    }
}
