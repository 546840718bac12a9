// SPDX-FileCopyrightText: 2025 Greenbone AG
//
// SPDX-License-Identifier: GPL-2.0-or-later WITH x11vnc-openssl-exception

use chrono::{DateTime, Utc};

use super::{Finding, NormalizedResult};

/// Findings as they are persisted within a record.
#[derive(Debug, Clone, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
pub struct ScanResults {
    #[serde(default)]
    pub alerts: Vec<Finding>,
}

impl From<&NormalizedResult> for ScanResults {
    fn from(value: &NormalizedResult) -> Self {
        Self {
            alerts: value.alerts().to_vec(),
        }
    }
}

/// A stored copy of a scan result owned by a user.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanRecord {
    pub id: String,
    pub user_id: String,
    pub url: String,
    pub scan_results: ScanResults,
    pub timestamp: DateTime<Utc>,
}

impl ScanRecord {
    /// Creates a new record with a fresh id and the current time as timestamp.
    pub fn new(user_id: impl Into<String>, url: impl Into<String>, results: ScanResults) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            user_id: user_id.into(),
            url: url.into(),
            scan_results: results,
            timestamp: Utc::now(),
        }
    }
}
