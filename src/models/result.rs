// SPDX-FileCopyrightText: 2025 Greenbone AG
//
// SPDX-License-Identifier: GPL-2.0-or-later WITH x11vnc-openssl-exception

use super::Finding;

/// Outcome of a successful orchestration run.
///
/// Contains the deduplicated findings ordered by risk and the id of the assessment scan that
/// produced them.
#[derive(Debug, Clone, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NormalizedResult {
    scan_id: String,
    alerts: Vec<Finding>,
}

impl NormalizedResult {
    pub fn new(scan_id: impl Into<String>, alerts: Vec<Finding>) -> Self {
        Self {
            scan_id: scan_id.into(),
            alerts,
        }
    }

    pub fn scan_id(&self) -> &str {
        &self.scan_id
    }

    pub fn alerts(&self) -> &[Finding] {
        &self.alerts
    }
}
