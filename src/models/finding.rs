// SPDX-FileCopyrightText: 2025 Greenbone AG
//
// SPDX-License-Identifier: GPL-2.0-or-later WITH x11vnc-openssl-exception

use std::fmt::Display;

/// Severity classification of a finding as reported by the engine.
///
/// Labels that are not known are kept verbatim so that they survive a round trip through
/// storage; they rank below every known level.
#[derive(Debug, Clone, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(from = "String", into = "String")]
pub enum RiskLevel {
    Critical,
    High,
    Medium,
    Low,
    /// Not an actionable vulnerability
    Informational,
    Unrecognized(String),
}

impl RiskLevel {
    /// Returns the ordering weight used when ranking findings.
    pub fn rank(&self) -> u8 {
        match self {
            RiskLevel::Critical => 4,
            RiskLevel::High => 3,
            RiskLevel::Medium => 2,
            RiskLevel::Low => 1,
            RiskLevel::Informational | RiskLevel::Unrecognized(_) => 0,
        }
    }

    pub fn is_informational(&self) -> bool {
        matches!(self, RiskLevel::Informational)
    }

    fn as_str(&self) -> &str {
        match self {
            RiskLevel::Critical => "Critical",
            RiskLevel::High => "High",
            RiskLevel::Medium => "Medium",
            RiskLevel::Low => "Low",
            RiskLevel::Informational => "Informational",
            RiskLevel::Unrecognized(x) => x,
        }
    }
}

impl Default for RiskLevel {
    fn default() -> Self {
        RiskLevel::Unrecognized(String::new())
    }
}

impl Display for RiskLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl From<&str> for RiskLevel {
    fn from(s: &str) -> Self {
        match s {
            "Critical" => RiskLevel::Critical,
            "High" => RiskLevel::High,
            "Medium" => RiskLevel::Medium,
            "Low" => RiskLevel::Low,
            "Informational" => RiskLevel::Informational,
            _ => RiskLevel::Unrecognized(s.to_owned()),
        }
    }
}

impl From<String> for RiskLevel {
    fn from(value: String) -> Self {
        RiskLevel::from(&value as &str)
    }
}

impl From<RiskLevel> for String {
    fn from(value: RiskLevel) -> Self {
        match value {
            RiskLevel::Unrecognized(x) => x,
            known => known.as_str().to_owned(),
        }
    }
}

/// A single issue reported by the engine.
///
/// Findings are produced exclusively by the engine and are not altered afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Finding {
    /// Identifier of the plugin that raised the finding
    #[serde(default)]
    pub plugin_id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub risk: RiskLevel,
    #[serde(default)]
    pub description: String,
    /// Remediation text
    #[serde(default)]
    pub solution: String,
    /// HTTP method of the request that revealed the issue
    #[serde(default)]
    pub method: String,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub param: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub evidence: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub confidence: Option<String>,
    #[serde(rename = "cweid", skip_serializing_if = "Option::is_none", default)]
    pub cwe_id: Option<String>,
    #[serde(rename = "wascid", skip_serializing_if = "Option::is_none", default)]
    pub wasc_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub reference: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub alert_ref: Option<String>,
}
