// SPDX-FileCopyrightText: 2025 Greenbone AG
//
// SPDX-License-Identifier: GPL-2.0-or-later WITH x11vnc-openssl-exception

use std::fmt::Display;

use crate::models::Phase;

/// Control operations offered by the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    StartDiscovery,
    DiscoveryStatus,
    StopDiscovery,
    StartAssessment,
    AssessmentStatus,
    StopAssessment,
    ListAlerts,
}

impl Operation {
    pub fn start(phase: Phase) -> Self {
        match phase {
            Phase::Discovery => Operation::StartDiscovery,
            Phase::Assessment => Operation::StartAssessment,
        }
    }

    pub fn status(phase: Phase) -> Self {
        match phase {
            Phase::Discovery => Operation::DiscoveryStatus,
            Phase::Assessment => Operation::AssessmentStatus,
        }
    }

    pub fn stop(phase: Phase) -> Self {
        match phase {
            Phase::Discovery => Operation::StopDiscovery,
            Phase::Assessment => Operation::StopAssessment,
        }
    }

    /// Path relative to the engine base address.
    pub fn path(&self) -> &'static str {
        match self {
            Operation::StartDiscovery => "JSON/spider/action/scan/",
            Operation::DiscoveryStatus => "JSON/spider/view/status/",
            Operation::StopDiscovery => "JSON/spider/action/stop/",
            Operation::StartAssessment => "JSON/ascan/action/scan/",
            Operation::AssessmentStatus => "JSON/ascan/view/status/",
            Operation::StopAssessment => "JSON/ascan/action/stop/",
            Operation::ListAlerts => "JSON/core/view/alerts/",
        }
    }
}

impl Display for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.path().trim_start_matches("JSON/").trim_end_matches('/'))
    }
}

/// A single control call without credentials.
///
/// The API key is only added by the transport when the final URL is built so that a request can
/// be logged as is.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControlRequest {
    operation: Operation,
    params: Vec<(&'static str, String)>,
}

impl ControlRequest {
    pub fn new(operation: Operation) -> Self {
        Self {
            operation,
            params: Vec::new(),
        }
    }

    pub fn param(mut self, key: &'static str, value: impl Into<String>) -> Self {
        self.params.push((key, value.into()));
        self
    }

    pub fn operation(&self) -> Operation {
        self.operation
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Builds the URL of this request for the engine reachable at `base`.
    pub fn url(&self, base: &str, api_key: Option<&str>) -> String {
        let query = self
            .params
            .iter()
            .map(|(k, v)| (*k, v.as_str()))
            .chain(api_key.map(|key| ("apikey", key)))
            .map(|(k, v)| format!("{k}={}", urlencoding::encode(v)))
            .collect::<Vec<_>>()
            .join("&");
        let mut url = format!("{}/{}", base.trim_end_matches('/'), self.operation.path());
        if !query.is_empty() {
            url.push('?');
            url.push_str(&query);
        }
        url
    }
}

impl Display for ControlRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.operation)?;
        for (k, v) in &self.params {
            write!(f, " {k}={v}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_url() {
        let request =
            ControlRequest::new(Operation::StartDiscovery).param("url", "http://example.test/?a=b");
        assert_eq!(
            request.url("http://localhost:8080/", Some("k3y")),
            "http://localhost:8080/JSON/spider/action/scan/?url=http%3A%2F%2Fexample.test%2F%3Fa%3Db&apikey=k3y"
        );
        assert_eq!(
            ControlRequest::new(Operation::ListAlerts).url("http://zap:8081", None),
            "http://zap:8081/JSON/core/view/alerts/"
        );
    }

    #[test]
    fn display_omits_api_key() {
        let request = ControlRequest::new(Operation::AssessmentStatus).param("scanId", "3");
        assert_eq!(request.to_string(), "ascan/view/status scanId=3");
    }
}
