// SPDX-FileCopyrightText: 2025 Greenbone AG
//
// SPDX-License-Identifier: GPL-2.0-or-later WITH x11vnc-openssl-exception

use std::{fmt::Display, str::FromStr};

use serde::{
    Deserialize, Deserializer,
    de::{self, Visitor},
};

/// The two engine phases of an orchestration run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    /// Crawls the target to enumerate reachable endpoints
    Discovery,
    /// Actively probes the enumerated endpoints
    Assessment,
}

impl Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Phase::Discovery => write!(f, "discovery"),
            Phase::Assessment => write!(f, "assessment"),
        }
    }
}

/// Identifier returned by the engine when a phase is started.
///
/// A handle always belongs to exactly one phase so that a status request can never be sent to
/// the wrong engine component.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ScanHandle {
    phase: Phase,
    id: String,
}

impl ScanHandle {
    pub fn new(phase: Phase, id: impl Into<String>) -> Self {
        Self {
            phase,
            id: id.into(),
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn id(&self) -> &str {
        &self.id
    }
}

impl Display for ScanHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.phase, self.id)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid progress value '{0}', expected a percentage between 0 and 100")]
pub struct InvalidPhaseStatus(pub String);

/// Progress of a phase in percent.
///
/// The engine does not report errors through the status; 100 is the only completion signal.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, serde::Serialize)]
pub struct PhaseStatus(u8);

impl PhaseStatus {
    pub const COMPLETE: PhaseStatus = PhaseStatus(100);

    pub fn new(percent: u8) -> Result<Self, InvalidPhaseStatus> {
        if percent > 100 {
            return Err(InvalidPhaseStatus(percent.to_string()));
        }
        Ok(Self(percent))
    }

    pub fn percent(&self) -> u8 {
        self.0
    }

    pub fn is_complete(&self) -> bool {
        *self == Self::COMPLETE
    }
}

impl Display for PhaseStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}%", self.0)
    }
}

impl FromStr for PhaseStatus {
    type Err = InvalidPhaseStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let percent: u8 = s
            .trim()
            .parse()
            .map_err(|_| InvalidPhaseStatus(s.to_owned()))?;
        PhaseStatus::new(percent)
    }
}

struct PhaseStatusVisitor;

impl Visitor<'_> for PhaseStatusVisitor {
    type Value = PhaseStatus;

    fn expecting(&self, formatter: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(formatter, "a percentage as String or number")
    }

    fn visit_str<E>(self, v: &str) -> Result<Self::Value, E>
    where
        E: de::Error,
    {
        v.parse().map_err(de::Error::custom)
    }

    fn visit_u64<E>(self, v: u64) -> Result<Self::Value, E>
    where
        E: de::Error,
    {
        u8::try_from(v)
            .map_err(|_| InvalidPhaseStatus(v.to_string()))
            .and_then(PhaseStatus::new)
            .map_err(de::Error::custom)
    }

    fn visit_i64<E>(self, v: i64) -> Result<Self::Value, E>
    where
        E: de::Error,
    {
        u64::try_from(v)
            .map_err(|_| de::Error::custom(InvalidPhaseStatus(v.to_string())))
            .and_then(|v| self.visit_u64(v))
    }
}

impl<'de> Deserialize<'de> for PhaseStatus {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_any(PhaseStatusVisitor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_status_from_string_and_number() {
        let status: PhaseStatus = serde_json::from_str("\"42\"").unwrap();
        assert_eq!(status.percent(), 42);
        let status: PhaseStatus = serde_json::from_str("100").unwrap();
        assert!(status.is_complete());
    }

    #[test]
    fn rejects_out_of_range_status() {
        assert!(serde_json::from_str::<PhaseStatus>("\"101\"").is_err());
        assert!(serde_json::from_str::<PhaseStatus>("-1").is_err());
        assert!(serde_json::from_str::<PhaseStatus>("\"done\"").is_err());
    }
}
