// SPDX-FileCopyrightText: 2025 Greenbone AG
//
// SPDX-License-Identifier: GPL-2.0-or-later WITH x11vnc-openssl-exception

use std::{fmt::Display, str::FromStr};

use chrono::{DateTime, Utc};

/// State of an orchestration run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunState {
    /// A run has been accepted but no engine call was issued yet
    #[default]
    Idle,
    /// The discovery phase has been requested and is awaited
    Discovering,
    /// The discovery phase reported completion
    Discovered,
    /// The assessment phase is running or its findings are being collected
    Assessing,
    /// Findings have been collected and normalized
    Completed,
    /// The run was aborted
    Failed,
}

/// Events moving a run from one state to the next.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunEvent {
    StartDiscovery,
    DiscoveryFinished,
    StartAssessment,
    ResultsCollected,
    Fail,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid transition from {from} on {event:?}")]
pub struct InvalidTransition {
    pub from: RunState,
    pub event: RunEvent,
}

impl RunState {
    pub fn is_done(&self) -> bool {
        matches!(self, RunState::Completed | RunState::Failed)
    }

    /// Returns the state reached by applying `event`.
    ///
    /// Assessment can only be entered from `Discovered`, so a run can never start the
    /// assessment phase while its discovery phase is outstanding.
    pub fn next(self, event: RunEvent) -> Result<RunState, InvalidTransition> {
        use RunEvent::*;
        use RunState::*;
        match (self, event) {
            (Idle, StartDiscovery) => Ok(Discovering),
            (Discovering, DiscoveryFinished) => Ok(Discovered),
            (Discovered, StartAssessment) => Ok(Assessing),
            (Assessing, ResultsCollected) => Ok(Completed),
            (from, Fail) if !from.is_done() => Ok(Failed),
            (from, event) => Err(InvalidTransition { from, event }),
        }
    }
}

impl AsRef<str> for RunState {
    fn as_ref(&self) -> &str {
        match self {
            RunState::Idle => "idle",
            RunState::Discovering => "discovering",
            RunState::Discovered => "discovered",
            RunState::Assessing => "assessing",
            RunState::Completed => "completed",
            RunState::Failed => "failed",
        }
    }
}

impl Display for RunState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_ref())
    }
}

impl FromStr for RunState {
    type Err = ();

    fn from_str(state: &str) -> Result<RunState, ()> {
        match state {
            "idle" => Ok(RunState::Idle),
            "discovering" => Ok(RunState::Discovering),
            "discovered" => Ok(RunState::Discovered),
            "assessing" => Ok(RunState::Assessing),
            "completed" => Ok(RunState::Completed),
            "failed" => Ok(RunState::Failed),
            _ => Err(()),
        }
    }
}

/// Snapshot of an in-flight run.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunInfo {
    pub id: String,
    pub url: String,
    pub state: RunState,
    pub started_at: DateTime<Utc>,
}
