// SPDX-FileCopyrightText: 2025 Greenbone AG
//
// SPDX-License-Identifier: GPL-2.0-or-later WITH x11vnc-openssl-exception

use std::time::Duration;

use crate::{
    models::{EmptyTarget, InvalidTransition, Phase, ScanHandle},
    zap,
};

/// Terminal failures of an orchestration run.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    #[error("Invalid target: {0}")]
    InvalidTarget(#[from] EmptyTarget),
    #[error("Unable to start {phase}: {reason}")]
    PhaseStart { phase: Phase, reason: String },
    #[error("Unable to get status of {handle}: {source}")]
    PhaseStatus {
        handle: ScanHandle,
        source: zap::Error,
    },
    #[error("Unable to fetch results: {0}")]
    ResultFetch(zap::Error),
    #[error("{handle} did not finish within {timeout:?}")]
    Timeout {
        handle: ScanHandle,
        timeout: Duration,
    },
    /// The run was cancelled during the given phase.
    ///
    /// `handle` is the engine scan that was still running at that point, if any.
    #[error("{phase} was cancelled")]
    Cancelled {
        phase: Phase,
        handle: Option<ScanHandle>,
    },
    #[error("A run for {0} is already in progress")]
    AlreadyRunning(String),
    #[error("Unexpected run state: {0}")]
    InvalidTransition(#[from] InvalidTransition),
}

impl Error {
    /// Returns true when the run was given up by the orchestrator and not by the engine.
    pub fn is_abandoned(&self) -> bool {
        matches!(self, Error::Timeout { .. } | Error::Cancelled { .. })
    }
}
