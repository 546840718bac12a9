// SPDX-FileCopyrightText: 2025 Greenbone AG
//
// SPDX-License-Identifier: GPL-2.0-or-later WITH x11vnc-openssl-exception

use std::{
    collections::HashMap,
    fmt::Display,
    str::FromStr,
    sync::{Arc, PoisonError, RwLock},
};

use chrono::Utc;

use super::{Error, StopSignal};
use crate::models::{RunInfo, RunState, Target};

/// Decides whether a second run for a target that is already being scanned may start.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConcurrentRuns {
    #[default]
    Allow,
    Reject,
}

impl Display for ConcurrentRuns {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConcurrentRuns::Allow => write!(f, "allow"),
            ConcurrentRuns::Reject => write!(f, "reject"),
        }
    }
}

impl FromStr for ConcurrentRuns {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "allow" => Ok(ConcurrentRuns::Allow),
            "reject" => Ok(ConcurrentRuns::Reject),
            _ => Err(format!("unknown policy '{s}', use allow or reject")),
        }
    }
}

struct Entry {
    info: RunInfo,
    stop: StopSignal,
}

/// Keeps track of the runs currently in flight.
#[derive(Default)]
pub struct Registry {
    policy: ConcurrentRuns,
    runs: RwLock<HashMap<String, Entry>>,
}

impl Registry {
    pub fn new(policy: ConcurrentRuns) -> Self {
        Self {
            policy,
            runs: RwLock::new(HashMap::new()),
        }
    }

    /// Registers a new run for the target.
    ///
    /// The run stays registered until the returned guard is dropped.
    pub fn register(
        self: &Arc<Self>,
        target: &Target,
        stop: StopSignal,
    ) -> Result<RunGuard, Error> {
        let mut runs = self.runs.write().unwrap_or_else(PoisonError::into_inner);
        if self.policy == ConcurrentRuns::Reject
            && runs.values().any(|x| x.info.url == target.as_str())
        {
            return Err(Error::AlreadyRunning(target.to_string()));
        }
        let id = uuid::Uuid::new_v4().to_string();
        runs.insert(
            id.clone(),
            Entry {
                info: RunInfo {
                    id: id.clone(),
                    url: target.to_string(),
                    state: RunState::Idle,
                    started_at: Utc::now(),
                },
                stop,
            },
        );
        Ok(RunGuard {
            id,
            registry: self.clone(),
        })
    }

    fn update(&self, id: &str, state: RunState) {
        let mut runs = self.runs.write().unwrap_or_else(PoisonError::into_inner);
        if let Some(entry) = runs.get_mut(id) {
            entry.info.state = state;
        }
    }

    fn remove(&self, id: &str) {
        let mut runs = self.runs.write().unwrap_or_else(PoisonError::into_inner);
        runs.remove(id);
    }

    /// Returns the runs in flight, oldest first.
    pub fn list(&self) -> Vec<RunInfo> {
        let runs = self.runs.read().unwrap_or_else(PoisonError::into_inner);
        let mut result: Vec<_> = runs.values().map(|x| x.info.clone()).collect();
        result.sort_by(|a, b| a.started_at.cmp(&b.started_at));
        result
    }

    pub fn get(&self, id: &str) -> Option<RunInfo> {
        let runs = self.runs.read().unwrap_or_else(PoisonError::into_inner);
        runs.get(id).map(|x| x.info.clone())
    }

    /// Fires the stop signal of a run. Returns false when the run is unknown.
    pub fn stop(&self, id: &str) -> bool {
        let runs = self.runs.read().unwrap_or_else(PoisonError::into_inner);
        match runs.get(id) {
            Some(entry) => {
                entry.stop.stop();
                true
            }
            None => false,
        }
    }
}

/// Registration of a single run.
pub struct RunGuard {
    id: String,
    registry: Arc<Registry>,
}

impl RunGuard {
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Publishes the current state of the run.
    pub fn publish(&self, state: RunState) {
        self.registry.update(&self.id, state);
    }
}

impl Drop for RunGuard {
    fn drop(&mut self) {
        self.registry.remove(&self.id);
    }
}
