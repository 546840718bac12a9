// SPDX-FileCopyrightText: 2025 Greenbone AG
//
// SPDX-License-Identifier: GPL-2.0-or-later WITH x11vnc-openssl-exception

use std::time::Duration;

use tokio::time::Instant;

use super::{Error, StopSignal};
use crate::{
    models::{Phase, ScanHandle, Target},
    zap::{Client, Transport},
};

/// Polling behaviour of a phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Polling {
    pub interval: Duration,
    /// Maximum time a phase may take, `None` waits forever.
    pub phase_timeout: Option<Duration>,
    /// Stops the engine scan of a phase that timed out or got cancelled.
    pub stop_abandoned: bool,
}

impl Default for Polling {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(1),
            phase_timeout: Some(Duration::from_secs(60 * 60)),
            stop_abandoned: true,
        }
    }
}

/// Drives a single phase of the engine to completion.
pub struct Sequencer<T> {
    client: Client<T>,
    polling: Polling,
}

impl<T> Sequencer<T>
where
    T: Transport,
{
    pub fn new(client: Client<T>, polling: Polling) -> Self {
        Self { client, polling }
    }

    pub fn client(&self) -> &Client<T> {
        &self.client
    }

    /// Starts the phase unless the signal is already stopped.
    ///
    /// A phase whose start was still in flight when the signal got stopped is abandoned right
    /// away.
    pub async fn start_phase(
        &self,
        phase: Phase,
        target: &Target,
        stop: &StopSignal,
    ) -> Result<ScanHandle, Error> {
        if stop.is_stopped() {
            return Err(Error::Cancelled {
                phase,
                handle: None,
            });
        }
        let handle = self
            .client
            .start(phase, target)
            .await
            .map_err(|e| Error::PhaseStart {
                phase,
                reason: e.to_string(),
            })?;
        if handle.id().trim().is_empty() {
            return Err(Error::PhaseStart {
                phase,
                reason: "engine returned an empty scan id".to_owned(),
            });
        }
        tracing::debug!(%handle, %target, "phase started");
        if stop.is_stopped() {
            return Err(self
                .abandon(Error::Cancelled {
                    phase,
                    handle: Some(handle),
                })
                .await);
        }
        Ok(handle)
    }

    /// Polls the status of the handle until it reports completion.
    ///
    /// Fails when a poll exhausts its retries, the phase deadline passes or the signal is
    /// stopped. On deadline or stop the engine scan is stopped when configured.
    pub async fn await_completion(
        &self,
        handle: &ScanHandle,
        stop: &StopSignal,
    ) -> Result<(), Error> {
        let deadline = self.polling.phase_timeout.map(|t| (Instant::now() + t, t));
        loop {
            if stop.is_stopped() {
                return Err(self
                    .abandon(Error::Cancelled {
                        phase: handle.phase(),
                        handle: Some(handle.clone()),
                    })
                    .await);
            }
            let status = self
                .client
                .status(handle)
                .await
                .map_err(|source| Error::PhaseStatus {
                    handle: handle.clone(),
                    source,
                })?;
            tracing::trace!(%handle, %status, "polled");
            if status.is_complete() {
                tracing::debug!(%handle, "phase finished");
                if stop.is_stopped() {
                    // nothing left to stop on the engine
                    return Err(Error::Cancelled {
                        phase: handle.phase(),
                        handle: None,
                    });
                }
                return Ok(());
            }
            let mut wake_up = Instant::now() + self.polling.interval;
            if let Some((deadline, timeout)) = deadline {
                if Instant::now() >= deadline {
                    return Err(self
                        .abandon(Error::Timeout {
                            handle: handle.clone(),
                            timeout,
                        })
                        .await);
                }
                wake_up = wake_up.min(deadline);
            }
            tokio::select! {
                _ = tokio::time::sleep_until(wake_up) => {}
                _ = stop.stopped() => {}
            }
        }
    }

    async fn abandon(&self, reason: Error) -> Error {
        let handle = match &reason {
            Error::Timeout { handle, .. }
            | Error::Cancelled {
                handle: Some(handle),
                ..
            } => handle,
            _ => return reason,
        };
        tracing::info!(%handle, error = %reason, "abandoning phase");
        if self.polling.stop_abandoned {
            if let Err(error) = self.client.stop(handle).await {
                tracing::warn!(%handle, %error, "unable to stop abandoned phase");
            }
        }
        reason
    }
}
