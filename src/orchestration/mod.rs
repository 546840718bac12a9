// SPDX-FileCopyrightText: 2025 Greenbone AG
//
// SPDX-License-Identifier: GPL-2.0-or-later WITH x11vnc-openssl-exception

//! Runs a target through discovery, assessment and result normalization.
//!
//! A run is strictly sequential: the assessment phase is only started after the discovery
//! phase reported completion. Every run is tracked in a [Registry] for as long as it is in
//! flight and can be cancelled through it.
mod error;
mod normalizer;
mod registry;
mod sequencer;
mod signal;

use std::sync::Arc;

pub use error::Error;
pub use normalizer::{Deduplication, Normalizer, filter, rank};
pub use registry::{ConcurrentRuns, Registry, RunGuard};
pub use sequencer::{Polling, Sequencer};
pub use signal::StopSignal;

use crate::{
    config::Config,
    models::{NormalizedResult, Phase, RunEvent, RunState, Target},
    zap::{Client, RetryPolicy, Transport},
};

/// Tunables of an [Orchestrator].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Settings {
    pub retry: RetryPolicy,
    pub polling: Polling,
    pub deduplication: Deduplication,
    pub concurrent: ConcurrentRuns,
}

impl From<&Config> for Settings {
    fn from(config: &Config) -> Self {
        Self {
            retry: RetryPolicy {
                attempts: config.retry.attempts,
                delay: config.retry.delay,
            },
            polling: Polling {
                interval: config.polling.interval,
                phase_timeout: Some(config.polling.phase_timeout).filter(|x| !x.is_zero()),
                stop_abandoned: config.polling.stop_abandoned,
            },
            deduplication: config.results.deduplication,
            concurrent: config.runs.concurrent,
        }
    }
}

pub struct Orchestrator<T> {
    sequencer: Sequencer<T>,
    normalizer: Normalizer,
    registry: Arc<Registry>,
}

impl<T> Orchestrator<T>
where
    T: Transport,
{
    pub fn new(transport: T, settings: Settings) -> Self {
        Self {
            sequencer: Sequencer::new(Client::new(transport, settings.retry), settings.polling),
            normalizer: Normalizer::new(settings.deduplication),
            registry: Arc::new(Registry::new(settings.concurrent)),
        }
    }

    pub fn registry(&self) -> &Arc<Registry> {
        &self.registry
    }

    pub fn transport(&self) -> &T {
        self.sequencer.client().transport()
    }

    /// Runs the given URL to completion.
    pub async fn run(&self, url: &str) -> Result<NormalizedResult, Error> {
        let target = Target::try_from(url)?;
        self.run_with(&target, StopSignal::default()).await
    }

    /// Runs the target to completion or until the signal is stopped.
    pub async fn run_with(
        &self,
        target: &Target,
        stop: StopSignal,
    ) -> Result<NormalizedResult, Error> {
        let guard = self.registry.register(target, stop.clone())?;
        let mut run = Run {
            guard,
            state: RunState::default(),
        };
        let result = self.drive(target, &mut run, &stop).await;
        match &result {
            Ok(x) => {
                tracing::info!(run = run.id(), %target, scan_id = x.scan_id(), alerts = x.alerts().len(), "run finished");
            }
            Err(error) => {
                tracing::warn!(run = run.id(), %target, %error, "run failed");
                if let Err(error) = run.advance(RunEvent::Fail) {
                    tracing::debug!(%error, "run already done");
                }
            }
        }
        result
    }

    async fn drive(
        &self,
        target: &Target,
        run: &mut Run,
        stop: &StopSignal,
    ) -> Result<NormalizedResult, Error> {
        run.advance(RunEvent::StartDiscovery)?;
        let discovery = self
            .sequencer
            .start_phase(Phase::Discovery, target, stop)
            .await?;
        self.sequencer.await_completion(&discovery, stop).await?;
        run.advance(RunEvent::DiscoveryFinished)?;

        run.advance(RunEvent::StartAssessment)?;
        let assessment = self
            .sequencer
            .start_phase(Phase::Assessment, target, stop)
            .await?;
        self.sequencer.await_completion(&assessment, stop).await?;

        let findings = self
            .normalizer
            .fetch(self.sequencer.client(), target)
            .await?;
        let received = findings.len();
        let alerts = self.normalizer.normalize(findings);
        tracing::debug!(received, kept = alerts.len(), "normalized findings");
        run.advance(RunEvent::ResultsCollected)?;
        Ok(NormalizedResult::new(assessment.id(), alerts))
    }
}

struct Run {
    guard: RunGuard,
    state: RunState,
}

impl Run {
    fn id(&self) -> &str {
        self.guard.id()
    }

    fn advance(&mut self, event: RunEvent) -> Result<(), Error> {
        let next = self.state.next(event)?;
        tracing::info!(run = self.id(), from = %self.state, to = %next, "state changed");
        self.state = next;
        self.guard.publish(next);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::{
        models::RiskLevel,
        zap::{
            ControlRequest, Operation, RawResponse, TransportError,
            transport::LambdaBuilder,
        },
    };

    const ALERTS: &str = r#"{"alerts": [
        {"pluginId": "10020", "name": "Missing Anti-clickjacking Header", "risk": "Medium", "description": "frame", "solution": "set header", "method": "GET"},
        {"pluginId": "40012", "name": "Cross Site Scripting (Reflected)", "risk": "High", "description": "xss", "solution": "encode", "method": "GET"},
        {"pluginId": "10020", "name": "Missing Anti-clickjacking Header", "risk": "Medium", "description": "frame", "solution": "set header", "method": "GET"},
        {"pluginId": "10021", "name": "X-Content-Type-Options Header Missing", "risk": "Low", "description": "nosniff", "solution": "set header", "method": "GET"}
    ]}"#;

    fn engine() -> LambdaBuilder {
        LambdaBuilder::new()
            .with_json(Operation::StartDiscovery, r#"{"scan":"0"}"#)
            .with_progress(Operation::DiscoveryStatus, vec![0, 50, 100])
            .with_json(Operation::StartAssessment, r#"{"scan":"1"}"#)
            .with_progress(Operation::AssessmentStatus, vec![0, 20, 40, 80, 100])
            .with_json(Operation::ListAlerts, ALERTS)
    }

    fn index_of(calls: &[ControlRequest], predicate: impl Fn(&ControlRequest) -> bool) -> usize {
        calls.iter().position(predicate).unwrap()
    }

    #[tokio::test(start_paused = true)]
    async fn full_run() {
        let orchestrator = Orchestrator::new(engine().build(), Settings::default());
        let result = orchestrator.run("http://example.test").await.unwrap();
        assert_eq!(result.scan_id(), "1");
        let risks: Vec<_> = result.alerts().iter().map(|x| x.risk.clone()).collect();
        assert_eq!(
            risks,
            vec![RiskLevel::High, RiskLevel::Medium, RiskLevel::Low]
        );

        let lambda = orchestrator.transport();
        assert_eq!(lambda.count(Operation::DiscoveryStatus), 3);
        assert_eq!(lambda.count(Operation::AssessmentStatus), 5);
        let calls = lambda.calls();
        let discovery_done = index_of(&calls, |x| {
            x.operation() == Operation::DiscoveryStatus && x.get("scanId") == Some("0")
        }) + 2;
        let assessment_start = index_of(&calls, |x| x.operation() == Operation::StartAssessment);
        assert!(discovery_done < assessment_start);
        assert!(
            calls
                .iter()
                .filter(|x| x.operation() == Operation::AssessmentStatus)
                .all(|x| x.get("scanId") == Some("1"))
        );
        assert!(orchestrator.registry().list().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn failing_discovery_start_never_starts_assessment() {
        let lambda = LambdaBuilder::new()
            .with(Operation::StartDiscovery, |_| {
                Err(TransportError("connection refused".to_owned()))
            })
            .with_json(Operation::StartAssessment, r#"{"scan":"1"}"#)
            .build();
        let orchestrator = Orchestrator::new(lambda, Settings::default());
        let result = orchestrator.run("http://example.test").await;
        assert!(matches!(
            result,
            Err(Error::PhaseStart {
                phase: Phase::Discovery,
                ..
            })
        ));
        assert_eq!(orchestrator.transport().count(Operation::StartDiscovery), 3);
        assert_eq!(orchestrator.transport().count(Operation::StartAssessment), 0);
    }

    #[tokio::test]
    async fn empty_target_makes_no_calls() {
        let orchestrator = Orchestrator::new(engine().build(), Settings::default());
        for url in ["", "   "] {
            let result = orchestrator.run(url).await;
            assert!(matches!(result, Err(Error::InvalidTarget(_))));
        }
        assert!(orchestrator.transport().calls().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn failing_alert_fetch_fails_the_run() {
        let lambda = engine()
            .with(Operation::ListAlerts, |_| {
                Ok(RawResponse::with_status(500, "Internal Server Error", "boom"))
            })
            .build();
        let orchestrator = Orchestrator::new(lambda, Settings::default());
        let result = orchestrator.run("http://example.test").await;
        assert!(matches!(result, Err(Error::ResultFetch(_))));
    }

    #[tokio::test(start_paused = true)]
    async fn description_deduplication() {
        let lambda = engine()
            .with_json(
                Operation::ListAlerts,
                r#"{"alerts": [
                    {"pluginId": "1", "risk": "Low", "description": "same", "method": "GET"},
                    {"pluginId": "2", "risk": "High", "description": "same", "method": "POST"}
                ]}"#,
            )
            .build();
        let orchestrator = Orchestrator::new(
            lambda,
            Settings {
                deduplication: Deduplication::Description,
                ..Default::default()
            },
        );
        let result = orchestrator.run("http://example.test").await.unwrap();
        assert_eq!(result.alerts().len(), 1);
        assert_eq!(result.alerts()[0].plugin_id, "1");
    }

    #[tokio::test(start_paused = true)]
    async fn rejects_concurrent_run_for_same_target() {
        let lambda = engine()
            .with_progress(Operation::DiscoveryStatus, vec![0])
            .build();
        let orchestrator = Arc::new(Orchestrator::new(
            lambda,
            Settings {
                concurrent: ConcurrentRuns::Reject,
                ..Default::default()
            },
        ));
        let stop = StopSignal::default();
        let target = Target::try_from("http://example.test").unwrap();
        let first = {
            let orchestrator = orchestrator.clone();
            let target = target.clone();
            let stop = stop.clone();
            tokio::spawn(async move { orchestrator.run_with(&target, stop).await })
        };
        tokio::time::sleep(Duration::from_secs(2)).await;
        let runs = orchestrator.registry().list();
        assert_eq!(runs.len(), 1);
        assert_eq!(runs[0].state, RunState::Discovering);

        let second = orchestrator.run("http://example.test").await;
        assert!(matches!(second, Err(Error::AlreadyRunning(_))));

        assert!(orchestrator.registry().stop(&runs[0].id));
        let first = first.await.unwrap();
        assert!(matches!(first, Err(Error::Cancelled { .. })));
        assert!(orchestrator.registry().list().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_after_discovery_never_starts_assessment() {
        let stop = StopSignal::default();
        let lambda = {
            let stop = stop.clone();
            engine()
                .with(Operation::DiscoveryStatus, move |_| {
                    stop.stop();
                    Ok(RawResponse::ok(r#"{"status":"100"}"#))
                })
                .with_json(Operation::StopAssessment, r#"{"Result":"OK"}"#)
                .build()
        };
        let orchestrator = Orchestrator::new(lambda, Settings::default());
        let target = Target::try_from("http://example.test").unwrap();
        let result = orchestrator.run_with(&target, stop).await;
        assert_eq!(
            result,
            Err(Error::Cancelled {
                phase: Phase::Discovery,
                handle: None
            })
        );
        let lambda = orchestrator.transport();
        assert_eq!(lambda.count(Operation::StartAssessment), 0);
        assert_eq!(lambda.count(Operation::StopAssessment), 0);
        assert_eq!(lambda.count(Operation::StopDiscovery), 0);
        assert!(orchestrator.registry().list().is_empty());
    }

    #[test]
    fn settings_from_default_config() {
        let settings = Settings::from(&Config::default());
        assert_eq!(settings, Settings::default());
    }
}
