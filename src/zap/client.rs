// SPDX-FileCopyrightText: 2025 Greenbone AG
//
// SPDX-License-Identifier: GPL-2.0-or-later WITH x11vnc-openssl-exception

use std::time::Duration;

use serde::de::DeserializeOwned;

use super::{
    ActionResponse, AlertsResponse, ControlRequest, Error, Operation, StartResponse,
    StatusResponse, Transport,
};
use crate::models::{Finding, Phase, PhaseStatus, ScanHandle, Target};

/// Retry budget of a single control call.
///
/// `attempts` is the total number of tries; the delay is only awaited between two tries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub attempts: usize,
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            attempts: 3,
            delay: Duration::from_secs(1),
        }
    }
}

/// Typed access to the control API.
pub struct Client<T> {
    transport: T,
    retry: RetryPolicy,
}

impl<T> Client<T>
where
    T: Transport,
{
    pub fn new(transport: T, retry: RetryPolicy) -> Self {
        Self { transport, retry }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Sends the request and decodes the answer.
    ///
    /// Unreachable engines, non 2xx answers and payloads that cannot be decoded into `R` all
    /// count as a failed attempt.
    pub async fn invoke<R>(&self, request: &ControlRequest) -> Result<R, Error>
    where
        R: DeserializeOwned,
    {
        let attempts = self.retry.attempts.max(1);
        let mut detail = String::new();
        for attempt in 1..=attempts {
            match self.attempt(request).await {
                Ok(x) => return Ok(x),
                Err(e) => {
                    tracing::warn!(%request, attempt, attempts, error = %e, "control call failed");
                    detail = e;
                }
            }
            if attempt < attempts {
                tokio::time::sleep(self.retry.delay).await;
            }
        }
        Err(Error::ControlChannel {
            operation: request.operation(),
            attempts,
            detail,
        })
    }

    async fn attempt<R>(&self, request: &ControlRequest) -> Result<R, String>
    where
        R: DeserializeOwned,
    {
        let response = self
            .transport
            .send(request)
            .await
            .map_err(|e| e.to_string())?;
        if !response.is_success() {
            return Err(format!(
                "received {} {}: {}",
                response.status, response.reason, response.body
            ));
        }
        serde_json::from_str(&response.body).map_err(|e| format!("malformed payload: {e}"))
    }

    /// Starts the given phase for the target and returns the handle of the engine.
    pub async fn start(&self, phase: Phase, target: &Target) -> Result<ScanHandle, Error> {
        let request = ControlRequest::new(Operation::start(phase)).param("url", target.as_str());
        let response: StartResponse = self.invoke(&request).await?;
        Ok(ScanHandle::new(phase, response.scan))
    }

    pub async fn status(&self, handle: &ScanHandle) -> Result<PhaseStatus, Error> {
        let request =
            ControlRequest::new(Operation::status(handle.phase())).param("scanId", handle.id());
        let response: StatusResponse = self.invoke(&request).await?;
        Ok(response.status)
    }

    pub async fn stop(&self, handle: &ScanHandle) -> Result<(), Error> {
        let request =
            ControlRequest::new(Operation::stop(handle.phase())).param("scanId", handle.id());
        let _: ActionResponse = self.invoke(&request).await?;
        Ok(())
    }

    /// Lists all findings the engine collected for the target.
    pub async fn alerts(&self, target: &Target) -> Result<Vec<Finding>, Error> {
        let request = ControlRequest::new(Operation::ListAlerts).param("baseurl", target.as_str());
        let response: AlertsResponse = self.invoke(&request).await?;
        Ok(response.alerts)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    };

    use tokio::time::Instant;

    use super::*;
    use crate::zap::{
        RawResponse, TransportError,
        transport::{Lambda, LambdaBuilder},
    };

    fn failing_then(failures: usize, body: &'static str) -> Lambda {
        let count = Arc::new(AtomicUsize::new(0));
        LambdaBuilder::new()
            .with(Operation::StartDiscovery, move |_| {
                if count.fetch_add(1, Ordering::SeqCst) < failures {
                    Err(TransportError("connection refused".to_owned()))
                } else {
                    Ok(RawResponse::ok(body))
                }
            })
            .build()
    }

    fn target() -> Target {
        Target::try_from("http://example.test").unwrap()
    }

    #[tokio::test(start_paused = true)]
    async fn succeeds_within_budget() {
        let client = Client::new(failing_then(2, r#"{"scan":"7"}"#), RetryPolicy::default());
        let started = Instant::now();
        let handle = client.start(Phase::Discovery, &target()).await.unwrap();
        assert_eq!(handle, ScanHandle::new(Phase::Discovery, "7"));
        assert_eq!(client.transport().count(Operation::StartDiscovery), 3);
        assert_eq!(started.elapsed(), Duration::from_secs(2));
    }

    #[tokio::test(start_paused = true)]
    async fn fails_after_budget_without_trailing_delay() {
        let client = Client::new(failing_then(3, r#"{"scan":"7"}"#), RetryPolicy::default());
        let started = Instant::now();
        let result = client.start(Phase::Discovery, &target()).await;
        assert_eq!(
            result,
            Err(Error::ControlChannel {
                operation: Operation::StartDiscovery,
                attempts: 3,
                detail: "connection refused".to_owned()
            })
        );
        assert_eq!(client.transport().count(Operation::StartDiscovery), 3);
        assert_eq!(started.elapsed(), Duration::from_secs(2));
    }

    #[tokio::test(start_paused = true)]
    async fn malformed_payload_is_retried() {
        let client = Client::new(
            LambdaBuilder::new()
                .with_json(Operation::AssessmentStatus, r#"{"unexpected": true}"#)
                .build(),
            RetryPolicy::default(),
        );
        let handle = ScanHandle::new(Phase::Assessment, "1");
        let result = client.status(&handle).await;
        assert!(matches!(
            result,
            Err(Error::ControlChannel { attempts: 3, .. })
        ));
        assert_eq!(client.transport().count(Operation::AssessmentStatus), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn error_status_is_a_failure() {
        let client = Client::new(LambdaBuilder::new().build(), RetryPolicy::default());
        let result = client.alerts(&target()).await;
        assert!(matches!(
            result,
            Err(Error::ControlChannel { operation: Operation::ListAlerts, ref detail, .. }) if detail.starts_with("received 404")
        ));
    }

    #[tokio::test]
    async fn status_is_addressed_to_the_phase_of_the_handle() {
        let client = Client::new(
            LambdaBuilder::new()
                .with_json(Operation::AssessmentStatus, r#"{"status":"55"}"#)
                .build(),
            RetryPolicy::default(),
        );
        let status = client
            .status(&ScanHandle::new(Phase::Assessment, "9"))
            .await
            .unwrap();
        assert_eq!(status.percent(), 55);
        let calls = client.transport().calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].get("scanId"), Some("9"));
        assert_eq!(client.transport().count(Operation::DiscoveryStatus), 0);
    }
}
