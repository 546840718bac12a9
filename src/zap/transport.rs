// SPDX-FileCopyrightText: 2025 Greenbone AG
//
// SPDX-License-Identifier: GPL-2.0-or-later WITH x11vnc-openssl-exception

//! Transports used to deliver control requests to the engine.

use std::{collections::HashMap, sync::Mutex, time::Duration};

use async_trait::async_trait;

use super::{ControlRequest, Error, Operation};

/// Undecoded answer of the engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse {
    pub status: u16,
    pub reason: String,
    pub body: String,
}

impl RawResponse {
    /// Creates a `200 OK` response with the given body.
    pub fn ok(body: impl Into<String>) -> Self {
        Self {
            status: 200,
            reason: "OK".to_owned(),
            body: body.into(),
        }
    }

    pub fn with_status(status: u16, reason: &str, body: impl Into<String>) -> Self {
        Self {
            status,
            reason: reason.to_owned(),
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// The engine could not be reached or the exchange was interrupted.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{0}")]
pub struct TransportError(pub String);

/// Delivers a single control request and returns the raw answer.
///
/// Implementations must not retry, retries are handled by the [super::Client].
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: &ControlRequest) -> Result<RawResponse, TransportError>;
}

/// HTTP transport to a running engine.
#[derive(Debug, Clone)]
pub struct Http {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
}

impl Http {
    pub fn new(
        base_url: impl Into<String>,
        api_key: Option<String>,
        timeout: Duration,
    ) -> Result<Self, Error> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::Setup(e.to_string()))?;
        Ok(Self {
            client,
            base_url: base_url.into(),
            api_key: api_key.filter(|x| !x.is_empty()),
        })
    }
}

#[async_trait]
impl Transport for Http {
    async fn send(&self, request: &ControlRequest) -> Result<RawResponse, TransportError> {
        let url = request.url(&self.base_url, self.api_key.as_deref());
        // the url contains the api key and must not end up in an error message
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| TransportError(e.without_url().to_string()))?;
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| TransportError(e.without_url().to_string()))?;
        Ok(RawResponse {
            status: status.as_u16(),
            reason: status.canonical_reason().unwrap_or_default().to_owned(),
            body,
        })
    }
}

type Handler = Box<dyn Fn(&ControlRequest) -> Result<RawResponse, TransportError> + Sync + Send>;

/// Is a transport implementation primarily for testing purposes.
///
/// Each operation is answered by a callback; operations without a callback are answered with a
/// `404`. Every delivered request is recorded.
#[derive(Default)]
pub struct Lambda {
    handlers: HashMap<Operation, Handler>,
    calls: Mutex<Vec<ControlRequest>>,
}

impl Lambda {
    /// Returns all requests delivered so far.
    pub fn calls(&self) -> Vec<ControlRequest> {
        self.calls
            .lock()
            .map(|calls| calls.clone())
            .unwrap_or_default()
    }

    /// Returns how often the given operation was requested.
    pub fn count(&self, operation: Operation) -> usize {
        self.calls()
            .iter()
            .filter(|x| x.operation() == operation)
            .count()
    }
}

#[async_trait]
impl Transport for Lambda {
    async fn send(&self, request: &ControlRequest) -> Result<RawResponse, TransportError> {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(request.clone());
        }
        match self.handlers.get(&request.operation()) {
            Some(handler) => handler(request),
            None => Ok(RawResponse::with_status(404, "Not Found", "")),
        }
    }
}

/// Builds a Lambda transport implementation.
#[derive(Default)]
pub struct LambdaBuilder {
    lambda: Lambda,
}

impl LambdaBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with<F>(mut self, operation: Operation, f: F) -> Self
    where
        F: Fn(&ControlRequest) -> Result<RawResponse, TransportError> + Sync + Send + 'static,
    {
        self.lambda.handlers.insert(operation, Box::new(f));
        self
    }

    /// Answers the operation always with the given JSON body.
    pub fn with_json(self, operation: Operation, body: &'static str) -> Self {
        self.with(operation, move |_| Ok(RawResponse::ok(body)))
    }

    /// Answers status requests of the operation with the given sequence.
    ///
    /// The last entry is repeated once the sequence is exhausted.
    pub fn with_progress(self, operation: Operation, progress: Vec<u8>) -> Self {
        let polled = Mutex::new(0usize);
        self.with(operation, move |_| {
            let mut polled = polled
                .lock()
                .map_err(|e| TransportError(e.to_string()))?;
            let idx = (*polled).min(progress.len().saturating_sub(1));
            *polled += 1;
            let value = progress.get(idx).copied().unwrap_or(100);
            Ok(RawResponse::ok(format!(r#"{{"status":"{value}"}}"#)))
        })
    }

    pub fn build(self) -> Lambda {
        self.lambda
    }
}
