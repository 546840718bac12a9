// SPDX-FileCopyrightText: 2025 Greenbone AG
//
// SPDX-License-Identifier: GPL-2.0-or-later WITH x11vnc-openssl-exception

//! HTTP surface of zaprunnerd.
//!
//! Endpoints:
//! - POST /scans
//! - GET /scans
//! - DELETE /scans/{id}
//! - POST /records
//! - GET /records/{userId}
//! - DELETE /records/{userId}/{id}
//! - GET /health/alive
//! - GET /health/ready
mod delete_records_id;
mod delete_scans_id;
pub mod entry;
mod get_records_id;
mod get_scans;
mod health;
mod post_records;
mod post_scans;
pub mod response;

use std::{net::SocketAddr, sync::Arc};

use hyper_util::rt::TokioIo;
use tokio::net::TcpListener;

pub use entry::{ClientHash, ClientIdentifier, RequestHandler, RequestHandlers};

use crate::{orchestration::Orchestrator, storage::RecordStore, zap::Transport};
use delete_records_id::DeleteRecordsIdHandler;
use delete_scans_id::DeleteScansIdHandler;
use get_records_id::GetRecordsIdHandler;
use get_scans::GetScansHandler;
use health::{GetHealthAliveHandler, GetHealthReadyHandler};
use post_records::PostRecordsHandler;
use post_scans::PostScansHandler;

/// How callers prove who they are.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Authentication {
    Disabled,
    /// Callers must send one of the keys in the `x-api-key` header
    ApiKey(Vec<String>),
}

impl Authentication {
    pub fn static_str(&self) -> &'static str {
        match self {
            Authentication::Disabled => "disabled",
            Authentication::ApiKey(_) => "api-key",
        }
    }
}

/// Information shared by every connection.
#[derive(Debug, Clone)]
pub struct Server {
    pub api_version: String,
    pub authentication: Authentication,
}

pub struct RuntimeBuilder {
    api_version: Vec<String>,
    listener_address: SocketAddr,
    api_keys: Vec<String>,
    handlers: RequestHandlers,
}

impl Default for RuntimeBuilder {
    fn default() -> Self {
        Self::new(([127, 0, 0, 1], 3000).into())
    }
}

impl RuntimeBuilder {
    pub fn new(listener_address: SocketAddr) -> Self {
        let mut handlers = RequestHandlers::default();
        handlers.push(GetHealthAliveHandler);
        Self {
            api_version: vec!["1".to_owned()],
            listener_address,
            api_keys: vec![],
            handlers,
        }
    }

    /// Requires one of the given keys on authenticated endpoints.
    ///
    /// Authentication stays disabled when no key is given.
    pub fn api_keys(mut self, keys: Vec<String>) -> Self {
        self.api_keys = keys;
        self
    }

    /// Adds a handler, replacing a previous one with the same method and path.
    pub fn add_request_handler<R>(mut self, value: R) -> Self
    where
        R: RequestHandler + Sync + Send + 'static,
    {
        let idx = self.handlers.handlers.iter().position(|or| {
            or.http_method() == value.http_method() && or.path_segments() == value.path_segments()
        });
        let value = Arc::new(Box::new(value) as Box<dyn RequestHandler + Send + Sync + 'static>);
        if let Some(idx) = idx {
            self.handlers.handlers[idx] = value;
        } else {
            self.handlers.handlers.push(value);
        }
        self
    }

    pub fn insert_scans<T>(
        self,
        orchestrator: Arc<Orchestrator<T>>,
        records: Arc<dyn RecordStore>,
    ) -> Self
    where
        T: Transport + 'static,
    {
        let registry = orchestrator.registry().clone();
        self.add_request_handler(PostScansHandler::new(orchestrator, records))
            .add_request_handler(GetScansHandler::from(registry.clone()))
            .add_request_handler(DeleteScansIdHandler::from(registry))
    }

    pub fn insert_records(self, records: Arc<dyn RecordStore>) -> Self {
        self.add_request_handler(PostRecordsHandler::from(records.clone()))
            .add_request_handler(GetRecordsIdHandler::from(records.clone()))
            .add_request_handler(DeleteRecordsIdHandler::from(records.clone()))
            .add_request_handler(GetHealthReadyHandler::from(records))
    }

    fn build_server(&self) -> Server {
        let authentication = if self.api_keys.is_empty() {
            tracing::warn!("no api-key configured. Endpoints are not secured.");
            Authentication::Disabled
        } else {
            Authentication::ApiKey(self.api_keys.clone())
        };
        Server {
            api_version: self.api_version.join(","),
            authentication,
        }
    }

    pub fn into_entry_point(self) -> entry::EntryPoint {
        let server = Arc::new(self.build_server());
        entry::EntryPoint::new(server, Arc::new(self.handlers))
    }

    pub async fn run_blocking(self) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        use hyper::server::conn::http1::Builder;

        let listener_address = self.listener_address;
        let incoming = TcpListener::bind(&listener_address).await?;
        let server = Arc::new(self.build_server());
        let handlers = Arc::new(self.handlers);
        tracing::info!("listening on http://{}", listener_address);
        loop {
            let (tcp_stream, _remote_addr) = incoming.accept().await?;
            let server = server.clone();
            let handlers = handlers.clone();
            tokio::spawn(async move {
                let service = entry::EntryPoint::new(server, handlers);
                if let Err(err) = Builder::new()
                    .serve_connection(TokioIo::new(tcp_stream), service)
                    .await
                {
                    tracing::debug!("failed to serve connection: {err:#}");
                }
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use hyper::{Method, StatusCode, service::Service};

    use super::*;
    use crate::{
        orchestration::Settings,
        storage::inmemory,
        zap::{
            Operation,
            transport::{Lambda, LambdaBuilder},
        },
    };

    fn orchestrator() -> Arc<Orchestrator<Lambda>> {
        let transport = LambdaBuilder::new()
            .with_json(Operation::StartDiscovery, r#"{"scan": "1"}"#)
            .with_json(Operation::DiscoveryStatus, r#"{"status": "100"}"#)
            .with_json(Operation::StartAssessment, r#"{"scanId": 2}"#)
            .with_json(Operation::AssessmentStatus, r#"{"status": "100"}"#)
            .with_json(Operation::ListAlerts, r#"{"alerts": []}"#)
            .build();
        Arc::new(Orchestrator::new(transport, Settings::default()))
    }

    #[tokio::test]
    async fn registers_all_endpoints() {
        let records: Arc<dyn RecordStore> = Arc::new(inmemory::Storage::default());
        let entry_point = RuntimeBuilder::default()
            .insert_scans(orchestrator(), records.clone())
            .insert_records(records)
            .into_entry_point();
        for (method, path, expected) in [
            (Method::GET, "/health/alive", StatusCode::NO_CONTENT),
            (Method::GET, "/health/ready", StatusCode::NO_CONTENT),
            (Method::GET, "/scans", StatusCode::OK),
            (Method::HEAD, "/scans", StatusCode::OK),
            (Method::DELETE, "/scans/unknown", StatusCode::NOT_FOUND),
            (Method::GET, "/records/nobody", StatusCode::NOT_FOUND),
            (Method::PUT, "/records", StatusCode::METHOD_NOT_ALLOWED),
            (Method::GET, "/vts", StatusCode::NOT_FOUND),
        ] {
            let req = entry::test_utilities::empty_request(method.clone(), path);
            let resp = entry_point.call(req).await.unwrap();
            assert_eq!(resp.status(), expected, "{method} {path}");
            assert_eq!(resp.headers().get("authentication").unwrap(), "disabled");
        }
    }

    #[tokio::test]
    async fn api_keys_enable_authentication() {
        let entry_point = RuntimeBuilder::default()
            .api_keys(vec!["secret".to_owned()])
            .into_entry_point();
        let req = entry::test_utilities::empty_request(Method::GET, "/health/alive");
        let resp = entry_point.call(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::NO_CONTENT);
        assert_eq!(resp.headers().get("authentication").unwrap(), "api-key");
        assert_eq!(resp.headers().get("api-version").unwrap(), "1");
    }

    #[test]
    fn later_handlers_replace_earlier_ones() {
        let records: Arc<dyn RecordStore> = Arc::new(inmemory::Storage::default());
        let builder = RuntimeBuilder::default()
            .insert_records(records.clone())
            .insert_records(records);
        // alive, ready and the three record endpoints
        assert_eq!(builder.handlers.handlers.len(), 5);
    }
}
