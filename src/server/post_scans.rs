// SPDX-FileCopyrightText: 2025 Greenbone AG
//
// SPDX-License-Identifier: GPL-2.0-or-later WITH x11vnc-openssl-exception

use std::{pin::Pin, sync::Arc};

use hyper::StatusCode;

use super::{
    entry::{self, Bytes, Method, RequestHandler},
    response::BodyKind,
};
use crate::{
    auth_method_segments, internal_server_error,
    models::{ScanRecord, ScanResults, Target},
    orchestration::{self, Orchestrator, StopSignal},
    storage::RecordStore,
    zap::Transport,
};

#[derive(Debug, Default, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
struct ScanRequest {
    #[serde(default)]
    url: Option<String>,
    #[serde(default)]
    user_id: Option<String>,
}

/// Runs a scan and answers with the normalized result once it is finished.
pub struct PostScansHandler<T> {
    orchestrator: Arc<Orchestrator<T>>,
    records: Arc<dyn RecordStore>,
}

impl<T> PostScansHandler<T> {
    pub fn new(orchestrator: Arc<Orchestrator<T>>, records: Arc<dyn RecordStore>) -> Self {
        Self {
            orchestrator,
            records,
        }
    }
}

impl<T> RequestHandler for PostScansHandler<T>
where
    T: Transport + 'static,
{
    auth_method_segments!(authenticated: true, Method::POST, "scans");

    fn call<'a, 'b>(
        &'b self,
        client_id: Arc<entry::ClientIdentifier>,
        _: &'a entry::Uri,
        body: Bytes,
    ) -> Pin<Box<dyn Future<Output = BodyKind> + Send>>
    where
        'b: 'a,
    {
        let orchestrator = self.orchestrator.clone();
        let records = self.records.clone();
        Box::pin(async move {
            let request = match serde_json::from_slice::<ScanRequest>(&body) {
                Ok(x) => x,
                Err(e) => return e.into(),
            };
            let target = match Target::try_from(request.url.as_deref()) {
                Ok(x) => x,
                Err(e) => return BodyKind::error(StatusCode::BAD_REQUEST, &e.to_string()),
            };
            tracing::info!(client = %client_id, %target, "scan requested");
            let result = match orchestrator.run_with(&target, StopSignal::default()).await {
                Ok(x) => x,
                Err(e) => return e.into(),
            };
            if let Some(user_id) = request.user_id.filter(|x| !x.trim().is_empty()) {
                let record = ScanRecord::new(user_id, target.as_str(), ScanResults::from(&result));
                if let Err(error) = records.insert(record).await {
                    tracing::warn!(%error, %target, "unable to store scan record");
                }
            }
            BodyKind::json_content(StatusCode::OK, &result)
        })
    }
}

impl From<orchestration::Error> for BodyKind {
    fn from(e: orchestration::Error) -> Self {
        match e {
            orchestration::Error::InvalidTarget(e) => {
                BodyKind::error(StatusCode::BAD_REQUEST, &e.to_string())
            }
            orchestration::Error::AlreadyRunning(url) => {
                tracing::info!(url, "rejected concurrent run");
                BodyKind::error(
                    StatusCode::CONFLICT,
                    "A scan for this URL is already running",
                )
            }
            e => internal_server_error!(e),
        }
    }
}
