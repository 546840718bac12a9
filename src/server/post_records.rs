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
    auth_method_segments,
    models::{ScanRecord, ScanResults},
    storage::{RecordStore, StorageError},
};

#[derive(Debug, Default, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
struct RecordRequest {
    #[serde(default)]
    user_id: Option<String>,
    #[serde(default)]
    url: Option<String>,
    #[serde(default)]
    scan_results: Option<ScanResults>,
}

#[derive(Debug, serde::Serialize, serde::Deserialize)]
pub struct Created {
    pub id: String,
    pub message: String,
}

/// Stores the result of a scan for a user.
pub struct PostRecordsHandler {
    store: Arc<dyn RecordStore>,
}

impl From<Arc<dyn RecordStore>> for PostRecordsHandler {
    fn from(store: Arc<dyn RecordStore>) -> Self {
        Self { store }
    }
}

fn present(value: Option<String>) -> Option<String> {
    value.filter(|x| !x.trim().is_empty())
}

impl RequestHandler for PostRecordsHandler {
    auth_method_segments!(authenticated: true, Method::POST, "records");

    fn call<'a, 'b>(
        &'b self,
        _: Arc<entry::ClientIdentifier>,
        _: &'a entry::Uri,
        body: Bytes,
    ) -> Pin<Box<dyn Future<Output = BodyKind> + Send>>
    where
        'b: 'a,
    {
        let store = self.store.clone();
        Box::pin(async move {
            let request = match serde_json::from_slice::<RecordRequest>(&body) {
                Ok(x) => x,
                Err(e) => return e.into(),
            };
            let Some(user_id) = present(request.user_id) else {
                return BodyKind::error(StatusCode::BAD_REQUEST, "userid missing");
            };
            let Some(url) = present(request.url) else {
                return BodyKind::error(StatusCode::BAD_REQUEST, "url missing");
            };
            let Some(results) = request.scan_results else {
                return BodyKind::error(StatusCode::BAD_REQUEST, "results missing");
            };
            match store.insert(ScanRecord::new(user_id, url, results)).await {
                Ok(id) => BodyKind::json_content(
                    StatusCode::CREATED,
                    &Created {
                        id,
                        message: "Scan results saved successfully.".to_owned(),
                    },
                ),
                Err(e) => e.into(),
            }
        })
    }
}

impl From<StorageError> for BodyKind {
    fn from(e: StorageError) -> Self {
        tracing::warn!(error = %e, "record store failed");
        BodyKind::error(StatusCode::SERVICE_UNAVAILABLE, "Database operation failed")
    }
}
