// SPDX-FileCopyrightText: 2025 Greenbone AG
//
// SPDX-License-Identifier: GPL-2.0-or-later WITH x11vnc-openssl-exception

use std::{pin::Pin, sync::Arc};

use hyper::StatusCode;

use super::{
    entry::{self, Bytes, Method, RequestHandler},
    response::BodyKind,
};
use crate::{auth_method_segments, orchestration::Registry};

/// Cancels a run that is in flight.
///
/// The request that started the run answers with an error once the cancellation took effect.
pub struct DeleteScansIdHandler {
    registry: Arc<Registry>,
}

impl From<Arc<Registry>> for DeleteScansIdHandler {
    fn from(registry: Arc<Registry>) -> Self {
        Self { registry }
    }
}

impl RequestHandler for DeleteScansIdHandler {
    auth_method_segments!(authenticated: true, Method::DELETE, "scans", "*");

    fn call<'a, 'b>(
        &'b self,
        client_id: Arc<entry::ClientIdentifier>,
        uri: &'a entry::Uri,
        _: Bytes,
    ) -> Pin<Box<dyn Future<Output = BodyKind> + Send>>
    where
        'b: 'a,
    {
        let id = self.ids(uri).into_iter().next().unwrap_or_default();
        let stopped = self.registry.stop(&id);
        Box::pin(async move {
            if stopped {
                tracing::info!(client = %client_id, run = id, "run cancelled");
                BodyKind::no_content(StatusCode::NO_CONTENT)
            } else {
                BodyKind::no_content(StatusCode::NOT_FOUND)
            }
        })
    }
}
