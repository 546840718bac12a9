// SPDX-FileCopyrightText: 2025 Greenbone AG
//
// SPDX-License-Identifier: GPL-2.0-or-later WITH x11vnc-openssl-exception

use std::{pin::Pin, sync::Arc};

use hyper::StatusCode;

use super::{
    entry::{self, Bytes, Method, RequestHandler},
    response::BodyKind,
};
use crate::{auth_method_segments, storage::RecordStore};

/// Answers as long as the process is able to handle requests.
pub struct GetHealthAliveHandler;

impl RequestHandler for GetHealthAliveHandler {
    auth_method_segments!(authenticated: false, Method::GET, "health", "alive");

    fn call<'a, 'b>(
        &'b self,
        _: Arc<entry::ClientIdentifier>,
        _: &'a entry::Uri,
        _: Bytes,
    ) -> Pin<Box<dyn Future<Output = BodyKind> + Send>>
    where
        'b: 'a,
    {
        Box::pin(async move { BodyKind::no_content(StatusCode::NO_CONTENT) })
    }
}

/// Answers with 204 when the record store is usable, 503 otherwise.
pub struct GetHealthReadyHandler {
    store: Arc<dyn RecordStore>,
}

impl From<Arc<dyn RecordStore>> for GetHealthReadyHandler {
    fn from(store: Arc<dyn RecordStore>) -> Self {
        Self { store }
    }
}

impl RequestHandler for GetHealthReadyHandler {
    auth_method_segments!(authenticated: false, Method::GET, "health", "ready");

    fn call<'a, 'b>(
        &'b self,
        _: Arc<entry::ClientIdentifier>,
        _: &'a entry::Uri,
        _: Bytes,
    ) -> Pin<Box<dyn Future<Output = BodyKind> + Send>>
    where
        'b: 'a,
    {
        let store = self.store.clone();
        Box::pin(async move {
            match store.list("").await {
                Ok(_) => BodyKind::no_content(StatusCode::NO_CONTENT),
                Err(e) => {
                    tracing::debug!(error = %e, "record store not ready");
                    BodyKind::no_content(StatusCode::SERVICE_UNAVAILABLE)
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use hyper::service::Service;

    use super::*;
    use crate::{
        request_handlers,
        server::{Authentication, entry::test_utilities},
        storage::{file, inmemory},
    };

    #[tokio::test]
    async fn no_authentication_required() {
        let store: Arc<dyn RecordStore> = Arc::new(inmemory::Storage::default());
        let entry_point = test_utilities::entry_point(
            Authentication::ApiKey(vec!["secret".to_owned()]),
            request_handlers!(GetHealthAliveHandler, GetHealthReadyHandler::from(store)),
        );
        for path in ["/health/alive", "/health/ready"] {
            let req = test_utilities::empty_request(Method::GET, path);
            let resp = entry_point.call(req).await.unwrap();
            assert_eq!(resp.status(), StatusCode::NO_CONTENT, "{path}");
        }
    }

    #[tokio::test]
    async fn unusable_store() {
        let base = std::env::temp_dir().join(format!("zaprunner-ready-{}", uuid::Uuid::new_v4()));
        std::fs::write(&base, b"not a directory").unwrap();
        let store: Arc<dyn RecordStore> = Arc::new(file::Storage::new(&base));
        let entry_point = test_utilities::entry_point(
            Authentication::Disabled,
            request_handlers!(GetHealthReadyHandler::from(store)),
        );
        let req = test_utilities::empty_request(Method::GET, "/health/ready");
        let resp = entry_point.call(req).await.unwrap();
        std::fs::remove_file(&base).unwrap();
        assert_eq!(resp.status(), StatusCode::SERVICE_UNAVAILABLE);
    }
}
