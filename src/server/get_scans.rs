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

/// Lists the runs that are currently in flight.
pub struct GetScansHandler {
    registry: Arc<Registry>,
}

impl From<Arc<Registry>> for GetScansHandler {
    fn from(registry: Arc<Registry>) -> Self {
        Self { registry }
    }
}

impl RequestHandler for GetScansHandler {
    auth_method_segments!(authenticated: true, Method::GET, "scans");

    fn call<'a, 'b>(
        &'b self,
        _: Arc<entry::ClientIdentifier>,
        _: &'a entry::Uri,
        _: Bytes,
    ) -> Pin<Box<dyn Future<Output = BodyKind> + Send>>
    where
        'b: 'a,
    {
        let runs = self.registry.list();
        Box::pin(async move { BodyKind::json_content(StatusCode::OK, &runs) })
    }
}

#[cfg(test)]
mod tests {
    use hyper::service::Service;

    use super::*;
    use crate::{
        models::{RunInfo, RunState, Target},
        orchestration::StopSignal,
        request_handlers,
        server::{Authentication, entry::test_utilities},
    };

    #[tokio::test]
    async fn lists_runs() {
        let registry = Arc::new(Registry::default());
        let entry_point = test_utilities::entry_point(
            Authentication::Disabled,
            request_handlers!(GetScansHandler::from(registry.clone())),
        );
        let req = test_utilities::empty_request(Method::GET, "/scans");
        let resp = entry_point.call(req).await.unwrap();
        let runs: Vec<RunInfo> = test_utilities::json_response(resp).await;
        assert!(runs.is_empty());

        let guard = registry
            .register(
                &Target::try_from("http://example.test").unwrap(),
                StopSignal::default(),
            )
            .unwrap();
        guard.publish(RunState::Assessing);
        let req = test_utilities::empty_request(Method::GET, "/scans");
        let resp = entry_point.call(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let runs: Vec<RunInfo> = test_utilities::json_response(resp).await;
        assert_eq!(runs.len(), 1);
        assert_eq!(runs[0].id, guard.id());
        assert_eq!(runs[0].url, "http://example.test");
        assert_eq!(runs[0].state, RunState::Assessing);
    }
}
