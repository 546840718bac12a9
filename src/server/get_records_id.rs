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

/// Returns the stored scans of a user, newest first.
pub struct GetRecordsIdHandler {
    store: Arc<dyn RecordStore>,
}

impl From<Arc<dyn RecordStore>> for GetRecordsIdHandler {
    fn from(store: Arc<dyn RecordStore>) -> Self {
        Self { store }
    }
}

impl RequestHandler for GetRecordsIdHandler {
    auth_method_segments!(authenticated: true, Method::GET, "records", "*");

    fn call<'a, 'b>(
        &'b self,
        _: Arc<entry::ClientIdentifier>,
        uri: &'a entry::Uri,
        _: Bytes,
    ) -> Pin<Box<dyn Future<Output = BodyKind> + Send>>
    where
        'b: 'a,
    {
        let user_id = self.ids(uri).into_iter().next().unwrap_or_default();
        let store = self.store.clone();
        Box::pin(async move {
            match store.list(&user_id).await {
                Ok(records) if records.is_empty() => BodyKind::message(
                    StatusCode::NOT_FOUND,
                    "No scan history found for this user",
                ),
                Ok(records) => BodyKind::json_content(StatusCode::OK, &records)
                    .with_header("Cache-Control", "private, max-age=30"),
                Err(e) => e.into(),
            }
        })
    }
}
