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

/// Deletes a stored scan of a user.
///
/// The path is `/records/{userId}/{id}`; a record is only removed when it belongs to that user.
pub struct DeleteRecordsIdHandler {
    store: Arc<dyn RecordStore>,
}

impl From<Arc<dyn RecordStore>> for DeleteRecordsIdHandler {
    fn from(store: Arc<dyn RecordStore>) -> Self {
        Self { store }
    }
}

impl RequestHandler for DeleteRecordsIdHandler {
    auth_method_segments!(authenticated: true, Method::DELETE, "records", "*", "*");

    fn call<'a, 'b>(
        &'b self,
        _: Arc<entry::ClientIdentifier>,
        uri: &'a entry::Uri,
        _: Bytes,
    ) -> Pin<Box<dyn Future<Output = BodyKind> + Send>>
    where
        'b: 'a,
    {
        let mut ids = self.ids(uri).into_iter();
        let user_id = ids.next().unwrap_or_default();
        let id = ids.next().unwrap_or_default();
        let store = self.store.clone();
        Box::pin(async move {
            if uuid::Uuid::parse_str(&id).is_err() {
                return BodyKind::error(StatusCode::BAD_REQUEST, "Invalid scan ID format");
            }
            match store.remove(&user_id, &id).await {
                Ok(true) => BodyKind::message(StatusCode::OK, "Scan deleted successfully"),
                Ok(false) => {
                    BodyKind::error(StatusCode::NOT_FOUND, "Scan not found or unauthorized")
                }
                Err(e) => e.into(),
            }
        })
    }
}
