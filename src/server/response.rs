// SPDX-FileCopyrightText: 2025 Greenbone AG
//
// SPDX-License-Identifier: GPL-2.0-or-later WITH x11vnc-openssl-exception

use std::{
    convert::Infallible,
    pin::Pin,
    task::{Context, Poll},
};

use http_body::{Body, Frame, SizeHint};
use hyper::{StatusCode, body::Bytes};

pub struct BodyKind {
    pub status_code: StatusCode,
    pub content: BodyKindContent,
    /// Additional response headers
    pub headers: Vec<(&'static str, &'static str)>,
}

/// Implements the hyper http body types
pub enum BodyKindContent {
    /// Empty body
    Empty,
    /// Static binary buffer
    Binary(Bytes),
}

#[derive(serde::Serialize, Debug)]
pub struct BadRequest {
    pub line: usize,
    pub column: usize,
    pub message: String,
}

/// Body of a failed request.
#[derive(serde::Serialize, serde::Deserialize, Debug, PartialEq, Eq)]
pub struct ErrorMessage {
    pub error: String,
}

/// Body of a request that does not return data.
#[derive(serde::Serialize, serde::Deserialize, Debug, PartialEq, Eq)]
pub struct Message {
    pub message: String,
}

#[macro_export]
macro_rules! internal_server_error {
    ($e:expr) => {{
        tracing::warn!(error = %$e, "Unexpected error occurred");
        $crate::server::response::BodyKind::error(
            hyper::StatusCode::INTERNAL_SERVER_ERROR,
            "Internal server error",
        )
    }};
    () => {{
        $crate::server::response::BodyKind::error(
            hyper::StatusCode::INTERNAL_SERVER_ERROR,
            "Internal server error",
        )
    }};
}

impl BodyKind {
    pub fn no_content(status_code: StatusCode) -> Self {
        Self {
            status_code,
            content: BodyKindContent::Empty,
            headers: vec![],
        }
    }

    pub fn json_content<T>(status_code: StatusCode, v: &T) -> Self
    where
        T: serde::Serialize,
    {
        match serde_json::to_vec(v) {
            Ok(v) => BodyKind {
                status_code,
                content: BodyKindContent::Binary(v.into()),
                headers: vec![],
            },
            Err(e) => internal_server_error!(e),
        }
    }

    /// Returns `{"error": message}`.
    pub fn error(status_code: StatusCode, message: &str) -> Self {
        Self::json_content(
            status_code,
            &ErrorMessage {
                error: message.to_owned(),
            },
        )
    }

    /// Returns `{"message": message}`.
    pub fn message(status_code: StatusCode, message: &str) -> Self {
        Self::json_content(
            status_code,
            &Message {
                message: message.to_owned(),
            },
        )
    }

    pub fn with_header(mut self, name: &'static str, value: &'static str) -> Self {
        self.headers.push((name, value));
        self
    }
}

impl From<serde_json::Error> for BodyKind {
    fn from(value: serde_json::Error) -> Self {
        let br = BadRequest {
            line: value.line(),
            column: value.column(),
            message: value.to_string(),
        };
        BodyKind::json_content(StatusCode::BAD_REQUEST, &br)
    }
}

impl Body for BodyKindContent {
    type Data = Bytes;
    type Error = Infallible;

    fn is_end_stream(&self) -> bool {
        matches!(self, BodyKindContent::Empty)
    }

    fn size_hint(&self) -> SizeHint {
        match self {
            BodyKindContent::Empty => SizeHint::with_exact(0),
            BodyKindContent::Binary(b) => SizeHint::with_exact(b.len() as u64),
        }
    }

    fn poll_frame(
        self: Pin<&mut Self>,
        _: &mut Context<'_>,
    ) -> Poll<Option<Result<Frame<Self::Data>, Self::Error>>> {
        let this = self.get_mut();
        match this {
            BodyKindContent::Empty => Poll::Ready(None),
            BodyKindContent::Binary(b) => {
                let data = b.clone();
                *this = BodyKindContent::Empty;
                Poll::Ready(Some(Ok(Frame::data(data))))
            }
        }
    }
}
