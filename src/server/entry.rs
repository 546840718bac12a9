// SPDX-FileCopyrightText: 2025 Greenbone AG
//
// SPDX-License-Identifier: GPL-2.0-or-later WITH x11vnc-openssl-exception

//! Entry contains every module struct which is considered and entry point
//!
//! An entry point handles each incoming request, it checks if an endpoint
//! requires an api-key and adds all required header information for each
//! response.

use std::{convert::Infallible, fmt::Display, pin::Pin, sync::Arc};

use http_body_util::BodyExt;
use hyper::{StatusCode, header::HeaderValue};

use super::{
    Authentication, Server,
    response::{BodyKind, BodyKindContent},
};
use crate::internal_server_error;

#[derive(Clone, Default, Debug, PartialEq, Eq)]
pub struct ClientHash([u8; 32]);

impl<T> From<T> for ClientHash
where
    T: AsRef<[u8]>,
{
    fn from(value: T) -> Self {
        use sha2::{Digest, Sha256};
        let mut hasher = Sha256::new();
        hasher.update(value);
        let hash = hasher.finalize();
        Self(hash.into())
    }
}

impl Display for ClientHash {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", hex::encode(self.0))
    }
}

/// Contains information about the caller of a request
#[derive(Default, Debug, Clone)]
pub enum ClientIdentifier {
    /// When there in no information available
    #[default]
    Unknown,
    /// Contains the sha256 sum of the used API key
    Known(ClientHash),
}

impl Display for ClientIdentifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ClientIdentifier::Unknown => write!(f, "unknown"),
            ClientIdentifier::Known(hash) => write!(f, "{hash}"),
        }
    }
}

pub type Uri = hyper::Uri;
pub type Bytes = hyper::body::Bytes;
pub type Method = hyper::Method;

#[macro_export]
macro_rules! auth_method_segments {
    (authenticated: $authn:expr, $method:expr, $($path:literal),*) => {
        fn needs_authentication(&self) -> bool {
            $authn
        }

        fn path_segments(&self) -> &'static [&'static str] {
            &[ $( $path, )* ]
        }

        fn http_method(&self) -> &'static $crate::server::entry::Method {
            &$method
        }
    };
}

pub trait RequestHandler {
    fn needs_authentication(&self) -> bool;
    fn path_segments(&self) -> &'static [&'static str];
    fn http_method(&self) -> &'static Method;
    fn ids(&self, uri: &Uri) -> Vec<String> {
        uri.path()
            .split('/')
            .filter(|x| !x.is_empty())
            .zip(self.path_segments().iter())
            .filter(|(_, x)| x == &&"*")
            .map(move |(x, _)| x.to_owned())
            .collect()
    }

    fn call<'a, 'b>(
        &'b self,
        client_id: Arc<ClientIdentifier>,
        uri: &'a Uri,
        body: Bytes,
    ) -> Pin<Box<dyn Future<Output = BodyKind> + Send>>
    where
        'b: 'a;
}

/// Will be called after the authorization checks are done.
///
/// It contains all the RequestHandler implementations and iterates through them.
/// When the path, method and autorization matches the requirements of a handler
/// the call method on that will be called.
///
/// If the method is HEAD then the requirements but the Method will be checked
/// an on match it will return empty body with the status code and all header
/// information available.
#[derive(Default, Clone)]
pub struct RequestHandlers {
    pub handlers: Vec<Arc<Box<dyn RequestHandler + Send + Sync>>>,
}

#[macro_export]
macro_rules! request_handlers {
    ($($handler:expr),*) => {{
        let mut rh = $crate::server::entry::RequestHandlers::default();
        $(
            rh.push($handler);
        )*
        rh
    }};
}

fn parts_match(handler_parts: &[&str], request_parts: &[&str]) -> bool {
    handler_parts.len() == request_parts.len()
        && handler_parts
            .iter()
            .zip(request_parts)
            .all(|(h, r)| h == &"*" || h == r)
}

type BodyKindFuture = Pin<Box<dyn Future<Output = BodyKind> + Send>>;

impl RequestHandlers {
    pub fn push<T>(&mut self, request_handler: T)
    where
        T: RequestHandler + Send + Sync + 'static,
    {
        self.handlers.push(Arc::new(
            Box::new(request_handler) as Box<dyn RequestHandler + Send + Sync + 'static>
        ));
    }

    fn call<R>(&self, client_identifier: Arc<ClientIdentifier>, req: hyper::Request<R>) -> BodyKindFuture
    where
        R: hyper::body::Body + Send + 'static,
        <R as hyper::body::Body>::Error: std::error::Error,
        <R as hyper::body::Body>::Data: Send,
    {
        let callbacks = self.handlers.clone();

        Box::pin(async move {
            let parts = req
                .uri()
                .path()
                .split('/')
                // handles double slashes e.g. /scans/ or /records//id
                .filter(|x| !x.is_empty())
                .collect::<Vec<_>>();
            let mut path_known = false;
            for rh in callbacks {
                if !parts_match(rh.path_segments(), &parts) {
                    continue;
                }
                path_known = true;
                let is_authenticated = matches!(&*client_identifier, &ClientIdentifier::Known(_));
                if rh.needs_authentication() && !is_authenticated {
                    return BodyKind::no_content(StatusCode::UNAUTHORIZED);
                }
                if req.method() == Method::HEAD {
                    return BodyKind::no_content(StatusCode::OK);
                }
                if req.method() == rh.http_method() {
                    let uri = req.uri().clone();
                    let bytes = match req.into_body().collect().await {
                        Ok(x) => x.to_bytes(),
                        Err(e) => {
                            return internal_server_error!(e);
                        }
                    };
                    return rh.call(client_identifier, &uri, bytes).await;
                }
            }
            if path_known {
                BodyKind::no_content(StatusCode::METHOD_NOT_ALLOWED)
            } else {
                BodyKind::no_content(StatusCode::NOT_FOUND)
            }
        })
    }
}

pub struct EntryPoint {
    configuration: Arc<Server>,
    handlers: Arc<RequestHandlers>,
}

impl EntryPoint {
    pub fn new(configuration: Arc<Server>, handlers: Arc<RequestHandlers>) -> EntryPoint {
        EntryPoint {
            configuration,
            handlers,
        }
    }
}

fn api_key_to_client_identifier(
    api_keys: &[String],
    header: Option<&HeaderValue>,
) -> ClientIdentifier {
    let used_key = match header.map(|x| x.to_str()) {
        Some(Ok(y)) => y,
        Some(Err(e)) => {
            tracing::debug!(error=%e, "header contains invalid ascii symbol");
            ""
        }
        None => "",
    };
    // we iterate through each time so that the time on success and failure is relatively equal
    let mut result = ClientIdentifier::Unknown;
    for x in api_keys {
        if x == used_key {
            result = ClientIdentifier::Known(x.into());
        }
    }
    tracing::debug!(
        known_api_key = matches!(result, ClientIdentifier::Known(_)),
        "has used known api key"
    );
    result
}

impl<R> hyper::service::Service<hyper::Request<R>> for EntryPoint
where
    R: hyper::body::Body + Send + 'static,
    <R as hyper::body::Body>::Error: std::error::Error,
    <R as hyper::body::Body>::Data: Send,
{
    type Response = hyper::Response<BodyKindContent>;

    type Error = Infallible;

    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn call(&self, req: hyper::Request<R>) -> Self::Future {
        let cid = match &self.configuration.authentication {
            Authentication::Disabled => Arc::new(ClientIdentifier::Known(Default::default())),
            Authentication::ApiKey(keys) => Arc::new(api_key_to_client_identifier(
                keys,
                req.headers().get("x-api-key"),
            )),
        };
        let rb = hyper::Response::builder()
            .header(
                "authentication",
                self.configuration.authentication.static_str(),
            )
            .header("api-version", &self.configuration.api_version);
        let handlers = self.handlers.clone();

        Box::pin(async move {
            let resp = handlers.call(cid, req).await;
            let mut rb = match &resp.content {
                BodyKindContent::Empty => rb,
                BodyKindContent::Binary(x) => rb
                    .header("Content-Type", "application/json")
                    .header("Content-Length", x.len()),
            };
            for (name, value) in resp.headers {
                rb = rb.header(name, value);
            }
            Ok(rb
                .status(resp.status_code)
                .body(resp.content)
                .unwrap_or_else(|e| {
                    tracing::warn!(error = %e, "unable to build response");
                    let mut response = hyper::Response::new(BodyKindContent::Empty);
                    *response.status_mut() = StatusCode::INTERNAL_SERVER_ERROR;
                    response
                }))
        })
    }
}
