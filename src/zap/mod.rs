// SPDX-FileCopyrightText: 2025 Greenbone AG
//
// SPDX-License-Identifier: GPL-2.0-or-later WITH x11vnc-openssl-exception

//! Client for the JSON control API of a ZAP compatible scanning engine.
//!
//! The engine is only reachable through a polling protocol: phases are started, their status
//! is requested until it reports completion and the alerts are fetched afterwards. Each single
//! control call is retried with a fixed delay by [Client].
mod client;
mod error;
mod operation;
mod response;
pub mod transport;

pub use client::{Client, RetryPolicy};
pub use error::Error;
pub use operation::{ControlRequest, Operation};
pub use response::{ActionResponse, AlertsResponse, StartResponse, StatusResponse};
pub use transport::{RawResponse, Transport, TransportError};
