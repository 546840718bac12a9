// SPDX-FileCopyrightText: 2025 Greenbone AG
//
// SPDX-License-Identifier: GPL-2.0-or-later WITH x11vnc-openssl-exception

use super::Operation;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    /// A control call failed on every attempt of its retry budget.
    ///
    /// Contains the detail of the last failed attempt.
    #[error("{operation} failed after {attempts} attempts: {detail}")]
    ControlChannel {
        operation: Operation,
        attempts: usize,
        detail: String,
    },
    #[error("Unable to create the control client: {0}")]
    Setup(String),
}
