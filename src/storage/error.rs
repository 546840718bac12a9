// SPDX-FileCopyrightText: 2025 Greenbone AG
//
// SPDX-License-Identifier: GPL-2.0-or-later WITH x11vnc-openssl-exception

use std::{io, sync::PoisonError};

use thiserror::Error;

#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum StorageError {
    /// The underlying medium failed, e.g. a disk could not be written.
    #[error("Unable to access records: {0}")]
    Io(String),
    /// A stored record cannot be read back.
    #[error("Corrupted record: {0}")]
    Serialization(String),
    /// A lock was poisoned by a panicking writer.
    #[error("Unexpected issue: {0}")]
    Dirty(String),
}

impl<S> From<PoisonError<S>> for StorageError {
    fn from(value: PoisonError<S>) -> Self {
        Self::Dirty(format!("{value:?}"))
    }
}

impl From<io::Error> for StorageError {
    fn from(value: io::Error) -> Self {
        Self::Io(format!("{:?}: {value}", value.kind()))
    }
}

impl From<serde_json::Error> for StorageError {
    fn from(value: serde_json::Error) -> Self {
        Self::Serialization(value.to_string())
    }
}
