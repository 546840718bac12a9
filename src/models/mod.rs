// SPDX-FileCopyrightText: 2025 Greenbone AG
//
// SPDX-License-Identifier: GPL-2.0-or-later WITH x11vnc-openssl-exception

//! Data types shared between the control client, the orchestration and the HTTP layer.

mod finding;
mod record;
mod result;
mod run;
mod scan;
mod target;

pub use finding::*;
pub use record::*;
pub use result::*;
pub use run::*;
pub use scan::*;
pub use target::*;
