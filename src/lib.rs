// SPDX-FileCopyrightText: 2025 Greenbone AG
//
// SPDX-License-Identifier: GPL-2.0-or-later WITH x11vnc-openssl-exception

pub mod config;
pub mod models;
pub mod orchestration;
pub mod server;
pub mod storage;
pub mod zap;
