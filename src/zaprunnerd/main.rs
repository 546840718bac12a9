// SPDX-FileCopyrightText: 2025 Greenbone AG
//
// SPDX-License-Identifier: GPL-2.0-or-later WITH x11vnc-openssl-exception

#![doc = include_str!("README.md")]

use std::sync::Arc;

use zaprunner::{
    config::Config,
    orchestration::{Orchestrator, Settings},
    server::RuntimeBuilder,
    storage,
    zap::transport::Http,
};

type Result<T> = std::result::Result<T, Box<dyn std::error::Error + Send + Sync>>;

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::load()?;
    config.log.init();
    tracing::info!(engine = config.engine.base_url, "starting zaprunnerd");

    let transport = Http::new(
        config.engine.base_url.clone(),
        config.engine.api_key.clone(),
        config.engine.request_timeout,
    )?;
    let orchestrator = Arc::new(Orchestrator::new(transport, Settings::from(&config)));
    let records = storage::from_config(&config);

    RuntimeBuilder::new(config.listener.address)
        .api_keys(config.endpoints.api_keys.clone())
        .insert_scans(orchestrator, records.clone())
        .insert_records(records)
        .run_blocking()
        .await
}
