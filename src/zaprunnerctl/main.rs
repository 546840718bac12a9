// SPDX-FileCopyrightText: 2025 Greenbone AG
//
// SPDX-License-Identifier: GPL-2.0-or-later WITH x11vnc-openssl-exception

#![doc = include_str!("README.md")]

use std::{path::PathBuf, process};

use clap::Parser;
use zaprunner::{
    config::Config,
    orchestration::{Orchestrator, Settings, StopSignal},
    models::Target,
    zap::transport::Http,
};

type Result<T> = std::result::Result<T, Box<dyn std::error::Error + Send + Sync>>;

#[derive(clap::Args, Debug)]
struct ScanArgs {
    /// URL of the web application to scan
    url: String,
    /// Path to a toml config file
    #[arg(short, long)]
    config: Option<PathBuf>,
    /// Overrides the base address of the engine control API
    #[arg(long)]
    engine_url: Option<String>,
    /// Prints more details while running
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(clap::Parser)]
#[command(version, about = "Is a CLI tool around a ZAP compatible engine.")]
enum Args {
    /// Runs a scan to completion and prints the result
    Scan(ScanArgs),
}

fn set_logging(level: u8) {
    let lv = if level > 1 {
        tracing::Level::TRACE
    } else if level > 0 {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_max_level(lv)
        .init();
}

#[tokio::main]
async fn main() {
    let args = Args::parse();
    if let Err(e) = run(args).await {
        tracing::error!("{e}");
        process::exit(1);
    }
}

async fn run(args: Args) -> Result<()> {
    match args {
        Args::Scan(args) => scan(args).await,
    }
}

async fn scan(args: ScanArgs) -> Result<()> {
    set_logging(args.verbose);
    let mut config = Config::load_path(args.config.as_deref())?;
    if let Some(url) = args.engine_url {
        config.engine.base_url = url;
    }
    let transport = Http::new(
        config.engine.base_url.clone(),
        config.engine.api_key.clone(),
        config.engine.request_timeout,
    )?;
    let orchestrator = Orchestrator::new(transport, Settings::from(&config));
    let target = Target::try_from(args.url.as_str())?;

    let stop = StopSignal::default();
    let on_interrupt = stop.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("interrupted, stopping the scan");
            on_interrupt.stop();
        }
    });

    let result = orchestrator.run_with(&target, stop).await?;
    println!("{}", serde_json::to_string_pretty(&result)?);
    Ok(())
}
