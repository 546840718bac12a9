// SPDX-FileCopyrightText: 2025 Greenbone AG
//
// SPDX-License-Identifier: GPL-2.0-or-later WITH x11vnc-openssl-exception

//! Configuration of the daemon and the command line client.
//!
//! The configuration is read from the first toml file found of:
//! - the path given via `--config` or `ZAPRUNNER_CONFIG`
//! - `$HOME/.config/zaprunner/zaprunner.toml`
//! - `/etc/zaprunner/zaprunner.toml`
//!
//! When none exists the defaults are used. Single values can be overridden by command line
//! arguments or their environment variables.
pub mod duration;
pub mod logging;

use std::{
    ffi::OsString,
    net::SocketAddr,
    path::{Path, PathBuf},
    time::Duration,
};

use clap::ArgAction;
use serde::{Deserialize, Serialize};

pub use logging::Logging;

use crate::orchestration::{ConcurrentRuns, Deduplication};

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Unable to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Unable to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct Engine {
    pub base_url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    #[serde(with = "duration")]
    pub request_timeout: Duration,
}

impl Default for Engine {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8080/".to_owned(),
            api_key: None,
            request_timeout: Duration::from_secs(30),
        }
    }
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct Retry {
    pub attempts: usize,
    #[serde(with = "duration")]
    pub delay: Duration,
}

impl Default for Retry {
    fn default() -> Self {
        Self {
            attempts: 3,
            delay: Duration::from_secs(1),
        }
    }
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct Polling {
    #[serde(with = "duration")]
    pub interval: Duration,
    /// `0s` disables the deadline.
    #[serde(with = "duration")]
    pub phase_timeout: Duration,
    pub stop_abandoned: bool,
}

impl Default for Polling {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(1),
            phase_timeout: Duration::from_secs(60 * 60),
            stop_abandoned: true,
        }
    }
}

#[derive(Deserialize, Serialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(default)]
pub struct Results {
    pub deduplication: Deduplication,
}

#[derive(Deserialize, Serialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(default)]
pub struct Runs {
    pub concurrent: ConcurrentRuns,
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct Listener {
    pub address: SocketAddr,
}

impl Default for Listener {
    fn default() -> Self {
        Self {
            address: ([127, 0, 0, 1], 3000).into(),
        }
    }
}

#[derive(Deserialize, Serialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(default)]
pub struct Endpoints {
    /// Keys accepted in the `x-api-key` header. Authentication is disabled when empty.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub api_keys: Vec<String>,
}

#[derive(Deserialize, Serialize, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum StorageType {
    #[default]
    #[serde(rename = "inmemory")]
    InMemory,
    #[serde(rename = "fs")]
    FileSystem,
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct Storage {
    #[serde(rename = "type")]
    pub storage_type: StorageType,
    pub path: PathBuf,
}

impl Default for Storage {
    fn default() -> Self {
        Self {
            storage_type: StorageType::InMemory,
            path: PathBuf::from("/var/lib/zaprunner/records"),
        }
    }
}

#[derive(Deserialize, Serialize, Debug, Clone, Default, PartialEq)]
#[serde(default)]
pub struct Config {
    pub engine: Engine,
    pub retry: Retry,
    pub polling: Polling,
    pub results: Results,
    pub runs: Runs,
    pub listener: Listener,
    pub endpoints: Endpoints,
    pub storage: Storage,
    pub log: Logging,
}

impl Config {
    fn load_etc() -> Option<Self> {
        Self::from_file("/etc/zaprunner/zaprunner.toml").ok()
    }

    fn load_user() -> Option<Self> {
        let home = std::env::var("HOME").ok()?;
        Self::from_file(format!("{home}/.config/zaprunner/zaprunner.toml")).ok()
    }

    pub fn from_file<P>(path: P) -> Result<Self, Error>
    where
        P: AsRef<Path>,
    {
        let path = path.as_ref();
        let config = std::fs::read_to_string(path).map_err(|source| Error::Read {
            path: path.to_owned(),
            source,
        })?;
        toml::from_str(&config).map_err(|source| Error::Parse {
            path: path.to_owned(),
            source,
        })
    }

    /// Loads the given file or, when none is given, the first found default location.
    pub fn load_path(path: Option<&Path>) -> Result<Self, Error> {
        match path {
            Some(path) => Self::from_file(path),
            None => Ok(Self::load_user()
                .or_else(Self::load_etc)
                .unwrap_or_default()),
        }
    }

    fn command() -> clap::Command {
        clap::Command::new("zaprunnerd")
            .about("Runs web vulnerability scans through a ZAP compatible engine")
            .arg(
                clap::Arg::new("config")
                    .short('c')
                    .env("ZAPRUNNER_CONFIG")
                    .long("config")
                    .value_parser(clap::builder::PathBufValueParser::new())
                    .action(ArgAction::Set)
                    .help("path to toml config file"),
            )
            .arg(
                clap::Arg::new("engine-url")
                    .env("ENGINE_URL")
                    .long("engine-url")
                    .action(ArgAction::Set)
                    .help("base address of the engine control API (e.g. http://localhost:8080/)"),
            )
            .arg(
                clap::Arg::new("engine-api-key")
                    .env("ZAP_API_KEY")
                    .long("engine-api-key")
                    .hide_env_values(true)
                    .action(ArgAction::Set)
                    .help("API key of the engine"),
            )
            .arg(
                clap::Arg::new("api-key")
                    .env("API_KEY")
                    .long("api-key")
                    .hide_env_values(true)
                    .action(ArgAction::Append)
                    .help("API key that must be set as X-API-KEY header to gain access"),
            )
            .arg(
                clap::Arg::new("phase-timeout")
                    .env("PHASE_TIMEOUT")
                    .long("phase-timeout")
                    .value_parser(duration::parse)
                    .value_name("DURATION")
                    .help("maximum duration of a single phase (e.g. 30m), 0s disables it"),
            )
            .arg(
                clap::Arg::new("deduplication")
                    .env("DEDUPLICATION")
                    .long("deduplication")
                    .value_parser(["strict", "description"])
                    .help("how findings are deduplicated"),
            )
            .arg(
                clap::Arg::new("concurrent-runs")
                    .env("CONCURRENT_RUNS")
                    .long("concurrent-runs")
                    .value_parser(["allow", "reject"])
                    .help("whether a target may be scanned by multiple runs at once"),
            )
            .arg(
                clap::Arg::new("storage-path")
                    .env("STORAGE_PATH")
                    .long("storage-path")
                    .value_parser(clap::builder::PathBufValueParser::new())
                    .action(ArgAction::Set)
                    .help("stores scan records in the given directory instead of memory"),
            )
            .arg(
                clap::Arg::new("listening")
                    .env("LISTENING")
                    .long("listening")
                    .short('l')
                    .value_name("IP:PORT")
                    .value_parser(clap::value_parser!(SocketAddr))
                    .help("the address to listen to (e.g. 127.0.0.1:3000 or 0.0.0.0:3000)."),
            )
            .arg(
                clap::Arg::new("log-level")
                    .env("LOG_LEVEL")
                    .long("log-level")
                    .value_parser(["trace", "debug", "info", "warn", "error"])
                    .help("default log level"),
            )
    }

    /// Loads the configuration of the daemon from the process arguments.
    pub fn load() -> Result<Self, Error> {
        Self::load_from(std::env::args_os())
    }

    pub fn load_from<I, T>(args: I) -> Result<Self, Error>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        let cmds = Self::command().get_matches_from(args);
        let mut config = Self::load_path(cmds.get_one::<PathBuf>("config").map(|x| x.as_path()))?;
        if let Some(url) = cmds.get_one::<String>("engine-url") {
            config.engine.base_url = url.clone();
        }
        if let Some(key) = cmds.get_one::<String>("engine-api-key") {
            config.engine.api_key = Some(key.clone());
        }
        if let Some(keys) = cmds.get_many::<String>("api-key") {
            config.endpoints.api_keys = keys.cloned().collect();
        }
        if let Some(timeout) = cmds.get_one::<Duration>("phase-timeout") {
            config.polling.phase_timeout = *timeout;
        }
        if let Some(dedup) = cmds.get_one::<String>("deduplication") {
            if let Ok(dedup) = dedup.parse() {
                config.results.deduplication = dedup;
            }
        }
        if let Some(policy) = cmds.get_one::<String>("concurrent-runs") {
            if let Ok(policy) = policy.parse() {
                config.runs.concurrent = policy;
            }
        }
        if let Some(path) = cmds.get_one::<PathBuf>("storage-path") {
            config.storage.storage_type = StorageType::FileSystem;
            config.storage.path = path.clone();
        }
        if let Some(ip) = cmds.get_one::<SocketAddr>("listening") {
            config.listener.address = *ip;
        }
        if let Some(level) = cmds.get_one::<String>("log-level") {
            if let Ok(level) = level.parse() {
                config.log.level = level;
            }
        }
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[test]
    fn defaults() {
        let config = Config::default();
        assert_eq!(config.engine.base_url, "http://localhost:8080/");
        assert_eq!(config.engine.api_key, None);
        assert_eq!(config.engine.request_timeout, Duration::from_secs(30));
        assert_eq!(config.retry.attempts, 3);
        assert_eq!(config.retry.delay, Duration::from_secs(1));
        assert_eq!(config.polling.interval, Duration::from_secs(1));
        assert_eq!(config.polling.phase_timeout, Duration::from_secs(3600));
        assert!(config.polling.stop_abandoned);
        assert_eq!(config.results.deduplication, Deduplication::Strict);
        assert_eq!(config.runs.concurrent, ConcurrentRuns::Allow);
        assert!(config.endpoints.api_keys.is_empty());
        assert_eq!(config.storage.storage_type, StorageType::InMemory);
    }

    #[test]
    fn partial_file() {
        let config: Config = toml::from_str(
            r#"
            [engine]
            base_url = "http://zap:8081/"
            api_key = "changeme"

            [polling]
            interval = "500ms"
            phase_timeout = "0s"

            [results]
            deduplication = "description"

            [runs]
            concurrent = "reject"

            [storage]
            type = "fs"
            path = "/tmp/records"
            "#,
        )
        .unwrap();
        assert_eq!(config.engine.base_url, "http://zap:8081/");
        assert_eq!(config.engine.api_key.as_deref(), Some("changeme"));
        assert_eq!(config.engine.request_timeout, Duration::from_secs(30));
        assert_eq!(config.polling.interval, Duration::from_millis(500));
        assert_eq!(config.polling.phase_timeout, Duration::ZERO);
        assert_eq!(config.results.deduplication, Deduplication::Description);
        assert_eq!(config.runs.concurrent, ConcurrentRuns::Reject);
        assert_eq!(config.storage.storage_type, StorageType::FileSystem);
        assert_eq!(config.retry, Retry::default());
    }

    #[test]
    fn arguments_override_file() {
        let config = Config::load_from([
            "zaprunnerd",
            "--config",
            "/nonexistent/zaprunner.toml",
        ]);
        assert!(matches!(config, Err(Error::Read { .. })));

        let path = std::env::temp_dir().join(format!("zaprunner-{}.toml", uuid::Uuid::new_v4()));
        std::fs::write(
            &path,
            r#"
            [engine]
            base_url = "http://file:8080/"

            [runs]
            concurrent = "allow"
            "#,
        )
        .unwrap();
        let file = path.to_string_lossy().into_owned();
        let config = Config::load_from([
            "zaprunnerd",
            "--config",
            file.as_str(),
            "--engine-url",
            "http://engine:9090",
            "--api-key",
            "a",
            "--api-key",
            "b",
            "--phase-timeout",
            "30m",
            "--concurrent-runs",
            "reject",
            "--listening",
            "0.0.0.0:4000",
        ]);
        std::fs::remove_file(&path).unwrap();
        let config = config.unwrap();
        assert_eq!(config.engine.base_url, "http://engine:9090");
        assert_eq!(config.endpoints.api_keys, vec!["a", "b"]);
        assert_eq!(config.polling.phase_timeout, Duration::from_secs(1800));
        assert_eq!(config.runs.concurrent, ConcurrentRuns::Reject);
        assert_eq!(config.listener.address, ([0, 0, 0, 0], 4000).into());
    }
}
