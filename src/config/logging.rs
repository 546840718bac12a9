// SPDX-FileCopyrightText: 2025 Greenbone AG
//
// SPDX-License-Identifier: GPL-2.0-or-later WITH x11vnc-openssl-exception

use std::{collections::HashMap, str::FromStr};

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use tracing::{Level, level_filters::LevelFilter, metadata::ParseLevelError};
use tracing_subscriber::{EnvFilter, filter, layer::SubscriberExt, util::SubscriberInitExt};

/// Environment variable containing filter directives that replace the configured levels.
pub const LOG_ENV: &str = "ZAPRUNNER_LOG";

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct SerLevel(Level);

impl Default for SerLevel {
    fn default() -> Self {
        Self(Level::INFO)
    }
}

impl FromStr for SerLevel {
    type Err = ParseLevelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Level::from_str(s).map(SerLevel)
    }
}

impl From<Level> for SerLevel {
    fn from(level: Level) -> Self {
        SerLevel(level)
    }
}

impl From<SerLevel> for Level {
    fn from(ser_level: SerLevel) -> Self {
        ser_level.0
    }
}

impl Serialize for SerLevel {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(self.0.as_str())
    }
}

impl<'de> Deserialize<'de> for SerLevel {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Level::from_str(&s)
            .map(SerLevel)
            .map_err(serde::de::Error::custom)
    }
}

/// Log configuration.
///
/// `additional` sets the level per target, e.g. `zaprunner::zap = "debug"`.
#[derive(Default, Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct Logging {
    pub level: SerLevel,
    #[serde(skip_serializing_if = "HashMap::is_empty")]
    pub additional: HashMap<String, SerLevel>,
}

impl Logging {
    fn targets(&self) -> filter::Targets {
        self.additional.iter().fold(
            filter::Targets::new().with_default(Level::from(self.level)),
            |filter, (name, level)| filter.with_target(name, Level::from(*level)),
        )
    }

    /// Installs the global subscriber.
    ///
    /// When [LOG_ENV] is set its directives are used instead of the configured levels.
    pub fn init(&self) {
        let layer = tracing_subscriber::fmt::layer().with_writer(std::io::stderr);
        match std::env::var(LOG_ENV) {
            Ok(directives) if !directives.trim().is_empty() => {
                let filter = EnvFilter::builder()
                    .with_default_directive(LevelFilter::from_level(self.level.into()).into())
                    .parse_lossy(directives);
                tracing_subscriber::registry()
                    .with(layer)
                    .with(filter)
                    .init();
            }
            _ => {
                tracing_subscriber::registry()
                    .with(layer)
                    .with(self.targets())
                    .init();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_levels_per_target() {
        let logging: Logging = toml::from_str(
            r#"
            level = "warn"
            [additional]
            "zaprunner::zap" = "trace"
            "#,
        )
        .unwrap();
        assert_eq!(logging.level, SerLevel::from(Level::WARN));
        assert_eq!(
            logging.additional.get("zaprunner::zap"),
            Some(&SerLevel::from(Level::TRACE))
        );
        assert!(toml::from_str::<Logging>(r#"level = "loud""#).is_err());
    }
}
