// SPDX-FileCopyrightText: 2025 Greenbone AG
//
// SPDX-License-Identifier: GPL-2.0-or-later WITH x11vnc-openssl-exception

use std::fmt::Display;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("URL is required")]
pub struct EmptyTarget;

/// URL of the system under test.
///
/// Only emptiness is verified; whether the URL is usable is decided by the engine.
#[derive(Debug, Clone, PartialEq, Eq, Hash, serde::Serialize)]
#[serde(transparent)]
pub struct Target(String);

impl Target {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<&str> for Target {
    type Error = EmptyTarget;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let value = value.trim();
        if value.is_empty() {
            return Err(EmptyTarget);
        }
        Ok(Self(value.to_owned()))
    }
}

impl TryFrom<Option<&str>> for Target {
    type Error = EmptyTarget;

    fn try_from(value: Option<&str>) -> Result<Self, Self::Error> {
        value.ok_or(EmptyTarget).and_then(Target::try_from)
    }
}

impl AsRef<str> for Target {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Display for Target {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_empty() {
        assert_eq!(Target::try_from(""), Err(EmptyTarget));
        assert_eq!(Target::try_from("  \t"), Err(EmptyTarget));
        assert_eq!(Target::try_from(None), Err(EmptyTarget));
        assert_eq!(
            Target::try_from(" http://example.test ").unwrap().as_str(),
            "http://example.test"
        );
    }
}
