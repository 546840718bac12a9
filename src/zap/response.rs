// SPDX-FileCopyrightText: 2025 Greenbone AG
//
// SPDX-License-Identifier: GPL-2.0-or-later WITH x11vnc-openssl-exception

//! Payloads returned by the control API.

use serde::{
    Deserialize, Deserializer,
    de::{self, Visitor},
};

use crate::models::{Finding, PhaseStatus};

/// Response of a start operation.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct StartResponse {
    #[serde(alias = "scanId", deserialize_with = "string_or_number")]
    pub scan: String,
}

/// Response of a status operation.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct StatusResponse {
    pub status: PhaseStatus,
}

/// Response of the alert listing.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AlertsResponse {
    pub alerts: Vec<Finding>,
}

/// Response of an action without a result value, e.g. stop.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ActionResponse {
    #[serde(rename = "Result", default)]
    pub result: String,
}

struct StringOrNumber;

impl Visitor<'_> for StringOrNumber {
    type Value = String;

    fn expecting(&self, formatter: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(formatter, "an identifier as String or number")
    }

    fn visit_str<E>(self, v: &str) -> Result<Self::Value, E>
    where
        E: de::Error,
    {
        Ok(v.to_owned())
    }

    fn visit_u64<E>(self, v: u64) -> Result<Self::Value, E>
    where
        E: de::Error,
    {
        Ok(v.to_string())
    }

    fn visit_i64<E>(self, v: i64) -> Result<Self::Value, E>
    where
        E: de::Error,
    {
        Ok(v.to_string())
    }
}

fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    deserializer.deserialize_any(StringOrNumber)
}
