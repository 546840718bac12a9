// SPDX-FileCopyrightText: 2025 Greenbone AG
//
// SPDX-License-Identifier: GPL-2.0-or-later WITH x11vnc-openssl-exception

use std::{collections::HashSet, fmt::Display, str::FromStr};

use super::Error;
use crate::{
    models::{Finding, Target},
    zap::{Client, Transport},
};

/// Defines when two findings are considered the same.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Deduplication {
    /// Same plugin, method and description
    #[default]
    Strict,
    /// Same description
    Description,
}

/// Identity of a finding under a [Deduplication] policy.
#[derive(Debug, PartialEq, Eq, Hash)]
enum Key<'a> {
    Strict {
        plugin_id: &'a str,
        method: &'a str,
        description: &'a str,
    },
    Description(&'a str),
}

impl Deduplication {
    fn key<'a>(&self, finding: &'a Finding) -> Key<'a> {
        match self {
            Deduplication::Strict => Key::Strict {
                plugin_id: &finding.plugin_id,
                method: &finding.method,
                description: &finding.description,
            },
            Deduplication::Description => Key::Description(&finding.description),
        }
    }
}

impl Display for Deduplication {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Deduplication::Strict => write!(f, "strict"),
            Deduplication::Description => write!(f, "description"),
        }
    }
}

impl FromStr for Deduplication {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "strict" => Ok(Deduplication::Strict),
            "description" => Ok(Deduplication::Description),
            _ => Err(format!("unknown deduplication '{s}', use strict or description")),
        }
    }
}

/// Turns the raw engine alerts into the result shown to a caller.
#[derive(Debug, Clone, Copy, Default)]
pub struct Normalizer {
    deduplication: Deduplication,
}

impl Normalizer {
    pub fn new(deduplication: Deduplication) -> Self {
        Self { deduplication }
    }

    pub async fn fetch<T>(&self, client: &Client<T>, target: &Target) -> Result<Vec<Finding>, Error>
    where
        T: Transport,
    {
        client.alerts(target).await.map_err(Error::ResultFetch)
    }

    /// Filters, deduplicates and ranks the findings.
    pub fn normalize(&self, findings: Vec<Finding>) -> Vec<Finding> {
        let findings = filter(findings);
        let findings = self.deduplicate(findings);
        rank(findings)
    }

    /// Keeps the first occurrence of each finding.
    pub fn deduplicate(&self, findings: Vec<Finding>) -> Vec<Finding> {
        let first_seen: Vec<bool> = {
            let mut seen = HashSet::with_capacity(findings.len());
            findings
                .iter()
                .map(|x| seen.insert(self.deduplication.key(x)))
                .collect()
        };
        findings
            .into_iter()
            .zip(first_seen)
            .filter_map(|(finding, first)| first.then_some(finding))
            .collect()
    }
}

/// Removes informational findings.
pub fn filter(findings: Vec<Finding>) -> Vec<Finding> {
    findings
        .into_iter()
        .filter(|x| !x.risk.is_informational())
        .collect()
}

/// Sorts by risk, highest first, keeping the order of findings with the same risk.
pub fn rank(mut findings: Vec<Finding>) -> Vec<Finding> {
    findings.sort_by(|a, b| b.risk.rank().cmp(&a.risk.rank()));
    findings
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::RiskLevel;

    fn finding(plugin_id: &str, risk: &str, description: &str) -> Finding {
        Finding {
            plugin_id: plugin_id.to_owned(),
            name: format!("{plugin_id} finding"),
            risk: risk.into(),
            description: description.to_owned(),
            method: "GET".to_owned(),
            ..Default::default()
        }
    }

    #[test]
    fn drops_informational() {
        let findings = vec![
            finding("1", "Informational", "a"),
            finding("2", "Low", "b"),
        ];
        let result = Normalizer::default().normalize(findings);
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].plugin_id, "2");
    }

    #[test]
    fn ranking_is_stable() {
        let findings = vec![
            finding("1", "Low", "first"),
            finding("2", "High", "second"),
            finding("3", "Low", "third"),
        ];
        let ids: Vec<_> = rank(findings).into_iter().map(|x| x.plugin_id).collect();
        assert_eq!(ids, vec!["2", "1", "3"]);
    }

    #[test]
    fn unrecognized_risk_is_ranked_last() {
        let findings = vec![
            finding("1", "Unknown", "a"),
            finding("2", "Critical", "b"),
            finding("3", "Medium", "c"),
        ];
        let risks: Vec<_> = rank(findings).into_iter().map(|x| x.risk).collect();
        assert_eq!(
            risks,
            vec![
                RiskLevel::Critical,
                RiskLevel::Medium,
                RiskLevel::Unrecognized("Unknown".to_owned())
            ]
        );
    }

    #[test]
    fn keys_borrow_only_the_compared_fields() {
        let mut post = finding("2", "Low", "same");
        post.method = "POST".to_owned();
        let get = finding("1", "High", "same");
        assert_eq!(
            Deduplication::Description.key(&get),
            Deduplication::Description.key(&post)
        );
        assert_eq!(Deduplication::Description.key(&get), Key::Description("same"));
        assert_ne!(Deduplication::Strict.key(&get), Deduplication::Strict.key(&post));
        assert_eq!(
            Deduplication::Strict.key(&get),
            Key::Strict {
                plugin_id: "1",
                method: "GET",
                description: "same"
            }
        );
    }

    #[test]
    fn strict_keeps_different_plugins_with_same_description() {
        let findings = vec![
            finding("1", "High", "same"),
            finding("2", "High", "same"),
            finding("1", "Medium", "same"),
        ];
        let strict = Normalizer::new(Deduplication::Strict).deduplicate(findings.clone());
        assert_eq!(strict.len(), 2);
        assert_eq!(strict[0].risk, RiskLevel::High);
        let description = Normalizer::new(Deduplication::Description).deduplicate(findings);
        assert_eq!(description.len(), 1);
        assert_eq!(description[0].plugin_id, "1");
    }

    #[test]
    fn normalization_is_idempotent() {
        let findings = vec![
            finding("4", "Low", "d"),
            finding("1", "Medium", "a"),
            finding("1", "Medium", "a"),
            finding("9", "Informational", "i"),
            finding("2", "High", "b"),
        ];
        for dedup in [Deduplication::Strict, Deduplication::Description] {
            let normalizer = Normalizer::new(dedup);
            let once = normalizer.normalize(findings.clone());
            let twice = normalizer.normalize(once.clone());
            assert_eq!(once, twice);
            assert_eq!(once.len(), 3);
        }
    }

    #[test]
    fn parses_deduplication() {
        assert_eq!("strict".parse(), Ok(Deduplication::Strict));
        assert_eq!("description".parse(), Ok(Deduplication::Description));
        assert!("loose".parse::<Deduplication>().is_err());
    }
}
