// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Equality-based label selectors

use std::collections::BTreeMap;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SelectorError {
    #[error("selector term {0:?} is not of the form key=value")]
    MalformedTerm(String),
    #[error("selector term {0:?} has an empty key")]
    EmptyKey(String),
}

/// Selects builds whose labels contain every required pair
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selector {
    required: BTreeMap<String, String>,
}

impl Selector {
    /// Matches every set of labels
    pub fn everything() -> Self {
        Self::default()
    }

    pub fn from_pairs<K, V>(pairs: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            required: pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    pub fn is_everything(&self) -> bool {
        self.required.is_empty()
    }

    pub fn matches(&self, labels: &BTreeMap<String, String>) -> bool {
        self.required
            .iter()
            .all(|(key, value)| labels.get(key) == Some(value))
    }
}

impl FromStr for Selector {
    type Err = SelectorError;

    /// Parse `key=value,key2=value2`; the empty string selects everything
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut required = BTreeMap::new();
        for term in s.split(',').map(str::trim).filter(|t| !t.is_empty()) {
            let (key, value) = term
                .split_once('=')
                .ok_or_else(|| SelectorError::MalformedTerm(term.to_string()))?;
            let key = key.trim();
            if key.is_empty() {
                return Err(SelectorError::EmptyKey(term.to_string()));
            }
            required.insert(key.to_string(), value.trim().to_string());
        }
        Ok(Self { required })
    }
}

impl std::fmt::Display for Selector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.required.is_empty() {
            return f.write_str("<everything>");
        }
        let terms: Vec<String> = self
            .required
            .iter()
            .map(|(k, v)| format!("{}={}", k, v))
            .collect();
        f.write_str(&terms.join(","))
    }
}

#[cfg(test)]
#[path = "selector_tests.rs"]
mod tests;
