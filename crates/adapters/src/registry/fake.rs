// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fake build registry for testing
#![cfg_attr(coverage_nightly, coverage(off))]

use super::{BuildRegistry, MemoryBuildRegistry, RegistryError};
use async_trait::async_trait;
use kiln_core::{Build, BuildId, BuildStatus, Selector};
use std::collections::HashSet;
use std::sync::{Arc, Mutex};

/// Recorded registry call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistryCall {
    List { selector: Selector },
    Update { id: BuildId, status: BuildStatus },
}

#[derive(Default)]
struct Failures {
    list: Option<String>,
    update: HashSet<BuildId>,
}

/// In-memory registry with call recording and injectable failures
#[derive(Clone, Default)]
pub struct FakeBuildRegistry {
    inner: MemoryBuildRegistry,
    calls: Arc<Mutex<Vec<RegistryCall>>>,
    failures: Arc<Mutex<Failures>>,
}

impl FakeBuildRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a build
    pub fn insert(&self, build: Build) {
        let _ = self.inner.create(build);
    }

    pub fn get(&self, id: &str) -> Option<Build> {
        self.inner.get(&BuildId::from(id))
    }

    /// Get all recorded calls
    pub fn calls(&self) -> Vec<RegistryCall> {
        self.calls.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    /// Recorded updates only
    pub fn updates(&self) -> Vec<(BuildId, BuildStatus)> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                RegistryCall::Update { id, status } => Some((id, status)),
                RegistryCall::List { .. } => None,
            })
            .collect()
    }

    pub fn clear_calls(&self) {
        self.calls.lock().unwrap_or_else(|e| e.into_inner()).clear();
    }

    /// Make `list` fail with the given message until cleared with `None`
    pub fn set_list_failure(&self, message: Option<&str>) {
        self.failures.lock().unwrap_or_else(|e| e.into_inner()).list =
            message.map(str::to_string);
    }

    /// Make `update` fail for one build until cleared
    pub fn fail_updates_for(&self, id: &str, failing: bool) {
        let mut failures = self.failures.lock().unwrap_or_else(|e| e.into_inner());
        if failing {
            failures.update.insert(BuildId::from(id));
        } else {
            failures.update.remove(&BuildId::from(id));
        }
    }
}

#[async_trait]
impl BuildRegistry for FakeBuildRegistry {
    async fn list(&self, selector: &Selector) -> Result<Vec<Build>, RegistryError> {
        self.calls
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(RegistryCall::List {
                selector: selector.clone(),
            });

        let failure = self
            .failures
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .list
            .clone();
        if let Some(message) = failure {
            return Err(RegistryError::Unavailable(message));
        }

        self.inner.list(selector).await
    }

    async fn update(&self, build: &Build) -> Result<(), RegistryError> {
        self.calls
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(RegistryCall::Update {
                id: build.id.clone(),
                status: build.status.clone(),
            });

        let failing = self
            .failures
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .update
            .contains(&build.id);
        if failing {
            return Err(RegistryError::Unavailable(format!(
                "update rejected for {}",
                build.id
            )));
        }

        self.inner.update(build).await
    }
}

#[cfg(test)]
#[path = "fake_tests.rs"]
mod tests;
