// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! In-memory build registry

use super::{BuildRegistry, RegistryError};
use async_trait::async_trait;
use kiln_core::{Build, BuildId, Selector};
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

/// Registry holding builds in process memory, ordered by id
#[derive(Clone, Default)]
pub struct MemoryBuildRegistry {
    builds: Arc<Mutex<BTreeMap<BuildId, Build>>>,
}

impl MemoryBuildRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a new build
    pub fn create(&self, build: Build) -> Result<(), RegistryError> {
        let mut builds = self.builds.lock().unwrap_or_else(|e| e.into_inner());
        if builds.contains_key(&build.id) {
            return Err(RegistryError::AlreadyExists(build.id));
        }
        builds.insert(build.id.clone(), build);
        Ok(())
    }

    /// Get a build by id
    pub fn get(&self, id: &BuildId) -> Option<Build> {
        self.builds
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .get(id)
            .cloned()
    }

    pub fn len(&self) -> usize {
        self.builds.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl BuildRegistry for MemoryBuildRegistry {
    async fn list(&self, selector: &Selector) -> Result<Vec<Build>, RegistryError> {
        let builds = self.builds.lock().unwrap_or_else(|e| e.into_inner());
        Ok(builds
            .values()
            .filter(|b| selector.matches(&b.labels))
            .cloned()
            .collect())
    }

    async fn update(&self, build: &Build) -> Result<(), RegistryError> {
        let mut builds = self.builds.lock().unwrap_or_else(|e| e.into_inner());
        match builds.get_mut(&build.id) {
            Some(stored) => {
                *stored = build.clone();
                Ok(())
            }
            None => Err(RegistryError::NotFound(build.id.clone())),
        }
    }
}

#[cfg(test)]
#[path = "memory_tests.rs"]
mod tests;
