// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Build strategies
//!
//! A strategy turns a build's input into a pod specification. Strategies are
//! looked up by build type in a [`StrategyTable`] that is assembled once, when
//! the controller is constructed, and never mutated afterwards.

mod docker;
mod sti;

pub use docker::DockerStrategy;
pub use sti::{ScratchDirs, StiStrategy, TempScratchDirs};

use crate::build::{Build, BuildId, BuildType};
use crate::pod::{PodId, PodSpec, Volume, VolumeMount};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use thiserror::Error;

/// Host socket shared with builder containers so they can drive the host daemon
pub const DOCKER_SOCKET: &str = "/var/run/docker.sock";
pub(crate) const DOCKER_SOCKET_VOLUME: &str = "docker-socket";

/// Errors from strategy construction or pod spec generation
#[derive(Debug, Error)]
pub enum StrategyError {
    #[error("build type must not be empty")]
    EmptyType,
    #[error("duplicate strategy for build type \"{0}\"")]
    DuplicateType(BuildType),
    #[error("build {build} is missing required input: {field}")]
    MissingInput { build: BuildId, field: &'static str },
    #[error("failed to create scratch directory: {0}")]
    Scratch(#[source] std::io::Error),
    #[error("{0}")]
    Other(String),
}

/// Produces the pod that performs a build
pub trait BuildStrategy: Send + Sync {
    fn create_pod(&self, build: &Build) -> Result<PodSpec, StrategyError>;
}

impl<F> BuildStrategy for F
where
    F: Fn(&Build) -> Result<PodSpec, StrategyError> + Send + Sync,
{
    fn create_pod(&self, build: &Build) -> Result<PodSpec, StrategyError> {
        self(build)
    }
}

/// Build-type keyed table of strategies
#[derive(Clone, Default)]
pub struct StrategyTable {
    strategies: HashMap<BuildType, Arc<dyn BuildStrategy>>,
}

impl StrategyTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a strategy, consuming and returning the table
    pub fn with(
        mut self,
        build_type: impl Into<BuildType>,
        strategy: impl BuildStrategy + 'static,
    ) -> Result<Self, StrategyError> {
        self.register(build_type, strategy)?;
        Ok(self)
    }

    /// Register a strategy for a build type
    ///
    /// Empty type names and a second registration for the same type are
    /// rejected so that a misconfigured table fails before any build is seen.
    pub fn register(
        &mut self,
        build_type: impl Into<BuildType>,
        strategy: impl BuildStrategy + 'static,
    ) -> Result<(), StrategyError> {
        let build_type = build_type.into();
        if build_type.as_str().trim().is_empty() {
            return Err(StrategyError::EmptyType);
        }
        if self.strategies.contains_key(&build_type) {
            return Err(StrategyError::DuplicateType(build_type));
        }
        self.strategies.insert(build_type, Arc::new(strategy));
        Ok(())
    }

    pub fn get(&self, build_type: &BuildType) -> Option<&dyn BuildStrategy> {
        self.strategies.get(build_type).map(|s| s.as_ref())
    }

    /// Registered types, sorted
    pub fn types(&self) -> Vec<&BuildType> {
        let mut types: Vec<_> = self.strategies.keys().collect();
        types.sort();
        types
    }

    pub fn len(&self) -> usize {
        self.strategies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.strategies.is_empty()
    }
}

impl std::fmt::Debug for StrategyTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StrategyTable")
            .field("types", &self.types())
            .finish()
    }
}

pub(crate) fn require<'a>(
    build: &Build,
    field: &'static str,
    value: &'a str,
) -> Result<&'a str, StrategyError> {
    if value.trim().is_empty() {
        return Err(StrategyError::MissingInput {
            build: build.id.clone(),
            field,
        });
    }
    Ok(value)
}

pub(crate) fn assigned_pod_id(build: &Build) -> Result<PodId, StrategyError> {
    build.pod_id.clone().ok_or_else(|| StrategyError::MissingInput {
        build: build.id.clone(),
        field: "pod_id",
    })
}

pub(crate) fn pod_labels(build: &Build) -> BTreeMap<String, String> {
    BTreeMap::from([
        ("build".to_string(), build.id.to_string()),
        ("build-type".to_string(), build.input.build_type.to_string()),
    ])
}

pub(crate) fn docker_socket() -> (Volume, VolumeMount) {
    (
        Volume {
            name: DOCKER_SOCKET_VOLUME.to_string(),
            host_path: DOCKER_SOCKET.into(),
        },
        VolumeMount {
            name: DOCKER_SOCKET_VOLUME.to_string(),
            mount_path: DOCKER_SOCKET.into(),
            read_only: false,
        },
    )
}

#[cfg(test)]
#[path = "strategy_tests.rs"]
mod tests;
