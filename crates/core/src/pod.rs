// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Pod specifications and observed pod state
//!
//! A pod is the scheduling substrate's runnable entity. Strategies produce a
//! [`PodSpec`]; pod clients report a [`PodState`] back.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

/// Unique identifier for a pod
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PodId(pub String);

impl PodId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for PodId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for PodId {
    fn from(s: String) -> Self {
        PodId(s)
    }
}

impl From<&str> for PodId {
    fn from(s: &str) -> Self {
        PodId(s.to_string())
    }
}

/// Whether the substrate relaunches containers that exit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RestartPolicy {
    Always,
    OnFailure,
    Never,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnvVar {
    pub name: String,
    pub value: String,
}

impl EnvVar {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// A host directory exposed to the pod's containers
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Volume {
    pub name: String,
    pub host_path: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VolumeMount {
    /// Name of the [`Volume`] to mount
    pub name: String,
    pub mount_path: PathBuf,
    #[serde(default)]
    pub read_only: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContainerSpec {
    pub name: String,
    pub image: String,
    /// Overrides the image entrypoint when non-empty
    #[serde(default)]
    pub command: Vec<String>,
    #[serde(default)]
    pub env: Vec<EnvVar>,
    #[serde(default)]
    pub volume_mounts: Vec<VolumeMount>,
    #[serde(default)]
    pub privileged: bool,
}

impl ContainerSpec {
    pub fn new(name: impl Into<String>, image: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            image: image.into(),
            command: Vec::new(),
            env: Vec::new(),
            volume_mounts: Vec::new(),
            privileged: false,
        }
    }

    /// Look up an environment variable by name
    pub fn env_value(&self, name: &str) -> Option<&str> {
        self.env
            .iter()
            .find(|e| e.name == name)
            .map(|e| e.value.as_str())
    }
}

/// Everything the substrate needs to run a build
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PodSpec {
    pub id: PodId,
    #[serde(default)]
    pub labels: BTreeMap<String, String>,
    pub containers: Vec<ContainerSpec>,
    #[serde(default)]
    pub volumes: Vec<Volume>,
    pub restart_policy: RestartPolicy,
}

impl PodSpec {
    pub fn volume(&self, name: &str) -> Option<&Volume> {
        self.volumes.iter().find(|v| v.name == name)
    }
}

/// Exit status of one container in a terminated pod
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContainerExit {
    pub name: String,
    pub exit_code: i32,
}

impl ContainerExit {
    pub fn new(name: impl Into<String>, exit_code: i32) -> Self {
        Self {
            name: name.into(),
            exit_code,
        }
    }
}

/// Observed state of a pod
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PodState {
    /// Scheduled or still running
    NonTerminal,
    /// All containers have exited; results are in report order
    Terminated(Vec<ContainerExit>),
}

impl PodState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, PodState::Terminated(_))
    }

    /// First container that exited non-zero, in report order
    pub fn first_failure(&self) -> Option<&ContainerExit> {
        match self {
            PodState::NonTerminal => None,
            PodState::Terminated(exits) => exits.iter().find(|e| e.exit_code != 0),
        }
    }
}

/// Result of asking the substrate to create a pod
///
/// `Conflict` means a pod with the same id already exists. Pod ids are derived
/// from the build, so for the controller this is the build's own pod.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CreateOutcome {
    Created(PodId),
    Conflict,
    Failed(String),
}

#[cfg(test)]
#[path = "pod_tests.rs"]
mod tests;
