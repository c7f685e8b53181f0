// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Build records
//!
//! A build is created externally in the `New` status and is driven by the
//! controller until it reaches one of the absorbing statuses (`Complete`,
//! `Failed`, `Error`). The controller owns `status`, `pod_id` and `message`;
//! everything else is written once by whoever created the build.

use crate::pod::PodId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Unique identifier for a build
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BuildId(pub String);

impl std::fmt::Display for BuildId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for BuildId {
    fn from(s: String) -> Self {
        BuildId(s)
    }
}

impl From<&str> for BuildId {
    fn from(s: &str) -> Self {
        BuildId(s.to_string())
    }
}

/// Build type tag used to select a strategy
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BuildType(pub String);

impl BuildType {
    /// Builds driven by a Dockerfile in the source context
    pub const DOCKER: &'static str = "docker";
    /// Source-to-image builds
    pub const STI: &'static str = "sti";

    pub fn docker() -> Self {
        BuildType(Self::DOCKER.to_string())
    }

    pub fn sti() -> Self {
        BuildType(Self::STI.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for BuildType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for BuildType {
    fn from(s: String) -> Self {
        BuildType(s)
    }
}

impl From<&str> for BuildType {
    fn from(s: &str) -> Self {
        BuildType(s.to_string())
    }
}

/// Lifecycle status of a build
///
/// Status values come from an external registry, so a value outside the known
/// set is kept verbatim as `Unrecognized` instead of failing deserialization.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum BuildStatus {
    New,
    Pending,
    Running,
    Complete,
    Failed,
    Error,
    Unrecognized(String),
}

impl BuildStatus {
    /// Check if no further transition can leave this status
    pub fn is_absorbing(&self) -> bool {
        matches!(
            self,
            BuildStatus::Complete | BuildStatus::Failed | BuildStatus::Error
        )
    }

    pub fn as_str(&self) -> &str {
        match self {
            BuildStatus::New => "new",
            BuildStatus::Pending => "pending",
            BuildStatus::Running => "running",
            BuildStatus::Complete => "complete",
            BuildStatus::Failed => "failed",
            BuildStatus::Error => "error",
            BuildStatus::Unrecognized(value) => value,
        }
    }
}

impl std::fmt::Display for BuildStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<String> for BuildStatus {
    fn from(s: String) -> Self {
        match s.as_str() {
            "new" => BuildStatus::New,
            "pending" => BuildStatus::Pending,
            "running" => BuildStatus::Running,
            "complete" => BuildStatus::Complete,
            "failed" => BuildStatus::Failed,
            "error" => BuildStatus::Error,
            _ => BuildStatus::Unrecognized(s),
        }
    }
}

impl From<&str> for BuildStatus {
    fn from(s: &str) -> Self {
        BuildStatus::from(s.to_string())
    }
}

impl From<BuildStatus> for String {
    fn from(status: BuildStatus) -> Self {
        match status {
            BuildStatus::Unrecognized(value) => value,
            known => known.as_str().to_string(),
        }
    }
}

/// What to build and where to push it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildInput {
    #[serde(rename = "type")]
    pub build_type: BuildType,
    /// Location of the source (repository URL or build context URL)
    #[serde(default)]
    pub source_uri: String,
    /// Revision of the source to build
    #[serde(default)]
    pub source_ref: String,
    /// Tag for the resulting image
    #[serde(default)]
    pub image_tag: String,
    /// Registry the resulting image is pushed to
    #[serde(default)]
    pub registry: String,
    /// Base image used by source-to-image builds
    #[serde(default)]
    pub builder_image: String,
}

impl BuildInput {
    pub fn new(build_type: impl Into<BuildType>) -> Self {
        Self {
            build_type: build_type.into(),
            source_uri: String::new(),
            source_ref: String::new(),
            image_tag: String::new(),
            registry: String::new(),
            builder_image: String::new(),
        }
    }

    pub fn with_source(mut self, uri: impl Into<String>, git_ref: impl Into<String>) -> Self {
        self.source_uri = uri.into();
        self.source_ref = git_ref.into();
        self
    }

    pub fn with_image(mut self, tag: impl Into<String>, registry: impl Into<String>) -> Self {
        self.image_tag = tag.into();
        self.registry = registry.into();
        self
    }

    pub fn with_builder_image(mut self, image: impl Into<String>) -> Self {
        self.builder_image = image.into();
        self
    }
}

/// A build under control of the lifecycle controller
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Build {
    pub id: BuildId,
    pub status: BuildStatus,
    pub input: BuildInput,
    /// Assigned by the controller when the build leaves `New`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pod_id: Option<PodId>,
    pub creation_timestamp: DateTime<Utc>,
    #[serde(default)]
    pub labels: BTreeMap<String, String>,
    /// Reason recorded with the last failing transition
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl Build {
    /// Create a build in the `New` status
    pub fn new(
        id: impl Into<BuildId>,
        input: BuildInput,
        creation_timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            id: id.into(),
            status: BuildStatus::New,
            input,
            pod_id: None,
            creation_timestamp,
            labels: BTreeMap::new(),
            message: None,
        }
    }

    pub fn with_label(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.labels.insert(key.into(), value.into());
        self
    }

    /// The pod id this build is bound to, derived from its type and id
    ///
    /// Deterministic so that re-deriving it on a later tick names the same pod.
    pub fn derived_pod_id(&self) -> PodId {
        PodId(format!("build-{}-{}", self.input.build_type, self.id))
    }

    /// Whole seconds elapsed between creation and `now`
    pub fn age_secs(&self, now: DateTime<Utc>) -> i64 {
        (now - self.creation_timestamp).num_seconds()
    }
}

#[cfg(test)]
#[path = "build_tests.rs"]
mod tests;
