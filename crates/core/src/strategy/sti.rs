// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Source-to-image builds

use super::{assigned_pod_id, docker_socket, pod_labels, require, BuildStrategy, StrategyError};
use crate::build::Build;
use crate::pod::{ContainerSpec, EnvVar, PodSpec, RestartPolicy, Volume, VolumeMount};
use std::path::PathBuf;
use std::sync::Arc;

pub const STI_CONTAINER: &str = "sti-build";
pub const SCRATCH_VOLUME: &str = "scratch";
pub const SCRATCH_MOUNT: &str = "/tmp/build";

/// Creates the host directory a source-to-image build works in
pub trait ScratchDirs: Send + Sync {
    fn create(&self, build: &Build) -> std::io::Result<PathBuf>;
}

/// Scratch directories under a root, one per build
///
/// Repeated calls for the same build return the same directory.
#[derive(Debug, Clone)]
pub struct TempScratchDirs {
    root: PathBuf,
}

impl TempScratchDirs {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Scratch directories under the system temp directory
    pub fn system() -> Self {
        Self::new(std::env::temp_dir())
    }
}

impl Default for TempScratchDirs {
    fn default() -> Self {
        Self::system()
    }
}

impl ScratchDirs for TempScratchDirs {
    fn create(&self, build: &Build) -> std::io::Result<PathBuf> {
        let dir = self.root.join(format!("sti-{}", build.id));
        std::fs::create_dir_all(&dir)?;
        Ok(dir)
    }
}

/// Runs the source-to-image builder against the build's source
pub struct StiStrategy {
    builder_image: String,
    command: Vec<String>,
    scratch: Arc<dyn ScratchDirs>,
}

impl StiStrategy {
    pub fn new(builder_image: impl Into<String>, scratch: impl ScratchDirs + 'static) -> Self {
        Self {
            builder_image: builder_image.into(),
            command: Vec::new(),
            scratch: Arc::new(scratch),
        }
    }

    /// Override the builder image entrypoint
    pub fn with_command(mut self, command: Vec<String>) -> Self {
        self.command = command;
        self
    }

    pub fn builder_image(&self) -> &str {
        &self.builder_image
    }
}

impl std::fmt::Debug for StiStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StiStrategy")
            .field("builder_image", &self.builder_image)
            .field("command", &self.command)
            .finish_non_exhaustive()
    }
}

impl BuildStrategy for StiStrategy {
    fn create_pod(&self, build: &Build) -> Result<PodSpec, StrategyError> {
        let pod_id = assigned_pod_id(build)?;
        let input = &build.input;
        let source = require(build, "source_uri", &input.source_uri)?;
        let tag = require(build, "image_tag", &input.image_tag)?;

        let scratch_dir = self
            .scratch
            .create(build)
            .map_err(StrategyError::Scratch)?;
        tracing::debug!(build_id = %build.id, dir = %scratch_dir.display(), "created scratch dir");

        let (socket, socket_mount) = docker_socket();
        let scratch = Volume {
            name: SCRATCH_VOLUME.to_string(),
            host_path: scratch_dir,
        };
        let scratch_mount = VolumeMount {
            name: SCRATCH_VOLUME.to_string(),
            mount_path: SCRATCH_MOUNT.into(),
            read_only: false,
        };

        let mut container = ContainerSpec::new(STI_CONTAINER, &self.builder_image);
        container.command = self.command.clone();
        container.volume_mounts = vec![socket_mount, scratch_mount];
        container.env = vec![
            EnvVar::new("BUILD_TAG", tag),
            EnvVar::new("DOCKER_REGISTRY", &input.registry),
            EnvVar::new("SOURCE_URI", source),
            EnvVar::new("SOURCE_REF", &input.source_ref),
            EnvVar::new("BUILDER_IMAGE", &input.builder_image),
        ];

        Ok(PodSpec {
            id: pod_id,
            labels: pod_labels(build),
            containers: vec![container],
            volumes: vec![socket, scratch],
            restart_policy: RestartPolicy::Never,
        })
    }
}

#[cfg(test)]
#[path = "sti_tests.rs"]
mod tests;
