// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Dockerfile builds

use super::{assigned_pod_id, docker_socket, pod_labels, require, BuildStrategy, StrategyError};
use crate::build::Build;
use crate::pod::{ContainerSpec, EnvVar, PodSpec, RestartPolicy};

pub const DOCKER_CONTAINER: &str = "docker-build";

/// Runs a builder image that fetches the context and runs `docker build`
///
/// The container is privileged and talks to the host Docker daemon through
/// the mounted socket.
#[derive(Debug, Clone)]
pub struct DockerStrategy {
    builder_image: String,
    command: Vec<String>,
}

impl DockerStrategy {
    pub fn new(builder_image: impl Into<String>) -> Self {
        Self {
            builder_image: builder_image.into(),
            command: Vec::new(),
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

impl BuildStrategy for DockerStrategy {
    fn create_pod(&self, build: &Build) -> Result<PodSpec, StrategyError> {
        let pod_id = assigned_pod_id(build)?;
        let input = &build.input;
        let context = require(build, "source_uri", &input.source_uri)?;
        let tag = require(build, "image_tag", &input.image_tag)?;

        let (volume, mount) = docker_socket();
        let mut container = ContainerSpec::new(DOCKER_CONTAINER, &self.builder_image);
        container.command = self.command.clone();
        container.privileged = true;
        container.volume_mounts = vec![mount];
        container.env = vec![
            EnvVar::new("BUILD_TAG", tag),
            EnvVar::new("DOCKER_CONTEXT_URL", context),
            EnvVar::new("DOCKER_REGISTRY", &input.registry),
            EnvVar::new("SOURCE_REF", &input.source_ref),
            EnvVar::new("BUILDER_IMAGE", &input.builder_image),
        ];

        Ok(PodSpec {
            id: pod_id,
            labels: pod_labels(build),
            containers: vec![container],
            volumes: vec![volume],
            restart_policy: RestartPolicy::Never,
        })
    }
}

#[cfg(test)]
#[path = "docker_tests.rs"]
mod tests;
