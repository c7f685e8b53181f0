// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Pod scheduling substrate adapters

mod docker;

pub use docker::DockerPodClient;

// Test support - only compiled for tests or when explicitly requested
#[cfg(any(test, feature = "test-support"))]
mod fake;
#[cfg(any(test, feature = "test-support"))]
pub use fake::{FakePod, FakePodClient, PodCall};

use async_trait::async_trait;
use kiln_core::{CreateOutcome, PodId, PodSpec, PodState};
use thiserror::Error;

/// Errors from fetching pods
#[derive(Debug, Error)]
pub enum PodError {
    #[error("pod not found: {0}")]
    NotFound(PodId),
    #[error("command failed: {0}")]
    CommandFailed(String),
    #[error("container name already in use: {0}")]
    NameInUse(String),
    #[error("unexpected output: {0}")]
    Parse(String),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Client of the pod scheduling substrate
#[async_trait]
pub trait PodClient: Clone + Send + Sync + 'static {
    /// Submit a pod
    ///
    /// Returns `Conflict` when a pod with the same id already exists, so
    /// callers never have to interpret error text.
    async fn create(&self, spec: &PodSpec) -> CreateOutcome;

    /// Fetch the observed state of a pod
    async fn get(&self, id: &PodId) -> Result<PodState, PodError>;
}
