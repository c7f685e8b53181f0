// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Traced adapter wrappers for consistent observability

use crate::pod::{PodClient, PodError};
use crate::registry::{BuildRegistry, RegistryError};
use async_trait::async_trait;
use kiln_core::{Build, CreateOutcome, PodId, PodSpec, PodState, Selector};
use tracing::Instrument;

/// Wrapper that adds tracing to any BuildRegistry
#[derive(Clone)]
pub struct TracedBuildRegistry<R> {
    inner: R,
}

impl<R> TracedBuildRegistry<R> {
    pub fn new(inner: R) -> Self {
        Self { inner }
    }

    pub fn inner(&self) -> &R {
        &self.inner
    }
}

#[async_trait]
impl<R: BuildRegistry> BuildRegistry for TracedBuildRegistry<R> {
    async fn list(&self, selector: &Selector) -> Result<Vec<Build>, RegistryError> {
        let span = tracing::info_span!("registry.list", %selector);
        async {
            let start = std::time::Instant::now();
            let result = self.inner.list(selector).await;
            let elapsed_ms = start.elapsed().as_millis() as u64;

            match &result {
                Ok(builds) => tracing::debug!(count = builds.len(), elapsed_ms, "listed builds"),
                Err(e) => tracing::error!(elapsed_ms, error = %e, "list failed"),
            }
            result
        }
        .instrument(span)
        .await
    }

    async fn update(&self, build: &Build) -> Result<(), RegistryError> {
        let span = tracing::info_span!(
            "registry.update",
            build_id = %build.id,
            status = %build.status
        );
        async {
            let start = std::time::Instant::now();
            let result = self.inner.update(build).await;
            let elapsed_ms = start.elapsed().as_millis() as u64;

            match &result {
                Ok(()) => tracing::debug!(elapsed_ms, "build updated"),
                Err(e) => tracing::error!(elapsed_ms, error = %e, "update failed"),
            }
            result
        }
        .instrument(span)
        .await
    }
}

/// Wrapper that adds tracing to any PodClient
#[derive(Clone)]
pub struct TracedPodClient<P> {
    inner: P,
}

impl<P> TracedPodClient<P> {
    pub fn new(inner: P) -> Self {
        Self { inner }
    }

    pub fn inner(&self) -> &P {
        &self.inner
    }
}

#[async_trait]
impl<P: PodClient> PodClient for TracedPodClient<P> {
    async fn create(&self, spec: &PodSpec) -> CreateOutcome {
        let span = tracing::info_span!("pod.create", pod_id = %spec.id);
        async {
            tracing::info!(containers = spec.containers.len(), "submitting");

            // Precondition: a pod needs at least one container
            if spec.containers.is_empty() {
                tracing::error!("pod has no containers");
                return CreateOutcome::Failed(format!("pod {} has no containers", spec.id));
            }

            let start = std::time::Instant::now();
            let outcome = self.inner.create(spec).await;
            let elapsed_ms = start.elapsed().as_millis() as u64;

            match &outcome {
                CreateOutcome::Created(_) => tracing::info!(elapsed_ms, "pod created"),
                CreateOutcome::Conflict => tracing::info!(elapsed_ms, "pod already exists"),
                CreateOutcome::Failed(reason) => {
                    tracing::error!(elapsed_ms, error = %reason, "submission failed")
                }
            }
            outcome
        }
        .instrument(span)
        .await
    }

    async fn get(&self, id: &PodId) -> Result<PodState, PodError> {
        let span = tracing::info_span!("pod.get", pod_id = %id);
        async {
            let result = self.inner.get(id).await;
            match &result {
                Ok(state) => tracing::trace!(terminal = state.is_terminal(), "fetched"),
                Err(e) => tracing::warn!(error = %e, "fetch failed"),
            }
            result
        }
        .instrument(span)
        .await
    }
}

#[cfg(test)]
#[path = "traced_tests.rs"]
mod tests;
