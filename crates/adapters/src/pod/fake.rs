// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fake pod client for testing
#![cfg_attr(coverage_nightly, coverage(off))]

use super::{PodClient, PodError};
use async_trait::async_trait;
use kiln_core::{ContainerExit, CreateOutcome, PodId, PodSpec, PodState};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// Recorded pod call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PodCall {
    Create { id: PodId },
    Get { id: PodId },
}

/// Fake pod state
#[derive(Debug, Clone)]
pub struct FakePod {
    pub spec: PodSpec,
    pub state: PodState,
}

#[derive(Default)]
struct FakeState {
    pods: HashMap<PodId, FakePod>,
    calls: Vec<PodCall>,
    create_failure: Option<String>,
    get_failure: Option<String>,
}

/// Fake pod client for testing
///
/// Created pods stay non-terminal until finished with [`FakePodClient::finish`].
#[derive(Clone, Default)]
pub struct FakePodClient {
    state: Arc<Mutex<FakeState>>,
}

impl FakePodClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get all recorded calls
    pub fn calls(&self) -> Vec<PodCall> {
        self.state
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .calls
            .clone()
    }

    /// Number of create calls made so far
    pub fn create_count(&self) -> usize {
        self.calls()
            .iter()
            .filter(|c| matches!(c, PodCall::Create { .. }))
            .count()
    }

    /// Get a pod by ID
    pub fn get_pod(&self, id: &str) -> Option<FakePod> {
        self.state
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .pods
            .get(&PodId::from(id))
            .cloned()
    }

    /// Mark a pod as terminated with the given container exits
    pub fn finish(&self, id: &str, exits: Vec<ContainerExit>) {
        if let Some(pod) = self
            .state
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .pods
            .get_mut(&PodId::from(id))
        {
            pod.state = PodState::Terminated(exits);
        }
    }

    /// Reject every create with the given reason until cleared with `None`
    pub fn set_create_failure(&self, reason: Option<&str>) {
        self.state
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .create_failure = reason.map(str::to_string);
    }

    /// Fail every get with the given reason until cleared with `None`
    pub fn set_get_failure(&self, reason: Option<&str>) {
        self.state
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .get_failure = reason.map(str::to_string);
    }
}

#[async_trait]
impl PodClient for FakePodClient {
    async fn create(&self, spec: &PodSpec) -> CreateOutcome {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        state.calls.push(PodCall::Create {
            id: spec.id.clone(),
        });

        if let Some(reason) = &state.create_failure {
            return CreateOutcome::Failed(reason.clone());
        }
        if state.pods.contains_key(&spec.id) {
            return CreateOutcome::Conflict;
        }

        state.pods.insert(
            spec.id.clone(),
            FakePod {
                spec: spec.clone(),
                state: PodState::NonTerminal,
            },
        );
        CreateOutcome::Created(spec.id.clone())
    }

    async fn get(&self, id: &PodId) -> Result<PodState, PodError> {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        state.calls.push(PodCall::Get { id: id.clone() });

        if let Some(reason) = &state.get_failure {
            return Err(PodError::CommandFailed(reason.clone()));
        }

        state
            .pods
            .get(id)
            .map(|p| p.state.clone())
            .ok_or_else(|| PodError::NotFound(id.clone()))
    }
}

#[cfg(test)]
#[path = "fake_tests.rs"]
mod tests;
