// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Build registry adapters

mod json;
mod memory;

pub use json::JsonDirRegistry;
pub use memory::MemoryBuildRegistry;

// Test support - only compiled for tests or when explicitly requested
#[cfg(any(test, feature = "test-support"))]
mod fake;
#[cfg(any(test, feature = "test-support"))]
pub use fake::{FakeBuildRegistry, RegistryCall};

use async_trait::async_trait;
use kiln_core::{Build, BuildId, Selector};
use std::path::PathBuf;
use thiserror::Error;

/// Errors from registry operations
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("build not found: {0}")]
    NotFound(BuildId),
    #[error("build already exists: {0}")]
    AlreadyExists(BuildId),
    #[error("build id {0:?} cannot be stored")]
    InvalidId(BuildId),
    #[error("registry unavailable: {0}")]
    Unavailable(String),
    #[error("invalid build record {path}: {source}")]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Store of build records
///
/// `update` overwrites the stored record unconditionally; there is no
/// version check.
#[async_trait]
pub trait BuildRegistry: Clone + Send + Sync + 'static {
    /// List builds whose labels match the selector
    async fn list(&self, selector: &Selector) -> Result<Vec<Build>, RegistryError>;

    /// Replace a stored build with the given record
    async fn update(&self, build: &Build) -> Result<(), RegistryError>;
}
