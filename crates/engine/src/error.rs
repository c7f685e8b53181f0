// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Error types for the build controller

use kiln_adapters::RegistryError;
use thiserror::Error;

/// Errors that abort a whole tick
///
/// Per-build failures never surface here; they are logged and retried on
/// the next tick.
#[derive(Debug, Error)]
pub enum ControllerError {
    #[error("failed to list builds: {0}")]
    List(#[source] RegistryError),
}
