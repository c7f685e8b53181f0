// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]
// Enable coverage(off) attribute for excluding test infrastructure
#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

//! Adapters for the build registry and the pod scheduling substrate

pub mod pod;
pub mod registry;
pub mod traced;

pub use pod::{DockerPodClient, PodClient, PodError};
pub use registry::{BuildRegistry, JsonDirRegistry, MemoryBuildRegistry, RegistryError};
pub use traced::{TracedBuildRegistry, TracedPodClient};

// Test support - only compiled for tests or when explicitly requested
#[cfg(any(test, feature = "test-support"))]
pub use pod::{FakePod, FakePodClient, PodCall};
#[cfg(any(test, feature = "test-support"))]
pub use registry::{FakeBuildRegistry, RegistryCall};
