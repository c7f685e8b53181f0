// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! kiln-core: Core library for the Kiln build controller
//!
//! This crate provides:
//! - The build record and its status model
//! - Pod specifications and observed pod state
//! - Build strategies and the strategy table
//! - The pure build lifecycle state machine

pub mod build;
pub mod clock;
pub mod pod;
pub mod selector;
pub mod strategy;
pub mod transition;

// Re-exports
pub use build::{Build, BuildId, BuildInput, BuildStatus, BuildType};
pub use clock::{Clock, FakeClock, SystemClock};
pub use pod::{
    ContainerExit, ContainerSpec, CreateOutcome, EnvVar, PodId, PodSpec, PodState,
    RestartPolicy, Volume, VolumeMount,
};
pub use selector::{Selector, SelectorError};
pub use strategy::{
    BuildStrategy, DockerStrategy, ScratchDirs, StiStrategy, StrategyError, StrategyTable,
    TempScratchDirs,
};
pub use transition::{FailureReason, Plan, Submission, Transition};
