// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Build lifecycle state machine
//!
//! ```text
//! New ──► Pending ──► Running ──► Complete
//!            │           │
//!            ├──► Failed ◄┘ (strategy / submission / exit code / timeout)
//!            └──► Error     (no strategy for type)
//! ```
//!
//! The machine is pure. [`plan`] decides what has to be observed before the
//! next status is known; the caller performs that I/O and hands the result
//! to [`on_submission`] or [`on_inspection`]. `Complete`, `Failed` and `Error`
//! are absorbing.

use crate::build::{Build, BuildStatus, BuildType};
use crate::pod::{CreateOutcome, PodId, PodState};
use chrono::{DateTime, Utc};
use std::time::Duration;
use thiserror::Error;

/// Why a build failed, or why a sync left it where it was
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FailureReason {
    #[error("no build strategy registered for type \"{0}\"")]
    NoStrategy(BuildType),
    #[error("strategy could not produce a pod: {0}")]
    Strategy(String),
    #[error("pod submission failed: {0}")]
    Submission(String),
    #[error("could not retrieve pod: {0}")]
    PodFetch(String),
    #[error("build timed out after {elapsed_secs}s (limit {limit_secs}s)")]
    TimedOut { elapsed_secs: i64, limit_secs: u64 },
    #[error("container {container} exited with code {exit_code}")]
    ContainerFailed { container: String, exit_code: i32 },
    #[error("invalid build status {0:?}")]
    InvalidStatus(String),
    #[error("build has status {0} but no pod id")]
    MissingPodId(BuildStatus),
}

impl FailureReason {
    /// Transient reasons leave the build's status unchanged and are retried
    pub fn is_transient(&self) -> bool {
        matches!(self, FailureReason::PodFetch(_))
    }
}

/// The outcome of one state machine step
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    pub next: BuildStatus,
    /// Pod id to bind, only set when leaving `New`
    pub pod_id: Option<PodId>,
    pub reason: Option<FailureReason>,
}

impl Transition {
    pub fn to(next: BuildStatus) -> Self {
        Self {
            next,
            pod_id: None,
            reason: None,
        }
    }

    /// Keep the build's current status
    pub fn stay(build: &Build) -> Self {
        Self::to(build.status.clone())
    }

    pub fn failed(reason: FailureReason) -> Self {
        Self::to(BuildStatus::Failed).with_reason(reason)
    }

    pub fn error(reason: FailureReason) -> Self {
        Self::to(BuildStatus::Error).with_reason(reason)
    }

    pub fn with_reason(mut self, reason: FailureReason) -> Self {
        self.reason = Some(reason);
        self
    }

    /// Whether applying this transition would change the build's status
    pub fn changes(&self, build: &Build) -> bool {
        self.next != build.status
    }

    /// Write the transition into a build record
    ///
    /// The reason is persisted as the build message only for terminal
    /// failures; any other transition clears a stale message.
    pub fn apply(&self, build: &mut Build) {
        build.status = self.next.clone();
        if let Some(pod_id) = &self.pod_id {
            build.pod_id = Some(pod_id.clone());
        }
        build.message = match (&self.next, &self.reason) {
            (BuildStatus::Failed | BuildStatus::Error, Some(reason)) => Some(reason.to_string()),
            _ => None,
        };
    }
}

/// What the caller must do before the next status is known
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Plan {
    /// The next status is already decided
    Settle(Transition),
    /// Look up the strategy for the build type, build the pod spec, submit it
    Submit { pod_id: PodId },
    /// Fetch the state of the build's pod
    Inspect { pod_id: PodId },
}

/// Result of the submit step of a `Pending` build
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Submission {
    NoStrategy,
    StrategyFailed(String),
    Submitted(CreateOutcome),
}

/// Decide the next step for a build
pub fn plan(build: &Build, now: DateTime<Utc>, timeout: Duration) -> Plan {
    match &build.status {
        BuildStatus::New => Plan::Settle(Transition {
            next: BuildStatus::Pending,
            pod_id: Some(build.derived_pod_id()),
            reason: None,
        }),
        BuildStatus::Pending => match &build.pod_id {
            Some(pod_id) => Plan::Submit {
                pod_id: pod_id.clone(),
            },
            None => Plan::Settle(Transition::error(FailureReason::MissingPodId(
                build.status.clone(),
            ))),
        },
        BuildStatus::Running => {
            let limit_secs = timeout.as_secs();
            let elapsed_secs = build.age_secs(now);
            if elapsed_secs > i64::try_from(limit_secs).unwrap_or(i64::MAX) {
                return Plan::Settle(Transition::failed(FailureReason::TimedOut {
                    elapsed_secs,
                    limit_secs,
                }));
            }
            match &build.pod_id {
                Some(pod_id) => Plan::Inspect {
                    pod_id: pod_id.clone(),
                },
                None => Plan::Settle(Transition::error(FailureReason::MissingPodId(
                    build.status.clone(),
                ))),
            }
        }
        BuildStatus::Complete | BuildStatus::Failed | BuildStatus::Error => {
            Plan::Settle(Transition::stay(build))
        }
        BuildStatus::Unrecognized(value) => Plan::Settle(Transition::error(
            FailureReason::InvalidStatus(value.clone()),
        )),
    }
}

/// Next status of a `Pending` build after the submit step
pub fn on_submission(build: &Build, submission: Submission) -> Transition {
    match submission {
        Submission::NoStrategy => Transition::error(FailureReason::NoStrategy(
            build.input.build_type.clone(),
        )),
        Submission::StrategyFailed(message) => {
            Transition::failed(FailureReason::Strategy(message))
        }
        Submission::Submitted(CreateOutcome::Created(_)) => Transition::to(BuildStatus::Running),
        // Our own pod from an earlier tick whose status write did not land
        Submission::Submitted(CreateOutcome::Conflict) => Transition::stay(build),
        Submission::Submitted(CreateOutcome::Failed(message)) => {
            Transition::failed(FailureReason::Submission(message))
        }
    }
}

/// Next status of a `Running` build given the observed pod state
pub fn on_inspection(build: &Build, observed: Result<PodState, String>) -> Transition {
    match observed {
        Err(message) => Transition::stay(build).with_reason(FailureReason::PodFetch(message)),
        Ok(PodState::NonTerminal) => Transition::stay(build),
        Ok(state) => match state.first_failure() {
            Some(exit) => Transition::failed(FailureReason::ContainerFailed {
                container: exit.name.clone(),
                exit_code: exit.exit_code,
            }),
            None => Transition::to(BuildStatus::Complete),
        },
    }
}

#[cfg(test)]
#[path = "transition_tests.rs"]
mod tests;
