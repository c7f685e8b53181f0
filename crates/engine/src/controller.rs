// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Build reconciliation loop
//!
//! Each tick lists the builds in scope, asks the state machine for each
//! build's next status, performs whatever pod I/O the machine needs, and
//! writes changed builds back. Nothing is cached between ticks: the registry
//! is the only source of truth, so a write that fails is simply recomputed
//! from the same prior status on the next tick.

use crate::error::ControllerError;
use kiln_adapters::{BuildRegistry, PodClient};
use kiln_core::transition::{self, Plan, Submission, Transition};
use kiln_core::{Build, Clock, PodId, Selector, StrategyTable};
use std::time::Duration;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

/// Shortest tick period the run loop will honour
const MIN_TICK_PERIOD: Duration = Duration::from_millis(10);

/// Controller tuning
#[derive(Debug, Clone)]
pub struct ControllerConfig {
    /// Delay between the start of consecutive ticks
    pub tick_period: Duration,
    /// Running builds older than this are failed
    pub build_timeout: Duration,
    /// Only builds whose labels match are reconciled
    pub selector: Selector,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            tick_period: Duration::from_secs(5),
            build_timeout: Duration::from_secs(1800),
            selector: Selector::everything(),
        }
    }
}

/// What a single build sync did
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncOutcome {
    /// The build already had the computed status; nothing was written
    Unchanged(Transition),
    /// The new status was written to the registry
    Transitioned(Transition),
    /// The registry rejected the write; the build is retried next tick
    UpdateFailed(Transition),
}

/// Counters for one pass over the registry
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickReport {
    pub listed: usize,
    pub transitioned: usize,
    pub unchanged: usize,
    pub update_failures: usize,
}

/// Drives builds through their lifecycle
pub struct BuildController<R, P, C> {
    registry: R,
    pods: P,
    strategies: StrategyTable,
    clock: C,
    config: ControllerConfig,
}

impl<R, P, C> BuildController<R, P, C>
where
    R: BuildRegistry,
    P: PodClient,
    C: Clock,
{
    pub fn new(
        registry: R,
        pods: P,
        strategies: StrategyTable,
        clock: C,
        config: ControllerConfig,
    ) -> Self {
        Self {
            registry,
            pods,
            strategies,
            clock,
            config,
        }
    }

    pub fn config(&self) -> &ControllerConfig {
        &self.config
    }

    pub fn strategies(&self) -> &StrategyTable {
        &self.strategies
    }

    /// Compute a build's next transition, performing any pod I/O it needs
    ///
    /// Never writes to the registry.
    pub async fn reconcile(&self, build: &Build) -> Transition {
        match transition::plan(build, self.clock.now(), self.config.build_timeout) {
            Plan::Settle(next) => next,
            Plan::Submit { pod_id } => {
                let submission = self.submit(build, &pod_id).await;
                transition::on_submission(build, submission)
            }
            Plan::Inspect { pod_id } => {
                let observed = self.pods.get(&pod_id).await.map_err(|e| e.to_string());
                transition::on_inspection(build, observed)
            }
        }
    }

    async fn submit(&self, build: &Build, pod_id: &PodId) -> Submission {
        let Some(strategy) = self.strategies.get(&build.input.build_type) else {
            return Submission::NoStrategy;
        };
        match strategy.create_pod(build) {
            Ok(spec) => {
                tracing::debug!(build_id = %build.id, %pod_id, "submitting pod");
                Submission::Submitted(self.pods.create(&spec).await)
            }
            Err(e) => Submission::StrategyFailed(e.to_string()),
        }
    }

    /// Reconcile one build and persist the result if its status changed
    pub async fn sync(&self, mut build: Build) -> SyncOutcome {
        let next = self.reconcile(&build).await;

        if !next.changes(&build) {
            match &next.reason {
                Some(reason) if reason.is_transient() => {
                    tracing::warn!(
                        build_id = %build.id,
                        status = %build.status,
                        error = %reason,
                        "sync deferred"
                    );
                }
                _ => tracing::debug!(build_id = %build.id, status = %build.status, "no change"),
            }
            return SyncOutcome::Unchanged(next);
        }

        let from = build.status.clone();
        next.apply(&mut build);

        if let Err(e) = self.registry.update(&build).await {
            tracing::error!(
                build_id = %build.id,
                %from,
                to = %next.next,
                error = %e,
                "failed to persist transition"
            );
            return SyncOutcome::UpdateFailed(next);
        }

        match &next.reason {
            Some(reason) => tracing::info!(
                build_id = %build.id,
                %from,
                to = %next.next,
                reason = %reason,
                "build transitioned"
            ),
            None => tracing::info!(
                build_id = %build.id,
                %from,
                to = %next.next,
                pod_id = build.pod_id.as_ref().map(PodId::as_str).unwrap_or(""),
                "build transitioned"
            ),
        }
        SyncOutcome::Transitioned(next)
    }

    /// One pass over every build matching the selector
    pub async fn tick(&self) -> Result<TickReport, ControllerError> {
        let builds = self
            .registry
            .list(&self.config.selector)
            .await
            .map_err(ControllerError::List)?;

        let mut report = TickReport {
            listed: builds.len(),
            ..TickReport::default()
        };
        for build in builds {
            match self.sync(build).await {
                SyncOutcome::Unchanged(_) => report.unchanged += 1,
                SyncOutcome::Transitioned(_) => report.transitioned += 1,
                SyncOutcome::UpdateFailed(_) => report.update_failures += 1,
            }
        }
        Ok(report)
    }

    /// Tick on the configured period until cancelled
    ///
    /// Cancellation is observed between ticks; a tick in flight runs to
    /// completion. The first tick starts immediately.
    pub async fn run(&self, cancel: CancellationToken) {
        let period = self.config.tick_period.max(MIN_TICK_PERIOD);
        let mut interval = tokio::time::interval(period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        tracing::info!(
            tick_period_ms = period.as_millis() as u64,
            build_timeout_secs = self.config.build_timeout.as_secs(),
            selector = %self.config.selector,
            strategies = ?self.strategies.types(),
            "build controller started"
        );

        loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                _ = interval.tick() => {}
            }

            match self.tick().await {
                Ok(report) if report.transitioned > 0 || report.update_failures > 0 => {
                    tracing::info!(
                        listed = report.listed,
                        transitioned = report.transitioned,
                        update_failures = report.update_failures,
                        "tick complete"
                    );
                }
                Ok(report) => tracing::debug!(listed = report.listed, "tick complete"),
                Err(e) => tracing::error!(error = %e, "tick aborted"),
            }
        }

        tracing::info!("build controller stopped");
    }
}

#[cfg(test)]
#[path = "controller_tests.rs"]
mod tests;
