// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Daemon lifecycle management: startup and shutdown.

use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::PathBuf;
use std::time::Instant;

use fs2::FileExt;
use kiln_adapters::{
    DockerPodClient, JsonDirRegistry, RegistryError, TracedBuildRegistry, TracedPodClient,
};
use kiln_core::{
    BuildType, DockerStrategy, StiStrategy, StrategyError, StrategyTable, SystemClock,
    TempScratchDirs,
};
use kiln_engine::BuildController;
use thiserror::Error;
use tracing::{info, warn};

use crate::config::{Config, StrategiesConfig};

/// Lock file inside the registry directory; hidden so the registry skips it
pub const LOCK_FILE: &str = ".kilnd.lock";

/// Build controller with concrete adapter types (wrapped with tracing)
pub type DaemonController = BuildController<
    TracedBuildRegistry<JsonDirRegistry>,
    TracedPodClient<DockerPodClient>,
    SystemClock,
>;

/// Daemon state during operation
pub struct DaemonState {
    pub controller: DaemonController,
    lock_path: PathBuf,
    // NOTE(lifetime): Held to maintain exclusive file lock; released on drop
    #[allow(dead_code)]
    lock_file: File,
    pub start_time: Instant,
}

impl DaemonState {
    /// Release the registry lock
    pub fn shutdown(self) {
        info!(
            uptime_secs = self.start_time.elapsed().as_secs(),
            "Shutting down daemon..."
        );

        if self.lock_path.exists() {
            if let Err(e) = std::fs::remove_file(&self.lock_path) {
                warn!("Failed to remove lock file: {}", e);
            }
        }

        // Lock is released when self.lock_file is dropped
        info!("Daemon shutdown complete");
    }
}

/// Lifecycle errors
#[derive(Debug, Error)]
pub enum LifecycleError {
    #[error("Failed to acquire lock on {0}: another kilnd already running?")]
    LockFailed(PathBuf, #[source] std::io::Error),

    #[error("Invalid log path: {0}")]
    InvalidLogPath(PathBuf),

    #[error("Registry error: {0}")]
    Registry(#[from] RegistryError),

    #[error("Strategy error: {0}")]
    Strategy(#[from] StrategyError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Assemble the strategy table from the configured strategies
pub fn build_strategies(config: &StrategiesConfig) -> Result<StrategyTable, LifecycleError> {
    let mut table = StrategyTable::new();
    if let Some(docker) = &config.docker {
        table.register(
            BuildType::docker(),
            DockerStrategy::new(docker.builder_image.clone()),
        )?;
    }
    if let Some(sti) = &config.sti {
        let scratch = match &sti.scratch_root {
            Some(root) => TempScratchDirs::new(root.clone()),
            None => TempScratchDirs::system(),
        };
        table.register(
            BuildType::sti(),
            StiStrategy::new(sti.builder_image.clone(), scratch),
        )?;
    }
    Ok(table)
}

/// Start the daemon
///
/// Takes an exclusive lock on the registry directory before anything else,
/// so two daemons never reconcile the same builds.
pub fn startup(config: &Config) -> Result<DaemonState, LifecycleError> {
    // 1. Registry directory (also creates it)
    let registry = JsonDirRegistry::open(config.registry_dir.clone())?;

    // 2. Acquire lock file FIRST - prevents races
    let lock_path = config.registry_dir.join(LOCK_FILE);
    let mut lock_file = OpenOptions::new()
        .create(true)
        .truncate(false)
        .write(true)
        .open(&lock_path)?;
    lock_file
        .try_lock_exclusive()
        .map_err(|e| LifecycleError::LockFailed(lock_path.clone(), e))?;

    // Write PID to lock file
    lock_file.set_len(0)?;
    writeln!(lock_file, "{}", std::process::id())?;

    // 3. Strategies (fail fast on a bad table)
    let strategies = build_strategies(&config.strategies)?;

    // 4. Adapters (wrapped with tracing for observability)
    let controller = BuildController::new(
        TracedBuildRegistry::new(registry),
        TracedPodClient::new(DockerPodClient::new()),
        strategies,
        SystemClock,
        config.controller_config(),
    );

    info!(
        registry = %config.registry_dir.display(),
        "Daemon started"
    );

    Ok(DaemonState {
        controller,
        lock_path,
        lock_file,
        start_time: Instant::now(),
    })
}

#[cfg(test)]
#[path = "lifecycle_tests.rs"]
mod tests;
