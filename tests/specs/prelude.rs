//! Shared world for behavioral specs

#![allow(dead_code)]

pub use kiln_adapters::{FakePodClient, JsonDirRegistry, PodCall, PodClient};
pub use kiln_core::{
    Build, BuildId, BuildInput, BuildStatus, BuildType, Clock, ContainerExit, ContainerSpec,
    DockerStrategy, FakeClock, PodId, PodSpec, RestartPolicy, StiStrategy, StrategyError,
    StrategyTable, TempScratchDirs,
};
pub use kiln_engine::{BuildController, ControllerConfig, TickReport};
pub use std::time::Duration;

use std::collections::BTreeMap;
use tempfile::TempDir;

pub const TIMEOUT: Duration = Duration::from_secs(600);

/// Strategy for the generic `T` build type: one container, no inputs required
fn single_container(build: &Build) -> Result<PodSpec, StrategyError> {
    let id = build
        .pod_id
        .clone()
        .ok_or_else(|| StrategyError::Other("no pod id".to_string()))?;
    Ok(PodSpec {
        id,
        labels: BTreeMap::new(),
        containers: vec![ContainerSpec::new("main", "kiln/generic")],
        volumes: vec![],
        restart_policy: RestartPolicy::Never,
    })
}

/// A registry directory, a fake substrate, a frozen clock, and a controller over them
pub struct World {
    pub dir: TempDir,
    pub registry: JsonDirRegistry,
    pub pods: FakePodClient,
    pub clock: FakeClock,
    pub controller: BuildController<JsonDirRegistry, FakePodClient, FakeClock>,
}

impl World {
    pub fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let registry = JsonDirRegistry::open(dir.path().join("builds")).unwrap();
        let pods = FakePodClient::new();
        let clock = FakeClock::new();

        let strategies = StrategyTable::new()
            .with("T", single_container)
            .unwrap()
            .with(BuildType::docker(), DockerStrategy::new("kiln/docker-builder"))
            .unwrap()
            .with(
                BuildType::sti(),
                StiStrategy::new(
                    "kiln/sti-builder",
                    TempScratchDirs::new(dir.path().join("scratch")),
                ),
            )
            .unwrap();

        let controller = BuildController::new(
            registry.clone(),
            pods.clone(),
            strategies,
            clock.clone(),
            ControllerConfig {
                tick_period: Duration::from_millis(10),
                build_timeout: TIMEOUT,
                ..ControllerConfig::default()
            },
        );

        Self {
            dir,
            registry,
            pods,
            clock,
            controller,
        }
    }

    /// Record a new build created now
    pub async fn submit(&self, id: &str, input: BuildInput) -> Build {
        let build = Build::new(id, input, self.clock.now());
        self.registry.create(&build).await.unwrap();
        build
    }

    pub async fn tick(&self) -> TickReport {
        self.controller.tick().await.unwrap()
    }

    pub async fn ticks(&self, n: usize) {
        for _ in 0..n {
            self.tick().await;
        }
    }

    pub async fn build(&self, id: &str) -> Build {
        self.registry.get(&BuildId::from(id)).await.unwrap()
    }

    pub async fn status(&self, id: &str) -> BuildStatus {
        self.build(id).await.status
    }

    pub fn scratch_root(&self) -> std::path::PathBuf {
        self.dir.path().join("scratch")
    }
}

/// A docker build with every required input filled in
pub fn docker_input() -> BuildInput {
    BuildInput::new(BuildType::docker())
        .with_source("https://example.com/app.git", "main")
        .with_image("app:1.0", "registry.example.com")
}

/// An STI build with every required input filled in
pub fn sti_input() -> BuildInput {
    BuildInput::new(BuildType::sti())
        .with_source("https://example.com/app.git", "v2")
        .with_image("app:2.0", "registry.example.com")
        .with_builder_image("kiln/ruby-20")
}
