//! Failure path specs
//!
//! Verify how builds end up Failed or Error, and that terminal builds stay put.

use crate::prelude::*;
use similar_asserts::assert_eq;

#[tokio::test]
async fn unknown_build_type_is_an_error_and_never_submitted() {
    let world = World::new();
    world.submit("b1", BuildInput::new("buildpack")).await;

    world.ticks(2).await;

    let build = world.build("b1").await;
    assert_eq!(build.status, BuildStatus::Error);
    assert!(build.message.unwrap().contains("buildpack"));
    assert_eq!(world.pods.create_count(), 0);
}

#[tokio::test]
async fn missing_required_input_fails_the_build() {
    let world = World::new();
    world
        .submit(
            "d1",
            BuildInput::new(BuildType::docker()).with_image("app:1.0", ""),
        )
        .await;

    world.ticks(2).await;

    let build = world.build("d1").await;
    assert_eq!(build.status, BuildStatus::Failed);
    assert!(build.message.unwrap().contains("source_uri"));
    assert_eq!(world.pods.create_count(), 0);
}

#[tokio::test]
async fn rejected_submission_fails_the_build() {
    let world = World::new();
    world.submit("b1", BuildInput::new("T")).await;
    world.pods.set_create_failure(Some("admission denied"));

    world.ticks(2).await;

    let build = world.build("b1").await;
    assert_eq!(build.status, BuildStatus::Failed);
    assert!(build.message.unwrap().contains("admission denied"));
}

#[tokio::test]
async fn nonzero_exit_fails_naming_the_container() {
    let world = World::new();
    world.submit("b1", BuildInput::new("T")).await;
    world.ticks(2).await;

    world.pods.finish(
        "build-T-b1",
        vec![
            ContainerExit::new("fetch", 0),
            ContainerExit::new("compile", 137),
        ],
    );
    world.tick().await;

    let build = world.build("b1").await;
    assert_eq!(build.status, BuildStatus::Failed);
    assert_eq!(
        build.message.as_deref(),
        Some("container compile exited with code 137")
    );
}

#[tokio::test]
async fn running_build_past_timeout_fails() {
    let world = World::new();
    world.submit("b1", BuildInput::new("T")).await;
    world.ticks(2).await;

    world.clock.advance(TIMEOUT + Duration::from_secs(1));
    world.tick().await;

    let build = world.build("b1").await;
    assert_eq!(build.status, BuildStatus::Failed);
    assert!(build.message.unwrap().contains("timed out"));
}

#[tokio::test]
async fn fetch_errors_leave_running_build_untouched() {
    let world = World::new();
    world.submit("b1", BuildInput::new("T")).await;
    world.ticks(2).await;
    let before = world.build("b1").await;

    world.pods.set_get_failure(Some("substrate unavailable"));
    let report = world.tick().await;

    assert_eq!(report.unchanged, 1);
    assert_eq!(world.build("b1").await, before);
}

#[tokio::test]
async fn existing_pod_keeps_build_pending() {
    let world = World::new();
    world.submit("b1", BuildInput::new("T")).await;
    world.tick().await;

    // A pod with the build's id already exists on the substrate
    let pending = world.build("b1").await;
    let spec = PodSpec {
        id: pending.pod_id.clone().unwrap(),
        labels: Default::default(),
        containers: vec![ContainerSpec::new("main", "kiln/generic")],
        volumes: vec![],
        restart_policy: RestartPolicy::Never,
    };
    world.pods.create(&spec).await;

    world.tick().await;

    assert_eq!(world.build("b1").await, pending);
}

#[tokio::test]
async fn terminal_builds_are_never_rewritten() {
    let world = World::new();
    world.submit("ok", BuildInput::new("T")).await;
    world.submit("bad", BuildInput::new("T")).await;
    world.submit("err", BuildInput::new("nope")).await;
    world.ticks(2).await;
    world
        .pods
        .finish("build-T-ok", vec![ContainerExit::new("main", 0)]);
    world
        .pods
        .finish("build-T-bad", vec![ContainerExit::new("main", 2)]);
    world.tick().await;

    let snapshot = (
        world.build("ok").await,
        world.build("bad").await,
        world.build("err").await,
    );
    assert_eq!(snapshot.0.status, BuildStatus::Complete);
    assert_eq!(snapshot.1.status, BuildStatus::Failed);
    assert_eq!(snapshot.2.status, BuildStatus::Error);

    let calls_before = world.pods.calls().len();
    world.clock.advance(Duration::from_secs(86_400));
    let report = world.tick().await;

    assert_eq!(report.transitioned, 0);
    assert_eq!(report.unchanged, 3);
    assert_eq!(world.pods.calls().len(), calls_before);
    assert_eq!(
        (
            world.build("ok").await,
            world.build("bad").await,
            world.build("err").await,
        ),
        snapshot
    );
}

#[tokio::test]
async fn repeated_sti_conflicts_reuse_one_scratch_directory() {
    let world = World::new();
    world.submit("s1", sti_input()).await;
    world.tick().await;
    assert_eq!(world.status("s1").await, BuildStatus::Pending);

    // A pod from a lost status write already holds the build's id
    let existing = PodSpec {
        id: PodId::from("build-sti-s1"),
        labels: Default::default(),
        containers: vec![ContainerSpec::new("sti-build", "kiln/sti-builder")],
        volumes: vec![],
        restart_policy: RestartPolicy::Never,
    };
    world.pods.create(&existing).await;

    world.ticks(5).await;

    assert_eq!(world.status("s1").await, BuildStatus::Pending);
    let scratch_dirs = std::fs::read_dir(world.scratch_root()).unwrap().count();
    assert_eq!(scratch_dirs, 1);
}
