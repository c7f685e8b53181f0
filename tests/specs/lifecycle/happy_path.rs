//! Happy path specs
//!
//! Verify builds advance New → Pending → Running → Complete, one step per tick.

use crate::prelude::*;

#[tokio::test]
async fn build_advances_one_status_per_tick() {
    let world = World::new();
    world.submit("b1", BuildInput::new("T")).await;

    world.tick().await;
    let build = world.build("b1").await;
    assert_eq!(build.status, BuildStatus::Pending);
    assert_eq!(build.pod_id, Some(PodId::from("build-T-b1")));

    world.tick().await;
    assert_eq!(world.status("b1").await, BuildStatus::Running);

    world
        .pods
        .finish("build-T-b1", vec![ContainerExit::new("main", 0)]);
    world.tick().await;

    let build = world.build("b1").await;
    assert_eq!(build.status, BuildStatus::Complete);
    assert_eq!(build.pod_id, Some(PodId::from("build-T-b1")));
    assert_eq!(build.message, None);
}

#[tokio::test]
async fn build_stays_running_while_pod_is_live() {
    let world = World::new();
    world.submit("b1", BuildInput::new("T")).await;
    world.ticks(2).await;

    for _ in 0..5 {
        world.clock.advance(Duration::from_secs(60));
        world.tick().await;
        assert_eq!(world.status("b1").await, BuildStatus::Running);
    }
}

#[tokio::test]
async fn docker_build_runs_privileged_builder_with_docker_socket() {
    let world = World::new();
    world.submit("d1", docker_input()).await;
    world.ticks(2).await;

    assert_eq!(world.status("d1").await, BuildStatus::Running);
    let pod = world.pods.get_pod("build-docker-d1").unwrap();
    assert_eq!(pod.spec.restart_policy, RestartPolicy::Never);
    assert_eq!(pod.spec.labels.get("build").map(String::as_str), Some("d1"));

    let container = &pod.spec.containers[0];
    assert_eq!(container.image, "kiln/docker-builder");
    assert!(container.privileged);
    assert_eq!(container.env_value("BUILD_TAG"), Some("app:1.0"));
    assert_eq!(
        container.env_value("DOCKER_CONTEXT_URL"),
        Some("https://example.com/app.git")
    );
    assert_eq!(
        container.env_value("DOCKER_REGISTRY"),
        Some("registry.example.com")
    );
    assert!(pod
        .spec
        .volumes
        .iter()
        .any(|v| v.host_path == std::path::Path::new("/var/run/docker.sock")));
}

#[tokio::test]
async fn sti_build_gets_its_own_scratch_directory() {
    let world = World::new();
    world.submit("s1", sti_input()).await;
    world.ticks(2).await;

    assert_eq!(world.status("s1").await, BuildStatus::Running);
    let pod = world.pods.get_pod("build-sti-s1").unwrap();
    let container = &pod.spec.containers[0];
    assert_eq!(container.name, "sti-build");
    assert_eq!(container.image, "kiln/sti-builder");
    assert_eq!(container.env_value("SOURCE_REF"), Some("v2"));
    assert_eq!(container.env_value("BUILDER_IMAGE"), Some("kiln/ruby-20"));

    let scratch = pod.spec.volume("scratch").unwrap();
    assert!(scratch.host_path.starts_with(world.scratch_root()));
    assert!(scratch.host_path.is_dir());
}

#[tokio::test]
async fn many_builds_progress_independently() {
    let world = World::new();
    world.submit("a", BuildInput::new("T")).await;
    world.submit("b", BuildInput::new("T")).await;
    world.ticks(2).await;
    world.submit("c", BuildInput::new("T")).await;

    world
        .pods
        .finish("build-T-a", vec![ContainerExit::new("main", 0)]);
    world
        .pods
        .finish("build-T-b", vec![ContainerExit::new("main", 1)]);
    world.tick().await;

    assert_eq!(world.status("a").await, BuildStatus::Complete);
    assert_eq!(world.status("b").await, BuildStatus::Failed);
    assert_eq!(world.status("c").await, BuildStatus::Pending);
}
