//! JSON directory registry specs
//!
//! Verify the controller works against build records written as plain files.

use crate::prelude::*;

fn builds_dir(world: &World) -> std::path::PathBuf {
    world.registry.dir().to_path_buf()
}

#[tokio::test]
async fn hand_written_record_is_picked_up() {
    let world = World::new();
    let record = serde_json::json!({
        "id": "h1",
        "status": "new",
        "input": { "type": "T" },
        "creation_timestamp": world.clock.now().to_rfc3339(),
    });
    std::fs::write(builds_dir(&world).join("h1.json"), record.to_string()).unwrap();

    world.tick().await;

    let build = world.build("h1").await;
    assert_eq!(build.status, BuildStatus::Pending);
    assert_eq!(build.pod_id, Some(PodId::from("build-T-h1")));
}

#[tokio::test]
async fn status_is_persisted_as_lowercase_text() {
    let world = World::new();
    world.submit("b1", BuildInput::new("T")).await;
    world.ticks(2).await;

    let text = std::fs::read_to_string(builds_dir(&world).join("b1.json")).unwrap();
    let value: serde_json::Value = serde_json::from_str(&text).unwrap();

    assert_eq!(value["status"], "running");
    assert_eq!(value["pod_id"], "build-T-b1");
}

#[tokio::test]
async fn unknown_status_in_record_is_an_error() {
    let world = World::new();
    let record = serde_json::json!({
        "id": "h1",
        "status": "paused",
        "input": { "type": "T" },
        "pod_id": "build-T-h1",
        "creation_timestamp": world.clock.now().to_rfc3339(),
    });
    std::fs::write(builds_dir(&world).join("h1.json"), record.to_string()).unwrap();

    world.tick().await;

    let build = world.build("h1").await;
    assert_eq!(build.status, BuildStatus::Error);
    assert!(build.message.unwrap().contains("paused"));
}

#[tokio::test]
async fn corrupt_record_does_not_block_other_builds() {
    let world = World::new();
    std::fs::write(builds_dir(&world).join("broken.json"), "{ not json").unwrap();
    world.submit("b1", BuildInput::new("T")).await;

    let report = world.tick().await;

    assert_eq!(report.listed, 1);
    assert_eq!(world.status("b1").await, BuildStatus::Pending);
}
