// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use kiln_core::{BuildInput, BuildStatus};

fn build(id: &str) -> Build {
    Build::new(
        id,
        BuildInput::new("sti").with_source("https://git.example/app.git", "main"),
        chrono::Utc::now(),
    )
}

#[tokio::test]
async fn create_then_list() {
    let dir = tempfile::tempdir().unwrap();
    let registry = JsonDirRegistry::open(dir.path()).unwrap();

    registry.create(&build("b2")).await.unwrap();
    registry.create(&build("b1").with_label("team", "web")).await.unwrap();

    let all = registry.list(&Selector::everything()).await.unwrap();
    let ids: Vec<&str> = all.iter().map(|b| b.id.0.as_str()).collect();
    assert_eq!(ids, vec!["b1", "b2"]);

    let web = registry
        .list(&Selector::from_pairs([("team", "web")]))
        .await
        .unwrap();
    assert_eq!(web.len(), 1);
    assert!(dir.path().join("b1.json").is_file());
}

#[tokio::test]
async fn update_rewrites_existing_record() {
    let dir = tempfile::tempdir().unwrap();
    let registry = JsonDirRegistry::open(dir.path()).unwrap();
    let mut b1 = build("b1");
    registry.create(&b1).await.unwrap();

    b1.status = BuildStatus::Pending;
    b1.pod_id = Some(b1.derived_pod_id());
    registry.update(&b1).await.unwrap();

    let stored = registry.get(&BuildId::from("b1")).await.unwrap();
    assert_eq!(stored, b1);
    assert!(!dir.path().join(".b1.json.tmp").exists());
}

#[tokio::test]
async fn update_of_missing_record_fails() {
    let dir = tempfile::tempdir().unwrap();
    let registry = JsonDirRegistry::open(dir.path()).unwrap();

    let result = registry.update(&build("ghost")).await;
    assert!(matches!(result, Err(RegistryError::NotFound(_))));
    assert!(!dir.path().join("ghost.json").exists());
}

#[tokio::test]
async fn duplicate_create_fails() {
    let dir = tempfile::tempdir().unwrap();
    let registry = JsonDirRegistry::open(dir.path()).unwrap();
    registry.create(&build("b1")).await.unwrap();

    let result = registry.create(&build("b1")).await;
    assert!(matches!(result, Err(RegistryError::AlreadyExists(_))));
}

#[tokio::test]
async fn corrupt_and_foreign_files_are_skipped() {
    let dir = tempfile::tempdir().unwrap();
    let registry = JsonDirRegistry::open(dir.path()).unwrap();
    registry.create(&build("good")).await.unwrap();
    std::fs::write(dir.path().join("bad.json"), b"{ not json").unwrap();
    std::fs::write(dir.path().join("notes.txt"), b"hello").unwrap();
    std::fs::write(dir.path().join(".hidden.json.tmp"), b"{}").unwrap();

    let all = registry.list(&Selector::everything()).await.unwrap();
    assert_eq!(all.len(), 1);
    assert_eq!(all[0].id.0, "good");

    let result = registry.get(&BuildId::from("bad")).await;
    assert!(matches!(result, Err(RegistryError::Corrupt { .. })));
}

#[tokio::test]
async fn path_like_ids_are_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let registry = JsonDirRegistry::open(dir.path()).unwrap();

    for id in ["../escape", "a/b", ".hidden", ""] {
        let result = registry.create(&build(id)).await;
        assert!(
            matches!(result, Err(RegistryError::InvalidId(_))),
            "id {:?} should be rejected",
            id
        );
    }
}

#[tokio::test]
async fn records_written_by_hand_are_readable() {
    let dir = tempfile::tempdir().unwrap();
    let registry = JsonDirRegistry::open(dir.path()).unwrap();
    std::fs::write(
        dir.path().join("manual.json"),
        r#"{
            "id": "manual",
            "status": "new",
            "input": { "type": "docker", "source_uri": "https://git.example/app.git" },
            "creation_timestamp": "2026-05-01T00:00:00Z"
        }"#,
    )
    .unwrap();

    let builds = registry.list(&Selector::everything()).await.unwrap();
    assert_eq!(builds.len(), 1);
    assert_eq!(builds[0].status, BuildStatus::New);
    assert_eq!(builds[0].input.source_uri, "https://git.example/app.git");
}
