//! Run loop specs
//!
//! Verify the periodic loop drives builds on its own and stops when cancelled.

use crate::prelude::*;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

async fn wait_for(world: &World, id: &str, status: BuildStatus) {
    for _ in 0..500 {
        if world.status(id).await == status {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("{} never reached {}", id, status);
}

#[tokio::test]
async fn loop_completes_build_and_stops_on_cancel() {
    let world = Arc::new(World::new());
    world.submit("b1", BuildInput::new("T")).await;
    let cancel = CancellationToken::new();

    let handle = tokio::spawn({
        let world = Arc::clone(&world);
        let cancel = cancel.clone();
        async move { world.controller.run(cancel).await }
    });

    wait_for(&world, "b1", BuildStatus::Running).await;
    world
        .pods
        .finish("build-T-b1", vec![ContainerExit::new("main", 0)]);
    wait_for(&world, "b1", BuildStatus::Complete).await;

    cancel.cancel();
    tokio::time::timeout(Duration::from_secs(5), handle)
        .await
        .unwrap()
        .unwrap();

    // Builds submitted after shutdown are left alone
    world.submit("b2", BuildInput::new("T")).await;
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(world.status("b2").await, BuildStatus::New);
}

#[tokio::test]
async fn loop_survives_unreadable_records() {
    let world = Arc::new(World::new());
    std::fs::write(world.registry.dir().join("junk.json"), b"\x00\x01").unwrap();
    world.submit("b1", BuildInput::new("T")).await;
    let cancel = CancellationToken::new();

    let handle = tokio::spawn({
        let world = Arc::clone(&world);
        let cancel = cancel.clone();
        async move { world.controller.run(cancel).await }
    });

    wait_for(&world, "b1", BuildStatus::Running).await;
    cancel.cancel();
    tokio::time::timeout(Duration::from_secs(5), handle)
        .await
        .unwrap()
        .unwrap();
}
