//! Activity pipeline against the file backend

mod common;

use chrono::Duration;
use std::sync::Arc;

use common::{at, file_storage};
use pingboard::activity::ActivityError;
use pingboard::storage::{CallbackId, StorageConfig, StorageFactory};
use pingboard::testing::{EventBuilder, FailingStorage, TestContext};

#[tokio::test]
async fn test_reference_window_grid() {
    let (storage, _dir) = file_storage().await;
    let ctx = TestContext::with_storage(storage, at(10, 20, 37));

    let table = ctx.activity.activity(&CallbackId::from("cb")).await.unwrap();

    let stamps: Vec<_> = table.rows().iter().map(|r| r.timestamp).collect();
    let expected: Vec<_> = (0..=20).map(|m| at(10, m, 0)).collect();
    assert_eq!(stamps, expected);
}

#[tokio::test]
async fn test_pings_count_into_their_minute() {
    let (storage, _dir) = file_storage().await;
    let ctx = TestContext::with_storage(storage, at(10, 5, 12));
    let callback = ctx.callbacks.create("deploys").await.unwrap();

    ctx.callbacks.record_call(&callback.id, Some("ok")).await.unwrap();
    ctx.clock.set(at(10, 5, 48));
    ctx.callbacks.record_call(&callback.id, Some("ok")).await.unwrap();
    ctx.clock.set(at(10, 5, 50));
    ctx.callbacks.record_call(&callback.id, Some("error")).await.unwrap();

    ctx.clock.set(at(10, 20, 37));
    let table = ctx.activity.activity(&callback.id).await.unwrap();

    assert_eq!(table.columns(), &["error".to_string(), "ok".to_string()]);
    for row in table.rows() {
        let expected: &[u64] = if row.timestamp == at(10, 5, 0) { &[1, 2] } else { &[0, 0] };
        assert_eq!(row.counts(), expected, "row {}", row.timestamp);
    }
}

#[tokio::test]
async fn test_quiet_callback_has_no_columns() {
    let (storage, _dir) = file_storage().await;
    let ctx = TestContext::with_storage(storage, at(10, 20, 37));
    let callback = ctx.callbacks.create("quiet").await.unwrap();

    let table = ctx.activity.activity(&callback.id).await.unwrap();

    assert_eq!(table.rows().len(), 21);
    assert!(table.columns().is_empty());
    assert_eq!(table.total(), 0);
}

#[tokio::test]
async fn test_rename_then_aggregate_keeps_events() {
    let (storage, _dir) = file_storage().await;
    let ctx = TestContext::with_storage(storage, at(10, 10, 0));
    let callback = ctx.callbacks.create("old name").await.unwrap();

    for i in 0..5 {
        ctx.clock.set(at(10, 10 + i, 30));
        ctx.callbacks.record_call(&callback.id, Some("ok")).await.unwrap();
    }

    ctx.clock.set(at(10, 20, 37));
    let before = ctx.activity.activity(&callback.id).await.unwrap();
    ctx.callbacks.rename(&callback.id, "new name").await.unwrap();
    let after = ctx.activity.activity(&callback.id).await.unwrap();

    assert_eq!(before, after);
    assert_eq!(after.total(), 5);
    assert_eq!(ctx.callbacks.get(&callback.id).await.unwrap().display_name, "new name");
}

#[tokio::test]
async fn test_window_slides_with_the_clock() {
    let (storage, _dir) = file_storage().await;
    let ctx = TestContext::with_storage(storage.clone(), at(10, 0, 0));
    let id = CallbackId::from("cb");

    for event in EventBuilder::new(id.clone())
        .repeated(at(10, 0, 0), Duration::minutes(1), 30, "ok")
        .build()
    {
        storage.event_storage().append(event).await.unwrap();
    }

    ctx.clock.set(at(10, 20, 37));
    assert_eq!(ctx.activity.activity(&id).await.unwrap().total(), 21);

    ctx.clock.set(at(10, 29, 5));
    let table = ctx.activity.activity(&id).await.unwrap();
    assert_eq!(table.rows()[0].timestamp, at(10, 9, 0));
    assert_eq!(table.total(), 21);
    assert!(table.rows().iter().all(|row| row.counts() == [1]));
}

#[tokio::test]
async fn test_deleted_callback_keeps_activity() {
    let (storage, _dir) = file_storage().await;
    let ctx = TestContext::with_storage(storage, at(10, 15, 0));
    let callback = ctx.callbacks.create("short lived").await.unwrap();
    ctx.callbacks.record_call(&callback.id, None).await.unwrap();

    ctx.callbacks.delete(&callback.id).await.unwrap();

    assert!(matches!(
        ctx.callbacks.get(&callback.id).await,
        Err(ActivityError::NotFound(_))
    ));
    let table = ctx.activity.activity(&callback.id).await.unwrap();
    assert_eq!(table.count(at(10, 15, 0), "(unknown)"), Some(1));
}

#[tokio::test]
async fn test_events_survive_reopening_the_store() {
    let (storage, dir) = file_storage().await;
    let ctx = TestContext::with_storage(storage, at(10, 12, 0));
    let callback = ctx.callbacks.create("persistent").await.unwrap();
    ctx.callbacks.record_call(&callback.id, Some("ok")).await.unwrap();
    drop(ctx);

    let reopened = StorageFactory::from_config(&StorageConfig::file(dir.path()))
        .await
        .unwrap();
    let ctx = TestContext::with_storage(reopened, at(10, 20, 37));

    assert_eq!(
        ctx.callbacks.get(&callback.id).await.unwrap().display_name,
        "persistent"
    );
    let table = ctx.activity.activity(&callback.id).await.unwrap();
    assert_eq!(table.count(at(10, 12, 0), "ok"), Some(1));
}

#[tokio::test]
async fn test_concurrent_pings_are_all_counted() {
    let (storage, _dir) = file_storage().await;
    let ctx = Arc::new(TestContext::with_storage(storage, at(10, 7, 0)));
    let id = CallbackId::from("busy");

    let tasks: Vec<_> = (0..50)
        .map(|i| {
            let ctx = ctx.clone();
            let id = id.clone();
            tokio::spawn(async move {
                let status = if i % 5 == 0 { "error" } else { "ok" };
                ctx.callbacks.record_call(&id, Some(status)).await.unwrap();
            })
        })
        .collect();
    futures::future::join_all(tasks).await;

    ctx.clock.set(at(10, 20, 37));
    let table = ctx.activity.activity(&id).await.unwrap();
    assert_eq!(table.count(at(10, 7, 0), "ok"), Some(40));
    assert_eq!(table.count(at(10, 7, 0), "error"), Some(10));
}

#[tokio::test]
async fn test_unreachable_store() {
    let ctx = TestContext::with_storage(Arc::new(FailingStorage), at(10, 20, 37));

    let err = ctx.activity.activity(&CallbackId::from("cb")).await.unwrap_err();
    assert!(err.is_transient());
}
