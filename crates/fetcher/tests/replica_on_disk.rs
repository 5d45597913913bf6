// Path: crates/fetcher/tests/replica_on_disk.rs
//! Runs against the redb and filesystem backends, including replay after a
//! crash between apply and advance.

use hma_api::index::IndexStore;
use hma_api::indicators::IndicatorStore;
use hma_api::metadata::CheckpointStore;
use hma_api::object::ObjectStore;
use hma_fetcher::{DeltaEngine, SyncContext};
use hma_storage::export::{data_file_key, decode_data_file};
use hma_storage::{
    DataFileExporter, FsObjectStore, Md5ExactIndex, RedbCheckpointStore, RedbIndicatorStore,
    SnapshotIndexStore,
};
use hma_test_utils::feed::ScriptedFeedClient;
use hma_test_utils::fixtures::{collaboration, collaboration_config};
use hma_test_utils::hooks::RecordingPostApply;
use hma_test_utils::randomness::TestRng;
use hma_types::app::{Checkpoint, CheckpointKey, Cursor, SignalType};
use hma_types::config::FetcherConfig;
use std::sync::Arc;
use tempfile::tempdir;

const APP_ID: u64 = 9;

#[tokio::test]
async fn test_run_exports_data_files_for_indexing() {
    let dir = tempdir().unwrap();
    let mut config = FetcherConfig::with_bucket("hma-data");
    config.page_size = 16;

    let c = collaboration(2001);
    let mut rng = TestRng::new(3);
    let feed = Arc::new(ScriptedFeedClient::new(APP_ID).with_updates(c.id, rng.update_stream(100, 30)));
    let objects = Arc::new(FsObjectStore::new(dir.path().join("objects")).unwrap());
    let indicators = Arc::new(RedbIndicatorStore::open(dir.path().join("indicators.redb")).unwrap());
    let exporter = DataFileExporter::new(
        indicators.clone(),
        objects.clone(),
        config.bucket.clone(),
        config.data_folder.clone(),
        config.supported_signal_types.iter().copied(),
    );
    let ctx = SyncContext::new(
        &config,
        feed,
        Arc::new(RedbCheckpointStore::open(dir.path().join("checkpoints.redb")).unwrap()),
        indicators.clone(),
        Arc::new(exporter),
    )
    .with_clock(|| 1_700_000_000);

    let report = ctx
        .run(&vec![collaboration_config("2001", "Disk Collab")])
        .await
        .unwrap();
    assert!(report.is_success());

    let key = data_file_key(&config.data_folder, c.id, SignalType::VideoMd5);
    let body = objects.get("hma-data", &key).await.unwrap().unwrap();
    let exported = decode_data_file(&body).unwrap();
    assert_eq!(exported, indicators.records(c.id).await.unwrap());
    assert!(!exported.is_empty());

    // The exported file is enough to build and persist a queryable index.
    let index = Md5ExactIndex::build(&exported);
    let snapshots = SnapshotIndexStore::new(objects.as_ref().clone());
    snapshots.save(&index, "hma-data").await.unwrap();
    let loaded: Md5ExactIndex = snapshots.load("hma-data").await.unwrap();
    let sample = &exported[0];
    assert!(loaded
        .query(&sample.value)
        .iter()
        .any(|e| e.indicator_id == sample.indicator_id));
}

#[tokio::test]
async fn test_replay_after_crash_converges() {
    let dir = tempdir().unwrap();
    let c = collaboration(7);
    let mut rng = TestRng::new(11);
    let feed = ScriptedFeedClient::new(APP_ID).with_updates(c.id, rng.update_stream(60, 12));
    let engine = DeltaEngine::new(25, 1_000, SignalType::ALL);
    let hook = RecordingPostApply::new();
    let checkpoints = RedbCheckpointStore::open(dir.path().join("checkpoints.redb")).unwrap();
    let key = CheckpointKey::new(c.id, APP_ID);
    checkpoints.put(&Checkpoint::at_origin(key, 0)).await.unwrap();
    let start = checkpoints.get(&key).await.unwrap().unwrap();

    let replica = RedbIndicatorStore::open(dir.path().join("a.redb")).unwrap();
    let out = engine.fetch(&c, &start, &feed).await;
    assert_eq!(out.delta.end, Some(Cursor(60)));

    // Crash after apply: the checkpoint never advanced, so the next run
    // fetches and applies the same delta again.
    engine.apply(&c, &out.delta, &replica, &hook).await.unwrap();
    let once = replica.records(c.id).await.unwrap();
    let again = engine.fetch(&c, &start, &feed).await;
    assert_eq!(again.delta, out.delta);
    engine.apply(&c, &again.delta, &replica, &hook).await.unwrap();
    assert_eq!(replica.records(c.id).await.unwrap(), once);

    // A fresh replica fed the same delta reaches the same state.
    let fresh = RedbIndicatorStore::open(dir.path().join("b.redb")).unwrap();
    engine.apply(&c, &out.delta, &fresh, &hook).await.unwrap();
    assert_eq!(fresh.records(c.id).await.unwrap(), once);
}
