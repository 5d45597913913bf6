// Path: crates/node/src/indexer.rs
//! Building the exact-match index from exported data files.

use hma_api::index::IndexStore;
use hma_api::object::ObjectStore;
use hma_storage::export::{decode_data_file, parse_data_file_key};
use hma_storage::Md5ExactIndex;
use hma_types::error::StoreError;

/// Reads every MD5 data file under `data_folder` and builds one index from them.
pub async fn build_md5_index<O: ObjectStore + ?Sized>(
    objects: &O,
    bucket: &str,
    data_folder: &str,
) -> Result<Md5ExactIndex, StoreError> {
    let mut records = Vec::new();
    let mut files = 0usize;
    for key in objects.list(bucket, data_folder).await? {
        let Some((collaboration, signal_type)) = parse_data_file_key(data_folder, &key) else {
            continue;
        };
        if !Md5ExactIndex::accepts(signal_type) {
            continue;
        }
        let Some(body) = objects.get(bucket, &key).await? else {
            // Listed but gone: replaced or deleted since the listing.
            continue;
        };
        let rows = decode_data_file(&body)?;
        tracing::debug!(target: "indexer", collaboration = %collaboration, key = %key, records = rows.len(), "read data file");
        records.extend(rows);
        files += 1;
    }
    let index = Md5ExactIndex::build(&records);
    tracing::info!(
        target: "indexer",
        files,
        records = records.len(),
        digests = index.len(),
        "built md5 index"
    );
    Ok(index)
}

/// Builds the index and saves it as the bucket's snapshot.
pub async fn rebuild<O, S>(
    objects: &O,
    snapshots: &S,
    bucket: &str,
    data_folder: &str,
) -> anyhow::Result<Md5ExactIndex>
where
    O: ObjectStore + ?Sized,
    S: IndexStore,
{
    let index = build_md5_index(objects, bucket, data_folder).await?;
    snapshots.save(&index, bucket).await?;
    Ok(index)
}

#[cfg(test)]
mod tests {
    use super::*;
    use hma_storage::export::{data_file_key, encode_data_file};
    use hma_storage::{InstrumentedIndexStore, MemoryObjectStore, SnapshotIndexStore};
    use hma_test_utils::fixtures::{md5_record, record};
    use hma_types::app::{CollaborationId, SignalType};
    use hma_types::error::SnapshotError;

    async fn has_snapshot<S: IndexStore>(snapshots: &S, bucket: &str) -> Result<bool, SnapshotError> {
        match snapshots.load::<Md5ExactIndex>(bucket).await {
            Ok(_) => Ok(true),
            Err(SnapshotError::NotFound { .. }) => Ok(false),
            Err(e) => Err(e),
        }
    }

    async fn put(objects: &MemoryObjectStore, collab: u64, t: SignalType, rows: &[hma_types::app::IndicatorRecord]) {
        objects
            .put(
                "b",
                &data_file_key("te/", CollaborationId(collab), t),
                encode_data_file(rows).unwrap(),
            )
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_rebuild_reads_md5_files_only() {
        let objects = MemoryObjectStore::new();
        put(&objects, 1, SignalType::VideoMd5, &[md5_record(1, "10", "aa"), md5_record(1, "11", "bb")]).await;
        put(&objects, 2, SignalType::VideoMd5, &[md5_record(2, "20", "aa")]).await;
        put(&objects, 1, SignalType::Pdq, &[record(1, "12", SignalType::Pdq, "ff00")]).await;
        objects.put("b", "te/README", b"not a data file".to_vec()).await.unwrap();

        let snapshots = InstrumentedIndexStore::new(SnapshotIndexStore::new(objects.clone()));
        assert!(!has_snapshot(&snapshots, "b").await.unwrap());

        let index = rebuild(&objects, &snapshots, "b", "te/").await.unwrap();
        assert_eq!(index.len(), 2);
        assert_eq!(index.query("aa").len(), 2);
        assert!(index.query("ff00").is_empty());

        assert!(has_snapshot(&snapshots, "b").await.unwrap());
        assert_eq!(snapshots.load::<Md5ExactIndex>("b").await.unwrap(), index);
    }

    #[tokio::test]
    async fn test_malformed_data_file_fails_rebuild() {
        let objects = MemoryObjectStore::new();
        objects
            .put("b", &data_file_key("te/", CollaborationId(1), SignalType::VideoMd5), b"{oops".to_vec())
            .await
            .unwrap();
        let snapshots = SnapshotIndexStore::new(objects.clone());
        assert!(rebuild(&objects, &snapshots, "b", "te/").await.is_err());
        assert!(!has_snapshot(&snapshots, "b").await.unwrap());
    }
}
