// Path: crates/storage/src/object/fs.rs
use super::validate_location;
use async_trait::async_trait;
use hma_api::object::ObjectStore;
use hma_types::error::StoreError;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

const PARTIAL_SUFFIX: &str = ".partial";

/// Filesystem-backed object store: one directory per bucket under `root`,
/// keys map to relative paths.
///
/// Each write goes to its own uniquely named `.partial` sibling and is renamed
/// into place, so readers never observe a half-written object. Concurrent
/// writers to one key never share a temp file; the last rename wins.
#[derive(Debug, Clone)]
pub struct FsObjectStore {
    root: PathBuf,
}

fn backend(e: std::io::Error) -> StoreError {
    StoreError::Backend(e.to_string())
}

impl FsObjectStore {
    pub fn new(root: impl AsRef<Path>) -> Result<Self, StoreError> {
        let root = root.as_ref().to_path_buf();
        std::fs::create_dir_all(&root).map_err(backend)?;
        Ok(Self { root })
    }

    fn object_path(&self, bucket: &str, key: &str) -> Result<PathBuf, StoreError> {
        validate_location(bucket, key)?;
        let mut path = self.root.join(bucket);
        for seg in key.split('/') {
            path.push(seg);
        }
        Ok(path)
    }
}

#[async_trait]
impl ObjectStore for FsObjectStore {
    async fn put(&self, bucket: &str, key: &str, body: Vec<u8>) -> Result<(), StoreError> {
        let path = self.object_path(bucket, key)?;
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await.map_err(backend)?;
        }
        let Some(parent) = path.parent().map(Path::to_path_buf) else {
            return Err(StoreError::InvalidKey(key.to_string()));
        };
        tokio::task::spawn_blocking(move || {
            let mut tmp = tempfile::Builder::new()
                .prefix(".")
                .suffix(PARTIAL_SUFFIX)
                .tempfile_in(&parent)
                .map_err(backend)?;
            tmp.write_all(&body).map_err(backend)?;
            tmp.as_file().sync_all().map_err(backend)?;
            tmp.persist(&path).map_err(|e| backend(e.error))?;
            Ok(())
        })
        .await
        .map_err(|e| StoreError::Backend(e.to_string()))?
    }

    async fn get(&self, bucket: &str, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
        let path = self.object_path(bucket, key)?;
        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(backend(e)),
        }
    }

    async fn list(&self, bucket: &str, prefix: &str) -> Result<Vec<String>, StoreError> {
        let bucket_dir = self.root.join(bucket);
        let mut keys = Vec::new();
        let mut pending = vec![bucket_dir.clone()];
        while let Some(dir) = pending.pop() {
            let mut entries = match tokio::fs::read_dir(&dir).await {
                Ok(entries) => entries,
                Err(e) if e.kind() == ErrorKind::NotFound => continue,
                Err(e) => return Err(backend(e)),
            };
            while let Some(entry) = entries.next_entry().await.map_err(backend)? {
                let path = entry.path();
                if entry.file_type().await.map_err(backend)?.is_dir() {
                    pending.push(path);
                    continue;
                }
                let Ok(rel) = path.strip_prefix(&bucket_dir) else {
                    continue;
                };
                let key = rel
                    .components()
                    .map(|c| c.as_os_str().to_string_lossy())
                    .collect::<Vec<_>>()
                    .join("/");
                if !key.ends_with(PARTIAL_SUFFIX) && key.starts_with(prefix) {
                    keys.push(key);
                }
            }
        }
        keys.sort();
        Ok(keys)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_put_get_overwrite() {
        let dir = tempdir().unwrap();
        let store = FsObjectStore::new(dir.path()).unwrap();

        assert_eq!(store.get("b", "index/x.index").await.unwrap(), None);
        store.put("b", "index/x.index", vec![1, 2]).await.unwrap();
        store.put("b", "index/x.index", vec![3]).await.unwrap();
        assert_eq!(store.get("b", "index/x.index").await.unwrap(), Some(vec![3]));

        // Same key, other bucket.
        assert_eq!(store.get("c", "index/x.index").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_concurrent_puts_to_one_key() {
        let dir = tempdir().unwrap();
        let store = FsObjectStore::new(dir.path()).unwrap();
        let bodies: Vec<Vec<u8>> = (0..16u8).map(|i| vec![i; 256 * 1024]).collect();

        let writers: Vec<_> = bodies
            .iter()
            .cloned()
            .map(|body| {
                let store = store.clone();
                tokio::spawn(async move { store.put("b", "index/x.index", body).await })
            })
            .collect();
        for writer in writers {
            writer.await.unwrap().unwrap();
        }

        // Exactly one writer's body, never a mix, and no temp files left behind.
        let stored = store.get("b", "index/x.index").await.unwrap().unwrap();
        assert!(bodies.contains(&stored));
        assert_eq!(store.list("b", "").await.unwrap(), vec!["index/x.index"]);
        let leftovers = std::fs::read_dir(dir.path().join("b").join("index"))
            .unwrap()
            .count();
        assert_eq!(leftovers, 1);
    }

    #[tokio::test]
    async fn test_list_by_prefix() {
        let dir = tempdir().unwrap();
        let store = FsObjectStore::new(dir.path()).unwrap();
        store.put("b", "data/1.pdq.te", vec![]).await.unwrap();
        store.put("b", "data/1.video_md5.te", vec![]).await.unwrap();
        store.put("b", "index/a.index", vec![]).await.unwrap();

        let keys = store.list("b", "data/").await.unwrap();
        assert_eq!(keys, vec!["data/1.pdq.te", "data/1.video_md5.te"]);
        assert!(store.list("missing", "").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_escaping_keys_are_rejected() {
        let dir = tempdir().unwrap();
        let store = FsObjectStore::new(dir.path()).unwrap();
        let err = store.put("b", "../../etc/passwd", vec![]).await.unwrap_err();
        assert!(matches!(err, StoreError::InvalidKey(_)));
    }
}
