//! Durable cache store backed by one JSON file per partition.
//!
//! Each partition is serialized as an insertion-ordered list of
//! `(key, response)` entries and rewritten whole on every mutation.
//! Partitions are capped at ~100 entries, so whole-file rewrites stay cheap.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use tracing::debug;

use super::{CacheStore, CachedResponse, StoreError};

type Entries = Vec<(String, CachedResponse)>;

pub struct DiskStore {
    root: PathBuf,
    // Serializes read-modify-write cycles within this process; across
    // processes the last full-file writer wins, which the substrate permits.
    io: Mutex<()>,
}

impl DiskStore {
    pub fn new(root: PathBuf) -> Result<Self, StoreError> {
        fs::create_dir_all(&root)?;
        Ok(Self {
            root,
            io: Mutex::new(()),
        })
    }

    fn partition_path(&self, partition: &str) -> PathBuf {
        self.root.join(format!("{}.json", partition))
    }

    fn load_entries(&self, path: &Path) -> Result<Entries, StoreError> {
        if !path.exists() {
            return Ok(Vec::new());
        }
        let contents = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&contents)?)
    }

    fn save_entries(&self, path: &Path, entries: &Entries) -> Result<(), StoreError> {
        let contents = serde_json::to_string(entries)?;
        fs::write(path, contents)?;
        Ok(())
    }

    fn guard(&self) -> std::sync::MutexGuard<'_, ()> {
        self.io.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl CacheStore for DiskStore {
    fn open_partition(&self, partition: &str) -> Result<(), StoreError> {
        let _guard = self.guard();
        let path = self.partition_path(partition);
        if !path.exists() {
            self.save_entries(&path, &Vec::new())?;
            debug!(partition, "Created partition file");
        }
        Ok(())
    }

    fn get(&self, partition: &str, key: &str) -> Result<Option<CachedResponse>, StoreError> {
        let _guard = self.guard();
        let entries = self.load_entries(&self.partition_path(partition))?;
        Ok(entries
            .into_iter()
            .find(|(k, _)| k == key)
            .map(|(_, response)| response))
    }

    fn put(
        &self,
        partition: &str,
        key: &str,
        response: &CachedResponse,
    ) -> Result<(), StoreError> {
        let _guard = self.guard();
        let path = self.partition_path(partition);
        let mut entries = self.load_entries(&path)?;
        entries.retain(|(k, _)| k != key);
        entries.push((key.to_string(), response.clone()));
        self.save_entries(&path, &entries)
    }

    fn delete(&self, partition: &str, key: &str) -> Result<bool, StoreError> {
        let _guard = self.guard();
        let path = self.partition_path(partition);
        let mut entries = self.load_entries(&path)?;
        let before = entries.len();
        entries.retain(|(k, _)| k != key);
        if entries.len() == before {
            return Ok(false);
        }
        self.save_entries(&path, &entries)?;
        Ok(true)
    }

    fn keys(&self, partition: &str) -> Result<Vec<String>, StoreError> {
        let _guard = self.guard();
        let entries = self.load_entries(&self.partition_path(partition))?;
        Ok(entries.into_iter().map(|(k, _)| k).collect())
    }

    fn len(&self, partition: &str) -> Result<usize, StoreError> {
        let _guard = self.guard();
        Ok(self.load_entries(&self.partition_path(partition))?.len())
    }

    fn list_partitions(&self) -> Result<Vec<String>, StoreError> {
        let _guard = self.guard();
        let mut names = Vec::new();
        for entry in fs::read_dir(&self.root)? {
            let entry = entry?;
            let file_name = entry.file_name();
            let file_name = file_name.to_string_lossy();
            if let Some(name) = file_name.strip_suffix(".json") {
                names.push(name.to_string());
            }
        }
        names.sort();
        Ok(names)
    }

    fn delete_partition(&self, partition: &str) -> Result<bool, StoreError> {
        let _guard = self.guard();
        let path = self.partition_path(partition);
        if !path.exists() {
            return Ok(false);
        }
        fs::remove_file(path)?;
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn response(body: &str) -> CachedResponse {
        CachedResponse::new(200, vec![], body.as_bytes().to_vec())
    }

    #[test]
    fn test_entries_survive_reopen() {
        let dir = tempfile::tempdir().unwrap();
        {
            let store = DiskStore::new(dir.path().to_path_buf()).unwrap();
            store.put("app-v1-static", "GET /", &response("shell")).unwrap();
        }
        let store = DiskStore::new(dir.path().to_path_buf()).unwrap();
        let hit = store.get("app-v1-static", "GET /").unwrap().unwrap();
        assert_eq!(hit.body_text(), "shell");
        assert_eq!(hit.status, 200);
    }

    #[test]
    fn test_insertion_order_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        {
            let store = DiskStore::new(dir.path().to_path_buf()).unwrap();
            store.put("p", "a", &response("1")).unwrap();
            store.put("p", "b", &response("2")).unwrap();
            store.put("p", "a", &response("1b")).unwrap();
        }
        let store = DiskStore::new(dir.path().to_path_buf()).unwrap();
        assert_eq!(store.keys("p").unwrap(), vec!["b", "a"]);
    }

    #[test]
    fn test_list_and_delete_partitions() {
        let dir = tempfile::tempdir().unwrap();
        let store = DiskStore::new(dir.path().to_path_buf()).unwrap();
        store.open_partition("app-v1-static").unwrap();
        store.open_partition("app-v1-images").unwrap();
        assert_eq!(
            store.list_partitions().unwrap(),
            vec!["app-v1-images", "app-v1-static"]
        );
        assert!(store.delete_partition("app-v1-images").unwrap());
        assert!(!store.delete_partition("app-v1-images").unwrap());
        assert_eq!(store.list_partitions().unwrap(), vec!["app-v1-static"]);
    }

    #[test]
    fn test_missing_partition_reads_as_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = DiskStore::new(dir.path().to_path_buf()).unwrap();
        assert!(store.get("nope", "k").unwrap().is_none());
        assert_eq!(store.len("nope").unwrap(), 0);
        assert!(store.keys("nope").unwrap().is_empty());
    }
}
