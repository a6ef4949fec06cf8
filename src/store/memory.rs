//! In-memory cache store for tests and ephemeral use.

use std::collections::HashMap;
use std::sync::Mutex;

use super::{CacheStore, CachedResponse, StoreError};

/// Insertion-ordered entries for one partition.
type Partition = Vec<(String, CachedResponse)>;

/// In-memory `CacheStore`. Entries live in a `Vec` per partition so that
/// insertion order falls out for free; partition sizes are small enough
/// (<= 100 entries) that linear scans are fine.
#[derive(Default)]
pub struct MemoryStore {
    partitions: Mutex<HashMap<String, Partition>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, Partition>> {
        // A poisoned lock means a panicking test; propagating the data is
        // still safe since every write is a full entry replacement.
        self.partitions
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl CacheStore for MemoryStore {
    fn open_partition(&self, partition: &str) -> Result<(), StoreError> {
        self.lock().entry(partition.to_string()).or_default();
        Ok(())
    }

    fn get(&self, partition: &str, key: &str) -> Result<Option<CachedResponse>, StoreError> {
        let partitions = self.lock();
        Ok(partitions
            .get(partition)
            .and_then(|entries| entries.iter().find(|(k, _)| k == key))
            .map(|(_, response)| response.clone()))
    }

    fn put(
        &self,
        partition: &str,
        key: &str,
        response: &CachedResponse,
    ) -> Result<(), StoreError> {
        let mut partitions = self.lock();
        let entries = partitions.entry(partition.to_string()).or_default();
        // A rewrite counts as a fresh insertion: drop the old position.
        entries.retain(|(k, _)| k != key);
        entries.push((key.to_string(), response.clone()));
        Ok(())
    }

    fn delete(&self, partition: &str, key: &str) -> Result<bool, StoreError> {
        let mut partitions = self.lock();
        if let Some(entries) = partitions.get_mut(partition) {
            let before = entries.len();
            entries.retain(|(k, _)| k != key);
            return Ok(entries.len() < before);
        }
        Ok(false)
    }

    fn keys(&self, partition: &str) -> Result<Vec<String>, StoreError> {
        let partitions = self.lock();
        Ok(partitions
            .get(partition)
            .map(|entries| entries.iter().map(|(k, _)| k.clone()).collect())
            .unwrap_or_default())
    }

    fn len(&self, partition: &str) -> Result<usize, StoreError> {
        let partitions = self.lock();
        Ok(partitions.get(partition).map(Vec::len).unwrap_or(0))
    }

    fn list_partitions(&self) -> Result<Vec<String>, StoreError> {
        let partitions = self.lock();
        let mut names: Vec<String> = partitions.keys().cloned().collect();
        names.sort();
        Ok(names)
    }

    fn delete_partition(&self, partition: &str) -> Result<bool, StoreError> {
        Ok(self.lock().remove(partition).is_some())
    }
}
