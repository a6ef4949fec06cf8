//! Durable queue of pending student-record mutations.
//!
//! The queue is a single JSON file rewritten whole on every change, same
//! as the cache partitions. Mutations carry a monotonically increasing id
//! so the backend can deduplicate replays.

use std::fs;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::SyncError;

/// Queue file name inside the sync directory
const QUEUE_FILE: &str = "pending_mutations.json";

/// A queued change awaiting replay to the backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PendingMutation {
    pub id: u64,
    pub body: serde_json::Value,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct QueueFile {
    next_id: u64,
    mutations: Vec<PendingMutation>,
}

pub struct MutationQueue {
    path: PathBuf,
}

impl MutationQueue {
    pub fn new(dir: PathBuf) -> Result<Self, SyncError> {
        fs::create_dir_all(&dir)?;
        Ok(Self {
            path: dir.join(QUEUE_FILE),
        })
    }

    fn load(&self) -> Result<QueueFile, SyncError> {
        if !self.path.exists() {
            return Ok(QueueFile::default());
        }
        let contents = fs::read_to_string(&self.path)?;
        Ok(serde_json::from_str(&contents)?)
    }

    fn save(&self, file: &QueueFile) -> Result<(), SyncError> {
        let contents = serde_json::to_string_pretty(file)?;
        fs::write(&self.path, contents)?;
        Ok(())
    }

    /// Append a mutation; it is on disk before this returns.
    pub fn push(&self, body: serde_json::Value) -> Result<PendingMutation, SyncError> {
        let mut file = self.load()?;
        let mutation = PendingMutation {
            id: file.next_id,
            body,
            created_at: Utc::now(),
        };
        file.next_id += 1;
        file.mutations.push(mutation.clone());
        self.save(&file)?;
        debug!(id = mutation.id, "Queued pending mutation");
        Ok(mutation)
    }

    /// All queued mutations, oldest first.
    pub fn all(&self) -> Result<Vec<PendingMutation>, SyncError> {
        Ok(self.load()?.mutations)
    }

    pub fn len(&self) -> Result<usize, SyncError> {
        Ok(self.load()?.mutations.len())
    }

    pub fn is_empty(&self) -> Result<bool, SyncError> {
        Ok(self.load()?.mutations.is_empty())
    }

    /// Drop every queued mutation. Only called after a fully successful
    /// replay; the id counter keeps advancing across clears.
    pub fn clear(&self) -> Result<(), SyncError> {
        let mut file = self.load()?;
        file.mutations.clear();
        self.save(&file)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_push_assigns_increasing_ids() {
        let dir = tempfile::tempdir().unwrap();
        let queue = MutationQueue::new(dir.path().to_path_buf()).unwrap();

        let a = queue.push(json!({"student_id": 7, "risk": "high"})).unwrap();
        let b = queue.push(json!({"student_id": 9, "risk": "low"})).unwrap();
        assert!(b.id > a.id);
        assert_eq!(queue.len().unwrap(), 2);
    }

    #[test]
    fn test_queue_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        {
            let queue = MutationQueue::new(dir.path().to_path_buf()).unwrap();
            queue.push(json!({"student_id": 7})).unwrap();
        }
        let queue = MutationQueue::new(dir.path().to_path_buf()).unwrap();
        let pending = queue.all().unwrap();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].body, json!({"student_id": 7}));
    }

    #[test]
    fn test_ids_keep_advancing_after_clear() {
        let dir = tempfile::tempdir().unwrap();
        let queue = MutationQueue::new(dir.path().to_path_buf()).unwrap();

        let first = queue.push(json!({})).unwrap();
        queue.clear().unwrap();
        assert!(queue.is_empty().unwrap());

        let second = queue.push(json!({})).unwrap();
        assert!(second.id > first.id);
    }
}
