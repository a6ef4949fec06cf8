//! Cache partition substrate.
//!
//! Partitions are named, isolated key -> response maps. Three kinds exist
//! (static app shell, dynamic pages/API responses, images), each named
//! `{base}-{kind}` so that bumping the base version invalidates every old
//! partition at activation time.
//!
//! The `CacheStore` trait keeps the substrate injectable: `MemoryStore`
//! backs deterministic tests, `DiskStore` persists partitions as JSON
//! files under the cache directory.

pub mod disk;
pub mod memory;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use disk::DiskStore;
pub use memory::MemoryStore;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Corrupt partition data: {0}")]
    Corrupt(#[from] serde_json::Error),
}

/// The three partition kinds a dispatcher manages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PartitionKind {
    Static,
    Dynamic,
    Images,
}

impl PartitionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            PartitionKind::Static => "static",
            PartitionKind::Dynamic => "dynamic",
            PartitionKind::Images => "images",
        }
    }

    /// Full partition name for a given version base, e.g. `app-v1-static`
    pub fn partition_name(&self, base: &str) -> String {
        format!("{}-{}", base, self.as_str())
    }
}

/// Partitions not carrying the current version prefix are stale and get
/// deleted during activation.
pub fn is_current_partition(name: &str, base: &str) -> bool {
    name.starts_with(base)
}

/// A captured HTTP response: status, headers, body, and when it was stored.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CachedResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
    pub stored_at: DateTime<Utc>,
}

impl CachedResponse {
    pub fn new(status: u16, headers: Vec<(String, String)>, body: Vec<u8>) -> Self {
        Self {
            status,
            headers,
            body,
            stored_at: Utc::now(),
        }
    }

    /// True for 2xx statuses; only these are ever written into a partition.
    pub fn ok(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn body_text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

/// Storage backend for cache partitions.
///
/// Implementations must preserve per-partition insertion order (`keys`
/// returns oldest first) and treat a `put` to an existing key as a fresh
/// insertion, moving it to the back. Every write is a full replacement of
/// the keyed entry; last writer wins.
pub trait CacheStore: Send + Sync {
    /// Ensure a partition exists (idempotent).
    fn open_partition(&self, partition: &str) -> Result<(), StoreError>;

    fn get(&self, partition: &str, key: &str) -> Result<Option<CachedResponse>, StoreError>;

    fn put(&self, partition: &str, key: &str, response: &CachedResponse)
        -> Result<(), StoreError>;

    /// Remove one entry. Returns whether it existed.
    fn delete(&self, partition: &str, key: &str) -> Result<bool, StoreError>;

    /// Keys in insertion order, oldest first.
    fn keys(&self, partition: &str) -> Result<Vec<String>, StoreError>;

    fn len(&self, partition: &str) -> Result<usize, StoreError>;

    fn list_partitions(&self) -> Result<Vec<String>, StoreError>;

    /// Remove a whole partition. Returns whether it existed.
    fn delete_partition(&self, partition: &str) -> Result<bool, StoreError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partition_naming() {
        assert_eq!(
            PartitionKind::Static.partition_name("app-v2"),
            "app-v2-static"
        );
        assert_eq!(
            PartitionKind::Images.partition_name("app-v2"),
            "app-v2-images"
        );
    }

    #[test]
    fn test_stale_partition_detection() {
        assert!(is_current_partition("app-v2-static", "app-v2"));
        assert!(!is_current_partition("app-v1-static", "app-v2"));
        assert!(!is_current_partition("other-dynamic", "app-v2"));
    }

    #[test]
    fn test_cached_response_ok_range() {
        assert!(CachedResponse::new(200, vec![], vec![]).ok());
        assert!(CachedResponse::new(204, vec![], vec![]).ok());
        assert!(!CachedResponse::new(304, vec![], vec![]).ok());
        assert!(!CachedResponse::new(404, vec![], vec![]).ok());
        assert!(!CachedResponse::new(500, vec![], vec![]).ok());
    }

    #[test]
    fn test_header_lookup_is_case_insensitive() {
        let response = CachedResponse::new(
            200,
            vec![("Content-Type".to_string(), "text/html".to_string())],
            vec![],
        );
        assert_eq!(response.header("content-type"), Some("text/html"));
        assert_eq!(response.header("x-missing"), None);
    }
}
