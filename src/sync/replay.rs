//! Replay of queued mutations to the backend sync endpoint.

use std::sync::Arc;

use reqwest::{Method, Url};
use tracing::{debug, info, warn};

use crate::fetch::FetchRequest;
use crate::net::Network;

use super::{MutationQueue, SyncError};

/// Sync trigger tag this engine responds to; other tags are ignored.
pub const SYNC_TAG: &str = "student-data-sync";

pub struct SyncEngine {
    queue: MutationQueue,
    network: Arc<dyn Network>,
    endpoint: Url,
}

impl SyncEngine {
    pub fn new(queue: MutationQueue, network: Arc<dyn Network>, endpoint: Url) -> Self {
        Self {
            queue,
            network,
            endpoint,
        }
    }

    pub fn queue(&self) -> &MutationQueue {
        &self.queue
    }

    /// Entry point for reconnect/sync triggers. Returns the number of
    /// mutations delivered; an unrecognized tag delivers nothing.
    pub async fn on_sync(&self, tag: &str) -> Result<usize, SyncError> {
        if tag != SYNC_TAG {
            debug!(tag, "Ignoring sync trigger with unknown tag");
            return Ok(0);
        }
        self.replay().await
    }

    /// POST each queued mutation individually to the sync endpoint. The
    /// queue is cleared only when every replay succeeded; any failure
    /// leaves the whole queue intact for the next trigger, so delivery is
    /// at-least-once and the backend must deduplicate.
    pub async fn replay(&self) -> Result<usize, SyncError> {
        let pending = self.queue.all()?;
        if pending.is_empty() {
            debug!("No pending mutations to replay");
            return Ok(0);
        }

        let total = pending.len();
        let mut failed = 0usize;

        for mutation in &pending {
            let body = serde_json::to_vec(&mutation.body)?;
            let request = FetchRequest::new(Method::POST, self.endpoint.clone())
                .with_header("Content-Type", "application/json")
                .with_body(body);

            match self.network.fetch(&request).await {
                Ok(response) if response.ok() => {
                    debug!(id = mutation.id, "Replayed mutation");
                }
                Ok(response) => {
                    warn!(id = mutation.id, status = response.status, "Replay rejected");
                    failed += 1;
                }
                Err(err) => {
                    warn!(id = mutation.id, error = %err, "Replay failed");
                    failed += 1;
                }
            }
        }

        if failed > 0 {
            return Err(SyncError::ReplayFailed { failed, total });
        }

        self.queue.clear()?;
        info!(delivered = total, "Sync replay complete");
        Ok(total)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::net::fake::FakeNetwork;
    use serde_json::json;

    fn engine(network: Arc<FakeNetwork>) -> (SyncEngine, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let queue = MutationQueue::new(dir.path().to_path_buf()).unwrap();
        let endpoint: Url = "http://localhost:5173/api/students/sync".parse().unwrap();
        (SyncEngine::new(queue, network, endpoint), dir)
    }

    #[tokio::test]
    async fn test_replay_posts_each_mutation_and_clears_queue() {
        let network = Arc::new(FakeNetwork::new());
        network.default_ok("{}");
        let (engine, _dir) = engine(network.clone());
        engine.queue().push(json!({"student_id": 1})).unwrap();
        engine.queue().push(json!({"student_id": 2})).unwrap();

        let delivered = engine.on_sync(SYNC_TAG).await.unwrap();
        assert_eq!(delivered, 2);
        assert_eq!(network.calls(), 2);
        assert!(engine.queue().is_empty().unwrap());

        let bodies = network.request_bodies();
        assert!(bodies[0].contains("\"student_id\":1"));
        assert!(bodies[1].contains("\"student_id\":2"));
    }

    #[tokio::test]
    async fn test_partial_failure_keeps_queue_intact() {
        let network = Arc::new(FakeNetwork::new());
        network.push_ok("{}");
        network.push_fail();
        let (engine, _dir) = engine(network.clone());
        engine.queue().push(json!({"student_id": 1})).unwrap();
        engine.queue().push(json!({"student_id": 2})).unwrap();

        let err = engine.replay().await.unwrap_err();
        assert!(matches!(
            err,
            SyncError::ReplayFailed { failed: 1, total: 2 }
        ));
        // Never drop a mutation silently: both stay queued for retry.
        assert_eq!(engine.queue().len().unwrap(), 2);
    }

    #[tokio::test]
    async fn test_unknown_tag_is_ignored() {
        let network = Arc::new(FakeNetwork::new());
        let (engine, _dir) = engine(network.clone());
        engine.queue().push(json!({"student_id": 1})).unwrap();

        let delivered = engine.on_sync("weekly-report").await.unwrap();
        assert_eq!(delivered, 0);
        assert_eq!(network.calls(), 0);
        assert_eq!(engine.queue().len().unwrap(), 1);
    }

    #[tokio::test]
    async fn test_empty_queue_replay_is_a_noop() {
        let network = Arc::new(FakeNetwork::new());
        let (engine, _dir) = engine(network.clone());
        assert_eq!(engine.replay().await.unwrap(), 0);
        assert_eq!(network.calls(), 0);
    }
}
