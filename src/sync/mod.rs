//! Deferred synchronization of student-record mutations.
//!
//! Writes made while offline are queued durably on disk and replayed to
//! the backend sync endpoint when connectivity returns. Delivery is
//! at-least-once: the queue is cleared only after every replay succeeds,
//! so a partial failure leaves everything in place for the next trigger.
//! The backend deduplicates.

pub mod queue;
pub mod replay;

use thiserror::Error;

pub use queue::MutationQueue;
pub use replay::{SyncEngine, SYNC_TAG};

#[derive(Error, Debug)]
pub enum SyncError {
    #[error("Queue I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Corrupt queue data: {0}")]
    Corrupt(#[from] serde_json::Error),

    #[error("Replay incomplete: {failed} of {total} mutations not delivered")]
    ReplayFailed { failed: usize, total: usize },
}
