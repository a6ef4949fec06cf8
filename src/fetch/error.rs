use thiserror::Error;

use crate::net::NetworkError;
use crate::store::StoreError;

#[derive(Error, Debug)]
pub enum DispatchError {
    #[error("Request failed: {0}")]
    Network(#[from] NetworkError),

    #[error("Pre-cache failed for {path}: {source}")]
    Precache {
        path: String,
        source: NetworkError,
    },

    #[error("Invalid pre-cache manifest entry: {0}")]
    BadManifest(String),

    #[error("Cache storage error: {0}")]
    Store(#[from] StoreError),
}
