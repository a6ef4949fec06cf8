//! Network boundary for the dispatcher.
//!
//! The `Network` trait is the only place the crate touches the wire.
//! Transport failure is the single error kind; a non-2xx status is an
//! ordinary response the caller simply will not cache. Tests substitute
//! `FakeNetwork` to script failures and count calls.

pub mod http;

#[cfg(test)]
pub mod fake;

use futures::future::BoxFuture;
use thiserror::Error;

use crate::fetch::FetchRequest;
use crate::store::CachedResponse;

pub use http::HttpNetwork;

#[derive(Error, Debug)]
pub enum NetworkError {
    #[error("Network error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Network unavailable: {0}")]
    Unavailable(String),
}

/// Performs a request and yields the captured response.
///
/// Object-safe so the dispatcher can hold `Arc<dyn Network>` and spawn
/// detached refresh tasks against it.
pub trait Network: Send + Sync {
    fn fetch<'a>(
        &'a self,
        request: &'a FetchRequest,
    ) -> BoxFuture<'a, Result<CachedResponse, NetworkError>>;
}
