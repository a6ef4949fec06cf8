//! reqwest-backed `Network` implementation.

use std::time::Duration;

use futures::future::BoxFuture;
use reqwest::Client;
use tracing::debug;

use crate::fetch::FetchRequest;
use crate::store::CachedResponse;

use super::{Network, NetworkError};

/// HTTP request timeout in seconds.
/// A request that outlives this is treated as a network failure so the
/// fallback path can run instead of hanging the caller.
const REQUEST_TIMEOUT_SECS: u64 = 30;

/// HTTP network client.
/// Clone is cheap - reqwest::Client uses Arc internally for connection pooling.
#[derive(Clone)]
pub struct HttpNetwork {
    client: Client,
}

impl HttpNetwork {
    pub fn new() -> Result<Self, NetworkError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?;
        Ok(Self { client })
    }
}

impl Network for HttpNetwork {
    fn fetch<'a>(
        &'a self,
        request: &'a FetchRequest,
    ) -> BoxFuture<'a, Result<CachedResponse, NetworkError>> {
        Box::pin(async move {
            let mut builder = self
                .client
                .request(request.method.clone(), request.url.clone());
            for (name, value) in &request.headers {
                builder = builder.header(name, value);
            }
            if let Some(body) = &request.body {
                builder = builder.body(body.clone());
            }

            let response = builder.send().await?;
            let status = response.status().as_u16();
            let headers = response
                .headers()
                .iter()
                .map(|(name, value)| {
                    (
                        name.to_string(),
                        String::from_utf8_lossy(value.as_bytes()).into_owned(),
                    )
                })
                .collect();
            let body = response.bytes().await?.to_vec();

            debug!(url = %request.url, status, bytes = body.len(), "Network fetch complete");
            Ok(CachedResponse::new(status, headers, body))
        })
    }
}
