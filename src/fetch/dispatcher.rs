//! Dispatcher lifecycle and per-class fetch strategies.

use std::sync::Arc;

use reqwest::Url;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::net::{Network, NetworkError};
use crate::store::{is_current_partition, CacheStore, CachedResponse, PartitionKind};

use super::classify::{classify, is_navigation, should_intercept, RequestClass};
use super::error::DispatchError;
use super::request::FetchRequest;

/// Synthesized navigation fallback when the network is down and nothing
/// usable is cached. Served with a 200 so the browser renders it instead
/// of a native error page.
const OFFLINE_PAGE: &str = r#"<!DOCTYPE html>
<html>
  <head>
    <title>Counselling Dashboard - Offline</title>
    <meta charset="utf-8">
    <meta name="viewport" content="width=device-width, initial-scale=1">
  </head>
  <body>
    <h1>You're Offline</h1>
    <p>The counselling dashboard is currently unavailable. Please check your internet connection and try again.</p>
    <button onclick="window.location.reload()">Try Again</button>
  </body>
</html>
"#;

/// Outcome of dispatching one request.
#[derive(Debug)]
pub enum Dispatch {
    /// The dispatcher produced a response (cache, network, or fallback).
    Handled(CachedResponse),
    /// Non-GET or disallowed origin: the host performs the request itself;
    /// nothing is cached.
    PassThrough,
}

/// The fetch cache dispatcher. Store and network are injected so tests
/// can run against in-memory fakes; cloning shares both.
#[derive(Clone)]
pub struct Dispatcher {
    store: Arc<dyn CacheStore>,
    network: Arc<dyn Network>,
    config: Arc<Config>,
}

impl Dispatcher {
    pub fn new(store: Arc<dyn CacheStore>, network: Arc<dyn Network>, config: Config) -> Self {
        Self {
            store,
            network,
            config: Arc::new(config),
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    fn partition(&self, kind: PartitionKind) -> String {
        kind.partition_name(&self.config.version)
    }

    /// Install then activate, honoring the lifecycle ordering: install
    /// fully completes before activation, and no fetch for this version
    /// should be dispatched before `register` returns.
    pub async fn register(&self) -> Result<(), DispatchError> {
        self.install().await?;
        self.activate()?;
        Ok(())
    }

    /// Pre-cache the app-shell manifest into the static partition and
    /// initialize the other partitions. Any manifest asset failing to
    /// fetch fails the install as a whole; a previously active version
    /// stays in control.
    pub async fn install(&self) -> Result<(), DispatchError> {
        info!(version = %self.config.version, "Installing dispatcher");

        let origin: Url = self
            .config
            .origin
            .parse()
            .map_err(|_| DispatchError::BadManifest(self.config.origin.clone()))?;

        let static_partition = self.partition(PartitionKind::Static);
        self.store.open_partition(&static_partition)?;

        for path in &self.config.precache_manifest {
            let url = origin
                .join(path)
                .map_err(|_| DispatchError::BadManifest(path.clone()))?;
            let request = FetchRequest::get(url);

            let response = match self.network.fetch(&request).await {
                Ok(response) if response.ok() => response,
                Ok(response) => {
                    return Err(DispatchError::Precache {
                        path: path.clone(),
                        source: NetworkError::Unavailable(format!(
                            "status {} for pre-cache asset",
                            response.status
                        )),
                    })
                }
                Err(source) => {
                    return Err(DispatchError::Precache {
                        path: path.clone(),
                        source,
                    })
                }
            };

            self.store
                .put(&static_partition, &request.cache_key(), &response)?;
            debug!(path, "Pre-cached static asset");
        }

        self.store
            .open_partition(&self.partition(PartitionKind::Dynamic))?;
        self.store
            .open_partition(&self.partition(PartitionKind::Images))?;

        info!("Install complete");
        Ok(())
    }

    /// Delete every partition left over from older versions, then make
    /// sure the current partition set exists. Version migration is
    /// delete-all-mismatched; no entries are carried over.
    pub fn activate(&self) -> Result<(), DispatchError> {
        info!(version = %self.config.version, "Activating dispatcher");

        for partition in self.store.list_partitions()? {
            if !is_current_partition(&partition, &self.config.version) {
                info!(partition, "Deleting stale partition");
                self.store.delete_partition(&partition)?;
            }
        }

        for kind in [
            PartitionKind::Static,
            PartitionKind::Dynamic,
            PartitionKind::Images,
        ] {
            self.store.open_partition(&self.partition(kind))?;
        }

        info!("Activation complete");
        Ok(())
    }

    /// Dispatch one intercepted request. Non-GET and cross-origin
    /// requests pass through untouched. Navigation requests that exhaust
    /// every strategy get the offline fallback instead of an error.
    pub async fn fetch(&self, request: &FetchRequest) -> Result<Dispatch, DispatchError> {
        if !should_intercept(request, &self.config) {
            return Ok(Dispatch::PassThrough);
        }

        let class = classify(request, &self.config);
        debug!(url = %request.url, ?class, "Dispatching request");

        let result = match class {
            RequestClass::StaticAsset => {
                self.cache_first(request, PartitionKind::Static, None).await
            }
            RequestClass::Image => {
                self.cache_first(
                    request,
                    PartitionKind::Images,
                    Some(self.config.max_image_entries),
                )
                .await
            }
            RequestClass::Api | RequestClass::Default => self.network_first(request).await,
            RequestClass::Navigation => self.stale_while_revalidate(request).await,
        };

        match result {
            Ok(response) => Ok(Dispatch::Handled(response)),
            Err(err) if is_navigation(request) => {
                warn!(url = %request.url, error = %err, "Serving offline fallback");
                Ok(Dispatch::Handled(self.offline_fallback(request)))
            }
            Err(err) => Err(err),
        }
    }

    /// Cache-first: a hit returns without touching the network; a miss
    /// fetches, caches 2xx responses, and optionally trims the partition.
    async fn cache_first(
        &self,
        request: &FetchRequest,
        kind: PartitionKind,
        limit: Option<usize>,
    ) -> Result<CachedResponse, DispatchError> {
        let partition = self.partition(kind);
        let key = request.cache_key();

        if let Some(hit) = self.lookup(&partition, &key) {
            return Ok(hit);
        }

        let response = self.network.fetch(request).await?;
        if response.ok() {
            self.write_through(&partition, &key, &response, limit);
        }
        Ok(response)
    }

    /// Network-first: fetch, cache 2xx responses into the bounded dynamic
    /// partition, and fall back to a cached copy only on transport failure.
    async fn network_first(&self, request: &FetchRequest) -> Result<CachedResponse, DispatchError> {
        let partition = self.partition(PartitionKind::Dynamic);
        let key = request.cache_key();

        match self.network.fetch(request).await {
            Ok(response) => {
                if response.ok() {
                    self.write_through(
                        &partition,
                        &key,
                        &response,
                        Some(self.config.max_dynamic_entries),
                    );
                }
                Ok(response)
            }
            Err(err) => {
                debug!(url = %request.url, "Network failed, trying cache");
                match self.lookup(&partition, &key) {
                    Some(hit) => Ok(hit),
                    None => Err(err.into()),
                }
            }
        }
    }

    /// Stale-while-revalidate: serve the cached copy immediately and let
    /// a detached task refresh the partition for next time. Without a
    /// cached copy the caller waits on that same refresh.
    async fn stale_while_revalidate(
        &self,
        request: &FetchRequest,
    ) -> Result<CachedResponse, DispatchError> {
        let partition = self.partition(PartitionKind::Dynamic);
        let key = request.cache_key();

        let cached = self.lookup(&partition, &key);
        let refresh = self.spawn_refresh(request.clone(), partition, key);

        if let Some(hit) = cached {
            // Detached: the refresh task's result, error or not, is dropped.
            return Ok(hit);
        }

        match refresh.await {
            Ok(result) => result.map_err(Into::into),
            Err(join_err) => Err(DispatchError::Network(NetworkError::Unavailable(format!(
                "refresh task failed: {join_err}"
            )))),
        }
    }

    /// Background refresh for stale-while-revalidate. Failures are logged
    /// and otherwise discarded; only a caller with no cached copy awaits
    /// the handle.
    fn spawn_refresh(
        &self,
        request: FetchRequest,
        partition: String,
        key: String,
    ) -> JoinHandle<Result<CachedResponse, NetworkError>> {
        let network = Arc::clone(&self.network);
        let store = Arc::clone(&self.store);
        let limit = self.config.max_dynamic_entries;

        tokio::spawn(async move {
            match network.fetch(&request).await {
                Ok(response) => {
                    if response.ok() {
                        if let Err(err) = store.put(&partition, &key, &response) {
                            debug!(partition, error = %err, "Background cache write failed");
                        } else {
                            trim_partition(store.as_ref(), &partition, limit);
                        }
                    }
                    Ok(response)
                }
                Err(err) => {
                    debug!(url = %request.url, error = %err, "Background refresh failed");
                    Err(err)
                }
            }
        })
    }

    /// Cached root document if present, otherwise the synthesized
    /// offline page.
    fn offline_fallback(&self, request: &FetchRequest) -> CachedResponse {
        let static_partition = self.partition(PartitionKind::Static);
        if let Ok(root) = request.url.join("/") {
            let key = FetchRequest::get(root).cache_key();
            if let Some(hit) = self.lookup(&static_partition, &key) {
                return hit;
            }
        }

        CachedResponse::new(
            200,
            vec![("Content-Type".to_string(), "text/html".to_string())],
            OFFLINE_PAGE.as_bytes().to_vec(),
        )
    }

    /// Cache read with the cache-unavailable policy applied: any storage
    /// error is logged and treated as a miss.
    fn lookup(&self, partition: &str, key: &str) -> Option<CachedResponse> {
        match self.store.get(partition, key) {
            Ok(hit) => hit,
            Err(err) => {
                debug!(partition, key, error = %err, "Cache read failed, treating as miss");
                None
            }
        }
    }

    /// Cache write plus optional FIFO trim. Write failures cost only
    /// freshness, never the response, so they are logged and swallowed.
    fn write_through(
        &self,
        partition: &str,
        key: &str,
        response: &CachedResponse,
        limit: Option<usize>,
    ) {
        if let Err(err) = self.store.put(partition, key, response) {
            warn!(partition, key, error = %err, "Cache write failed");
            return;
        }
        if let Some(max) = limit {
            trim_partition(self.store.as_ref(), partition, max);
        }
    }
}

/// FIFO eviction: delete oldest-inserted keys until the partition holds at
/// most `max` entries. Access recency is deliberately ignored; only a
/// fresh write protects an entry. A concurrent write landing mid-scan may
/// make the pass slightly imprecise, which the substrate contract accepts.
fn trim_partition(store: &dyn CacheStore, partition: &str, max: usize) {
    match store.len(partition) {
        Ok(count) if count <= max => return,
        Ok(_) => {}
        Err(err) => {
            debug!(partition, error = %err, "Eviction scan failed");
            return;
        }
    }

    let keys = match store.keys(partition) {
        Ok(keys) => keys,
        Err(err) => {
            debug!(partition, error = %err, "Eviction scan failed");
            return;
        }
    };

    let excess = keys.len().saturating_sub(max);
    for key in keys.into_iter().take(excess) {
        if let Err(err) = store.delete(partition, &key) {
            debug!(partition, key, error = %err, "Eviction delete failed");
        }
    }
}
