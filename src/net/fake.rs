//! Scripted network double for dispatcher and sync tests.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use futures::future::BoxFuture;

use crate::fetch::FetchRequest;
use crate::store::CachedResponse;

use super::{Network, NetworkError};

/// One scripted outcome for the next fetch call.
pub enum FakeOutcome {
    Ok(CachedResponse),
    Fail,
}

/// Network double that replays a scripted queue of outcomes and records
/// every request it sees. When the script runs dry it keeps returning
/// the last behavior configured via `default_ok`, or fails.
#[derive(Default)]
pub struct FakeNetwork {
    script: Mutex<VecDeque<FakeOutcome>>,
    calls: AtomicUsize,
    requested: Mutex<Vec<String>>,
    request_bodies: Mutex<Vec<String>>,
    default_body: Mutex<Option<String>>,
}

impl FakeNetwork {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_ok(&self, body: &str) {
        self.script.lock().unwrap().push_back(FakeOutcome::Ok(
            CachedResponse::new(200, vec![], body.as_bytes().to_vec()),
        ));
    }

    pub fn push_response(&self, response: CachedResponse) {
        self.script
            .lock()
            .unwrap()
            .push_back(FakeOutcome::Ok(response));
    }

    pub fn push_fail(&self) {
        self.script.lock().unwrap().push_back(FakeOutcome::Fail);
    }

    /// Answer every unscripted call with a 200 and this body.
    pub fn default_ok(&self, body: &str) {
        *self.default_body.lock().unwrap() = Some(body.to_string());
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn requested(&self) -> Vec<String> {
        self.requested.lock().unwrap().clone()
    }

    /// Bodies of requests that carried one, in call order.
    pub fn request_bodies(&self) -> Vec<String> {
        self.request_bodies.lock().unwrap().clone()
    }
}

impl Network for FakeNetwork {
    fn fetch<'a>(
        &'a self,
        request: &'a FetchRequest,
    ) -> BoxFuture<'a, Result<CachedResponse, NetworkError>> {
        Box::pin(async move {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.requested
                .lock()
                .unwrap()
                .push(format!("{} {}", request.method, request.url));
            if let Some(body) = &request.body {
                self.request_bodies
                    .lock()
                    .unwrap()
                    .push(String::from_utf8_lossy(body).into_owned());
            }

            let scripted = self.script.lock().unwrap().pop_front();
            match scripted {
                Some(FakeOutcome::Ok(response)) => Ok(response),
                Some(FakeOutcome::Fail) => Err(NetworkError::Unavailable(
                    "simulated network failure".to_string(),
                )),
                None => match self.default_body.lock().unwrap().as_deref() {
                    Some(body) => Ok(CachedResponse::new(
                        200,
                        vec![],
                        body.as_bytes().to_vec(),
                    )),
                    None => Err(NetworkError::Unavailable(
                        "no scripted response".to_string(),
                    )),
                },
            }
        })
    }
}
