//! The fetch cache dispatcher.
//!
//! Intercepts outbound GET requests, classifies each by path and mode,
//! and serves it from one of three versioned cache partitions according
//! to a per-class strategy:
//!
//! - static assets: cache-first
//! - images: cache-first with a bounded partition
//! - API calls and everything unclassified: network-first
//! - navigations: stale-while-revalidate, with an offline HTML fallback
//!   when every other avenue fails
//!
//! Lifecycle is install (pre-cache the app shell), activate (garbage-
//! collect partitions from older versions), then one `fetch` call per
//! intercepted request.

pub mod classify;
pub mod dispatcher;
pub mod error;
pub mod request;

pub use dispatcher::{Dispatch, Dispatcher};
pub use request::FetchRequest;
