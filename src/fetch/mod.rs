//! Network fetch layer shared by every archiver
//!
//! This module contains:
//! - HTTP client construction and the borrowed-or-local client scope
//! - The retry executor with fault classification and exponential backoff
//! - The bounded concurrent fetcher that preserves input order
//! - Linked-page retrieval with content-type and size guards

mod client;
mod page;
mod pool;
mod retry;

pub use client::{build_http_client, get_bytes, get_json, ClientScope, FetchedBody, HttpConfig};
pub use page::{fetch_linked_page, LINKED_PAGE_TIMEOUT, MAX_LINKED_PAGE_BYTES};
pub use pool::fetch_ordered;
pub use retry::{with_retry, RetryPolicy, Retryable};

/// Knobs every archiver run receives from the orchestrator
#[derive(Debug, Clone)]
pub struct FetchOptions {
    /// Worker-pool size; at most this many units are in flight
    pub max_workers: usize,

    pub retry: RetryPolicy,

    /// Settings for clients created locally when none is supplied
    pub http: HttpConfig,
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self {
            max_workers: 8,
            retry: RetryPolicy::default(),
            http: HttpConfig::default(),
        }
    }
}
