//! Linked-page retrieval
//!
//! Stories and feed entries often point at a full article. Fetching it is
//! optional enrichment: only HTML responses are kept, and bodies above
//! [`MAX_LINKED_PAGE_BYTES`] are abandoned while streaming rather than
//! buffered whole.

use crate::fetch::client::{content_type_of, send_get};
use crate::fetch::retry::{with_retry, RetryPolicy};
use crate::{InkfeedError, Result};
use reqwest::Client;
use std::time::Duration;
use tracing::debug;

/// Linked pages larger than this are discarded
pub const MAX_LINKED_PAGE_BYTES: usize = 2 * 1024 * 1024;

/// Per-request timeout for linked pages
pub const LINKED_PAGE_TIMEOUT: Duration = Duration::from_secs(15);

/// Fetches the full page an item links to
///
/// Every failure degrades to `None`: transport or status faults (after
/// retries), a non-HTML content type, or a body above
/// [`MAX_LINKED_PAGE_BYTES`].
pub async fn fetch_linked_page(client: &Client, url: &str, retry: &RetryPolicy) -> Option<String> {
    match with_retry(retry, "linked page", || read_html(client, url)).await {
        Ok(page) => page,
        Err(e) => {
            debug!(%url, error = %e, "Linked page unavailable");
            None
        }
    }
}

/// One attempt: `Ok(None)` marks a page that is reachable but unusable
async fn read_html(client: &Client, url: &str) -> Result<Option<String>> {
    let mut response = send_get(client, url, &[], Some(LINKED_PAGE_TIMEOUT)).await?;

    let content_type = content_type_of(&response);
    if !content_type.contains("text/html") {
        debug!(%url, %content_type, "Linked page is not HTML");
        return Ok(None);
    }

    if let Some(length) = response.content_length() {
        if length > MAX_LINKED_PAGE_BYTES as u64 {
            debug!(%url, bytes = length, "Linked page too large");
            return Ok(None);
        }
    }

    let mut body: Vec<u8> = Vec::new();
    while let Some(chunk) = response.chunk().await.map_err(|source| InkfeedError::Http {
        url: url.to_string(),
        source,
    })? {
        if body.len() + chunk.len() > MAX_LINKED_PAGE_BYTES {
            debug!(%url, "Linked page too large");
            return Ok(None);
        }
        body.extend_from_slice(&chunk);
    }

    Ok(Some(String::from_utf8_lossy(&body).into_owned()))
}
