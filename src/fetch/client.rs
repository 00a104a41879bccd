//! HTTP client helpers
//!
//! Archivers either borrow a client shared by the caller or build one for the
//! duration of a single fetch call. Requests go through [`get_bytes`] so that
//! transport failures and HTTP status faults come back as classified
//! [`InkfeedError`] values the retry executor understands.

use crate::{InkfeedError, Result};
use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use std::ops::Deref;
use std::time::Duration;

/// Settings for locally built clients
#[derive(Debug, Clone)]
pub struct HttpConfig {
    pub user_agent: String,
    pub timeout: Duration,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            user_agent: format!("inkfeed/{}", env!("CARGO_PKG_VERSION")),
            timeout: Duration::from_secs(30),
        }
    }
}

/// Builds an HTTP client with proper configuration
///
/// Redirects are followed (reqwest's default limit of 10 hops) because
/// article links and image CDNs routinely bounce through one or two.
///
/// # Example
///
/// ```no_run
/// use inkfeed::fetch::{build_http_client, HttpConfig};
///
/// let client = build_http_client(&HttpConfig::default()).unwrap();
/// ```
pub fn build_http_client(config: &HttpConfig) -> std::result::Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(config.user_agent.as_str())
        .timeout(config.timeout)
        .connect_timeout(Duration::from_secs(10))
        .gzip(true)
        .brotli(true)
        .build()
}

/// A client borrowed from the caller or owned by the current fetch call
///
/// A borrowed client is never closed here. An owned client is dropped, and
/// its connection pool torn down, when the scope goes out of scope, which
/// covers early returns and `?` propagation alike.
pub enum ClientScope<'a> {
    Shared(&'a Client),
    Local(Client),
}

impl<'a> ClientScope<'a> {
    /// Borrows `client` when given, otherwise builds a local one from `config`
    pub fn resolve(client: Option<&'a Client>, config: &HttpConfig) -> Result<Self> {
        match client {
            Some(client) => Ok(Self::Shared(client)),
            None => Ok(Self::Local(build_http_client(config)?)),
        }
    }

    pub fn is_local(&self) -> bool {
        matches!(self, Self::Local(_))
    }
}

impl Deref for ClientScope<'_> {
    type Target = Client;

    fn deref(&self) -> &Client {
        match self {
            Self::Shared(client) => client,
            Self::Local(client) => client,
        }
    }
}

/// Body and content type of a successful response
#[derive(Debug, Clone)]
pub struct FetchedBody {
    /// Value of the `Content-Type` header, empty when absent
    pub content_type: String,
    pub bytes: Vec<u8>,
}

/// Sends a GET request and returns the body of a 2xx response
///
/// # Arguments
///
/// * `client` - The HTTP client to use
/// * `url` - The URL to fetch
/// * `query` - Query-string pairs appended to the URL
/// * `timeout` - Per-request timeout overriding the client default
///
/// # Returns
///
/// * `Ok(FetchedBody)` - 2xx response with its content type and body
/// * `Err(InkfeedError::Http)` - Transport failure (timeout, connect, reset)
/// * `Err(InkfeedError::Status)` - Non-2xx response
pub async fn get_bytes(
    client: &Client,
    url: &str,
    query: &[(&str, &str)],
    timeout: Option<Duration>,
) -> Result<FetchedBody> {
    let response = send_get(client, url, query, timeout).await?;
    let content_type = content_type_of(&response);

    let bytes = response.bytes().await.map_err(|source| InkfeedError::Http {
        url: url.to_string(),
        source,
    })?;

    Ok(FetchedBody {
        content_type,
        bytes: bytes.to_vec(),
    })
}

/// Sends a GET request and returns the response of a 2xx status, body unread
pub(crate) async fn send_get(
    client: &Client,
    url: &str,
    query: &[(&str, &str)],
    timeout: Option<Duration>,
) -> Result<Response> {
    let mut request = client.get(url);
    if !query.is_empty() {
        request = request.query(query);
    }
    if let Some(timeout) = timeout {
        request = request.timeout(timeout);
    }

    let response = request.send().await.map_err(|source| InkfeedError::Http {
        url: url.to_string(),
        source,
    })?;

    let status = response.status();
    if !status.is_success() {
        return Err(InkfeedError::Status {
            url: url.to_string(),
            status: status.as_u16(),
        });
    }

    Ok(response)
}

/// Value of the `Content-Type` header, empty when absent
pub(crate) fn content_type_of(response: &Response) -> String {
    response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("")
        .to_string()
}

/// Sends a GET request and decodes the JSON body into `T`
///
/// A body that fails to decode is reported as [`InkfeedError::Json`], which
/// is never retried.
pub async fn get_json<T: DeserializeOwned>(
    client: &Client,
    url: &str,
    query: &[(&str, &str)],
) -> Result<T> {
    let body = get_bytes(client, url, query, None).await?;
    decode_json(&body.bytes).map_err(|source| InkfeedError::Json {
        url: url.to_string(),
        source,
    })
}

/// Decodes JSON without a nesting limit
///
/// Comment threads nest two levels per reply, so long reply chains exceed
/// serde_json's default depth of 128. The stack grows on demand instead.
fn decode_json<T: DeserializeOwned>(bytes: &[u8]) -> std::result::Result<T, serde_json::Error> {
    let mut de = serde_json::Deserializer::from_slice(bytes);
    de.disable_recursion_limit();
    let value: T = serde::Deserialize::deserialize(serde_stacker::Deserializer::new(&mut de))?;
    de.end()?;
    Ok(value)
}
