use inkfeed::config::SourceConfig;
use inkfeed::{FetchOptions, RetryPolicy};
use serde_json::Value;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use wiremock::{Request, Respond, ResponseTemplate};

/// Fetch options with millisecond backoff so retry tests stay fast
pub fn fast_options() -> FetchOptions {
    FetchOptions {
        max_workers: 4,
        retry: RetryPolicy {
            max_retries: 2,
            base_delay: Duration::from_millis(1),
        },
        ..FetchOptions::default()
    }
}

/// A source table built from a TOML snippet of archiver parameters
pub fn source(name: &str, kind: Option<&str>, params: &str) -> SourceConfig {
    let params: toml::Table = toml::from_str(params).expect("Failed to parse test params");
    SourceConfig::new(name, kind, params)
}

/// Answers with `status` for the first `failures` calls, then with a JSON body
pub struct FlakyJson {
    calls: AtomicUsize,
    failures: usize,
    status: u16,
    body: Value,
}

impl FlakyJson {
    pub fn new(failures: usize, status: u16, body: Value) -> Self {
        Self {
            calls: AtomicUsize::new(0),
            failures,
            status,
            body,
        }
    }
}

impl Respond for FlakyJson {
    fn respond(&self, _request: &Request) -> ResponseTemplate {
        if self.calls.fetch_add(1, Ordering::SeqCst) < self.failures {
            ResponseTemplate::new(self.status)
        } else {
            ResponseTemplate::new(200).set_body_json(self.body.clone())
        }
    }
}

/// An HTML page whose body has enough text to survive readability
pub fn article_page(title: &str, paragraph: &str) -> String {
    format!(
        r#"<html><head><title>{title} | Example Blog</title></head><body>
        <nav><a href="/">Home</a></nav>
        <article><h1>{title}</h1><p>{paragraph}</p><p>{paragraph}</p></article>
        <footer>Copyright</footer>
        </body></html>"#
    )
}
