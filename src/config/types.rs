use crate::fetch::{FetchOptions, HttpConfig, RetryPolicy};
use crate::ConfigError;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

/// Main configuration structure for Inkfeed
#[derive(Debug, Clone)]
pub struct Config {
    pub general: GeneralConfig,

    /// Sources in the order they appear in the file
    pub sources: Vec<SourceConfig>,
}

/// Settings shared by every source
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case", default, deny_unknown_fields)]
pub struct GeneralConfig {
    /// Root of the output tree; caches live under `<output-dir>/.cache`
    pub output_dir: PathBuf,

    /// Worker-pool size for every concurrent fetch
    pub max_workers: usize,

    /// Additional attempts after the first for retryable faults
    pub max_retries: u32,

    /// Backoff base; attempt N waits `base * 2^N`
    pub retry_base_delay_ms: u64,

    /// Whole-request timeout for API calls
    pub request_timeout_secs: u64,

    /// Inline images as data URIs instead of relocating them to disk
    pub embed_assets: bool,

    pub user_agent: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("output"),
            max_workers: 8,
            max_retries: 3,
            retry_base_delay_ms: 1000,
            request_timeout_secs: 30,
            embed_assets: false,
            user_agent: format!("inkfeed/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl GeneralConfig {
    /// Builds the fetch options every archiver run receives
    pub fn fetch_options(&self) -> FetchOptions {
        FetchOptions {
            max_workers: self.max_workers,
            retry: RetryPolicy {
                max_retries: self.max_retries,
                base_delay: Duration::from_millis(self.retry_base_delay_ms),
            },
            http: HttpConfig {
                user_agent: self.user_agent.clone(),
                timeout: Duration::from_secs(self.request_timeout_secs),
            },
        }
    }
}

/// One `[sources.<name>]` table
#[derive(Debug, Clone)]
pub struct SourceConfig {
    /// Table key; also the cache directory name and the group `rel_path`
    pub name: String,

    /// Value of the `type` key, if any
    pub kind: Option<String>,

    pub frequency: String,

    pub enabled: bool,

    /// Human-readable label; defaults to `name`
    pub display_name: String,

    /// Archiver-specific keys, parsed lazily by the archiver
    pub params: toml::Table,
}

impl SourceConfig {
    /// Creates a source with default settings and the given parameters
    pub fn new(name: impl Into<String>, kind: Option<&str>, params: toml::Table) -> Self {
        let name = name.into();
        Self {
            display_name: name.clone(),
            name,
            kind: kind.map(str::to_string),
            frequency: "daily".to_string(),
            enabled: true,
            params,
        }
    }

    /// Deserializes the archiver-specific parameters
    pub fn params<T: DeserializeOwned>(&self) -> Result<T, ConfigError> {
        Ok(toml::Value::Table(self.params.clone()).try_into()?)
    }

    /// Resolves which archiver handles this source
    ///
    /// The source name wins over the `type` key, so a source called
    /// `hackernews` needs no explicit type.
    pub fn resolve_kind(&self) -> Option<SourceKind> {
        SourceKind::from_name(&self.name).or_else(|| self.kind.as_deref().and_then(SourceKind::from_name))
    }
}

/// Archiver families
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    HackerNews,
    KagiNews,
    Feed,
}

impl SourceKind {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "hackernews" => Some(Self::HackerNews),
            "kaginews" => Some(Self::KagiNews),
            "rss" | "atom" | "feed" => Some(Self::Feed),
            _ => None,
        }
    }
}

/// Parameters of the Hacker News archiver
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case", default, deny_unknown_fields)]
pub struct HackerNewsParams {
    pub top_stories: usize,
    pub include_comments: bool,
    pub include_article_content: bool,
    pub max_comment_depth: usize,
    pub max_comments_per_level: usize,
    pub api_base: String,
    pub algolia_base: String,
}

impl Default for HackerNewsParams {
    fn default() -> Self {
        Self {
            top_stories: 30,
            include_comments: true,
            include_article_content: true,
            max_comment_depth: 3,
            max_comments_per_level: 10,
            api_base: "https://hacker-news.firebaseio.com/v0".to_string(),
            algolia_base: "https://hn.algolia.com/api/v1".to_string(),
        }
    }
}

/// Parameters of the Kagi News archiver
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case", default, deny_unknown_fields)]
pub struct KagiParams {
    /// Category slugs, in output order
    pub categories: Vec<String>,
    pub language: String,
    pub max_stories_per_category: usize,
    pub api_base: String,
}

impl Default for KagiParams {
    fn default() -> Self {
        Self {
            categories: Vec::new(),
            language: "en".to_string(),
            max_stories_per_category: 50,
            api_base: "https://news.kagi.com".to_string(),
        }
    }
}

/// Parameters of the RSS/Atom archiver
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct FeedParams {
    pub url: String,

    #[serde(default = "default_max_articles")]
    pub max_articles: usize,

    #[serde(default = "default_true")]
    pub include_article_content: bool,
}

fn default_max_articles() -> usize {
    30
}

fn default_true() -> bool {
    true
}
