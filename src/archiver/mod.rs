//! Source archivers
//!
//! This module contains:
//! - The canonical data model ([`Article`], [`GroupResult`], [`ArchiveResult`])
//! - The [`Archiver`] trait with its default single-group `run`
//! - The Hacker News, Kagi News and RSS/Atom archivers
//! - The registry mapping a configured source to its archiver

pub mod feed;
pub mod hackernews;
pub mod kaginews;
mod model;

pub use feed::FeedArchiver;
pub use hackernews::{HackerNewsArchiver, HnItem, HnStory};
pub use kaginews::{KagiCategory, KagiNewsArchiver, KagiStory};
pub use model::{ArchiveResult, Article, ArticleMetadata, GroupResult};

use crate::config::{SourceConfig, SourceKind};
use crate::fetch::FetchOptions;
use crate::render::Renderer;
use crate::{InkfeedError, Result};
use reqwest::Client;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;

/// A source that can be fetched and turned into articles
///
/// Implementors provide `fetch` and `process`; the default [`Archiver::run`]
/// sequences them and wraps the result in a single group whose `rel_path`
/// is the source name. Sources that split their output override `run`.
#[allow(async_fn_in_trait)]
pub trait Archiver {
    /// Typed record handed from `fetch` to `process`
    type Raw;

    fn source(&self) -> &SourceConfig;

    /// Root of the output tree
    fn output_dir(&self) -> &Path;

    /// Retrieves raw records
    ///
    /// Uses `client` when given and never closes it; otherwise a client is
    /// built for this call and dropped before it returns. Per-item failures
    /// are logged and skipped; only precondition failures return `Err`.
    async fn fetch(&self, client: Option<&Client>, options: &FetchOptions) -> Result<Vec<Self::Raw>>;

    /// Converts raw records into articles, preserving their order
    fn process(&self, raw: Vec<Self::Raw>) -> Vec<Article>;

    async fn run(&self, client: Option<&Client>, options: &FetchOptions) -> Result<ArchiveResult> {
        let source = self.source();
        let cache_dir = cache_dir(self.output_dir(), &source.name, &snapshot_date(), None);
        ensure_dir(&cache_dir).await?;

        let raw = self.fetch(client, options).await?;
        let articles = self.process(raw);
        info!(source = %source.name, articles = articles.len(), "Source processed");

        Ok(ArchiveResult {
            source_name: source.name.clone(),
            source_display_name: source.display_name.clone(),
            groups: vec![GroupResult {
                display_name: source.display_name.clone(),
                rel_path: source.name.clone(),
                cache_dir,
                articles,
            }],
        })
    }
}

/// Local date stamp used in cache paths
pub fn snapshot_date() -> String {
    chrono::Local::now().format("%Y-%m-%d").to_string()
}

/// `<output>/.cache/<source>/<date>[/<group>]`
pub fn cache_dir(output_dir: &Path, source: &str, date: &str, group: Option<&str>) -> PathBuf {
    let mut dir = output_dir.join(".cache").join(source).join(date);
    if let Some(group) = group {
        dir.push(group);
    }
    dir
}

/// Creates `dir` and its parents; an existing directory is fine
pub async fn ensure_dir(dir: &Path) -> Result<()> {
    tokio::fs::create_dir_all(dir).await?;
    Ok(())
}

/// A configured source bound to its archiver
pub enum SourceArchiver {
    HackerNews(HackerNewsArchiver),
    KagiNews(KagiNewsArchiver),
    Feed(FeedArchiver),
}

impl SourceArchiver {
    /// Picks the archiver for `source`, by name first and then by `type`
    ///
    /// # Errors
    ///
    /// * `InkfeedError::UnknownSource` - Neither the name nor the type is known
    /// * `InkfeedError::Config` - The source parameters do not fit the archiver
    pub fn build(source: &SourceConfig, output_dir: &Path, renderer: Arc<Renderer>) -> Result<Self> {
        let kind = source.resolve_kind().ok_or_else(|| InkfeedError::UnknownSource {
            name: source.name.clone(),
            kind: source.kind.clone(),
        })?;

        let source = source.clone();
        let output_dir = output_dir.to_path_buf();
        Ok(match kind {
            SourceKind::HackerNews => Self::HackerNews(HackerNewsArchiver::new(source, output_dir, renderer)?),
            SourceKind::KagiNews => Self::KagiNews(KagiNewsArchiver::new(source, output_dir, renderer)?),
            SourceKind::Feed => Self::Feed(FeedArchiver::new(source, output_dir, renderer)?),
        })
    }

    pub fn source(&self) -> &SourceConfig {
        match self {
            Self::HackerNews(a) => a.source(),
            Self::KagiNews(a) => a.source(),
            Self::Feed(a) => a.source(),
        }
    }

    pub async fn run(&self, client: Option<&Client>, options: &FetchOptions) -> Result<ArchiveResult> {
        match self {
            Self::HackerNews(a) => a.run(client, options).await,
            Self::KagiNews(a) => a.run(client, options).await,
            Self::Feed(a) => a.run(client, options).await,
        }
    }
}
