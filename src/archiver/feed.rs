//! RSS / Atom archiver

use super::{Archiver, Article, ArticleMetadata};
use crate::config::{FeedParams, SourceConfig};
use crate::feed::{parse_feed, FeedEntry, ParsedFeed};
use crate::fetch::{fetch_linked_page, fetch_ordered, get_bytes, with_retry, ClientScope, FetchOptions};
use crate::readability::extract_article;
use crate::render::Renderer;
use crate::{InkfeedError, Result};
use chrono::Utc;
use reqwest::Client;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn};

pub struct FeedArchiver {
    source: SourceConfig,
    output_dir: PathBuf,
    params: FeedParams,
    renderer: Arc<Renderer>,
}

impl FeedArchiver {
    pub fn new(source: SourceConfig, output_dir: PathBuf, renderer: Arc<Renderer>) -> Result<Self> {
        let params = source.params()?;
        Ok(Self {
            source,
            output_dir,
            params,
            renderer,
        })
    }

    async fn fetch_feed(&self, client: &Client, options: &FetchOptions) -> Result<ParsedFeed> {
        let url = self.params.url.as_str();
        with_retry(&options.retry, "feed", || download_feed(client, url)).await
    }
}

/// Downloads and parses a feed document
///
/// A document that yields no entries at all and is flagged malformed fails
/// the source; a partially malformed one is accepted.
async fn download_feed(client: &Client, url: &str) -> Result<ParsedFeed> {
    let body = get_bytes(client, url, &[], None).await?;
    let feed = parse_feed(&String::from_utf8_lossy(&body.bytes));

    match &feed.bozo {
        Some(message) if feed.entries.is_empty() => Err(InkfeedError::FeedParse {
            url: url.to_string(),
            message: message.clone(),
        }),
        Some(message) => {
            warn!(%url, entries = feed.entries.len(), %message, "Feed is malformed; keeping parsed entries");
            Ok(feed)
        }
        None => Ok(feed),
    }
}

impl Archiver for FeedArchiver {
    type Raw = FeedEntry;

    fn source(&self) -> &SourceConfig {
        &self.source
    }

    fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    async fn fetch(&self, client: Option<&Client>, options: &FetchOptions) -> Result<Vec<FeedEntry>> {
        let client = ClientScope::resolve(client, &options.http)?;

        let mut entries = self.fetch_feed(&client, options).await?.entries;
        entries.truncate(self.params.max_articles);
        info!(source = %self.source.name, entries = entries.len(), "Fetched feed");

        if !self.params.include_article_content {
            return Ok(entries);
        }

        let client: &Client = &client;
        let retry = &options.retry;
        let entries = fetch_ordered(entries, options.max_workers, "feed articles", move |mut entry: FeedEntry| async move {
            if let Some(link) = entry.link.clone() {
                entry.article_html = fetch_linked_page(client, &link, retry).await;
            }
            Ok::<_, InkfeedError>(entry)
        })
        .await;

        Ok(entries)
    }

    fn process(&self, entries: Vec<FeedEntry>) -> Vec<Article> {
        let now = Utc::now();

        entries
            .into_iter()
            .map(|entry| {
                let url = entry.link.clone().unwrap_or_default();
                let article_content = entry
                    .article_html
                    .as_deref()
                    .and_then(|html| extract_article(html, Some(url.as_str()).filter(|u| !u.is_empty())))
                    .map(|extracted| extracted.content);

                let content_html = self.renderer.feed_entry(
                    article_content.as_deref(),
                    entry.summary_text(),
                    &url,
                    &self.source.display_name,
                );

                Article {
                    title: entry.title.clone().unwrap_or_else(|| "Untitled".to_string()),
                    author: entry.author_name(),
                    source_url: url,
                    content_html,
                    snapshot_date: now,
                    publish_date: entry.date(),
                    metadata: ArticleMetadata::Feed {
                        feed_url: self.params.url.clone(),
                        entry_id: entry.id.clone().unwrap_or_default(),
                    },
                }
            })
            .collect()
    }
}
