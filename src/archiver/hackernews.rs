//! Hacker News archiver
//!
//! Story ids come from the official top-stories list; each story (with its
//! whole comment tree) is then read from the Algolia item endpoint, which
//! answers in the search-API field shape.

use super::{Archiver, Article, ArticleMetadata};
use crate::config::{HackerNewsParams, SourceConfig};
use crate::fetch::{fetch_linked_page, fetch_ordered, get_json, with_retry, ClientScope, FetchOptions};
use crate::readability::extract_article;
use crate::render::Renderer;
use crate::transform::{normalize_item, trim_tree, TreeNode, TrimLimits};
use crate::{InkfeedError, Result};
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};
use url::Url;

const ITEM_PAGE: &str = "https://news.ycombinator.com/item?id=";
const HN_HOST: &str = "news.ycombinator.com";

/// A story or comment in canonical shape
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HnItem {
    pub id: u64,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub title: Option<String>,
    pub url: Option<String>,
    pub by: Option<String>,
    pub score: Option<i64>,
    pub time: Option<i64>,
    pub descendants: Option<u64>,
    /// HTML body of a comment or a self post
    pub text: Option<String>,
    #[serde(rename = "_comments")]
    pub comments: Vec<HnItem>,
}

impl TreeNode for HnItem {
    fn is_comment(&self) -> bool {
        self.kind.as_deref() == Some("comment")
    }

    fn children_mut(&mut self) -> &mut Vec<Self> {
        &mut self.comments
    }
}

/// A fetched story plus the page it links to, when that was retrieved
#[derive(Debug, Clone, PartialEq)]
pub struct HnStory {
    pub item: HnItem,
    pub article_html: Option<String>,
}

impl HnStory {
    /// Ingests one raw record in either field shape
    ///
    /// The record is normalized (which attaches the full descendant count)
    /// and decoded; a `_article_html` string, if present, becomes
    /// [`HnStory::article_html`].
    pub fn from_raw(raw: Value) -> Result<Self> {
        let id = raw.get("id").map(Value::to_string).unwrap_or_else(|| "?".to_string());

        let mut raw = raw;
        let article_html = raw
            .as_object_mut()
            .and_then(|map| map.remove("_article_html"))
            .and_then(|v| v.as_str().map(str::to_string));

        let item = serde_json::from_value(normalize_item(raw)).map_err(|e| InkfeedError::UnexpectedItem {
            id,
            reason: e.to_string(),
        })?;

        Ok(Self { item, article_html })
    }
}

pub struct HackerNewsArchiver {
    source: SourceConfig,
    output_dir: PathBuf,
    params: HackerNewsParams,
    renderer: Arc<Renderer>,
}

impl HackerNewsArchiver {
    pub fn new(source: SourceConfig, output_dir: PathBuf, renderer: Arc<Renderer>) -> Result<Self> {
        let params = source.params()?;
        Ok(Self {
            source,
            output_dir,
            params,
            renderer,
        })
    }

    pub fn params(&self) -> &HackerNewsParams {
        &self.params
    }

    fn trim_limits(&self) -> TrimLimits {
        TrimLimits {
            max_depth: self.params.max_comment_depth,
            max_per_level: self.params.max_comments_per_level,
        }
    }

    /// Turns one raw item record into a story ready for `process`
    ///
    /// Normalizes before trimming, so the descendant count reflects the
    /// whole tree. Comments are dropped entirely when disabled.
    ///
    /// # Errors
    ///
    /// * `InkfeedError::UnexpectedItem` - The record is not a story or does not decode
    pub fn ingest(&self, raw: Value) -> Result<HnStory> {
        let mut story = HnStory::from_raw(raw)?;

        if story.item.kind.as_deref() != Some("story") {
            return Err(InkfeedError::UnexpectedItem {
                id: story.item.id.to_string(),
                reason: format!("expected a story, got {:?}", story.item.kind),
            });
        }

        let comments = std::mem::take(&mut story.item.comments);
        if self.params.include_comments {
            story.item.comments = trim_tree(comments, self.trim_limits(), 0);
        }

        Ok(story)
    }

    async fn fetch_story(&self, client: &Client, id: u64, options: &FetchOptions) -> Result<HnStory> {
        let url = format!("{}/items/{}", self.params.algolia_base, id);
        let raw: Value = with_retry(&options.retry, "hn item", || get_json(client, &url, &[])).await?;
        let mut story = self.ingest(raw)?;

        if self.params.include_article_content {
            if let Some(link) = story.item.url.as_deref().filter(|u| links_off_site(u)) {
                story.article_html = fetch_linked_page(client, link, &options.retry).await;
            }
        }

        debug!(id, comments = story.item.descendants, "Fetched story");
        Ok(story)
    }
}

impl Archiver for HackerNewsArchiver {
    type Raw = HnStory;

    fn source(&self) -> &SourceConfig {
        &self.source
    }

    fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    async fn fetch(&self, client: Option<&Client>, options: &FetchOptions) -> Result<Vec<HnStory>> {
        let client = ClientScope::resolve(client, &options.http)?;

        let list_url = format!("{}/topstories.json", self.params.api_base);
        let mut ids: Vec<u64> = with_retry(&options.retry, "hn top stories", || get_json(&client, &list_url, &[])).await?;
        ids.truncate(self.params.top_stories);

        info!(source = %self.source.name, stories = ids.len(), "Fetching top stories");
        let stories = fetch_ordered(ids, options.max_workers, "hn stories", |id| {
            self.fetch_story(&client, id, options)
        })
        .await;

        Ok(stories)
    }

    fn process(&self, stories: Vec<HnStory>) -> Vec<Article> {
        let now = Utc::now();

        stories
            .into_iter()
            .map(|story| {
                let item = &story.item;
                let url = item
                    .url
                    .clone()
                    .filter(|u| !u.is_empty())
                    .unwrap_or_else(|| format!("{ITEM_PAGE}{}", item.id));

                let article_content = story
                    .article_html
                    .as_deref()
                    .and_then(|html| extract_article(html, Some(&url)))
                    .map(|extracted| extracted.content);

                let content_html = self.renderer.hacker_news_story(item, &url, article_content.as_deref());

                Article {
                    title: item.title.clone().unwrap_or_else(|| "Untitled".to_string()),
                    author: item.by.clone().unwrap_or_else(|| "anonymous".to_string()),
                    source_url: url,
                    content_html,
                    snapshot_date: now,
                    publish_date: item.time.and_then(|t| DateTime::from_timestamp(t, 0)),
                    metadata: ArticleMetadata::HackerNews {
                        hn_id: item.id,
                        score: item.score.unwrap_or(0),
                        num_comments: item.descendants.unwrap_or(0),
                    },
                }
            })
            .collect()
    }
}

/// Whether a story URL points away from Hacker News itself
fn links_off_site(url: &str) -> bool {
    Url::parse(url)
        .map(|u| u.host_str() != Some(HN_HOST))
        .unwrap_or(false)
}
