//! Kagi News archiver
//!
//! Resolution runs in three steps, the first two being prerequisites for
//! the concurrent third:
//! 1. Latest batch id (`/api/batches`)
//! 2. Category slug to id map for that batch
//! 3. Stories per configured category, in configuration order
//!
//! Each non-empty category becomes its own output group.

use super::{cache_dir, ensure_dir, snapshot_date, ArchiveResult, Archiver, Article, ArticleMetadata, GroupResult};
use crate::config::{KagiParams, SourceConfig};
use crate::feed::parse_iso_datetime;
use crate::fetch::{fetch_ordered, get_json, with_retry, ClientScope, FetchOptions};
use crate::render::Renderer;
use crate::transform::CitationSource;
use crate::{InkfeedError, Result};
use chrono::Utc;
use reqwest::Client;
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// One clustered story
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct KagiStory {
    pub id: Option<String>,
    pub title: Option<String>,
    pub category: Option<String>,
    pub emoji: Option<String>,
    pub unique_domains: Option<u64>,
    pub short_summary: Option<String>,
    #[serde(deserialize_with = "one_or_many")]
    pub talking_points: Vec<String>,
    pub quote: Option<String>,
    pub quote_author: Option<String>,
    pub quote_source_url: Option<String>,
    #[serde(deserialize_with = "nullable")]
    pub perspectives: Vec<Perspective>,
    pub primary_image: Option<PrimaryImage>,
    #[serde(deserialize_with = "nullable")]
    pub articles: Vec<KagiArticle>,
    pub did_you_know: Option<String>,
    pub historical_background: Option<String>,
    #[serde(deserialize_with = "one_or_many")]
    pub international_reactions: Vec<String>,
    #[serde(deserialize_with = "nullable")]
    pub timeline: Vec<TimelineEntry>,
    #[serde(deserialize_with = "nullable")]
    pub suggested_qna: Vec<QuestionAnswer>,
    #[serde(deserialize_with = "one_or_many")]
    pub user_action_items: Vec<String>,
    pub business_angle_text: Option<String>,
    #[serde(deserialize_with = "one_or_many")]
    pub business_angle_points: Vec<String>,
    #[serde(deserialize_with = "one_or_many")]
    pub scientific_significance: Vec<String>,
    #[serde(deserialize_with = "one_or_many")]
    pub gameplay_mechanics: Vec<String>,
    #[serde(deserialize_with = "one_or_many")]
    pub performance_statistics: Vec<String>,
    pub league_standings: Option<String>,
}

/// A source article backing a story
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct KagiArticle {
    #[serde(deserialize_with = "nullable")]
    pub title: String,
    #[serde(deserialize_with = "nullable")]
    pub link: String,
    pub domain: Option<String>,
    pub date: Option<String>,
}

impl CitationSource for KagiArticle {
    fn domain(&self) -> Option<&str> {
        self.domain.as_deref()
    }

    fn url(&self) -> &str {
        &self.link
    }

    fn title(&self) -> &str {
        &self.title
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct Perspective {
    #[serde(deserialize_with = "nullable")]
    pub text: String,
    #[serde(deserialize_with = "nullable")]
    pub sources: Vec<PerspectiveSource>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct PerspectiveSource {
    #[serde(deserialize_with = "nullable")]
    pub name: String,
    #[serde(deserialize_with = "nullable")]
    pub url: String,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct PrimaryImage {
    #[serde(deserialize_with = "nullable")]
    pub url: String,
    pub caption: Option<String>,
    pub credit: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct QuestionAnswer {
    #[serde(deserialize_with = "nullable")]
    pub question: String,
    #[serde(deserialize_with = "nullable")]
    pub answer: String,
}

/// Timeline entries come as `{date, content}` objects or `"date:: content"` strings
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum TimelineEntry {
    Event {
        #[serde(default)]
        date: String,
        #[serde(default)]
        content: String,
    },
    Line(String),
}

impl TimelineEntry {
    /// `(date, content)`; a string without `::` has no date
    pub fn parts(&self) -> (&str, &str) {
        match self {
            Self::Event { date, content } => (date.trim(), content.trim()),
            Self::Line(line) => match line.split_once("::") {
                Some((date, content)) => (date.trim(), content.trim()),
                None => ("", line.trim()),
            },
        }
    }
}

fn nullable<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

fn one_or_many<'de, D>(deserializer: D) -> std::result::Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OneOrMany {
        One(String),
        Many(Vec<String>),
    }

    Ok(match Option::<OneOrMany>::deserialize(deserializer)? {
        None => Vec::new(),
        Some(OneOrMany::One(s)) if s.trim().is_empty() => Vec::new(),
        Some(OneOrMany::One(s)) => vec![s],
        Some(OneOrMany::Many(items)) => items,
    })
}

/// All stories of one configured category
#[derive(Debug, Clone, PartialEq)]
pub struct KagiCategory {
    pub slug: String,
    pub name: String,
    pub stories: Vec<KagiStory>,
}

#[derive(Debug, Deserialize)]
struct BatchList {
    #[serde(default)]
    batches: Vec<Batch>,
}

#[derive(Debug, Deserialize)]
struct Batch {
    id: String,
}

#[derive(Debug, Deserialize)]
struct CategoryList {
    #[serde(default)]
    categories: Vec<CategoryEntry>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CategoryEntry {
    id: String,
    category_id: String,
    category_name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct StoryList {
    #[serde(default)]
    stories: Vec<Value>,
}

/// Resolved category: upstream id and display name
#[derive(Debug, Clone)]
struct CategoryRef {
    id: String,
    name: String,
}

pub struct KagiNewsArchiver {
    source: SourceConfig,
    output_dir: PathBuf,
    params: KagiParams,
    renderer: Arc<Renderer>,
}

impl KagiNewsArchiver {
    pub fn new(source: SourceConfig, output_dir: PathBuf, renderer: Arc<Renderer>) -> Result<Self> {
        let params = source.params()?;
        Ok(Self {
            source,
            output_dir,
            params,
            renderer,
        })
    }

    async fn latest_batch_id(&self, client: &Client, options: &FetchOptions) -> Result<String> {
        let url = format!("{}/api/batches", self.params.api_base);
        let query = [("lang", self.params.language.as_str())];

        let list: BatchList = with_retry(&options.retry, "kagi batches", || get_json(client, &url, &query)).await?;
        list.batches
            .into_iter()
            .next()
            .map(|batch| batch.id)
            .ok_or_else(|| InkfeedError::NoBatches {
                language: self.params.language.clone(),
            })
    }

    async fn category_map(
        &self,
        client: &Client,
        batch_id: &str,
        options: &FetchOptions,
    ) -> Result<HashMap<String, CategoryRef>> {
        let url = format!("{}/api/batches/{}/categories", self.params.api_base, batch_id);
        let query = [("lang", self.params.language.as_str())];

        let list: CategoryList =
            with_retry(&options.retry, "kagi categories", || get_json(client, &url, &query)).await?;

        Ok(list
            .categories
            .into_iter()
            .map(|entry| {
                // Unnamed categories read as "World News" rather than the bare "world_news" slug
                let name = entry
                    .category_name
                    .filter(|n| !n.is_empty())
                    .unwrap_or_else(|| title_case_slug(&entry.category_id));
                (entry.category_id, CategoryRef { id: entry.id, name })
            })
            .collect())
    }

    async fn fetch_category(
        &self,
        client: &Client,
        batch_id: &str,
        slug: String,
        category: CategoryRef,
        options: &FetchOptions,
    ) -> Result<KagiCategory> {
        let url = format!(
            "{}/api/batches/{}/categories/{}/stories",
            self.params.api_base, batch_id, category.id
        );
        let limit = self.params.max_stories_per_category.to_string();
        let query = [("lang", self.params.language.as_str()), ("limit", limit.as_str())];

        let list: StoryList = with_retry(&options.retry, "kagi stories", || get_json(client, &url, &query)).await?;

        let stories = list
            .stories
            .into_iter()
            .enumerate()
            .filter_map(|(index, raw)| match serde_json::from_value::<KagiStory>(raw) {
                Ok(story) => Some(story),
                Err(e) => {
                    warn!(category = %slug, index, error = %e, "Dropping undecodable story");
                    None
                }
            })
            .collect::<Vec<_>>();

        debug!(category = %slug, stories = stories.len(), "Fetched category");
        Ok(KagiCategory {
            slug,
            name: category.name,
            stories,
        })
    }

    /// Converts the stories of one category into articles
    pub fn process_stories(&self, stories: Vec<KagiStory>) -> Vec<Article> {
        let now = Utc::now();

        stories
            .into_iter()
            .map(|story| {
                let content_html = self.renderer.kagi_story(&story);
                let source_url = story.articles.first().map(|a| a.link.clone()).unwrap_or_default();
                let publish_date = story
                    .articles
                    .iter()
                    .filter_map(|a| a.date.as_deref().and_then(parse_iso_datetime))
                    .min();

                Article {
                    title: story.title.unwrap_or_else(|| "Untitled".to_string()),
                    author: "Kagi News".to_string(),
                    source_url,
                    content_html,
                    snapshot_date: now,
                    publish_date,
                    metadata: ArticleMetadata::Kagi {
                        cluster_id: story.id.unwrap_or_default(),
                        category: story.category.unwrap_or_default(),
                        emoji: story.emoji.unwrap_or_default(),
                        unique_domains: story.unique_domains.unwrap_or(0),
                    },
                }
            })
            .collect()
    }
}

impl Archiver for KagiNewsArchiver {
    type Raw = KagiCategory;

    fn source(&self) -> &SourceConfig {
        &self.source
    }

    fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Fetches every configured category the latest batch offers
    ///
    /// # Errors
    ///
    /// * `InkfeedError::NoBatches` - The API lists no batch for the language
    /// * Any fault resolving the batch or its categories, after retries
    async fn fetch(&self, client: Option<&Client>, options: &FetchOptions) -> Result<Vec<KagiCategory>> {
        let client = ClientScope::resolve(client, &options.http)?;

        let batch_id = self.latest_batch_id(&client, options).await?;
        let categories = self.category_map(&client, &batch_id, options).await?;
        debug!(batch = %batch_id, offered = categories.len(), "Resolved batch");

        let wanted: Vec<(String, CategoryRef)> = self
            .params
            .categories
            .iter()
            .filter_map(|slug| match categories.get(slug).cloned() {
                Some(category) => Some((slug.clone(), category)),
                None => {
                    warn!(category = %slug, batch = %batch_id, "Category not offered by batch; skipping");
                    None
                }
            })
            .collect();

        info!(source = %self.source.name, categories = wanted.len(), "Fetching categories");
        let fetched = fetch_ordered(wanted, options.max_workers, "kagi categories", |(slug, category)| {
            self.fetch_category(&client, &batch_id, slug, category, options)
        })
        .await;

        Ok(fetched)
    }

    fn process(&self, categories: Vec<KagiCategory>) -> Vec<Article> {
        categories
            .into_iter()
            .flat_map(|category| self.process_stories(category.stories))
            .collect()
    }

    /// One group per category that returned stories
    async fn run(&self, client: Option<&Client>, options: &FetchOptions) -> Result<ArchiveResult> {
        let date = snapshot_date();
        let categories = self.fetch(client, options).await?;

        let mut groups = Vec::with_capacity(categories.len());
        for category in categories {
            if category.stories.is_empty() {
                debug!(category = %category.slug, "No stories; dropping group");
                continue;
            }

            let dir = cache_dir(&self.output_dir, &self.source.name, &date, Some(&category.slug));
            ensure_dir(&dir).await?;

            groups.push(GroupResult {
                display_name: category.name,
                rel_path: category.slug,
                cache_dir: dir,
                articles: self.process_stories(category.stories),
            });
        }

        info!(source = %self.source.name, groups = groups.len(), "Source processed");
        Ok(ArchiveResult {
            source_name: self.source.name.clone(),
            source_display_name: self.source.display_name.clone(),
            groups,
        })
    }
}

/// `world_news` becomes `World News`
fn title_case_slug(slug: &str) -> String {
    slug.split('_')
        .filter(|word| !word.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}
