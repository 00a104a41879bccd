use chrono::{DateTime, Utc};
use serde::Serialize;
use std::path::PathBuf;

/// Canonical record produced by every archiver
///
/// Only the image rewriter touches an article after creation, and only its
/// `content_html`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Article {
    pub title: String,
    pub author: String,
    pub source_url: String,
    pub content_html: String,
    pub snapshot_date: DateTime<Utc>,
    pub publish_date: Option<DateTime<Utc>>,
    pub metadata: ArticleMetadata,
}

/// Source-specific facts carried alongside an article
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "source", rename_all = "snake_case")]
pub enum ArticleMetadata {
    HackerNews {
        hn_id: u64,
        score: i64,
        /// Full comment count, taken before any trimming
        num_comments: u64,
    },
    Kagi {
        cluster_id: String,
        category: String,
        emoji: String,
        unique_domains: u64,
    },
    Feed {
        feed_url: String,
        entry_id: String,
    },
}

/// One named partition of a source's output
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupResult {
    pub display_name: String,
    /// Output path relative to the source; the source name for single-group sources
    pub rel_path: String,
    pub cache_dir: PathBuf,
    pub articles: Vec<Article>,
}

/// Everything one archiver run produced
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ArchiveResult {
    pub source_name: String,
    pub source_display_name: String,
    pub groups: Vec<GroupResult>,
}

impl ArchiveResult {
    pub fn article_count(&self) -> usize {
        self.groups.iter().map(|g| g.articles.len()).sum()
    }
}
