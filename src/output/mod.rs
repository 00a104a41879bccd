//! Snapshot writer
//!
//! Persists each group of an archive run as `articles.json` inside the
//! group's cache directory, next to any relocated images.

use crate::archiver::{ensure_dir, Article, GroupResult};
use crate::Result;
use serde::Serialize;
use std::path::PathBuf;
use tracing::debug;

/// File name of a group snapshot
pub const SNAPSHOT_FILE: &str = "articles.json";

#[derive(Serialize)]
struct GroupSnapshot<'a> {
    display_name: &'a str,
    rel_path: &'a str,
    article_count: usize,
    articles: &'a [Article],
}

/// Writes `group` as pretty-printed JSON into its cache directory
///
/// # Arguments
///
/// * `group` - The group to persist
///
/// # Returns
///
/// * `Ok(PathBuf)` - Path of the written snapshot
/// * `Err(InkfeedError::Io)` - The directory or file could not be written
pub async fn write_group_snapshot(group: &GroupResult) -> Result<PathBuf> {
    ensure_dir(&group.cache_dir).await?;

    let snapshot = GroupSnapshot {
        display_name: &group.display_name,
        rel_path: &group.rel_path,
        article_count: group.articles.len(),
        articles: &group.articles,
    };
    let json = serde_json::to_vec_pretty(&snapshot).map_err(std::io::Error::from)?;

    let path = group.cache_dir.join(SNAPSHOT_FILE);
    tokio::fs::write(&path, json).await?;
    debug!(path = %path.display(), articles = group.articles.len(), "Snapshot written");

    Ok(path)
}
