//! HTML rendering for article bodies
//!
//! [`Renderer`] is built once at startup and shared by every archiver. Each
//! source has its own template, implemented in a submodule:
//! - [`hackernews`]: story meta, linked article and comment tree
//! - [`kagi`]: summary, sources, highlights and the optional story sections
//! - [`feed`]: extracted article or the feed's own summary

mod feed;
mod hackernews;
mod kagi;

use crate::feed::parse_iso_datetime;
use chrono::DateTime;

/// Rendering context shared by the archivers
#[derive(Debug, Clone)]
pub struct Renderer {
    /// Format of comment timestamps
    timestamp_format: String,
    /// Format of source-article dates
    date_format: String,
}

impl Default for Renderer {
    fn default() -> Self {
        Self::new()
    }
}

impl Renderer {
    pub fn new() -> Self {
        Self {
            timestamp_format: "%Y-%m-%d %H:%M UTC".to_string(),
            date_format: "%Y-%m-%d".to_string(),
        }
    }

    /// Formats a unix timestamp as `YYYY-MM-DD HH:MM UTC`, or "" when out of range
    pub fn hn_time(&self, unix: i64) -> String {
        DateTime::from_timestamp(unix, 0)
            .map(|dt| dt.format(&self.timestamp_format).to_string())
            .unwrap_or_default()
    }

    /// ` (YYYY-MM-DD)` for a parseable ISO-8601 date, otherwise ""
    pub fn format_source_date(&self, raw: Option<&str>) -> String {
        raw.and_then(parse_iso_datetime)
            .map(|dt| format!(" ({})", dt.format(&self.date_format)))
            .unwrap_or_default()
    }
}

/// Escapes text for use in HTML content and quoted attribute values
pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#x27;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

/// Trimmed text, or `None` when absent or blank
fn present(text: &Option<String>) -> Option<&str> {
    text.as_deref().map(str::trim).filter(|t| !t.is_empty())
}
