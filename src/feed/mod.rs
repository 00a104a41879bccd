//! RSS / Atom feed model and parser
//!
//! The parser is lenient: whatever entries were completed before a
//! structural problem are kept, and the problem is reported through
//! [`ParsedFeed::bozo`] rather than as an error.

mod parser;

pub use parser::{parse_date, parse_feed};

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};

/// A parsed feed document
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParsedFeed {
    pub title: Option<String>,
    pub entries: Vec<FeedEntry>,
    /// Set when the document was not well-formed or not a feed
    pub bozo: Option<String>,
}

/// A person construct (`<author><name/><email/></author>`)
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Person {
    pub name: Option<String>,
    pub email: Option<String>,
}

impl Person {
    fn is_empty(&self) -> bool {
        self.name.is_none() && self.email.is_none()
    }
}

/// One `<item>` or `<entry>`
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FeedEntry {
    pub title: Option<String>,
    pub link: Option<String>,
    pub id: Option<String>,
    pub summary: Option<String>,
    pub description: Option<String>,
    pub content: Option<String>,
    pub published: Option<String>,
    pub updated: Option<String>,
    pub published_parsed: Option<DateTime<Utc>>,
    pub updated_parsed: Option<DateTime<Utc>>,
    pub author: Option<String>,
    pub author_detail: Option<Person>,
    pub authors: Vec<Person>,
    /// Raw HTML of the linked page, when it was fetched
    pub article_html: Option<String>,
}

impl FeedEntry {
    /// Best available author name, or `"unknown"`
    pub fn author_name(&self) -> String {
        non_empty(self.author.as_deref())
            .or_else(|| self.author_detail.as_ref().and_then(|p| non_empty(p.name.as_deref())))
            .or_else(|| self.authors.first().and_then(|p| non_empty(p.name.as_deref())))
            .unwrap_or("unknown")
            .to_string()
    }

    /// Best available publication date
    ///
    /// Parsed dates win; otherwise the raw `published`/`updated` strings are
    /// tried as ISO-8601.
    pub fn date(&self) -> Option<DateTime<Utc>> {
        self.published_parsed
            .or(self.updated_parsed)
            .or_else(|| self.published.as_deref().and_then(parse_iso_datetime))
            .or_else(|| self.updated.as_deref().and_then(parse_iso_datetime))
    }

    /// Summary text, falling back to the description
    pub fn summary_text(&self) -> &str {
        self.summary
            .as_deref()
            .or(self.description.as_deref())
            .unwrap_or("")
    }
}

fn non_empty(s: Option<&str>) -> Option<&str> {
    s.filter(|s| !s.is_empty())
}

/// Parses an ISO-8601 timestamp; one without an offset is taken as UTC
pub fn parse_iso_datetime(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(dt.and_utc());
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc())
}
