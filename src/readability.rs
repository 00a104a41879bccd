//! Main-content extraction for linked pages
//!
//! Picks the container whose direct `<p>` children carry the most text and
//! keeps its content-bearing blocks, dropping navigation, scripts and forms.
//! The kept blocks then go through `ammonia`, which strips nested scripts,
//! event-handler attributes and `javascript:` URLs.

use crate::render::escape_html;
use ammonia::Builder;
use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use scraper::{ElementRef, Html, Selector};
use url::Url;

/// Extractions with less visible text than this are treated as failures
const MIN_TEXT_CHARS: usize = 50;

const CANDIDATES: &str = "article, main, [role=main], section, div, body";

const KEEP: &[&str] = &[
    "p", "h1", "h2", "h3", "h4", "h5", "h6", "pre", "blockquote", "ul", "ol", "figure", "img", "table",
];

const DROP: &[&str] = &["script", "style", "nav", "aside", "footer", "form", "noscript", "header"];

/// Elements removed together with their content during sanitizing
const STRIP_WITH_CONTENT: &[&str] = &["iframe", "noscript", "object"];

const TITLE_SEPARATORS: &[&str] = &[" | ", " - ", " \u{2014} ", " :: "];

static TAG_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]+>").expect("tag pattern"));

static LINK_ATTR_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"(\s(?:src|href)=")([^"]*)""#).expect("link attribute pattern"));

/// Cleaned article content
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadabilityResult {
    pub title: String,
    /// Sanitized HTML wrapped in a single `<div>`
    pub content: String,
    pub short_title: String,
}

/// Extracts the readable body of an HTML page
///
/// # Arguments
///
/// * `html` - Raw page HTML
/// * `url` - Page address; relative `src`/`href` values are resolved
///   against it when given
///
/// # Returns
///
/// `None` when the page yields fewer than 50 characters of text.
pub fn extract_article(html: &str, url: Option<&str>) -> Option<ReadabilityResult> {
    let document = Html::parse_document(html);

    let title = extract_title(&document);
    let short_title = shorten_title(&title);

    let container = best_container(&document)?;
    let mut body = String::new();
    collect_blocks(container, &mut body);
    body = sanitize(&body);

    let base = url.and_then(|u| Url::parse(u).ok());
    if let Some(base) = base {
        body = absolutize(&body, &base);
    }

    let content = format!("<div>{body}</div>");
    let visible = TAG_RE.replace_all(&content, "");
    if visible.trim().chars().count() < MIN_TEXT_CHARS {
        return None;
    }

    Some(ReadabilityResult {
        title,
        content,
        short_title,
    })
}

fn extract_title(document: &Html) -> String {
    Selector::parse("title")
        .ok()
        .and_then(|sel| document.select(&sel).next())
        .map(|el| el.text().collect::<String>().trim().to_string())
        .unwrap_or_default()
}

/// Longest segment of a title split on common site separators
fn shorten_title(title: &str) -> String {
    let mut segments = vec![title];
    for sep in TITLE_SEPARATORS {
        segments = segments.into_iter().flat_map(|s| s.split(sep)).collect();
    }

    let mut best = "";
    for segment in segments.into_iter().map(str::trim) {
        if segment.chars().count() > best.chars().count() {
            best = segment;
        }
    }
    best.to_string()
}

fn best_container(document: &Html) -> Option<ElementRef<'_>> {
    let candidates = Selector::parse(CANDIDATES).ok()?;

    let mut best: Option<(usize, ElementRef<'_>)> = None;
    for element in document.select(&candidates) {
        let score = paragraph_score(element);
        if best.map_or(true, |(top, _)| score > top) {
            best = Some((score, element));
        }
    }

    match best {
        Some((score, element)) if score > 0 => Some(element),
        _ => Selector::parse("body")
            .ok()
            .and_then(|sel| document.select(&sel).next())
            .or_else(|| best.map(|(_, el)| el)),
    }
}

/// Text length of the element's direct `<p>` children
fn paragraph_score(element: ElementRef<'_>) -> usize {
    element
        .children()
        .filter_map(ElementRef::wrap)
        .filter(|child| child.value().name() == "p")
        .map(|p| p.text().map(|t| t.trim().len()).sum::<usize>())
        .sum()
}

fn collect_blocks(element: ElementRef<'_>, out: &mut String) {
    for child in element.children() {
        if let Some(child_el) = ElementRef::wrap(child) {
            let name = child_el.value().name();
            if KEEP.contains(&name) {
                out.push_str(&child_el.html());
            } else if !DROP.contains(&name) {
                collect_blocks(child_el, out);
            }
        } else if let Some(text) = child.value().as_text() {
            let text = text.trim();
            if !text.is_empty() {
                out.push_str("<p>");
                out.push_str(&escape_html(text));
                out.push_str("</p>");
            }
        }
    }
}

fn sanitize(html: &str) -> String {
    let mut cleaner = Builder::default();
    cleaner
        .link_rel(None)
        .add_clean_content_tags(STRIP_WITH_CONTENT.iter().copied());
    cleaner.clean(html).to_string()
}

fn absolutize(html: &str, base: &Url) -> String {
    LINK_ATTR_RE
        .replace_all(html, |caps: &Captures| {
            let value = &caps[2];
            let skip = value.is_empty()
                || value.starts_with('#')
                || value.starts_with("data:")
                || value.starts_with("mailto:")
                || value.starts_with("javascript:");
            match base.join(value) {
                Ok(resolved) if !skip => format!("{}{}\"", &caps[1], resolved),
                _ => caps[0].to_string(),
            }
        })
        .into_owned()
}
