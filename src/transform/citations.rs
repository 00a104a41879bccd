//! Citation mapper
//!
//! Summaries reference their sources with markers like `[reuters.com#2]`,
//! meaning the second article from `reuters.com` in the story's article
//! list. Markers are replaced by numbered superscript links pointing at the
//! global position of that article in the rendered source list.

use crate::render::escape_html;
use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use std::collections::HashMap;

static CITATION_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\[([a-zA-Z0-9._-]+(?:\.[a-zA-Z]{2,}))#(\d+)\]").expect("citation pattern"));

/// Where a citation marker points
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CitationTarget {
    /// 1-based position in the full article list
    pub index: usize,
    pub url: String,
    pub title: String,
}

/// `(domain, 1-based occurrence of that domain)` to its target
pub type CitationMap = HashMap<(String, usize), CitationTarget>;

/// Anything that can be cited by domain
pub trait CitationSource {
    fn domain(&self) -> Option<&str>;
    fn url(&self) -> &str;
    fn title(&self) -> &str;
}

/// Builds the citation map for an ordered article list
///
/// Articles without a domain are not citable but still occupy their index,
/// so numbering always matches the rendered list.
pub fn build_citation_map<S: CitationSource>(articles: &[S]) -> CitationMap {
    let mut seen: HashMap<&str, usize> = HashMap::new();
    let mut map = CitationMap::new();

    for (i, article) in articles.iter().enumerate() {
        let Some(domain) = article.domain().filter(|d| !d.is_empty()) else {
            continue;
        };
        let nth = seen.entry(domain).or_insert(0);
        *nth += 1;
        map.insert(
            (domain.to_string(), *nth),
            CitationTarget {
                index: i + 1,
                url: article.url().to_string(),
                title: article.title().to_string(),
            },
        );
    }

    map
}

/// Replaces every resolvable marker in `text` with a superscript link
///
/// Markers with no entry in the map are left verbatim.
pub fn process_citations(text: &str, map: &CitationMap) -> String {
    if map.is_empty() {
        return text.to_string();
    }

    CITATION_RE
        .replace_all(text, |caps: &Captures| {
            let domain = &caps[1];
            let target = caps[2]
                .parse::<usize>()
                .ok()
                .and_then(|nth| map.get(&(domain.to_string(), nth)));

            match target {
                Some(t) => format!(
                    r##"<sup class="cite"><a href="#src-{i}" title="{title}">{i}</a></sup>"##,
                    i = t.index,
                    title = escape_html(&t.title),
                ),
                None => caps[0].to_string(),
            }
        })
        .into_owned()
}

/// Escapes `text` for HTML, then resolves its citation markers
pub fn cite(text: &str, map: &CitationMap) -> String {
    process_citations(&escape_html(text), map)
}
