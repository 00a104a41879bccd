use super::{escape_html, Renderer};

impl Renderer {
    /// Renders a feed entry
    ///
    /// The extracted article wins; without one the feed's own summary (HTML
    /// as published by the feed) is shown in a `summary-fallback` block.
    pub fn feed_entry(&self, article_content: Option<&str>, summary: &str, url: &str, feed_name: &str) -> String {
        let mut html = String::new();

        match article_content {
            Some(content) => html.push_str(&format!("<div class=\"article-content\">{}</div>\n", content)),
            None if !summary.trim().is_empty() => {
                html.push_str(&format!("<div class=\"summary-fallback\">{}</div>\n", summary))
            }
            None => {}
        }

        if !url.is_empty() {
            html.push_str(&format!(
                "<p class=\"source-link\"><a href=\"{}\">original link</a> via {}</p>\n",
                escape_html(url),
                escape_html(feed_name)
            ));
        }

        html
    }
}
