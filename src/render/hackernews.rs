use super::{escape_html, present, Renderer};
use crate::archiver::HnItem;

impl Renderer {
    /// Renders a Hacker News story
    ///
    /// The extracted linked article (when any) comes first, then the story
    /// meta line, the self-post text and the comment tree. Story and comment
    /// `text` is upstream HTML and is embedded as-is.
    pub fn hacker_news_story(&self, item: &HnItem, url: &str, article_content: Option<&str>) -> String {
        let mut html = String::new();

        if let Some(content) = article_content {
            html.push_str(&format!("<div class=\"article-content\">{}</div>\n", content));
        }

        html.push_str("<div class=\"story-meta\">\n");
        html.push_str(&format!(
            "<p><a href=\"{}\">original link</a> &middot; {} points &middot; {} comments",
            escape_html(url),
            item.score.unwrap_or(0),
            item.descendants.unwrap_or(0)
        ));
        if let Some(by) = present(&item.by) {
            html.push_str(&format!(" &middot; by {}", escape_html(by)));
        }
        html.push_str("</p>\n</div>\n");

        if let Some(text) = present(&item.text) {
            html.push_str(&format!("<div class=\"story-text\">{}</div>\n", text));
        }

        if !item.comments.is_empty() {
            html.push_str("<section class=\"comments\">\n<h2>Comments</h2>\n");
            for comment in &item.comments {
                self.push_comment(&mut html, comment);
            }
            html.push_str("</section>\n");
        }

        html
    }

    fn push_comment(&self, html: &mut String, comment: &HnItem) {
        html.push_str("<div class=\"comment\">\n");
        html.push_str(&format!(
            "<p class=\"comment-meta\"><strong>{}</strong>",
            escape_html(present(&comment.by).unwrap_or("[deleted]"))
        ));
        if let Some(time) = comment.time {
            html.push_str(&format!(" <span class=\"comment-time\">{}</span>", self.hn_time(time)));
        }
        html.push_str("</p>\n");

        if let Some(text) = present(&comment.text) {
            html.push_str(&format!("<div class=\"comment-text\">{}</div>\n", text));
        }

        if !comment.comments.is_empty() {
            html.push_str("<div class=\"comment-replies\">\n");
            for reply in &comment.comments {
                self.push_comment(html, reply);
            }
            html.push_str("</div>\n");
        }

        html.push_str("</div>\n");
    }
}
