use super::{escape_html, present, Renderer};
use crate::archiver::KagiStory;
use crate::transform::{build_citation_map, cite, CitationMap};

impl Renderer {
    /// Renders a Kagi News story
    ///
    /// Sections appear in a fixed order and only when the story carries
    /// them. All upstream text is escaped and its `[domain#N]` markers are
    /// linked to the numbered source list.
    pub fn kagi_story(&self, story: &KagiStory) -> String {
        let cmap = build_citation_map(&story.articles);
        let mut html = String::from("<div class=\"article-content\">\n");

        if let Some(summary) = present(&story.short_summary) {
            html.push_str(&format!(
                "<div class=\"story-summary\"><p>{}</p></div>\n",
                cite(summary, &cmap)
            ));
        }

        if let Some(image) = story.primary_image.as_ref().filter(|i| !i.url.is_empty()) {
            let caption = present(&image.caption).unwrap_or("");
            html.push_str("<figure class=\"story-image\">\n");
            html.push_str(&format!(
                "<img src=\"{}\" alt=\"{}\">\n",
                escape_html(&image.url),
                escape_html(caption)
            ));
            if !caption.is_empty() || present(&image.credit).is_some() {
                html.push_str(&format!("<figcaption>{}", escape_html(caption)));
                if let Some(credit) = present(&image.credit) {
                    html.push_str(&format!(" <span class=\"image-credit\">{}</span>", escape_html(credit)));
                }
                html.push_str("</figcaption>\n");
            }
            html.push_str("</figure>\n");
        }

        if !story.articles.is_empty() {
            html.push_str("<div class=\"source-articles\">\n<h2>Sources</h2>\n<ol>\n");
            for (i, article) in story.articles.iter().enumerate() {
                html.push_str(&format!(
                    "<li id=\"src-{}\"><a href=\"{}\">{}</a>",
                    i + 1,
                    escape_html(&article.link),
                    escape_html(&article.title)
                ));
                if let Some(domain) = present(&article.domain) {
                    html.push_str(&format!(" <span class=\"source-domain\">{}</span>", escape_html(domain)));
                }
                html.push_str(&self.format_source_date(article.date.as_deref()));
                html.push_str("</li>\n");
            }
            html.push_str("</ol>\n</div>\n");
        }

        if !story.talking_points.is_empty() {
            html.push_str("<div class=\"talking-points\">\n<h2>Highlights</h2>\n");
            push_list(&mut html, "ol", &story.talking_points, &cmap);
            html.push_str("</div>\n");
        }

        if let Some(quote) = present(&story.quote) {
            html.push_str(&format!(
                "<blockquote class=\"story-quote\">\n<p>{}</p>\n",
                cite(quote, &cmap)
            ));
            if let Some(author) = present(&story.quote_author) {
                let attribution = match present(&story.quote_source_url) {
                    Some(url) => format!("<a href=\"{}\">{}</a>", escape_html(url), escape_html(author)),
                    None => escape_html(author),
                };
                html.push_str(&format!("<footer>{}</footer>\n", attribution));
            }
            html.push_str("</blockquote>\n");
        }

        let perspectives: Vec<_> = story.perspectives.iter().filter(|p| !p.text.trim().is_empty()).collect();
        if !perspectives.is_empty() {
            html.push_str("<div class=\"perspectives\">\n<h2>Perspectives</h2>\n<ul>\n");
            for perspective in perspectives {
                html.push_str(&format!("<li>{}", cite(&perspective.text, &cmap)));
                let sources: Vec<String> = perspective
                    .sources
                    .iter()
                    .filter(|s| !s.name.is_empty())
                    .map(|s| {
                        if s.url.is_empty() {
                            escape_html(&s.name)
                        } else {
                            format!("<a href=\"{}\">{}</a>", escape_html(&s.url), escape_html(&s.name))
                        }
                    })
                    .collect();
                if !sources.is_empty() {
                    html.push_str(&format!(" <span class=\"perspective-sources\">({})</span>", sources.join(", ")));
                }
                html.push_str("</li>\n");
            }
            html.push_str("</ul>\n</div>\n");
        }

        if let Some(background) = present(&story.historical_background) {
            push_section(&mut html, "Historical Background", Some(background), &[], &cmap);
        }

        let timeline: Vec<_> = story
            .timeline
            .iter()
            .map(|entry| entry.parts())
            .filter(|(_, content)| !content.is_empty())
            .collect();
        if !timeline.is_empty() {
            html.push_str("<div class=\"timeline\">\n<h2>Timeline</h2>\n");
            for (date, content) in timeline {
                html.push_str("<div class=\"timeline-item\"><span class=\"timeline-dot\"></span>");
                if !date.is_empty() {
                    html.push_str(&format!("<strong>{}</strong> ", escape_html(date)));
                }
                html.push_str(&format!("{}</div>\n", cite(content, &cmap)));
            }
            html.push_str("</div>\n");
        }

        if !story.international_reactions.is_empty() {
            html.push_str("<div class=\"international-reactions\">\n<h2>International Reactions</h2>\n");
            push_list(&mut html, "ul", &story.international_reactions, &cmap);
            html.push_str("</div>\n");
        }

        let business_text = present(&story.business_angle_text);
        if business_text.is_some() || !story.business_angle_points.is_empty() {
            push_section(&mut html, "Business Angle", business_text, &story.business_angle_points, &cmap);
        }
        if !story.scientific_significance.is_empty() {
            push_section(&mut html, "Scientific Significance", None, &story.scientific_significance, &cmap);
        }
        if !story.gameplay_mechanics.is_empty() {
            push_section(&mut html, "Gameplay Mechanics", None, &story.gameplay_mechanics, &cmap);
        }
        if !story.performance_statistics.is_empty() {
            push_section(&mut html, "Performance Statistics", None, &story.performance_statistics, &cmap);
        }
        if let Some(standings) = present(&story.league_standings) {
            push_section(&mut html, "League Standings", Some(standings), &[], &cmap);
        }

        let qna: Vec<_> = story.suggested_qna.iter().filter(|q| !q.question.trim().is_empty()).collect();
        if !qna.is_empty() {
            html.push_str("<div class=\"suggested-qna\">\n<h2>Questions &amp; Answers</h2>\n");
            for pair in qna {
                html.push_str(&format!(
                    "<details>\n<summary>{}</summary>\n<p>{}</p>\n</details>\n",
                    cite(&pair.question, &cmap),
                    cite(&pair.answer, &cmap)
                ));
            }
            html.push_str("</div>\n");
        }

        if !story.user_action_items.is_empty() {
            html.push_str("<div class=\"action-items\">\n<h2>What You Can Do</h2>\n");
            push_list(&mut html, "ul", &story.user_action_items, &cmap);
            html.push_str("</div>\n");
        }

        if let Some(fact) = present(&story.did_you_know) {
            html.push_str(&format!(
                "<aside class=\"did-you-know\">\n<h2>Did you know?</h2>\n<p>{}</p>\n</aside>\n",
                cite(fact, &cmap)
            ));
        }

        html.push_str("</div>\n");
        html
    }
}

fn push_list(html: &mut String, tag: &str, items: &[String], cmap: &CitationMap) {
    html.push_str(&format!("<{}>\n", tag));
    for item in items.iter().filter(|i| !i.trim().is_empty()) {
        html.push_str(&format!("<li>{}</li>\n", cite(item, cmap)));
    }
    html.push_str(&format!("</{}>\n", tag));
}

/// A titled `kagi-section` block with optional text and bullet points
fn push_section(html: &mut String, heading: &str, text: Option<&str>, points: &[String], cmap: &CitationMap) {
    html.push_str(&format!("<div class=\"kagi-section\">\n<h2>{}</h2>\n", heading));
    if let Some(text) = text {
        html.push_str(&format!("<p>{}</p>\n", cite(text, cmap)));
    }
    if !points.is_empty() {
        push_list(html, "ul", points, cmap);
    }
    html.push_str("</div>\n");
}
