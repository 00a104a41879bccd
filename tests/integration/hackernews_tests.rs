//! Hacker News archiver against a mocked Firebase list and Algolia item API

use crate::common::{article_page, fast_options, source, FlakyJson};
use inkfeed::archiver::{Archiver, HackerNewsArchiver};
use inkfeed::{ArticleMetadata, InkfeedError, Renderer};
use serde_json::{json, Value};
use std::sync::Arc;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn archiver(server: &MockServer, output: &std::path::Path, extra: &str) -> HackerNewsArchiver {
    let params = format!(
        "api-base = \"{base}/v0\"\nalgolia-base = \"{base}/api/v1\"\n{extra}",
        base = server.uri()
    );
    HackerNewsArchiver::new(
        source("hackernews", None, &params),
        output.to_path_buf(),
        Arc::new(Renderer::new()),
    )
    .expect("Failed to build archiver")
}

fn comment(id: u64, author: &str, text: &str, children: Vec<Value>) -> Value {
    json!({
        "id": id,
        "type": "comment",
        "author": author,
        "text": text,
        "points": null,
        "created_at_i": 1700000000,
        "children": children
    })
}

/// A story in the Algolia item shape with a three-level comment tree
fn deep_story() -> Value {
    json!({
        "id": 1,
        "type": "story",
        "author": "pg",
        "title": "Story one",
        "url": "https://example.com/one",
        "points": 120,
        "created_at_i": 1700000000,
        "children": [
            comment(10, "alice", "<p>top level</p>", vec![
                comment(11, "bob", "<p>first reply</p>", vec![
                    comment(12, "carol", "<p>too deep to keep</p>", vec![]),
                ]),
            ]),
            comment(13, "dave", "<p>second top level</p>", vec![]),
        ]
    })
}

async fn mount_item(server: &MockServer, id: u64, body: Value) {
    Mock::given(method("GET"))
        .and(path(format!("/api/v1/items/{id}")))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_run_counts_comments_before_trimming() {
    let server = MockServer::start().await;
    let tmp = tempfile::tempdir().unwrap();

    Mock::given(method("GET"))
        .and(path("/v0/topstories.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([1, 2, 3, 4])))
        .mount(&server)
        .await;

    mount_item(&server, 1, deep_story()).await;
    mount_item(
        &server,
        2,
        json!({"id": 2, "type": "story", "author": "sama", "title": "Ask HN: two", "text": "<p>self post</p>",
               "points": 5, "created_at_i": 1700000100, "children": []}),
    )
    .await;
    mount_item(&server, 3, comment(3, "eve", "<p>not a story</p>", vec![])).await;

    // Only the first three ids are requested
    Mock::given(method("GET"))
        .and(path("/api/v1/items/4"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(0)
        .mount(&server)
        .await;

    let archiver = archiver(
        &server,
        tmp.path(),
        "top-stories = 3\nmax-comment-depth = 2\nmax-comments-per-level = 10\ninclude-article-content = false",
    );
    let result = archiver.run(None, &fast_options()).await.unwrap();

    assert_eq!(result.source_name, "hackernews");
    assert_eq!(result.groups.len(), 1);
    let group = &result.groups[0];
    assert_eq!(group.rel_path, "hackernews");
    assert!(group.cache_dir.is_dir());
    assert!(group.cache_dir.starts_with(tmp.path().join(".cache/hackernews")));

    let articles = &group.articles;
    assert_eq!(articles.len(), 2, "the comment item is dropped");
    assert_eq!(articles[0].title, "Story one");
    assert_eq!(articles[1].title, "Ask HN: two");

    let first = &articles[0];
    assert_eq!(first.author, "pg");
    assert_eq!(first.source_url, "https://example.com/one");
    assert_eq!(
        first.metadata,
        ArticleMetadata::HackerNews {
            hn_id: 1,
            score: 120,
            num_comments: 4,
        }
    );
    assert!(first.content_html.contains("4 comments"));
    assert!(first.content_html.contains("first reply"));
    assert!(!first.content_html.contains("too deep to keep"));

    let second = &articles[1];
    assert_eq!(second.source_url, "https://news.ycombinator.com/item?id=2");
    assert!(second.content_html.contains("self post"));
    assert!(second.publish_date.is_some());
}

#[tokio::test]
async fn test_linked_article_is_extracted() {
    let server = MockServer::start().await;
    let tmp = tempfile::tempdir().unwrap();
    let paragraph = "The linked article explains the new release in considerable detail for readers.";

    Mock::given(method("GET"))
        .and(path("/v0/topstories.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([7])))
        .mount(&server)
        .await;
    mount_item(
        &server,
        7,
        json!({"id": 7, "type": "story", "author": "tptacek", "title": "Release notes",
               "url": format!("{}/posts/release", server.uri()), "points": 42, "children": []}),
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/posts/release"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(article_page("Release notes", paragraph), "text/html"))
        .expect(1)
        .mount(&server)
        .await;

    let archiver = archiver(&server, tmp.path(), "include-comments = false");
    let stories = archiver.fetch(None, &fast_options()).await.unwrap();
    assert_eq!(stories.len(), 1);
    assert!(stories[0].article_html.is_some());

    let articles = archiver.process(stories);
    let html = &articles[0].content_html;
    assert!(html.starts_with(r#"<div class="article-content">"#));
    assert!(html.contains(paragraph));
    assert!(!html.contains("Copyright"));
    assert!(html.contains("42 points"));
}

#[tokio::test]
async fn test_unavailable_linked_page_degrades() {
    let server = MockServer::start().await;
    let tmp = tempfile::tempdir().unwrap();

    Mock::given(method("GET"))
        .and(path("/v0/topstories.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([8])))
        .mount(&server)
        .await;
    mount_item(
        &server,
        8,
        json!({"id": 8, "type": "story", "title": "Gone", "url": format!("{}/gone", server.uri()), "children": []}),
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/gone"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&server)
        .await;

    let archiver = archiver(&server, tmp.path(), "");
    let articles = archiver.process(archiver.fetch(None, &fast_options()).await.unwrap());
    assert_eq!(articles.len(), 1);
    assert_eq!(articles[0].author, "anonymous");
    assert!(!articles[0].content_html.contains("article-content"));
}

#[tokio::test]
async fn test_top_stories_retried_on_server_error() {
    let server = MockServer::start().await;
    let tmp = tempfile::tempdir().unwrap();

    Mock::given(method("GET"))
        .and(path("/v0/topstories.json"))
        .respond_with(FlakyJson::new(2, 503, json!([1])))
        .expect(3)
        .mount(&server)
        .await;
    mount_item(&server, 1, deep_story()).await;

    let archiver = archiver(&server, tmp.path(), "include-article-content = false");
    let stories = archiver.fetch(None, &fast_options()).await.unwrap();
    assert_eq!(stories.len(), 1);
    assert_eq!(stories[0].item.descendants, Some(4));
}

#[tokio::test]
async fn test_failed_story_does_not_sink_batch() {
    let server = MockServer::start().await;
    let tmp = tempfile::tempdir().unwrap();

    Mock::given(method("GET"))
        .and(path("/v0/topstories.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([1, 2])))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/v1/items/1"))
        .respond_with(ResponseTemplate::new(500))
        .expect(3)
        .mount(&server)
        .await;
    mount_item(
        &server,
        2,
        json!({"id": 2, "type": "story", "title": "Survivor", "children": []}),
    )
    .await;

    let archiver = archiver(&server, tmp.path(), "include-article-content = false");
    let stories = archiver.fetch(None, &fast_options()).await.unwrap();
    assert_eq!(stories.len(), 1);
    assert_eq!(stories[0].item.title.as_deref(), Some("Survivor"));
}

#[tokio::test]
async fn test_client_error_is_not_retried() {
    let server = MockServer::start().await;
    let tmp = tempfile::tempdir().unwrap();

    Mock::given(method("GET"))
        .and(path("/v0/topstories.json"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&server)
        .await;

    let archiver = archiver(&server, tmp.path(), "");
    let err = archiver.run(None, &fast_options()).await.unwrap_err();
    assert!(matches!(err, InkfeedError::Status { status: 404, .. }));
}

#[tokio::test]
async fn test_shared_client_is_used() {
    let server = MockServer::start().await;
    let tmp = tempfile::tempdir().unwrap();

    Mock::given(method("GET"))
        .and(path("/v0/topstories.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(2)
        .mount(&server)
        .await;

    let client = reqwest::Client::new();
    let archiver = archiver(&server, tmp.path(), "");
    assert!(archiver.fetch(Some(&client), &fast_options()).await.unwrap().is_empty());

    // The caller's client is still usable afterwards
    assert!(archiver.fetch(Some(&client), &fast_options()).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_long_reply_chain_is_decoded() {
    let server = MockServer::start().await;
    let tmp = tempfile::tempdir().unwrap();

    let mut chain = comment(1070, "last", "<p>deepest reply</p>", vec![]);
    for id in (1000..1070).rev() {
        chain = comment(id, "replier", "<p>reply</p>", vec![chain]);
    }

    Mock::given(method("GET"))
        .and(path("/v0/topstories.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([9])))
        .mount(&server)
        .await;
    mount_item(
        &server,
        9,
        json!({"id": 9, "type": "story", "title": "Flame war", "points": 3, "children": [chain]}),
    )
    .await;

    let archiver = archiver(&server, tmp.path(), "include-article-content = false");
    let stories = archiver.fetch(None, &fast_options()).await.unwrap();
    assert_eq!(stories.len(), 1);
    assert_eq!(stories[0].item.descendants, Some(71));
}
