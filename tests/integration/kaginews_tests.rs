//! Kagi News archiver against a mocked batch/category/story API

use crate::common::{fast_options, source};
use inkfeed::archiver::{Archiver, KagiNewsArchiver};
use inkfeed::{ArticleMetadata, InkfeedError, Renderer};
use serde_json::{json, Value};
use std::sync::Arc;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn archiver(server: &MockServer, output: &std::path::Path, categories: &[&str]) -> KagiNewsArchiver {
    let params = format!(
        "api-base = \"{}\"\ncategories = {:?}\nmax-stories-per-category = 5",
        server.uri(),
        categories
    );
    KagiNewsArchiver::new(
        source("kaginews", Some("api"), &params),
        output.to_path_buf(),
        Arc::new(Renderer::new()),
    )
    .expect("Failed to build archiver")
}

async fn mount_batch(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/api/batches"))
        .and(query_param("lang", "en"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "batches": [{"id": "batch-2"}, {"id": "batch-1"}]
        })))
        .expect(1)
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/batches/batch-2/categories"))
        .and(query_param("lang", "en"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "categories": [
                {"id": "u-tech", "categoryId": "tech", "categoryName": "Technology"},
                {"id": "u-world", "categoryId": "world_news", "categoryName": null},
                {"id": "u-science", "categoryId": "science", "categoryName": "Science"},
                {"id": "u-business", "categoryId": "business", "categoryName": "Business"}
            ]
        })))
        .expect(1)
        .mount(server)
        .await;
}

async fn mount_stories(server: &MockServer, category_id: &str, response: ResponseTemplate) {
    Mock::given(method("GET"))
        .and(path(format!("/api/batches/batch-2/categories/{category_id}/stories")))
        .and(query_param("lang", "en"))
        .and(query_param("limit", "5"))
        .respond_with(response)
        .mount(server)
        .await;
}

fn tech_story() -> Value {
    json!({
        "id": "cluster-1",
        "title": "Linux Kernel 7.0 Released",
        "category": "Technology",
        "emoji": "🐧",
        "unique_domains": 3,
        "short_summary": "The kernel shipped on schedule [lwn.net#1].",
        "talking_points": ["Rust drivers land [phoronix.com#1]"],
        "articles": [
            {"title": "Kernel notes", "link": "https://lwn.net/7.0", "domain": "lwn.net", "date": "2026-01-12T14:00:00Z"},
            {"title": "Linux 7.0", "link": "https://phoronix.com/7.0", "domain": "phoronix.com", "date": "2026-01-11T09:30:00Z"}
        ],
        "timeline": ["Jan 2026:: Release"]
    })
}

#[tokio::test]
async fn test_run_groups_by_category() {
    let server = MockServer::start().await;
    let tmp = tempfile::tempdir().unwrap();
    mount_batch(&server).await;

    mount_stories(
        &server,
        "u-tech",
        ResponseTemplate::new(200).set_body_json(json!({
            "stories": [tech_story(), {"title": 5, "short_summary": "undecodable"}]
        })),
    )
    .await;
    mount_stories(
        &server,
        "u-world",
        ResponseTemplate::new(200).set_body_json(json!({
            "stories": [{"id": "cluster-2", "title": "Summit ends", "articles": null, "perspectives": null}]
        })),
    )
    .await;
    mount_stories(
        &server,
        "u-science",
        ResponseTemplate::new(200).set_body_json(json!({"stories": []})),
    )
    .await;
    mount_stories(&server, "u-business", ResponseTemplate::new(404)).await;

    let archiver = archiver(&server, tmp.path(), &["tech", "sports", "world_news", "science", "business"]);
    let result = archiver.run(None, &fast_options()).await.unwrap();

    let slugs: Vec<&str> = result.groups.iter().map(|g| g.rel_path.as_str()).collect();
    assert_eq!(slugs, ["tech", "world_news"]);
    assert_eq!(result.article_count(), 2);

    let tech = &result.groups[0];
    assert_eq!(tech.display_name, "Technology");
    assert!(tech.cache_dir.is_dir());
    assert!(tech.cache_dir.ends_with("tech"));
    assert!(tech.cache_dir.starts_with(tmp.path().join(".cache/kaginews")));

    let article = &tech.articles[0];
    assert_eq!(article.title, "Linux Kernel 7.0 Released");
    assert_eq!(article.author, "Kagi News");
    assert_eq!(article.source_url, "https://lwn.net/7.0");
    assert_eq!(
        article.publish_date.map(|d| d.to_rfc3339()),
        Some("2026-01-11T09:30:00+00:00".to_string())
    );
    assert_eq!(
        article.metadata,
        ArticleMetadata::Kagi {
            cluster_id: "cluster-1".to_string(),
            category: "Technology".to_string(),
            emoji: "🐧".to_string(),
            unique_domains: 3,
        }
    );
    assert!(article.content_html.contains(r##"<a href="#src-1" title="Kernel notes">1</a>"##));
    assert!(article.content_html.contains(r##"<a href="#src-2" title="Linux 7.0">2</a>"##));
    assert!(article.content_html.contains("<strong>Jan 2026</strong> Release"));

    let world = &result.groups[1];
    assert_eq!(world.display_name, "World News");
    assert_eq!(world.articles[0].source_url, "");
    assert_eq!(world.articles[0].publish_date, None);
}

#[tokio::test]
async fn test_fetch_preserves_configured_order() {
    let server = MockServer::start().await;
    let tmp = tempfile::tempdir().unwrap();
    mount_batch(&server).await;

    for id in ["u-tech", "u-world", "u-science"] {
        mount_stories(
            &server,
            id,
            ResponseTemplate::new(200).set_body_json(json!({"stories": [{"title": id}]})),
        )
        .await;
    }

    let archiver = archiver(&server, tmp.path(), &["science", "tech", "world_news"]);
    let categories = archiver.fetch(None, &fast_options()).await.unwrap();
    let slugs: Vec<&str> = categories.iter().map(|c| c.slug.as_str()).collect();
    assert_eq!(slugs, ["science", "tech", "world_news"]);

    let titles: Vec<String> = archiver.process(categories).into_iter().map(|a| a.title).collect();
    assert_eq!(titles, ["u-science", "u-tech", "u-world"]);
}

#[tokio::test]
async fn test_no_batches_aborts_source() {
    let server = MockServer::start().await;
    let tmp = tempfile::tempdir().unwrap();

    Mock::given(method("GET"))
        .and(path("/api/batches"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"batches": []})))
        .expect(1)
        .mount(&server)
        .await;

    let archiver = archiver(&server, tmp.path(), &["tech"]);
    let err = archiver.run(None, &fast_options()).await.unwrap_err();
    assert!(matches!(err, InkfeedError::NoBatches { ref language } if language == "en"));
}

#[tokio::test]
async fn test_malformed_batch_list_is_not_retried() {
    let server = MockServer::start().await;
    let tmp = tempfile::tempdir().unwrap();

    Mock::given(method("GET"))
        .and(path("/api/batches"))
        .respond_with(ResponseTemplate::new(200).set_body_raw("not json", "application/json"))
        .expect(1)
        .mount(&server)
        .await;

    let archiver = archiver(&server, tmp.path(), &["tech"]);
    let err = archiver.fetch(None, &fast_options()).await.unwrap_err();
    assert!(matches!(err, InkfeedError::Json { .. }));
}
