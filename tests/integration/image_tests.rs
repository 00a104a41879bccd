//! Image rewriter against a mocked image host

use crate::common::fast_options;
use inkfeed::archiver::{Article, ArticleMetadata, GroupResult};
use inkfeed::images::{download_images, embed_images, embed_local_images, image_filename, rewrite_group_images};
use std::path::Path;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const PNG: &[u8] = b"\x89PNG\r\n\x1a\nfake";

async fn mount_png(server: &MockServer, route: &str, calls: u64) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(ResponseTemplate::new(200).set_body_raw(PNG.to_vec(), "image/png"))
        .expect(calls)
        .mount(server)
        .await;
}

fn files_in(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = std::fs::read_dir(dir)
        .map(|entries| {
            entries
                .filter_map(|e| e.ok())
                .map(|e| e.file_name().to_string_lossy().into_owned())
                .collect()
        })
        .unwrap_or_default();
    names.sort();
    names
}

#[tokio::test]
async fn test_download_dedups_and_rewrites() {
    let server = MockServer::start().await;
    let tmp = tempfile::tempdir().unwrap();
    mount_png(&server, "/a.png", 1).await;
    Mock::given(method("GET"))
        .and(path("/missing.jpg"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&server)
        .await;

    let a = format!("{}/a.png", server.uri());
    let missing = format!("{}/missing.jpg", server.uri());
    let html = format!(
        r#"<p><img src="{a}"></p><img alt="again" src="{a}"><img src="data:image/gif;base64,R0lG"><img src="{missing}">"#
    );

    let out = download_images(&html, tmp.path(), None, &fast_options()).await.unwrap();

    let local = format!("images/{}", image_filename(&a, "image/png"));
    assert_eq!(
        out,
        format!(
            r#"<p><img src="{local}"></p><img alt="again" src="{local}"><img src="data:image/gif;base64,R0lG"><img src="{missing}">"#
        )
    );
    assert_eq!(files_in(&tmp.path().join("images")), [image_filename(&a, "image/png")]);
    assert_eq!(std::fs::read(tmp.path().join(&local)).unwrap(), PNG);

    // A second pass finds nothing left to download
    let again = download_images(&out, tmp.path(), None, &fast_options()).await.unwrap();
    assert_eq!(again, out);
}

#[tokio::test]
async fn test_escaped_query_string_is_decoded_before_fetch() {
    let server = MockServer::start().await;
    let tmp = tempfile::tempdir().unwrap();
    Mock::given(method("GET"))
        .and(path("/img.png"))
        .and(query_param("w", "1"))
        .and(query_param("h", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(PNG.to_vec(), "image/png"))
        .expect(1)
        .mount(&server)
        .await;

    let html = format!(r#"<img src="{}/img.png?w=1&amp;h=2">"#, server.uri());
    let out = download_images(&html, tmp.path(), None, &fast_options()).await.unwrap();

    let url = format!("{}/img.png?w=1&h=2", server.uri());
    assert_eq!(out, format!(r#"<img src="images/{}">"#, image_filename(&url, "image/png")));
}

#[tokio::test]
async fn test_html_without_images_needs_no_directory() {
    let tmp = tempfile::tempdir().unwrap();
    let html = "<p>Text only</p>";
    let out = download_images(html, tmp.path(), None, &fast_options()).await.unwrap();
    assert_eq!(out, html);
    assert!(!tmp.path().join("images").exists());
}

#[tokio::test]
async fn test_embed_images_inline() {
    let server = MockServer::start().await;
    mount_png(&server, "/a.png", 1).await;

    let a = format!("{}/a.png", server.uri());
    let html = format!(r#"<img src="{a}"><img src='{a}'>"#);
    let out = embed_images(&html, None, &fast_options()).await.unwrap();

    let uri = "data:image/png;base64,iVBORw0KGgpmYWtl";
    assert_eq!(out, format!(r#"<img src="{uri}"><img src="{uri}">"#));
}

#[tokio::test]
async fn test_embed_local_after_download() {
    let server = MockServer::start().await;
    let tmp = tempfile::tempdir().unwrap();
    mount_png(&server, "/a.png", 1).await;

    let html = format!(r#"<img src="{}/a.png">"#, server.uri());
    let relocated = download_images(&html, tmp.path(), None, &fast_options()).await.unwrap();
    let embedded = embed_local_images(&relocated, tmp.path()).await;
    assert_eq!(embedded, r#"<img src="data:image/png;base64,iVBORw0KGgpmYWtl">"#);
}

#[tokio::test]
async fn test_rewrite_group_images_uses_group_cache() {
    let server = MockServer::start().await;
    let tmp = tempfile::tempdir().unwrap();
    mount_png(&server, "/shared.png", 2).await;

    let src = format!("{}/shared.png", server.uri());
    let article = |title: &str| Article {
        title: title.to_string(),
        author: "unknown".to_string(),
        source_url: String::new(),
        content_html: format!(r#"<img src="{src}">"#),
        snapshot_date: chrono::Utc::now(),
        publish_date: None,
        metadata: ArticleMetadata::Feed {
            feed_url: String::new(),
            entry_id: String::new(),
        },
    };
    let mut group = GroupResult {
        display_name: "Blog".to_string(),
        rel_path: "blog".to_string(),
        cache_dir: tmp.path().join("blog"),
        articles: vec![article("one"), article("two")],
    };

    rewrite_group_images(&mut group, None, &fast_options(), false).await.unwrap();

    let expected = format!(r#"<img src="images/{}">"#, image_filename(&src, "image/png"));
    assert!(group.articles.iter().all(|a| a.content_html == expected));
    assert_eq!(files_in(&tmp.path().join("blog/images")).len(), 1);
}
