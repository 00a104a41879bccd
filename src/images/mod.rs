//! Image rewriter
//!
//! Finds `<img src>` references in rendered HTML and either relocates the
//! images into the group's cache directory or inlines them as `data:` URIs,
//! so the output reads offline.
//!
//! Sources that are already `data:` URIs or local `images/` paths are never
//! touched, which keeps both transforms idempotent. Each unique URL is
//! fetched once per call; a URL that cannot be fetched keeps its original
//! `src`. Attribute values are entity-decoded before they are requested, so
//! `?w=800&amp;q=75` is fetched as `?w=800&q=75`.

use crate::archiver::{ensure_dir, GroupResult};
use crate::fetch::{fetch_ordered, get_bytes, with_retry, ClientScope, FetchOptions, FetchedBody, RetryPolicy};
use crate::{InkfeedError, Result};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use reqwest::Client;
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;
use tracing::debug;

/// Subdirectory of a group cache holding relocated images
pub const IMAGE_DIR: &str = "images";

/// Per-request timeout for image downloads
pub const IMAGE_TIMEOUT: Duration = Duration::from_secs(15);

static IMG_SRC_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"(?i)(<img\s(?:[^>]*?\s)?)src=["']([^"']+)["']"#).expect("img src pattern"));

/// Content types we recognise, with their file extension
const IMAGE_TYPES: &[(&str, &str)] = &[
    ("image/jpeg", ".jpg"),
    ("image/png", ".png"),
    ("image/gif", ".gif"),
    ("image/webp", ".webp"),
    ("image/svg+xml", ".svg"),
];

const URL_EXTENSIONS: &[&str] = &[".jpg", ".jpeg", ".png", ".gif", ".webp", ".svg"];

const FALLBACK_MIME: &str = "application/octet-stream";

/// Unique foreign image `src` values in `html` as written, in order of first appearance
pub fn collect_image_urls(html: &str) -> Vec<String> {
    let mut urls: Vec<String> = Vec::new();
    for caps in IMG_SRC_RE.captures_iter(html) {
        let src = &caps[2];
        if is_foreign(src) && !urls.iter().any(|u| u == src) {
            urls.push(src.to_string());
        }
    }
    urls
}

fn is_foreign(src: &str) -> bool {
    !src.starts_with("data:") && !src.starts_with("images/")
}

/// The URL an attribute value refers to, with character references decoded
///
/// Values that are not valid escaped text, such as a bare `&` in a query
/// string, are already literal and come back unchanged.
pub fn attribute_url(src: &str) -> String {
    quick_xml::escape::unescape(src)
        .map(|url| url.into_owned())
        .unwrap_or_else(|_| src.to_string())
}

/// Replaces every `src` found in `replacements`, leaving the rest verbatim
fn rewrite_sources(html: &str, replacements: &HashMap<String, String>) -> String {
    if replacements.is_empty() {
        return html.to_string();
    }
    IMG_SRC_RE
        .replace_all(html, |caps: &Captures| match replacements.get(&caps[2]) {
            Some(new_src) => format!("{}src=\"{}\"", &caps[1], new_src),
            None => caps[0].to_string(),
        })
        .into_owned()
}

/// Stable file name: 16 hex chars of the URL's SHA-256 plus an extension
pub fn image_filename(url: &str, content_type: &str) -> String {
    let digest = hex::encode(Sha256::digest(url.as_bytes()));
    let ext = extension_for(content_type, url);
    format!("{}{}", &digest[..16], ext)
}

/// Extension from the content type, else the URL suffix, else `.bin`
fn extension_for(content_type: &str, url: &str) -> &'static str {
    if let Some((_, ext)) = IMAGE_TYPES.iter().find(|(mime, _)| content_type.contains(mime)) {
        return ext;
    }

    let path = url.split(['?', '#']).next().unwrap_or("").to_ascii_lowercase();
    URL_EXTENSIONS
        .iter()
        .find(|ext| path.ends_with(*ext))
        .copied()
        .unwrap_or(".bin")
}

fn mime_for_content_type(content_type: &str) -> &'static str {
    IMAGE_TYPES
        .iter()
        .find(|(mime, _)| content_type.contains(mime))
        .map(|(mime, _)| *mime)
        .unwrap_or(FALLBACK_MIME)
}

fn mime_for_extension(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();
    match ext.as_str() {
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "svg" => "image/svg+xml",
        _ => FALLBACK_MIME,
    }
}

fn data_uri(mime: &str, bytes: &[u8]) -> String {
    format!("data:{};base64,{}", mime, BASE64.encode(bytes))
}

async fn fetch_image(client: &Client, url: &str, retry: &RetryPolicy) -> Result<FetchedBody> {
    with_retry(retry, "image", || get_bytes(client, url, &[], Some(IMAGE_TIMEOUT))).await
}

/// Downloads every foreign image into `<dir>/images/` and points `src` at the copy
///
/// # Arguments
///
/// * `html` - Rendered article HTML
/// * `dir` - Group cache directory
/// * `client` - Shared client; a local one is built when `None`
/// * `options` - Worker count, retry policy and local client settings
///
/// # Returns
///
/// The rewritten HTML. Failed downloads leave their `src` unchanged; only
/// client construction or creating the image directory can fail the call.
pub async fn download_images(html: &str, dir: &Path, client: Option<&Client>, options: &FetchOptions) -> Result<String> {
    let urls = collect_image_urls(html);
    if urls.is_empty() {
        return Ok(html.to_string());
    }

    let scope = ClientScope::resolve(client, &options.http)?;
    let image_dir = dir.join(IMAGE_DIR);
    ensure_dir(&image_dir).await?;

    let client: &Client = &scope;
    let image_dir = image_dir.as_path();
    let retry = &options.retry;
    let saved = fetch_ordered(urls, options.max_workers, "images", move |src: String| async move {
        let url = attribute_url(&src);
        let body = fetch_image(client, &url, retry).await?;
        let filename = image_filename(&url, &body.content_type);
        tokio::fs::write(image_dir.join(&filename), &body.bytes).await?;
        debug!(%url, %filename, "Saved image");
        Ok::<_, InkfeedError>((src, format!("{IMAGE_DIR}/{filename}")))
    })
    .await;

    Ok(rewrite_sources(html, &saved.into_iter().collect()))
}

/// Inlines every foreign image as a base64 `data:` URI
///
/// Each unique URL is fetched once; failed URLs keep their `src`.
pub async fn embed_images(html: &str, client: Option<&Client>, options: &FetchOptions) -> Result<String> {
    let urls = collect_image_urls(html);
    if urls.is_empty() {
        return Ok(html.to_string());
    }

    let scope = ClientScope::resolve(client, &options.http)?;
    let client: &Client = &scope;
    let retry = &options.retry;
    let inlined = fetch_ordered(urls, options.max_workers, "embedded images", move |src: String| async move {
        let body = fetch_image(client, &attribute_url(&src), retry).await?;
        let uri = data_uri(mime_for_content_type(&body.content_type), &body.bytes);
        Ok::<_, InkfeedError>((src, uri))
    })
    .await;

    Ok(rewrite_sources(html, &inlined.into_iter().collect()))
}

/// Inlines already-downloaded `images/...` sources from `dir`, without network access
///
/// Missing files keep their `src`.
pub async fn embed_local_images(html: &str, dir: &Path) -> String {
    let mut local: Vec<String> = Vec::new();
    for caps in IMG_SRC_RE.captures_iter(html) {
        let src = &caps[2];
        if src.starts_with("images/") && !src.contains("..") && !local.iter().any(|s| s == src) {
            local.push(src.to_string());
        }
    }

    let mut replacements = HashMap::new();
    for src in local {
        let path = dir.join(&src);
        match tokio::fs::read(&path).await {
            Ok(bytes) => {
                let uri = data_uri(mime_for_extension(&path), &bytes);
                replacements.insert(src, uri);
            }
            Err(e) => debug!(path = %path.display(), error = %e, "Local image unavailable"),
        }
    }

    rewrite_sources(html, &replacements)
}

/// Rewrites the images of every article in a group
///
/// Relocates into the group's cache directory, or inlines when `embed` is
/// set. One client serves the whole group.
pub async fn rewrite_group_images(
    group: &mut GroupResult,
    client: Option<&Client>,
    options: &FetchOptions,
    embed: bool,
) -> Result<()> {
    let scope = ClientScope::resolve(client, &options.http)?;

    for article in &mut group.articles {
        article.content_html = if embed {
            embed_images(&article.content_html, Some(&scope), options).await?
        } else {
            download_images(&article.content_html, &group.cache_dir, Some(&scope), options).await?
        };
    }

    Ok(())
}
