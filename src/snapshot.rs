//! Static JSON snapshots (posts, reviews, Instagram, phone codes). A
//! source is either a local file or an http(s) URL; URLs get a `?v=`
//! cache buster so intermediaries never serve a stale copy.

use serde::de::DeserializeOwned;

use crate::models::instagram::InstagramSnapshot;
use crate::models::phone::{sort_codes, PhoneCode};
use crate::models::post::Post;
use crate::models::review::ReviewsSnapshot;

fn is_remote(source: &str) -> bool {
    source.starts_with("http://") || source.starts_with("https://")
}

/// Append `v=<millis>` to the URL's query.
pub fn cache_busted(source: &str, millis: i64) -> String {
    let sep = if source.contains('?') { '&' } else { '?' };
    format!("{}{}v={}", source, sep, millis)
}

fn fetch_remote(url: &str) -> Result<String, String> {
    let client = reqwest::blocking::Client::builder()
        .timeout(std::time::Duration::from_secs(10))
        .build()
        .map_err(|e| format!("HTTP client error: {}", e))?;
    let resp = client
        .get(cache_busted(url, chrono::Utc::now().timestamp_millis()))
        .header("Cache-Control", "no-store")
        .send()
        .map_err(|e| format!("Snapshot request failed: {}", e))?;
    if !resp.status().is_success() {
        return Err(format!("HTTP {}", resp.status()));
    }
    resp.text().map_err(|e| e.to_string())
}

/// Read and parse a snapshot. Blocking; see [`load`] for async callers.
pub fn load_blocking<T: DeserializeOwned>(source: &str) -> Result<T, String> {
    if source.trim().is_empty() {
        return Err("No snapshot configured".to_string());
    }
    let raw = if is_remote(source) {
        fetch_remote(source)?
    } else {
        std::fs::read_to_string(source).map_err(|e| format!("{}: {}", source, e))?
    };
    serde_json::from_str(&raw).map_err(|e| format!("{}: {}", source, e))
}

pub async fn load<T: DeserializeOwned + Send + 'static>(source: &str) -> Result<T, String> {
    let source = source.to_string();
    rocket::tokio::task::spawn_blocking(move || load_blocking::<T>(&source))
        .await
        .map_err(|e| e.to_string())?
}

/// `posts.json`: a bare array of posts, newest first.
pub async fn posts(source: &str) -> Result<Vec<Post>, String> {
    let mut posts: Vec<Post> = load(source).await?;
    crate::models::post::sort_by_date_desc(&mut posts);
    Ok(posts)
}

pub async fn reviews(source: &str) -> Result<ReviewsSnapshot, String> {
    load(source).await
}

pub async fn instagram(source: &str) -> Result<InstagramSnapshot, String> {
    load(source).await
}

/// Phone codes sorted for the contact form select, Italy first.
pub async fn phone_codes(source: &str) -> Result<Vec<PhoneCode>, String> {
    Ok(sort_codes(load(source).await?))
}
