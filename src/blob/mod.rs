use url::form_urlencoded;

pub mod local;

pub const CACHE_CONTROL: &str = "public, max-age=31536000, immutable";

/// A stored object as handed back to the `/o/` route.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredObject {
    pub data: Vec<u8>,
    pub content_type: String,
}

/// Object storage seam. Paths are `/`-separated keys such as
/// `gallery/1700000000000-torta.jpg`.
#[rocket::async_trait]
pub trait BlobStore: Send + Sync {
    /// Upload `data` under `path`. `on_progress` receives the cumulative
    /// number of bytes written so far, ending with `data.len()`.
    async fn put(
        &self,
        path: &str,
        data: &[u8],
        content_type: &str,
        on_progress: &(dyn Fn(u64) + Send + Sync),
    ) -> Result<(), String>;

    /// Public download URL of an existing object.
    async fn download_url(&self, path: &str) -> Result<String, String>;

    /// Delete the object a download URL points at.
    async fn delete_by_url(&self, url: &str) -> Result<(), String>;

    async fn delete_by_path(&self, path: &str) -> Result<(), String>;

    /// Object paths directly under `folder`, in ascending key order.
    async fn list(&self, folder: &str) -> Result<Vec<String>, String>;

    async fn get(&self, path: &str) -> Result<Option<StoredObject>, String>;
}

/// `{base}/o/{encoded path}?alt=media`, the shape every download URL takes.
pub fn object_url(public_base: &str, path: &str) -> String {
    let encoded: String = form_urlencoded::byte_serialize(path.as_bytes()).collect();
    format!("{}/o/{}?alt=media", public_base.trim_end_matches('/'), encoded)
}

/// Decode one URL-encoded object path segment.
pub fn decode_object_path(encoded: &str) -> String {
    form_urlencoded::parse(encoded.as_bytes())
        .next()
        .map(|(k, _)| k.into_owned())
        .unwrap_or_default()
}

/// Recover the object path from a download URL: everything after `/o/`
/// up to the query string, URL-decoded. Relative URLs are accepted.
pub fn object_path_from_url(raw: &str) -> Option<String> {
    let base = url::Url::parse("http://localhost/").ok()?;
    let parsed = base.join(raw.trim()).ok()?;
    let path = parsed.path();
    let idx = path.find("/o/")?;
    let encoded = &path[idx + 3..];
    if encoded.is_empty() {
        return None;
    }
    let decoded = decode_object_path(encoded);
    if decoded.is_empty() {
        None
    } else {
        Some(decoded)
    }
}

/// Content type of an upload: sniffed from the bytes when they are a known
/// image format, else the declared type, else `image/jpeg`.
pub fn sniff_content_type(data: &[u8], declared: Option<&str>) -> String {
    if let Ok(format) = image::guess_format(data) {
        return format.to_mime_type().to_string();
    }
    match declared {
        Some(ct) if !ct.trim().is_empty() => ct.to_string(),
        _ => "image/jpeg".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn url_encodes_the_whole_path() {
        let url = object_url("https://cdn.example.com/", "gallery/1700-torta.jpg");
        assert_eq!(url, "https://cdn.example.com/o/gallery%2F1700-torta.jpg?alt=media");
    }

    #[test]
    fn path_round_trips_through_url() {
        let path = "blog-og/torta-og-1700-foto+1.png";
        let url = object_url("http://localhost:8000", path);
        assert_eq!(object_path_from_url(&url).as_deref(), Some(path));
    }

    #[test]
    fn path_from_hosted_and_relative_urls() {
        assert_eq!(
            object_path_from_url(
                "https://firebasestorage.googleapis.com/v0/b/bucket/o/gallery%2Fa.jpg?alt=media&token=x"
            )
            .as_deref(),
            Some("gallery/a.jpg")
        );
        assert_eq!(
            object_path_from_url("/o/featured%2Fb.jpg?alt=media").as_deref(),
            Some("featured/b.jpg")
        );
        assert_eq!(object_path_from_url("https://example.com/img/a.jpg"), None);
        assert_eq!(object_path_from_url(""), None);
    }

    #[test]
    fn content_type_sniffing() {
        let png = [0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, 0, 0, 0, 0];
        assert_eq!(sniff_content_type(&png, Some("application/octet-stream")), "image/png");
        assert_eq!(sniff_content_type(b"plain", Some("text/plain")), "text/plain");
        assert_eq!(sniff_content_type(b"plain", None), "image/jpeg");
    }
}
