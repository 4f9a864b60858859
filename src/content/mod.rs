use std::fmt;
use std::time::Duration;

use std::sync::Arc;

use rocket::tokio;

use crate::blob::{object_path_from_url, BlobStore};
use crate::store::Store;
use crate::upload::{CredentialRefresh, UploadTracker};

pub mod featured;
pub mod gallery;
pub mod posts;

/// Failure of a content operation. Validation errors are raised before
/// any backend call; backend errors carry the adapter's message.
#[derive(Debug, Clone, PartialEq)]
pub enum ContentError {
    Validation(String),
    Backend(String),
}

impl fmt::Display for ContentError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ContentError::Validation(msg) => write!(f, "{}", msg),
            ContentError::Backend(msg) => write!(f, "{}", msg),
        }
    }
}

impl std::error::Error for ContentError {}

impl From<String> for ContentError {
    fn from(e: String) -> Self {
        ContentError::Backend(e)
    }
}

pub(crate) fn validation(msg: &str) -> ContentError {
    ContentError::Validation(msg.to_string())
}

/// Backends and per-request collaborators a write operation needs.
pub struct ContentCtx<'a> {
    pub store: &'a dyn Store,
    pub blobs: &'a dyn BlobStore,
    pub refresher: &'a dyn CredentialRefresh,
    pub tracker: Option<&'a Arc<UploadTracker>>,
}

/// What happened to the blob during a delete cycle. The record is gone
/// in both cases.
#[derive(Debug, Clone, PartialEq)]
pub enum BlobOutcome {
    Removed,
    Kept(String),
    NoBlob,
}

/// Pause between the first failed URL delete and its retry.
pub fn retry_delay(store: &dyn Store) -> Duration {
    match store.setting_get_i64("blob_delete_retry_ms") {
        n if n > 0 => Duration::from_millis(n as u64),
        _ => Duration::from_millis(250),
    }
}

/// Blob half of a delete: URL delete, one retry after `retry`, then the
/// stored path or the path derived from the URL.
pub async fn delete_blob(
    blobs: &dyn BlobStore,
    url: &str,
    path: &str,
    retry: Duration,
) -> Result<(), String> {
    let url = url.trim();
    let path = path.trim();

    if !url.is_empty() {
        match blobs.delete_by_url(url).await {
            Ok(()) => return Ok(()),
            Err(e) => log::warn!("Blob delete by URL failed, retrying: {}", e),
        }
        tokio::time::sleep(retry).await;
        match blobs.delete_by_url(url).await {
            Ok(()) => return Ok(()),
            Err(e) => log::warn!("Blob delete retry failed: {}", e),
        }
    }

    let target = if path.is_empty() {
        object_path_from_url(url)
    } else {
        Some(path.to_string())
    };
    match target {
        Some(p) => blobs.delete_by_path(&p).await,
        None => Err("Percorso Storage non trovato".to_string()),
    }
}

/// Full delete cycle of a record carrying a blob. Requires `confirmed`.
/// The record is removed whatever happened to the blob.
pub async fn delete_with_blob(
    store: &dyn Store,
    blobs: &dyn BlobStore,
    collection: &str,
    id: &str,
    url: &str,
    path: &str,
    confirmed: bool,
) -> Result<BlobOutcome, ContentError> {
    if !confirmed {
        return Err(validation("Conferma richiesta"));
    }
    if id.trim().is_empty() {
        return Err(validation("Elemento non trovato"));
    }

    let outcome = if url.trim().is_empty() && path.trim().is_empty() {
        BlobOutcome::NoBlob
    } else {
        match delete_blob(blobs, url, path, retry_delay(store)).await {
            Ok(()) => BlobOutcome::Removed,
            Err(e) => {
                log::warn!("Blob of {}/{} left behind: {}", collection, id, e);
                BlobOutcome::Kept(e)
            }
        }
    };

    store.doc_delete(collection, id).map_err(|e| {
        log::error!("Delete of {}/{} failed: {}", collection, id, e);
        ContentError::Backend(e)
    })?;
    Ok(outcome)
}

pub fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// Server timestamp stored on records, sortable as text.
pub fn now_timestamp() -> String {
    chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true)
}
