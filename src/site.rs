//! Public content loaders. Each one prefers the document store, falls
//! back to a snapshot or the blob listing, and never fails the page:
//! the worst case is `None`, which keeps a section's static markup.

use chrono::Utc;

use crate::blob::BlobStore;
use crate::config::SiteConfig;
use crate::content;
use crate::hours::{self, OpeningHours};
use crate::models::featured::FeaturedProduct;
use crate::models::gallery::{DEFAULT_ALT, FOLDER as GALLERY_FOLDER};
use crate::models::instagram::InstagramMedia;
use crate::models::phone::PhoneCode;
use crate::models::post::Post;
use crate::models::review::Review;
use crate::render::sections::GalleryImage;
use crate::reviews::{self, AggregateRating};
use crate::snapshot;
use crate::store::Store;

/// A positive list cap from settings, else `default`.
pub(crate) fn cap(store: &dyn Store, key: &str, default: usize) -> usize {
    match store.setting_get_i64(key) {
        n if n > 0 => n as usize,
        _ => default,
    }
}

/// Posts, newest first. The store is asked first when the backend is on;
/// an empty or failed read falls back to the `posts.json` snapshot.
pub async fn load_posts(config: &SiteConfig, store: Option<&dyn Store>) -> Result<Vec<Post>, String> {
    if let Some(store) = store {
        match content::posts::list(store, cap(store, "posts_list_cap", 200)) {
            Ok(posts) if !posts.is_empty() => return Ok(posts),
            Ok(_) => {}
            Err(e) => log::warn!("Posts from store failed, using snapshot: {}", e),
        }
    }
    snapshot::posts(&config.snapshots.posts).await
}

/// Gallery records, else the raw `gallery/` blob listing newest first.
/// `None` without a backend or when both are empty.
pub async fn load_gallery(store: Option<&dyn Store>, blobs: &dyn BlobStore) -> Option<Vec<GalleryImage>> {
    let store = store?;
    match content::gallery::list(store, cap(store, "gallery_list_cap", 200)) {
        Ok(photos) if !photos.is_empty() => {
            return Some(
                photos
                    .iter()
                    .map(|p| GalleryImage {
                        url: p.url.clone(),
                        alt: p.alt_text().to_string(),
                    })
                    .collect(),
            )
        }
        Ok(_) => log::warn!("No gallery records, falling back to storage listing"),
        Err(e) => log::warn!("Gallery records failed, trying storage: {}", e),
    }

    let paths = match blobs.list(GALLERY_FOLDER).await {
        Ok(p) => p,
        Err(e) => {
            log::warn!("Gallery listing failed: {}", e);
            return None;
        }
    };
    let mut images = Vec::new();
    for path in paths.iter().rev() {
        match blobs.download_url(path).await {
            Ok(url) => images.push(GalleryImage {
                url,
                alt: DEFAULT_ALT.to_string(),
            }),
            Err(e) => log::warn!("Skipping gallery object {}: {}", path, e),
        }
    }
    Some(images).filter(|i| !i.is_empty())
}

/// Featured products in display order, capped for the public page.
pub fn load_featured(store: Option<&dyn Store>) -> Option<Vec<FeaturedProduct>> {
    let store = store?;
    match content::featured::list(store, cap(store, "featured_public_cap", 12)) {
        Ok(items) if !items.is_empty() => Some(items),
        Ok(_) => None,
        Err(e) => {
            log::warn!("Featured load skipped: {}", e);
            None
        }
    }
}

/// Everything derived from the reviews snapshot.
#[derive(Debug, Clone, Default)]
pub struct ReviewsData {
    pub reviews: Vec<Review>,
    pub rating: Option<AggregateRating>,
    pub hours: Option<OpeningHours>,
}

/// An unreadable snapshot yields the placeholder reviews and no rating
/// or hours.
pub async fn load_reviews(config: &SiteConfig) -> ReviewsData {
    match snapshot::reviews(&config.snapshots.reviews).await {
        Ok(snap) => {
            let now = Utc::now().with_timezone(&config.tz());
            ReviewsData {
                rating: AggregateRating::from_snapshot(&snap),
                hours: hours::derive(snap.weekday_descriptions(), snap.special_periods(), &now),
                reviews: snap.reviews,
            }
        }
        Err(e) => {
            log::warn!("Reviews snapshot unavailable, using placeholders: {}", e);
            ReviewsData {
                reviews: reviews::placeholders(),
                ..Default::default()
            }
        }
    }
}

pub async fn load_instagram(config: &SiteConfig) -> Result<Vec<InstagramMedia>, ()> {
    snapshot::instagram(&config.snapshots.instagram)
        .await
        .map(|s| s.media)
        .map_err(|e| log::warn!("Instagram feed failed: {}", e))
}

/// Empty on failure; the select then offers only the default prefix.
pub async fn load_phone_codes(config: &SiteConfig) -> Vec<PhoneCode> {
    snapshot::phone_codes(&config.snapshots.phone_codes)
        .await
        .unwrap_or_else(|e| {
            log::warn!("Failed to load phone codes: {}", e);
            Vec::new()
        })
}
