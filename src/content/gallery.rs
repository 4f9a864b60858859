use crate::models::gallery::{GalleryPhoto, COLLECTION, FOLDER};
use crate::store::{Direction, Query, Store};
use crate::upload::{storage_key, upload_batch, BatchReport, PendingUpload, UploadFile};

use super::{delete_with_blob, now_millis, now_timestamp, validation, BlobOutcome, ContentCtx, ContentError};

/// Upload a set of photos, one gallery record per file. All files share
/// the alt text.
pub async fn upload_photos(
    ctx: &ContentCtx<'_>,
    files: Vec<UploadFile>,
    alt: &str,
) -> Result<BatchReport, ContentError> {
    let files: Vec<UploadFile> = files.into_iter().filter(|f| !f.data.is_empty()).collect();
    if files.is_empty() {
        return Err(validation("Seleziona almeno una foto"));
    }

    // The batch index keeps same-named files in one batch apart.
    let millis = now_millis();
    let pending = files
        .into_iter()
        .enumerate()
        .map(|(i, file)| {
            let path = storage_key(FOLDER, &i.to_string(), millis, &file.name);
            PendingUpload { file, path }
        })
        .collect();

    let store = ctx.store;
    upload_batch(ctx.blobs, ctx.refresher, ctx.tracker, pending, |up, url| {
        store.doc_add(
            COLLECTION,
            &GalleryPhoto::new_fields(url, alt, &up.path, &now_timestamp()),
        )
    })
    .await
}

/// Newest first, capped. Records without a URL are skipped.
pub fn list(store: &dyn Store, cap: usize) -> Result<Vec<GalleryPhoto>, ContentError> {
    let docs = store.doc_query(COLLECTION, &Query::new("uploadedAt", Direction::Desc, cap))?;
    Ok(docs
        .into_iter()
        .filter_map(|d| GalleryPhoto::from_document(d).ok())
        .filter(|p| !p.url.is_empty())
        .collect())
}

pub async fn delete(ctx: &ContentCtx<'_>, id: &str, confirmed: bool) -> Result<BlobOutcome, ContentError> {
    if !confirmed {
        return Err(validation("Conferma richiesta"));
    }
    let doc = ctx
        .store
        .doc_get(COLLECTION, id)?
        .ok_or_else(|| validation("Foto non trovata"))?;
    let photo = GalleryPhoto::from_document(doc)?;
    delete_with_blob(ctx.store, ctx.blobs, COLLECTION, id, &photo.url, &photo.path, true).await
}
