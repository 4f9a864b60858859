use std::sync::Arc;

use rocket::form::Form;
use rocket::fs::TempFile;
use rocket::response::{Flash, Redirect};
use rocket::State;

use crate::blob::BlobStore;
use crate::content::{gallery, ContentCtx};
use crate::security::auth::{AdminUser, SessionRefresher};
use crate::store::Store;
use crate::upload::UploadTrackers;

use super::{delete_status, read_uploads, DeleteForm, StatusMessage};

#[derive(FromForm)]
pub struct GalleryUpload<'f> {
    #[field(default = String::new())]
    pub alt: String,
    pub files: Vec<TempFile<'f>>,
}

#[post("/gallery", data = "<form>")]
pub async fn gallery_upload(
    admin: AdminUser,
    store: &State<Arc<dyn Store>>,
    blobs: &State<Arc<dyn BlobStore>>,
    trackers: &State<UploadTrackers>,
    form: Form<GalleryUpload<'_>>,
) -> Flash<Redirect> {
    let files = match read_uploads(&form.files).await {
        Ok(files) => files,
        Err(e) => return StatusMessage::error("gallery", format!("Errore: {}", e)).into_flash(),
    };

    let s: &dyn Store = &**store.inner();
    let refresher = SessionRefresher {
        store: s,
        session_id: &admin.session_id,
    };
    let ctx = ContentCtx {
        store: s,
        blobs: &**blobs.inner(),
        refresher: &refresher,
        tracker: Some(&trackers.gallery),
    };

    match gallery::upload_photos(&ctx, files, &form.alt).await {
        Ok(report) if report.is_success() => StatusMessage::ok("gallery", report.summary()).into_flash(),
        Ok(report) => StatusMessage::error("gallery", report.summary()).into_flash(),
        Err(e) => StatusMessage::error("gallery", format!("Errore: {}", e)).into_flash(),
    }
}

#[post("/gallery/delete", data = "<form>")]
pub async fn gallery_delete(
    admin: AdminUser,
    store: &State<Arc<dyn Store>>,
    blobs: &State<Arc<dyn BlobStore>>,
    form: Form<DeleteForm>,
) -> Flash<Redirect> {
    let s: &dyn Store = &**store.inner();
    let refresher = SessionRefresher {
        store: s,
        session_id: &admin.session_id,
    };
    let ctx = ContentCtx {
        store: s,
        blobs: &**blobs.inner(),
        refresher: &refresher,
        tracker: None,
    };
    delete_status(
        "gallery",
        "Foto eliminata.",
        gallery::delete(&ctx, form.id.trim(), form.confirmed()).await,
    )
}
