use std::sync::Arc;

use rocket::form::Form;
use rocket::fs::TempFile;
use rocket::response::{Flash, Redirect};
use rocket::State;

use crate::blob::BlobStore;
use crate::content::featured::{self, FeaturedInput};
use crate::content::ContentCtx;
use crate::security::auth::{AdminUser, SessionRefresher};
use crate::store::Store;
use crate::upload::UploadTrackers;

use super::{delete_status, read_upload, DeleteForm, StatusMessage};

#[derive(FromForm)]
pub struct FeaturedUpload<'f> {
    #[field(default = String::new())]
    pub name: String,
    #[field(default = String::new())]
    pub text: String,
    #[field(default = String::new())]
    pub order: String,
    pub image: Option<TempFile<'f>>,
}

#[derive(Debug, FromForm)]
pub struct FeaturedSave {
    pub id: String,
    #[field(default = String::new())]
    pub name: String,
    #[field(default = String::new())]
    pub text: String,
    #[field(default = String::new())]
    pub order: String,
}

/// Ids in their new visual order, comma separated.
#[derive(Debug, FromForm)]
pub struct ReorderForm {
    #[field(default = String::new())]
    pub ids: String,
}

pub fn parse_ids(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

#[post("/featured", data = "<form>")]
pub async fn featured_add(
    admin: AdminUser,
    store: &State<Arc<dyn Store>>,
    blobs: &State<Arc<dyn BlobStore>>,
    trackers: &State<UploadTrackers>,
    form: Form<FeaturedUpload<'_>>,
) -> Flash<Redirect> {
    let image = match &form.image {
        Some(f) => match read_upload(f).await {
            Ok(file) => file,
            Err(e) => return StatusMessage::error("featured", format!("Errore: {}", e)).into_flash(),
        },
        None => None,
    };
    let input = FeaturedInput {
        name: form.name.clone(),
        text: form.text.clone(),
        order: form.order.clone(),
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
        tracker: Some(&trackers.featured),
    };
    match featured::add(&ctx, &input, image).await {
        Ok(_) => StatusMessage::ok("featured", "Prodotto aggiunto!").into_flash(),
        Err(e) => StatusMessage::error("featured", format!("Errore: {}", e)).into_flash(),
    }
}

#[post("/featured/save", data = "<form>")]
pub fn featured_save(_admin: AdminUser, store: &State<Arc<dyn Store>>, form: Form<FeaturedSave>) -> Flash<Redirect> {
    let input = FeaturedInput {
        name: form.name.clone(),
        text: form.text.clone(),
        order: form.order.clone(),
    };
    match featured::save_inline(&**store.inner(), form.id.trim(), &input) {
        Ok(()) => StatusMessage::ok("featured", "Prodotto salvato.").into_flash(),
        Err(e) => StatusMessage::error("featured", format!("Errore: {}", e)).into_flash(),
    }
}

#[post("/featured/reorder", data = "<form>")]
pub fn featured_reorder(_admin: AdminUser, store: &State<Arc<dyn Store>>, form: Form<ReorderForm>) -> Flash<Redirect> {
    match featured::reorder(&**store.inner(), &parse_ids(&form.ids)) {
        Ok(()) => StatusMessage::ok("featured", "Ordine aggiornato.").into_flash(),
        Err(e) => StatusMessage::error("featured", format!("Errore: {}", e)).into_flash(),
    }
}

#[post("/featured/delete", data = "<form>")]
pub async fn featured_delete(
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
        "featured",
        "Prodotto eliminato.",
        featured::delete(&ctx, form.id.trim(), form.confirmed()).await,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_split_and_trimmed() {
        assert_eq!(parse_ids(" b, a ,,c "), vec!["b", "a", "c"]);
        assert!(parse_ids("").is_empty());
    }
}
