use std::sync::Arc;

use chrono::Utc;
use rocket::form::Form;
use rocket::fs::TempFile;
use rocket::response::{Flash, Redirect};
use rocket::State;

use crate::blob::BlobStore;
use crate::config::SiteConfig;
use crate::content::posts::{self, PostEditor};
use crate::content::ContentCtx;
use crate::models::post::PostForm;
use crate::routes::security::NoCacheTemplate;
use crate::security::auth::{AdminUser, SessionRefresher};
use crate::store::Store;
use crate::upload::UploadTrackers;

use super::{delete_status, read_upload, render_console, DeleteForm, StatusMessage};

#[derive(FromForm)]
pub struct PostUpload<'f> {
    #[field(default = String::new())]
    pub editing: String,
    #[field(default = String::new())]
    pub title: String,
    #[field(default = String::new())]
    pub date: String,
    #[field(default = String::new())]
    pub read_time: String,
    #[field(default = String::new())]
    pub excerpt: String,
    #[field(default = String::new())]
    pub content: String,
    #[field(default = String::new())]
    pub seo_title: String,
    #[field(default = String::new())]
    pub seo_description: String,
    pub cover: Option<TempFile<'f>>,
    pub og_image: Option<TempFile<'f>>,
}

impl PostUpload<'_> {
    fn to_post_form(&self) -> PostForm {
        PostForm {
            editing: self.editing.clone(),
            title: self.title.clone(),
            date: self.date.clone(),
            read_time: self.read_time.clone(),
            excerpt: self.excerpt.clone(),
            content: self.content.clone(),
            seo_title: self.seo_title.clone(),
            seo_description: self.seo_description.clone(),
        }
    }
}

/// Create or update a post. A failed write re-renders the console with the
/// submitted values still in the form.
#[post("/posts", data = "<form>")]
pub async fn posts_publish(
    admin: AdminUser,
    config: &State<SiteConfig>,
    store: &State<Arc<dyn Store>>,
    blobs: &State<Arc<dyn BlobStore>>,
    trackers: &State<UploadTrackers>,
    form: Form<PostUpload<'_>>,
) -> Result<Flash<Redirect>, NoCacheTemplate> {
    let s: &dyn Store = &**store.inner();
    let post_form = form.to_post_form();
    let fail = |msg: String| {
        render_console(
            config,
            s,
            &admin,
            &PostEditor::from_form(post_form.clone()),
            Some(StatusMessage::error("posts", msg)),
            None,
        )
    };

    let cover = match &form.cover {
        Some(f) => read_upload(f).await.map_err(|e| fail(format!("Errore: {}", e)))?,
        None => None,
    };
    let og_image = match &form.og_image {
        Some(f) => read_upload(f).await.map_err(|e| fail(format!("Errore: {}", e)))?,
        None => None,
    };

    let refresher = SessionRefresher {
        store: s,
        session_id: &admin.session_id,
    };
    let ctx = ContentCtx {
        store: s,
        blobs: &**blobs.inner(),
        refresher: &refresher,
        tracker: Some(&trackers.posts),
    };
    let today = Utc::now().with_timezone(&config.tz()).date_naive();

    match posts::publish(&ctx, &post_form, cover, og_image, today).await {
        Ok(published) => Ok(StatusMessage::ok("posts", published.message()).into_flash()),
        Err(e) => Err(fail(format!("Errore: {}", e))),
    }
}

#[post("/posts/delete", data = "<form>")]
pub async fn posts_delete(
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
    let result = posts::delete(&ctx, form.id.trim(), form.confirmed()).await;
    if result.is_ok() {
        log::info!("{} deleted post {}", admin.user.email, form.id.trim());
    }
    delete_status("posts", "Articolo eliminato.", result)
}
