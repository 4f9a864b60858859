use std::sync::Arc;

use rocket::fs::TempFile;
use rocket::request::FlashMessage;
use rocket::response::content::RawHtml;
use rocket::response::{Flash, Redirect};
use rocket::tokio::io::AsyncReadExt;
use rocket::State;
use rocket_dyn_templates::Template;
use serde::Serialize;
use serde_json::{json, Value};

use crate::config::SiteConfig;
use crate::content::posts::PostEditor;
use crate::content::{self, BlobOutcome, ContentError};
use crate::models::featured::FeaturedProduct;
use crate::models::gallery::GalleryPhoto;
use crate::models::post::Post;
use crate::render::{self, blog::post_url, Page};
use crate::routes::security::NoCacheTemplate;
use crate::security::auth::AdminUser;
use crate::site::cap;
use crate::store::Store;
use crate::upload::UploadFile;

pub mod api;
pub mod featured;
pub mod gallery;
pub mod posts;

pub const CONSOLE_PATH: &str = "/admin";

// ── Status line ────────────────────────────────────────

/// The message shown under one console form after a write.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatusMessage {
    /// `posts`, `gallery`, `featured` or `auth`
    pub form: String,
    pub ok: bool,
    pub message: String,
}

impl StatusMessage {
    pub fn ok(form: &str, message: impl Into<String>) -> Self {
        StatusMessage {
            form: form.to_string(),
            ok: true,
            message: message.into(),
        }
    }

    pub fn error(form: &str, message: impl Into<String>) -> Self {
        StatusMessage {
            form: form.to_string(),
            ok: false,
            message: message.into(),
        }
    }

    /// Flash kinds are `{form}:ok` / `{form}:error`; plain `success` and
    /// `error` kinds belong to the sign-in forms.
    pub fn from_kind(kind: &str, message: &str) -> Self {
        match kind.split_once(':') {
            Some((form, state)) => StatusMessage {
                form: form.to_string(),
                ok: state == "ok",
                message: message.to_string(),
            },
            None => StatusMessage {
                form: "auth".to_string(),
                ok: kind != "error",
                message: message.to_string(),
            },
        }
    }

    pub fn into_flash(self) -> Flash<Redirect> {
        let kind = format!("{}:{}", self.form, if self.ok { "ok" } else { "error" });
        let target = format!("{}#{}", CONSOLE_PATH, self.form);
        Flash::new(Redirect::to(target), kind, self.message)
    }
}

impl From<&FlashMessage<'_>> for StatusMessage {
    fn from(flash: &FlashMessage<'_>) -> Self {
        StatusMessage::from_kind(flash.kind(), flash.message())
    }
}

/// Flash for the outcome of a delete cycle.
pub(crate) fn delete_status(form: &str, done: &str, result: Result<BlobOutcome, ContentError>) -> Flash<Redirect> {
    match result {
        Ok(BlobOutcome::Kept(e)) => {
            StatusMessage::ok(form, format!("{} (file non rimosso dallo Storage: {})", done, e)).into_flash()
        }
        Ok(_) => StatusMessage::ok(form, done).into_flash(),
        Err(e) => StatusMessage::error(form, format!("Errore: {}", e)).into_flash(),
    }
}

// ── Uploads ────────────────────────────────────────────

/// Browser-supplied file name reduced to its last path segment.
pub(crate) fn clean_name(raw: &str) -> String {
    let name = raw.rsplit(['/', '\\']).next().unwrap_or("").trim();
    if name.is_empty() {
        "file".to_string()
    } else {
        name.to_string()
    }
}

/// Buffer a multipart file. Empty file inputs read as `None`.
pub(crate) async fn read_upload(file: &TempFile<'_>) -> Result<Option<UploadFile>, String> {
    if file.len() == 0 {
        return Ok(None);
    }
    let raw_name = file
        .raw_name()
        .map(|rn| rn.dangerous_unsafe_unsanitized_raw().as_str().to_string())
        .or_else(|| file.name().map(String::from))
        .unwrap_or_default();

    let mut data = Vec::with_capacity(file.len() as usize);
    let reader = file.open().await.map_err(|e| e.to_string())?;
    rocket::tokio::pin!(reader);
    reader.read_to_end(&mut data).await.map_err(|e| e.to_string())?;

    Ok(Some(UploadFile {
        name: clean_name(&raw_name),
        data,
        content_type: file.content_type().map(|ct| ct.to_string()),
    }))
}

pub(crate) async fn read_uploads(files: &[TempFile<'_>]) -> Result<Vec<UploadFile>, String> {
    let mut out = Vec::new();
    for f in files {
        if let Some(file) = read_upload(f).await? {
            out.push(file);
        }
    }
    Ok(out)
}

#[derive(Debug, FromForm)]
pub struct DeleteForm {
    pub id: String,
    #[field(default = String::new())]
    pub confirm: String,
}

impl DeleteForm {
    pub fn confirmed(&self) -> bool {
        self.confirm == "yes"
    }
}

// ── Console page ───────────────────────────────────────

fn editor_json(editor: &PostEditor) -> Value {
    let f = &editor.form;
    json!({
        "editing": editor.editing_slug().unwrap_or(""),
        "title": f.title,
        "date": f.date,
        "read_time": f.read_time,
        "excerpt": f.excerpt,
        "content": f.content,
        "seo_title": f.seo_title,
        "seo_description": f.seo_description,
        "submit_label": editor.submit_label(),
    })
}

fn post_json(p: &Post) -> Value {
    json!({
        "slug": p.slug,
        "title": p.title,
        "date": p.date,
        "url": post_url(&p.slug),
    })
}

fn photo_json(p: &GalleryPhoto) -> Value {
    json!({
        "id": p.id,
        "url": p.url,
        "alt": p.alt_text(),
        "label": p.file_label(),
    })
}

/// Comma-joined ids after swapping positions `i` and `j`; `None` when
/// either is out of range.
pub fn swapped_order(ids: &[String], i: usize, j: usize) -> Option<String> {
    if i >= ids.len() || j >= ids.len() {
        return None;
    }
    let mut order = ids.to_vec();
    order.swap(i, j);
    Some(order.join(","))
}

fn featured_json(items: &[FeaturedProduct]) -> Vec<Value> {
    let ids: Vec<String> = items.iter().map(|p| p.id.clone()).collect();
    items
        .iter()
        .enumerate()
        .map(|(i, p)| {
            json!({
                "id": p.id,
                "name": p.name,
                "text": p.text,
                "image": p.image,
                "order": p.order,
                "up_ids": i.checked_sub(1).and_then(|prev| swapped_order(&ids, i, prev)),
                "down_ids": swapped_order(&ids, i, i + 1),
            })
        })
        .collect()
}

/// `?confirm=kind:id` renders a confirmation box for that delete.
fn confirm_json(confirm: Option<&str>, posts: &[Post], photos: &[GalleryPhoto], featured: &[FeaturedProduct]) -> Value {
    let Some((kind, id)) = confirm.and_then(|c| c.split_once(':')) else {
        return Value::Null;
    };
    let (action, label) = match kind {
        "posts" => ("/admin/posts/delete", posts.iter().find(|p| p.slug == id).map(|p| p.title.clone())),
        "gallery" => (
            "/admin/gallery/delete",
            photos.iter().find(|p| p.id == id).map(|p| p.file_label().to_string()),
        ),
        "featured" => ("/admin/featured/delete", featured.iter().find(|p| p.id == id).map(|p| p.name.clone())),
        _ => return Value::Null,
    };
    match label {
        Some(label) => json!({ "form": kind, "action": action, "id": id, "label": label }),
        None => Value::Null,
    }
}

fn list_or_error<T>(result: Result<Vec<T>, ContentError>, what: &str) -> (Vec<T>, Option<String>) {
    match result {
        Ok(items) => (items, None),
        Err(e) => {
            log::warn!("Console {} list failed: {}", what, e);
            (Vec::new(), Some(format!("Errore nel caricamento: {}", e)))
        }
    }
}

pub(crate) fn render_console(
    config: &SiteConfig,
    store: &dyn Store,
    admin: &AdminUser,
    editor: &PostEditor,
    status: Option<StatusMessage>,
    confirm: Option<&str>,
) -> NoCacheTemplate {
    let (posts, posts_error) = list_or_error(content::posts::list(store, cap(store, "posts_list_cap", 200)), "posts");
    let (photos, gallery_error) =
        list_or_error(content::gallery::list(store, cap(store, "gallery_list_cap", 200)), "gallery");
    let (featured, featured_error) =
        list_or_error(content::featured::list(store, cap(store, "featured_list_cap", 100)), "featured");

    let context = json!({
        "site_name": config.site_name,
        "user_email": admin.user.email,
        "status": status,
        "editor": editor_json(editor),
        "posts": posts.iter().map(post_json).collect::<Vec<_>>(),
        "posts_error": posts_error,
        "gallery": photos.iter().map(photo_json).collect::<Vec<_>>(),
        "gallery_error": gallery_error,
        "featured": featured_json(&featured),
        "featured_error": featured_error,
        "confirm": confirm_json(confirm, &posts, &photos, &featured),
    });
    NoCacheTemplate(Template::render("admin/console", &context))
}

#[get("/?<edit>&<confirm>")]
pub fn console(
    admin: AdminUser,
    config: &State<SiteConfig>,
    store: &State<Arc<dyn Store>>,
    flash: Option<FlashMessage<'_>>,
    edit: Option<&str>,
    confirm: Option<&str>,
) -> NoCacheTemplate {
    let s: &dyn Store = &**store.inner();
    let mut status = flash.as_ref().map(StatusMessage::from);
    let mut editor = PostEditor::new();
    if let Some(slug) = edit.map(str::trim).filter(|s| !s.is_empty()) {
        if let Err(e) = editor.begin_edit(s, slug) {
            editor.cancel();
            status = Some(StatusMessage::error("posts", format!("Errore: {}", e)));
        }
    }
    render_console(config, s, &admin, &editor, status, confirm)
}

/// Served under `/admin` when the backend is switched off.
#[get("/<_path..>")]
pub fn closed(_path: std::path::PathBuf, config: &State<SiteConfig>) -> RawHtml<String> {
    RawHtml(render::render_page(
        config,
        &Page {
            body: render::notice("Area riservata non disponibile: backend non configurato."),
            ..Default::default()
        },
    ))
}

pub fn routes() -> Vec<rocket::Route> {
    routes![
        console,
        posts::posts_publish,
        posts::posts_delete,
        gallery::gallery_upload,
        gallery::gallery_delete,
        featured::featured_add,
        featured::featured_save,
        featured::featured_reorder,
        featured::featured_delete,
    ]
}

pub fn closed_routes() -> Vec<rocket::Route> {
    routes![closed]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_round_trips_through_flash_kind() {
        let s = StatusMessage::from_kind("gallery:error", "Errore: x");
        assert_eq!(s, StatusMessage::error("gallery", "Errore: x"));
        let s = StatusMessage::from_kind("success", "Utente registrato.");
        assert!(s.ok);
        assert_eq!(s.form, "auth");
    }

    #[test]
    fn names_lose_their_directories() {
        assert_eq!(clean_name("C:\\foto\\torta.jpg"), "torta.jpg");
        assert_eq!(clean_name("../../etc/passwd"), "passwd");
        assert_eq!(clean_name(""), "file");
    }

    #[test]
    fn move_swaps_neighbours() {
        let ids: Vec<String> = ["a", "b", "c"].iter().map(|s| s.to_string()).collect();
        assert_eq!(swapped_order(&ids, 1, 0).as_deref(), Some("b,a,c"));
        assert_eq!(swapped_order(&ids, 2, 3), None);
    }
}
