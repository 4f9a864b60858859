use std::sync::OnceLock;

use chrono::NaiveDate;
use regex::Regex;

use crate::blob::object_path_from_url;
use crate::models::post::{self, Post, PostForm};
use crate::store::{Direction, Query, Store};
use crate::upload::{storage_key, upload_batch, PendingUpload, UploadFile};

use super::{delete_blob, delete_with_blob, now_millis, retry_delay, validation, BlobOutcome, ContentCtx, ContentError};

pub const COVER_FOLDER: &str = "blog-covers";
pub const OG_FOLDER: &str = "blog-og";
pub const DEFAULT_READ_TIME: &str = "3";

fn paragraph_break_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\n\s*\n").expect("valid regex"))
}

/// Split editor text on blank lines into trimmed, non-empty paragraphs.
pub fn split_paragraphs(raw: &str) -> Vec<String> {
    paragraph_break_re()
        .split(raw)
        .map(|p| p.trim())
        .filter(|p| !p.is_empty())
        .map(String::from)
        .collect()
}

/// Leading integer of the input, 3 when there is none, never below 1.
pub fn parse_read_time(raw: &str) -> u32 {
    let digits: String = raw.trim().chars().take_while(|c| c.is_ascii_digit()).collect();
    digits.parse::<u32>().unwrap_or(3).max(1)
}

#[derive(Debug, Clone, PartialEq)]
pub struct Published {
    pub slug: String,
    pub updated: bool,
}

impl Published {
    pub fn message(&self) -> &'static str {
        if self.updated {
            "Articolo aggiornato!"
        } else {
            "Articolo pubblicato!"
        }
    }
}

/// Create or update a post. In edit mode (`form.editing` set) the original
/// slug is the write key whatever the title has become.
pub async fn publish(
    ctx: &ContentCtx<'_>,
    form: &PostForm,
    cover: Option<UploadFile>,
    og_image: Option<UploadFile>,
    today: NaiveDate,
) -> Result<Published, ContentError> {
    let title = form.title.trim();
    if title.is_empty() {
        return Err(validation("Titolo richiesto"));
    }
    let editing = form.editing.trim();
    let slug = if editing.is_empty() {
        slug::slugify(title)
    } else {
        editing.to_string()
    };
    if slug.is_empty() {
        return Err(validation("Titolo non valido"));
    }
    let date = match form.date.trim() {
        "" => today.format("%Y-%m-%d").to_string(),
        d => NaiveDate::parse_from_str(d, "%Y-%m-%d")
            .map_err(|_| validation("Data non valida"))?
            .format("%Y-%m-%d")
            .to_string(),
    };

    let millis = now_millis();
    let mut pending = Vec::new();
    let mut cover_path = None;
    let mut og_path = None;
    if let Some(file) = cover.filter(|f| !f.data.is_empty()) {
        let path = storage_key(COVER_FOLDER, &slug, millis, &file.name);
        cover_path = Some(path.clone());
        pending.push(PendingUpload { file, path });
    }
    if let Some(file) = og_image.filter(|f| !f.data.is_empty()) {
        let path = storage_key(OG_FOLDER, &format!("{}-og", slug), millis, &file.name);
        og_path = Some(path.clone());
        pending.push(PendingUpload { file, path });
    }

    let mut uploaded = Vec::new();
    if !pending.is_empty() {
        // The post itself is the only record; files just need their URL.
        let report = upload_batch(ctx.blobs, ctx.refresher, ctx.tracker, pending, |_, _| Ok(String::new())).await?;
        if !report.is_success() {
            discard_blobs(ctx, report.uploaded.iter().map(|i| i.path.as_str())).await;
            return Err(ContentError::Backend(report.errors.join("; ")));
        }
        uploaded = report.uploaded;
    }
    let url_of = |path: &Option<String>| {
        path.as_ref()
            .and_then(|p| uploaded.iter().find(|i| &i.path == p))
            .map(|i| i.url.clone())
    };

    let non_empty = |s: &str| {
        let s = s.trim();
        if s.is_empty() {
            None
        } else {
            Some(s.to_string())
        }
    };
    let post = Post {
        slug: slug.clone(),
        title: title.to_string(),
        date,
        read_time: parse_read_time(&form.read_time),
        excerpt: form.excerpt.trim().to_string(),
        content: split_paragraphs(&form.content),
        image: url_of(&cover_path),
        seo_title: non_empty(&form.seo_title),
        seo_description: non_empty(&form.seo_description),
        og_image: url_of(&og_path),
    };

    if let Err(e) = ctx.store.doc_set(post::COLLECTION, &slug, &post.to_fields(), true) {
        log::error!("Post {} not saved: {}", slug, e);
        discard_blobs(ctx, uploaded.iter().map(|i| i.path.as_str())).await;
        return Err(ContentError::Backend(e));
    }
    log::info!("Post {} saved", slug);

    Ok(Published {
        slug,
        updated: !editing.is_empty(),
    })
}

async fn discard_blobs<'p>(ctx: &ContentCtx<'_>, paths: impl Iterator<Item = &'p str>) {
    for path in paths {
        if let Err(e) = ctx.blobs.delete_by_path(path).await {
            log::warn!("Orphan blob {} not removed: {}", path, e);
        }
    }
}

/// Newest first, capped.
pub fn list(store: &dyn Store, cap: usize) -> Result<Vec<Post>, ContentError> {
    let docs = store.doc_query(post::COLLECTION, &Query::new("date", Direction::Desc, cap))?;
    Ok(docs
        .into_iter()
        .filter_map(|d| match Post::from_document(d) {
            Ok(p) => Some(p),
            Err(e) => {
                log::warn!("Skipping malformed post: {}", e);
                None
            }
        })
        .collect())
}

pub fn get(store: &dyn Store, slug: &str) -> Result<Option<Post>, ContentError> {
    match store.doc_get(post::COLLECTION, slug)? {
        Some(doc) => Ok(Some(Post::from_document(doc)?)),
        None => Ok(None),
    }
}

/// Delete a post and, best effort, its cover and social image when they
/// live in our storage.
pub async fn delete(ctx: &ContentCtx<'_>, slug: &str, confirmed: bool) -> Result<BlobOutcome, ContentError> {
    if !confirmed {
        return Err(validation("Conferma richiesta"));
    }
    let post = get(ctx.store, slug)?.ok_or_else(|| validation("Articolo non trovato"))?;

    if let Some(og) = post.og_image.as_deref().filter(|u| object_path_from_url(u).is_some()) {
        if let Err(e) = delete_blob(ctx.blobs, og, "", retry_delay(ctx.store)).await {
            log::warn!("Social image of {} left behind: {}", slug, e);
        }
    }
    let cover = post
        .image
        .as_deref()
        .filter(|u| object_path_from_url(u).is_some())
        .unwrap_or("");
    delete_with_blob(ctx.store, ctx.blobs, post::COLLECTION, slug, cover, "", true).await
}

/// Console state of the post form: create mode or editing an existing slug.
#[derive(Debug, Clone, PartialEq)]
pub struct PostEditor {
    editing: Option<String>,
    pub form: PostForm,
}

impl Default for PostEditor {
    fn default() -> Self {
        PostEditor::new()
    }
}

impl PostEditor {
    pub fn new() -> Self {
        PostEditor {
            editing: None,
            form: PostForm {
                read_time: DEFAULT_READ_TIME.to_string(),
                ..Default::default()
            },
        }
    }

    /// Restore a submitted form, e.g. to re-render it after a failed write.
    pub fn from_form(form: PostForm) -> Self {
        let editing = Some(form.editing.trim().to_string()).filter(|s| !s.is_empty());
        PostEditor { editing, form }
    }

    /// Load a stored post into the form and switch to update mode.
    pub fn begin_edit(&mut self, store: &dyn Store, slug: &str) -> Result<(), ContentError> {
        let post = get(store, slug)?.ok_or_else(|| validation("Articolo non trovato"))?;
        self.form = PostForm {
            editing: post.slug.clone(),
            title: post.title,
            date: post.date,
            read_time: post.read_time.to_string(),
            excerpt: post.excerpt,
            content: post.content.join("\n\n"),
            seo_title: post.seo_title.unwrap_or_default(),
            seo_description: post.seo_description.unwrap_or_default(),
        };
        self.editing = Some(post.slug);
        Ok(())
    }

    pub fn cancel(&mut self) {
        *self = PostEditor::new();
    }

    pub fn editing_slug(&self) -> Option<&str> {
        self.editing.as_deref()
    }

    pub fn is_editing(&self) -> bool {
        self.editing.is_some()
    }

    pub fn submit_label(&self) -> &'static str {
        if self.is_editing() {
            "Aggiorna"
        } else {
            "Pubblica"
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paragraphs_split_on_blank_lines() {
        let raw = "Primo paragrafo\nsegue\n\n  \n\nSecondo\r\n\r\nTerzo  \n\n\n";
        assert_eq!(
            split_paragraphs(raw),
            vec!["Primo paragrafo\nsegue", "Secondo", "Terzo"]
        );
        assert!(split_paragraphs("  \n\n ").is_empty());
    }

    #[test]
    fn read_time_parsing() {
        assert_eq!(parse_read_time(""), 3);
        assert_eq!(parse_read_time("abc"), 3);
        assert_eq!(parse_read_time("0"), 1);
        assert_eq!(parse_read_time("7 min"), 7);
    }

    #[test]
    fn editor_modes() {
        let mut ed = PostEditor::new();
        assert!(!ed.is_editing());
        assert_eq!(ed.form.read_time, "3");
        assert_eq!(ed.submit_label(), "Pubblica");

        let restored = PostEditor::from_form(PostForm {
            editing: "torta".to_string(),
            title: "Nuovo titolo".to_string(),
            ..Default::default()
        });
        assert_eq!(restored.editing_slug(), Some("torta"));
        assert_eq!(restored.submit_label(), "Aggiorna");

        ed = restored;
        ed.cancel();
        assert_eq!(ed, PostEditor::new());
    }
}
