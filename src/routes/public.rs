use std::io::Cursor;
use std::sync::Arc;

use rocket::form::Form;
use rocket::http::{ContentType, Status};
use rocket::request::{FlashMessage, Request};
use rocket::response::content::{RawHtml, RawXml};
use rocket::response::{self, Flash, Redirect, Responder, Response};
use rocket::State;
use serde_json::Value;

use crate::blob::{BlobStore, StoredObject, CACHE_CONTROL};
use crate::config::SiteConfig;
use crate::content::now_timestamp;
use crate::models::message::{self, ContactMessage};
use crate::render::{self, blog, sections, Page};
use crate::reviews::{ReviewCarousel, WINDOW};
use crate::seo::{self, build_meta, PageMeta};
use crate::site;
use crate::store::Store;

pub const CONTACT_SENT: &str = "Grazie! Il tuo messaggio è stato inviato.";
pub const CONTACT_INCOMPLETE: &str = "Compila nome, email e messaggio.";
pub const CONTACT_FAILED: &str = "Invio non riuscito, riprova più tardi.";

/// The store, when the backend is switched on.
fn backend<'a>(config: &SiteConfig, store: &'a State<Arc<dyn Store>>) -> Option<&'a dyn Store> {
    if config.backend_enabled {
        Some(&**store.inner())
    } else {
        None
    }
}

// ── Home ───────────────────────────────────────────────

#[get("/?<r>")]
pub async fn home(
    config: &State<SiteConfig>,
    store: &State<Arc<dyn Store>>,
    blobs: &State<Arc<dyn BlobStore>>,
    r: Option<usize>,
) -> RawHtml<String> {
    let s = backend(config, store);
    let gallery = site::load_gallery(s, &**blobs.inner()).await;
    let featured = site::load_featured(s);
    let reviews = site::load_reviews(config).await;
    let instagram = site::load_instagram(config).await;

    let mut jsonld = vec![seo::jsonld::bakery(config)];
    if let Some(rating) = &reviews.rating {
        seo::jsonld::patch_business(&mut jsonld, "aggregateRating", &rating.jsonld());
    }
    if let Some(spec) = reviews.hours.as_ref().map(|h| &h.specification).filter(|s| !s.is_empty()) {
        seo::jsonld::patch_business(&mut jsonld, "openingHoursSpecification", &Value::Array(spec.clone()));
    }

    let carousel = ReviewCarousel::new(reviews.reviews, WINDOW).at(r.unwrap_or(0));
    let body = [
        sections::featured_section(featured.as_deref()),
        sections::gallery_section(gallery.as_deref()),
        sections::reviews_section(&carousel, reviews.rating.as_ref(), "/"),
        sections::hours_section(reviews.hours.as_ref()),
        sections::instagram_section(instagram.as_deref().map_err(|_| ()), &config.instagram_profile),
    ]
    .join("\n");

    let meta = PageMeta::new(
        &config.site_name,
        "Pasticceria artigianale siciliana: cannoli, cassate e dolci della tradizione.",
        "/",
    );
    RawHtml(render::render_page(
        config,
        &Page {
            meta: build_meta(config, &meta),
            jsonld,
            body,
            active: "/",
        },
    ))
}

// ── Blog ───────────────────────────────────────────────

#[get("/blog")]
pub async fn blog_list(config: &State<SiteConfig>, store: &State<Arc<dyn Store>>) -> RawHtml<String> {
    let body = if !config.blogs_enabled {
        blog::list_disabled_body()
    } else {
        match site::load_posts(config, backend(config, store)).await {
            Ok(posts) => blog::list_body(&posts),
            Err(e) => {
                log::warn!("Blog list unavailable: {}", e);
                blog::list_error_body()
            }
        }
    };
    let meta = PageMeta::new(
        &format!("Blog | {}", config.site_name),
        "Ricette, storie e novità dal nostro laboratorio.",
        "/blog",
    );
    RawHtml(render::render_page(
        config,
        &Page {
            meta: build_meta(config, &meta),
            body,
            active: "/blog",
            ..Default::default()
        },
    ))
}

#[get("/blog-post?<slug>")]
pub async fn blog_post(
    config: &State<SiteConfig>,
    store: &State<Arc<dyn Store>>,
    slug: Option<&str>,
) -> RawHtml<String> {
    let fallback_meta = PageMeta::new(&format!("Blog | {}", config.site_name), "", "/blog");
    let mut page = Page {
        meta: build_meta(config, &fallback_meta),
        active: "/blog",
        ..Default::default()
    };

    if !config.blogs_enabled {
        page.body = blog::post_disabled_body();
        return RawHtml(render::render_page(config, &page));
    }

    let posts = match site::load_posts(config, backend(config, store)).await {
        Ok(posts) => posts,
        Err(e) => {
            log::warn!("Post page unavailable: {}", e);
            page.body = blog::post_error_body();
            return RawHtml(render::render_page(config, &page));
        }
    };
    let Some(post) = blog::select_post(&posts, slug.filter(|s| !s.trim().is_empty())) else {
        page.body = blog::post_error_body();
        return RawHtml(render::render_page(config, &page));
    };

    let meta = PageMeta {
        title: format!("{} | {}", post.display_title(), config.site_name),
        description: post.display_description().to_string(),
        path: blog::post_url(&post.slug),
        image: post.social_image().map(String::from),
        og_type: Some("article"),
    };
    page.meta = build_meta(config, &meta);
    page.jsonld = vec![
        seo::jsonld::article(config, post),
        seo::jsonld::breadcrumbs(config, post),
    ];
    page.body = blog::post_body(post);
    RawHtml(render::render_page(config, &page))
}

#[get("/feed")]
pub async fn rss_feed(config: &State<SiteConfig>, store: &State<Arc<dyn Store>>) -> RawXml<String> {
    let posts = if config.blogs_enabled {
        site::load_posts(config, backend(config, store))
            .await
            .unwrap_or_else(|e| {
                log::warn!("Feed without posts: {}", e);
                Vec::new()
            })
    } else {
        Vec::new()
    };
    RawXml(crate::rss::generate_feed(config, &posts))
}

// ── Contact ────────────────────────────────────────────

#[derive(Debug, FromForm)]
pub struct ContactForm {
    pub name: String,
    pub email: String,
    pub phone_code: Option<String>,
    pub phone_number: Option<String>,
    pub message: String,
}

/// `?success=true` is turned into a flash message and stripped from the
/// address bar by redirecting.
#[get("/contatti?<success>")]
pub async fn contact_page(
    config: &State<SiteConfig>,
    success: Option<&str>,
    flash: Option<FlashMessage<'_>>,
) -> Result<RawHtml<String>, Flash<Redirect>> {
    if success == Some("true") {
        return Err(Flash::success(Redirect::to("/contatti"), CONTACT_SENT));
    }
    let codes = site::load_phone_codes(config).await;
    let status = flash.as_ref().map(|f| f.message());
    let meta = PageMeta::new(
        &format!("Contatti | {}", config.site_name),
        "Scrivici per ordini, torte su misura e informazioni.",
        "/contatti",
    );
    Ok(RawHtml(render::render_page(
        config,
        &Page {
            meta: build_meta(config, &meta),
            body: sections::contact_section(&codes, status),
            active: "/contatti",
            ..Default::default()
        },
    )))
}

#[post("/contatti", data = "<form>")]
pub fn contact_submit(
    config: &State<SiteConfig>,
    store: &State<Arc<dyn Store>>,
    form: Form<ContactForm>,
) -> Result<Redirect, Flash<Redirect>> {
    let msg = ContactMessage::new(
        &form.name,
        &form.email,
        form.phone_code.as_deref().unwrap_or(""),
        form.phone_number.as_deref().unwrap_or(""),
        &form.message,
    );
    if !msg.is_complete() {
        return Err(Flash::error(Redirect::to("/contatti"), CONTACT_INCOMPLETE));
    }

    match backend(config, store) {
        Some(s) => {
            if let Err(e) = s.doc_add(message::COLLECTION, &msg.to_fields(&now_timestamp())) {
                log::error!("Contact message not stored: {}", e);
                return Err(Flash::error(Redirect::to("/contatti"), CONTACT_FAILED));
            }
        }
        None => log::info!(
            "Contact message from {} <{}> ({} chars), backend disabled",
            msg.name,
            msg.email,
            msg.message.chars().count()
        ),
    }
    Ok(Redirect::to("/contatti?success=true"))
}

// ── Stored objects ─────────────────────────────────────

/// A blob served with its content type and a long-lived cache header.
pub struct ObjectResponse(StoredObject);

impl<'r> Responder<'r, 'static> for ObjectResponse {
    fn respond_to(self, _req: &'r Request<'_>) -> response::Result<'static> {
        let content_type = ContentType::parse_flexible(&self.0.content_type).unwrap_or(ContentType::Binary);
        Response::build()
            .header(content_type)
            .raw_header("Cache-Control", CACHE_CONTROL)
            .sized_body(self.0.data.len(), Cursor::new(self.0.data))
            .ok()
    }
}

/// `/o/{encoded path}?alt=media`; the path arrives as one decoded segment.
#[get("/o/<path>")]
pub async fn object(blobs: &State<Arc<dyn BlobStore>>, path: &str) -> Result<ObjectResponse, Status> {
    match blobs.get(path).await {
        Ok(Some(obj)) => Ok(ObjectResponse(obj)),
        Ok(None) => Err(Status::NotFound),
        Err(e) => {
            log::warn!("Object {} not served: {}", path, e);
            Err(Status::NotFound)
        }
    }
}

pub fn routes() -> Vec<rocket::Route> {
    routes![
        home,
        blog_list,
        blog_post,
        rss_feed,
        contact_page,
        contact_submit,
        object,
    ]
}
