use url::form_urlencoded::byte_serialize;

use crate::models::post::Post;

use super::content::render_paragraphs;
use super::{format_date_it, html_escape, notice};

pub const COMING_SOON: &str = "Articoli in arrivo…";
pub const LIST_ERROR: &str = "Errore nel caricamento dei post. Riprova più tardi.";
pub const POST_ERROR: &str = "Impossibile caricare il contenuto.";
const DISABLED_BODY: &str = "Stiamo preparando i contenuti del blog. Torna presto a trovarci!";

pub fn post_url(slug: &str) -> String {
    format!("/blog-post?slug={}", byte_serialize(slug.as_bytes()).collect::<String>())
}

/// The post asked for, or the newest one when the slug is unknown or
/// missing.
pub fn select_post<'a>(posts: &'a [Post], slug: Option<&str>) -> Option<&'a Post> {
    slug.and_then(|s| posts.iter().find(|p| p.slug == s))
        .or_else(|| posts.first())
}

fn meta_line(post: &Post) -> String {
    format!("{} · {} min", format_date_it(&post.date), post.read_time)
}

pub fn list_body(posts: &[Post]) -> String {
    let mut html = String::from("<h1>Blog</h1>\n<div class=\"blog-grid\">");
    if posts.is_empty() {
        html.push_str(&notice(COMING_SOON));
    }
    for post in posts {
        let url = post_url(&post.slug);
        let thumb = match post.image.as_deref().filter(|s| !s.is_empty()) {
            Some(src) => format!(
                "<a class=\"blog-thumb\" href=\"{}\"><img src=\"{}\" alt=\"{}\" loading=\"lazy\" decoding=\"async\"></a>",
                url,
                html_escape(src),
                html_escape(&post.title)
            ),
            None => String::new(),
        };
        html.push_str(&format!(
            "<article class=\"blog-card\">\
             {thumb}\
             <div class=\"blog-content\">\
             <h2 class=\"blog-title\"><a href=\"{url}\">{title}</a></h2>\
             <p class=\"blog-meta\">{meta}</p>\
             <p class=\"blog-excerpt\">{excerpt}</p>\
             <a class=\"blog-readmore\" href=\"{url}\">Leggi di più →</a>\
             </div>\
             </article>",
            thumb = thumb,
            url = url,
            title = html_escape(&post.title),
            meta = html_escape(&meta_line(post)),
            excerpt = html_escape(&post.excerpt),
        ));
    }
    html.push_str("</div>");
    html
}

/// Blog switched off: the grid only says more is coming.
pub fn list_disabled_body() -> String {
    format!("<h1>Blog</h1>\n<div class=\"blog-grid\">{}</div>", notice(COMING_SOON))
}

pub fn list_error_body() -> String {
    format!("<h1>Blog</h1>\n<div class=\"blog-grid\">{}</div>", notice(LIST_ERROR))
}

pub fn post_body(post: &Post) -> String {
    let hero = match post.image.as_deref().filter(|s| !s.is_empty()) {
        Some(src) => format!(
            "<div class=\"post-hero\"><img src=\"{}\" alt=\"{}\" loading=\"eager\" decoding=\"async\"></div>",
            html_escape(src),
            html_escape(&post.title)
        ),
        None => String::new(),
    };
    format!(
        "<nav class=\"breadcrumb\">Home / <a href=\"/blog\">Blog</a> / {title}</nav>\
         <article class=\"post\">\
         <h1>{title}</h1>\
         <p class=\"post-meta\">{meta}</p>\
         {hero}\
         <div class=\"post-content\">{content}</div>\
         </article>",
        title = html_escape(&post.title),
        meta = html_escape(&meta_line(post)),
        hero = hero,
        content = render_paragraphs(&post.content),
    )
}

pub fn post_disabled_body() -> String {
    format!(
        "<nav class=\"breadcrumb\">Home / Blog / …</nav>\
         <article class=\"post\"><h1>{}</h1><div class=\"post-content\"><p>{}</p></div></article>",
        COMING_SOON, DISABLED_BODY
    )
}

pub fn post_error_body() -> String {
    format!(
        "<nav class=\"breadcrumb\">Home / <a href=\"/blog\">Blog</a></nav>\
         <article class=\"post\"><div class=\"post-content\"><p>{}</p></div></article>",
        POST_ERROR
    )
}
