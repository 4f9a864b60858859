use serde_json::{json, Value};

use crate::config::SiteConfig;
use crate::models::post::Post;
use crate::render::blog::post_url;

use super::meta::absolute_url;

/// Wrap a JSON-LD value in its script tag. `</` is escaped so text
/// fields can't close the tag early.
pub fn script(value: &Value) -> String {
    let body = serde_json::to_string(value).unwrap_or_else(|_| "{}".to_string());
    format!(
        "<script type=\"application/ld+json\">{}</script>",
        body.replace("</", "<\\/")
    )
}

/// The site's business block, before rating and hours are patched in.
pub fn bakery(config: &SiteConfig) -> Value {
    json!({
        "@context": "https://schema.org",
        "@type": "Bakery",
        "name": config.site_name,
        "url": config.site_url,
        "sameAs": [config.instagram_profile],
    })
}

fn is_business(block: &Value) -> bool {
    matches!(
        block.get("@type").and_then(|t| t.as_str()),
        Some("Bakery") | Some("LocalBusiness")
    )
}

/// Set `key` on every Bakery / LocalBusiness block. Returns how many
/// blocks were patched.
pub fn patch_business(blocks: &mut [Value], key: &str, value: &Value) -> usize {
    let mut patched = 0;
    for block in blocks.iter_mut().filter(|b| is_business(b)) {
        if let Some(obj) = block.as_object_mut() {
            obj.insert(key.to_string(), value.clone());
            patched += 1;
        }
    }
    patched
}

/// Build JSON-LD structured data for a blog post
pub fn article(config: &SiteConfig, post: &Post) -> Value {
    let url = absolute_url(config, &post_url(&post.slug));
    let mut ld = json!({
        "@context": "https://schema.org",
        "@type": "Article",
        "headline": post.display_title(),
        "description": post.display_description(),
        "datePublished": post.date,
        "mainEntityOfPage": url,
        "author": { "@type": "Organization", "name": config.site_name },
        "publisher": { "@type": "Organization", "name": config.site_name },
    });
    if let Some(image) = post.social_image() {
        ld["image"] = json!(absolute_url(config, image));
    }
    ld
}

/// Home / Blog / post title.
pub fn breadcrumbs(config: &SiteConfig, post: &Post) -> Value {
    json!({
        "@context": "https://schema.org",
        "@type": "BreadcrumbList",
        "itemListElement": [
            { "@type": "ListItem", "position": 1, "name": "Home", "item": absolute_url(config, "/") },
            { "@type": "ListItem", "position": 2, "name": "Blog", "item": absolute_url(config, "/blog") },
            { "@type": "ListItem", "position": 3, "name": post.title, "item": absolute_url(config, &post_url(&post.slug)) },
        ]
    })
}
