use crate::config::SiteConfig;
use crate::render::html_escape;

/// What a page tells search engines and social previews about itself.
#[derive(Debug, Clone, Default)]
pub struct PageMeta {
    /// Full `<title>`; the site name alone when empty.
    pub title: String,
    pub description: String,
    /// Site-relative path, e.g. `/blog-post?slug=cannoli`.
    pub path: String,
    pub image: Option<String>,
    /// `website` unless set, `article` for posts.
    pub og_type: Option<&'static str>,
}

impl PageMeta {
    pub fn new(title: &str, description: &str, path: &str) -> Self {
        PageMeta {
            title: title.to_string(),
            description: description.to_string(),
            path: path.to_string(),
            ..Default::default()
        }
    }
}

/// Absolute URL for a site path; absolute inputs pass through.
pub fn absolute_url(config: &SiteConfig, path: &str) -> String {
    if path.starts_with("http://") || path.starts_with("https://") {
        return path.to_string();
    }
    format!("{}{}", config.site_url.trim_end_matches('/'), path)
}

/// Build meta tags HTML string for a page
pub fn build_meta(config: &SiteConfig, page: &PageMeta) -> String {
    let title = if page.title.trim().is_empty() {
        config.site_name.clone()
    } else {
        page.title.clone()
    };
    let canonical = absolute_url(config, &page.path);

    let mut meta = format!(
        r#"<title>{}</title>
<meta name="description" content="{}">
<link rel="canonical" href="{}">
<meta property="og:title" content="{}">
<meta property="og:description" content="{}">
<meta property="og:url" content="{}">
<meta property="og:site_name" content="{}">
<meta property="og:type" content="{}">
<meta property="og:locale" content="it_IT">"#,
        html_escape(&title),
        html_escape(&page.description),
        html_escape(&canonical),
        html_escape(&title),
        html_escape(&page.description),
        html_escape(&canonical),
        html_escape(&config.site_name),
        page.og_type.unwrap_or("website"),
    );

    let card = if page.image.is_some() { "summary_large_image" } else { "summary" };
    meta.push_str(&format!(
        r#"
<meta name="twitter:card" content="{}">
<meta name="twitter:title" content="{}">
<meta name="twitter:description" content="{}">"#,
        card,
        html_escape(&title),
        html_escape(&page.description),
    ));

    if let Some(image) = page.image.as_deref().filter(|s| !s.is_empty()) {
        let url = absolute_url(config, image);
        meta.push_str(&format!(
            r#"
<meta property="og:image" content="{url}">
<meta name="twitter:image" content="{url}">"#,
            url = html_escape(&url),
        ));
    }

    meta
}
