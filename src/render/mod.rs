//! Public site HTML. Each page body is assembled by the builders in the
//! submodules and wrapped in the shared page shell here.

pub mod blog;
pub mod content;
pub mod sections;

use chrono::{Datelike, NaiveDate};
use serde_json::Value;

use crate::config::SiteConfig;
use crate::seo;

/// A fully assembled public page, ready for the shell.
#[derive(Debug, Default)]
pub struct Page {
    /// `<title>`, description, canonical and social tags.
    pub meta: String,
    pub jsonld: Vec<Value>,
    pub body: String,
    /// Path of the nav entry to highlight.
    pub active: &'static str,
}

const NAV: [(&str, &str); 3] = [("/", "Home"), ("/blog", "Blog"), ("/contatti", "Contatti")];

pub fn render_page(config: &SiteConfig, page: &Page) -> String {
    let nav_links: String = NAV
        .iter()
        .map(|(href, label)| {
            format!(
                "<a href=\"{}\" class=\"nav-link{}\">{}</a>",
                href,
                if *href == page.active { " active" } else { "" },
                label
            )
        })
        .collect::<Vec<_>>()
        .join("\n            ");
    let jsonld: String = page.jsonld.iter().map(seo::jsonld::script).collect::<Vec<_>>().join("\n");

    format!(
        r#"<!DOCTYPE html>
<html lang="it">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    {meta}
    <link rel="alternate" type="application/rss+xml" title="{site_name}" href="/feed">
    <style>{css}</style>
    {jsonld}
</head>
<body>
    <header class="site-header">
        <a class="brand" href="/">{site_name}</a>
        <nav>
            {nav_links}
        </nav>
    </header>
    <main class="content">
        {body}
    </main>
    <footer class="site-footer">
        <p>&copy; {year} {site_name}</p>
    </footer>
</body>
</html>"#,
        meta = page.meta,
        site_name = html_escape(&config.site_name),
        css = DEFAULT_CSS,
        jsonld = jsonld,
        nav_links = nav_links,
        body = page.body,
        year = chrono::Utc::now().year(),
    )
}

pub fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

const MONTHS_IT: [&str; 12] = [
    "gennaio",
    "febbraio",
    "marzo",
    "aprile",
    "maggio",
    "giugno",
    "luglio",
    "agosto",
    "settembre",
    "ottobre",
    "novembre",
    "dicembre",
];

/// `2024-12-24` → `24 dicembre 2024`. Unparseable input comes back as is.
pub fn format_date_it(iso: &str) -> String {
    let head = iso.trim().get(..10).unwrap_or(iso.trim());
    match NaiveDate::parse_from_str(head, "%Y-%m-%d") {
        Ok(d) => format!("{} {} {}", d.day(), MONTHS_IT[d.month0() as usize], d.year()),
        Err(_) => iso.to_string(),
    }
}

/// Plain-language notice in place of a section's content.
pub fn notice(text: &str) -> String {
    format!("<p class=\"notice\">{}</p>", html_escape(text))
}

const DEFAULT_CSS: &str = r#"
body { margin: 0; font-family: Georgia, serif; color: #2b1d14; background: #fffaf3; }
a { color: #8a4b2a; }
.site-header { display: flex; justify-content: space-between; align-items: center; padding: 1rem 2rem; background: #2b1d14; }
.site-header a { color: #ffe2a1; text-decoration: none; margin-left: 1rem; }
.site-header .brand { margin-left: 0; font-size: 1.3rem; }
.nav-link.active { border-bottom: 2px solid #ffe2a1; }
.content { max-width: 1100px; margin: 0 auto; padding: 2rem 1rem; }
.site-footer { text-align: center; padding: 2rem; opacity: .7; }
section { margin: 3rem 0; }
.notice { opacity: .8; text-align: center; margin: 1rem 0; }
.blog-grid, .gallery-grid, .featured-grid, .instagram-grid { display: grid; grid-template-columns: repeat(auto-fill, minmax(240px, 1fr)); gap: 1.25rem; }
.blog-card img, .gallery-grid img, .featured-card img, .instagram-grid img { width: 100%; aspect-ratio: 4/3; object-fit: cover; border-radius: 8px; }
.post-hero img { width: 100%; max-height: 420px; object-fit: cover; border-radius: 12px; }
.breadcrumb { font-size: .9rem; opacity: .8; }
.reviews-list { display: grid; grid-template-columns: repeat(3, 1fr); gap: 1rem; }
.review { padding: 1rem; border-radius: 12px; background: #fff; box-shadow: 0 1px 4px rgba(0,0,0,.08); display: flex; flex-direction: column; }
.review .stars { color: #d4a017; }
.reviews-nav { display: flex; justify-content: center; gap: 10px; margin: .5rem 0 1rem; }
.hours-list { list-style: none; padding: 0; }
.hours-list li { display: flex; gap: 1rem; padding: .2rem 0; }
.hours-list li.closed { opacity: .6; }
.hours-list li.today { font-weight: bold; }
.badge { font-size: .75rem; padding: 0 .4rem; border-radius: 999px; background: #ffe2a1; }
[data-rating-badge] { display: inline-flex; gap: .35rem; padding: .4rem .65rem; border-radius: 999px; background: rgba(255,226,161,.15); border: 1px solid rgba(255,226,161,.4); }
.flash { padding: .75rem 1rem; border-radius: 8px; background: #e6f4e6; }
"#;
