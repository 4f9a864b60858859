use chrono::{NaiveDate, TimeZone};
use rss::{ChannelBuilder, GuidBuilder, ItemBuilder};

use crate::config::SiteConfig;
use crate::models::post::Post;
use crate::render::blog::post_url;
use crate::seo::meta::absolute_url;

pub const FEED_LIMIT: usize = 25;

/// Post date at local midnight in the business time zone, RFC 2822.
fn pub_date(config: &SiteConfig, date: &str) -> Option<String> {
    let day = NaiveDate::parse_from_str(date.get(..10)?, "%Y-%m-%d").ok()?;
    let midnight = day.and_hms_opt(0, 0, 0)?;
    config
        .tz()
        .from_local_datetime(&midnight)
        .earliest()
        .map(|d| d.to_rfc2822())
}

/// Generate RSS 2.0 XML feed for blog posts, newest first
pub fn generate_feed(config: &SiteConfig, posts: &[Post]) -> String {
    let items: Vec<rss::Item> = posts
        .iter()
        .take(FEED_LIMIT)
        .map(|post| {
            let link = absolute_url(config, &post_url(&post.slug));
            ItemBuilder::default()
                .title(Some(post.title.clone()))
                .link(Some(link.clone()))
                .guid(Some(GuidBuilder::default().value(link).permalink(true).build()))
                .pub_date(pub_date(config, &post.date))
                .description(Some(post.display_description().to_string()))
                .build()
        })
        .collect();

    let channel = ChannelBuilder::default()
        .title(config.site_name.clone())
        .link(absolute_url(config, "/blog"))
        .description(format!("Il blog di {}", config.site_name))
        .language(Some("it".to_string()))
        .last_build_date(posts.first().and_then(|p| pub_date(config, &p.date)))
        .items(items)
        .build();
    channel.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn feed_lists_posts_with_links() {
        let config = SiteConfig::default();
        let posts = vec![Post {
            slug: "cannoli".to_string(),
            title: "Cannoli & co".to_string(),
            date: "2024-12-24".to_string(),
            excerpt: "Ricetta".to_string(),
            ..Default::default()
        }];
        let xml = generate_feed(&config, &posts);
        assert!(xml.contains("<title>Cannoli &amp; co</title>"));
        assert!(xml.contains("http://localhost:8000/blog-post?slug=cannoli"));
        assert!(xml.contains("Tue, 24 Dec 2024 00:00:00 +0100"));
    }

    #[test]
    fn bad_dates_are_left_out() {
        assert_eq!(pub_date(&SiteConfig::default(), "presto"), None);
    }
}
