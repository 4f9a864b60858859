//! Reviews carousel and the aggregate Google rating.

use std::sync::OnceLock;

use regex::Regex;
use serde_json::{json, Value};

use crate::models::review::{Review, ReviewsSnapshot};
use crate::render::html_escape;

pub const TEXT_LIMIT: usize = 200;
pub const WINDOW: usize = 3;
pub const DEFAULT_AUTHOR: &str = "Cliente Google";

/// Shown when the snapshot can't be read at all.
pub fn placeholders() -> Vec<Review> {
    vec![
        Review::new("Cliente", 5.0, "Dolci eccellenti e servizio impeccabile!"),
        Review::new("Visitatore", 5.0, "Cannoli fantastici, tornerò sicuramente."),
    ]
}

fn trailing_word_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\s+\S*$").expect("valid regex"))
}

/// Short form of a long review: the first 200 characters, cut back to
/// the last whole word, plus `…`. `None` when the text is short enough.
pub fn truncate_text(raw: &str) -> Option<String> {
    if raw.chars().count() <= TEXT_LIMIT {
        return None;
    }
    let head: String = raw.chars().take(TEXT_LIMIT).collect();
    Some(format!("{}…", trailing_word_re().replace(&head, "")))
}

/// `★★★★☆` for 4. A missing or zero rating counts as 5.
pub fn stars(rating: Option<f64>) -> String {
    let full = effective_rating(rating).floor().clamp(0.0, 5.0) as usize;
    format!("{}{}", "★".repeat(full), "☆".repeat(5 - full))
}

fn effective_rating(rating: Option<f64>) -> f64 {
    match rating {
        Some(r) if r > 0.0 && r.is_finite() => r,
        _ => 5.0,
    }
}

/// Escaped text with newlines as `<br>`.
pub fn text_html(s: &str) -> String {
    html_escape(s).replace('\n', "<br>")
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReviewCard {
    pub author: String,
    pub stars: String,
    pub aria_label: String,
    /// Present only for long reviews; the page shows it with a
    /// "Mostra di più" toggle.
    pub short_html: Option<String>,
    pub full_html: String,
}

impl ReviewCard {
    pub fn from_review(r: &Review) -> Self {
        let author = r.author_name.trim();
        let rating = effective_rating(r.rating);
        ReviewCard {
            author: if author.is_empty() { DEFAULT_AUTHOR } else { author }.to_string(),
            stars: stars(r.rating),
            aria_label: format!("Voto {} su 5", rating),
            short_html: truncate_text(&r.text).map(|s| text_html(&s)),
            full_html: text_html(&r.text),
        }
    }
}

/// A window of consecutive reviews over a circular list, moved one item
/// at a time.
#[derive(Debug, Clone)]
pub struct ReviewCarousel {
    reviews: Vec<Review>,
    index: usize,
    visible: usize,
}

impl ReviewCarousel {
    pub fn new(reviews: Vec<Review>, visible: usize) -> Self {
        ReviewCarousel {
            reviews,
            index: 0,
            visible: visible.max(1),
        }
    }

    /// Start at an arbitrary offset, e.g. from a `?r=` query parameter.
    pub fn at(mut self, index: usize) -> Self {
        if !self.reviews.is_empty() {
            self.index = index % self.reviews.len();
        }
        self
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn is_empty(&self) -> bool {
        self.reviews.is_empty()
    }

    pub fn len(&self) -> usize {
        self.reviews.len()
    }

    /// Navigation only makes sense when not everything fits.
    pub fn needs_nav(&self) -> bool {
        self.reviews.len() > self.visible
    }

    pub fn window(&self) -> Vec<&Review> {
        let n = self.reviews.len();
        (0..self.visible.min(n))
            .map(|i| &self.reviews[(self.index + i) % n])
            .collect()
    }

    pub fn cards(&self) -> Vec<ReviewCard> {
        self.window().into_iter().map(ReviewCard::from_review).collect()
    }

    pub fn next_index(&self) -> usize {
        match self.reviews.len() {
            0 => 0,
            n => (self.index + 1) % n,
        }
    }

    pub fn prev_index(&self) -> usize {
        match self.reviews.len() {
            0 => 0,
            n => (self.index + n - 1) % n,
        }
    }

    pub fn next(&mut self) {
        self.index = self.next_index();
    }

    pub fn prev(&mut self) {
        self.index = self.prev_index();
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AggregateRating {
    /// Rounded to one decimal.
    pub value: f64,
    pub count: usize,
}

impl AggregateRating {
    /// The snapshot's `averageRating`, or the mean of the review ratings
    /// (missing ratings count as 0). `None` without reviews or when the
    /// value is not positive.
    pub fn from_snapshot(snapshot: &ReviewsSnapshot) -> Option<Self> {
        let count = snapshot.reviews.len();
        if count == 0 {
            return None;
        }
        let value = match snapshot.average_rating {
            Some(avg) => avg,
            None => snapshot.reviews.iter().map(|r| r.rating.unwrap_or(0.0)).sum::<f64>() / count as f64,
        };
        if !value.is_finite() || value <= 0.0 {
            return None;
        }
        Some(AggregateRating {
            value: (value * 10.0).round() / 10.0,
            count,
        })
    }

    pub fn display(&self) -> String {
        format!("{:.1}", self.value)
    }

    pub fn badge_text(&self) -> String {
        format!("{} ★ ({} recensioni su Google)", self.display(), self.count)
    }

    pub fn badge_aria(&self) -> String {
        format!(
            "Valutazione media {} su 5 basata su {} recensioni su Google",
            self.display(),
            self.count
        )
    }

    pub fn jsonld(&self) -> Value {
        json!({
            "@type": "AggregateRating",
            "ratingValue": self.display(),
            "reviewCount": self.count,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn named(n: usize) -> Vec<Review> {
        (0..n).map(|i| Review::new(&format!("R{}", i), 5.0, "ok")).collect()
    }

    #[test]
    fn truncates_on_word_boundary() {
        let text = "parola ".repeat(40);
        let short = truncate_text(&text).unwrap();
        assert!(short.ends_with("parola…"));
        assert!(short.chars().count() <= TEXT_LIMIT + 1);
        assert_eq!(truncate_text("breve"), None);
    }

    #[test]
    fn star_strings() {
        assert_eq!(stars(Some(4.0)), "★★★★☆");
        assert_eq!(stars(Some(3.7)), "★★★☆☆");
        assert_eq!(stars(None), "★★★★★");
        assert_eq!(stars(Some(0.0)), "★★★★★");
    }

    #[test]
    fn card_defaults_and_escaping() {
        let card = ReviewCard::from_review(&Review {
            author_name: "  ".to_string(),
            rating: None,
            text: "<b>buono</b>\nbis".to_string(),
        });
        assert_eq!(card.author, "Cliente Google");
        assert_eq!(card.aria_label, "Voto 5 su 5");
        assert_eq!(card.full_html, "&lt;b&gt;buono&lt;/b&gt;<br>bis");
        assert!(card.short_html.is_none());
    }

    #[test]
    fn carousel_wraps_around() {
        let mut c = ReviewCarousel::new(named(4), WINDOW);
        let names = |c: &ReviewCarousel| c.window().iter().map(|r| r.author_name.clone()).collect::<Vec<_>>();
        assert_eq!(names(&c), vec!["R0", "R1", "R2"]);
        c.prev();
        assert_eq!(c.index(), 3);
        assert_eq!(names(&c), vec!["R3", "R0", "R1"]);
        c.next();
        c.next();
        assert_eq!(names(&c), vec!["R1", "R2", "R3"]);
        assert!(c.needs_nav());
    }

    #[test]
    fn small_lists_show_everything_without_nav() {
        let c = ReviewCarousel::new(named(2), WINDOW).at(7);
        assert_eq!(c.window().len(), 2);
        assert!(!c.needs_nav());
        let empty = ReviewCarousel::new(vec![], WINDOW);
        assert!(empty.window().is_empty());
        assert_eq!(empty.next_index(), 0);
    }

    #[test]
    fn aggregate_rating() {
        let snap = ReviewsSnapshot {
            reviews: vec![Review::new("a", 5.0, ""), Review::new("b", 4.0, ""), Review::new("c", 4.0, "")],
            ..Default::default()
        };
        let agg = AggregateRating::from_snapshot(&snap).unwrap();
        assert_eq!(agg.display(), "4.3");
        assert_eq!(agg.badge_text(), "4.3 ★ (3 recensioni su Google)");
        assert_eq!(
            agg.badge_aria(),
            "Valutazione media 4.3 su 5 basata su 3 recensioni su Google"
        );
        assert_eq!(agg.jsonld()["ratingValue"], "4.3");
        assert_eq!(agg.jsonld()["reviewCount"], 3);

        let with_avg = ReviewsSnapshot {
            average_rating: Some(4.86),
            ..snap.clone()
        };
        assert_eq!(AggregateRating::from_snapshot(&with_avg).unwrap().display(), "4.9");
        assert!(AggregateRating::from_snapshot(&ReviewsSnapshot::default()).is_none());
    }
}
