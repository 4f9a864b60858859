//! Home page sections and the contact form. A section fed `None` keeps
//! its static markup.

use crate::hours::OpeningHours;
use crate::models::featured::FeaturedProduct;
use crate::models::instagram::InstagramMedia;
use crate::models::phone::{PhoneCode, DEFAULT_CODE};
use crate::reviews::{AggregateRating, ReviewCarousel};

use super::{html_escape, notice};

pub const INSTAGRAM_LIMIT: usize = 6;
const CAPTION_LIMIT: usize = 100;

const STATIC_GALLERY: &str = r#"<img src="/static/img/gallery-1.jpg" alt="Foto galleria" class="gallery-img">
<img src="/static/img/gallery-2.jpg" alt="Foto galleria" class="gallery-img">
<img src="/static/img/gallery-3.jpg" alt="Foto galleria" class="gallery-img">"#;

const STATIC_FEATURED: &str = r#"<div class="featured-card product"><img src="/static/img/cannoli.jpg" alt="Cannoli"><h3>Cannoli</h3><p>Ricotta fresca e scorza d'arancia candita.</p></div>
<div class="featured-card product"><img src="/static/img/cassata.jpg" alt="Cassata"><h3>Cassata</h3><p>La tradizione siciliana, su ordinazione.</p></div>"#;

const STATIC_HOURS: &str = r#"<ul class="hours-list">
<li><span>Lun–Sab</span><span>07:00–20:00</span></li>
<li><span>Dom</span><span>07:00–13:00</span></li>
</ul>"#;

const REVIEW_TOGGLE_JS: &str = r#"<script>
document.querySelectorAll('.review-more').forEach(function (d) {
  d.addEventListener('toggle', function () {
    var s = d.querySelector('summary');
    var short = d.closest('.review').querySelector('.short');
    if (short) short.hidden = d.open;
    if (s) s.textContent = d.open ? 'Mostra meno' : 'Mostra di più';
  });
});
</script>"#;

/// One image of the public gallery, from a record or a bare blob listing.
#[derive(Debug, Clone, PartialEq)]
pub struct GalleryImage {
    pub url: String,
    pub alt: String,
}

pub fn gallery_section(images: Option<&[GalleryImage]>) -> String {
    let grid = match images {
        Some(list) if !list.is_empty() => list
            .iter()
            .map(|img| {
                format!(
                    "<img src=\"{}\" alt=\"{}\" class=\"gallery-img\" loading=\"lazy\" tabindex=\"0\">",
                    html_escape(&img.url),
                    html_escape(&img.alt)
                )
            })
            .collect::<Vec<_>>()
            .join("\n"),
        _ => STATIC_GALLERY.to_string(),
    };
    format!(
        "<section id=\"galleria\"><h2>Galleria</h2><div class=\"gallery-grid\">{}</div></section>",
        grid
    )
}

pub fn featured_section(items: Option<&[FeaturedProduct]>) -> String {
    let grid = match items {
        Some(list) if !list.is_empty() => list
            .iter()
            .map(|it| {
                format!(
                    "<div class=\"featured-card product\"><img src=\"{img}\" alt=\"{name}\"><h3>{name}</h3><p>{text}</p></div>",
                    img = html_escape(&it.image),
                    name = html_escape(&it.name),
                    text = html_escape(&it.text),
                )
            })
            .collect::<Vec<_>>()
            .join("\n"),
        _ => STATIC_FEATURED.to_string(),
    };
    format!(
        "<section id=\"prodotti\"><h2>I nostri prodotti</h2><div class=\"featured-grid\" id=\"featuredProducts\">{}</div></section>",
        grid
    )
}

/// `nav_base` is the page path the prev/next links point back to.
pub fn reviews_section(carousel: &ReviewCarousel, rating: Option<&AggregateRating>, nav_base: &str) -> String {
    let mut html = String::from("<section id=\"reviews\"><h2 data-rating-badge-target>Dicono di noi</h2>");
    html.push_str(&rating_badge(rating));

    if carousel.is_empty() {
        html.push_str("<div class=\"reviews-list\">");
        html.push_str(&notice("Nessuna recensione disponibile al momento."));
        html.push_str("</div></section>");
        return html;
    }

    html.push_str("<div class=\"reviews-list\">");
    for card in carousel.cards() {
        let body = match &card.short_html {
            Some(short) => format!(
                "<p class=\"review-text\"><span class=\"short\">{}</span></p>\
                 <details class=\"review-more\"><summary>Mostra di più</summary>\
                 <p class=\"review-text full\">{}</p></details>",
                short, card.full_html
            ),
            None => format!("<p class=\"review-text\">{}</p>", card.full_html),
        };
        html.push_str(&format!(
            "<div class=\"review\"><div class=\"review-header\">\
             <span class=\"reviewer\">{}</span>\
             <span class=\"stars\" aria-label=\"{}\">{}</span>\
             </div>{}</div>",
            html_escape(&card.author),
            html_escape(&card.aria_label),
            card.stars,
            body
        ));
    }
    html.push_str("</div>");

    if carousel.needs_nav() {
        html.push_str(&format!(
            "<div class=\"reviews-nav\" id=\"reviewsNav\">\
             <a class=\"leave-review-btn\" href=\"{base}?r={prev}#reviews\" aria-label=\"Recensioni precedenti\">‹</a>\
             <a class=\"leave-review-btn\" href=\"{base}?r={next}#reviews\" aria-label=\"Altre recensioni\">›</a>\
             </div>",
            base = nav_base,
            prev = carousel.prev_index(),
            next = carousel.next_index(),
        ));
    }
    html.push_str(REVIEW_TOGGLE_JS);
    html.push_str("</section>");
    html
}

pub fn rating_badge(rating: Option<&AggregateRating>) -> String {
    match rating {
        Some(r) => format!(
            "<div data-rating-badge aria-label=\"{}\">{}</div>",
            html_escape(&r.badge_aria()),
            html_escape(&r.badge_text())
        ),
        None => String::new(),
    }
}

pub fn hours_section(hours: Option<&OpeningHours>) -> String {
    let Some(hours) = hours else {
        return format!(
            "<section id=\"orari\" class=\"hours-block\"><h2>Orari</h2>{}</section>",
            STATIC_HOURS
        );
    };

    let mut html = String::from("<section id=\"orari\" class=\"hours-block\"><h2>Orari</h2>");
    html.push_str(&format!(
        "<div class=\"hours-summary\">{}</div><ul class=\"hours-list\">",
        html_escape(&hours.summary)
    ));
    for row in &hours.rows {
        let mut classes = Vec::new();
        if row.closed {
            classes.push("closed");
        }
        if row.today {
            classes.push("today");
        }
        let class_attr = if classes.is_empty() {
            String::new()
        } else {
            format!(" class=\"{}\"", classes.join(" "))
        };
        let badge = row
            .badge
            .map(|b| format!("<span class=\"badge\">{}</span>", b))
            .unwrap_or_default();
        html.push_str(&format!(
            "<li{}><span>{}</span><span>{}</span>{}</li>",
            class_attr,
            row.label,
            html_escape(&row.text),
            badge
        ));
    }
    html.push_str("</ul>");

    if !hours.special.is_empty() {
        html.push_str(
            "<div class=\"special-hours\"><div class=\"special-hours-title\">Giorni speciali</div><ul class=\"special-hours-list\">",
        );
        for day in &hours.special {
            html.push_str(&format!(
                "<li{}><span>{}</span><span>{}</span></li>",
                if day.closed { " class=\"closed\"" } else { "" },
                html_escape(&day.label),
                html_escape(&day.text)
            ));
        }
        html.push_str("</ul></div>");
    }
    html.push_str("</section>");
    html
}

fn caption_label(media: &InstagramMedia) -> String {
    match media.caption.as_deref().filter(|c| !c.is_empty()) {
        Some(c) => c.chars().take(CAPTION_LIMIT).collect(),
        None => "Instagram post".to_string(),
    }
}

/// `Err` means the feed could not be read at all.
pub fn instagram_section(feed: Result<&[InstagramMedia], ()>, profile_url: &str) -> String {
    let inner = match feed {
        Err(()) => "<p style=\"opacity:.75\">Feed Instagram non disponibile</p>".to_string(),
        Ok([]) => "<p style=\"opacity:.75\">Nessun post disponibile</p>".to_string(),
        Ok(media) => {
            let items: Vec<String> = media
                .iter()
                .take(INSTAGRAM_LIMIT)
                .map(|m| {
                    let label = html_escape(&caption_label(m));
                    let href = m.permalink.as_deref().filter(|s| !s.is_empty()).unwrap_or(profile_url);
                    let src = m
                        .thumbnail
                        .as_deref()
                        .filter(|s| !s.is_empty())
                        .or(m.url.as_deref())
                        .unwrap_or("");
                    format!(
                        "<a class=\"instagram-item\" href=\"{}\" target=\"_blank\" rel=\"noopener\" aria-label=\"{}\">\
                         <img src=\"{}\" alt=\"{}\" loading=\"lazy\"></a>",
                        html_escape(href),
                        label,
                        html_escape(src),
                        label
                    )
                })
                .collect();
            format!("<div class=\"instagram-grid\">{}</div>", items.join(""))
        }
    };
    format!(
        "<section id=\"instagram\"><h2>Instagram</h2><div id=\"instagramFeed\">{}</div></section>",
        inner
    )
}

/// Phone prefix options, Italy (or the first entry) preselected.
pub fn phone_code_options(codes: &[PhoneCode]) -> String {
    if codes.is_empty() {
        return format!("<option value=\"{c}\" selected>{c} (IT)</option>", c = DEFAULT_CODE);
    }
    let selected = codes
        .iter()
        .position(|c| c.code == DEFAULT_CODE)
        .unwrap_or(0);
    codes
        .iter()
        .enumerate()
        .map(|(i, c)| {
            format!(
                "<option value=\"{}\"{}>{}</option>",
                html_escape(&c.code),
                if i == selected { " selected" } else { "" },
                html_escape(&c.label())
            )
        })
        .collect::<Vec<_>>()
        .join("")
}

pub fn contact_section(codes: &[PhoneCode], status: Option<&str>) -> String {
    let status_html = match status {
        Some(msg) => format!("<p id=\"formStatus\" class=\"flash\">{}</p>", html_escape(msg)),
        None => "<p id=\"formStatus\" hidden></p>".to_string(),
    };
    format!(
        r#"<section id="contatti"><h1>Contatti</h1>
{status}
<form class="contact-form" method="post" action="/contatti">
    <label>Nome <input type="text" name="name" required></label>
    <label>Email <input type="email" name="email" required></label>
    <div class="phone-field">
        <select name="phone_code" aria-label="Prefisso">{options}</select>
        <input type="tel" name="phone_number" placeholder="Telefono">
    </div>
    <label>Messaggio <textarea name="message" rows="5" required></textarea></label>
    <button type="submit">Invia</button>
</form>
</section>"#,
        status = status_html,
        options = phone_code_options(codes),
    )
}
