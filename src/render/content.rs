//! Blog body renderer: a list of raw paragraphs to HTML blocks.
//!
//! Each paragraph goes through a fixed chain of block checks (section
//! label, `#` heading, numbered list, dash list, plain paragraph) and then
//! inline formatting (links, bold, italic, bare URLs). Literal text is
//! always escaped; generated markup is parked behind placeholder tokens
//! so it is never escaped twice.

use std::sync::OnceLock;

use regex::{Captures, Regex};

use super::html_escape;

// Private-use code points delimit placeholder tokens. They are stripped
// from the input first so user text can never forge one.
const TOKEN_OPEN: char = '\u{E000}';
const TOKEN_CLOSE: char = '\u{E001}';

struct Patterns {
    section_label: Regex,
    heading: Regex,
    numbered: Regex,
    dashed: Regex,
    md_link: Regex,
    bold: Regex,
    italic_star: Regex,
    italic_underscore: Regex,
    bare_url: Regex,
    token: Regex,
}

fn patterns() -> &'static Patterns {
    static P: OnceLock<Patterns> = OnceLock::new();
    P.get_or_init(|| Patterns {
        section_label: Regex::new(r"(?i)^(introduzione|conclusione|introduction|conclusion)\s*:?$")
            .expect("valid regex"),
        heading: Regex::new(r"(?s)^(#+)\s+(.+)$").expect("valid regex"),
        numbered: Regex::new(r"^\d+\.\s+(.+)$").expect("valid regex"),
        dashed: Regex::new(r"^-\s+(.+)$").expect("valid regex"),
        md_link: Regex::new(r"\[([^\]\n]+)\]\(((?:https?://|mailto:|/|www\.)[^\s)]*)\)")
            .expect("valid regex"),
        bold: Regex::new(r"\*\*([^*\n](?:[^\n]*?[^*\n])?)\*\*").expect("valid regex"),
        italic_star: Regex::new(r"\*([^*\s](?:[^*\n]*?[^*\s])?)\*").expect("valid regex"),
        italic_underscore: Regex::new(r"(^|[^\w])_([^_\s](?:[^_\n]*?[^_\s])?)_($|[^\w])")
            .expect("valid regex"),
        bare_url: Regex::new(r"(https?://|www\.)[^\s<\x{E000}\x{E001}]+").expect("valid regex"),
        token: Regex::new(r"\x{E000}(\d+)\x{E001}").expect("valid regex"),
    })
}

/// Render every paragraph, one block per line of output.
pub fn render_paragraphs<S: AsRef<str>>(paragraphs: &[S]) -> String {
    paragraphs
        .iter()
        .map(|p| render_paragraph(p.as_ref()))
        .filter(|html| !html.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Render a single paragraph. Blank input renders to nothing.
pub fn render_paragraph(raw: &str) -> String {
    let cleaned: String = raw
        .chars()
        .filter(|c| *c != TOKEN_OPEN && *c != TOKEN_CLOSE)
        .collect::<String>()
        .replace("\r\n", "\n");
    let text = cleaned.trim();
    if text.is_empty() {
        return String::new();
    }
    let p = patterns();

    if let Some(c) = p.section_label.captures(text) {
        return format!("<h2>{}</h2>", html_escape(&c[1]));
    }

    if let Some(c) = p.heading.captures(text) {
        let level = if c[1].len() <= 2 { 2 } else { 3 };
        let title = c[2].split_whitespace().collect::<Vec<_>>().join(" ");
        return format!("<h{lvl}>{}</h{lvl}>", inline(&title), lvl = level);
    }

    let lines: Vec<&str> = text.lines().map(str::trim).filter(|l| !l.is_empty()).collect();
    if let Some(html) = list_block(&lines, &p.numbered, "ol") {
        return html;
    }
    if let Some(html) = list_block(&lines, &p.dashed, "ul") {
        return html;
    }

    let body = lines.iter().map(|l| inline(l)).collect::<Vec<_>>().join("<br>");
    format!("<p>{}</p>", body)
}

/// A list when strictly more than half of the lines are items and there
/// are at least two. Lines before the first item form a lead paragraph;
/// later stray lines continue the previous item.
fn list_block(lines: &[&str], item: &Regex, tag: &str) -> Option<String> {
    let items = lines.iter().filter(|l| item.is_match(l)).count();
    if items < 2 || items * 2 <= lines.len() {
        return None;
    }

    let mut lead: Vec<String> = Vec::new();
    let mut entries: Vec<Vec<String>> = Vec::new();
    for line in lines {
        match item.captures(line) {
            Some(c) => entries.push(vec![inline(&c[1])]),
            None => match entries.last_mut() {
                Some(entry) => entry.push(inline(line)),
                None => lead.push(inline(line)),
            },
        }
    }

    let mut html = String::new();
    if !lead.is_empty() {
        html.push_str(&format!("<p>{}</p>", lead.join("<br>")));
    }
    html.push_str(&format!("<{}>", tag));
    for entry in entries {
        html.push_str(&format!("<li>{}</li>", entry.join("<br>")));
    }
    html.push_str(&format!("</{}>", tag));
    Some(html)
}

fn park(tokens: &mut Vec<String>, html: String) -> String {
    tokens.push(html);
    format!("{}{}{}", TOKEN_OPEN, tokens.len() - 1, TOKEN_CLOSE)
}

fn href_for(url: &str) -> String {
    if url.starts_with("www.") {
        format!("https://{}", url)
    } else {
        url.to_string()
    }
}

fn anchor(href: &str, label_html: &str) -> String {
    let external = href.starts_with("http");
    format!(
        "<a href=\"{}\"{}>{}</a>",
        html_escape(href),
        if external { " target=\"_blank\" rel=\"noopener\"" } else { "" },
        label_html
    )
}

/// Inline formatting of one line of literal text.
pub fn inline(raw: &str) -> String {
    let p = patterns();
    let mut tokens: Vec<String> = Vec::new();

    // 1. markdown links
    let text = p
        .md_link
        .replace_all(raw, |c: &Captures| {
            let html = anchor(&href_for(&c[2]), &html_escape(&c[1]));
            park(&mut tokens, html)
        })
        .into_owned();

    // 2. bold, with italics allowed inside
    let text = p
        .bold
        .replace_all(&text, |c: &Captures| {
            let html = format!("<strong>{}</strong>", italic_html(&c[1]));
            park(&mut tokens, html)
        })
        .into_owned();

    // 3. italic
    let text = p
        .italic_star
        .replace_all(&text, |c: &Captures| {
            let html = format!("<em>{}</em>", html_escape(&c[1]));
            park(&mut tokens, html)
        })
        .into_owned();
    // The boundary groups consume their separator, so adjacent spans need
    // another pass. Each pass parks at least one span or stops.
    let mut text = text;
    loop {
        let next = p
            .italic_underscore
            .replace_all(&text, |c: &Captures| {
                let html = format!("<em>{}</em>", html_escape(&c[2]));
                format!("{}{}{}", &c[1], park(&mut tokens, html), &c[3])
            })
            .into_owned();
        if next == text {
            break;
        }
        text = next;
    }

    // 4. escape what is left, then link bare URLs
    let escaped = html_escape(&text);
    let linked = p
        .bare_url
        .replace_all(&escaped, |c: &Captures| {
            let matched = &c[0];
            let url = matched.trim_end_matches(['.', ',', ';', ':', '!', '?', ')']);
            let tail = &matched[url.len()..];
            // The URL is already escaped text; unescape before rebuilding the href.
            let raw_url = unescape(url);
            format!("{}{}", anchor(&href_for(&raw_url), url), tail)
        })
        .into_owned();

    restore(&linked, &tokens)
}

fn italic_html(raw: &str) -> String {
    let p = patterns();
    let mut out = String::new();
    let mut last = 0;
    for c in p.italic_star.captures_iter(raw) {
        let m = c.get(0).map(|m| (m.start(), m.end())).unwrap_or((0, 0));
        out.push_str(&html_escape(&raw[last..m.0]));
        out.push_str(&format!("<em>{}</em>", html_escape(&c[1])));
        last = m.1;
    }
    out.push_str(&html_escape(&raw[last..]));
    out
}

fn unescape(s: &str) -> String {
    s.replace("&quot;", "\"")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&amp;", "&")
}

/// Swap tokens back for their markup. Tokens may nest (a link inside
/// bold), so repeat until none are left.
fn restore(text: &str, tokens: &[String]) -> String {
    let p = patterns();
    let mut out = text.to_string();
    for _ in 0..=tokens.len() {
        if !out.contains(TOKEN_OPEN) {
            break;
        }
        out = p
            .token
            .replace_all(&out, |c: &Captures| {
                c[1].parse::<usize>()
                    .ok()
                    .and_then(|i| tokens.get(i))
                    .cloned()
                    .unwrap_or_default()
            })
            .into_owned();
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn section_labels_become_h2() {
        assert_eq!(render_paragraph("Introduzione"), "<h2>Introduzione</h2>");
        assert_eq!(render_paragraph("conclusion:"), "<h2>conclusion</h2>");
        assert!(render_paragraph("Introduzione alla pasticceria").starts_with("<p>"));
    }

    #[test]
    fn hash_headings() {
        assert_eq!(render_paragraph("# Titolo"), "<h2>Titolo</h2>");
        assert_eq!(render_paragraph("## Sotto"), "<h2>Sotto</h2>");
        assert_eq!(render_paragraph("#### Profondo"), "<h3>Profondo</h3>");
        assert_eq!(render_paragraph("#hashtag"), "<p>#hashtag</p>");
    }

    #[test]
    fn numbered_list_needs_majority_and_two_items() {
        assert_eq!(
            render_paragraph("1. Farina\n2. Zucchero\n3. Uova"),
            "<ol><li>Farina</li><li>Zucchero</li><li>Uova</li></ol>"
        );
        assert_eq!(render_paragraph("1. Solo uno"), "<p>1. Solo uno</p>");
        assert!(render_paragraph("Testo\naltro\n1. a\n2. b").starts_with("<p>"));
        assert_eq!(
            render_paragraph("Ingredienti:\n1. a\n2. b"),
            "<p>Ingredienti:</p><ol><li>a</li><li>b</li></ol>"
        );
    }

    #[test]
    fn dash_list() {
        assert_eq!(
            render_paragraph("- ricotta\n- canditi\n  continua"),
            "<ul><li>ricotta</li><li>canditi<br>continua</li></ul>"
        );
    }

    #[test]
    fn plain_paragraph_with_line_breaks() {
        assert_eq!(render_paragraph("riga uno\nriga due"), "<p>riga uno<br>riga due</p>");
        assert_eq!(render_paragraph("   \n "), "");
    }

    #[test]
    fn escapes_literal_html() {
        assert_eq!(
            render_paragraph("<script>alert(1)</script> & \"x\""),
            "<p>&lt;script&gt;alert(1)&lt;/script&gt; &amp; &quot;x&quot;</p>"
        );
    }

    #[test]
    fn inline_precedence() {
        assert_eq!(
            inline("[Menu](https://example.com/menu) e **torte** e *cannoli* e _sfogliatelle_"),
            "<a href=\"https://example.com/menu\" target=\"_blank\" rel=\"noopener\">Menu</a> e \
             <strong>torte</strong> e <em>cannoli</em> e <em>sfogliatelle</em>"
        );
        assert_eq!(
            inline("**[x](/blog)**"),
            "<strong><a href=\"/blog\">x</a></strong>"
        );
    }

    #[test]
    fn adjacent_underscore_emphasis() {
        assert_eq!(inline("_a_ _b_"), "<em>a</em> <em>b</em>");
        assert_eq!(inline("_uno_, _due_ e _tre_"), "<em>uno</em>, <em>due</em> e <em>tre</em>");
        assert_eq!(inline("snake_case_name"), "snake_case_name");
    }

    #[test]
    fn bare_urls_are_linked() {
        assert_eq!(
            inline("Visita www.example.com."),
            "Visita <a href=\"https://www.example.com\" target=\"_blank\" rel=\"noopener\">www.example.com</a>."
        );
        assert_eq!(
            inline("https://a.it/x?a=1&b=2"),
            "<a href=\"https://a.it/x?a=1&amp;b=2\" target=\"_blank\" rel=\"noopener\">https://a.it/x?a=1&amp;b=2</a>"
        );
        // underscores inside a URL are not emphasis
        assert_eq!(
            inline("http://a.it/foo_bar_baz"),
            "<a href=\"http://a.it/foo_bar_baz\" target=\"_blank\" rel=\"noopener\">http://a.it/foo_bar_baz</a>"
        );
    }

    #[test]
    fn forged_tokens_are_stripped() {
        let forged = format!("a{}0{}b", TOKEN_OPEN, TOKEN_CLOSE);
        assert_eq!(render_paragraph(&forged), "<p>a0b</p>");
    }

    #[test]
    fn rendering_is_deterministic() {
        let paras = vec![
            "Introduzione".to_string(),
            "## Storia".to_string(),
            "Il **cannolo** nasce a *Palermo*, vedi www.example.com".to_string(),
            "- a\n- b".to_string(),
            "1. uno\n2. due".to_string(),
        ];
        let first = render_paragraphs(&paras);
        let second = render_paragraphs(&paras);
        assert_eq!(first, second);
        assert_eq!(first.lines().count(), 5);
    }
}
