//! Opening hours from the reviews snapshot: weekly rows, an "open now"
//! summary, upcoming special days and the `openingHoursSpecification`
//! JSON-LD entries.

use std::collections::HashMap;
use std::sync::OnceLock;

use chrono::{DateTime, Datelike, NaiveDate, TimeZone, Timelike, Weekday};
use regex::Regex;
use serde_json::{json, Value};

use crate::models::review::SpecialHourPeriod;

const WEEK: [Weekday; 7] = [
    Weekday::Mon,
    Weekday::Tue,
    Weekday::Wed,
    Weekday::Thu,
    Weekday::Fri,
    Weekday::Sat,
    Weekday::Sun,
];

pub const MAX_SPECIAL_DAYS: usize = 5;

#[derive(Debug, Clone, PartialEq)]
pub enum DayHours {
    Closed,
    /// Source text with whitespace removed, e.g. `7:00AM`.
    Range { opens: String, closes: String },
    Raw(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct DayEntry {
    pub day: Weekday,
    pub hours: DayHours,
}

#[derive(Debug, Clone, PartialEq)]
pub struct HoursRow {
    pub label: &'static str,
    pub text: String,
    pub badge: Option<&'static str>,
    pub closed: bool,
    pub today: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SpecialDay {
    pub date: NaiveDate,
    pub label: String,
    pub text: String,
    pub closed: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct OpeningHours {
    pub rows: Vec<HoursRow>,
    pub summary: String,
    pub special: Vec<SpecialDay>,
    pub specification: Vec<Value>,
}

fn closed_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)chius|closed").expect("valid regex"))
}

fn range_sep_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[–—-]").expect("valid regex"))
}

fn clock_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(\d{1,2})(?::(\d{2}))?").expect("valid regex"))
}

fn time24_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^(\d{2}):(\d{2})(?::\d{2})?$").expect("valid regex"))
}

/// English (any case, short or long) or Italian day name.
pub fn parse_day(name: &str) -> Option<Weekday> {
    let lower = name.trim().to_lowercase();
    let italian = match lower.as_str() {
        "lunedì" | "lunedi" => Some(Weekday::Mon),
        "martedì" | "martedi" => Some(Weekday::Tue),
        "mercoledì" | "mercoledi" => Some(Weekday::Wed),
        "giovedì" | "giovedi" => Some(Weekday::Thu),
        "venerdì" | "venerdi" => Some(Weekday::Fri),
        "sabato" => Some(Weekday::Sat),
        "domenica" => Some(Weekday::Sun),
        _ => None,
    };
    italian.or_else(|| lower.parse::<Weekday>().ok())
}

pub fn day_label(day: Weekday) -> &'static str {
    match day {
        Weekday::Mon => "Lun",
        Weekday::Tue => "Mar",
        Weekday::Wed => "Mer",
        Weekday::Thu => "Gio",
        Weekday::Fri => "Ven",
        Weekday::Sat => "Sab",
        Weekday::Sun => "Dom",
    }
}

fn day_name_en(day: Weekday) -> &'static str {
    match day {
        Weekday::Mon => "Monday",
        Weekday::Tue => "Tuesday",
        Weekday::Wed => "Wednesday",
        Weekday::Thu => "Thursday",
        Weekday::Fri => "Friday",
        Weekday::Sat => "Saturday",
        Weekday::Sun => "Sunday",
    }
}

/// Parse one `Day: range` description. The day is everything before the
/// first colon.
pub fn parse_description(desc: &str) -> Option<DayEntry> {
    let (day, rest) = desc.split_once(':')?;
    let day = parse_day(day)?;
    let rest = rest.trim();

    if closed_re().is_match(rest) {
        return Some(DayEntry { day, hours: DayHours::Closed });
    }
    let parts: Vec<&str> = range_sep_re()
        .split(rest)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect();
    let strip = |s: &str| s.chars().filter(|c| !c.is_whitespace()).collect::<String>();
    let hours = if parts.len() == 2 {
        DayHours::Range {
            opens: strip(parts[0]),
            closes: strip(parts[1]),
        }
    } else {
        DayHours::Raw(rest.to_string())
    };
    Some(DayEntry { day, hours })
}

/// `7:00AM` → `07:00`, `8:00PM` → `20:00`, `12:30AM` → `00:30`, `9` → `09:00`.
pub fn normalize_time(t: &str) -> Option<String> {
    let c = clock_re().captures(t)?;
    let mut h: u32 = c[1].parse().ok()?;
    let min = c.get(2).map(|m| m.as_str()).unwrap_or("00");
    let lower = t.to_lowercase();
    if lower.contains("pm") && h < 12 {
        h += 12;
    }
    if lower.contains("am") && h == 12 {
        h = 0;
    }
    if h > 24 {
        return None;
    }
    Some(format!("{:02}:{}", h, min))
}

/// `HH:MM` or `HH:MM:SS` → `HH:MM`; anything else unchanged.
pub fn format_time24(t: &str) -> String {
    match time24_re().captures(t.trim()) {
        Some(c) => format!("{}:{}", &c[1], &c[2]),
        None => t.trim().to_string(),
    }
}

fn normalized_range(hours: &DayHours) -> Option<(String, String)> {
    match hours {
        DayHours::Range { opens, closes } => Some((normalize_time(opens)?, normalize_time(closes)?)),
        _ => None,
    }
}

fn minutes(hhmm: &str) -> Option<u32> {
    let (h, m) = hhmm.split_once(':')?;
    Some(h.parse::<u32>().ok()? * 60 + m.parse::<u32>().ok()?)
}

fn weekday_short_it(day: Weekday) -> &'static str {
    match day {
        Weekday::Mon => "lun",
        Weekday::Tue => "mar",
        Weekday::Wed => "mer",
        Weekday::Thu => "gio",
        Weekday::Fri => "ven",
        Weekday::Sat => "sab",
        Weekday::Sun => "dom",
    }
}

/// `2025-12-24` → `mer 24/12`.
pub fn readable_date(date: NaiveDate) -> String {
    format!("{} {}", weekday_short_it(date.weekday()), date.format("%d/%m"))
}

fn build_rows(by_day: &HashMap<Weekday, DayHours>, today: Weekday) -> Vec<HoursRow> {
    WEEK.iter()
        .map(|day| {
            let is_today = *day == today;
            let (text, badge, closed) = match by_day.get(day) {
                None => ("—".to_string(), None, false),
                Some(DayHours::Closed) => ("Chiuso".to_string(), Some("chiuso"), true),
                Some(hours @ DayHours::Range { opens, closes }) => {
                    let text = match normalized_range(hours) {
                        Some((o, c)) => format!("{}–{}", o, c),
                        None => format!("{}–{}", opens, closes),
                    };
                    (text, Some("aperto"), false)
                }
                Some(DayHours::Raw(raw)) => (raw.clone(), None, false),
            };
            HoursRow {
                label: day_label(*day),
                text,
                badge: match badge {
                    Some(_) if is_today => Some("oggi"),
                    b => b,
                },
                closed,
                today: is_today,
            }
        })
        .collect()
}

fn build_summary(by_day: &HashMap<Weekday, DayHours>, today: Weekday, now_min: u32) -> String {
    match by_day.get(&today) {
        Some(DayHours::Closed) => "Oggi chiuso".to_string(),
        Some(hours) => {
            let Some((o, c)) = normalized_range(hours) else {
                return "Orari aggiornati".to_string();
            };
            let (Some(open), Some(mut close)) = (minutes(&o), minutes(&c)) else {
                return "Orari aggiornati".to_string();
            };
            if close <= open {
                close += 24 * 60;
            }
            if now_min < open {
                format!("Apre alle {}", o)
            } else if now_min < close {
                format!("Aperto ora · {}–{}", o, c)
            } else {
                "Chiuso ora".to_string()
            }
        }
        None => "Orari aggiornati".to_string(),
    }
}

fn build_special(periods: &[SpecialHourPeriod], today: NaiveDate) -> Vec<SpecialDay> {
    let mut days: Vec<SpecialDay> = periods
        .iter()
        .filter_map(|p| {
            let parts = p.start_date?;
            let date = NaiveDate::from_ymd_opt(parts.year, parts.month, parts.day)?;
            let text = if p.closed {
                "Chiuso".to_string()
            } else {
                let short = |t: &Option<String>| {
                    t.as_deref()
                        .map(format_time24)
                        .map(|s| s.chars().take(5).collect::<String>())
                        .unwrap_or_default()
                };
                format!("{}–{}", short(&p.open_time), short(&p.close_time))
            };
            Some(SpecialDay {
                date,
                label: readable_date(date),
                text,
                closed: p.closed,
            })
        })
        .filter(|d| d.date >= today)
        .collect();
    days.sort_by_key(|d| d.date);
    days.truncate(MAX_SPECIAL_DAYS);
    days
}

fn build_specification(by_day: &HashMap<Weekday, DayHours>) -> Vec<Value> {
    WEEK.iter()
        .filter_map(|day| {
            let (opens, closes) = normalized_range(by_day.get(day)?)?;
            Some(json!({
                "@type": "OpeningHoursSpecification",
                "dayOfWeek": [day_name_en(*day)],
                "opens": opens,
                "closes": closes,
            }))
        })
        .collect()
}

/// Derive everything the hours widget shows for the instant `now`.
/// Returns `None` when there is nothing usable, in which case the
/// static hours markup stays.
pub fn derive<Tz: TimeZone>(
    descriptions: &[String],
    special: &[SpecialHourPeriod],
    now: &DateTime<Tz>,
) -> Option<OpeningHours> {
    let mut by_day: HashMap<Weekday, DayHours> = HashMap::new();
    for entry in descriptions.iter().filter_map(|d| parse_description(d)) {
        by_day.insert(entry.day, entry.hours);
    }
    if by_day.is_empty() {
        return None;
    }

    let today = now.weekday();
    let now_min = now.hour() * 60 + now.minute();
    Some(OpeningHours {
        rows: build_rows(&by_day, today),
        summary: build_summary(&by_day, today, now_min),
        special: build_special(special, now.date_naive()),
        specification: build_specification(&by_day),
    })
}
