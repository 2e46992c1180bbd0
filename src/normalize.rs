//! Text cleanup and date parsing for scraped strings.
//!
//! Everything here is pure: no I/O and no clock access (callers pass `now`).
//!
//! - [`normalize_text`]: entity decoding plus whitespace collapsing
//! - [`normalize_title`]: [`normalize_text`] minus editorial labels, single line
//! - [`parse_date`]: the ordered layout list, localized month names and relative
//!   "N minutes ago" phrases, with an [`Published::Unparsed`] sentinel on failure

use crate::models::Published;
use chrono::{DateTime, Duration, FixedOffset, NaiveDate, NaiveDateTime, TimeZone, Utc};
use once_cell::sync::Lazy;
use regex::Regex;

static RE_NEWLINE_RUN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\s*\n\s*").expect("newline regex is valid"));
static RE_SPACE_RUN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^\S\n]+").expect("space regex is valid"));
static RE_RELATIVE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^(\d+)\s*(dakika|dk|saat|sa|gün|gun|minutes?|mins?|hours?|hrs?|days?)\s*(önce|once|ago)$",
    )
    .expect("relative date regex is valid")
});
static RE_CLOCK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\d{1,2})[:.](\d{2})$").expect("clock regex is valid"));

/// Editorial labels removed from titles wherever they occur.
pub const TITLE_LABELS: &[&str] = &[
    "Son Dakika:",
    "SON DAKİKA:",
    "CANLI:",
    "VİDEO:",
    "VIDEO:",
    "FOTO:",
    "GALERİ:",
    "ÖZEL:",
    "LIVE:",
    "BREAKING:",
    "PHOTOS:",
];

const NAIVE_DATETIME_LAYOUTS: &[&str] = &[
    "%d.%m.%Y %H:%M",
    "%d.%m.%Y %H:%M:%S",
    "%d/%m/%Y %H:%M",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%d %m %Y %H:%M",
    "%d %m %Y %H:%M:%S",
];

const NAIVE_DATE_LAYOUTS: &[&str] = &["%d.%m.%Y", "%d/%m/%Y", "%Y-%m-%d", "%d %m %Y"];

/// Localized month names, Turkish first, then English.
const MONTHS: &[(&str, u32)] = &[
    ("ocak", 1),
    ("şubat", 2),
    ("subat", 2),
    ("mart", 3),
    ("nisan", 4),
    ("mayıs", 5),
    ("mayis", 5),
    ("haziran", 6),
    ("temmuz", 7),
    ("ağustos", 8),
    ("agustos", 8),
    ("eylül", 9),
    ("eylul", 9),
    ("ekim", 10),
    ("kasım", 11),
    ("kasim", 11),
    ("aralık", 12),
    ("aralik", 12),
    ("january", 1),
    ("jan", 1),
    ("february", 2),
    ("feb", 2),
    ("march", 3),
    ("mar", 3),
    ("april", 4),
    ("apr", 4),
    ("may", 5),
    ("june", 6),
    ("jun", 6),
    ("july", 7),
    ("jul", 7),
    ("august", 8),
    ("aug", 8),
    ("september", 9),
    ("sept", 9),
    ("sep", 9),
    ("october", 10),
    ("oct", 10),
    ("november", 11),
    ("nov", 11),
    ("december", 12),
    ("dec", 12),
];

/// Decode HTML entities, collapse whitespace runs and trim.
///
/// Horizontal whitespace collapses to one space and any run containing a
/// newline collapses to a single `\n`. Entity decoding repeats until nothing
/// changes, which keeps the function idempotent for double-escaped input.
pub fn normalize_text(s: &str) -> String {
    if s.is_empty() {
        return String::new();
    }
    let decoded = decode_entities(s);
    let out = RE_NEWLINE_RUN.replace_all(&decoded, "\n");
    let out = RE_SPACE_RUN.replace_all(&out, " ");
    out.trim().to_string()
}

fn decode_entities(s: &str) -> String {
    let mut current = s.to_string();
    loop {
        let next = html_escape::decode_html_entities(&current).into_owned();
        if next == current {
            return current;
        }
        current = next;
    }
}

/// Strip editorial labels such as `LIVE:` and normalize to a single line.
pub fn normalize_title(s: &str) -> String {
    let mut current = s.to_string();
    loop {
        let mut stripped = current.clone();
        for label in TITLE_LABELS {
            stripped = stripped.replace(label, " ");
        }
        let next = normalize_text(&stripped).replace('\n', " ");
        if next == current {
            return next;
        }
        current = next;
    }
}

/// Lower-case for matching, folding the Turkish dotted capital I to plain `i`.
pub fn fold_case(s: &str) -> String {
    s.to_lowercase().replace('\u{0307}', "")
}

/// Parse a scraped timestamp.
///
/// Layouts are tried in a fixed order and the first success wins. Naive
/// values are read in `offset`. Relative phrases and bare clock times resolve
/// against `now`. When nothing matches, the cleaned text comes back as
/// [`Published::Unparsed`].
pub fn parse_date(raw: &str, offset: FixedOffset, now: DateTime<Utc>) -> Published {
    let cleaned = normalize_text(raw).replace('\n', " ");
    if cleaned.is_empty() {
        return Published::Unparsed(cleaned);
    }
    parse_absolute(&cleaned, offset)
        .or_else(|| parse_relative(&cleaned, offset, now))
        .map(Published::At)
        .unwrap_or(Published::Unparsed(cleaned))
}

fn parse_absolute(s: &str, offset: FixedOffset) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(s) {
        return Some(dt.with_timezone(&Utc));
    }
    parse_naive(s, offset).or_else(|| {
        let substituted = substitute_months(s)?;
        parse_naive(&substituted, offset)
    })
}

fn parse_naive(s: &str, offset: FixedOffset) -> Option<DateTime<Utc>> {
    let naive = NAIVE_DATETIME_LAYOUTS
        .iter()
        .find_map(|layout| NaiveDateTime::parse_from_str(s, layout).ok())
        .or_else(|| {
            NAIVE_DATE_LAYOUTS
                .iter()
                .find_map(|layout| NaiveDate::parse_from_str(s, layout).ok())
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })?;
    offset
        .from_local_datetime(&naive)
        .single()
        .map(|dt| dt.with_timezone(&Utc))
}

/// Rewrite `18 Ekim 2025, Cumartesi 14:30` as `18 10 2025 14:30`.
///
/// Returns `None` when no month name is present. Other alphabetic tokens
/// (weekday names, "saat", "at") are dropped. A leading month name, as in
/// `Oct 18, 2025`, is moved after the day.
fn substitute_months(s: &str) -> Option<String> {
    let mut tokens: Vec<String> = Vec::new();
    let mut month_at = None;
    for raw in s.split_whitespace() {
        let token = raw.trim_matches(|c: char| c == ',' || c == '.');
        let folded = fold_case(token);
        if let Some((_, month)) = MONTHS.iter().find(|(name, _)| *name == folded) {
            month_at = Some(tokens.len());
            tokens.push(month.to_string());
        } else if token.chars().any(|c| c.is_ascii_digit()) {
            tokens.push(token.to_string());
        }
    }
    let month_at = month_at?;
    if month_at == 0 && tokens.len() > 1 {
        tokens.swap(0, 1);
    }
    Some(tokens.join(" "))
}

fn parse_relative(s: &str, offset: FixedOffset, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
    let folded = fold_case(s);
    if matches!(folded.as_str(), "az önce" | "şimdi" | "just now" | "now") {
        return Some(now);
    }
    if let Some(caps) = RE_RELATIVE.captures(&folded) {
        let amount: i64 = caps[1].parse().ok()?;
        let unit = &caps[2];
        let delta = match unit {
            "dakika" | "dk" | "min" | "mins" | "minute" | "minutes" => {
                Duration::try_minutes(amount)
            }
            "saat" | "sa" | "hour" | "hours" | "hr" | "hrs" => Duration::try_hours(amount),
            "gün" | "gun" | "day" | "days" => Duration::try_days(amount),
            _ => None,
        }?;
        return now.checked_sub_signed(delta);
    }
    let caps = RE_CLOCK.captures(&folded)?;
    let hour: u32 = caps[1].parse().ok()?;
    let minute: u32 = caps[2].parse().ok()?;
    let today = now.with_timezone(&offset).date_naive();
    let local = today.and_hms_opt(hour, minute, 0)?;
    let mut ts = offset.from_local_datetime(&local).single()?.with_timezone(&Utc);
    // A clock time later than now belongs to yesterday's listing.
    if ts > now + Duration::minutes(5) {
        ts -= Duration::days(1);
    }
    Some(ts)
}
