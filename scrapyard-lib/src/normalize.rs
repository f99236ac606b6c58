//! Normalisation of derived fields before a record is stored.
//!
//! Sources disagree on date formats, player counts and rating scales. Each
//! normaliser returns `None` when it cannot make sense of the input, in
//! which case the stored value is left as the source reported it.

use std::sync::LazyLock;

use chrono::NaiveDate;
use regex::Regex;
use scrapyard_core::{FieldKind, FieldValue, ResolvedRecord};

use crate::names;

const DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d",
    "%Y/%m/%d",
    "%Y.%m.%d",
    "%Y%m%d",
    "%d/%m/%Y",
    "%d.%m.%Y",
    "%B %d, %Y",
    "%b %d, %Y",
    "%d %B %Y",
    "%d %b %Y",
];

// Literal patterns; compilation cannot fail.
static YEAR_MONTH: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d{4})[-/.](\d{1,2})$").unwrap());
static YEAR: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^(\d{4})$").unwrap());
static NUMBER: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\d+(?:\.\d+)?").unwrap());

/// Title with a trailing article moved to the front and spacing collapsed.
pub fn canonical_title(title: &str) -> String {
    let collapsed = title.split_whitespace().collect::<Vec<_>>().join(" ");
    names::move_article_front(&collapsed)
}

/// ISO 8601 date (`YYYY-MM-DD`). Partial dates keep their precision
/// (`YYYY-MM`, `YYYY`).
pub fn normalize_date(date: &str) -> Option<String> {
    let date = date.trim();
    // Timestamps: also try the part before the time
    let date_part = date.split(['T', ' ']).next().unwrap_or(date);

    for candidate in [date, date_part] {
        for format in DATE_FORMATS {
            if let Ok(parsed) = NaiveDate::parse_from_str(candidate, format) {
                return Some(parsed.format("%Y-%m-%d").to_string());
            }
        }
    }
    if let Some(caps) = YEAR_MONTH.captures(date) {
        let month: u32 = caps[2].parse().ok()?;
        if (1..=12).contains(&month) {
            return Some(format!("{}-{:02}", &caps[1], month));
        }
    }
    if YEAR.is_match(date) {
        return Some(date.to_string());
    }
    None
}

/// Maximum player count ("1-4" -> "4", "Single player" -> "1").
pub fn normalize_players(players: &str) -> Option<String> {
    let max = NUMBER
        .find_iter(players)
        .filter_map(|m| m.as_str().parse::<f64>().ok())
        .map(|n| n as u32)
        .max();
    match max {
        Some(n) if n > 0 => Some(n.to_string()),
        _ if players.to_lowercase().contains("single") => Some("1".to_string()),
        _ => None,
    }
}

/// ESRB letter codes or PEGI ages.
pub fn normalize_age_rating(rating: &str) -> Option<String> {
    let lower = rating.trim().to_lowercase();
    let body = lower
        .trim_start_matches("esrb")
        .trim_start_matches("pegi")
        .trim_start_matches([':', ' ', '-'])
        .trim();

    let esrb = match body {
        "ec" | "early childhood" => Some("EC"),
        "e" | "everyone" | "ka" | "kids to adults" => Some("E"),
        "e10+" | "e10" | "everyone 10+" => Some("E10+"),
        "t" | "teen" => Some("T"),
        "m" | "mature" | "mature 17+" => Some("M"),
        "ao" | "adults only" | "adults only 18+" => Some("AO"),
        "rp" | "rating pending" => Some("RP"),
        _ => None,
    };
    if let Some(code) = esrb {
        return Some(code.to_string());
    }

    let age = body.trim_end_matches('+').trim().parse::<u32>().ok()?;
    matches!(age, 3 | 4 | 6 | 7 | 12 | 15 | 16 | 18).then(|| age.to_string())
}

/// Rating on a 0-1 scale with two decimals. Accepts "a/b", percentages and
/// bare numbers on 1, 5, 10, 20 or 100 point scales.
pub fn normalize_rating(rating: &str) -> Option<String> {
    let rating = rating.trim();
    let value = if let Some((a, b)) = rating.split_once('/') {
        let a: f64 = a.trim().parse().ok()?;
        let b: f64 = b.trim().parse().ok()?;
        if b <= 0.0 {
            return None;
        }
        a / b
    } else if let Some(pct) = rating.strip_suffix('%') {
        pct.trim().parse::<f64>().ok()? / 100.0
    } else {
        let n: f64 = rating.parse().ok()?;
        let scale = [1.0, 5.0, 10.0, 20.0, 100.0]
            .into_iter()
            .find(|s| n <= *s)?;
        n / scale
    };
    if !value.is_finite() || value < 0.0 {
        return None;
    }
    Some(format!("{:.2}", value.min(1.0)))
}

/// Fields rewritten by [`finalize`].
const NORMALIZED_FIELDS: &[FieldKind] = &[
    FieldKind::Title,
    FieldKind::ReleaseDate,
    FieldKind::Players,
    FieldKind::AgeRating,
    FieldKind::Rating,
];

fn normalize_field(kind: FieldKind, value: &str) -> Option<String> {
    match kind {
        FieldKind::Title => Some(canonical_title(value)),
        FieldKind::ReleaseDate => normalize_date(value),
        FieldKind::Players => normalize_players(value),
        FieldKind::AgeRating => normalize_age_rating(value),
        FieldKind::Rating => normalize_rating(value),
        _ => None,
    }
}

/// Normalise every derived field of `record` in place.
pub fn finalize(record: &mut ResolvedRecord) {
    for kind in NORMALIZED_FIELDS {
        let Some(current) = record.text(*kind) else {
            continue;
        };
        let Some(normalized) = normalize_field(*kind, current) else {
            continue;
        };
        if normalized != current {
            log::trace!("Normalized {}: '{}' -> '{}'", kind, current, normalized);
            record.replace_value(*kind, FieldValue::Text(normalized));
        }
    }
}

#[cfg(test)]
#[path = "tests/normalize_tests.rs"]
mod tests;
