//! Title normalisation and search-name generation.
//!
//! File names carry annotations, underscores and trailing articles that no
//! source indexes on. These helpers turn a file's base name into the
//! queries an adapter sends and the canonical title it matches against.

use std::collections::HashMap;
use std::sync::Arc;

/// Upper bound on queries per file.
pub const MAX_SEARCH_NAMES: usize = 4;

/// Subtitle separators, in priority order.
const SUBTITLE_SEPARATORS: &[&str] = &[": ", " - "];

/// Trailing articles moved to the front ("Zelda, The" -> "The Zelda").
const ARTICLES: &[&str] = &["The", "A", "An"];

/// Per-adapter settings for name generation.
#[derive(Debug, Clone)]
pub struct NamingOptions {
    /// Base name -> title overrides
    pub aliases: Arc<HashMap<String, String>>,
    /// Also search with the subtitle removed
    pub drop_subtitles: bool,
    pub max_names: usize,
}

impl Default for NamingOptions {
    fn default() -> Self {
        Self {
            aliases: Arc::new(HashMap::new()),
            drop_subtitles: true,
            max_names: MAX_SEARCH_NAMES,
        }
    }
}

fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Remove `(...)` and `[...]` annotations, including nested ones.
pub fn strip_annotations(title: &str) -> String {
    let mut out = String::with_capacity(title.len());
    let mut depth = 0usize;
    for c in title.chars() {
        match c {
            '(' | '[' => depth += 1,
            ')' | ']' => depth = depth.saturating_sub(1),
            _ if depth == 0 => out.push(c),
            _ => {}
        }
    }
    collapse_whitespace(&out)
        .trim_end_matches([' ', '-', ',', ':'])
        .to_string()
}

/// Roman numeral value, for I/V/X/L numerals in canonical form only.
pub fn from_roman(s: &str) -> Option<u32> {
    if s.is_empty() || s.len() > 8 {
        return None;
    }
    let upper = s.to_ascii_uppercase();
    let mut total: i64 = 0;
    let mut prev = 0;
    for c in upper.chars().rev() {
        let v = match c {
            'I' => 1,
            'V' => 5,
            'X' => 10,
            'L' => 50,
            _ => return None,
        };
        if v < prev {
            total -= v;
        } else {
            total += v;
            prev = v;
        }
    }
    let n = u32::try_from(total).ok()?;
    (n > 0 && to_roman(n) == upper).then_some(n)
}

pub fn to_roman(mut n: u32) -> String {
    const TABLE: &[(u32, &str)] = &[
        (50, "L"),
        (40, "XL"),
        (10, "X"),
        (9, "IX"),
        (5, "V"),
        (4, "IV"),
        (1, "I"),
    ];
    let mut out = String::new();
    for &(value, symbol) in TABLE {
        while n >= value {
            out.push_str(symbol);
            n -= value;
        }
    }
    out
}

/// Lowercase, `&` -> "and", apostrophes dropped, other punctuation to
/// spaces, whitespace collapsed. Roman numerals II..XXXIX after the first
/// word become arabic so "Game II" and "Game 2" compare equal.
pub fn sanitize(title: &str) -> String {
    let lower = title.to_lowercase().replace('&', " and ");
    let mut cleaned = String::with_capacity(lower.len());
    for c in lower.chars() {
        if c == '\'' || c == '\u{2019}' {
            continue;
        }
        cleaned.push(if c.is_alphanumeric() { c } else { ' ' });
    }

    cleaned
        .split_whitespace()
        .enumerate()
        .map(|(i, word)| match from_roman(word) {
            Some(n) if i > 0 && (2..=39).contains(&n) => n.to_string(),
            _ => word.to_string(),
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Sequel number of a title: the first arabic (or converted roman) number
/// in 2..=50, or 1 when there is none.
pub fn numeral(title: &str) -> u32 {
    sanitize(title)
        .split(' ')
        .filter_map(|w| w.parse::<u32>().ok())
        .find(|n| (2..=50).contains(n))
        .unwrap_or(1)
}

/// Swap the first sequel number after the first word between arabic and
/// roman form ("Game 2" <-> "Game II"). `None` when there is nothing to swap.
pub fn swap_numeral(title: &str) -> Option<String> {
    let words: Vec<&str> = title.split_whitespace().collect();
    for (i, word) in words.iter().enumerate().skip(1) {
        let core = word.trim_end_matches([':', ',', '.']);
        let tail = &word[core.len()..];
        let swapped = match core.parse::<u32>() {
            Ok(n) if (2..=39).contains(&n) => Some(to_roman(n)),
            Ok(_) => None,
            Err(_) => from_roman(core)
                .filter(|n| (2..=39).contains(n))
                .map(|n| n.to_string()),
        };
        if let Some(swapped) = swapped {
            let mut out: Vec<String> = words.iter().map(|w| w.to_string()).collect();
            out[i] = format!("{swapped}{tail}");
            return Some(out.join(" "));
        }
    }
    None
}

fn subtitle_parts(title: &str) -> Option<(&str, &str, &str)> {
    let (pos, sep) = SUBTITLE_SEPARATORS
        .iter()
        .filter_map(|sep| title.find(sep).map(|pos| (pos, *sep)))
        .min_by_key(|(pos, _)| *pos)?;
    let main = title[..pos].trim();
    let sub = title[pos + sep.len()..].trim();
    if main.is_empty() || sub.is_empty() {
        return None;
    }
    Some((main, sep, sub))
}

/// Split "Main: Subtitle" or "Main - Subtitle" at the first separator.
pub fn split_subtitle(title: &str) -> Option<(&str, &str)> {
    subtitle_parts(title).map(|(main, _, sub)| (main, sub))
}

/// Move a trailing ", The" (or ", A", ", An") of the main title to the front.
pub fn move_article_front(title: &str) -> String {
    let (main, rest) = match subtitle_parts(title) {
        Some((main, sep, sub)) => (main, Some((sep, sub))),
        None => (title.trim(), None),
    };

    let mut fixed = main.to_string();
    for article in ARTICLES {
        let suffix = format!(", {article}");
        let Some(cut) = main.len().checked_sub(suffix.len()) else {
            continue;
        };
        if cut > 0 && main.is_char_boundary(cut) && main[cut..].eq_ignore_ascii_case(&suffix) {
            let original = &main[cut + 2..];
            fixed = format!("{} {}", original, &main[..cut]);
            break;
        }
    }

    match rest {
        Some((sep, sub)) => format!("{fixed}{sep}{sub}"),
        None => fixed,
    }
}

/// Human-readable title from a file base name.
pub fn clean_title(base_name: &str) -> String {
    let spaced = base_name.replace('_', " ");
    move_article_front(&strip_annotations(&spaced))
}

/// Drop a leading or trailing "the" from a sanitised title.
pub fn canonical_article(sanitized: &str) -> &str {
    let s = sanitized.strip_prefix("the ").unwrap_or(sanitized);
    s.strip_suffix(" the").unwrap_or(s)
}

/// Drop a trailing "<word> edition" from a sanitised title.
pub fn strip_edition(sanitized: &str) -> &str {
    let words: Vec<&str> = sanitized.split(' ').collect();
    if words.len() >= 3 && words.last() == Some(&"edition") {
        let keep = words[..words.len() - 2].join(" ").len();
        &sanitized[..keep]
    } else {
        sanitized
    }
}

/// Words longer than three characters.
pub fn significant_words(sanitized: &str) -> Vec<&str> {
    sanitized
        .split(' ')
        .filter(|w| w.chars().count() > 3)
        .collect()
}

/// Queries for one file, highest priority first: alias, cleaned title,
/// numeral-swapped title, then the subtitle-dropped variants.
pub fn search_names(base_name: &str, opts: &NamingOptions) -> Vec<String> {
    let mut names: Vec<String> = Vec::new();
    let mut push = |name: String| {
        let name = name.trim().to_string();
        if !name.is_empty() && !names.iter().any(|n| n.eq_ignore_ascii_case(&name)) {
            names.push(name);
        }
    };

    if let Some(alias) = opts.aliases.get(base_name) {
        push(alias.clone());
    }

    let clean = clean_title(base_name);
    push(clean.clone());
    if let Some(swapped) = swap_numeral(&clean) {
        push(swapped);
    }

    if opts.drop_subtitles {
        if let Some((main, _)) = split_subtitle(&clean) {
            push(main.to_string());
            if let Some(swapped) = swap_numeral(main) {
                push(swapped);
            }
        }
    }

    names.truncate(opts.max_names.max(1));
    names
}

/// Canonical title a file is matched against: its alias, or its cleaned
/// base name.
pub fn compare_title(base_name: &str, opts: &NamingOptions) -> String {
    match opts.aliases.get(base_name) {
        Some(alias) => alias.trim().to_string(),
        None => clean_title(base_name),
    }
}

#[cfg(test)]
#[path = "tests/names_tests.rs"]
mod tests;
