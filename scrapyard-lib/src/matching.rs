//! Title matching and scoring.
//!
//! [`best_match`] picks the candidate whose title is closest to a file's
//! canonical title and scores the match 0-100. Candidates with a different
//! sequel number never match. A handful of cheap equivalences (article
//! placement, "... Edition" suffixes, shared significant words) count as
//! perfect matches before falling back to Damerau-Levenshtein distance.

use serde::{Deserialize, Serialize};

use crate::names;

/// Minimum score for a match to be accepted.
pub const DEFAULT_MIN_MATCH: u8 = 65;
/// Score given to a low match that is a suffix variant of the file title.
pub const ACCEPTANCE_SCORE: u8 = 90;
/// Lowest score the suffix-variant bump applies to.
pub const ACCEPTANCE_FLOOR: u8 = 40;
/// Extra distance charged when a subtitle had to be dropped to match.
pub const SUBTITLE_PENALTY: usize = 1;
/// Length difference above which the subtitle-dropped comparison is tried.
pub const SUBTITLE_LENGTH_THRESHOLD: usize = 3;

/// Minimum significant words for the word-subset equivalence.
const MIN_SIGNIFICANT_WORDS: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchParams {
    pub min_match: u8,
    pub acceptance_score: u8,
    pub acceptance_floor: u8,
    pub subtitle_penalty: usize,
    pub subtitle_length_threshold: usize,
}

impl Default for MatchParams {
    fn default() -> Self {
        Self {
            min_match: DEFAULT_MIN_MATCH,
            acceptance_score: ACCEPTANCE_SCORE,
            acceptance_floor: ACCEPTANCE_FLOOR,
            subtitle_penalty: SUBTITLE_PENALTY,
            subtitle_length_threshold: SUBTITLE_LENGTH_THRESHOLD,
        }
    }
}

/// The winning candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TitleMatch {
    /// Index into the candidate list
    pub index: usize,
    pub distance: usize,
    /// 0-100
    pub score: u8,
}

impl TitleMatch {
    pub fn is_accepted(&self, params: &MatchParams) -> bool {
        self.score >= params.min_match
    }
}

/// A title reduced to the forms the comparisons need.
struct Prepared {
    stripped: String,
    sanitized: String,
    numeral: u32,
}

impl Prepared {
    fn new(title: &str) -> Self {
        let stripped = names::move_article_front(&names::strip_annotations(title));
        let sanitized = names::sanitize(&stripped);
        let numeral = names::numeral(&stripped);
        Self {
            stripped,
            sanitized,
            numeral,
        }
    }

    fn len(&self) -> usize {
        self.sanitized.chars().count()
    }
}

/// Pick the closest candidate to `compare_title`.
///
/// Returns `None` when there are no candidates or every candidate has a
/// different sequel number. Ties go to the earliest candidate.
pub fn best_match<S: AsRef<str>>(
    compare_title: &str,
    candidates: &[S],
    params: &MatchParams,
) -> Option<TitleMatch> {
    let target = Prepared::new(compare_title);
    let mut best: Option<(usize, usize, Prepared)> = None;

    for (index, candidate) in candidates.iter().enumerate() {
        let cand = Prepared::new(candidate.as_ref());
        if cand.numeral != target.numeral {
            continue;
        }
        let distance = title_distance(&target, &cand, params);
        if best.as_ref().is_none_or(|(_, d, _)| distance < *d) {
            best = Some((index, distance, cand));
        }
        if distance == 0 {
            break;
        }
    }

    let (index, distance, cand) = best?;
    let mut score = score_for(distance, target.len().max(cand.len()));
    if score < params.min_match
        && score >= params.acceptance_floor
        && is_suffix_variant(&target.sanitized, &cand.sanitized)
    {
        score = params.acceptance_score;
    }

    Some(TitleMatch {
        index,
        distance,
        score,
    })
}

/// Score a single pair of titles.
pub fn score_titles(a: &str, b: &str, params: &MatchParams) -> Option<u8> {
    best_match(a, &[b], params).map(|m| m.score)
}

fn score_for(distance: usize, max_len: usize) -> u8 {
    if max_len == 0 {
        return if distance == 0 { 100 } else { 0 };
    }
    if distance >= max_len {
        return 0;
    }
    ((100 * (max_len - distance)) / max_len) as u8
}

fn title_distance(a: &Prepared, b: &Prepared, params: &MatchParams) -> usize {
    if is_equivalent(&a.sanitized, &b.sanitized) {
        return 0;
    }
    let distance = strsim::damerau_levenshtein(&a.sanitized, &b.sanitized);
    match subtitle_distance(a, b, params) {
        Some(sub) => distance.min(sub),
        None => distance,
    }
}

/// Title pairs that count as a perfect match.
fn is_equivalent(a: &str, b: &str) -> bool {
    if a == b {
        return true;
    }
    let (a, b) = (names::canonical_article(a), names::canonical_article(b));
    if a == b {
        return true;
    }
    if names::strip_edition(a) == names::strip_edition(b) {
        return true;
    }

    let a_words = names::significant_words(a);
    let b_words = names::significant_words(b);
    (a_words.len() >= MIN_SIGNIFICANT_WORDS && a_words.iter().all(|w| b_words.contains(w)))
        || (b_words.len() >= MIN_SIGNIFICANT_WORDS && b_words.iter().all(|w| a_words.contains(w)))
}

/// Distance with the subtitle dropped from the longer title, when exactly
/// one title has a subtitle and it is clearly longer.
fn subtitle_distance(a: &Prepared, b: &Prepared, params: &MatchParams) -> Option<usize> {
    let (with_sub, main, other) = match (
        names::split_subtitle(&a.stripped),
        names::split_subtitle(&b.stripped),
    ) {
        (Some((main, _)), None) => (a, main, b),
        (None, Some((main, _))) => (b, main, a),
        _ => return None,
    };
    if with_sub.len() <= other.len() + params.subtitle_length_threshold {
        return None;
    }
    let main = names::sanitize(main);
    Some(strsim::damerau_levenshtein(&main, &other.sanitized) + params.subtitle_penalty)
}

/// True when the longer title, minus its first word, is or ends with the
/// shorter one ("disneys aladdin" / "aladdin").
fn is_suffix_variant(a: &str, b: &str) -> bool {
    let (longer, shorter) = if a.chars().count() >= b.chars().count() {
        (a, b)
    } else {
        (b, a)
    };
    if shorter.is_empty() {
        return false;
    }
    match longer.split_once(' ') {
        Some((_, rest)) => rest == shorter || rest.ends_with(&format!(" {shorter}")),
        None => false,
    }
}

#[cfg(test)]
#[path = "tests/matching_tests.rs"]
mod tests;
