//! Relevance ranking for law.go.kr search results.
//!
//! The search API returns results in its own order, often alphabetical, so a
//! query for "민법" lists "난민법" first. [`rank`] reorders records so that,
//! in priority order:
//!
//! 1. exact matches ("민법")
//! 2. names starting with the query ("민법 시행령")
//! 3. names containing the query at a word start ("행정기본법 민법")
//! 4. names containing the query anywhere ("난민법")
//!
//! come first, shorter names first within a tier. Ties keep upstream order.

use serde_json::{Map, Value};

/// One search result: field name to value, as returned upstream.
pub type Record = Map<String, Value>;

/// Script of a query, used to pick which name field to rank on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Language {
    Korean,
    Other,
}

impl Language {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Korean => "korean",
            Self::Other => "other",
        }
    }
}

/// Korean if any character is a Hangul syllable or jamo.
pub fn detect_language(query: &str) -> Language {
    let is_hangul = |c: char| {
        matches!(c as u32,
            0xAC00..=0xD7A3   // syllables
            | 0x1100..=0x11FF // jamo
            | 0x3130..=0x318F // compatibility jamo
        )
    };
    if query.chars().any(is_hangul) {
        Language::Korean
    } else {
        Language::Other
    }
}

/// Whether a query is specific enough to rank on.
///
/// Empty queries, the `*` wildcard and single characters are treated as
/// deliberately broad and keep upstream order.
pub fn should_rank(query: &str) -> bool {
    let q = query.trim();
    !q.is_empty() && q != "*" && q.chars().count() >= 2
}

/// Sort key: each flag is 0 when the condition holds, so ascending order puts
/// the best matches first.
type Score = (u32, u32, u32, u32, usize);

/// Records whose field is missing or empty.
const NO_NAME: Score = (u32::MAX, u32::MAX, u32::MAX, u32::MAX, 0);

fn score(name: Option<&str>, query_lower: &str) -> Score {
    let name = match name.map(str::trim) {
        Some(n) if !n.is_empty() => n,
        _ => return NO_NAME,
    };
    let name_lower = name.to_lowercase();

    let exact = u32::from(name_lower != query_lower);
    let starts_with = u32::from(!name_lower.starts_with(query_lower));
    let position = name_lower.find(query_lower);
    let at_word_start = position.is_some_and(|idx| idx == 0 || name_lower[..idx].ends_with(' '));
    let word = u32::from(!at_word_start);
    let contains = u32::from(position.is_none());

    (exact, starts_with, word, contains, name.chars().count())
}

/// Reorder `records` by relevance of `field` to `query`.
///
/// Matching is case-insensitive. The sort is stable, so records with equal
/// scores keep their upstream order. A record without `field`, or with a
/// non-string value there, scores as no match and sorts last.
pub fn rank(mut records: Vec<Record>, query: &str, field: &str) -> Vec<Record> {
    let query_lower = query.trim().to_lowercase();
    if records.is_empty() || query_lower.is_empty() {
        return records;
    }
    records.sort_by_cached_key(|r| score(r.get(field).and_then(Value::as_str), &query_lower));
    records
}

/// [`rank`] when [`should_rank`] allows it, upstream order otherwise.
pub fn rank_if_applicable(records: Vec<Record>, query: &str, field: &str) -> Vec<Record> {
    if should_rank(query) {
        rank(records, query, field)
    } else {
        records
    }
}

/// Pick the name field to rank bilingual results on.
///
/// Korean queries rank on `korean_field`, others on `other_field`. If the
/// first record lacks the chosen field but has the other one, the other is
/// used instead.
pub fn choose_name_field<'a>(
    records: &[Record],
    query: &str,
    korean_field: &'a str,
    other_field: &'a str,
) -> &'a str {
    let (preferred, fallback) = match detect_language(query) {
        Language::Korean => (korean_field, other_field),
        Language::Other => (other_field, korean_field),
    };
    match records.first() {
        Some(first) if !first.contains_key(preferred) && first.contains_key(fallback) => fallback,
        _ => preferred,
    }
}
