//! Weighted token-aware title similarity on a 0-100 scale.
//!
//! Combines an Indel similarity ratio with token-sorted, token-set and
//! partial (sliding window) comparisons, so reordered words and titles that
//! contain the query still score high.

use std::collections::BTreeSet;

use rapidfuzz::distance::indel;

const TOKEN_SCALE: f64 = 0.95;
const PARTIAL_SCALE: f64 = 0.9;
const LONG_PARTIAL_SCALE: f64 = 0.6;

/// Scores how closely `candidate` matches `query`, case-insensitively.
///
/// Returns 0 when either side is empty.
pub fn weighted_ratio(query: &str, candidate: &str) -> f64 {
    let query = query.to_lowercase();
    let candidate = candidate.to_lowercase();
    let query_len = query.chars().count();
    let candidate_len = candidate.chars().count();
    if query_len == 0 || candidate_len == 0 {
        return 0.0;
    }

    let (shorter, longer) = if query_len <= candidate_len {
        (query_len, candidate_len)
    } else {
        (candidate_len, query_len)
    };
    let len_ratio = longer as f64 / shorter as f64;

    let base = ratio(&query, &candidate);
    if len_ratio < 1.5 {
        let token = token_sort_ratio(&query, &candidate).max(token_set_ratio(&query, &candidate));
        return base.max(token * TOKEN_SCALE);
    }

    let partial_scale = if len_ratio < 8.0 {
        PARTIAL_SCALE
    } else {
        LONG_PARTIAL_SCALE
    };
    let partial = partial_ratio(&query, &candidate) * partial_scale;
    let partial_token = partial_token_ratio(&query, &candidate) * TOKEN_SCALE * partial_scale;

    base.max(partial).max(partial_token)
}

/// Indel similarity: insertions and deletions only, so a substitution
/// costs two. Equals `2 * lcs / (len_left + len_right)`.
fn ratio(left: &str, right: &str) -> f64 {
    indel::normalized_similarity(left.chars(), right.chars()) * 100.0
}

fn partial_ratio(left: &str, right: &str) -> f64 {
    let (short, long) = if left.chars().count() <= right.chars().count() {
        (left, right)
    } else {
        (right, left)
    };
    let short_len = short.chars().count();
    if short_len == 0 {
        return 0.0;
    }

    let long_chars: Vec<char> = long.chars().collect();
    long_chars
        .windows(short_len)
        .map(|window| ratio(short, &window.iter().collect::<String>()))
        .fold(0.0, f64::max)
}

fn sorted_tokens(value: &str) -> String {
    let mut tokens: Vec<&str> = value.split_whitespace().collect();
    tokens.sort_unstable();
    tokens.join(" ")
}

fn token_sort_ratio(left: &str, right: &str) -> f64 {
    ratio(&sorted_tokens(left), &sorted_tokens(right))
}

struct TokenSets<'a> {
    intersection: Vec<&'a str>,
    left_only: Vec<&'a str>,
    right_only: Vec<&'a str>,
}

impl<'a> TokenSets<'a> {
    fn new(left: &'a str, right: &'a str) -> Self {
        let left: BTreeSet<&str> = left.split_whitespace().collect();
        let right: BTreeSet<&str> = right.split_whitespace().collect();
        Self {
            intersection: left.intersection(&right).copied().collect(),
            left_only: left.difference(&right).copied().collect(),
            right_only: right.difference(&left).copied().collect(),
        }
    }

    fn one_side_contained(&self) -> bool {
        !self.intersection.is_empty() && (self.left_only.is_empty() || self.right_only.is_empty())
    }
}

fn join_non_empty(head: &str, tail: &[&str]) -> String {
    let tail = tail.join(" ");
    match (head.is_empty(), tail.is_empty()) {
        (true, _) => tail,
        (_, true) => head.to_string(),
        _ => format!("{head} {tail}"),
    }
}

fn token_set_ratio(left: &str, right: &str) -> f64 {
    let sets = TokenSets::new(left, right);
    if sets.one_side_contained() {
        return 100.0;
    }

    let shared = sets.intersection.join(" ");
    let left_combined = join_non_empty(&shared, &sets.left_only);
    let right_combined = join_non_empty(&shared, &sets.right_only);

    let mut best = ratio(&left_combined, &right_combined);
    if !shared.is_empty() {
        best = best
            .max(ratio(&shared, &left_combined))
            .max(ratio(&shared, &right_combined));
    }
    best
}

fn partial_token_ratio(left: &str, right: &str) -> f64 {
    let sets = TokenSets::new(left, right);
    if sets.one_side_contained() {
        return 100.0;
    }

    let sorted = partial_ratio(&sorted_tokens(left), &sorted_tokens(right));
    let differences = partial_ratio(&sets.left_only.join(" "), &sets.right_only.join(" "));
    sorted.max(differences)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_ratio_finds_embedded_substring() {
        assert_eq!(partial_ratio("story", "toy story"), 100.0);
    }

    #[test]
    fn token_set_ratio_is_full_when_one_side_contains_the_other() {
        assert_eq!(token_set_ratio("toy story", "story toy 2"), 100.0);
    }

    #[test]
    fn ratio_counts_substitution_as_two_edits() {
        assert!((ratio("godfater", "godfather") - 1600.0 / 17.0).abs() < 1e-9);
        assert!((ratio("heat", "heats") - 800.0 / 9.0).abs() < 1e-9);
        assert_eq!(ratio("abc", "abc"), 100.0);
    }

    #[test]
    fn join_non_empty_skips_blank_parts() {
        assert_eq!(join_non_empty("", &["a", "b"]), "a b");
        assert_eq!(join_non_empty("x", &[]), "x");
        assert_eq!(join_non_empty("x", &["y"]), "x y");
    }
}
