use std::sync::LazyLock;

use regex::Regex;

static PARENTHESIZED: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\(.*?\)").expect("parenthesized pattern is valid")
});
static DISALLOWED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^a-z0-9 ]").expect("character class pattern is valid"));
static WHITESPACE_RUN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("whitespace pattern is valid"));

/// Canonicalizes a raw title into the key used for local equality matching.
///
/// Lowercases, drops parenthesized annotations such as a trailing `(1994)`,
/// strips everything outside `[a-z0-9 ]` and collapses spaces. The result is
/// trimmed so that `normalize(normalize(x)) == normalize(x)`.
pub fn normalize_title(raw: &str) -> String {
    let lowered = raw.to_lowercase();
    let without_annotations = PARENTHESIZED.replace_all(lowered.trim(), "");
    let stripped = DISALLOWED.replace_all(&without_annotations, "");
    let collapsed = WHITESPACE_RUN.replace_all(&stripped, " ");
    collapsed.trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_year_annotation() {
        assert_eq!(
            normalize_title("Pulp Fiction (1994)"),
            normalize_title("pulp fiction")
        );
        assert_eq!(normalize_title("Pulp Fiction (1994)"), "pulp fiction");
    }

    #[test]
    fn removes_punctuation_and_collapses_spaces() {
        assert_eq!(normalize_title("  Se7en:   The  Cut! "), "se7en the cut");
        assert_eq!(normalize_title("Schindler's List"), "schindlers list");
    }

    #[test]
    fn removes_every_parenthesized_group() {
        assert_eq!(
            normalize_title("Shall We Dance? (Shall We Dansu?) (1996)"),
            "shall we dance"
        );
    }

    #[test]
    fn unmatched_parenthesis_is_treated_as_punctuation() {
        assert_eq!(normalize_title("Alien (director"), "alien director");
    }

    #[test]
    fn is_idempotent() {
        let samples = [
            "Pulp Fiction (1994)",
            "  The\tGood, the Bad & the Ugly ",
            "Amélie (2001)",
            "(untitled)",
            "",
            "12 Monkeys",
            "Star Wars: Episode IV (A New Hope) ",
        ];
        for sample in samples {
            let once = normalize_title(sample);
            assert_eq!(normalize_title(&once), once, "input: {sample:?}");
        }
    }

    #[test]
    fn blank_input_normalizes_to_empty() {
        assert_eq!(normalize_title("   "), "");
        assert_eq!(normalize_title("(1994)"), "");
    }
}
