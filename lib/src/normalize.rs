//! Canonical forms of artist, album and track names used for cross-catalog comparison.

use regex::Regex;
use std::sync::LazyLock;

/// Anything that is not a plain letter, digit, apostrophe or space.
static INVALID_TITLE_CHARS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^a-zA-Z0-9' ]+").expect("invalid title pattern"));

static WHITESPACE_RUNS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("invalid whitespace pattern"));

/// Strip symbols, collapse spacing and lower-case.
///
/// Some catalogs use parentheses where others use square brackets; both forms
/// compare equal after this.
pub fn normalize(text: &str) -> String {
    let distilled = INVALID_TITLE_CHARS.replace_all(text, " ");
    let distilled = WHITESPACE_RUNS.replace_all(&distilled, " ");
    distilled.to_lowercase().trim().to_string()
}

/// Key under which a title is looked up within one album.
///
/// Titles with nothing left after [`normalize`] (non-Latin scripts, pure
/// punctuation) fall back to their trimmed lower-case form so they never
/// collide with each other.
pub fn match_key(text: &str) -> String {
    let normalized = normalize(text);
    if normalized.is_empty() {
        text.trim().to_lowercase()
    } else {
        normalized
    }
}

/// Remove one trailing "(...)" clause and then one trailing "[...]" clause,
/// e.g. "Album (Remastered)" becomes "Album".
pub fn simplify(text: &str) -> String {
    let distilled = remove_suffix_clause(text, '(', ')');
    remove_suffix_clause(&distilled, '[', ']')
}

fn remove_suffix_clause(text: &str, left: char, right: char) -> String {
    let trimmed = text.trim();
    if !trimmed.ends_with(right) {
        return trimmed.to_string();
    }

    let Some(index) = trimmed.rfind(left) else {
        return trimmed.to_string();
    };

    let head = trimmed[..index].trim_end();
    if head.is_empty() {
        // The clause is the whole title.
        return trimmed.to_string();
    }

    log::trace!("Stripping suffix clause: [{trimmed}] -> [{head}]");
    head.to_string()
}

/// Compare two titles.
///
/// The strict tier tries a plain case-insensitive comparison and then the
/// [`normalize`]d forms. The liberal tier compares only the [`simplify`]d forms,
/// which lets "Album" match "Album (Remastered)". The tiers are independent; the
/// resolver tries strict first and only falls back to liberal when nothing matched.
/// An empty normalized form never matches anything but the identical title.
pub fn titles_equal(a: &str, b: &str, liberal: bool) -> bool {
    let a = a.trim().to_lowercase();
    let b = b.trim().to_lowercase();

    if liberal {
        return simplify(&a) == simplify(&b);
    }

    if a == b {
        return true;
    }

    let (a, b) = (normalize(&a), normalize(&b));
    !a.is_empty() && a == b
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test_log::test]
    fn should_strip_symbols_and_collapse_spacing() {
        assert_eq!(normalize("  Hello,   World!  "), "hello world");
        assert_eq!(normalize("Don't Stop Me Now"), "don't stop me now");
        assert_eq!(normalize("Track (Live) [Mono]"), "track live mono");
        assert_eq!(normalize("Track\t-\tTwo"), "track two");
    }

    #[test_log::test]
    fn normalize_is_idempotent() {
        let inputs = [
            "Song - 2023 Remaster",
            "(What's The Story) Morning Glory?",
            "  Ça   Plane Pour Moi ",
            "AC/DC",
            "",
            "'''",
        ];

        for input in inputs {
            let once = normalize(input);
            assert_eq!(normalize(&once), once, "not idempotent for {input:?}");
        }
    }

    #[test_log::test]
    fn should_treat_brackets_and_parentheses_alike_after_normalizing() {
        assert_eq!(normalize("Song (Live)"), normalize("Song [Live]"));
    }

    #[test_log::test]
    fn should_remove_trailing_clause() {
        assert_eq!(simplify("Album (Remastered)"), "Album");
        assert_eq!(simplify("Album [Deluxe Edition]"), "Album");
        assert_eq!(simplify("Album   (2009 Remaster)  "), "Album");
        assert_eq!(simplify("Album [Deluxe] (Remastered)"), "Album");
    }

    #[test_log::test]
    fn should_leave_title_unchanged_without_clause() {
        assert_eq!(simplify("  Plain Album "), "Plain Album");
        assert_eq!(simplify("Album (Live) Extra"), "Album (Live) Extra");
        assert_eq!(simplify("Unbalanced)"), "Unbalanced)");
        assert_eq!(simplify("(Untitled)"), "(Untitled)");
    }

    #[test_log::test]
    fn strict_comparison_ignores_case_and_symbols() {
        assert!(titles_equal("Abbey Road", "abbey road", false));
        assert!(titles_equal("Help!", "help", false));
        assert!(titles_equal("Song (Live)", "Song [Live]", false));
        assert!(!titles_equal("Abbey Road", "Let It Be", false));
    }

    #[test_log::test]
    fn liberal_comparison_ignores_trailing_parenthetical() {
        assert!(titles_equal("Abbey Road", "Abbey Road (Remastered)", true));
        assert!(titles_equal("Abbey Road [2019 Mix]", "abbey road", true));

        // The strict tier does not reach through the qualifier.
        assert!(!titles_equal("Abbey Road", "Abbey Road (Remastered)", false));
    }

    #[test_log::test]
    fn titles_without_latin_characters_only_match_themselves() {
        assert!(titles_equal("宇多田", "宇多田", false));
        assert!(!titles_equal("宇多田", "椎名林檎", false));
        assert!(!titles_equal("!!!", "???", false));
        assert!(!titles_equal("ファントーム", "初恋", true));
    }

    #[test_log::test]
    fn match_key_falls_back_to_raw_title() {
        assert_eq!(match_key("Don't Stop Me Now!"), "don't stop me now");
        assert_eq!(match_key("  道 "), "道");
        assert_ne!(match_key("道"), match_key("あなた"));
    }

    #[test_log::test]
    fn tiers_are_independent() {
        // Punctuation only differs: strict matches, liberal does not.
        assert!(titles_equal("Help!", "Help", false));
        assert!(!titles_equal("Help!", "Help", true));
    }
}
