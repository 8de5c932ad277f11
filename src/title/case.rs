//! Title Case transform and predicate.
//!
//! A "word" is a run of ASCII letters, digits or Latin-1 letters followed by
//! any non-space, non-hyphen characters, so `vs.` and `U.S.` are single
//! words while `step-by-step` is three. Each word is then handled by the
//! first matching rule:
//!
//! 1. Small words (`a`, `of`, `the`, `vs.`, …) become lower case unless they
//!    open or close the text, follow a colon, or sit before a hyphen without
//!    also following one.
//! 2. Words carrying an upper-case letter or an inner period after their
//!    first character (`iPhone`, `U.S.`) are kept verbatim.
//! 3. Everything else gets its first character upper-cased. The rest of the
//!    word is left alone.

use once_cell::sync::Lazy;
use regex::Regex;

static WORD: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"[A-Za-z0-9\x{00C0}-\x{00FF}]+[^\s-]*").expect("word pattern is valid")
});

static SMALL_WORD: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^(a|an|and|as|at|but|by|en|for|if|in|nor|of|on|or|per|the|to|vs?\.?|via)$")
        .expect("small-word pattern is valid")
});

/// Title-case `title`.
pub fn title_case(title: &str) -> String {
    let mut out = String::with_capacity(title.len());
    let mut last = 0;

    for m in WORD.find_iter(title) {
        out.push_str(&title[last..m.start()]);
        out.push_str(&transform_word(title, m.start(), m.end()));
        last = m.end();
    }
    out.push_str(&title[last..]);
    out
}

/// `true` when the trimmed text is non-empty and already in Title Case.
pub fn is_title_case(text: &str) -> bool {
    let text = text.trim();
    !text.is_empty() && text == title_case(text)
}

fn transform_word(title: &str, start: usize, end: usize) -> String {
    let word = &title[start..end];
    let mut before = title[..start].chars().rev();
    let prev = before.next();
    let prev2 = before.next();
    let next = title[end..].chars().next();

    let interior = start > 0 && end != title.len();
    let after_colon = prev2 == Some(':');
    let hyphen_ok = next != Some('-') || prev == Some('-');
    let word_initial = prev.map_or(true, |c| c.is_whitespace() || c == '-');

    if interior && SMALL_WORD.is_match(word) && !after_colon && hyphen_ok && word_initial {
        return word.to_lowercase();
    }

    let mut chars = word.chars();
    let Some(first) = chars.next() else {
        return String::new();
    };
    let rest = chars.as_str();

    if has_inner_capital_or_period(rest) {
        return word.to_string();
    }

    let mut capitalised: String = first.to_uppercase().collect();
    capitalised.push_str(rest);
    capitalised
}

fn has_inner_capital_or_period(rest: &str) -> bool {
    let mut chars = rest.chars().peekable();
    while let Some(c) = chars.next() {
        if c.is_ascii_uppercase() {
            return true;
        }
        if c == '.' && chars.peek().is_some_and(|n| *n != '\n' && *n != '\r') {
            return true;
        }
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn capitalises_plain_words() {
        assert_eq!(title_case("some body text here now"), "Some Body Text Here Now");
    }

    #[test]
    fn lowercases_interior_small_words() {
        assert_eq!(title_case("the lord OF the rings"), "The Lord of the Rings");
        assert_eq!(title_case("war and peace"), "War and Peace");
    }

    #[test]
    fn keeps_small_words_at_edges() {
        assert_eq!(title_case("a study in"), "A Study In");
    }

    #[test]
    fn capitalises_small_word_after_colon() {
        assert_eq!(title_case("a tale: the end"), "A Tale: The End");
    }

    #[test]
    fn lowercases_small_words_between_hyphens() {
        assert_eq!(title_case("step-by-step guide"), "Step-by-Step Guide");
    }

    #[test]
    fn capitalises_small_word_before_hyphen() {
        assert_eq!(title_case("the in-house team"), "The In-House Team");
    }

    #[test]
    fn keeps_acronyms_and_abbreviations() {
        assert_eq!(title_case("iPhone review"), "iPhone Review");
        assert_eq!(title_case("U.S. policy"), "U.S. Policy");
        assert_eq!(title_case("visit example.com today"), "Visit example.com Today");
    }

    #[test]
    fn leaves_rest_of_word_untouched() {
        // Only the first character changes; no lower-casing of the tail.
        assert_eq!(title_case("mCDONALD"), "mCDONALD");
        assert_eq!(title_case("hello wORLD"), "Hello wORLD");
    }

    #[test]
    fn vs_variants_are_small_words() {
        assert_eq!(title_case("cats vs. dogs"), "Cats vs. Dogs");
        assert_eq!(title_case("cats VS dogs"), "Cats vs Dogs");
    }

    #[test]
    fn handles_latin1_letters() {
        assert_eq!(title_case("énorme café"), "Énorme Café");
    }

    #[test]
    fn predicate_matches_transform() {
        assert!(is_title_case("The Quick Brown Fox"));
        assert!(is_title_case("  The Lord of the Rings "));
        assert!(!is_title_case("some body text here now"));
        assert!(!is_title_case("The lord of the rings"));
        assert!(!is_title_case(""));
        assert!(!is_title_case("   "));
    }

    #[test]
    fn numbers_and_punctuation_pass_through() {
        assert!(is_title_case("2024 Annual Report"));
        assert!(is_title_case("--- ---"));
    }

    #[test]
    fn transform_is_idempotent() {
        let samples = [
            "the quick brown fox",
            "a tale: the end of it",
            "step-by-step guide to an in-house build",
            "iPhone vs. android: a comparison",
            "U.S. policy on the e.g. thing",
            "énorme café au lait",
            "notes for the 3rd quarter",
            "",
            "  padded  text  ",
        ];
        for s in samples {
            let once = title_case(s);
            assert_eq!(title_case(&once), once, "not idempotent for {s:?}");
        }
    }
}
