// 🔤 Name Normalizer - canonical text used by every matching stage
//
// "Hudson Utd. – 2015 Boys (Blue)" and "hudson utd 2015 boys blue" must land on
// the same string, while every token that tells two teams apart survives.

use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

/// Canonicalize a team name for comparison.
///
/// - Unicode compatibility decomposition (NFKD), combining marks dropped
/// - Lowercase
/// - Every non-alphanumeric character becomes a space
/// - Whitespace runs collapse to one space, ends trimmed
///
/// No token is ever removed: club words, colors, birth years and squad numbers
/// all stay. The function is idempotent.
///
/// Example: `normalize("Atlético  Jrs. U-12")` → `"atletico jrs u 12"`
pub fn normalize(text: &str) -> String {
    // Lowercase on both sides of the decomposition: compatibility forms such as
    // "℡" decompose to uppercase letters, and "İ" lowercases to i + U+0307.
    let folded: String = text
        .to_lowercase()
        .nfkd()
        .filter(|c| !is_combining_mark(*c))
        .flat_map(char::to_lowercase)
        .filter(|c| !is_combining_mark(*c))
        .map(|c| if c.is_alphanumeric() { c } else { ' ' })
        .collect();

    folded.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Split a normalized name into its tokens
pub fn tokens(normalized: &str) -> Vec<&str> {
    normalized.split(' ').filter(|t| !t.is_empty()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_basic() {
        assert_eq!(normalize("Hudson United"), "hudson united");
        assert_eq!(normalize("  HUDSON   united  "), "hudson united");
        assert_eq!(normalize("Hudson-United F.C."), "hudson united f c");
        assert_eq!(normalize(""), "");
        assert_eq!(normalize(" .-/ "), "");
    }

    #[test]
    fn test_normalize_strips_diacritics() {
        assert_eq!(normalize("Atlético Jrs"), "atletico jrs");
        assert_eq!(normalize("Åland Ørn Über"), "aland ørn uber");
        assert_eq!(normalize("São Paulo"), "sao paulo");
        assert_eq!(normalize("İstanbul"), "istanbul");
        assert_eq!(normalize("℡ United"), "tel united");
    }

    #[test]
    fn test_normalize_keeps_meaningful_tokens() {
        let n = normalize("Hudson United 2015 Boys Blue/GREY #1");
        assert_eq!(n, "hudson united 2015 boys blue grey 1");
        assert_eq!(tokens(&n).len(), 8);
    }

    #[test]
    fn test_normalize_is_idempotent() {
        let samples = [
            "Hudson United 2015 Boys Blue GREY 1",
            "FC  Dallas (U-12) — Élite",
            "ﬁre ball ²",
            "already normal",
            "",
        ];
        for s in samples {
            let once = normalize(s);
            assert_eq!(normalize(&once), once, "not idempotent for {:?}", s);
        }
    }

    #[test]
    fn test_tokens() {
        assert_eq!(tokens("a b c"), vec!["a", "b", "c"]);
        assert!(tokens("").is_empty());
    }
}
