// 🔍 Token-aware similarity for normalized team names
//
// Score range is 0.0 - 100.0. Inputs are expected to be normalized already.

use strsim::normalized_levenshtein;

/// Similarity of two normalized names on a 0-100 scale.
///
/// Tokens are sorted before comparison so word order does not matter
/// ("blue hudson 2015" vs "hudson 2015 blue" scores 100). Names whose digit
/// runs differ (birth year, squad number, age group) score 0: those are
/// different teams no matter how close the letters are.
pub fn similarity(a: &str, b: &str) -> f64 {
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }

    if digit_runs(a) != digit_runs(b) {
        return 0.0;
    }

    token_sort_ratio(a, b)
}

/// Levenshtein ratio of the two names with their tokens sorted alphabetically
pub fn token_sort_ratio(a: &str, b: &str) -> f64 {
    let sorted_a = sorted_tokens(a);
    let sorted_b = sorted_tokens(b);

    normalized_levenshtein(&sorted_a, &sorted_b) * 100.0
}

fn sorted_tokens(s: &str) -> String {
    let mut tokens: Vec<&str> = s.split_whitespace().collect();
    tokens.sort_unstable();
    tokens.join(" ")
}

/// Maximal runs of ASCII digits, sorted ("u12 2015 b" → ["12", "2015"])
fn digit_runs(s: &str) -> Vec<&str> {
    let mut runs: Vec<&str> = s
        .split(|c: char| !c.is_ascii_digit())
        .filter(|run| !run.is_empty())
        .collect();
    runs.sort_unstable();
    runs
}
