// Fuzzy-compare normalization: lowercase + strip spaces/dashes/underscores + accent-fold.

use unicode_normalization::UnicodeNormalization;
use unicode_normalization::char::is_combining_mark;

/// Lowercases, accent-folds and strips spaces/dashes/underscores so that
/// "Pac-Man", "pacman" and "PAC MAN" all compare equal.
pub fn simplify(input: &str) -> String {
    input
        .nfd()
        .filter(|c| !is_combining_mark(*c))
        .collect::<String>()
        .to_lowercase()
        .chars()
        .filter(|c| !matches!(c, ' ' | '-' | '_'))
        .collect()
}

/// Levenshtein distance between two already-normalized strings.
pub fn levenshtein(a: &str, b: &str) -> usize {
    strsim::levenshtein(a, b)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_separators_and_case() {
        assert_eq!(simplify("Pac-Man"), "pacman");
        assert_eq!(simplify("pac man"), "pacman");
        assert_eq!(simplify("PAC_MAN"), "pacman");
    }

    #[test]
    fn folds_accents() {
        assert_eq!(simplify("café"), "cafe");
        assert_eq!(simplify("naïve"), "naive");
    }

    #[test]
    fn idempotent() {
        for s in ["Pac-Man", "café", "hello world", "Ångström"] {
            let once = simplify(s);
            let twice = simplify(&once);
            assert_eq!(once, twice);
        }
    }

    #[test]
    fn close_guess_distance_one() {
        assert_eq!(levenshtein(&simplify("house"), &simplify("mouse")), 1);
    }
}
