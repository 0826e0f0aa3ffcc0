// Word-hint reveal policy: which characters of the current word are shown to
// guessers vs. to the drawer/standby, and how many hints a word is worth.

use rand::Rng;
use rand::seq::IteratorRandom;
use serde::Serialize;

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub struct WordHint {
    /// `None` while the character is still hidden from this view.
    pub character: Option<char>,
    pub underline: bool,
}

fn is_always_visible(c: char) -> bool {
    matches!(c, ' ' | '-' | '_')
}

/// Number of hints a word of this many runes is worth.
pub fn hint_count_for(word_rune_len: usize) -> u32 {
    match word_rune_len {
        0..=2 => 0,
        3..=4 => 1,
        5..=9 => 2,
        _ => 3,
    }
}

/// Builds the paired guesser/drawer hint views for a freshly chosen word.
/// Space/dash/underscore runes are visible-not-underlined in both views;
/// everything else starts hidden-underlined for guessers and
/// visible-underlined for the drawer.
pub fn build_views(word: &str) -> (Vec<WordHint>, Vec<WordHint>) {
    let mut guesser_view = Vec::new();
    let mut drawer_view = Vec::new();
    for c in word.chars() {
        if is_always_visible(c) {
            guesser_view.push(WordHint {
                character: Some(c),
                underline: false,
            });
            drawer_view.push(WordHint {
                character: Some(c),
                underline: false,
            });
        } else {
            guesser_view.push(WordHint {
                character: None,
                underline: true,
            });
            drawer_view.push(WordHint {
                character: Some(c),
                underline: true,
            });
        }
    }
    (guesser_view, drawer_view)
}

/// Reveals one uniformly-random still-hidden position in `guesser_view`,
/// copying the character from `word`. Returns `false` if nothing could be
/// revealed (no hidden positions left).
pub fn reveal_one<R: Rng + ?Sized>(guesser_view: &mut [WordHint], word: &str, rng: &mut R) -> bool {
    let word_chars: Vec<char> = word.chars().collect();
    let Some(idx) = guesser_view
        .iter()
        .enumerate()
        .filter(|(_, h)| h.character.is_none())
        .map(|(i, _)| i)
        .choose(rng)
    else {
        return false;
    };
    guesser_view[idx].character = Some(word_chars[idx]);
    true
}

/// Milliseconds at which the `n`th-from-last hint (1-indexed from the end)
/// should be revealed, given the reveal cadence spec: the interval between
/// reveals is `drawing_time_ms / (hint_count + 1)`.
pub fn reveal_due(time_left_ms: i64, hints_remaining: u32, hint_count: u32, drawing_time_ms: i64) -> bool {
    if hints_remaining == 0 || hint_count == 0 {
        return false;
    }
    let reveal_interval = drawing_time_ms / (hint_count as i64 + 1);
    time_left_ms <= reveal_interval * hints_remaining as i64
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn hint_counts_by_length() {
        assert_eq!(hint_count_for(1), 0);
        assert_eq!(hint_count_for(2), 0);
        assert_eq!(hint_count_for(4), 1);
        assert_eq!(hint_count_for(9), 2);
        assert_eq!(hint_count_for(10), 3);
    }

    #[test]
    fn builds_paired_views_for_pac_man() {
        let (guesser, drawer) = build_views("Pac-Man");
        assert_eq!(guesser.len(), 7);
        // index 3 is '-'
        assert_eq!(guesser[3].character, Some('-'));
        assert!(!guesser[3].underline);
        assert_eq!(drawer[3], guesser[3]);
        // index 0 is 'P', hidden for guessers, visible for drawer.
        assert_eq!(guesser[0].character, None);
        assert!(guesser[0].underline);
        assert_eq!(drawer[0].character, Some('P'));
        assert!(drawer[0].underline);
    }

    #[test]
    fn reveal_schedule_monotonic_before_round_end() {
        // drawing_time=120s, hint_count=3: reveals at t>=30, 60, 90.
        let drawing_time_ms = 120_000;
        assert!(reveal_due(120_000 - 30_000, 3, 3, drawing_time_ms));
        assert!(!reveal_due(120_000 - 29_000, 3, 3, drawing_time_ms));
        assert!(reveal_due(120_000 - 60_000, 2, 3, drawing_time_ms));
        assert!(reveal_due(120_000 - 90_000, 1, 3, drawing_time_ms));
    }

    #[test]
    fn reveal_one_picks_hidden_position() {
        let (mut guesser, _) = build_views("cat");
        let mut rng = StdRng::seed_from_u64(42);
        assert!(reveal_one(&mut guesser, "cat", &mut rng));
        let revealed = guesser.iter().filter(|h| h.character.is_some()).count();
        assert_eq!(revealed, 1);
    }
}
