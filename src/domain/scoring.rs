// Guesser/drawer scoring curves. Integer arithmetic throughout, per the
// contractual constants: max base score 200, max hint bonus 60.

pub const MAX_BASE_SCORE: i64 = 200;
pub const MAX_HINT_BONUS: i64 = 60;

/// Score awarded to a guesser who solves with `seconds_left` remaining out of
/// `drawing_time` total seconds, given `hint_count` initial hints and
/// `hints_remaining` hints not yet revealed at the time of the guess.
pub fn guesser_score(drawing_time: u32, seconds_left: u32, hint_count: u32, hints_remaining: u32) -> i64 {
    let drawing_time = drawing_time.max(1) as f64;
    let decline = 1.0 / drawing_time;
    let elapsed = (drawing_time - seconds_left as f64).max(0.0);
    let base = (MAX_BASE_SCORE as f64 * (1.0 - decline).powf(elapsed)).floor() as i64;

    if hint_count == 0 {
        base
    } else {
        let bonus = hints_remaining as i64 * (MAX_HINT_BONUS / hint_count as i64);
        base + bonus
    }
}

/// Drawer's turn score: integer mean of the guessers' score accumulator over
/// the number of guessers who could have scored (connected players minus the
/// drawer, if the drawer itself is connected).
pub fn drawer_score(guessers_score_accumulator: i64, guesser_denominator: u32) -> i64 {
    if guessers_score_accumulator <= 0 {
        0
    } else {
        guessers_score_accumulator / guesser_denominator.max(1) as i64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pac_man_example_from_spec() {
        // drawing_time=120, seconds_left=115, hint_count=2, hints_remaining=2
        // base = floor(200*(119/120)^5) = 191, bonus = 2*30 = 60, total = 251
        assert_eq!(guesser_score(120, 115, 2, 2), 251);
    }

    #[test]
    fn monotonic_in_elapsed_time() {
        let slow = guesser_score(120, 10, 0, 0);
        let fast = guesser_score(120, 110, 0, 0);
        assert!(fast >= slow);
    }

    #[test]
    fn strictly_below_max_once_time_elapsed() {
        let score = guesser_score(120, 119, 0, 0);
        assert!(score < MAX_BASE_SCORE);
    }

    #[test]
    fn drawer_score_is_integer_mean() {
        assert_eq!(drawer_score(0, 3), 0);
        assert_eq!(drawer_score(-5, 3), 0);
        assert_eq!(drawer_score(300, 3), 100);
        assert_eq!(drawer_score(100, 0), 100);
    }
}
