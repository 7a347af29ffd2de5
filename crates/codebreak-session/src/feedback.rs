//! The feedback engine: scoring a guess against a secret.

use codebreak_protocol::{CODE_LENGTH, Feedback};

use crate::Code;

/// Scores `guess` against `secret`.
///
/// Positional matches are counted first and their digits are consumed on
/// both sides. The leftover digits are then matched by value, each guess
/// digit against at most one secret digit (`min` of the per-digit counts).
/// `value_matches` is the positional count plus those leftover matches.
///
/// ```rust
/// use codebreak_session::{score, Code};
///
/// let fb = score(&Code::parse("1122").unwrap(), &Code::parse("1111").unwrap());
/// assert_eq!((fb.positional_matches, fb.value_matches), (2, 2));
/// ```
pub fn score(secret: &Code, guess: &Code) -> Feedback {
    let mut positional = 0u8;
    let mut secret_left = [0u8; 10];
    let mut guess_left = [0u8; 10];

    for (&s, &g) in secret.digits().iter().zip(guess.digits()) {
        if s == g {
            positional += 1;
        } else {
            secret_left[usize::from(s)] += 1;
            guess_left[usize::from(g)] += 1;
        }
    }

    let extra: u8 = secret_left
        .iter()
        .zip(&guess_left)
        .map(|(s, g)| *s.min(g))
        .sum();

    debug_assert!(usize::from(positional + extra) <= CODE_LENGTH);

    Feedback {
        positional_matches: positional,
        value_matches: positional + extra,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fb(secret: &str, guess: &str) -> (u8, u8) {
        let f = score(&Code::parse(secret).unwrap(), &Code::parse(guess).unwrap());
        (f.positional_matches, f.value_matches)
    }

    fn code_from_index(n: u32) -> Code {
        Code::parse(&format!("{n:04}")).unwrap()
    }

    #[test]
    fn test_score_identical_codes_is_full_match() {
        assert_eq!(fb("4821", "4821"), (4, 4));
        assert_eq!(fb("0000", "0000"), (4, 4));
    }

    #[test]
    fn test_score_duplicate_guess_digits_not_overcounted() {
        assert_eq!(fb("1122", "1111"), (2, 2));
    }

    #[test]
    fn test_score_reversed_code_is_all_value_matches() {
        assert_eq!(fb("1234", "4321"), (0, 4));
    }

    #[test]
    fn test_score_capped_by_secret_multiplicity() {
        // Both 1s in the secret are matched in place.
        assert_eq!(fb("1123", "1111"), (2, 2));
        // One 1 in the secret, so three guessed 1s count once.
        assert_eq!(fb("1223", "3111"), (0, 2));
    }

    #[test]
    fn test_score_duplicate_secret_digits_not_overcounted() {
        assert_eq!(fb("1111", "1234"), (1, 1));
        assert_eq!(fb("1111", "2113"), (2, 2));
    }

    #[test]
    fn test_score_no_common_digits() {
        assert_eq!(fb("1234", "5678"), (0, 0));
    }

    #[test]
    fn test_score_partial_overlap() {
        assert_eq!(fb("1234", "1243"), (2, 4));
        assert_eq!(fb("1093", "3019"), (1, 4));
        assert_eq!(fb("4821", "1093"), (0, 1));
        assert_eq!(fb("2211", "1122"), (0, 4));
        assert_eq!(fb("1213", "3111"), (1, 3));
    }

    #[test]
    fn test_score_is_pure() {
        let secret = Code::parse("5566").unwrap();
        let guess = Code::parse("6655").unwrap();
        let first = score(&secret, &guess);
        let second = score(&secret, &guess);
        assert_eq!(first, second);
    }

    #[test]
    fn test_score_bounds_hold_for_sampled_pairs() {
        // Every secret against a spread of guesses: 10_000 x 100 pairs.
        for s in 0..10_000 {
            let secret = code_from_index(s);
            for g in (0..10_000).step_by(101) {
                let guess = code_from_index(g);
                let f = score(&secret, &guess);
                assert!(f.positional_matches <= f.value_matches);
                assert!(f.value_matches <= 4);
            }
        }
    }

    #[test]
    fn test_score_value_matches_symmetric_under_swap() {
        for s in (0..10_000).step_by(37) {
            for g in (0..10_000).step_by(53) {
                let a = code_from_index(s);
                let b = code_from_index(g);
                assert_eq!(
                    score(&a, &b).value_matches,
                    score(&b, &a).value_matches,
                    "value matches differ for {a} / {b}"
                );
            }
        }
    }

    #[test]
    fn test_score_full_match_only_for_equal_codes() {
        let secret = Code::parse("7070").unwrap();
        for g in 0..10_000 {
            let guess = code_from_index(g);
            assert_eq!(score(&secret, &guess).is_solved(), guess == secret);
        }
    }
}
