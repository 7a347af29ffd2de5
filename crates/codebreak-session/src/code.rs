//! Validated 4-digit codes.

use std::fmt;
use std::str::FromStr;

use codebreak_protocol::CODE_LENGTH;

/// Why a string was not accepted as a code.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CodeError {
    /// The string did not have exactly [`CODE_LENGTH`] characters.
    #[error("code must be {expected} digits, got {found} characters")]
    WrongLength { expected: usize, found: usize },

    /// The string contained something other than an ASCII digit.
    #[error("code must contain only digits 0-9, found {0:?}")]
    NonDigit(char),
}

/// A secret or a guess: exactly four decimal digits.
///
/// Digits are stored as values `0..=9`, not ASCII bytes. `Debug` is
/// redacted so a committed secret never lands in a log line by accident;
/// `Display` renders the digits and is only used for guesses.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Code([u8; CODE_LENGTH]);

impl Code {
    /// Parses a code from its textual form, e.g. `"0427"`.
    ///
    /// Leading zeros are significant and no whitespace is trimmed.
    pub fn parse(raw: &str) -> Result<Self, CodeError> {
        let found = raw.chars().count();
        if found != CODE_LENGTH {
            return Err(CodeError::WrongLength {
                expected: CODE_LENGTH,
                found,
            });
        }

        let mut digits = [0u8; CODE_LENGTH];
        for (slot, ch) in digits.iter_mut().zip(raw.chars()) {
            *slot = match ch.to_digit(10) {
                Some(d) => d as u8,
                None => return Err(CodeError::NonDigit(ch)),
            };
        }
        Ok(Self(digits))
    }

    /// The digit values, each in `0..=9`.
    pub fn digits(&self) -> &[u8; CODE_LENGTH] {
        &self.0
    }
}

impl FromStr for Code {
    type Err = CodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for Code {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for d in self.0 {
            write!(f, "{d}")?;
        }
        Ok(())
    }
}

impl fmt::Debug for Code {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Code(****)")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_valid_code_keeps_leading_zero() {
        let code = Code::parse("0427").expect("valid code");
        assert_eq!(code.digits(), &[0, 4, 2, 7]);
        assert_eq!(code.to_string(), "0427");
    }

    #[test]
    fn test_parse_too_short_returns_wrong_length() {
        assert_eq!(
            Code::parse("123"),
            Err(CodeError::WrongLength { expected: 4, found: 3 })
        );
    }

    #[test]
    fn test_parse_too_long_returns_wrong_length() {
        assert_eq!(
            Code::parse("12345"),
            Err(CodeError::WrongLength { expected: 4, found: 5 })
        );
    }

    #[test]
    fn test_parse_empty_returns_wrong_length() {
        assert!(matches!(
            Code::parse(""),
            Err(CodeError::WrongLength { found: 0, .. })
        ));
    }

    #[test]
    fn test_parse_letter_returns_non_digit() {
        assert_eq!(Code::parse("12a4"), Err(CodeError::NonDigit('a')));
    }

    #[test]
    fn test_parse_whitespace_is_not_trimmed() {
        assert_eq!(Code::parse(" 123"), Err(CodeError::NonDigit(' ')));
    }

    #[test]
    fn test_parse_rejects_non_ascii_digits() {
        // Arabic-Indic digits are numeric but not 0-9.
        assert_eq!(Code::parse("١٢٣٤"), Err(CodeError::NonDigit('١')));
    }

    #[test]
    fn test_parse_sign_is_not_a_digit() {
        assert_eq!(Code::parse("-123"), Err(CodeError::NonDigit('-')));
    }

    #[test]
    fn test_from_str_matches_parse() {
        let code: Code = "9090".parse().unwrap();
        assert_eq!(code, Code::parse("9090").unwrap());
    }

    #[test]
    fn test_debug_is_redacted() {
        let code = Code::parse("4821").unwrap();
        assert_eq!(format!("{code:?}"), "Code(****)");
    }
}
