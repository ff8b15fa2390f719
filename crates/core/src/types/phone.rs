//! Phone number type with canonical formatting.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Errors that can occur when parsing a [`PhoneNumber`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum PhoneError {
    /// The input contains no digits at all.
    #[error("phone number cannot be empty")]
    Empty,
    /// The input does not reduce to a 10-digit national number.
    #[error("phone number must have exactly 10 digits, got {got}")]
    WrongLength {
        /// Number of significant digits found.
        got: usize,
    },
}

/// A phone number in canonical `+7-XXX-XXX-XX-XX` form.
///
/// Parsing accepts any punctuation and an optional leading country digit:
/// all non-digit characters are stripped, then a single leading `7` or `8`
/// is dropped when eleven digits remain. Exactly ten significant digits
/// are required.
///
/// ## Examples
///
/// ```
/// use greengrocer_core::PhoneNumber;
///
/// let canonical = "+7-912-345-67-89";
/// assert_eq!(PhoneNumber::parse("+7 (912) 345-67-89").unwrap().as_str(), canonical);
/// assert_eq!(PhoneNumber::parse("89123456789").unwrap().as_str(), canonical);
/// assert_eq!(PhoneNumber::parse("9123456789").unwrap().as_str(), canonical);
///
/// assert!(PhoneNumber::parse("12345").is_err());
/// assert!(PhoneNumber::parse("call me").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PhoneNumber(String);

impl PhoneNumber {
    /// Number of significant digits in a national number.
    pub const NATIONAL_DIGITS: usize = 10;

    /// Parse a `PhoneNumber` from free-form input.
    ///
    /// # Errors
    ///
    /// Returns an error if the input contains no digits, or does not
    /// reduce to exactly ten national digits.
    pub fn parse(input: &str) -> Result<Self, PhoneError> {
        let digits = Self::national_digits(input);
        if digits.is_empty() {
            return Err(PhoneError::Empty);
        }
        if digits.len() != Self::NATIONAL_DIGITS {
            return Err(PhoneError::WrongLength { got: digits.len() });
        }
        Ok(Self(Self::format_national(&digits)))
    }

    /// Extract the significant national digits from free-form input.
    ///
    /// Strips non-digits and drops one leading `7` or `8` when the result
    /// is eleven digits long.
    #[must_use]
    pub fn national_digits(input: &str) -> String {
        let mut digits: String = input.chars().filter(char::is_ascii_digit).collect();
        if digits.len() == Self::NATIONAL_DIGITS + 1
            && (digits.starts_with('7') || digits.starts_with('8'))
        {
            digits.remove(0);
        }
        digits
    }

    fn format_national(digits: &str) -> String {
        format!(
            "+7-{}-{}-{}-{}",
            digits.get(0..3).unwrap_or_default(),
            digits.get(3..6).unwrap_or_default(),
            digits.get(6..8).unwrap_or_default(),
            digits.get(8..10).unwrap_or_default(),
        )
    }

    /// Returns the canonical form as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes the `PhoneNumber` and returns its inner string.
    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for PhoneNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::str::FromStr for PhoneNumber {
    type Err = PhoneError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl AsRef<str> for PhoneNumber {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_common_formats() {
        let expected = "+7-912-345-67-89";
        for input in [
            "+7 (912) 345-67-89",
            "8 912 345 67 89",
            "79123456789",
            "9123456789",
            "912-345-6789",
        ] {
            assert_eq!(PhoneNumber::parse(input).unwrap().as_str(), expected);
        }
    }

    #[test]
    fn test_parse_empty() {
        assert_eq!(PhoneNumber::parse("hello"), Err(PhoneError::Empty));
        assert_eq!(PhoneNumber::parse(""), Err(PhoneError::Empty));
    }

    #[test]
    fn test_parse_wrong_length() {
        assert_eq!(
            PhoneNumber::parse("12345"),
            Err(PhoneError::WrongLength { got: 5 })
        );
        // 12 digits: leading 7 is only dropped at exactly 11
        assert_eq!(
            PhoneNumber::parse("791234567890"),
            Err(PhoneError::WrongLength { got: 12 })
        );
    }

    #[test]
    fn test_leading_eight_only_dropped_at_eleven_digits() {
        // A ten-digit number starting with 8 keeps its 8
        assert_eq!(
            PhoneNumber::parse("8123456789").unwrap().as_str(),
            "+7-812-345-67-89"
        );
    }

    #[test]
    fn test_serde_round_trip() {
        let phone = PhoneNumber::parse("9123456789").unwrap();
        let json = serde_json::to_string(&phone).unwrap();
        assert_eq!(json, "\"+7-912-345-67-89\"");
        let back: PhoneNumber = serde_json::from_str(&json).unwrap();
        assert_eq!(back, phone);
    }
}
