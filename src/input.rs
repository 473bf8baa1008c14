// src/input.rs
//! Parsing of raw form values into constrained types. Everything that reaches
//! the reducer has already passed through here.
use std::fmt;

use crate::command::Rejection;

/// Heaviest weight accepted, in whole units.
pub const MAX_WEIGHT: u32 = 1000;
const MAX_FRACTION_DIGITS: usize = 2;

/// Characters stripped from free-text notes.
const NOTE_FORBIDDEN: &[char] = &[
    '&', '<', '>', '"', '\'', '/', '`', '|', ';', '*', '?', '(', ')', '$', ':', ',', '~',
];

/// A non-negative weight with at most two fractional digits, stored in hundredths.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Weight {
    hundredths: u32,
}

impl Weight {
    /// # Errors
    /// - `Rejection::MissingField` if the value is blank.
    /// - `Rejection::InvalidWeight` if it is not a plain decimal number.
    /// - `Rejection::TooManyDecimals` for more than two fractional digits.
    /// - `Rejection::WeightOutOfRange` above `MAX_WEIGHT`.
    pub fn parse(raw: &str) -> Result<Self, Rejection> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(Rejection::MissingField("weight"));
        }
        let (whole, fraction) = trimmed.split_once('.').unwrap_or((trimmed, ""));
        let all_digits = |s: &str| s.chars().all(|c| c.is_ascii_digit());
        if (whole.is_empty() && fraction.is_empty()) || !all_digits(whole) || !all_digits(fraction)
        {
            return Err(Rejection::InvalidWeight(trimmed.to_string()));
        }
        if fraction.len() > MAX_FRACTION_DIGITS {
            return Err(Rejection::TooManyDecimals(trimmed.to_string()));
        }

        let whole = whole.trim_start_matches('0');
        // Anything past four integer digits is out of range; avoids overflow below.
        if whole.len() > 4 {
            return Err(Rejection::WeightOutOfRange(trimmed.to_string()));
        }
        let whole: u32 = if whole.is_empty() {
            0
        } else {
            whole
                .parse()
                .map_err(|_| Rejection::InvalidWeight(trimmed.to_string()))?
        };
        let fraction: u32 = match fraction.len() {
            0 => 0,
            1 => fraction.parse::<u32>().unwrap_or(0) * 10,
            _ => fraction.parse::<u32>().unwrap_or(0),
        };

        let hundredths = whole * 100 + fraction;
        if hundredths > MAX_WEIGHT * 100 {
            return Err(Rejection::WeightOutOfRange(trimmed.to_string()));
        }
        Ok(Self { hundredths })
    }

    pub const fn hundredths(self) -> u32 {
        self.hundredths
    }
}

impl fmt::Display for Weight {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let whole = self.hundredths / 100;
        let fraction = self.hundredths % 100;
        if fraction == 0 {
            write!(f, "{whole}")
        } else if fraction % 10 == 0 {
            write!(f, "{whole}.{}", fraction / 10)
        } else {
            write!(f, "{whole}.{fraction:02}")
        }
    }
}

/// A strictly positive repetition count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Reps(u32);

impl Reps {
    /// # Errors
    /// - `Rejection::MissingField` if the value is blank.
    /// - `Rejection::InvalidReps` unless it is a positive whole number.
    pub fn parse(raw: &str) -> Result<Self, Rejection> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(Rejection::MissingField("reps"));
        }
        if !trimmed.chars().all(|c| c.is_ascii_digit()) {
            return Err(Rejection::InvalidReps(trimmed.to_string()));
        }
        match trimmed.parse::<u32>() {
            Ok(n) if n > 0 => Ok(Self(n)),
            _ => Err(Rejection::InvalidReps(trimmed.to_string())),
        }
    }

    pub const fn get(self) -> u32 {
        self.0
    }
}

impl fmt::Display for Reps {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Free text with markup and shell-ish punctuation removed.
#[derive(Debug, Clone, PartialEq, Eq, Default, Hash)]
pub struct Note(String);

impl Note {
    pub fn sanitize(raw: &str) -> Self {
        let kept: String = raw.chars().filter(|c| !NOTE_FORBIDDEN.contains(c)).collect();
        Self(kept.trim().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

/// Trims `raw` and rejects it when nothing is left.
///
/// # Errors
/// `Rejection::EmptyName` naming `field`.
pub fn required_name(raw: &str, field: &'static str) -> Result<String, Rejection> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        Err(Rejection::EmptyName(field))
    } else {
        Ok(trimmed.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    #[rstest]
    #[case::integer("100", "100")]
    #[case::one_decimal("102.5", "102.5")]
    #[case::two_decimals("60.25", "60.25")]
    #[case::trailing_zero("60.50", "60.5")]
    #[case::zero("0", "0")]
    #[case::upper_bound("1000", "1000")]
    #[case::upper_bound_with_zeros("1000.00", "1000")]
    #[case::leading_dot(".5", "0.5")]
    #[case::trailing_dot("12.", "12")]
    #[case::leading_zeros("0012.05", "12.05")]
    #[case::whitespace(" 80 ", "80")]
    fn weight_accepts(#[case] raw: &str, #[case] expected: &str) {
        assert_eq!(Weight::parse(raw).map(|w| w.to_string()), Ok(expected.to_string()));
    }

    #[rstest]
    #[case::empty("", Rejection::MissingField("weight"))]
    #[case::blank("   ", Rejection::MissingField("weight"))]
    #[case::letters("abc", Rejection::InvalidWeight("abc".into()))]
    #[case::negative("-5", Rejection::InvalidWeight("-5".into()))]
    #[case::exponent("1e3", Rejection::InvalidWeight("1e3".into()))]
    #[case::lone_dot(".", Rejection::InvalidWeight(".".into()))]
    #[case::two_dots("1.2.3", Rejection::InvalidWeight("1.2.3".into()))]
    #[case::three_decimals("1000.005", Rejection::TooManyDecimals("1000.005".into()))]
    #[case::above_max("1000.01", Rejection::WeightOutOfRange("1000.01".into()))]
    #[case::huge("99999999999", Rejection::WeightOutOfRange("99999999999".into()))]
    fn weight_rejects(#[case] raw: &str, #[case] expected: Rejection) {
        assert_eq!(Weight::parse(raw), Err(expected));
    }

    #[test]
    fn weight_orders_by_value() {
        assert!(Weight::parse("99.99").unwrap() < Weight::parse("100").unwrap());
        assert_eq!(Weight::parse("2.5").unwrap().hundredths(), 250);
    }

    #[rstest]
    #[case::single("5", Ok(5))]
    #[case::padded(" 12 ", Ok(12))]
    #[case::zero("0", Err(Rejection::InvalidReps("0".into())))]
    #[case::negative("-1", Err(Rejection::InvalidReps("-1".into())))]
    #[case::fractional("2.5", Err(Rejection::InvalidReps("2.5".into())))]
    #[case::overflow("99999999999", Err(Rejection::InvalidReps("99999999999".into())))]
    #[case::empty("", Err(Rejection::MissingField("reps")))]
    fn reps_parsing(#[case] raw: &str, #[case] expected: Result<u32, Rejection>) {
        assert_eq!(Reps::parse(raw).map(Reps::get), expected);
    }

    #[rstest]
    #[case::plain("Good form", "Good form")]
    #[case::markup("Good <b>form</b>!", "Good bformb!")]
    #[case::punctuation("felt heavy; (very) - 5/5", "felt heavy very - 55")]
    #[case::trimmed("  easy  ", "easy")]
    #[case::only_forbidden("<>$~", "")]
    fn note_sanitizing(#[case] raw: &str, #[case] expected: &str) {
        assert_eq!(Note::sanitize(raw).as_str(), expected);
    }

    #[test]
    fn required_name_trims_and_rejects_blank() {
        assert_eq!(required_name("  Squat ", "exercise"), Ok("Squat".to_string()));
        assert_eq!(
            required_name(" \t", "exercise"),
            Err(Rejection::EmptyName("exercise"))
        );
    }
}
