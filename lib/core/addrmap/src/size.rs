//! Human-readable byte quantities.
//!
//! Sizes may be given either as plain integers or as literals such as `"4 KB"`, `"1 byte"` or
//! `"0x400"`. All unit multiples are binary, so `"1 KB"` is 1024 bytes.

use alloc::{
    string::{String, ToString},
    vec::Vec,
};
use core::{error, fmt, str::FromStr};

/// Recognized units and the power of two they multiply by. Matching ignores ASCII case.
const UNITS: &[(&[&str], u32)] = &[
    (&["", "b", "byte", "bytes"], 0),
    (&["k", "kb", "kib"], 10),
    (&["m", "mb", "mib"], 20),
    (&["g", "gb", "gib"], 30),
    (&["t", "tb", "tib"], 40),
];

/// Units used when rendering a quantity, largest first.
const DISPLAY_UNITS: [(&str, u32); 4] = [("TB", 40), ("GB", 30), ("MB", 20), ("KB", 10)];

/// The maximum number of fractional digits accepted in a size literal.
const MAX_FRACTION_DIGITS: usize = 19;

/// Parses a size literal into a number of bytes.
///
/// Accepted forms are a `0x` prefixed hexadecimal integer, or a decimal number with an optional
/// fraction followed by an optional unit (`B`, `byte`, `bytes`, `KB`, `MB`, `GB`, `TB` and their
/// `KiB` style aliases). Underscores may be used as digit separators.
///
/// # Errors
///
/// - [`ParseSizeError::Empty`]: the literal contains no characters besides whitespace.
/// - [`ParseSizeError::InvalidNumber`]: the numeric part is malformed.
/// - [`ParseSizeError::UnknownUnit`]: the unit is not recognized.
/// - [`ParseSizeError::Fractional`]: the literal does not describe a whole number of bytes.
/// - [`ParseSizeError::Overflow`]: the quantity does not fit in a `u64`.
pub fn parse_size(literal: &str) -> Result<u64, ParseSizeError> {
    let literal = literal.trim();
    if literal.is_empty() {
        return Err(ParseSizeError::Empty);
    }

    if let Some(digits) = literal
        .strip_prefix("0x")
        .or_else(|| literal.strip_prefix("0X"))
    {
        let digits = digits.replace('_', "");
        return u64::from_str_radix(&digits, 16)
            .map_err(|_| ParseSizeError::InvalidNumber(literal.to_string()));
    }

    let split = literal
        .find(|c: char| !(c.is_ascii_digit() || c == '.' || c == '_'))
        .unwrap_or(literal.len());
    let (number, unit) = literal.split_at(split);
    let unit = unit.trim();

    let shift = UNITS
        .iter()
        .find(|(names, _)| names.iter().any(|name| name.eq_ignore_ascii_case(unit)))
        .map(|&(_, shift)| shift)
        .ok_or_else(|| ParseSizeError::UnknownUnit(unit.to_string()))?;

    let (whole, fraction) = number.split_once('.').unwrap_or((number, ""));
    let fraction: Vec<char> = fraction.chars().filter(|&c| c != '_').collect();
    if fraction.len() > MAX_FRACTION_DIGITS {
        return Err(ParseSizeError::InvalidNumber(literal.to_string()));
    }

    let whole = parse_digits(whole, literal)?;
    let fraction_value = parse_digits_or_zero(&fraction, literal)?;
    let scale = fraction.iter().fold(1u128, |scale, _| scale * 10);

    let scaled = whole
        .checked_mul(scale)
        .and_then(|value| value.checked_add(fraction_value))
        .and_then(|value| value.checked_mul(1 << shift))
        .ok_or_else(|| ParseSizeError::Overflow(literal.to_string()))?;
    if scaled % scale != 0 {
        return Err(ParseSizeError::Fractional(literal.to_string()));
    }

    u64::try_from(scaled / scale).map_err(|_| ParseSizeError::Overflow(literal.to_string()))
}

/// Parses the non-empty decimal `digits`, ignoring `_` separators.
fn parse_digits(digits: &str, literal: &str) -> Result<u128, ParseSizeError> {
    let digits: Vec<char> = digits.chars().filter(|&c| c != '_').collect();
    if digits.is_empty() {
        return Err(ParseSizeError::InvalidNumber(literal.to_string()));
    }

    parse_digits_or_zero(&digits, literal)
}

/// Parses decimal `digits`, treating an empty sequence as `0`.
fn parse_digits_or_zero(digits: &[char], literal: &str) -> Result<u128, ParseSizeError> {
    digits.iter().try_fold(0u128, |value, c| {
        let digit = c
            .to_digit(10)
            .ok_or_else(|| ParseSizeError::InvalidNumber(literal.to_string()))?;
        value
            .checked_mul(10)
            .and_then(|value| value.checked_add(u128::from(digit)))
            .ok_or_else(|| ParseSizeError::Overflow(literal.to_string()))
    })
}

/// A number of bytes, rendered in a human-readable form.
///
/// ```
/// use addrmap::Bytes;
///
/// assert_eq!(Bytes(1).to_string(), "1 byte");
/// assert_eq!(Bytes(768).to_string(), "768 bytes");
/// assert_eq!(Bytes(0x1000).to_string(), "4 KB");
/// assert_eq!("4 KB".parse::<Bytes>(), Ok(Bytes(0x1000)));
/// ```
#[derive(Clone, Copy, Debug, Default, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub struct Bytes(pub u64);

impl From<u64> for Bytes {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

impl From<Bytes> for u64 {
    fn from(value: Bytes) -> Self {
        value.0
    }
}

impl FromStr for Bytes {
    type Err = ParseSizeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_size(s).map(Self)
    }
}

impl fmt::Display for Bytes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let value = self.0;
        if value == 1 {
            return f.write_str("1 byte");
        }

        let Some(index) = DISPLAY_UNITS
            .iter()
            .position(|&(_, shift)| value >= 1 << shift)
        else {
            return write!(f, "{value} bytes");
        };

        let (mut name, shift) = DISPLAY_UNITS[index];
        let mut hundredths = hundredths_of(value, shift);

        // Rounding may reach the next unit.
        if hundredths >= 1024 * 100
            && let Some(&(larger, shift)) = index.checked_sub(1).and_then(|i| DISPLAY_UNITS.get(i))
        {
            name = larger;
            hundredths = hundredths_of(value, shift);
        }

        let (whole, fraction) = (hundredths / 100, hundredths % 100);
        if fraction == 0 {
            write!(f, "{whole} {name}")
        } else if fraction % 10 == 0 {
            write!(f, "{whole}.{} {name}", fraction / 10)
        } else {
            write!(f, "{whole}.{fraction:02} {name}")
        }
    }
}

/// Returns `value` in hundredths of `1 << shift`, rounded to the nearest hundredth.
fn hundredths_of(value: u64, shift: u32) -> u128 {
    let unit = 1u128 << shift;
    (u128::from(value) * 100 + unit / 2) / unit
}

/// Various errors that can occur while parsing a size literal.
#[derive(Clone, Debug, Hash, PartialEq, Eq)]
pub enum ParseSizeError {
    /// The literal was empty.
    Empty,
    /// The numeric part of the literal was malformed.
    InvalidNumber(String),
    /// The unit of the literal was not recognized.
    UnknownUnit(String),
    /// The literal does not describe a whole number of bytes.
    Fractional(String),
    /// The described quantity does not fit in a `u64`.
    Overflow(String),
}

impl fmt::Display for ParseSizeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => f.write_str("size literal is empty"),
            Self::InvalidNumber(literal) => write!(f, "invalid number in size literal {literal:?}"),
            Self::UnknownUnit(unit) => write!(f, "unknown size unit {unit:?}"),
            Self::Fractional(literal) => {
                write!(f, "size literal {literal:?} is not a whole number of bytes")
            }
            Self::Overflow(literal) => write!(f, "size literal {literal:?} exceeds 64 bits"),
        }
    }
}

impl error::Error for ParseSizeError {}
