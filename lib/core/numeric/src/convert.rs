//! Conversions between integer representations: native widths, fixed-width signed and unsigned
//! values, hexadecimal literals and differently sized words.

use alloc::{string::String, vec::Vec};
use core::{error, fmt};

/// Safely converts `value` to a `usize` relying on compile time code checking.
#[cfg(any(target_pointer_width = "32", target_pointer_width = "64"))]
pub const fn u32_to_usize(value: u32) -> usize {
    value as usize
}

/// Returns the largest value representable by an unsigned integer of `width` bits.
///
/// # Panics
///
/// Panics if `width` is `0` or larger than 64.
pub const fn unsigned_max(width: u32) -> u64 {
    assert!(width > 0 && width <= 64, "width must be between 1 and 64 bits");

    u64::MAX >> (u64::BITS - width)
}

/// Converts unsigned `value` to a `width` bit hexadecimal literal prefixed by `prefix`.
///
/// The prefix may contain `{width}` and `{value}` placeholders.
///
/// # Errors
///
/// Returns [`ConversionError::OutOfRange`] if `value` does not fit in `width` bits.
///
/// # Panics
///
/// Panics if `width` is `0` or larger than 64.
pub fn unsigned_to_hex(value: u64, width: u32, prefix: &str) -> Result<String, ConversionError> {
    if value > unsigned_max(width) {
        return Err(ConversionError::OutOfRange {
            value: i128::from(value),
            width,
            signed: false,
        });
    }

    Ok(format_hex(value, width, prefix))
}

/// Converts signed `value` to a `width` bit two's complement hexadecimal literal prefixed by
/// `prefix`.
///
/// The prefix may contain `{width}` and `{value}` placeholders; `{value}` is replaced by the
/// unsigned representation.
///
/// # Errors
///
/// Returns [`ConversionError::OutOfRange`] if `value` does not fit in `width` bits.
///
/// # Panics
///
/// Panics if `width` is `0` or larger than 64.
pub fn signed_to_hex(value: i64, width: u32, prefix: &str) -> Result<String, ConversionError> {
    let value = signed_to_unsigned(value, width)?;
    Ok(format_hex(value, width, prefix))
}

/// Converts signed `value` to its `width` bit two's complement representation.
///
/// # Errors
///
/// Returns [`ConversionError::OutOfRange`] if `value` does not fit in `width` bits.
///
/// # Panics
///
/// Panics if `width` is `0` or larger than 64.
#[expect(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn signed_to_unsigned(value: i64, width: u32) -> Result<u64, ConversionError> {
    let modulus = i128::from(unsigned_max(width)) + 1;
    let high = modulus / 2 - 1;
    let low = -(modulus / 2);

    let value = i128::from(value);
    if value < low || value > high {
        return Err(ConversionError::OutOfRange {
            value,
            width,
            signed: true,
        });
    }

    // The result lies within `0..modulus`, which always fits in a `u64`.
    Ok(value.rem_euclid(modulus) as u64)
}

/// Interprets the `width` bit two's complement representation `value` as a signed integer.
///
/// # Errors
///
/// Returns [`ConversionError::OutOfRange`] if `value` does not fit in `width` bits.
///
/// # Panics
///
/// Panics if `width` is `0` or larger than 64.
#[expect(clippy::cast_possible_truncation)]
pub fn unsigned_to_signed(value: u64, width: u32) -> Result<i64, ConversionError> {
    if value > unsigned_max(width) {
        return Err(ConversionError::OutOfRange {
            value: i128::from(value),
            width,
            signed: false,
        });
    }

    let value = i128::from(value);
    let sign_bit = 1i128 << (width - 1);
    if value & sign_bit != 0 {
        Ok((value - (sign_bit << 1)) as i64)
    } else {
        Ok(value as i64)
    }
}

/// Packs little endian `bytes` into words of `bytes_per_word` bytes.
///
/// A trailing partial word is zero extended.
///
/// # Panics
///
/// Panics if `bytes_per_word` is `0` or larger than 8.
pub fn bytes_to_words(bytes: &[u8], bytes_per_word: usize) -> Vec<u64> {
    assert!(
        bytes_per_word > 0 && bytes_per_word <= 8,
        "words must hold between 1 and 8 bytes"
    );

    bytes.chunks(bytes_per_word).map(bytes_to_word).collect()
}

/// Packs little endian `bytes` into a single word.
///
/// # Panics
///
/// Panics if more than 8 bytes are provided.
pub fn bytes_to_word(bytes: &[u8]) -> u64 {
    assert!(bytes.len() <= 8, "a word holds at most 8 bytes");

    bytes
        .iter()
        .rev()
        .fold(0, |word, &byte| (word << 8) | u64::from(byte))
}

/// Splits `words` into little endian bytes, `bytes_per_word` bytes per word.
///
/// Words wider than `bytes_per_word` are truncated, narrower ones are zero extended.
pub fn words_to_bytes(words: &[u64], bytes_per_word: usize) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(words.len() * bytes_per_word);
    for &word in words {
        let mut word = word;
        for _ in 0..bytes_per_word {
            bytes.push(word.to_le_bytes()[0]);
            word >>= 8;
        }
    }

    bytes
}

/// Converts `values` of `src_width` bits into values of `dst_width` bits.
///
/// Wide values are split starting at their least significant bits; narrow values are packed
/// starting at the least significant bits. A trailing partially packed value is emitted as is.
///
/// # Panics
///
/// Panics if a width is `0` or larger than 64, if the larger width is not a multiple of the
/// smaller one, or if a value does not fit in `src_width` bits.
pub fn convert_width(values: &[u64], src_width: u32, dst_width: u32) -> Vec<u64> {
    let src_max = unsigned_max(src_width);
    let dst_max = unsigned_max(dst_width);
    assert!(
        values.iter().all(|&value| value <= src_max),
        "values must fit in the source width"
    );

    if src_width > dst_width {
        assert!(src_width.is_multiple_of(dst_width));
        let parts = src_width / dst_width;

        let mut result = Vec::with_capacity(values.len() * u32_to_usize(parts));
        for &value in values {
            for part in 0..parts {
                result.push((value >> (part * dst_width)) & dst_max);
            }
        }
        result
    } else if src_width < dst_width {
        assert!(dst_width.is_multiple_of(src_width));

        let mut result = Vec::new();
        let mut word = 0;
        let mut shift = 0;
        for &value in values {
            word |= value << shift;
            shift += src_width;
            if shift == dst_width {
                result.push(word);
                word = 0;
                shift = 0;
            }
        }
        if shift != 0 {
            result.push(word);
        }
        result
    } else {
        values.to_vec()
    }
}

/// Formats `value` as uppercase hexadecimal with enough digits for `width` bits.
fn format_hex(value: u64, width: u32, prefix: &str) -> String {
    let digits = u32_to_usize(width.div_ceil(4));
    let prefix = prefix
        .replace("{width}", &alloc::format!("{width}"))
        .replace("{value}", &alloc::format!("{value}"));

    alloc::format!("{prefix}{value:0digits$X}")
}

/// Errors that can occur while converting between integer representations.
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq)]
pub enum ConversionError {
    /// The value does not fit in the requested width.
    OutOfRange {
        /// The offending value.
        value: i128,
        /// The requested width in bits.
        width: u32,
        /// Whether a signed representation was requested.
        signed: bool,
    },
}

impl fmt::Display for ConversionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OutOfRange {
                value,
                width,
                signed,
            } => {
                let kind = if *signed { "signed" } else { "unsigned" };
                write!(f, "{value} is not a {kind} {width} bit integer")
            }
        }
    }
}

impl error::Error for ConversionError {}
