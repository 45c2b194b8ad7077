//! Bit width calculations.

/// Returns the number of bits required to represent `value` as an unsigned integer.
///
/// A value of `0` still occupies a single bit.
pub const fn calc_unsigned_width(value: u64) -> u32 {
    u64::BITS - (value | 1).leading_zeros()
}

/// Returns the number of bits required to represent `value` as a two's complement integer,
/// including the sign bit.
pub const fn calc_signed_width(value: i64) -> u32 {
    let magnitude = if value < 0 { !value } else { value };

    // `magnitude` is never negative here, so the sign bit is the only extra bit.
    u64::BITS - magnitude.unsigned_abs().leading_zeros() + 1
}

/// Returns the index of the lowest bit set in `value`.
///
/// Returns `None` if `value` is `0`.
pub const fn calc_lowest_bit_set(value: u64) -> Option<u32> {
    if value == 0 {
        return None;
    }

    Some(value.trailing_zeros())
}

#[cfg(test)]
mod test {
    use super::{calc_lowest_bit_set, calc_signed_width, calc_unsigned_width};

    #[test]
    fn unsigned_width() {
        assert_eq!(calc_unsigned_width(3), 2);
        assert_eq!(calc_unsigned_width(4), 3);
        assert_eq!(calc_unsigned_width(7), 3);
        assert_eq!(calc_unsigned_width(8), 4);
        assert_eq!(calc_unsigned_width(15), 4);
        assert_eq!(calc_unsigned_width(16), 5);
        assert_eq!(calc_unsigned_width(8191), 13);
    }

    #[test]
    fn unsigned_width_extremes() {
        assert_eq!(calc_unsigned_width(0), 1);
        assert_eq!(calc_unsigned_width(1), 1);
        assert_eq!(calc_unsigned_width(u64::MAX), 64);
    }

    #[test]
    fn signed_width() {
        assert_eq!(calc_signed_width(15), 5);
        assert_eq!(calc_signed_width(16), 6);
        assert_eq!(calc_signed_width(8191), 14);
        assert_eq!(calc_signed_width(-7), 4);
        assert_eq!(calc_signed_width(-8), 4);
        assert_eq!(calc_signed_width(-9), 5);
        assert_eq!(calc_signed_width(0), 1);
        assert_eq!(calc_signed_width(i64::MIN), 64);
        assert_eq!(calc_signed_width(i64::MAX), 64);
    }

    #[test]
    fn lowest_bit_set() {
        assert_eq!(calc_lowest_bit_set(0xE0), Some(5));
        assert_eq!(calc_lowest_bit_set(1), Some(0));
        assert_eq!(calc_lowest_bit_set(1 << 63), Some(63));
        assert_eq!(calc_lowest_bit_set(0), None);
    }
}
