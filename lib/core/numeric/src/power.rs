//! Powers of two and powers of arbitrary bases.
//!
//! `1` is treated as the zeroth power of every base.

/// Returns `true` if `value` is a power of two.
pub const fn is_power_of2(value: u64) -> bool {
    value.is_power_of_two()
}

/// Returns `true` if `value` is a power of `base`.
///
/// # Panics
///
/// Panics if `base` is less than 2.
pub const fn is_power_of(value: u64, base: u64) -> bool {
    assert!(base >= 2, "base must be at least 2");

    if value == 0 {
        return false;
    }

    let mut value = value;
    while value.is_multiple_of(base) {
        value /= base;
    }

    value == 1
}

/// Returns the smallest power of two that is greater than or equal to `value`.
///
/// Returns `None` if the result does not fit in a `u64`.
///
/// # Panics
///
/// Panics if `value` is `0`.
pub const fn checked_next_power_of2(value: u64) -> Option<u64> {
    assert!(value > 0, "value must be positive");

    value.checked_next_power_of_two()
}

/// Returns the smallest power of two that is greater than or equal to `value`.
///
/// # Panics
///
/// Panics if `value` is `0` or if the result does not fit in a `u64`.
pub const fn calc_next_power_of2(value: u64) -> u64 {
    let Some(power) = checked_next_power_of2(value) else {
        panic!("next power of two overflows");
    };

    power
}

/// Returns the largest power of two that is less than or equal to `value`.
///
/// # Panics
///
/// Panics if `value` is `0`.
pub const fn calc_prev_power_of2(value: u64) -> u64 {
    assert!(value > 0, "value must be positive");

    1 << value.ilog2()
}

/// Returns the smallest power of `base` that is greater than or equal to `value`.
///
/// Returns `None` if the result does not fit in a `u64`.
///
/// # Panics
///
/// Panics if `value` is `0` or `base` is less than 2.
pub const fn checked_next_power_of(value: u64, base: u64) -> Option<u64> {
    assert!(value > 0, "value must be positive");
    assert!(base >= 2, "base must be at least 2");

    let mut power = 1u64;
    while power < value {
        let Some(next) = power.checked_mul(base) else {
            return None;
        };
        power = next;
    }

    Some(power)
}

/// Returns the smallest power of `base` that is greater than or equal to `value`.
///
/// # Panics
///
/// Panics if `value` is `0`, `base` is less than 2 or the result does not fit in a `u64`.
pub const fn calc_next_power_of(value: u64, base: u64) -> u64 {
    let Some(power) = checked_next_power_of(value, base) else {
        panic!("next power overflows");
    };

    power
}

/// Returns the largest power of `base` that is less than or equal to `value`.
///
/// # Panics
///
/// Panics if `value` is `0` or `base` is less than 2.
pub const fn calc_prev_power_of(value: u64, base: u64) -> u64 {
    assert!(value > 0, "value must be positive");
    assert!(base >= 2, "base must be at least 2");

    let mut power = 1u64;
    loop {
        match power.checked_mul(base) {
            Some(next) if next <= value => power = next,
            _ => return power,
        }
    }
}
