//! Inclusive bit ranges of an address.

use core::fmt;

/// The inclusive range of address bits `[left:right]` an address decoder has to inspect.
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq)]
pub struct BitSlice {
    /// The most significant bit of the slice.
    left: u32,
    /// The least significant bit of the slice.
    right: u32,
}

impl BitSlice {
    /// Creates a [`BitSlice`] covering bits `right` through `left`.
    ///
    /// # Panics
    ///
    /// Panics if `left < right`.
    pub const fn new(left: u32, right: u32) -> Self {
        assert!(left >= right, "bit slice must not be reversed");

        Self { left, right }
    }

    /// Returns the most significant bit of the slice.
    pub const fn left(self) -> u32 {
        self.left
    }

    /// Returns the least significant bit of the slice.
    pub const fn right(self) -> u32 {
        self.right
    }

    /// Returns the number of bits in the slice.
    pub const fn width(self) -> u32 {
        self.left - self.right + 1
    }

    /// Returns a mask with every bit of the slice set.
    pub const fn mask(self) -> u64 {
        (u64::MAX >> (u64::BITS - self.width())) << self.right
    }

    /// Extracts the bits of the slice from `value`, shifted down to bit `0`.
    pub const fn extract(self, value: u64) -> u64 {
        (value & self.mask()) >> self.right
    }
}

impl fmt::Display for BitSlice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.left == self.right {
            write!(f, "{}", self.left)
        } else {
            write!(f, "{}:{}", self.left, self.right)
        }
    }
}
