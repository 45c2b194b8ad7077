//! Owned, closed address intervals.

use core::{error, fmt};

use numeric::{calc_unsigned_width, convert::u32_to_usize};

use crate::size::Bytes;

/// The widest address space an [`AddressRange`] or [`AddressMap`][am] may be bounded to.
///
/// Bounding the width below 64 bits keeps the size of a whole address space representable.
///
/// [am]: crate::AddressMap
pub const MAX_ADDRWIDTH: u32 = 63;

/// A non-empty, closed interval `[base, end]` of addresses owned by an item.
///
/// Ranges order by [`AddressRange::base()`] first.
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub struct AddressRange<T = ()> {
    /// The first address of the range.
    base: u64,
    /// The number of addresses in the range. Never `0`.
    size: u64,
    /// The owner of the range.
    item: T,
    /// The width of the address space the range lives in.
    addrwidth: Option<u32>,
    /// If `true`, only the bits needed to represent the end address are significant.
    is_sub: bool,
}

impl AddressRange<()> {
    /// Creates an unowned [`AddressRange`] starting at `base` that contains `size` addresses.
    ///
    /// # Errors
    ///
    /// - [`RangeError::Empty`]: `size` is `0`.
    /// - [`RangeError::Overflow`]: the range extends beyond [`u64::MAX`].
    pub fn new(base: u64, size: u64) -> Result<Self, RangeError> {
        Self::with_item((), base, size)
    }
}

impl<T> AddressRange<T> {
    /// Creates an [`AddressRange`] owned by `item` starting at `base` that contains `size`
    /// addresses.
    ///
    /// # Errors
    ///
    /// - [`RangeError::Empty`]: `size` is `0`.
    /// - [`RangeError::Overflow`]: the range extends beyond [`u64::MAX`].
    pub fn with_item(item: T, base: u64, size: u64) -> Result<Self, RangeError> {
        Self::from_parts(item, base, size, None, false)
    }

    /// Constructs and validates an [`AddressRange`] from all of its attributes.
    pub(crate) fn from_parts(
        item: T,
        base: u64,
        size: u64,
        addrwidth: Option<u32>,
        is_sub: bool,
    ) -> Result<Self, RangeError> {
        if size == 0 {
            return Err(RangeError::Empty);
        }

        let Some(end) = base.checked_add(size - 1) else {
            return Err(RangeError::Overflow { base, size });
        };

        if let Some(addrwidth) = addrwidth {
            if addrwidth == 0 || addrwidth > MAX_ADDRWIDTH {
                return Err(RangeError::InvalidWidth(addrwidth));
            }

            if end >> addrwidth != 0 {
                return Err(RangeError::ExceedsWidth {
                    base,
                    size,
                    addrwidth,
                });
            }
        }

        Ok(Self {
            base,
            size,
            item,
            addrwidth,
            is_sub,
        })
    }

    /// Bounds the range to an address space of `addrwidth` bits.
    ///
    /// # Errors
    ///
    /// - [`RangeError::InvalidWidth`]: `addrwidth` is `0` or exceeds [`MAX_ADDRWIDTH`].
    /// - [`RangeError::ExceedsWidth`]: the range does not fit in `addrwidth` bits.
    pub fn with_addrwidth(self, addrwidth: u32) -> Result<Self, RangeError> {
        Self::from_parts(self.item, self.base, self.size, Some(addrwidth), self.is_sub)
    }

    /// Marks the range as a sub-address range.
    pub fn with_sub(mut self, is_sub: bool) -> Self {
        self.is_sub = is_sub;
        self
    }

    /// Returns the first address of the range.
    pub const fn base(&self) -> u64 {
        self.base
    }

    /// Returns the number of addresses in the range.
    pub const fn size(&self) -> u64 {
        self.size
    }

    /// Returns the last address of the range.
    pub const fn end(&self) -> u64 {
        self.base + (self.size - 1)
    }

    /// Returns the first address after the range.
    ///
    /// Returns `None` if the range ends at [`u64::MAX`].
    pub const fn next(&self) -> Option<u64> {
        self.end().checked_add(1)
    }

    /// Returns the owner of the range.
    pub const fn item(&self) -> &T {
        &self.item
    }

    /// Consumes the range, returning its owner.
    pub fn into_item(self) -> T {
        self.item
    }

    /// Returns the width of the address space the range is bounded to.
    pub const fn addrwidth(&self) -> Option<u32> {
        self.addrwidth
    }

    /// Returns `true` if the range is a sub-address range.
    pub const fn is_sub(&self) -> bool {
        self.is_sub
    }

    /// Returns the number of address bits that are significant for this range.
    ///
    /// For sub-address ranges this is the width of the end address, otherwise the width of the
    /// bounding address space.
    pub const fn significant_width(&self) -> Option<u32> {
        if self.is_sub {
            Some(calc_unsigned_width(self.end()))
        } else {
            self.addrwidth
        }
    }

    /// Returns `true` if `address` lies within the range.
    pub const fn contains(&self, address: u64) -> bool {
        self.base <= address && address <= self.end()
    }

    /// Returns `true` if `self` and `other` share at least one address.
    ///
    /// Adjacent ranges do not overlap.
    pub const fn is_overlapping<U>(&self, other: &AddressRange<U>) -> bool {
        self.base <= other.end() && other.base <= self.end()
    }

    /// Replaces the owner of the range.
    pub fn map_item<U>(self, f: impl FnOnce(T) -> U) -> AddressRange<U> {
        AddressRange {
            base: self.base,
            size: self.size,
            item: f(self.item),
            addrwidth: self.addrwidth,
            is_sub: self.is_sub,
        }
    }
}

impl<T: Clone> AddressRange<T> {
    /// Returns the sub-range of `self` shared with `other`, keeping the owner and attributes of
    /// `self`.
    ///
    /// Returns `None` if the ranges do not overlap.
    pub fn intersection<U>(&self, other: &AddressRange<U>) -> Option<Self> {
        if !self.is_overlapping(other) {
            return None;
        }

        let base = self.base.max(other.base);
        let end = self.end().min(other.end());
        Some(self.resized(base, end))
    }

    /// Returns the parts of `self` below and above `other`, keeping the owner and attributes of
    /// `self`.
    ///
    /// The lower part is present if `self` starts before `other`, the upper part if `self` ends
    /// after `other`.
    pub fn difference<U>(&self, other: &AddressRange<U>) -> (Option<Self>, Option<Self>) {
        let lower = (self.base < other.base)
            .then(|| self.resized(self.base, self.end().min(other.base - 1)));
        let upper = (self.end() > other.end())
            .then(|| self.resized(self.base.max(other.end() + 1), self.end()));

        (lower, upper)
    }

    /// Returns a copy of `self` covering `[base, end]`, which must lie within `self`.
    fn resized(&self, base: u64, end: u64) -> Self {
        debug_assert!(self.contains(base) && self.contains(end) && base <= end);

        Self {
            base,
            size: end - base + 1,
            item: self.item.clone(),
            addrwidth: self.addrwidth,
            is_sub: self.is_sub,
        }
    }
}

impl<T> fmt::Display for AddressRange<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let digits = self
            .addrwidth
            .map_or(1, |addrwidth| u32_to_usize(addrwidth.div_ceil(4)));
        write!(f, "0x{:0digits$X} {}", self.base, Bytes(self.size))?;
        if self.is_sub {
            f.write_str(" (sub)")?;
        }

        Ok(())
    }
}

/// Various errors that can occur while constructing an [`AddressRange`].
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq)]
pub enum RangeError {
    /// The range contains no addresses.
    Empty,
    /// The range extends beyond [`u64::MAX`].
    Overflow {
        /// The first address of the range.
        base: u64,
        /// The number of addresses in the range.
        size: u64,
    },
    /// The requested address width is `0` or exceeds [`MAX_ADDRWIDTH`].
    InvalidWidth(u32),
    /// The range does not fit in the address space it is bounded to.
    ExceedsWidth {
        /// The first address of the range.
        base: u64,
        /// The number of addresses in the range.
        size: u64,
        /// The width of the address space.
        addrwidth: u32,
    },
}

impl fmt::Display for RangeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => f.write_str("address range must contain at least one address"),
            Self::Overflow { base, size } => write!(
                f,
                "address range at {base:#X} with size of {} overflows",
                Bytes(*size)
            ),
            Self::InvalidWidth(addrwidth) => write!(
                f,
                "address width {addrwidth} is not within 1..={MAX_ADDRWIDTH}"
            ),
            Self::ExceedsWidth {
                base,
                size,
                addrwidth,
            } => write!(
                f,
                "address range at {base:#X} with size of {} exceeds maximum address range of {:#X}",
                Bytes(*size),
                1u64 << addrwidth
            ),
        }
    }
}

impl error::Error for RangeError {}
