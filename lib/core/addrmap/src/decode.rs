//! Dyadic decomposition of address windows.
//!
//! An arbitrary window `[base, base + size - 1]` is split into blocks whose sizes are powers of
//! two. [`iter_powerof2_segs()`] produces self-aligned blocks, which can be expressed as address
//! decoder masks with trailing don't-care bits. [`iter_aligned_segs()`] produces the fewest
//! segments whose bases are aligned to the next power of two of their sizes.

use alloc::{string::String, vec, vec::Vec};
use core::{error, fmt, iter::FusedIterator};

use crate::range::AddressRange;

/// The character used for don't-care bits unless another one is requested.
pub const DEFAULT_DONTCARE: char = '?';

/// Returns the `addrwidth` digit binary representation of `base`, with the lowest `exp` digits
/// replaced by `dontcare`.
///
/// ```
/// assert_eq!(addrmap::to_mask(8, 0xA0, 4, '?'), "1010????");
/// ```
///
/// # Panics
///
/// Panics if `addrwidth` exceeds 64 bits, if `exp` exceeds `addrwidth` or if any of the lowest
/// `exp` bits of `base` is set.
pub fn to_mask(addrwidth: u32, base: u64, exp: u32, dontcare: char) -> String {
    assert!(addrwidth <= u64::BITS, "mask wider than 64 bits");
    assert!(exp <= addrwidth, "block wider than the mask");
    assert!(
        exp == 0 || base.trailing_zeros() >= exp,
        "block base {base:#X} is not aligned to 2^{exp}"
    );

    (0..addrwidth)
        .rev()
        .map(|bit| {
            if bit < exp {
                dontcare
            } else if (base >> bit) & 1 == 1 {
                '1'
            } else {
                '0'
            }
        })
        .collect()
}

/// Returns one address decoder mask per block of the dyadic decomposition of the window of
/// `size` addresses starting at `base`.
///
/// ```
/// let masks = addrmap::calc_addrwinmasks(0xF000, 0x180, 16, 'x').unwrap();
/// assert_eq!(masks, ["11110000xxxxxxxx", "111100010xxxxxxx"]);
/// ```
///
/// # Errors
///
/// - [`DecodeError::Empty`]: `size` is `0`.
/// - [`DecodeError::Overflow`]: the window extends beyond [`u64::MAX`].
/// - [`DecodeError::InvalidWidth`]: `addrwidth` is `0` or exceeds 64 bits.
/// - [`DecodeError::ExceedsWidth`]: the window does not fit in `addrwidth` bits.
pub fn calc_addrwinmasks(
    base: u64,
    size: u64,
    addrwidth: u32,
    dontcare: char,
) -> Result<Vec<String>, DecodeError> {
    if addrwidth == 0 || addrwidth > u64::BITS {
        return Err(DecodeError::InvalidWidth(addrwidth));
    }

    let end = window_end(base, size)?;
    if addrwidth < u64::BITS && end >> addrwidth != 0 {
        return Err(DecodeError::ExceedsWidth { end, addrwidth });
    }

    let masks = iter_powerof2_segs(base, size)?
        .map(|(block, exp)| to_mask(addrwidth, block, exp, dontcare))
        .collect();
    Ok(masks)
}

/// Returns an [`Iterator`] over the self-aligned power of two blocks that exactly cover the
/// window of `size` addresses starting at `base`.
///
/// Blocks are yielded as `(block_base, exp)` in ascending address order, where each block
/// contains `2^exp` addresses and `block_base` is a multiple of `2^exp`.
///
/// # Errors
///
/// - [`DecodeError::Empty`]: `size` is `0`.
/// - [`DecodeError::Overflow`]: the window extends beyond [`u64::MAX`].
pub fn iter_powerof2_segs(base: u64, size: u64) -> Result<PowerOf2Segments, DecodeError> {
    let end = window_end(base, size)?;

    Ok(PowerOf2Segments {
        steps: Worklist::new(base, end),
    })
}

/// Returns an [`Iterator`] over segments that exactly cover the window of `size` addresses
/// starting at `base`.
///
/// Each segment's base is a multiple of the next power of two of its size. Segments are yielded
/// in ascending address order.
///
/// # Errors
///
/// - [`DecodeError::Empty`]: `size` is `0`.
/// - [`DecodeError::Overflow`]: the window extends beyond [`u64::MAX`].
pub fn iter_aligned_segs(base: u64, size: u64) -> Result<AlignedSegments, DecodeError> {
    let end = window_end(base, size)?;

    Ok(AlignedSegments {
        steps: Worklist::new(base, end),
    })
}

/// Collects [`iter_aligned_segs()`] into a [`Vec`].
///
/// ```
/// let segments = addrmap::split_aligned_segs(1024, 1792).unwrap();
/// let segments: Vec<_> = segments.iter().map(|s| (s.base(), s.size())).collect();
/// assert_eq!(segments, [(0x400, 0x400), (0x800, 0x300)]);
/// ```
///
/// # Errors
///
/// - [`DecodeError::Empty`]: `size` is `0`.
/// - [`DecodeError::Overflow`]: the window extends beyond [`u64::MAX`].
pub fn split_aligned_segs(base: u64, size: u64) -> Result<Vec<AddressRange>, DecodeError> {
    iter_aligned_segs(base, size).map(Iterator::collect)
}

/// Returns the last address of the window, validating it along the way.
fn window_end(base: u64, size: u64) -> Result<u64, DecodeError> {
    if size == 0 {
        return Err(DecodeError::Empty);
    }

    base.checked_add(size - 1)
        .ok_or(DecodeError::Overflow { base, size })
}

/// An [`Iterator`] over the dyadic decomposition of an address window.
///
/// Created by [`iter_powerof2_segs()`].
#[derive(Clone, Debug)]
pub struct PowerOf2Segments {
    /// Pending decomposition steps.
    steps: Worklist,
}

impl Iterator for PowerOf2Segments {
    type Item = (u64, u32);

    fn next(&mut self) -> Option<Self::Item> {
        let (base, size) = self.steps.next_block(largest_block)?;
        let exp = size.trailing_zeros();

        log::trace!("decoder block {base:#X} of 2^{exp}");
        Some((base, exp))
    }
}

impl FusedIterator for PowerOf2Segments {}

/// An [`Iterator`] over the aligned segments of an address window.
///
/// Created by [`iter_aligned_segs()`].
#[derive(Clone, Debug)]
pub struct AlignedSegments {
    /// Pending decomposition steps.
    steps: Worklist,
}

impl Iterator for AlignedSegments {
    type Item = AddressRange;

    fn next(&mut self) -> Option<Self::Item> {
        let (base, size) = self.steps.next_block(aligned_block)?;

        log::trace!("aligned segment {base:#X} of {size:#X}");
        AddressRange::new(base, size).ok()
    }
}

impl FusedIterator for AlignedSegments {}

/// A step of a decomposition.
#[derive(Clone, Copy, Debug)]
enum Step {
    /// Decompose the inclusive window `[base, end]`.
    Split {
        /// First address of the window.
        base: u128,
        /// Last address of the window.
        end: u128,
    },
    /// Yield a block.
    Emit {
        /// First address of the block.
        base: u128,
        /// Number of addresses in the block.
        size: u128,
    },
}

/// Explicit stack of decomposition steps, ordered so the lowest addresses are popped first.
///
/// Arithmetic happens in `u128` so that blocks ending at [`u64::MAX`] need no special casing.
#[derive(Clone, Debug)]
struct Worklist(Vec<Step>);

impl Worklist {
    /// Creates a [`Worklist`] decomposing `[base, end]`.
    fn new(base: u64, end: u64) -> Self {
        Self(vec![Step::Split {
            base: u128::from(base),
            end: u128::from(end),
        }])
    }

    /// Returns the next block in address order, choosing blocks within a window with `choose`.
    ///
    /// `choose` receives a window `[base, end]` and returns a block `(base, size)` inside it.
    #[expect(clippy::cast_possible_truncation)]
    fn next_block(&mut self, choose: fn(u128, u128) -> (u128, u128)) -> Option<(u64, u64)> {
        loop {
            match self.0.pop()? {
                Step::Emit { base, size } => return Some((base as u64, size as u64)),
                Step::Split { base, end } => {
                    let (block_base, block_size) = choose(base, end);
                    let block_end = block_base + block_size - 1;

                    if block_end < end {
                        self.0.push(Step::Split {
                            base: block_end + 1,
                            end,
                        });
                    }
                    self.0.push(Step::Emit {
                        base: block_base,
                        size: block_size,
                    });
                    if base < block_base {
                        self.0.push(Step::Split {
                            base,
                            end: block_base - 1,
                        });
                    }
                }
            }
        }
    }
}

/// Returns the largest self-aligned power of two block within `[base, end]`.
///
/// Falls back to the single address at `base`.
fn largest_block(base: u128, end: u128) -> (u128, u128) {
    let size = end - base + 1;
    let bit_length = u128::BITS - size.leading_zeros();

    for exp in (1..bit_length).rev() {
        let block_size = 1u128 << exp;
        let block_base = base.next_multiple_of(block_size);
        if block_base + block_size - 1 <= end {
            return (block_base, block_size);
        }
    }

    (base, 1)
}

/// Returns the largest block within `[base, end]` whose base is aligned to the next power of two
/// of its size.
fn aligned_block(base: u128, end: u128) -> (u128, u128) {
    let mut size = end - base + 1;
    let mut window = size.next_power_of_two();
    let mut block_base = base.next_multiple_of(window);

    while block_base + size - 1 > end {
        window /= 2;
        size = window;
        block_base = base.next_multiple_of(window);
    }

    (block_base, size)
}

/// Various errors that can occur while decomposing an address window.
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq)]
pub enum DecodeError {
    /// The window contains no addresses.
    Empty,
    /// The window extends beyond [`u64::MAX`].
    Overflow {
        /// The first address of the window.
        base: u64,
        /// The number of addresses in the window.
        size: u64,
    },
    /// The requested address width is `0` or exceeds 64 bits.
    InvalidWidth(u32),
    /// The window does not fit in the address width.
    ExceedsWidth {
        /// The last address of the window.
        end: u64,
        /// The requested address width.
        addrwidth: u32,
    },
}

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => f.write_str("address window must contain at least one address"),
            Self::Overflow { base, size } => {
                write!(f, "address window at {base:#X} with size {size:#X} overflows")
            }
            Self::InvalidWidth(addrwidth) => {
                write!(f, "address width {addrwidth} is not within 1..=64")
            }
            Self::ExceedsWidth { end, addrwidth } => {
                write!(f, "address {end:#X} does not fit in {addrwidth} bits")
            }
        }
    }
}

impl error::Error for DecodeError {}
