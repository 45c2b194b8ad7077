//! Cursor alignment.
//!
//! Unlike page alignment, the alignments handled here are not required to be powers of two.

use core::{error, fmt};

/// Parameters controlling how [`align()`] moves a cursor forward.
///
/// Without an offset or an alignment, [`align()`] leaves the cursor untouched.
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq)]
pub struct Align {
    /// Exact position to move to. Dominates `align` and `minalign`.
    offset: Option<u64>,
    /// Requested alignment.
    align: Option<u64>,
    /// Alignment that is always applied, even when `align` is smaller.
    minalign: u64,
    /// If `true`, `offset` may move the cursor backwards.
    rewind: bool,
}

impl Align {
    /// Creates an [`Align`] that does not move the cursor.
    pub const fn new() -> Self {
        Self {
            offset: None,
            align: None,
            minalign: 1,
            rewind: false,
        }
    }

    /// Moves the cursor exactly to `offset`.
    pub const fn with_offset(mut self, offset: u64) -> Self {
        self.offset = Some(offset);
        self
    }

    /// Moves the cursor to the next multiple of `align`.
    pub const fn with_align(mut self, align: u64) -> Self {
        self.align = Some(align);
        self
    }

    /// Moves the cursor to at least the next multiple of `minalign`.
    pub const fn with_minalign(mut self, minalign: u64) -> Self {
        self.minalign = minalign;
        self
    }

    /// Allows an offset to move the cursor backwards.
    pub const fn with_rewind(mut self, rewind: bool) -> Self {
        self.rewind = rewind;
        self
    }

    /// Returns the alignment applied when no offset is given.
    pub const fn effective_alignment(&self) -> u64 {
        match self.align {
            Some(align) if align > self.minalign => align,
            _ => self.minalign,
        }
    }
}

impl Default for Align {
    fn default() -> Self {
        Self::new()
    }
}

/// Forwards `value` as described by `options`.
///
/// If an offset is set, the offset is returned. Otherwise, the result is the smallest multiple of
/// the larger of `align` and `minalign` that is greater than or equal to `value`.
///
/// # Errors
///
/// - [`AlignError::Rewind`]: the offset lies below `value` and rewinding was not permitted.
/// - [`AlignError::ZeroAlignment`]: the effective alignment is `0`.
/// - [`AlignError::Overflow`]: the aligned value does not fit in a `u64`.
pub const fn align(value: u64, options: Align) -> Result<u64, AlignError> {
    if let Some(offset) = options.offset {
        if !options.rewind && value > offset {
            return Err(AlignError::Rewind { value, offset });
        }

        return Ok(offset);
    }

    let alignment = options.effective_alignment();
    if alignment == 0 {
        return Err(AlignError::ZeroAlignment);
    }

    match checked_align_up(value, alignment) {
        Some(aligned) => Ok(aligned),
        None => Err(AlignError::Overflow { value, alignment }),
    }
}

/// Returns the smallest multiple of `alignment` that is greater than or equal to `value`.
///
/// Returns `None` if the operation would overflow.
///
/// # Panics
///
/// Panics if `alignment` is `0`.
pub const fn checked_align_up(value: u64, alignment: u64) -> Option<u64> {
    assert!(alignment != 0, "alignment must not be zero");

    value.checked_next_multiple_of(alignment)
}

/// Returns the smallest multiple of `alignment` that is greater than or equal to `value`.
///
/// # Panics
///
/// Panics if `alignment` is `0` or if the operation would overflow.
pub const fn align_up(value: u64, alignment: u64) -> u64 {
    let Some(aligned) = checked_align_up(value, alignment) else {
        panic!("failed to align value up");
    };

    aligned
}

/// Various errors that can occur while aligning a cursor.
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq)]
pub enum AlignError {
    /// The requested offset lies below the current cursor.
    Rewind {
        /// The current cursor.
        value: u64,
        /// The requested offset.
        offset: u64,
    },
    /// The effective alignment was `0`.
    ZeroAlignment,
    /// Aligning the cursor would overflow a `u64`.
    Overflow {
        /// The current cursor.
        value: u64,
        /// The requested alignment.
        alignment: u64,
    },
}

impl fmt::Display for AlignError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Rewind { value, offset } => {
                write!(f, "cannot use offset {offset} as we are already at {value}")
            }
            Self::ZeroAlignment => f.write_str("alignment must not be zero"),
            Self::Overflow { value, alignment } => {
                write!(f, "aligning {value:#X} to {alignment:#X} overflows")
            }
        }
    }
}

impl error::Error for AlignError {}
