//! Allocation of owned address ranges within a bounded address space, and decomposition of
//! arbitrary address windows into power-of-two aligned blocks for address decoders.
#![no_std]

extern crate alloc;

pub mod decode;
pub mod map;
pub mod range;
pub mod size;
pub mod slice;

pub use decode::{
    DEFAULT_DONTCARE, DecodeError, calc_addrwinmasks, iter_aligned_segs, iter_powerof2_segs,
    split_aligned_segs, to_mask,
};
pub use map::{AddressMap, Entries, MapConfig, MapError, Placement};
pub use range::{AddressRange, MAX_ADDRWIDTH, RangeError};
pub use size::{Bytes, ParseSizeError, parse_size};
pub use slice::BitSlice;
