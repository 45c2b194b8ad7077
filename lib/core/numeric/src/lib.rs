//! Integer arithmetic used when laying out hardware address spaces: bit widths, powers,
//! alignment and value conversions.
#![no_std]

extern crate alloc;

pub mod align;
pub mod convert;
pub mod power;
pub mod width;

pub use align::{Align, AlignError, align, align_up, checked_align_up};
pub use power::{
    calc_next_power_of, calc_next_power_of2, calc_prev_power_of, calc_prev_power_of2,
    checked_next_power_of, checked_next_power_of2, is_power_of, is_power_of2,
};
pub use width::{calc_lowest_bit_set, calc_signed_width, calc_unsigned_width};
