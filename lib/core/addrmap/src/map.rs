//! Ordered collections of owned address ranges.
//!
//! An [`AddressMap`] keeps its [`AddressRange`]s sorted by base address and, unless configured
//! otherwise, guarantees that no two of them overlap. Every mutating operation either succeeds
//! completely or leaves the map untouched.

use alloc::{borrow::Cow, vec::Vec};
use core::{error, fmt, mem, slice};

use numeric::{Align, AlignError, align, calc_lowest_bit_set, calc_unsigned_width};

use crate::{
    range::{AddressRange, MAX_ADDRWIDTH, RangeError},
    size::Bytes,
    slice::BitSlice,
};

/// The attributes of an [`AddressMap`], fixed at construction.
#[derive(Clone, Copy, Debug, Default, Hash, PartialEq, Eq)]
pub struct MapConfig {
    /// The width of the address space, if bounded.
    addrwidth: Option<u32>,
    /// Default sub-address attribute of new ranges.
    is_sub: bool,
    /// If `true`, ranges may overlap.
    allow_overlapping: bool,
}

impl MapConfig {
    /// Creates a [`MapConfig`] for an unbounded map of non-overlapping ranges.
    pub const fn new() -> Self {
        Self {
            addrwidth: None,
            is_sub: false,
            allow_overlapping: false,
        }
    }

    /// Bounds the address space to `addrwidth` bits.
    ///
    /// # Panics
    ///
    /// Panics if `addrwidth` is `0` or exceeds [`MAX_ADDRWIDTH`].
    pub const fn with_addrwidth(mut self, addrwidth: u32) -> Self {
        assert!(
            addrwidth != 0 && addrwidth <= MAX_ADDRWIDTH,
            "unsupported address width"
        );

        self.addrwidth = Some(addrwidth);
        self
    }

    /// Marks new ranges as sub-address ranges unless a [`Placement`] says otherwise.
    pub const fn with_sub(mut self, is_sub: bool) -> Self {
        self.is_sub = is_sub;
        self
    }

    /// Permits ranges to overlap.
    pub const fn allow_overlapping(mut self, allow_overlapping: bool) -> Self {
        self.allow_overlapping = allow_overlapping;
        self
    }

    /// Returns the width of the address space, if bounded.
    pub const fn addrwidth(&self) -> Option<u32> {
        self.addrwidth
    }

    /// Returns the default sub-address attribute of new ranges.
    pub const fn is_sub(&self) -> bool {
        self.is_sub
    }

    /// Returns `true` if ranges may overlap.
    pub const fn allows_overlapping(&self) -> bool {
        self.allow_overlapping
    }
}

/// Where [`AddressMap::add()`] places a new range.
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq)]
pub struct Placement {
    /// Explicit base address. Searched for if `None`.
    base: Option<u64>,
    /// Number of addresses in the range.
    size: u64,
    /// Alignment of the base address.
    align: Option<u64>,
    /// Overrides the map's sub-address attribute.
    is_sub: Option<bool>,
    /// Where the search for a free base address starts.
    search_from: Option<u64>,
}

impl Placement {
    /// Places `size` addresses at the first free base address behind the last range.
    pub const fn new(size: u64) -> Self {
        Self {
            base: None,
            size,
            align: None,
            is_sub: None,
            search_from: None,
        }
    }

    /// Places `size` addresses at `base`.
    pub const fn at(base: u64, size: u64) -> Self {
        let mut placement = Self::new(size);
        placement.base = Some(base);
        placement
    }

    /// Aligns the base address to a multiple of `align`.
    pub const fn with_align(mut self, align: u64) -> Self {
        self.align = Some(align);
        self
    }

    /// Overrides the map's sub-address attribute for this range.
    pub const fn with_sub(mut self, is_sub: bool) -> Self {
        self.is_sub = Some(is_sub);
        self
    }

    /// Searches for the first gap at or after `start` instead of placing the range behind the
    /// last one. Ignored if an explicit base address is given.
    pub const fn search_from(mut self, start: u64) -> Self {
        self.search_from = Some(start);
        self
    }

    /// Returns the number of addresses to place.
    pub const fn size(&self) -> u64 {
        self.size
    }
}

impl Default for Placement {
    fn default() -> Self {
        Self::new(1)
    }
}

/// An ordered collection of [`AddressRange`]s within a possibly bounded address space.
#[derive(Clone, Debug, Hash, PartialEq, Eq)]
pub struct AddressMap<T> {
    /// Attributes of the map.
    config: MapConfig,
    /// Ranges sorted by base address.
    ranges: Vec<AddressRange<T>>,
}

impl<T> AddressMap<T> {
    /// Creates an empty, unbounded [`AddressMap`] of non-overlapping ranges.
    pub const fn new() -> Self {
        Self::with_config(MapConfig::new())
    }

    /// Creates an empty [`AddressMap`] with the provided attributes.
    pub const fn with_config(config: MapConfig) -> Self {
        Self {
            config,
            ranges: Vec::new(),
        }
    }

    /// Returns the attributes of the map.
    pub const fn config(&self) -> MapConfig {
        self.config
    }

    /// Returns the width of the address space, if bounded.
    pub const fn addrwidth(&self) -> Option<u32> {
        self.config.addrwidth
    }

    /// Returns the number of ranges in the map.
    pub fn len(&self) -> usize {
        self.ranges.len()
    }

    /// Returns `true` if the map contains no ranges.
    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }

    /// Returns an [`Iterator`] over the ranges in ascending base order.
    pub fn iter(&self) -> slice::Iter<'_, AddressRange<T>> {
        self.ranges.iter()
    }

    /// Returns the first range, in ascending base order, that contains `address`.
    pub fn lookup(&self, address: u64) -> Option<&AddressRange<T>> {
        let candidates = self.ranges.partition_point(|range| range.base() <= address);
        self.ranges[..candidates]
            .iter()
            .find(|range| range.contains(address))
    }

    /// Returns the base address of the first range.
    pub fn firstaddr(&self) -> Option<u64> {
        self.ranges.first().map(AddressRange::base)
    }

    /// Returns the end address of the last range.
    pub fn lastaddr(&self) -> Option<u64> {
        self.ranges.last().map(AddressRange::end)
    }

    /// Returns the span from [`AddressMap::firstaddr()`] through [`AddressMap::lastaddr()`].
    ///
    /// Gaps between ranges count towards the span. A span covering all of `u64` saturates at
    /// [`u64::MAX`].
    pub fn addrspace(&self) -> Option<u64> {
        let span = self.lastaddr()? - self.firstaddr()?;
        Some(span.saturating_add(1))
    }

    /// Returns the configured address width, or the width needed to represent
    /// [`AddressMap::lastaddr()`].
    pub fn eff_addrwidth(&self) -> Option<u32> {
        self.config
            .addrwidth
            .or_else(|| self.lastaddr().map(calc_unsigned_width))
    }

    /// Returns the lowest address bit a decoder has to inspect to tell the ranges apart.
    pub fn decode_lsb(&self) -> Option<u32> {
        let smallest = self.ranges.iter().map(AddressRange::size).min()?;
        calc_lowest_bit_set(smallest)
    }

    /// Returns the highest address bit a decoder has to inspect to tell the ranges apart.
    pub fn decode_msb(&self) -> Option<u32> {
        self.eff_addrwidth().map(|addrwidth| addrwidth - 1)
    }

    /// Returns the bits `[decode_msb:decode_lsb]` a decoder has to inspect.
    ///
    /// Returns `None` for an empty map, or if the smallest range covers the whole effective
    /// address space and no bit has to be inspected.
    pub fn decode_slice(&self) -> Option<BitSlice> {
        let (msb, lsb) = (self.decode_msb()?, self.decode_lsb()?);
        (msb >= lsb).then(|| BitSlice::new(msb, lsb))
    }

    /// Returns `true` if the ranges add up to exactly the effective address space.
    ///
    /// Returns `None` for an empty map.
    pub fn is_full(&self) -> Option<bool> {
        if self.ranges.is_empty() {
            return None;
        }

        let used: u128 = self
            .ranges
            .iter()
            .map(|range| u128::from(range.size()))
            .sum();
        let addrspace = 1u128 << self.eff_addrwidth()?;
        Some(used == addrspace)
    }

    /// Returns a base address for a new range of `size` addresses.
    ///
    /// The base is aligned to `align`, or to `size` if no alignment is given. Without `start`, the
    /// base follows the last range. With `start`, the first gap at or after `start` that fits
    /// `size` addresses is chosen.
    ///
    /// # Errors
    ///
    /// - [`MapError::InvalidRange`]: `size` is `0`.
    /// - [`MapError::Align`]: `align` is `0`.
    /// - [`MapError::CapacityExceeded`]: no base address within the address space fits.
    pub fn get_free_baseaddr(
        &self,
        size: u64,
        align: Option<u64>,
        start: Option<u64>,
    ) -> Result<u64, MapError<T>> {
        if size == 0 {
            return Err(MapError::InvalidRange(RangeError::Empty));
        }
        if align == Some(0) {
            return Err(MapError::Align(AlignError::ZeroAlignment));
        }

        let alignment = align.unwrap_or(size);
        let base = match start {
            Some(start) => self.find_space(size, alignment, start)?,
            None => {
                let cursor = match self.ranges.last() {
                    Some(last) => last
                        .next()
                        .ok_or_else(|| self.capacity_exceeded(last.end(), size))?,
                    None => 0,
                };
                self.align_to(cursor, alignment, size)?
            }
        };

        self.check_end(base, size)?;
        log::debug!("free base address for {} found at {base:#X}", Bytes(size));
        Ok(base)
    }

    /// Returns the first aligned base address at or after `start` whose `size` addresses are not
    /// occupied.
    fn find_space(&self, size: u64, alignment: u64, start: u64) -> Result<u64, MapError<T>> {
        let start = self.align_to(start, alignment, size)?;

        let mut base = start;
        for range in &self.ranges {
            if range.end() < start {
                continue;
            }

            if u128::from(range.base()) >= u128::from(base) + u128::from(size) {
                break;
            }

            let Some(next) = range.next() else {
                return Err(self.capacity_exceeded(base, size));
            };
            base = base.max(self.align_to(next, alignment, size)?);
        }

        Ok(base)
    }

    /// Aligns `value` up to a multiple of `alignment`.
    fn align_to(&self, value: u64, alignment: u64, size: u64) -> Result<u64, MapError<T>> {
        align(value, Align::new().with_align(alignment)).map_err(|error| match error {
            AlignError::Overflow { value, .. } => self.capacity_exceeded(value, size),
            error => MapError::Align(error),
        })
    }

    /// Verifies that `size` addresses starting at `base` fit into the address space.
    fn check_end(&self, base: u64, size: u64) -> Result<(), MapError<T>> {
        let addrspace = 1u128 << self.config.addrwidth.unwrap_or(u64::BITS);
        if u128::from(base) + u128::from(size) > addrspace {
            return Err(self.capacity_exceeded(base, size));
        }

        Ok(())
    }

    /// Constructs a [`MapError::CapacityExceeded`] for this map.
    fn capacity_exceeded(&self, base: u64, size: u64) -> MapError<T> {
        MapError::CapacityExceeded {
            base,
            size,
            addrwidth: self.config.addrwidth.unwrap_or(u64::BITS),
        }
    }
}

impl<T: Clone> AddressMap<T> {
    /// Adds a range owned by `item` as described by `placement`, returning the new range.
    ///
    /// ```
    /// use addrmap::{AddressMap, Placement};
    ///
    /// let mut map = AddressMap::new();
    /// let a = map.add("A", Placement::new(0x400)).unwrap();
    /// let b = map.add("B", Placement::at(0x4500, 0x1000).with_align(0x1000)).unwrap();
    /// assert_eq!((a.base(), b.base()), (0x0, 0x5000));
    /// ```
    ///
    /// # Errors
    ///
    /// - [`MapError::Conflict`]: the new range overlaps an existing one.
    /// - [`MapError::CapacityExceeded`]: the new range does not fit into the address space.
    /// - [`MapError::InvalidRange`]: the size of the new range is `0`.
    /// - [`MapError::Align`]: the requested alignment is `0`.
    pub fn add(&mut self, item: T, placement: Placement) -> Result<AddressRange<T>, MapError<T>> {
        let size = placement.size;
        if placement.align == Some(0) {
            return Err(MapError::Align(AlignError::ZeroAlignment));
        }

        let base = match placement.base {
            Some(base) => base,
            None => self.get_free_baseaddr(size, placement.align, placement.search_from)?,
        };
        let base = match placement.align {
            Some(alignment) => self.align_to(base, alignment, size)?,
            None => base,
        };

        let is_sub = placement.is_sub.unwrap_or(self.config.is_sub);
        let range = AddressRange::from_parts(item, base, size, self.config.addrwidth, is_sub)?;
        self.insert(range.clone())?;
        Ok(range)
    }

    /// Adds copies of `ranges`, checking each one like [`AddressMap::add()`].
    ///
    /// Nothing is added if any of the ranges is rejected.
    ///
    /// # Errors
    ///
    /// - [`MapError::Conflict`]: a range overlaps an existing one.
    /// - [`MapError::CapacityExceeded`]: a range does not fit into the address space.
    pub fn copy_ranges<I>(&mut self, ranges: I) -> Result<(), MapError<T>>
    where
        I: IntoIterator<Item = AddressRange<T>>,
    {
        let mut staged = self.clone();
        for range in ranges {
            staged.insert(range)?;
        }

        *self = staged;
        Ok(())
    }

    /// Inserts `range` at its sorted position.
    fn insert(&mut self, range: AddressRange<T>) -> Result<(), MapError<T>> {
        if let Some(addrwidth) = self.config.addrwidth
            && range.end() >> addrwidth != 0
        {
            return Err(MapError::CapacityExceeded {
                base: range.base(),
                size: range.size(),
                addrwidth,
            });
        }

        let position = self
            .ranges
            .partition_point(|existing| existing.base() <= range.base());

        if !self.config.allow_overlapping {
            let lower = position.checked_sub(1).and_then(|index| self.ranges.get(index));
            let upper = self.ranges.get(position);
            if let Some(existing) = [lower, upper]
                .into_iter()
                .flatten()
                .find(|existing| existing.is_overlapping(&range))
            {
                return Err(MapError::Conflict {
                    range,
                    existing: existing.clone(),
                });
            }
        }

        log::trace!("inserting {range} at position {position}");
        self.ranges.insert(position, range);
        Ok(())
    }

    /// Removes the window of `size` addresses starting at `base` from the map.
    ///
    /// Ranges partially outside the window keep their outside parts. The parts inside the window
    /// are returned, in ascending base order, as a new map with the same attributes.
    ///
    /// # Errors
    ///
    /// - [`MapError::InvalidRange`]: the window is empty or extends beyond [`u64::MAX`].
    pub fn cut(&mut self, base: u64, size: u64) -> Result<AddressMap<T>, MapError<T>> {
        let window = AddressRange::new(base, size).map_err(MapError::InvalidRange)?;

        let mut kept = Vec::with_capacity(self.ranges.len() + 1);
        let mut cuts = Vec::new();
        for range in mem::take(&mut self.ranges) {
            if !range.is_overlapping(&window) {
                kept.push(range);
                continue;
            }

            log::trace!("removing {range}");
            let (lower, upper) = range.difference(&window);
            kept.extend(lower);
            kept.extend(upper);
            cuts.extend(range.intersection(&window));
        }

        kept.sort_by_key(AddressRange::base);
        self.ranges = kept;

        log::debug!("cut {window}: {} ranges affected", cuts.len());
        Ok(Self {
            config: self.config,
            ranges: cuts,
        })
    }

    /// Returns a map holding copies of all ranges overlapping the window of `size` addresses
    /// starting at `base`.
    ///
    /// # Errors
    ///
    /// - [`MapError::InvalidRange`]: the window is empty or extends beyond [`u64::MAX`].
    pub fn matching(&self, base: u64, size: u64) -> Result<AddressMap<T>, MapError<T>> {
        let window = AddressRange::new(base, size).map_err(MapError::InvalidRange)?;
        Ok(self.matching_range(&window))
    }

    /// Returns a map holding copies of all ranges overlapping `window`.
    pub fn matching_range<U>(&self, window: &AddressRange<U>) -> AddressMap<T> {
        self.filtered(|range| range.is_overlapping(window))
    }

    /// Returns an [`Iterator`] over the ranges in ascending base order.
    ///
    /// With a `default` item, gaps before, between and after the ranges are filled with ranges
    /// owned by `default`, so that the whole effective address space is covered.
    pub fn get(&self, default: Option<T>) -> Entries<'_, T> {
        let filler = default.map(|item| Filler {
            item,
            addrwidth: self.config.addrwidth,
            cursor: 0,
            limit: self.eff_addrwidth().map(|addrwidth| 1u128 << addrwidth),
        });

        Entries {
            ranges: self.ranges.iter(),
            filler,
            pending: None,
        }
    }

    /// Returns a map with the same attributes holding copies of the ranges matching `predicate`.
    fn filtered(&self, predicate: impl Fn(&AddressRange<T>) -> bool) -> AddressMap<T> {
        Self {
            config: self.config,
            ranges: self
                .ranges
                .iter()
                .filter(|range| predicate(range))
                .cloned()
                .collect(),
        }
    }
}

impl<T: Clone + PartialEq> AddressMap<T> {
    /// Returns a map holding copies of all ranges owned by `item`.
    pub fn find(&self, item: &T) -> AddressMap<T> {
        self.filtered(|range| range.item() == item)
    }
}

impl<T> Default for AddressMap<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a, T> IntoIterator for &'a AddressMap<T> {
    type Item = &'a AddressRange<T>;
    type IntoIter = slice::Iter<'a, AddressRange<T>>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// An [`Iterator`] over the ranges of an [`AddressMap`], optionally interleaved with fillers.
///
/// Created by [`AddressMap::get()`].
#[derive(Clone, Debug)]
pub struct Entries<'a, T> {
    /// Ranges not yet visited.
    ranges: slice::Iter<'a, AddressRange<T>>,
    /// Gap filling state, if requested.
    filler: Option<Filler<T>>,
    /// Range to yield after the filler preceding it.
    pending: Option<&'a AddressRange<T>>,
}

/// Gap filling state of [`Entries`].
#[derive(Clone, Debug)]
struct Filler<T> {
    /// Owner of the fillers.
    item: T,
    /// Address width of the fillers.
    addrwidth: Option<u32>,
    /// First address not covered by a yielded range.
    cursor: u128,
    /// End of the address space. Taken once the trailing gap has been handled.
    limit: Option<u128>,
}

impl<T: Clone> Filler<T> {
    /// Returns a filler covering the gap from the cursor up to `end` exclusive.
    fn gap(&self, end: u128) -> Option<AddressRange<T>> {
        if self.cursor >= end {
            return None;
        }

        let base = u64::try_from(self.cursor).ok()?;
        let size = u64::try_from(end - self.cursor).ok()?;
        AddressRange::from_parts(self.item.clone(), base, size, self.addrwidth, false).ok()
    }

    /// Moves the cursor past `range`, never backwards.
    fn advance(&mut self, range: &AddressRange<T>) {
        self.cursor = self.cursor.max(u128::from(range.end()) + 1);
    }
}

impl<'a, T: Clone> Iterator for Entries<'a, T> {
    type Item = Cow<'a, AddressRange<T>>;

    fn next(&mut self) -> Option<Self::Item> {
        let Some(filler) = &mut self.filler else {
            return self.ranges.next().map(Cow::Borrowed);
        };

        if let Some(range) = self.pending.take() {
            filler.advance(range);
            return Some(Cow::Borrowed(range));
        }

        let Some(range) = self.ranges.next() else {
            let limit = filler.limit.take()?;
            let gap = filler.gap(limit)?;
            filler.cursor = limit;
            return Some(Cow::Owned(gap));
        };

        if let Some(gap) = filler.gap(u128::from(range.base())) {
            filler.cursor = u128::from(range.base());
            self.pending = Some(range);
            return Some(Cow::Owned(gap));
        }

        filler.advance(range);
        Some(Cow::Borrowed(range))
    }
}

/// Various errors that can occur while modifying an [`AddressMap`].
#[derive(Clone, Debug, Hash, PartialEq, Eq)]
pub enum MapError<T> {
    /// The new range overlaps an existing one.
    Conflict {
        /// The rejected range.
        range: AddressRange<T>,
        /// The existing range it overlaps.
        existing: AddressRange<T>,
    },
    /// The range does not fit into the address space.
    CapacityExceeded {
        /// The base address of the range.
        base: u64,
        /// The number of addresses in the range.
        size: u64,
        /// The width of the address space.
        addrwidth: u32,
    },
    /// The range itself is malformed.
    InvalidRange(RangeError),
    /// The requested alignment is unusable.
    Align(AlignError),
}

impl<T> From<RangeError> for MapError<T> {
    fn from(error: RangeError) -> Self {
        match error {
            RangeError::ExceedsWidth {
                base,
                size,
                addrwidth,
            } => Self::CapacityExceeded {
                base,
                size,
                addrwidth,
            },
            error => Self::InvalidRange(error),
        }
    }
}

impl<T> From<AlignError> for MapError<T> {
    fn from(error: AlignError) -> Self {
        Self::Align(error)
    }
}

impl<T: fmt::Debug> fmt::Display for MapError<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Conflict { range, existing } => write!(
                f,
                "{:?} at {range}: overlaps with {:?} at {existing}.",
                range.item(),
                existing.item()
            ),
            Self::CapacityExceeded {
                base,
                size,
                addrwidth,
            } if *addrwidth < u64::BITS => write!(
                f,
                "no space left in address map ({}) for new range at {base:#X} with size of {}",
                Bytes(1 << addrwidth),
                Bytes(*size)
            ),
            Self::CapacityExceeded { base, size, .. } => write!(
                f,
                "no space left in address map for new range at {base:#X} with size of {}",
                Bytes(*size)
            ),
            Self::InvalidRange(error) => write!(f, "invalid address range: {error}"),
            Self::Align(error) => write!(f, "invalid alignment: {error}"),
        }
    }
}

impl<T: fmt::Debug> error::Error for MapError<T> {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        match self {
            Self::InvalidRange(error) => Some(error),
            Self::Align(error) => Some(error),
            _ => None,
        }
    }
}

#[cfg(test)]
mod test {
    use alloc::{string::ToString, vec, vec::Vec};

    use numeric::AlignError;

    use super::{AddressMap, MapConfig, MapError, Placement};
    use crate::{range::AddressRange, slice::BitSlice};

    /// Returns `(item, base, size)` for every range yielded by `ranges`.
    fn layout<'a, I, R>(ranges: I) -> Vec<(&'a str, u64, u64)>
    where
        I: IntoIterator<Item = R>,
        R: core::ops::Deref<Target = AddressRange<&'a str>>,
    {
        ranges
            .into_iter()
            .map(|range| (*range.item(), range.base(), range.size()))
            .collect()
    }

    /// Four adjacent 4 KB ranges starting at `0x0`.
    fn four_blocks() -> AddressMap<&'static str> {
        let mut map = AddressMap::new();
        for (index, item) in ["A", "B", "C", "D"].into_iter().enumerate() {
            map.add(item, Placement::at(index as u64 * 0x1000, 0x1000))
                .unwrap();
        }
        map
    }

    /// The map used by the gap filling examples.
    fn sparse_map() -> AddressMap<&'static str> {
        let mut map = AddressMap::new();
        map.add("T", Placement::new(0x400)).unwrap();
        map.add("A", Placement::at(0x5000, 0x1000)).unwrap();
        map.add("B", Placement::at(0x2000, 0x1000)).unwrap();
        map.add("C", Placement::at(0xD000, 0x800)).unwrap();
        map
    }

    #[test]
    fn sorted_by_base() {
        let map = sparse_map();
        assert_eq!(
            layout(&map),
            [
                ("T", 0x0, 0x400),
                ("B", 0x2000, 0x1000),
                ("A", 0x5000, 0x1000),
                ("C", 0xD000, 0x800)
            ]
        );
    }

    #[test]
    fn conflict() {
        let mut map = sparse_map();
        let error = map.add("D", Placement::at(0x2000, 0x400)).unwrap_err();
        let MapError::Conflict { range, existing } = &error else {
            panic!("expected a conflict, got {error:?}");
        };
        assert_eq!(*range.item(), "D");
        assert_eq!(*existing.item(), "B");
        assert_eq!(
            error.to_string(),
            "\"D\" at 0x2000 1 KB: overlaps with \"B\" at 0x2000 4 KB."
        );
        assert_eq!(map.len(), 4);
    }

    #[test]
    fn conflict_with_lower_neighbor() {
        let mut map = sparse_map();
        let error = map.add("D", Placement::at(0x2800, 0x1000)).unwrap_err();
        assert!(matches!(error, MapError::Conflict { existing, .. } if *existing.item() == "B"));
    }

    #[test]
    fn explicit_base_is_aligned() {
        let mut map = AddressMap::new();
        let range = map
            .add("C", Placement::at(0x4500, 0x1000).with_align(0x1000))
            .unwrap();
        assert_eq!(range.base(), 0x5000);
    }

    #[test]
    fn automatic_placement() {
        let mut map = AddressMap::with_config(MapConfig::new().with_addrwidth(32).with_sub(true));
        let a = map.add("A", Placement::new(0x1000)).unwrap();
        let b = map.add("B", Placement::new(0x400).with_sub(false)).unwrap();
        let c = map.add("C", Placement::new(0x2000)).unwrap();
        assert_eq!((a.base(), b.base(), c.base()), (0x0, 0x1000, 0x2000));
        assert!(a.is_sub());
        assert!(!b.is_sub());
        assert_eq!(c.addrwidth(), Some(32));
    }

    #[test]
    fn free_baseaddr() {
        let mut map = AddressMap::with_config(MapConfig::new().with_addrwidth(16).with_sub(true));
        assert_eq!(map.get_free_baseaddr(0x10, None, Some(0)), Ok(0));
        map.add("A", Placement::at(0x1000, 0x400)).unwrap();

        assert_eq!(map.get_free_baseaddr(0x400, None, None), Ok(0x1400));
        assert_eq!(map.get_free_baseaddr(0x1000, None, None), Ok(0x2000));
        assert_eq!(
            map.get_free_baseaddr(0x2000, Some(0x4000), None),
            Ok(0x4000)
        );
        assert_eq!(map.get_free_baseaddr(0x400, None, Some(0x400)), Ok(0x400));
        assert_eq!(
            map.get_free_baseaddr(0x400, None, Some(0x4000)),
            Ok(0x4000)
        );

        map.add("B", Placement::at(0x3000, 0x1000)).unwrap();
        assert_eq!(
            map.get_free_baseaddr(0x1000, None, Some(0x2800)),
            Ok(0x4000)
        );
    }

    #[test]
    fn free_baseaddr_exhausted() {
        let map = AddressMap::<&str>::with_config(MapConfig::new().with_addrwidth(16));
        let error = map.get_free_baseaddr(0x2000, None, Some(0xF0000)).unwrap_err();
        assert_eq!(
            error,
            MapError::CapacityExceeded {
                base: 0xF0000,
                size: 0x2000,
                addrwidth: 16
            }
        );
        assert_eq!(
            error.to_string(),
            "no space left in address map (64 KB) for new range at 0xF0000 with size of 8 KB"
        );

        assert_eq!(
            map.get_free_baseaddr(0x2000, Some(0x1000), Some(0xF000)),
            Err(MapError::CapacityExceeded {
                base: 0xF000,
                size: 0x2000,
                addrwidth: 16
            })
        );
    }

    #[test]
    fn search_skips_occupied_ranges() {
        let mut map = four_blocks();
        map.add("E", Placement::at(0x5000, 0x1000)).unwrap();
        let f = map
            .add("F", Placement::new(0x1000).search_from(0x800))
            .unwrap();
        assert_eq!(f.base(), 0x4000);
        let g = map
            .add("G", Placement::new(0x800).search_from(0x800))
            .unwrap();
        assert_eq!(g.base(), 0x6000);
    }

    #[test]
    fn cut_across_ranges() {
        let mut map = four_blocks();
        let cut = map.cut(0x1800, 0x1000).unwrap();
        assert_eq!(
            layout(&map),
            [
                ("A", 0x0, 0x1000),
                ("B", 0x1000, 0x800),
                ("C", 0x2800, 0x800),
                ("D", 0x3000, 0x1000)
            ]
        );
        assert_eq!(layout(&cut), [("B", 0x1800, 0x800), ("C", 0x2000, 0x800)]);

        let cut = map.cut(0, 0x1000).unwrap();
        assert_eq!(layout(&cut), [("A", 0x0, 0x1000)]);
        assert_eq!(map.firstaddr(), Some(0x1000));

        let cut = map.cut(0x3C00, 0x1000).unwrap();
        assert_eq!(layout(&cut), [("D", 0x3C00, 0x400)]);
        assert_eq!(map.lastaddr(), Some(0x3BFF));

        let cut = map.cut(0x2800, 0x800).unwrap();
        assert_eq!(layout(&cut), [("C", 0x2800, 0x800)]);
        assert_eq!(
            layout(&map),
            [("B", 0x1000, 0x800), ("D", 0x3000, 0xC00)]
        );

        let cut = map.cut(0x2000, 0x100).unwrap();
        assert!(cut.is_empty());
        assert_eq!(map.len(), 2);
    }

    #[test]
    fn cut_inside_range() {
        let mut map = AddressMap::with_config(MapConfig::new().with_addrwidth(16));
        map.add("A", Placement::at(0x1000, 0x1000)).unwrap();
        let cut = map.cut(0x1400, 0x400).unwrap();
        assert_eq!(
            layout(&map),
            [("A", 0x1000, 0x400), ("A", 0x1800, 0x800)]
        );
        assert_eq!(layout(&cut), [("A", 0x1400, 0x400)]);
        assert_eq!(cut.config(), map.config());
    }

    #[test]
    fn lookup() {
        let map = sparse_map();
        assert_eq!(map.lookup(0x2000).map(|r| *r.item()), Some("B"));
        assert_eq!(map.lookup(0x2FFF).map(|r| *r.item()), Some("B"));
        assert_eq!(map.lookup(0x3000), None);
        assert_eq!(map.lookup(u64::MAX), None);
    }

    #[test]
    fn matching() {
        let mut map = AddressMap::new();
        map.add("A", Placement::at(0x1000, 0x1000)).unwrap();
        map.add("B", Placement::at(0x2000, 0x1000)).unwrap();
        map.add("C", Placement::at(0x3000, 0x800)).unwrap();

        let matched = map.matching(0x1800, 0x1000).unwrap();
        assert_eq!(
            layout(&matched),
            [("A", 0x1000, 0x1000), ("B", 0x2000, 0x1000)]
        );

        let window = AddressRange::new(0x1800, 0x1000).unwrap();
        assert_eq!(map.matching_range(&window), matched);
        assert_eq!(map.len(), 3);
    }

    #[test]
    fn find() {
        let mut map = AddressMap::new();
        map.add("A", Placement::at(0x5000, 0x1000)).unwrap();
        map.add("B", Placement::at(0x2000, 0x1000)).unwrap();
        map.add("A", Placement::at(0xD000, 0x800)).unwrap();
        assert_eq!(
            layout(&map.find(&"A")),
            [("A", 0x5000, 0x1000), ("A", 0xD000, 0x800)]
        );
        assert!(map.find(&"Z").is_empty());
    }

    #[test]
    fn get_without_default() {
        let map = sparse_map();
        assert_eq!(layout(map.get(None)), layout(&map));
    }

    #[test]
    fn get_fills_gaps() {
        let mut map = sparse_map();
        map.add("Z", Placement::new(0x2000)).unwrap();
        assert_eq!(
            layout(map.get(Some("reserved"))),
            [
                ("T", 0x0, 0x400),
                ("reserved", 0x400, 0x1C00),
                ("B", 0x2000, 0x1000),
                ("reserved", 0x3000, 0x2000),
                ("A", 0x5000, 0x1000),
                ("reserved", 0x6000, 0x7000),
                ("C", 0xD000, 0x800),
                ("reserved", 0xD800, 0x800),
                ("Z", 0xE000, 0x2000)
            ]
        );
    }

    #[test]
    fn get_fills_bounded_map() {
        let mut map = AddressMap::with_config(MapConfig::new().with_addrwidth(16));
        assert_eq!(layout(map.get(Some("<default>"))), [("<default>", 0x0, 0x10000)]);

        map.add("A", Placement::at(0x5000, 0x1000)).unwrap();
        assert_eq!(
            layout(map.get(Some("reserved"))),
            [
                ("reserved", 0x0, 0x5000),
                ("A", 0x5000, 0x1000),
                ("reserved", 0x6000, 0xA000)
            ]
        );

        map.add("Z", Placement::at(0xE000, 0x2000)).unwrap();
        let entries = map.get(Some("reserved"));
        let fillers: Vec<_> = entries.clone().filter(|r| *r.item() == "reserved").collect();
        assert!(fillers.iter().all(|r| r.addrwidth() == Some(16) && !r.is_sub()));
        assert_eq!(
            layout(entries),
            [
                ("reserved", 0x0, 0x5000),
                ("A", 0x5000, 0x1000),
                ("reserved", 0x6000, 0x8000),
                ("Z", 0xE000, 0x2000)
            ]
        );
    }

    #[test]
    fn derived_properties() {
        let mut map = AddressMap::new();
        assert_eq!(map.firstaddr(), None);
        assert_eq!(map.addrspace(), None);
        assert_eq!(map.eff_addrwidth(), None);

        map.add("A", Placement::at(0x5000, 0x1000)).unwrap();
        assert_eq!(map.firstaddr(), Some(0x5000));
        assert_eq!(map.addrspace(), Some(0x1000));
        assert_eq!(map.eff_addrwidth(), Some(15));

        map.add("B", Placement::at(0x2000, 0x1000)).unwrap();
        assert_eq!(map.firstaddr(), Some(0x2000));
        assert_eq!(map.addrspace(), Some(0x4000));

        map.add("C", Placement::at(0x7000, 13)).unwrap();
        assert_eq!(map.addrspace(), Some(0x500D));
    }

    #[test]
    fn decode_bits() {
        let mut map = AddressMap::new();
        assert_eq!(map.decode_lsb(), None);
        map.add("A", Placement::at(0x2000, 0x2000)).unwrap();
        assert_eq!(map.decode_lsb(), Some(13));
        map.add("B", Placement::at(0x5000, 0x400)).unwrap();
        assert_eq!(map.decode_lsb(), Some(10));
        map.add("C", Placement::at(0x6000, 0x800)).unwrap();
        assert_eq!(map.decode_lsb(), Some(10));

        let map = AddressMap::<&str>::with_config(MapConfig::new().with_addrwidth(32));
        assert_eq!(map.decode_msb(), Some(31));
        assert_eq!(map.decode_slice(), None);

        let mut map = AddressMap::with_config(MapConfig::new().with_sub(true));
        assert_eq!(map.decode_msb(), None);
        map.add("A", Placement::at(0x1000, 0x400)).unwrap();
        assert_eq!(map.decode_msb(), Some(12));
        map.add("B", Placement::at(0x2000, 0x2000)).unwrap();
        assert_eq!(map.decode_msb(), Some(13));
        map.add("C", Placement::at(0x4000, 1)).unwrap();
        assert_eq!(map.decode_msb(), Some(14));
    }

    #[test]
    fn decode_slice() {
        let mut map = AddressMap::new();
        map.add("A", Placement::at(0x1000, 0x1000)).unwrap();
        assert_eq!(map.decode_slice(), Some(BitSlice::new(12, 12)));
        map.add("B", Placement::at(0x3000, 0x2000)).unwrap();
        assert_eq!(map.decode_slice().map(|s| s.to_string()).as_deref(), Some("14:12"));
    }

    #[test]
    fn is_full() {
        let mut map = AddressMap::new();
        assert_eq!(map.is_full(), None);
        map.add("A", Placement::new(0x2000)).unwrap();
        assert_eq!(map.is_full(), Some(true));
        let b = map.add("B", Placement::new(0x1000)).unwrap();
        assert_eq!(b.base(), 0x2000);
        assert_eq!(map.is_full(), Some(false));
        map.add("C", Placement::new(0x1000)).unwrap();
        assert_eq!(map.is_full(), Some(true));

        let mut map = AddressMap::with_config(MapConfig::new().with_addrwidth(13));
        assert_eq!(map.is_full(), None);
        map.add("A", Placement::at(0x0, 0x1800)).unwrap();
        assert_eq!(map.is_full(), Some(false));
        map.add("B", Placement::at(0x1800, 0x800)).unwrap();
        assert_eq!(map.is_full(), Some(true));
    }

    #[test]
    fn copy_ranges() {
        let mut source = AddressMap::new();
        source.add("A", Placement::at(0x1000, 0x1000)).unwrap();
        source.add("B", Placement::at(0x3000, 0x1000)).unwrap();

        let mut target = AddressMap::new();
        target.copy_ranges(source.iter().cloned()).unwrap();
        assert_eq!(layout(&target), layout(&source));
    }

    #[test]
    fn overlapping_allowed() {
        let mut map = AddressMap::with_config(MapConfig::new().allow_overlapping(true));
        map.add("L", Placement::new(0x1000)).unwrap();
        map.add("R", Placement::at(0x400, 0x1000)).unwrap();
        map.add("M", Placement::at(0x200, 0x800)).unwrap();
        assert_eq!(
            layout(&map),
            [("L", 0x0, 0x1000), ("M", 0x200, 0x800), ("R", 0x400, 0x1000)]
        );
        assert_eq!(map.lookup(0x500).map(|r| *r.item()), Some("L"));
        assert_eq!(map.lookup(0x1200).map(|r| *r.item()), Some("R"));

        let cut = map.cut(0x800, 0x100).unwrap();
        assert_eq!(
            layout(&cut),
            [("L", 0x800, 0x100), ("M", 0x800, 0x100), ("R", 0x800, 0x100)]
        );
        assert!(cut.config().allows_overlapping());
    }

    // Edge cases.

    #[test]
    fn add_rejects_exceeding_width() {
        let mut map = AddressMap::with_config(MapConfig::new().with_addrwidth(16));
        assert_eq!(
            map.add("A", Placement::at(1 << 18, 0x1000)),
            Err(MapError::CapacityExceeded {
                base: 1 << 18,
                size: 0x1000,
                addrwidth: 16
            })
        );
        assert!(map.is_empty());
    }

    #[test]
    fn add_rejects_empty_range() {
        let mut map = AddressMap::new();
        assert!(matches!(
            map.add("A", Placement::at(0x1000, 0)),
            Err(MapError::InvalidRange(_))
        ));
        assert!(matches!(
            map.add("A", Placement::new(0)),
            Err(MapError::InvalidRange(_))
        ));
    }

    #[test]
    fn add_rejects_zero_alignment() {
        let mut map = AddressMap::new();
        assert_eq!(
            map.add("A", Placement::new(0x10).with_align(0)),
            Err(MapError::Align(AlignError::ZeroAlignment))
        );
        assert_eq!(
            map.add("A", Placement::at(0x13, 0x10).with_align(0)),
            Err(MapError::Align(AlignError::ZeroAlignment))
        );
        assert!(map.is_empty());
    }

    #[test]
    fn free_baseaddr_rejects_zero_alignment() {
        let map = sparse_map();
        assert_eq!(
            map.get_free_baseaddr(0x10, Some(0), None),
            Err(MapError::Align(AlignError::ZeroAlignment))
        );
        assert_eq!(
            map.get_free_baseaddr(0x10, Some(0), Some(0x1000)),
            Err(MapError::Align(AlignError::ZeroAlignment))
        );
    }

    #[test]
    fn unbounded_map_exhausted() {
        let mut map = AddressMap::new();
        map.add("A", Placement::at(u64::MAX - 0xFFF, 0x1000)).unwrap();
        assert_eq!(map.addrspace(), Some(0x1000));
        assert_eq!(map.eff_addrwidth(), Some(64));
        assert!(matches!(
            map.add("B", Placement::new(0x10)),
            Err(MapError::CapacityExceeded { addrwidth: 64, .. })
        ));
    }

    #[test]
    fn single_byte_at_zero_is_respected() {
        let mut map = AddressMap::new();
        map.add("A", Placement::at(0, 1)).unwrap();
        assert_eq!(map.get_free_baseaddr(1, None, None), Ok(1));
    }

    #[test]
    fn copy_ranges_is_atomic() {
        let mut map = AddressMap::new();
        map.add("A", Placement::at(0x1000, 0x1000)).unwrap();

        let ranges = vec![
            AddressRange::with_item("B", 0x3000, 0x1000).unwrap(),
            AddressRange::with_item("C", 0x1800, 0x100).unwrap(),
        ];
        assert!(matches!(
            map.copy_ranges(ranges),
            Err(MapError::Conflict { .. })
        ));
        assert_eq!(layout(&map), [("A", 0x1000, 0x1000)]);
    }

    #[test]
    fn cut_rejects_invalid_window() {
        let mut map = four_blocks();
        assert!(matches!(map.cut(0x1000, 0), Err(MapError::InvalidRange(_))));
        assert!(matches!(
            map.matching(u64::MAX, 2),
            Err(MapError::InvalidRange(_))
        ));
        assert_eq!(map.len(), 4);
    }

    #[test]
    fn whole_space_span_saturates() {
        let mut map = AddressMap::new();
        map.add("A", Placement::at(0, 1)).unwrap();
        map.add("B", Placement::at(u64::MAX, 1)).unwrap();
        assert_eq!(map.addrspace(), Some(u64::MAX));
        assert_eq!(layout(map.get(Some("-"))).len(), 3);
    }
}
