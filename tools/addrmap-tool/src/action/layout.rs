//! Helper functions to lay out the address map described by a [`LayoutConfig`].

use std::fmt;

use addrmap::{AddressMap, Bytes, MapConfig, Placement};
use anyhow::{Context, Result};
use numeric::convert::unsigned_to_hex;

use crate::cli::layout::LayoutConfig;

/// Column headers of the overview table.
const HEADERS: [&str; 4] = ["Baseaddr", "Size", "Sub", "Item"];

/// Allocates every entry of `config` in order and returns the overview table of the resulting
/// map, followed by its decode slice.
///
/// # Errors
///
/// Returns errors when an entry conflicts with a previous one or does not fit into the address
/// space.
pub fn layout(config: &LayoutConfig) -> Result<String> {
    let mut map_config = MapConfig::new().with_sub(config.sub);
    if let Some(width) = config.width {
        map_config = map_config.with_addrwidth(width);
    }

    let mut map = AddressMap::with_config(map_config);
    for entry in &config.entries {
        let placement = match entry.base {
            Some(base) => Placement::at(base, entry.size),
            None => Placement::new(entry.size),
        };

        let range = map
            .add(entry.name.clone(), placement)
            .with_context(|| format!("failed to place {:?}", entry.name))?;
        log::info!("placed {:?} at {range}", entry.name);
    }

    let mut output = overview(&map)?;
    if let Some(slice) = map.decode_slice() {
        output.push_str(&format!("\n\nDecode slice: {slice}"));
    }

    Ok(output)
}

/// Renders the ranges of `map` as a table of base address, size, sub-address attribute and item.
///
/// # Errors
///
/// Returns errors when a base address does not fit the width of the map.
pub fn overview<T: fmt::Display>(map: &AddressMap<T>) -> Result<String> {
    let mut rows = Vec::with_capacity(map.len());
    for range in map {
        let base = match map.addrwidth() {
            Some(width) => unsigned_to_hex(range.base(), width, "0x")?,
            None => format!("0x{:X}", range.base()),
        };
        let size = format!("0x{:X} ({})", range.size(), Bytes(range.size()));
        let sub = if range.is_sub() { "Yes" } else { "No" };

        rows.push([base, size, sub.to_owned(), range.item().to_string()]);
    }

    let mut widths = HEADERS.map(|header| header.len() + 2);
    for row in &rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.len());
        }
    }

    let separator = widths.map(|width| "-".repeat(width));
    let mut lines = vec![render_row(&HEADERS, &widths), render_row(&separator, &widths)];
    lines.extend(rows.iter().map(|row| render_row(row, &widths)));

    Ok(lines.join("\n"))
}

/// Left aligns every cell of `row` to its column width.
fn render_row<S: AsRef<str>>(row: &[S], widths: &[usize]) -> String {
    let cells = row
        .iter()
        .zip(widths)
        .map(|(cell, &width)| format!("{:<width$}", cell.as_ref()))
        .collect::<Vec<_>>();

    cells.join("  ").trim_end().to_owned()
}
