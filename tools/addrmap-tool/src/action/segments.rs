//! Helper function to split the window described by a [`SegmentsConfig`].

use anyhow::{Context, Result};

use crate::cli::segments::SegmentsConfig;

/// Returns the aligned segments of the window, one per line.
///
/// # Errors
///
/// Returns errors when the window is empty or overflows.
pub fn segments(config: &SegmentsConfig) -> Result<String> {
    let segments = addrmap::iter_aligned_segs(config.base, config.size)
        .with_context(|| {
            format!(
                "failed to split window at {:#X} with size {:#X}",
                config.base, config.size
            )
        })?
        .map(|segment| segment.to_string())
        .collect::<Vec<_>>();

    Ok(segments.join("\n"))
}
