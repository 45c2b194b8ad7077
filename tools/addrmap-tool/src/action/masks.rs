//! Helper function to compute the decoder masks described by a [`MasksConfig`].

use anyhow::{Context, Result};

use crate::cli::masks::MasksConfig;

/// Returns the address decoder masks of the window, one per line.
///
/// # Errors
///
/// Returns errors when the window is empty, overflows or does not fit in the address width.
pub fn masks(config: &MasksConfig) -> Result<String> {
    let masks = addrmap::calc_addrwinmasks(config.base, config.size, config.width, config.dontcare)
        .with_context(|| {
            format!(
                "failed to decode window at {:#X} with size {:#X}",
                config.base, config.size
            )
        })?;
    log::info!("window decoded by {} masks", masks.len());

    Ok(masks.join("\n"))
}
