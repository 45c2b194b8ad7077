//! Command line parsing and [`Action::Segments`][as] construction.
//!
//! [as]: crate::cli::Action::Segments

use clap::{ArgMatches, Command};

use crate::cli::{parse_window, window_arguments};

/// Description of the address window to split into aligned segments.
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq)]
pub struct SegmentsConfig {
    /// The first address of the window.
    pub base: u64,
    /// The number of addresses in the window.
    pub size: u64,
}

/// Parses the arguments required to produce a valid [`SegmentsConfig`].
pub fn parse_arguments(matches: &ArgMatches) -> SegmentsConfig {
    let (base, size) = parse_window(matches);

    SegmentsConfig { base, size }
}

/// Returns the command parser for an [`Action::Segments`][as].
///
/// [as]: crate::cli::Action::Segments
pub fn subcommand_parser() -> Command {
    Command::new("segments")
        .about("Split an address window into segments aligned to their sizes")
        .args(window_arguments())
}
