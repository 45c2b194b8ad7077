//! Command line parsing and [`Action::Masks`][am] construction.
//!
//! [am]: crate::cli::Action::Masks

use addrmap::DEFAULT_DONTCARE;
use clap::{Arg, ArgMatches, Command, value_parser};

use crate::cli::{parse_window, window_arguments};

/// Description of the address window to express as decoder masks.
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq)]
pub struct MasksConfig {
    /// The first address of the window.
    pub base: u64,
    /// The number of addresses in the window.
    pub size: u64,
    /// The number of digits in every mask.
    pub width: u32,
    /// The character used for don't-care digits.
    pub dontcare: char,
}

/// Parses the arguments required to produce a valid [`MasksConfig`].
pub fn parse_arguments(matches: &ArgMatches) -> MasksConfig {
    let (base, size) = parse_window(matches);
    let width = matches
        .get_one::<u32>("width")
        .copied()
        .unwrap_or_else(|| unreachable!("`width` has a default value"));
    let dontcare = matches
        .get_one::<char>("dontcare")
        .copied()
        .unwrap_or(DEFAULT_DONTCARE);

    MasksConfig {
        base,
        size,
        width,
        dontcare,
    }
}

/// Returns the command parser for an [`Action::Masks`][am].
///
/// [am]: crate::cli::Action::Masks
pub fn subcommand_parser() -> Command {
    let width = Arg::new("width")
        .long("width")
        .help("Address width in bits")
        .value_parser(value_parser!(u32).range(1..=64))
        .default_value("32");
    let dontcare = Arg::new("dontcare")
        .long("dontcare")
        .help("Character used for don't-care bits")
        .value_parser(value_parser!(char));

    Command::new("masks")
        .about("Print the address decoder masks matching an address window")
        .args(window_arguments())
        .arg(width)
        .arg(dontcare)
}
