//! Command line parsing and [`Action::Layout`][al] construction.
//!
//! [al]: crate::cli::Action::Layout

use addrmap::MAX_ADDRWIDTH;
use clap::{Arg, ArgAction, ArgMatches, Command, value_parser};

use crate::common::parse_address;

/// Description of the address map to lay out.
#[derive(Clone, Debug, Hash, PartialEq, Eq)]
pub struct LayoutConfig {
    /// The width of the address space, if bounded.
    pub width: Option<u32>,
    /// If `true`, ranges are sub-address ranges.
    pub sub: bool,
    /// The ranges to allocate, in order.
    pub entries: Vec<LayoutEntry>,
}

/// A range to allocate, written as `NAME[@BASE]:SIZE`.
#[derive(Clone, Debug, Hash, PartialEq, Eq)]
pub struct LayoutEntry {
    /// The owner of the range.
    pub name: String,
    /// The base address of the range. Chosen automatically if `None`.
    pub base: Option<u64>,
    /// The number of addresses in the range.
    pub size: u64,
}

/// Parses a [`LayoutEntry`] written as `NAME[@BASE]:SIZE`.
///
/// # Errors
///
/// Returns a description of the problem if `literal` is malformed.
pub fn parse_entry(literal: &str) -> Result<LayoutEntry, String> {
    let Some((head, size)) = literal.rsplit_once(':') else {
        return Err(format!("expected NAME[@BASE]:SIZE, found {literal:?}"));
    };
    let (name, base) = match head.split_once('@') {
        Some((name, base)) => (name, Some(parse_address(base)?)),
        None => (head, None),
    };

    let name = name.trim();
    if name.is_empty() {
        return Err(format!("missing name in {literal:?}"));
    }
    let size = addrmap::parse_size(size).map_err(|error| error.to_string())?;

    Ok(LayoutEntry {
        name: name.to_owned(),
        base,
        size,
    })
}

/// Parses the arguments required to produce a valid [`LayoutConfig`].
pub fn parse_arguments(matches: &ArgMatches) -> LayoutConfig {
    let width = matches.get_one::<u32>("width").copied();
    let sub = matches.get_flag("sub");
    let entries = matches
        .get_many::<LayoutEntry>("entries")
        .unwrap_or_else(|| unreachable!("`entries` is a required argument"))
        .cloned()
        .collect();

    LayoutConfig {
        width,
        sub,
        entries,
    }
}

/// Returns the command parser for an [`Action::Layout`][al].
///
/// [al]: crate::cli::Action::Layout
pub fn subcommand_parser() -> Command {
    let width = Arg::new("width")
        .long("width")
        .help("Address width in bits. Unbounded if omitted")
        .value_parser(value_parser!(u32).range(1..=i64::from(MAX_ADDRWIDTH)));
    let sub = Arg::new("sub")
        .long("sub")
        .help("Mark every range as a sub-address range")
        .action(ArgAction::SetTrue);
    let entries = Arg::new("entries")
        .value_name("NAME[@BASE]:SIZE")
        .help("Ranges to allocate in order, placed behind the previous range if BASE is omitted")
        .value_parser(parse_entry)
        .action(ArgAction::Append)
        .num_args(1..)
        .required(true);

    Command::new("layout")
        .about("Allocate ranges in an address map and print the resulting layout")
        .arg(width)
        .arg(sub)
        .arg(entries)
}
