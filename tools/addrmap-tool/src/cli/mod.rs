//! Command line parsing and [`Action`] construction.

use clap::{Arg, ArgMatches, Command, builder::EnumValueParser};

use crate::{
    cli::{layout::LayoutConfig, masks::MasksConfig, segments::SegmentsConfig},
    common::{LogLevel, parse_address},
};

pub mod layout;
pub mod masks;
pub mod segments;

/// A parsed command line.
#[derive(Clone, Debug, Hash, PartialEq, Eq)]
pub struct Invocation {
    /// The verbosity of the diagnostics.
    pub log_level: LogLevel,
    /// The action to carry out.
    pub action: Action,
}

/// The action to carry out.
#[derive(Clone, Debug, Hash, PartialEq, Eq)]
pub enum Action {
    /// Print the address decoder masks of a window.
    Masks(MasksConfig),
    /// Print the aligned segments of a window.
    Segments(SegmentsConfig),
    /// Allocate ranges in an address map and print its layout.
    Layout(LayoutConfig),
}

/// Parses `addrmap-tool`'s arguments to construct an [`Invocation`].
pub fn get_invocation() -> Invocation {
    parse_invocation(&command_parser().get_matches())
}

/// Constructs an [`Invocation`] from already validated `matches`.
fn parse_invocation(matches: &ArgMatches) -> Invocation {
    let log_level = matches
        .get_one::<LogLevel>("log-level")
        .copied()
        .unwrap_or_default();

    let Some((subcommand_name, subcommand_matches)) = matches.subcommand() else {
        unreachable!("subcommand is required");
    };
    let action = match subcommand_name {
        "masks" => Action::Masks(masks::parse_arguments(subcommand_matches)),
        "segments" => Action::Segments(segments::parse_arguments(subcommand_matches)),
        "layout" => Action::Layout(layout::parse_arguments(subcommand_matches)),
        _ => unreachable!("unexpected subcommand: {subcommand_name:?}"),
    };

    Invocation { log_level, action }
}

/// Returns the command parser for all [`Action`]s.
fn command_parser() -> Command {
    let log_level = Arg::new("log-level")
        .long("log-level")
        .help("Verbosity of the diagnostics written to stderr")
        .value_parser(EnumValueParser::<LogLevel>::new())
        .default_value("warn")
        .global(true);

    Command::new("addrmap-tool")
        .about("Lays out address maps and computes address decoder masks")
        .arg(log_level)
        .subcommand(masks::subcommand_parser())
        .subcommand(segments::subcommand_parser())
        .subcommand(layout::subcommand_parser())
        .subcommand_required(true)
        .arg_required_else_help(true)
}

/// Returns the `--base` and `--size` arguments describing an address window.
fn window_arguments() -> [Arg; 2] {
    let base = Arg::new("base")
        .long("base")
        .help("First address of the window, in decimal or 0x hexadecimal")
        .value_parser(parse_address)
        .required(true);
    let size = Arg::new("size")
        .long("size")
        .help("Number of addresses in the window, such as 0x400 or \"4 KB\"")
        .value_parser(addrmap::parse_size)
        .required(true);

    [base, size]
}

/// Extracts the window described by [`window_arguments()`] from `matches`.
fn parse_window(matches: &ArgMatches) -> (u64, u64) {
    let base = matches
        .get_one::<u64>("base")
        .copied()
        .unwrap_or_else(|| unreachable!("`base` is a required argument"));
    let size = matches
        .get_one::<u64>("size")
        .copied()
        .unwrap_or_else(|| unreachable!("`size` is a required argument"));

    (base, size)
}

#[cfg(test)]
mod test {
    use super::{Action, command_parser, parse_invocation};
    use crate::{
        cli::{
            layout::{LayoutConfig, LayoutEntry},
            masks::MasksConfig,
            segments::SegmentsConfig,
        },
        common::LogLevel,
    };

    fn parse(args: &[&str]) -> Result<super::Invocation, clap::Error> {
        let matches = command_parser().try_get_matches_from(args)?;
        Ok(parse_invocation(&matches))
    }

    #[test]
    fn masks() {
        let invocation = parse(&["addrmap-tool", "masks", "--base", "0xF000", "--size", "0x180"])
            .unwrap();
        assert_eq!(invocation.log_level, LogLevel::Warn);
        assert_eq!(
            invocation.action,
            Action::Masks(MasksConfig {
                base: 0xF000,
                size: 0x180,
                width: 32,
                dontcare: '?'
            })
        );

        let invocation = parse(&[
            "addrmap-tool",
            "masks",
            "--base",
            "61440",
            "--size",
            "384 bytes",
            "--width",
            "16",
            "--dontcare",
            "x",
            "--log-level",
            "trace",
        ])
        .unwrap();
        assert_eq!(invocation.log_level, LogLevel::Trace);
        assert_eq!(
            invocation.action,
            Action::Masks(MasksConfig {
                base: 0xF000,
                size: 0x180,
                width: 16,
                dontcare: 'x'
            })
        );
    }

    #[test]
    fn segments() {
        let invocation = parse(&[
            "addrmap-tool",
            "--log-level",
            "debug",
            "segments",
            "--base",
            "1024",
            "--size",
            "1.75 KB",
        ])
        .unwrap();
        assert_eq!(invocation.log_level, LogLevel::Debug);
        assert_eq!(
            invocation.action,
            Action::Segments(SegmentsConfig {
                base: 1024,
                size: 1792
            })
        );
    }

    #[test]
    fn layout() {
        let invocation = parse(&[
            "addrmap-tool",
            "layout",
            "--width",
            "16",
            "--sub",
            "A@0x1000:1 KB",
            "B:4 KB",
        ])
        .unwrap();
        assert_eq!(
            invocation.action,
            Action::Layout(LayoutConfig {
                width: Some(16),
                sub: true,
                entries: vec![
                    LayoutEntry {
                        name: String::from("A"),
                        base: Some(0x1000),
                        size: 0x400
                    },
                    LayoutEntry {
                        name: String::from("B"),
                        base: None,
                        size: 0x1000
                    },
                ]
            })
        );
    }

    // Edge cases.

    #[test]
    fn subcommand_required() {
        assert!(parse(&["addrmap-tool"]).is_err());
    }

    #[test]
    fn invalid_arguments_rejected() {
        assert!(parse(&["addrmap-tool", "masks", "--base", "0x10"]).is_err());
        assert!(parse(&["addrmap-tool", "masks", "--base", "x", "--size", "1"]).is_err());
        assert!(parse(&["addrmap-tool", "segments", "--base", "0", "--size", "4 XB"]).is_err());
        assert!(
            parse(&["addrmap-tool", "masks", "--base", "0", "--size", "1", "--width", "65"])
                .is_err()
        );
        assert!(parse(&["addrmap-tool", "layout", "--width", "64", "A:1"]).is_err());
        assert!(parse(&["addrmap-tool", "layout"]).is_err());
        assert!(parse(&["addrmap-tool", "layout", "A"]).is_err());
        assert!(parse(&["addrmap-tool", "--log-level", "loud", "layout", "A:1"]).is_err());
    }
}
