//! Various items that are common between [`Action`][a] parsing and execution.
//!
//! [a]: crate::cli::Action

use log::LevelFilter;

/// The verbosity of the diagnostics written to `stderr`.
#[derive(Clone, Copy, Debug, Default, Hash, PartialEq, Eq)]
pub enum LogLevel {
    /// No diagnostics.
    Off,
    /// Errors only.
    Error,
    /// Warnings and errors.
    #[default]
    Warn,
    /// Informational messages about placed ranges.
    Info,
    /// Map level operations.
    Debug,
    /// Every insertion, removal and decomposition block.
    Trace,
}

impl LogLevel {
    /// Returns the textual representation of the [`LogLevel`].
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Off => "off",
            Self::Error => "error",
            Self::Warn => "warn",
            Self::Info => "info",
            Self::Debug => "debug",
            Self::Trace => "trace",
        }
    }

    /// Returns the [`LevelFilter`] associated with the [`LogLevel`].
    pub fn as_filter(&self) -> LevelFilter {
        match self {
            Self::Off => LevelFilter::Off,
            Self::Error => LevelFilter::Error,
            Self::Warn => LevelFilter::Warn,
            Self::Info => LevelFilter::Info,
            Self::Debug => LevelFilter::Debug,
            Self::Trace => LevelFilter::Trace,
        }
    }
}

impl clap::ValueEnum for LogLevel {
    fn value_variants<'a>() -> &'a [Self] {
        static LEVELS: &[LogLevel] = &[
            LogLevel::Off,
            LogLevel::Error,
            LogLevel::Warn,
            LogLevel::Info,
            LogLevel::Debug,
            LogLevel::Trace,
        ];

        LEVELS
    }

    fn to_possible_value(&self) -> Option<clap::builder::PossibleValue> {
        Some(clap::builder::PossibleValue::new(self.as_str()))
    }
}

/// Parses an address given either in decimal or as a `0x` prefixed hexadecimal literal.
///
/// Underscores may be used as digit separators.
///
/// # Errors
///
/// Returns a description of the problem if `literal` is not a valid `u64`.
pub fn parse_address(literal: &str) -> Result<u64, String> {
    let literal = literal.trim();
    let digits = literal.replace('_', "");

    let result = match digits
        .strip_prefix("0x")
        .or_else(|| digits.strip_prefix("0X"))
    {
        Some(hex) => u64::from_str_radix(hex, 16),
        None => digits.parse::<u64>(),
    };
    result.map_err(|error| format!("invalid address {literal:?}: {error}"))
}

#[cfg(test)]
mod test {
    use super::parse_address;

    #[test]
    fn addresses() {
        assert_eq!(parse_address("4096"), Ok(0x1000));
        assert_eq!(parse_address("0x1000"), Ok(0x1000));
        assert_eq!(parse_address("0XF000_0000"), Ok(0xF000_0000));
    }

    // Edge cases.

    #[test]
    fn malformed_addresses() {
        assert!(parse_address("").is_err());
        assert!(parse_address("0x").is_err());
        assert!(parse_address("4 KB").is_err());
        assert!(parse_address("0x1_0000_0000_0000_0000").is_err());
    }
}
