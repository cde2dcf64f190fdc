//! `-v` / `AUTHGATE_LOG_LEVEL`: how chatty the diagnostics on stderr are.
//! Flow results are printed regardless; this only drives the tracing filter.

use clap::{builder::ValueParser, Arg, ArgAction, ArgMatches, Command};
use tracing::Level;

pub const ARG_VERBOSITY: &str = "verbosity";

/// Level names accepted in the environment, indexed by verbosity count.
const LEVEL_NAMES: [&str; 5] = ["error", "warn", "info", "debug", "trace"];

/// Accepts a level name (`debug`) or a count (`3`) from the environment.
#[must_use]
pub fn validator_log_level() -> ValueParser {
    ValueParser::from(|raw: &str| -> Result<u8, String> {
        let raw = raw.trim();
        if let Ok(count) = raw.parse::<u8>() {
            return if usize::from(count) < LEVEL_NAMES.len() {
                Ok(count)
            } else {
                Err(format!("log level must be 0-{}", LEVEL_NAMES.len() - 1))
            };
        }

        LEVEL_NAMES
            .iter()
            .position(|name| name.eq_ignore_ascii_case(raw))
            .and_then(|index| u8::try_from(index).ok())
            .ok_or_else(|| format!("unknown log level {raw:?}, expected one of {LEVEL_NAMES:?}"))
    })
}

/// Tracing level for a verbosity count; zero keeps the default filter.
#[must_use]
pub const fn level_for(verbosity: u8) -> Option<Level> {
    match verbosity {
        0 => None,
        1 => Some(Level::WARN),
        2 => Some(Level::INFO),
        3 => Some(Level::DEBUG),
        _ => Some(Level::TRACE),
    }
}

#[must_use]
pub fn level_from(matches: &ArgMatches) -> Option<Level> {
    level_for(matches.get_one::<u8>(ARG_VERBOSITY).copied().unwrap_or(0))
}

#[must_use]
pub fn with_args(command: Command) -> Command {
    command.arg(
        Arg::new(ARG_VERBOSITY)
            .short('v')
            .long("verbose")
            .help("Diagnostics on stderr: repeat -v or set ERROR, WARN, INFO, DEBUG, TRACE")
            .env("AUTHGATE_LOG_LEVEL")
            .global(true)
            .action(ArgAction::Count)
            .value_parser(validator_log_level()),
    )
}
