use crate::cli::{actions::Action, commands, dispatch, telemetry};
use anyhow::Result;

/// Parses arguments, installs telemetry and returns the action to run.
///
/// # Errors
///
/// Returns an error if argument parsing, telemetry initialization, or action dispatch fails
pub fn start() -> Result<Action> {
    let matches = commands::new().get_matches();

    telemetry::init(commands::logging::level_from(&matches))?;

    dispatch::handler(&matches)
}
