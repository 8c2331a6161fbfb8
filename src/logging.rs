//! Diagnostic logging setup for the binary.
//!
//! The library only emits `tracing` events; installing a subscriber is left
//! to whoever embeds it. The command-line front end calls [`init_logging`]
//! with the verbosity taken from its flags.

use tracing::Level;
use tracing_subscriber::fmt;

/// Maps `-v`/`-q` counts to a maximum level. Warnings show by default.
pub fn level_for(verbose: u8, quiet: u8) -> Option<Level> {
    let score = i16::from(verbose) - i16::from(quiet);
    match score {
        i16::MIN..=-2 => None,
        -1 => Some(Level::ERROR),
        0 => Some(Level::WARN),
        1 => Some(Level::INFO),
        2 => Some(Level::DEBUG),
        _ => Some(Level::TRACE),
    }
}

/// Installs a stderr subscriber at the given verbosity.
///
/// Does nothing when fully quieted or when a global subscriber is already
/// set.
pub fn init_logging(verbose: u8, quiet: u8) {
    let Some(level) = level_for(verbose, quiet) else {
        return;
    };
    let _ = fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
