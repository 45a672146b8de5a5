//! # Simulator Logging
//!
//! Thin wrappers around the `log` crate, initialized with an `env_logger`
//! backend so verbosity stays controllable via `RUST_LOG` without the
//! simulator itself carrying any CLI flags or config files.
use log::{debug, error, info, log_enabled, warn, Level};
use std::io::Write;

/// Initializes the logger with the `env_logger` crate.
///
/// Formats every line as `[timestamp] LEVEL: message`, written to stdout, per
/// the wire-level contract: the simulator has no on-disk log file and no
/// structured log sink, only plain lines on standard output. The timestamp
/// comes from `env_logger`'s own formatter rather than a hand-rolled clock.
pub fn init_logger() {
    env_logger::Builder::from_default_env()
        .format(|buf, record| {
            writeln!(buf, "[{}] {}: {}", buf.timestamp(), record.level(), record.args())
        })
        .target(env_logger::Target::Stdout)
        .init();
}

/// Logs an error message.
pub fn log_error(message: &str) {
    if log_enabled!(Level::Error) {
        error!("{message}");
    }
}

/// Logs a warning message.
pub fn log_warn(message: &str) {
    if log_enabled!(Level::Warn) {
        warn!("{message}");
    }
}

/// Logs an informational message.
pub fn log_info(message: &str) {
    if log_enabled!(Level::Info) {
        info!("{message}");
    }
}

/// Logs a debug message.
pub fn log_debug(message: &str) {
    if log_enabled!(Level::Debug) {
        debug!("{message}");
    }
}
