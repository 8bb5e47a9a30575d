use std::{io, path::PathBuf};

use thiserror::Error;

/// Errors that prevent a session from being configured.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The countdown must last at least one second.
    #[error("time limit must be strictly positive (got {0})")]
    InvalidTimeLimit(i64),
    /// Initial ammunition must fit in a non-negative counter.
    #[error("initial ammunition must not be negative (got {0})")]
    InvalidAmmunition(i64),
    /// A default character is required.
    #[error("default character must not be empty")]
    EmptyCharacter,
    /// The configuration file exists but could not be read.
    #[error("failed to read config `{}`", .path.display())]
    Read {
        /// Location of the configuration file.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },
    /// The configuration file is not valid JSON for this schema.
    #[error("failed to parse config `{}`", .path.display())]
    Parse {
        /// Location of the configuration file.
        path: PathBuf,
        /// Underlying decoding error.
        #[source]
        source: serde_json::Error,
    },
}

/// Returned by a session handle once the driver has stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("game session is no longer running")]
pub struct SessionClosed;

/// Errors raised while parsing a console command line.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseCommandError {
    /// The line contained no command.
    #[error("empty command")]
    Empty,
    /// The command word is not recognised.
    #[error("unknown command `{0}`")]
    Unknown(String),
    /// A required argument was not supplied.
    #[error("`{command}` expects {expected}")]
    MissingArgument {
        /// Command word being parsed.
        command: &'static str,
        /// Human readable description of the missing argument.
        expected: &'static str,
    },
    /// An argument could not be interpreted.
    #[error("invalid argument `{value}` for `{command}`")]
    InvalidArgument {
        /// Command word being parsed.
        command: &'static str,
        /// Offending argument.
        value: String,
    },
}
