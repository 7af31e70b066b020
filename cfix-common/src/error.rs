//! Error type shared by the cfix crates
//!
//! Registry and session I/O, config loading and disc-merge validation all
//! report through [`Error`]. Per-track failures are logged by the batch
//! callers and never abort a run.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    /// Reading or writing the artist lookup, a session or the config file
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Unparsable `cfix.toml`, out-of-range threshold, bad ampersand pattern
    /// or log level
    #[error("Configuration error: {0}")]
    Config(String),

    /// Lookup, session or config file does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// A selection the operation refuses, such as clusters that are not one
    /// multi-disc set
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Session document that is not valid JSON for the expected shape
    #[error("Parse error: {0}")]
    Parse(String),

    /// Poisoned registry lock or an unserializable session
    #[error("Internal error: {0}")]
    Internal(String),
}
