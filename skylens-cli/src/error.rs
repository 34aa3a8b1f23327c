//! CLI error type.

use thiserror::Error;

/// Errors surfaced to the terminal user.
#[derive(Debug, Error)]
pub enum CliError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Fetch(#[from] skylens::fetch::FetchError),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
}
