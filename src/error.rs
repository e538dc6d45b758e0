//! Error types for the satispay-csv-bot library.

use std::io;
use thiserror::Error;

/// Result type alias for library operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error types that can occur while converting files or relaying them.
#[derive(Debug, Error)]
pub enum Error {
    /// I/O error outside of the output destination (reading input, temp dirs).
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Input could not be parsed as CSV.
    #[error("CSV parsing error: {0}")]
    Parse(String),

    /// A data row is too short for the positional rewrite.
    #[error("Row {row} has {fields} fields, at least {expected} required")]
    ShortRow {
        row: usize,
        fields: usize,
        expected: usize,
    },

    /// The converted output could not be written.
    #[error("Cannot write output: {0}")]
    Write(String),

    /// Configuration is missing or malformed.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Sender is not on the allow-list.
    #[error("User {0} cannot use this bot")]
    AuthorizationDenied(String),

    /// Uploaded document is not a CSV file.
    #[error("Cannot parse a {0} please load a csv file")]
    UnsupportedContentType(String),

    /// The uploaded file could not be downloaded.
    #[error("Cannot fetch file: {0}")]
    Fetch(String),

    /// A reply could not be delivered to the chat.
    #[error("Cannot deliver reply: {0}")]
    Delivery(String),

    /// Bot API returned an error or could not be reached.
    #[error("Telegram API error: {0}")]
    Telegram(String),
}

impl From<csv::Error> for Error {
    fn from(err: csv::Error) -> Self {
        Error::Parse(err.to_string())
    }
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        Error::Telegram(err.to_string())
    }
}
