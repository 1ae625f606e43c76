//! Error types for every pipeline stage
//!
//! Field-level lookup misses never show up here: they are recovered inside
//! the record extractor. Everything below is either a schema problem caught
//! up front or a page-level failure that ends the run.

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// Result type alias for whole pipeline runs
pub type Result<T> = std::result::Result<T, Error>;

/// Coarse classification of a [`FetchError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchErrorKind {
    InvalidUrl,
    Network,
    BadStatus,
    Timeout,
    Browser,
}

/// Failure to obtain page content
#[derive(Debug, Error)]
pub enum FetchError {
    /// URL did not parse or is not http(s)
    #[error("invalid URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    /// Transport failure (DNS, connect, TLS, body read)
    #[error("network error fetching {url}: {message}")]
    Network { url: String, message: String },

    /// Server answered with a non-2xx status
    #[error("HTTP {status} for {url}")]
    BadStatus { url: String, status: u16 },

    /// Request or readiness wait exceeded its time budget
    #[error("timed out after {waited:?} waiting for {url}")]
    Timeout { url: String, waited: Duration },

    /// Browser launch or protocol failure
    #[error("browser error: {0}")]
    Browser(String),
}

impl FetchError {
    #[must_use]
    pub fn kind(&self) -> FetchErrorKind {
        match self {
            FetchError::InvalidUrl { .. } => FetchErrorKind::InvalidUrl,
            FetchError::Network { .. } => FetchErrorKind::Network,
            FetchError::BadStatus { .. } => FetchErrorKind::BadStatus,
            FetchError::Timeout { .. } => FetchErrorKind::Timeout,
            FetchError::Browser(_) => FetchErrorKind::Browser,
        }
    }
}

/// Invalid selector schema, reported when an extractor is built
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("invalid CSS selector '{selector}': {reason}")]
    InvalidSelector { selector: String, reason: String },

    #[error("field '{0}' is declared more than once")]
    DuplicateField(String),

    #[error("required field '{0}' is not declared in the schema")]
    UnknownGateField(String),

    #[error("schema declares no fields")]
    EmptySchema,
}

/// Failure to shape extracted data into named columns
#[derive(Debug, Error, PartialEq, Eq)]
pub enum AssemblyError {
    #[error("column '{0}' appears more than once")]
    DuplicateColumn(String),

    #[error("record {row} has no value for column '{column}'")]
    MissingValue { row: usize, column: String },

    #[error("table has no header row")]
    EmptyGrid,
}

/// Failure to persist a table
#[derive(Debug, Error)]
pub enum SinkError {
    #[error("cannot write {}: {source}", path.display())]
    Unwritable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Terminal failure of a pipeline run
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Extract(#[from] ExtractError),

    #[error(transparent)]
    Assembly(#[from] AssemblyError),

    #[error(transparent)]
    Sink(#[from] SinkError),
}
