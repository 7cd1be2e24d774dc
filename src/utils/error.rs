//! Error types for the marquee crawler
//!
//! This module defines custom error types used throughout the application.

use thiserror::Error;

/// Errors that can occur while fetching one page from the API
#[derive(Error, Debug)]
pub enum FetchError {
    /// Transport-level failure (connection refused, reset, TLS)
    #[error("HTTP request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// Request timeout
    #[error("Request timeout")]
    Timeout,

    /// Non-200 status code
    #[error("Unexpected status: {0}")]
    Status(u16),

    /// Non-200 status whose body carried the anti-automation challenge marker
    #[error("Session invalid (challenge page, status {status})")]
    SessionInvalid { status: u16 },

    /// 200 response whose body is not JSON
    #[error("Malformed envelope: {0}")]
    Envelope(String),

    /// 200 response without `data`, e.g. an unknown persisted query hash
    #[error("Query rejected: {0}")]
    Rejected(String),
}

impl FetchError {
    /// Whether the session must be renewed before the next attempt
    pub fn is_session_invalid(&self) -> bool {
        matches!(self, Self::SessionInvalid { .. })
    }
}

/// Reasons a raw edge cannot be turned into a record
///
/// These are properties of the data and are never retried.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MalformedRecord {
    /// Edge has no `node`
    #[error("edge has no node")]
    MissingNode,

    /// Node has no `title` object
    #[error("node has no title")]
    MissingTitle,

    /// Identity field missing or empty
    #[error("record has no id")]
    MissingId,

    /// Display name missing or empty
    #[error("record has no name")]
    MissingName,

    /// A field had an unexpected JSON type
    #[error("unexpected shape: {0}")]
    Shape(String),
}

/// Errors raised while obtaining a session
#[derive(Error, Debug)]
pub enum SessionError {
    /// The provider could not produce cookies
    #[error("Session bootstrap failed: {0}")]
    Bootstrap(String),

    /// HTTP failure while bootstrapping
    #[error("Session HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

/// Errors raised by the detail phase for a single title
#[derive(Error, Debug)]
pub enum DetailError {
    /// The title page could not be loaded
    #[error("Failed to load title page: {0}")]
    Load(String),

    /// The embedded data marker did not appear within the bounded wait
    #[error("Embedded data marker did not appear within {0:?}")]
    MarkerTimeout(std::time::Duration),

    /// Page loaded, but the embedded data script is absent
    #[error("Embedded data marker not found")]
    MarkerMissing,

    /// The embedded data is not valid JSON
    #[error("Embedded data is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// A required substructure is absent
    #[error("Missing required section: {0}")]
    MissingSection(&'static str),

    /// Required fields could not be recovered after merging
    #[error("Incomplete detail record: {0}")]
    Incomplete(MalformedRecord),
}

impl DetailError {
    /// Whether a diagnostic snapshot should be written for this failure
    ///
    /// Missing sections and records without a name are data gaps; shape
    /// mismatches and load/parse failures get a snapshot.
    pub fn wants_diagnostics(&self) -> bool {
        match self {
            Self::MissingSection(_) => false,
            Self::Incomplete(reason) => matches!(reason, MalformedRecord::Shape(_)),
            _ => true,
        }
    }
}

/// Errors raised when writing checkpoint or diagnostic files
#[derive(Error, Debug)]
pub enum PersistenceError {
    /// I/O error
    #[error("I/O error on {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// General crawler errors that end a phase
#[derive(Error, Debug)]
pub enum CrawlerError {
    /// Fetch error
    #[error("Fetch error: {0}")]
    Fetch(#[from] FetchError),

    /// Session error
    #[error("Session error: {0}")]
    Session(#[from] SessionError),

    /// Persistence error
    #[error("Persistence error: {0}")]
    Persistence(#[from] PersistenceError),

    /// Consecutive failures on one cursor exceeded the retry ceiling
    #[error("Gave up after {attempts} attempts at cursor {cursor:?}: {last}")]
    RetriesExhausted {
        attempts: u32,
        cursor: Option<String>,
        last: FetchError,
    },

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    Config(String),
}
