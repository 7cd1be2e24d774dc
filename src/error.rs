//! Unified error handling for the marquee crate
//!
//! Domain-specific errors live in [`crate::utils::error`]. This module wraps
//! them in a single [`Error`] enum for callers that drive several phases,
//! and classifies every error through [`MarqueeErrorTrait`].
//!
//! # Usage
//!
//! ```rust
//! use marquee::error::{Error, ErrorCategory, MarqueeErrorTrait};
//! use marquee::utils::error::FetchError;
//!
//! let err = Error::from(FetchError::Timeout);
//! assert!(err.is_recoverable());
//! assert_eq!(err.category(), ErrorCategory::Network);
//! ```

use std::io;
use thiserror::Error;

pub use crate::utils::error::{
    CrawlerError, DetailError, FetchError, MalformedRecord, PersistenceError, SessionError,
};

/// Common trait for all marquee error types
pub trait MarqueeErrorTrait: std::error::Error {
    /// Whether retrying the same operation can succeed
    fn is_recoverable(&self) -> bool;

    /// Error category for handling strategies
    fn category(&self) -> ErrorCategory;
}

/// Classification of errors for handling strategies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// Transport, timeout and status errors
    Network,
    /// Challenge pages and session bootstrap
    Session,
    /// Envelope, embedded data and record extraction
    Parsing,
    /// Checkpoint and diagnostic files
    Storage,
    /// Configuration and validation
    Config,
}

impl MarqueeErrorTrait for FetchError {
    fn is_recoverable(&self) -> bool {
        // A rejected query fails the same way on every attempt
        !matches!(self, Self::Rejected(_))
    }

    fn category(&self) -> ErrorCategory {
        match self {
            Self::SessionInvalid { .. } => ErrorCategory::Session,
            Self::Envelope(_) | Self::Rejected(_) => ErrorCategory::Parsing,
            Self::Transport(_) | Self::Timeout | Self::Status(_) => ErrorCategory::Network,
        }
    }
}

impl MarqueeErrorTrait for MalformedRecord {
    fn is_recoverable(&self) -> bool {
        false
    }

    fn category(&self) -> ErrorCategory {
        ErrorCategory::Parsing
    }
}

impl MarqueeErrorTrait for SessionError {
    fn is_recoverable(&self) -> bool {
        true
    }

    fn category(&self) -> ErrorCategory {
        ErrorCategory::Session
    }
}

impl MarqueeErrorTrait for DetailError {
    fn is_recoverable(&self) -> bool {
        matches!(self, Self::Load(_) | Self::MarkerTimeout(_))
    }

    fn category(&self) -> ErrorCategory {
        match self {
            Self::Load(_) | Self::MarkerTimeout(_) => ErrorCategory::Network,
            Self::MarkerMissing
            | Self::Json(_)
            | Self::MissingSection(_)
            | Self::Incomplete(_) => ErrorCategory::Parsing,
        }
    }
}

impl MarqueeErrorTrait for PersistenceError {
    fn is_recoverable(&self) -> bool {
        matches!(self, Self::Io { .. })
    }

    fn category(&self) -> ErrorCategory {
        ErrorCategory::Storage
    }
}

impl MarqueeErrorTrait for CrawlerError {
    fn is_recoverable(&self) -> bool {
        match self {
            Self::Fetch(e) => e.is_recoverable(),
            Self::Session(e) => e.is_recoverable(),
            Self::Persistence(e) => e.is_recoverable(),
            Self::RetriesExhausted { .. } | Self::Config(_) => false,
        }
    }

    fn category(&self) -> ErrorCategory {
        match self {
            Self::Fetch(e) => e.category(),
            Self::RetriesExhausted { last, .. } => last.category(),
            Self::Session(_) => ErrorCategory::Session,
            Self::Persistence(_) => ErrorCategory::Storage,
            Self::Config(_) => ErrorCategory::Config,
        }
    }
}

/// Unified error type for the marquee crate
#[derive(Error, Debug)]
pub enum Error {
    /// Phase-ending crawler errors
    #[error("Crawler error: {0}")]
    Crawler(#[from] CrawlerError),

    /// Fetch-specific errors
    #[error("Fetch error: {0}")]
    Fetch(#[from] FetchError),

    /// Per-title detail errors
    #[error("Detail error: {0}")]
    Detail(#[from] DetailError),

    /// Session errors
    #[error("Session error: {0}")]
    Session(#[from] SessionError),

    /// Checkpoint and diagnostics errors
    #[error("Persistence error: {0}")]
    Persistence(#[from] PersistenceError),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration errors
    #[error("Config error: {0}")]
    Config(String),
}

impl MarqueeErrorTrait for Error {
    fn is_recoverable(&self) -> bool {
        match self {
            Self::Crawler(e) => e.is_recoverable(),
            Self::Fetch(e) => e.is_recoverable(),
            Self::Detail(e) => e.is_recoverable(),
            Self::Session(e) => e.is_recoverable(),
            Self::Persistence(e) => e.is_recoverable(),
            Self::Io(_) => true,
            Self::Json(_) | Self::Config(_) => false,
        }
    }

    fn category(&self) -> ErrorCategory {
        match self {
            Self::Crawler(e) => e.category(),
            Self::Fetch(e) => e.category(),
            Self::Detail(e) => e.category(),
            Self::Session(_) => ErrorCategory::Session,
            Self::Persistence(_) | Self::Io(_) => ErrorCategory::Storage,
            Self::Json(_) => ErrorCategory::Parsing,
            Self::Config(_) => ErrorCategory::Config,
        }
    }
}

// Configuration loading reports through anyhow
impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Self {
        Self::Config(format!("{err:#}"))
    }
}

/// Result type alias using the unified Error type
pub type Result<T> = std::result::Result<T, Error>;
