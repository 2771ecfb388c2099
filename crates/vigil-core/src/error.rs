//! Error types for the Vigil core library
//!
//! This module defines the error handling system for Vigil, using thiserror
//! for ergonomic error definitions and anyhow for flexible error contexts.
//!
//! Hard validation failures (a FATAL mismatch or an exceeded failure
//! threshold) are reported through [`ValidationAbort`], which carries the
//! failure record that terminated the pass.

use crate::failure::FailureRecord;
use crate::template::TemplateError;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

/// Main error type for Vigil operations
#[derive(Error, Debug)]
pub enum Error {
    /// Invalid setup: bad parameters, malformed rule sets, and similar
    #[error("Configuration error: {message}")]
    Configuration {
        message: String,
        #[source]
        source: Option<anyhow::Error>,
    },

    /// The rule provider named by a validation step is not registered
    #[error("Unknown rule provider '{name}'.")]
    UnknownRuleProvider { name: String },

    /// A composite rule name that cannot be split into provider and rule
    #[error("Invalid rule name '{name}': {message}")]
    InvalidRuleName { name: String, message: String },

    /// A rule pattern that failed to compile
    #[error("Invalid pattern for rule '{rule}': {source}")]
    Pattern {
        rule: String,
        #[source]
        source: regex::Error,
    },

    /// The validation pass was terminated
    #[error(transparent)]
    Validation(#[from] ValidationAbort),

    /// A second FATAL failure was offered to the same aggregator
    #[error("A FATAL failure has already been recorded for this pass: {existing}")]
    DuplicateFatal { existing: String },

    /// A localized message could not be produced for a failure
    #[error("Failed to resolve message for rule '{rule}' (locale '{locale}'): {source}")]
    MessageResolution {
        rule: String,
        locale: String,
        #[source]
        source: TemplateError,
    },

    /// A message bundle or rule file exists but cannot be parsed
    #[error("Bundle error: {name} - {message}")]
    Bundle { name: String, message: String },

    /// IO errors
    #[error("IO error: {message}")]
    Io {
        message: String,
        #[source]
        source: std::io::Error,
    },

    /// JSON serialization errors
    #[error("JSON error: {message}")]
    Json {
        message: String,
        #[source]
        source: serde_json::Error,
    },

    /// Generic internal error with context
    #[error("Internal error: {message}")]
    Internal {
        message: String,
        #[source]
        source: anyhow::Error,
    },
}

/// Convenience type alias for Results using our Error type
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Create a configuration error without an underlying cause
    pub fn configuration(message: impl Into<String>) -> Self {
        Error::Configuration {
            message: message.into(),
            source: None,
        }
    }

    /// True for errors that terminate a validation pass
    pub fn is_validation_abort(&self) -> bool {
        matches!(self, Error::Validation(_))
    }

    /// The terminating failure, if this error ended a validation pass
    pub fn abort(&self) -> Option<&ValidationAbort> {
        match self {
            Error::Validation(abort) => Some(abort),
            _ => None,
        }
    }
}

/// Why a validation pass was terminated
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AbortCause {
    /// A rule configured with FATAL severity failed
    Fatal,
    /// The number of recorded failures went past the configured maximum
    ThresholdExceeded { max_fails: i64 },
}

/// Typed termination of a validation pass
///
/// Callers must propagate this as the outcome of the whole document pass.
#[derive(Debug, Clone)]
pub struct ValidationAbort {
    cause: AbortCause,
    failure: Arc<FailureRecord>,
}

impl ValidationAbort {
    pub fn fatal(failure: Arc<FailureRecord>) -> Self {
        Self {
            cause: AbortCause::Fatal,
            failure,
        }
    }

    pub fn threshold_exceeded(max_fails: i64, failure: Arc<FailureRecord>) -> Self {
        Self {
            cause: AbortCause::ThresholdExceeded { max_fails },
            failure,
        }
    }

    pub fn cause(&self) -> AbortCause {
        self.cause
    }

    /// The failure that triggered termination
    pub fn failure(&self) -> &Arc<FailureRecord> {
        &self.failure
    }
}

impl fmt::Display for ValidationAbort {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.cause {
            AbortCause::Fatal => {
                write!(f, "A FATAL validation failure has occurred {}", self.failure)
            }
            AbortCause::ThresholdExceeded { max_fails } => write!(
                f,
                "The maximum number of allowed validation failures ({}) has been exceeded.",
                max_fails
            ),
        }
    }
}

impl std::error::Error for ValidationAbort {}

// Conversion implementations
impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Io {
            message: err.to_string(),
            source: err,
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Json {
            message: err.to_string(),
            source: err,
        }
    }
}

impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Self {
        Error::Internal {
            message: err.to_string(),
            source: err,
        }
    }
}
