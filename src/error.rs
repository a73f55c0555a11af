//! Error types for SigmaCopy
//!
//! This module defines all error types used throughout the application,
//! providing detailed error information for debugging and user feedback.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for SigmaCopy operations
#[derive(Error, Debug)]
pub enum SigmaCopyError {
    /// I/O error during local file operations
    #[error("I/O error at '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Channel could not be established; fatal to the whole session
    #[error("Connection error to '{host}': {message}")]
    ConnectionError { host: String, message: String },

    /// SSH authentication failed
    #[error("SSH authentication failed for '{user}@{host}': {message}")]
    AuthenticationError {
        user: String,
        host: String,
        message: String,
    },

    /// A put or remote-command operation failed during an attempt
    #[error("Transport error: {0}")]
    TransportError(String),

    /// Local and remote digests disagree
    #[error("Integrity check failed for '{path}': expected {expected}, got {actual}")]
    IntegrityMismatch {
        path: PathBuf,
        expected: String,
        actual: String,
    },

    /// Remote digest command output could not be parsed
    #[error("Unparseable digest output: {0}")]
    DigestParseError(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Report serialization/persistence error
    #[error("Report error: {0}")]
    ReportError(String),
}

impl SigmaCopyError {
    /// Create an I/O error with path context
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Create a connection error
    pub fn connection(host: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ConnectionError {
            host: host.into(),
            message: message.into(),
        }
    }

    /// Create an authentication error
    pub fn auth(
        user: impl Into<String>,
        host: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::AuthenticationError {
            user: user.into(),
            host: host.into(),
            message: message.into(),
        }
    }

    /// Create an integrity mismatch error
    pub fn integrity_mismatch(
        path: impl Into<PathBuf>,
        expected: impl Into<String>,
        actual: impl Into<String>,
    ) -> Self {
        Self::IntegrityMismatch {
            path: path.into(),
            expected: expected.into(),
            actual: actual.into(),
        }
    }

    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::ConfigError(message.into())
    }

    /// Check if this error represents a digest disagreement
    pub fn is_integrity_failure(&self) -> bool {
        matches!(self, Self::IntegrityMismatch { .. })
    }

    /// Get the path associated with this error, if any
    pub fn path(&self) -> Option<&PathBuf> {
        match self {
            Self::Io { path, .. } | Self::IntegrityMismatch { path, .. } => Some(path),
            _ => None,
        }
    }
}

/// Result type alias for SigmaCopy operations
pub type Result<T> = std::result::Result<T, SigmaCopyError>;

impl From<std::io::Error> for SigmaCopyError {
    fn from(err: std::io::Error) -> Self {
        SigmaCopyError::Io {
            path: std::path::PathBuf::new(),
            source: err,
        }
    }
}

impl From<serde_json::Error> for SigmaCopyError {
    fn from(err: serde_json::Error) -> Self {
        SigmaCopyError::ReportError(err.to_string())
    }
}

/// Extension trait for adding path context to std::io::Result
pub trait IoResultExt<T> {
    /// Add path context to an I/O error
    fn with_path(self, path: impl Into<PathBuf>) -> Result<T>;
}

impl<T> IoResultExt<T> for std::io::Result<T> {
    fn with_path(self, path: impl Into<PathBuf>) -> Result<T> {
        self.map_err(|e| SigmaCopyError::io(path, e))
    }
}
