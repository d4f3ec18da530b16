//! Unified application error types for KnoHub.
//!
//! Every crate maps its internal failures into [`AppError`] so they
//! propagate through `?` and reach the HTTP boundary with a stable kind.

use std::fmt;
use thiserror::Error;

/// Error categories shared by the whole application.
///
/// The first group are caller-facing tree failures; the rest are
/// infrastructure failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum ErrorKind {
    /// An id does not resolve to an active item or resource.
    NotFound,
    /// The operation needs a file but got a folder, or the reverse.
    WrongKind,
    /// The target parent is missing, not a folder, or otherwise incompatible.
    InvalidTarget,
    /// An active sibling already holds the name in that scope.
    NameConflict,
    /// The supplied name is empty after trimming.
    EmptyName,
    /// A blob operation on the storage backend failed.
    IoFailure,
    /// Request input failed validation.
    Validation,
    /// The request body exceeded the configured upload limit.
    PayloadTooLarge,
    /// A preview renderer or document converter failed.
    Rendering,
    /// A database error occurred.
    Database,
    /// A configuration error occurred.
    Configuration,
    /// A serialization/deserialization error occurred.
    Serialization,
    /// An internal server error occurred.
    Internal,
}

impl ErrorKind {
    /// Whether this kind describes a caller mistake rather than a server fault.
    pub fn is_domain(&self) -> bool {
        matches!(
            self,
            Self::NotFound
                | Self::WrongKind
                | Self::InvalidTarget
                | Self::NameConflict
                | Self::EmptyName
                | Self::Validation
                | Self::PayloadTooLarge
                | Self::Rendering
        )
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound => write!(f, "NOT_FOUND"),
            Self::WrongKind => write!(f, "WRONG_KIND"),
            Self::InvalidTarget => write!(f, "INVALID_TARGET"),
            Self::NameConflict => write!(f, "NAME_CONFLICT"),
            Self::EmptyName => write!(f, "EMPTY_NAME"),
            Self::IoFailure => write!(f, "IO_FAILURE"),
            Self::Validation => write!(f, "VALIDATION"),
            Self::PayloadTooLarge => write!(f, "PAYLOAD_TOO_LARGE"),
            Self::Rendering => write!(f, "RENDERING"),
            Self::Database => write!(f, "DATABASE"),
            Self::Configuration => write!(f, "CONFIGURATION"),
            Self::Serialization => write!(f, "SERIALIZATION"),
            Self::Internal => write!(f, "INTERNAL"),
        }
    }
}

/// The unified application error used throughout KnoHub.
#[derive(Debug, Error)]
#[error("{kind}: {message}")]
pub struct AppError {
    /// The category of error.
    pub kind: ErrorKind,
    /// A short human-readable message.
    pub message: String,
    /// Optional underlying cause.
    #[source]
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl AppError {
    /// Create a new application error.
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            source: None,
        }
    }

    /// Create a new application error with an underlying cause.
    pub fn with_source(
        kind: ErrorKind,
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self {
            kind,
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::NotFound, message)
    }

    pub fn wrong_kind(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::WrongKind, message)
    }

    pub fn invalid_target(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::InvalidTarget, message)
    }

    pub fn name_conflict(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::NameConflict, message)
    }

    pub fn empty_name(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::EmptyName, message)
    }

    pub fn io_failure(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::IoFailure, message)
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Validation, message)
    }

    pub fn payload_too_large(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::PayloadTooLarge, message)
    }

    pub fn rendering(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Rendering, message)
    }

    pub fn database(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Database, message)
    }

    pub fn configuration(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Configuration, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Internal, message)
    }

    /// Whether the error should be reported to the caller as a 4xx.
    pub fn is_domain(&self) -> bool {
        self.kind.is_domain()
    }

    pub fn is_not_found(&self) -> bool {
        self.kind == ErrorKind::NotFound
    }
}

impl Clone for AppError {
    fn clone(&self) -> Self {
        Self {
            kind: self.kind,
            message: self.message.clone(),
            source: None,
        }
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        Self::with_source(
            ErrorKind::Serialization,
            format!("JSON serialization error: {err}"),
            err,
        )
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        let kind = if err.kind() == std::io::ErrorKind::NotFound {
            ErrorKind::NotFound
        } else {
            ErrorKind::IoFailure
        };
        Self::with_source(kind, format!("I/O error: {err}"), err)
    }
}

impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        Self::with_source(
            ErrorKind::Configuration,
            format!("Configuration error: {err}"),
            err,
        )
    }
}
