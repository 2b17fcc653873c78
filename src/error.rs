//! Unified error handling for the vcsclient library.
//!
//! Every backend classifies provider and transport failures into the
//! [`VcsError`] taxonomy before returning, so callers can branch on the error
//! kind without knowing which provider produced it.
//!
//! ## Error Categories
//!
//! - [`VcsError`]: Errors returned by [`VcsClient`](crate::client::VcsClient) operations
//! - [`ConfigError`]: Errors from configuration loading and validation
//!
//! ## Example
//!
//! ```rust
//! use vcsclient::error::{ErrorKind, VcsError};
//! use vcsclient::models::VcsProvider;
//!
//! let err = VcsError::unsupported("create webhook", VcsProvider::AzureRepos);
//! assert_eq!(err.kind(), ErrorKind::Unsupported);
//! assert!(err.to_string().contains("create webhook"));
//! ```

use std::path::PathBuf;
use thiserror::Error;

use crate::models::VcsProvider;

/// The error type returned by every [`VcsClient`](crate::client::VcsClient) operation.
#[derive(Error, Debug)]
pub enum VcsError {
    /// The endpoint could not be reached, or TLS negotiation failed.
    #[error("Connection error: {message}")]
    Connection {
        /// Description of the connection failure.
        message: String,
    },

    /// The provider rejected the credentials (401/403, or the 203 sign-in page).
    #[error("Authentication failed: {message}")]
    Auth {
        /// Message returned by the provider.
        message: String,
    },

    /// The referenced project, repository, branch, pull request or commit does not exist.
    #[error("Resource not found: {resource}")]
    NotFound {
        /// Description of the resource that was not found.
        resource: String,
    },

    /// Caller-supplied arguments violate provider constraints.
    #[error("Validation failed: {message}")]
    Validation {
        /// Description of the violated constraint.
        message: String,
    },

    /// The operation has no equivalent on this provider.
    #[error("{operation} is currently not supported for {provider}")]
    Unsupported {
        /// Human readable operation name, e.g. "create webhook".
        operation: String,
        /// Provider that lacks the capability.
        provider: VcsProvider,
    },

    /// A retryable condition: timeouts, throttling or server-side failures.
    #[error("Transient error: {message}")]
    Transient {
        /// Description of the failure.
        message: String,
    },

    /// The caller cancelled the operation.
    #[error("Operation cancelled")]
    Canceled,
}

/// Fieldless mirror of [`VcsError`] for programmatic branching.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Connection,
    Auth,
    NotFound,
    Validation,
    Unsupported,
    Transient,
    Canceled,
}

impl VcsError {
    /// Builds the error returned by operations a provider cannot perform.
    pub fn unsupported(operation: impl Into<String>, provider: VcsProvider) -> Self {
        Self::Unsupported {
            operation: operation.into(),
            provider,
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Classifies a failed HTTP exchange by its status code.
    ///
    /// Only timeouts, throttling and server-side statuses are retryable. Any
    /// other client error is a request the provider will keep refusing.
    /// `203` is the sign-in page Azure DevOps serves for a rejected PAT.
    pub fn from_status(status: u16, message: impl Into<String>) -> Self {
        let message = message.into();
        match status {
            203 | 401 | 403 => Self::Auth { message },
            404 | 410 => Self::NotFound { resource: message },
            408 | 429 | 500..=599 => Self::Transient {
                message: format!("HTTP {status}: {message}"),
            },
            400..=499 => Self::Validation { message },
            _ => Self::Transient {
                message: format!("HTTP {status}: {message}"),
            },
        }
    }

    /// Classifies a failure of a local filesystem operation.
    ///
    /// A destination the process may not write to is the caller's to fix;
    /// anything else may succeed on a later attempt.
    pub fn from_local_io(err: &std::io::Error, context: &str) -> Self {
        let message = format!("{context}: {err}");
        match err.kind() {
            std::io::ErrorKind::PermissionDenied | std::io::ErrorKind::ReadOnlyFilesystem => {
                Self::Validation { message }
            }
            _ => Self::Transient { message },
        }
    }

    /// Classifies a `reqwest` failure that happened before a status was received.
    pub fn from_transport(err: &reqwest::Error) -> Self {
        if let Some(status) = err.status() {
            return Self::from_status(status.as_u16(), err.to_string());
        }
        if err.is_connect() {
            Self::Connection {
                message: err.to_string(),
            }
        } else {
            Self::Transient {
                message: err.to_string(),
            }
        }
    }

    /// Returns the kind of this error.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Connection { .. } => ErrorKind::Connection,
            Self::Auth { .. } => ErrorKind::Auth,
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::Validation { .. } => ErrorKind::Validation,
            Self::Unsupported { .. } => ErrorKind::Unsupported,
            Self::Transient { .. } => ErrorKind::Transient,
            Self::Canceled => ErrorKind::Canceled,
        }
    }

    #[must_use]
    pub fn is_unsupported(&self) -> bool {
        matches!(self, Self::Unsupported { .. })
    }

    /// Whether a caller may retry the operation with backoff.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Transient { .. } | Self::Connection { .. })
    }
}

/// Errors that can occur during configuration loading and validation.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// A required configuration field is missing.
    #[error("{field} is required (use --{field}, {env_var} env var, or config file)")]
    MissingRequired {
        /// Name of the missing field.
        field: String,
        /// Environment variable name for this field.
        env_var: String,
    },

    /// Failed to read the configuration file.
    #[error("Failed to read config file at {path}: {message}")]
    FileReadError {
        /// Path to the config file.
        path: PathBuf,
        /// Error message.
        message: String,
    },

    /// Failed to parse the configuration file.
    #[error("Failed to parse config file at {path}: {message}")]
    ParseError {
        /// Path to the config file.
        path: PathBuf,
        /// Parse error message.
        message: String,
    },

    /// An invalid value was provided for a configuration field.
    #[error("Invalid value for {field}: {message}")]
    InvalidValue {
        /// Name of the field with invalid value.
        field: String,
        /// Description of why the value is invalid.
        message: String,
    },
}

/// Type alias for Results using VcsError.
pub type VcsResult<T> = std::result::Result<T, VcsError>;
