//! Error types for chatline.
//!
//! This module defines the error type shared by the completion client, the
//! storage adapters, and the chat session.

use std::error;
use std::fmt;
use std::io;
use std::sync::Arc;

/// User-facing text for a non-success HTTP status.
pub const SERVER_ERROR_TEXT: &str = "server returned an error response";

/// User-facing text for a success status without an answer.
pub const INVALID_RESPONSE_TEXT: &str = "invalid response received from server";

/// The main error type for chatline.
#[derive(Clone, Debug)]
pub enum Error {
    /// The endpoint answered with a non-success HTTP status.
    Server {
        /// HTTP status code.
        status_code: u16,
        /// Human-readable error message.
        message: String,
    },

    /// The endpoint answered successfully but the body carried no answer.
    InvalidResponse {
        /// Human-readable error message.
        message: String,
    },

    /// Request timed out.
    Timeout {
        /// Human-readable error message.
        message: String,
        /// Duration of the timeout in seconds.
        duration: Option<f64>,
    },

    /// Connection error.
    Connection {
        /// Human-readable error message.
        message: String,
        /// Underlying cause.
        source: Option<Arc<dyn error::Error + Send + Sync>>,
    },

    /// Error during JSON serialization or deserialization.
    Serialization {
        /// Human-readable error message.
        message: String,
        /// The underlying error.
        source: Option<Arc<dyn error::Error + Send + Sync>>,
    },

    /// I/O error.
    Io {
        /// Human-readable error message.
        message: String,
        /// The underlying error.
        source: Arc<io::Error>,
    },

    /// HTTP client error.
    HttpClient {
        /// Human-readable error message.
        message: String,
        /// The underlying error.
        source: Option<Arc<dyn error::Error + Send + Sync>>,
    },

    /// Durable state could not be read or written.
    Storage {
        /// Human-readable error message.
        message: String,
        /// Storage key involved, if any.
        key: Option<String>,
    },

    /// Error during validation of a setting or argument.
    Validation {
        /// Human-readable error message.
        message: String,
        /// Parameter that failed validation.
        param: Option<String>,
    },

    /// A URL parsing or manipulation error.
    Url {
        /// Human-readable error message.
        message: String,
        /// The underlying error.
        source: Option<url::ParseError>,
    },
}

impl Error {
    /// Creates a new server error for a non-success status.
    pub fn server(status_code: u16) -> Self {
        Error::Server {
            status_code,
            message: SERVER_ERROR_TEXT.to_string(),
        }
    }

    /// Creates a new invalid response error.
    pub fn invalid_response() -> Self {
        Error::InvalidResponse {
            message: INVALID_RESPONSE_TEXT.to_string(),
        }
    }

    /// Creates a new timeout error.
    pub fn timeout(message: impl Into<String>, duration: Option<f64>) -> Self {
        Error::Timeout {
            message: message.into(),
            duration,
        }
    }

    /// Creates a new connection error.
    pub fn connection(
        message: impl Into<String>,
        source: Option<Box<dyn error::Error + Send + Sync>>,
    ) -> Self {
        Error::Connection {
            message: message.into(),
            source: source.map(Arc::from),
        }
    }

    /// Creates a new serialization error.
    pub fn serialization(
        message: impl Into<String>,
        source: Option<Box<dyn error::Error + Send + Sync>>,
    ) -> Self {
        Error::Serialization {
            message: message.into(),
            source: source.map(Arc::from),
        }
    }

    /// Creates a new I/O error.
    pub fn io(message: impl Into<String>, source: io::Error) -> Self {
        Error::Io {
            message: message.into(),
            source: Arc::new(source),
        }
    }

    /// Creates a new HTTP client error.
    pub fn http_client(
        message: impl Into<String>,
        source: Option<Box<dyn error::Error + Send + Sync>>,
    ) -> Self {
        Error::HttpClient {
            message: message.into(),
            source: source.map(Arc::from),
        }
    }

    /// Creates a new storage error.
    pub fn storage(message: impl Into<String>, key: Option<String>) -> Self {
        Error::Storage {
            message: message.into(),
            key,
        }
    }

    /// Creates a new validation error.
    pub fn validation(message: impl Into<String>, param: Option<String>) -> Self {
        Error::Validation {
            message: message.into(),
            param,
        }
    }

    /// Creates a new URL error.
    pub fn url(message: impl Into<String>, source: Option<url::ParseError>) -> Self {
        Error::Url {
            message: message.into(),
            source,
        }
    }

    /// Returns true if the endpoint answered with a non-success status.
    pub fn is_server_error(&self) -> bool {
        matches!(self, Error::Server { .. })
    }

    /// Returns true if the endpoint answered without an answer field.
    pub fn is_invalid_response(&self) -> bool {
        matches!(self, Error::InvalidResponse { .. })
    }

    /// Returns true if this error is a timeout.
    pub fn is_timeout(&self) -> bool {
        matches!(self, Error::Timeout { .. })
    }

    /// Returns true if this error is a connection error.
    pub fn is_connection(&self) -> bool {
        matches!(self, Error::Connection { .. })
    }

    /// Returns true if this error is a storage error.
    pub fn is_storage(&self) -> bool {
        matches!(self, Error::Storage { .. } | Error::Io { .. })
    }

    /// Returns true if this error is a validation error.
    pub fn is_validation(&self) -> bool {
        matches!(self, Error::Validation { .. })
    }

    /// Returns the status code associated with this error, if any.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Error::Server { status_code, .. } => Some(*status_code),
            _ => None,
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Server {
                status_code,
                message,
            } => {
                write!(f, "{message} (HTTP {status_code})")
            }
            Error::InvalidResponse { message } => {
                write!(f, "{message}")
            }
            Error::Timeout { message, duration } => {
                if let Some(duration) = duration {
                    write!(f, "Timeout error: {message} ({duration} seconds)")
                } else {
                    write!(f, "Timeout error: {message}")
                }
            }
            Error::Connection { message, .. } => {
                write!(f, "Connection error: {message}")
            }
            Error::Serialization { message, .. } => {
                write!(f, "Serialization error: {message}")
            }
            Error::Io { message, .. } => {
                write!(f, "I/O error: {message}")
            }
            Error::HttpClient { message, .. } => {
                write!(f, "HTTP client error: {message}")
            }
            Error::Storage { message, key } => {
                if let Some(key) = key {
                    write!(f, "Storage error: {message} (key: {key})")
                } else {
                    write!(f, "Storage error: {message}")
                }
            }
            Error::Validation { message, param } => {
                if let Some(param) = param {
                    write!(f, "Validation error: {message} (parameter: {param})")
                } else {
                    write!(f, "Validation error: {message}")
                }
            }
            Error::Url { message, .. } => {
                write!(f, "URL error: {message}")
            }
        }
    }
}

impl error::Error for Error {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        match self {
            Error::Connection { source, .. } => source
                .as_ref()
                .map(|e| e.as_ref() as &(dyn error::Error + 'static)),
            Error::Serialization { source, .. } => source
                .as_ref()
                .map(|e| e.as_ref() as &(dyn error::Error + 'static)),
            Error::Io { source, .. } => Some(source),
            Error::HttpClient { source, .. } => source
                .as_ref()
                .map(|e| e.as_ref() as &(dyn error::Error + 'static)),
            Error::Url { source, .. } => {
                source.as_ref().map(|e| e as &(dyn error::Error + 'static))
            }
            _ => None,
        }
    }
}

impl From<io::Error> for Error {
    fn from(err: io::Error) -> Self {
        Error::io(err.to_string(), err)
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::serialization(format!("JSON error: {err}"), Some(Box::new(err)))
    }
}

impl From<url::ParseError> for Error {
    fn from(err: url::ParseError) -> Self {
        Error::url(format!("URL parse error: {err}"), Some(err))
    }
}

/// A specialized Result type for chatline operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn server_and_invalid_response_text_differ() {
        let server = Error::server(500);
        let invalid = Error::invalid_response();
        assert!(server.is_server_error());
        assert!(invalid.is_invalid_response());
        assert_eq!(server.status_code(), Some(500));
        assert_eq!(invalid.status_code(), None);
        assert_ne!(server.to_string(), invalid.to_string());
        assert!(server.to_string().contains(SERVER_ERROR_TEXT));
        assert_eq!(invalid.to_string(), INVALID_RESPONSE_TEXT);
    }

    #[test]
    fn io_errors_count_as_storage() {
        let err: Error = io::Error::new(io::ErrorKind::PermissionDenied, "nope").into();
        assert!(err.is_storage());
        assert!(error::Error::source(&err).is_some());
    }

    #[test]
    fn json_errors_convert() {
        let err: Error = serde_json::from_str::<u32>("not json").unwrap_err().into();
        assert!(matches!(err, Error::Serialization { .. }));
        assert!(err.to_string().starts_with("Serialization error: JSON error"));
    }
}
