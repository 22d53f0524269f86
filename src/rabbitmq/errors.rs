// src/rabbitmq/errors.rs

use std::fmt;

use lapin::protocol::{AMQPErrorKind, AMQPHardError, AMQPSoftError};
use lapin::Error as LapinError;
use thiserror::Error;
use tokio::time::error::Elapsed;

/// Coarse classification of an [`Error`], used by callers to pick a message
/// or an exit code without matching on the payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Argument,
    Connection,
    Auth,
    Protocol,
    NotFound,
    CredentialInput,
    Cancelled,
}

/// The operation and resource a failure belongs to, e.g. `delete queue 'orders'`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Context {
    pub operation: &'static str,
    pub resource: String,
}

impl Context {
    pub fn new(operation: &'static str, resource: impl Into<String>) -> Self {
        Self {
            operation,
            resource: resource.into(),
        }
    }
}

impl fmt::Display for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.resource.is_empty() {
            write!(f, "{}", self.operation)
        } else {
            write!(f, "{} '{}'", self.operation, self.resource)
        }
    }
}

#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid argument: {0}")]
    Argument(String),

    #[error("{context}: cannot reach broker: {message}")]
    Connection { context: Context, message: String },

    #[error("{context}: access refused: {message}")]
    Auth { context: Context, message: String },

    #[error("{context}: rejected by broker: {message}")]
    Protocol { context: Context, message: String },

    #[error("{context}: not found: {message}")]
    NotFound { context: Context, message: String },

    #[error("failed to read credentials: {0}")]
    CredentialInput(String),

    #[error("cancelled")]
    Cancelled,
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Argument(_) => ErrorKind::Argument,
            Error::Connection { .. } => ErrorKind::Connection,
            Error::Auth { .. } => ErrorKind::Auth,
            Error::Protocol { .. } => ErrorKind::Protocol,
            Error::NotFound { .. } => ErrorKind::NotFound,
            Error::CredentialInput(_) => ErrorKind::CredentialInput,
            Error::Cancelled => ErrorKind::Cancelled,
        }
    }

    pub fn argument(message: impl Into<String>) -> Self {
        Error::Argument(message.into())
    }
}

/// Transport-level failure reported by a backend. Carries no operation
/// context; the provider attaches it with [`BackendError::within`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct BackendError {
    pub kind: BackendErrorKind,
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendErrorKind {
    Connection,
    Auth,
    Protocol,
    NotFound,
}

impl BackendError {
    pub fn new(kind: BackendErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn connection(message: impl Into<String>) -> Self {
        Self::new(BackendErrorKind::Connection, message)
    }

    pub fn auth(message: impl Into<String>) -> Self {
        Self::new(BackendErrorKind::Auth, message)
    }

    pub fn protocol(message: impl Into<String>) -> Self {
        Self::new(BackendErrorKind::Protocol, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(BackendErrorKind::NotFound, message)
    }

    pub fn within(self, context: Context) -> Error {
        let message = self.message;
        match self.kind {
            BackendErrorKind::Connection => Error::Connection { context, message },
            BackendErrorKind::Auth => Error::Auth { context, message },
            BackendErrorKind::Protocol => Error::Protocol { context, message },
            BackendErrorKind::NotFound => Error::NotFound { context, message },
        }
    }

    /// Maps a management API status code onto the failure taxonomy.
    pub fn from_status(status: u16, body: &str) -> Self {
        let message = if body.trim().is_empty() {
            format!("HTTP {}", status)
        } else {
            format!("HTTP {}: {}", status, body.trim())
        };

        match status {
            401 | 403 => Self::auth(message),
            404 => Self::not_found(message),
            _ => Self::protocol(message),
        }
    }
}

// Converting from lapin errors
impl From<LapinError> for BackendError {
    fn from(error: LapinError) -> Self {
        let error_text = error.to_string();

        match &error {
            LapinError::IOError(_) | LapinError::InvalidConnectionState(_) => {
                BackendError::connection(error_text)
            }
            LapinError::ProtocolError(amqp) => match amqp.kind() {
                AMQPErrorKind::Soft(AMQPSoftError::ACCESSREFUSED)
                | AMQPErrorKind::Hard(AMQPHardError::NOTALLOWED) => BackendError::auth(error_text),
                AMQPErrorKind::Soft(AMQPSoftError::NOTFOUND) => {
                    BackendError::not_found(error_text)
                }
                AMQPErrorKind::Hard(AMQPHardError::CONNECTIONFORCED) => {
                    BackendError::connection(error_text)
                }
                _ => BackendError::protocol(error_text),
            },
            _ => BackendError::protocol(error_text),
        }
    }
}

impl From<reqwest::Error> for BackendError {
    fn from(error: reqwest::Error) -> Self {
        if let Some(status) = error.status() {
            return BackendError::from_status(status.as_u16(), "");
        }

        if error.is_connect() || error.is_timeout() || error.is_request() {
            BackendError::connection(error.to_string())
        } else {
            BackendError::protocol(error.to_string())
        }
    }
}

impl From<Elapsed> for BackendError {
    fn from(_: Elapsed) -> Self {
        BackendError::connection("operation timed out")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(BackendError::from_status(401, "").kind, BackendErrorKind::Auth);
        assert_eq!(BackendError::from_status(403, "").kind, BackendErrorKind::Auth);
        assert_eq!(BackendError::from_status(404, "").kind, BackendErrorKind::NotFound);
        assert_eq!(BackendError::from_status(400, "").kind, BackendErrorKind::Protocol);
        assert_eq!(BackendError::from_status(500, "").kind, BackendErrorKind::Protocol);
    }

    #[test]
    fn test_status_message_includes_body() {
        let error = BackendError::from_status(400, " {\"reason\":\"inequivalent arg\"} ");
        assert_eq!(error.message, "HTTP 400: {\"reason\":\"inequivalent arg\"}");
        assert_eq!(BackendError::from_status(404, "").message, "HTTP 404");
    }

    #[test]
    fn test_context_is_attached() {
        let error = BackendError::not_found("HTTP 404").within(Context::new("delete queue", "missing"));

        assert_eq!(error.kind(), ErrorKind::NotFound);
        assert_eq!(
            error.to_string(),
            "delete queue 'missing': not found: HTTP 404"
        );
    }

    #[test]
    fn test_connection_and_not_found_are_distinct() {
        let context = Context::new("get queues", "");
        let unreachable = BackendError::connection("refused").within(context.clone());
        let missing = BackendError::not_found("HTTP 404").within(context);

        assert_ne!(unreachable.kind(), missing.kind());
        assert_eq!(unreachable.to_string(), "get queues: cannot reach broker: refused");
    }
}
