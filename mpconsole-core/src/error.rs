//! Error types for mpconsole.

use thiserror::Error;

use crate::classify::classify;
use crate::envelope::Envelope;
use crate::guard::RouteError;
use crate::transport::{TransportError, TransportErrorKind};

/// Message attached to every `SessionExpired` error.
pub const SESSION_EXPIRED_MESSAGE: &str = "session expired, please log in again";

/// Category of a failed call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// No response reached the client.
    Network,
    /// The transport deadline passed.
    Timeout,
    /// The backend rejected the session credential.
    SessionExpired,
    /// Any other logical failure reported by the backend.
    Application,
    /// An application failure the caller identified as a form-input rejection.
    Validation,
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Network => "network error",
            Self::Timeout => "timeout",
            Self::SessionExpired => "session expired",
            Self::Application => "application error",
            Self::Validation => "validation error",
        };
        f.write_str(name)
    }
}

/// What a classified error was built from.
#[derive(Debug, Clone, PartialEq)]
pub enum ErrorSource {
    /// A parsed response envelope.
    Envelope(Envelope),
    /// A transport-level failure.
    Transport(TransportError),
    /// A response whose body carried no parseable envelope.
    NoEnvelope,
    /// A successful envelope whose payload did not have the expected shape.
    Payload { reason: String },
}

/// A failed call, normalized for display.
///
/// Created once and never modified; [`into_validation`](Self::into_validation)
/// produces a new value.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{kind}: {message}")]
pub struct ClassifiedError {
    kind: ErrorKind,
    message: String,
    status: Option<u16>,
    raw: ErrorSource,
}

impl ClassifiedError {
    /// Classify a failure, extracting the message by priority.
    pub fn new(kind: ErrorKind, status: Option<u16>, raw: ErrorSource) -> Self {
        let message = classify(&raw);
        Self {
            kind,
            message,
            status,
            raw,
        }
    }

    /// A session expiry. The message is fixed; no field lookup happens.
    pub fn session_expired(status: Option<u16>, raw: Option<ErrorSource>) -> Self {
        Self {
            kind: ErrorKind::SessionExpired,
            message: SESSION_EXPIRED_MESSAGE.to_string(),
            status,
            raw: raw.unwrap_or(ErrorSource::NoEnvelope),
        }
    }

    /// A successful response whose payload could not be decoded.
    pub fn payload(reason: impl std::fmt::Display) -> Self {
        let reason = reason.to_string();
        Self {
            kind: ErrorKind::Application,
            message: format!("unexpected response payload: {}", reason),
            status: None,
            raw: ErrorSource::Payload { reason },
        }
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// HTTP status of the response, when one arrived.
    pub fn status(&self) -> Option<u16> {
        self.status
    }

    pub fn raw(&self) -> &ErrorSource {
        &self.raw
    }

    pub fn is_session_expired(&self) -> bool {
        self.kind == ErrorKind::SessionExpired
    }

    /// Re-tag an application error as a form-input rejection.
    ///
    /// Other kinds are returned unchanged.
    pub fn into_validation(self) -> Self {
        match self.kind {
            ErrorKind::Application => Self {
                kind: ErrorKind::Validation,
                ..self
            },
            _ => self,
        }
    }
}

impl From<TransportError> for ClassifiedError {
    fn from(error: TransportError) -> Self {
        let kind = match error.kind {
            TransportErrorKind::Timeout => ErrorKind::Timeout,
            TransportErrorKind::Connect
            | TransportErrorKind::Aborted
            | TransportErrorKind::InvalidRequest => ErrorKind::Network,
        };
        Self::new(kind, None, ErrorSource::Transport(error))
    }
}

/// Configuration error.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("failed to read config {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// The configuration file is not valid TOML for [`ConsoleConfig`](crate::config::ConsoleConfig).
    #[error("failed to parse config {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: toml::de::Error,
    },

    /// A value is out of range or malformed.
    #[error("invalid value for {field}: {message}")]
    Invalid { field: &'static str, message: String },
}

/// Top-level error type encompassing all mpconsole errors.
#[derive(Debug, Error)]
pub enum ConsoleError {
    /// A backend call failed.
    #[error(transparent)]
    Call(#[from] ClassifiedError),

    /// The HTTP transport could not be set up.
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// The route table could not be built.
    #[error("route error: {0}")]
    Route(#[from] RouteError),
}
