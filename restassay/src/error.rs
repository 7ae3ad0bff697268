use hyper::http;
use std::fmt::{self, Display};
use thiserror::Error;

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum TransportErrorKind {
    Timeout,
    ConnectFailure,
    ProtocolError,
}

impl Display for TransportErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransportErrorKind::Timeout => write!(f, "timeout"),
            TransportErrorKind::ConnectFailure => write!(f, "connect failure"),
            TransportErrorKind::ProtocolError => write!(f, "protocol error"),
        }
    }
}

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum DecodeErrorKind {
    ShapeMismatch,
    MalformedBody,
}

impl Display for DecodeErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DecodeErrorKind::ShapeMismatch => write!(f, "shape mismatch"),
            DecodeErrorKind::MalformedBody => write!(f, "malformed body"),
        }
    }
}

/// An observation that did not hold: what was checked, what was expected and what was seen.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct AssertionFailure {
    pub description: String,
    pub expected: String,
    pub actual: String,
}

impl Display for AssertionFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: expected {}, actual {}",
            self.description, self.expected, self.actual
        )
    }
}

#[derive(Debug, Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Malformed request: {0}")]
    MalformedRequest(String),

    #[error("Transport error ({kind}): {message}")]
    Transport {
        kind: TransportErrorKind,
        message: String,
    },

    #[error("Decode error ({kind}): {message}")]
    Decode {
        kind: DecodeErrorKind,
        message: String,
    },

    #[error("Assertion failed: {0}")]
    Assertion(AssertionFailure),

    /// The harness lost the scenario midway, e.g. its task panicked.
    #[error("Scenario interrupted: {0}")]
    Interrupted(String),
}

impl Error {
    pub(crate) fn transport<S: Into<String>>(kind: TransportErrorKind, message: S) -> Self {
        Error::Transport {
            kind,
            message: message.into(),
        }
    }

    pub(crate) fn decode<S: Into<String>>(kind: DecodeErrorKind, message: S) -> Self {
        Error::Decode {
            kind,
            message: message.into(),
        }
    }

    /// `true` for failures of the test infrastructure rather than of the remote contract.
    pub fn is_infrastructure(&self) -> bool {
        matches!(
            self,
            Error::Configuration(_)
                | Error::MalformedRequest(_)
                | Error::Transport { .. }
                | Error::Interrupted(_)
        )
    }
}

impl From<url::ParseError> for Error {
    fn from(e: url::ParseError) -> Self {
        Error::Configuration(format!("invalid base address: {}", e))
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::MalformedRequest(format!("body is not serializable: {}", e))
    }
}

impl From<hyper::header::InvalidHeaderName> for Error {
    fn from(e: hyper::header::InvalidHeaderName) -> Self {
        Error::MalformedRequest(format!("invalid header name: {}", e))
    }
}

impl From<hyper::header::InvalidHeaderValue> for Error {
    fn from(e: hyper::header::InvalidHeaderValue) -> Self {
        Error::MalformedRequest(format!("invalid header value: {}", e))
    }
}

impl From<http::Error> for Error {
    fn from(e: http::Error) -> Self {
        Error::MalformedRequest(format!("request could not be built: {}", e))
    }
}

impl From<hyper::Error> for Error {
    fn from(e: hyper::Error) -> Self {
        let kind = if e.is_connect() {
            TransportErrorKind::ConnectFailure
        } else if e.is_timeout() {
            TransportErrorKind::Timeout
        } else {
            TransportErrorKind::ProtocolError
        };

        Error::transport(kind, e.to_string())
    }
}
