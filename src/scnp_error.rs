use crate::protocol::parts::server_error::ServerError;
use std::io;
use thiserror::Error;

/// An abbreviation of `Result<T, ScnpError>`.
pub type ScnpResult<T> = std::result::Result<T, ScnpError>;

/// Represents all possible errors that can occur in this crate.
#[derive(Debug, Error)]
pub enum ScnpError {
    /// Socket-level failure (connect, read, write, timeout).
    ///
    /// The session is unusable afterwards.
    #[error("transport failure: {source}")]
    Transport {
        /// The underlying OS error.
        #[source]
        source: io::Error,
        /// True if the failure was a socket timeout.
        is_timeout: bool,
    },

    /// Malformed or inconsistent wire data; the session is unusable afterwards.
    #[error("protocol error in {location}: {details}")]
    Protocol {
        /// Where in the engine the inconsistency was detected.
        location: &'static str,
        /// Description of the inconsistency.
        details: String,
    },

    /// The authentication handshake was rejected by the server.
    #[error("authentication failed: {0}")]
    Auth(String),

    /// The server reported one or more SQL-level errors.
    ///
    /// The session remains usable unless the reply also flagged the session
    /// as closing.
    #[error("database error: {}", .0.first().map_or_else(|| "no error details".to_string(), ToString::to_string))]
    Database(Vec<ServerError>),

    /// The client-side API was used incorrectly (closed result set, parameter
    /// count mismatch, unsupported type, oversized LOB, ...).
    #[error("usage error: {0}")]
    Usage(String),

    /// Operation on a Session, ResultSet, or Lob whose session is gone.
    #[error("session is closed")]
    Closed,
}

impl ScnpError {
    pub(crate) fn usage<S: Into<String>>(reason: S) -> Self {
        Self::Usage(reason.into())
    }

    pub(crate) fn protocol<S: Into<String>>(location: &'static str, details: S) -> Self {
        Self::Protocol {
            location,
            details: details.into(),
        }
    }

    /// The server-reported error records, if this is a database error.
    pub fn server_errors(&self) -> Option<&[ServerError]> {
        match self {
            Self::Database(records) => Some(records),
            _ => None,
        }
    }

    /// True for errors after which the session must not be used anymore.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Transport { .. } | Self::Protocol { .. } | Self::Auth(_))
    }
}

// Parse and emit primitives work with io errors; the classification into
// transport vs. protocol happens here. Errors produced with
// `protocol::util::io_error` carry ErrorKind::InvalidData.
impl From<io::Error> for ScnpError {
    fn from(error: io::Error) -> Self {
        match error.kind() {
            io::ErrorKind::InvalidData => Self::Protocol {
                location: "wire",
                details: error.to_string(),
            },
            io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock => Self::Transport {
                source: error,
                is_timeout: true,
            },
            _ => Self::Transport {
                source: error,
                is_timeout: false,
            },
        }
    }
}
