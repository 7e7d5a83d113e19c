//! Error types for SMTP operations.

use std::io;
use std::time::Duration;

use crate::machine::State;
use crate::types::ReplyCode;

/// Result type alias for SMTP operations.
pub type Result<T> = std::result::Result<T, Error>;

/// SMTP error types.
///
/// Every variant is terminal for a send call. The session is already closed
/// by the time one of these reaches the caller.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// TCP connect or TLS handshake failed (unreachable host, certificate rejected).
    #[error("failed to connect to {endpoint}: {source}")]
    Connect {
        /// `host:port` that was dialled.
        endpoint: String,
        /// Underlying transport error.
        source: io::Error,
    },

    /// Connect, read or write exceeded the session timeout.
    #[error("operation timed out after {0:?}")]
    Timeout(Duration),

    /// Writing to the socket failed.
    #[error("write failed: {0}")]
    Write(#[source] io::Error),

    /// Reading from the socket failed or the server hung up.
    #[error("read failed: {0}")]
    Read(#[source] io::Error),

    /// A server line could not be parsed into a reply.
    #[error("protocol error: {0}")]
    Protocol(String),

    /// A valid reply carried a code the current state does not accept.
    #[error("server rejected {state}: {code} {message}")]
    Rejected {
        /// State the dialogue was in when the reply arrived.
        state: State,
        /// Reply code (e.g., 550).
        code: u16,
        /// Reply text from the server.
        message: String,
    },

    /// Required configuration is missing or invalid.
    #[error("configuration error: {0}")]
    Config(String),

    /// Message is missing a required field.
    #[error("invalid message: {0}")]
    InvalidMessage(String),

    /// Invalid email address.
    #[error("invalid email address: {0}")]
    InvalidAddress(String),
}

impl Error {
    /// Creates a rejection error for `state` from a reply code and text.
    #[must_use]
    pub fn rejected(state: State, code: u16, message: impl Into<String>) -> Self {
        Self::Rejected {
            state,
            code,
            message: message.into(),
        }
    }

    /// Returns true if a later attempt could succeed (4xx rejection or timeout).
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        match self {
            Self::Rejected { code, .. } => ReplyCode::new(*code).is_transient(),
            Self::Timeout(_) => true,
            _ => false,
        }
    }

    /// Returns true if the server refused permanently (5xx).
    #[must_use]
    pub const fn is_permanent(&self) -> bool {
        matches!(self, Self::Rejected { code, .. } if ReplyCode::new(*code).is_permanent())
    }

    /// Text safe to show to the person who triggered the send.
    ///
    /// Server replies stay in the `Display` output for logs only.
    #[must_use]
    pub const fn user_message(&self) -> &'static str {
        "message not sent"
    }
}
