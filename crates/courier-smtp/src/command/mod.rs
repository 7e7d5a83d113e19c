//! SMTP command builder.

use std::fmt;

use crate::types::{Address, Secret};

/// One line (or, for [`Command::Content`], one block) the client writes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// EHLO - Extended greeting
    Ehlo {
        /// Client hostname
        hostname: String,
    },
    /// AUTH LOGIN - Begin username/password authentication
    AuthLogin,
    /// Base64 answer to a 334 challenge
    AuthResponse(Secret),
    /// MAIL FROM - Start mail transaction
    MailFrom {
        /// Sender address
        from: Address,
    },
    /// RCPT TO - Add recipient
    RcptTo {
        /// Recipient address
        to: Address,
    },
    /// DATA - Begin message data
    Data,
    /// Headers, dot-stuffed body and the `\r\n.` terminator
    Content(String),
    /// QUIT - Close connection
    Quit,
}

impl Command {
    /// Serializes the command without its trailing CRLF.
    #[must_use]
    pub fn to_line(&self) -> String {
        match self {
            Self::Ehlo { hostname } => format!("EHLO {hostname}"),
            Self::AuthLogin => "AUTH LOGIN".to_string(),
            Self::AuthResponse(payload) => payload.expose().to_string(),
            Self::MailFrom { from } => format!("MAIL FROM:<{from}>"),
            Self::RcptTo { to } => format!("RCPT TO:<{to}>"),
            Self::Data => "DATA".to_string(),
            Self::Content(data) => data.clone(),
            Self::Quit => "QUIT".to_string(),
        }
    }
}

/// Log form: AUTH payloads and message content are never printed.
impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AuthResponse(_) => f.write_str("<credentials>"),
            Self::Content(data) => write!(f, "<message: {} bytes>", data.len()),
            other => f.write_str(&other.to_line()),
        }
    }
}
