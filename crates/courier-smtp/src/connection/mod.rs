//! Transport session: one encrypted stream and its line buffer.

mod stream;
mod transport;

pub use stream::{SmtpStream, open};
pub use transport::Transport;

use std::fmt;

/// Where to deliver: host and port of an implicit-TLS submission server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerEndpoint {
    host: String,
    port: u16,
}

impl ServerEndpoint {
    /// Creates an endpoint.
    #[must_use]
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }

    /// Server hostname, also used for certificate verification.
    #[must_use]
    pub fn host(&self) -> &str {
        &self.host
    }

    /// Server port.
    #[must_use]
    pub const fn port(&self) -> u16 {
        self.port
    }

    /// Always true: there is no way to turn certificate checks off.
    #[must_use]
    pub const fn verifies_certificates(&self) -> bool {
        true
    }
}

impl fmt::Display for ServerEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}
