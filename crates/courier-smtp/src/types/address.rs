//! Email address types.

use crate::error::{Error, Result};

/// Email address for the SMTP envelope and the `From`/`To` headers.
///
/// CR and LF are stripped on construction, so an `Address` can never break
/// out of the command or header line it is placed in.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Address(String);

impl Address {
    /// Creates a new address from a string.
    ///
    /// # Errors
    ///
    /// Returns an error if the address is invalid.
    pub fn new(addr: impl AsRef<str>) -> Result<Self> {
        let addr = strip_line_breaks(addr.as_ref());
        let addr = addr.trim();
        Self::validate(addr)?;
        Ok(Self(addr.to_string()))
    }

    /// Returns the address as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Validates an email address (basic validation).
    fn validate(addr: &str) -> Result<()> {
        if addr.is_empty() {
            return Err(Error::InvalidAddress("Address cannot be empty".into()));
        }

        if addr
            .chars()
            .any(|c| c.is_whitespace() || c == '<' || c == '>')
        {
            return Err(Error::InvalidAddress(
                "Address cannot contain whitespace or angle brackets".into(),
            ));
        }

        let Some((local, domain)) = addr.split_once('@') else {
            return Err(Error::InvalidAddress("Address must contain @".into()));
        };

        if domain.contains('@') {
            return Err(Error::InvalidAddress(
                "Address must have exactly one @".into(),
            ));
        }

        if local.is_empty() || domain.is_empty() {
            return Err(Error::InvalidAddress(
                "Local and domain parts cannot be empty".into(),
            ));
        }

        Ok(())
    }
}

impl std::fmt::Display for Address {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Removes every CR and LF character.
///
/// Applied unconditionally to anything user-supplied that ends up in a
/// command or header line.
#[must_use]
pub fn strip_line_breaks(value: &str) -> String {
    value.chars().filter(|c| !matches!(c, '\r' | '\n')).collect()
}
