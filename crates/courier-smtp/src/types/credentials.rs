//! AUTH LOGIN credentials.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;

/// A string that never shows up in `Debug` output.
///
/// Has no `Display` impl; read the value with [`Secret::expose`].
#[derive(Clone, PartialEq, Eq)]
pub struct Secret(String);

impl Secret {
    /// Wraps a sensitive value.
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Returns the wrapped value.
    #[must_use]
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for Secret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Secret(***)")
    }
}

/// Username and password for `AUTH LOGIN`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    username: Secret,
    password: Secret,
}

impl Credentials {
    /// Creates credentials.
    #[must_use]
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: Secret::new(username),
            password: Secret::new(password),
        }
    }

    /// Base64 username, sent after the first 334 challenge.
    pub(crate) fn login_username(&self) -> Secret {
        Secret(encode_login(self.username.expose()))
    }

    /// Base64 password, sent after the second 334 challenge.
    pub(crate) fn login_password(&self) -> Secret {
        Secret(encode_login(self.password.expose()))
    }
}

fn encode_login(value: &str) -> String {
    STANDARD.encode(value.as_bytes())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn login_payloads() {
        let credentials = Credentials::new("user@example.com", "hunter2");
        assert_eq!(
            credentials.login_username().expose(),
            "dXNlckBleGFtcGxlLmNvbQ=="
        );
        assert_eq!(credentials.login_password().expose(), "aHVudGVyMg==");
    }

    #[test]
    fn debug_output_is_redacted() {
        let credentials = Credentials::new("alice", "correct horse");
        let shown = format!("{credentials:?}");
        assert!(!shown.contains("alice"));
        assert!(!shown.contains("correct horse"));
        assert!(shown.contains("***"));
    }

    proptest! {
        #[test]
        fn login_encoding_round_trips(username in "\\PC*", password in "\\PC*") {
            let credentials = Credentials::new(username.clone(), password.clone());

            let user = STANDARD.decode(credentials.login_username().expose()).unwrap();
            let pass = STANDARD.decode(credentials.login_password().expose()).unwrap();

            prop_assert_eq!(user, username.into_bytes());
            prop_assert_eq!(pass, password.into_bytes());
        }
    }
}
