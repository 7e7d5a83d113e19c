//! Mailer configuration from the environment.
//!
//! Everything is read and validated once at process start. A missing value
//! stops startup instead of surfacing on the first send.

use std::time::Duration;

use crate::client::{DEFAULT_TIMEOUT, SendOptions};
use crate::connection::ServerEndpoint;
use crate::error::{Error, Result};
use crate::machine::DEFAULT_LOCAL_IDENTITY;
use crate::types::{Address, Credentials};

/// SMTP server hostname.
pub const ENV_HOST: &str = "SMTP_HOST";
/// SMTP server port.
pub const ENV_PORT: &str = "SMTP_PORT";
/// Account username.
pub const ENV_USERNAME: &str = "SMTP_USERNAME";
/// Account password.
pub const ENV_PASSWORD: &str = "SMTP_PASSWORD";
/// Default sender address.
pub const ENV_FROM: &str = "SMTP_FROM";
/// EHLO identity (optional).
pub const ENV_HELO_NAME: &str = "SMTP_HELO_NAME";
/// Timeout in seconds (optional).
pub const ENV_TIMEOUT_SECS: &str = "SMTP_TIMEOUT_SECS";

/// Everything a [`crate::Mailer`] needs.
#[derive(Debug, Clone)]
pub struct MailerConfig {
    /// Submission server.
    pub endpoint: ServerEndpoint,
    /// Account credentials.
    pub credentials: Credentials,
    /// Sender used when the caller does not pick one.
    pub default_from: Address,
    /// EHLO identity and timeout.
    pub options: SendOptions,
}

impl MailerConfig {
    /// Loads the configuration from process environment variables.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] naming every missing or invalid variable.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Loads the configuration through `lookup`, which maps a variable name
    /// to its value.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] naming every missing or invalid variable.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut problems = Vec::new();

        let mut required = |key: &'static str| -> String {
            match lookup(key).filter(|v| !v.trim().is_empty()) {
                Some(value) => value,
                None => {
                    problems.push(format!("{key} is required"));
                    String::new()
                }
            }
        };

        let host = required(ENV_HOST);
        let port = required(ENV_PORT);
        let username = required(ENV_USERNAME);
        let password = required(ENV_PASSWORD);
        let from = required(ENV_FROM);

        let port = if port.is_empty() {
            0
        } else {
            match port.trim().parse::<u16>() {
                Ok(p) if p != 0 => p,
                _ => {
                    problems.push(format!("{ENV_PORT} must be 1-65535"));
                    0
                }
            }
        };

        let default_from = if from.is_empty() {
            None
        } else {
            match Address::new(&from) {
                Ok(addr) => Some(addr),
                Err(e) => {
                    problems.push(format!("{ENV_FROM}: {e}"));
                    None
                }
            }
        };

        let local_identity = lookup(ENV_HELO_NAME)
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_LOCAL_IDENTITY.to_string());

        let timeout = match lookup(ENV_TIMEOUT_SECS) {
            None => DEFAULT_TIMEOUT,
            Some(raw) => match raw.trim().parse::<u64>() {
                Ok(secs) if secs > 0 => Duration::from_secs(secs),
                _ => {
                    problems.push(format!("{ENV_TIMEOUT_SECS} must be a positive integer"));
                    DEFAULT_TIMEOUT
                }
            },
        };

        let Some(default_from) = default_from.filter(|_| problems.is_empty()) else {
            return Err(Error::Config(problems.join("; ")));
        };

        Ok(Self {
            endpoint: ServerEndpoint::new(host.trim(), port),
            credentials: Credentials::new(username, password),
            default_from,
            options: SendOptions::default()
                .with_local_identity(local_identity)
                .with_timeout(timeout),
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    fn complete() -> Vec<(&'static str, &'static str)> {
        vec![
            (ENV_HOST, "smtp.example.com"),
            (ENV_PORT, "465"),
            (ENV_USERNAME, "mailer@example.com"),
            (ENV_PASSWORD, "s3cret"),
            (ENV_FROM, "noreply@example.com"),
        ]
    }

    #[test]
    fn loads_complete_config_with_defaults() {
        let config = MailerConfig::from_lookup(lookup(&complete())).unwrap();

        assert_eq!(config.endpoint.host(), "smtp.example.com");
        assert_eq!(config.endpoint.port(), 465);
        assert_eq!(config.default_from.as_str(), "noreply@example.com");
        assert_eq!(config.options.local_identity, "localhost");
        assert_eq!(config.options.timeout, Duration::from_secs(10));
    }

    #[test]
    fn optional_settings_override_defaults() {
        let mut vars = complete();
        vars.push((ENV_HELO_NAME, "web.example.com"));
        vars.push((ENV_TIMEOUT_SECS, "30"));

        let config = MailerConfig::from_lookup(lookup(&vars)).unwrap();
        assert_eq!(config.options.local_identity, "web.example.com");
        assert_eq!(config.options.timeout, Duration::from_secs(30));
    }

    #[test]
    fn reports_every_missing_variable() {
        let err = MailerConfig::from_lookup(lookup(&[(ENV_HOST, "smtp.example.com")])).unwrap_err();

        let Error::Config(text) = err else {
            panic!("expected config error");
        };
        for key in [ENV_PORT, ENV_USERNAME, ENV_PASSWORD, ENV_FROM] {
            assert!(text.contains(key), "{key} missing from {text}");
        }
        assert!(!text.contains(ENV_HOST));
    }

    #[test]
    fn blank_values_count_as_missing() {
        let mut vars = complete();
        vars.retain(|(k, _)| *k != ENV_PASSWORD);
        vars.push((ENV_PASSWORD, "   "));

        assert!(matches!(
            MailerConfig::from_lookup(lookup(&vars)),
            Err(Error::Config(text)) if text.contains(ENV_PASSWORD)
        ));
    }

    #[test]
    fn rejects_bad_port_timeout_and_sender() {
        let vars = [
            (ENV_HOST, "smtp.example.com"),
            (ENV_PORT, "99999"),
            (ENV_USERNAME, "u"),
            (ENV_PASSWORD, "p"),
            (ENV_FROM, "not-an-address"),
            (ENV_TIMEOUT_SECS, "0"),
        ];

        let Err(Error::Config(text)) = MailerConfig::from_lookup(lookup(&vars)) else {
            panic!("expected config error");
        };
        assert!(text.contains(ENV_PORT));
        assert!(text.contains(ENV_FROM));
        assert!(text.contains(ENV_TIMEOUT_SECS));
    }

    #[test]
    fn debug_output_hides_password() {
        let config = MailerConfig::from_lookup(lookup(&complete())).unwrap();
        assert!(!format!("{config:?}").contains("s3cret"));
    }
}
