//! Sending one message: open, run the dialogue, close.

use std::time::Duration;

use tokio::io::{AsyncRead, AsyncWrite};
use tracing::{debug, info, warn};

use crate::command::Command;
use crate::config::MailerConfig;
use crate::connection::{self, ServerEndpoint, Transport};
use crate::error::{Error, Result};
use crate::machine::{DEFAULT_LOCAL_IDENTITY, Dialogue, State};
use crate::types::{Address, Credentials, Message};

/// Default connect and per-read timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Per-call knobs that are not part of the endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SendOptions {
    /// Name announced with EHLO.
    pub local_identity: String,
    /// Bounds connection setup and every read and write.
    pub timeout: Duration,
}

impl Default for SendOptions {
    fn default() -> Self {
        Self {
            local_identity: DEFAULT_LOCAL_IDENTITY.to_string(),
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

impl SendOptions {
    /// Sets the EHLO identity.
    #[must_use]
    pub fn with_local_identity(mut self, identity: impl Into<String>) -> Self {
        self.local_identity = identity.into();
        self
    }

    /// Sets the timeout.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// Sends `message` through `endpoint` with default options.
///
/// # Errors
///
/// Returns the first failure; see [`Error`]. The session is closed before
/// this returns.
pub async fn send_mail(
    endpoint: &ServerEndpoint,
    credentials: &Credentials,
    message: &Message,
) -> Result<()> {
    send_mail_with(endpoint, credentials, message, &SendOptions::default()).await
}

/// Sends `message` through `endpoint`.
///
/// There is no overall deadline beyond the per-step timeout; wrap the call
/// in [`tokio::time::timeout`] if one is needed. Dropping the future drops
/// the socket.
///
/// # Errors
///
/// Returns the first failure; see [`Error`]. The session is closed before
/// this returns.
pub async fn send_mail_with(
    endpoint: &ServerEndpoint,
    credentials: &Credentials,
    message: &Message,
    options: &SendOptions,
) -> Result<()> {
    debug!(%endpoint, "opening SMTP session");
    let result = match connection::open(endpoint, options.timeout).await {
        Ok(transport) => deliver(transport, &options.local_identity, credentials, message).await,
        Err(e) => Err(e),
    };

    match &result {
        Ok(()) => info!(
            %endpoint,
            to = %message.to(),
            subject = message.subject(),
            "message delivered"
        ),
        Err(e) => warn!(%endpoint, error = %e, "message not sent"),
    }
    result
}

/// Runs the whole dialogue over an open transport and closes it.
///
/// After a rejection or an unparseable reply a `QUIT` is written without
/// waiting for its answer. The transport is closed exactly once on every
/// path.
///
/// # Errors
///
/// Returns the first failure; see [`Error`].
pub async fn deliver<S>(
    mut transport: Transport<S>,
    identity: &str,
    credentials: &Credentials,
    message: &Message,
) -> Result<()>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let mut dialogue = Dialogue::new(identity, credentials, message);
    let result = drive(&mut transport, &mut dialogue).await;

    let quit = matches!(&result, Err(e) if wants_quit(e));
    if quit && transport.is_open() {
        debug!("C: QUIT (after failure)");
        if let Err(quit_err) = transport.write_line(&Command::Quit.to_line()).await {
            debug!(error = %quit_err, "QUIT after failure not sent");
        }
    }

    transport.close().await;
    result
}

async fn drive<S>(transport: &mut Transport<S>, dialogue: &mut Dialogue<'_>) -> Result<()>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    loop {
        let reply = transport.read_final_reply().await?;
        let state = dialogue.state();

        let Some(command) = dialogue.advance(&reply).inspect_err(|e| {
            warn!(%state, error = %e, "unexpected reply");
        })?
        else {
            return Ok(());
        };

        debug!("C: {command}");
        transport.write_line(&command.to_line()).await?;
    }
}

/// The socket is still usable after these, so a polite QUIT is worth trying.
const fn wants_quit(error: &Error) -> bool {
    match error {
        Error::Rejected { state, .. } => !matches!(state, State::Quit | State::Done),
        Error::Protocol(_) => true,
        _ => false,
    }
}

/// Sends messages with settings loaded once at startup.
#[derive(Debug, Clone)]
pub struct Mailer {
    config: MailerConfig,
}

impl Mailer {
    /// Creates a mailer.
    #[must_use]
    pub const fn new(config: MailerConfig) -> Self {
        Self { config }
    }

    /// Configured sender address.
    #[must_use]
    pub const fn default_from(&self) -> &Address {
        &self.config.default_from
    }

    /// Builds a message from the configured sender.
    ///
    /// # Errors
    ///
    /// Returns an error if `to` is invalid or the subject or body is empty.
    pub fn message(
        &self,
        to: impl AsRef<str>,
        subject: impl AsRef<str>,
        body: impl Into<String>,
    ) -> Result<Message> {
        Message::new(self.config.default_from.as_str(), to, subject, body)
    }

    /// Sends one message.
    ///
    /// # Errors
    ///
    /// See [`send_mail_with`].
    pub async fn send(&self, message: &Message) -> Result<()> {
        send_mail_with(
            &self.config.endpoint,
            &self.config.credentials,
            message,
            &self.config.options,
        )
        .await
    }
}
