//! Submission dialogue state machine.
//!
//! Pure: consumes final reply lines and yields the next command without
//! performing any I/O. The driver in [`crate::client`] owns the socket.
//!
//! ```text
//! GREETING ─220→ EHLO ─250→ AUTH ─334→ AUTH_USERNAME ─334→ AUTH_PASSWORD
//!    ─235→ MAIL_FROM ─250→ RCPT_TO ─250→ DATA ─354→ BODY ─250→ QUIT ─221→ DONE
//! ```

use std::fmt;

use crate::command::Command;
use crate::error::{Error, Result};
use crate::types::{Credentials, Message, Reply, ReplyCode, strip_line_breaks};

/// Identity sent with EHLO when none is configured.
pub const DEFAULT_LOCAL_IDENTITY: &str = "localhost";

/// Dialogue state: which reply the client is waiting for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum State {
    /// Waiting for the server greeting.
    Greeting,
    /// EHLO sent.
    Ehlo,
    /// AUTH LOGIN sent.
    Auth,
    /// Username sent.
    AuthUsername,
    /// Password sent.
    AuthPassword,
    /// MAIL FROM sent.
    MailFrom,
    /// RCPT TO sent.
    RcptTo,
    /// DATA sent.
    Data,
    /// Message content sent.
    Body,
    /// QUIT sent.
    Quit,
    /// QUIT acknowledged.
    Done,
}

impl State {
    /// Every state in dialogue order.
    pub const ALL: [Self; 11] = [
        Self::Greeting,
        Self::Ehlo,
        Self::Auth,
        Self::AuthUsername,
        Self::AuthPassword,
        Self::MailFrom,
        Self::RcptTo,
        Self::Data,
        Self::Body,
        Self::Quit,
        Self::Done,
    ];

    /// Upper-case name used in logs and errors.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Greeting => "GREETING",
            Self::Ehlo => "EHLO",
            Self::Auth => "AUTH",
            Self::AuthUsername => "AUTH_USERNAME",
            Self::AuthPassword => "AUTH_PASSWORD",
            Self::MailFrom => "MAIL_FROM",
            Self::RcptTo => "RCPT_TO",
            Self::Data => "DATA",
            Self::Body => "BODY",
            Self::Quit => "QUIT",
            Self::Done => "DONE",
        }
    }

    /// Reply code this state accepts, `None` once the dialogue is over.
    #[must_use]
    pub const fn expected_code(self) -> Option<ReplyCode> {
        match step(self) {
            Some((code, _, _)) => Some(code),
            None => None,
        }
    }
}

impl fmt::Display for State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// What the driver does after an accepted reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Send `EHLO <identity>`.
    Ehlo,
    /// Send `AUTH LOGIN`.
    AuthLogin,
    /// Send the base64 username.
    Username,
    /// Send the base64 password.
    Password,
    /// Send `MAIL FROM:<from>`.
    MailFrom,
    /// Send `RCPT TO:<to>`.
    RcptTo,
    /// Send `DATA`.
    Data,
    /// Send headers, body and terminator.
    Content,
    /// Send `QUIT`.
    Quit,
    /// Nothing left to send; close and report success.
    Finish,
}

/// The transition table: expected code, next state, action.
const fn step(state: State) -> Option<(ReplyCode, State, Action)> {
    Some(match state {
        State::Greeting => (ReplyCode::SERVICE_READY, State::Ehlo, Action::Ehlo),
        State::Ehlo => (ReplyCode::OK, State::Auth, Action::AuthLogin),
        State::Auth => (ReplyCode::AUTH_CONTINUE, State::AuthUsername, Action::Username),
        State::AuthUsername => (ReplyCode::AUTH_CONTINUE, State::AuthPassword, Action::Password),
        State::AuthPassword => (ReplyCode::AUTH_SUCCEEDED, State::MailFrom, Action::MailFrom),
        State::MailFrom => (ReplyCode::OK, State::RcptTo, Action::RcptTo),
        State::RcptTo => (ReplyCode::OK, State::Data, Action::Data),
        State::Data => (ReplyCode::START_DATA, State::Body, Action::Content),
        State::Body => (ReplyCode::OK, State::Quit, Action::Quit),
        State::Quit => (ReplyCode::CLOSING, State::Done, Action::Finish),
        State::Done => return None,
    })
}

/// Applies one final reply to `state`.
///
/// # Errors
///
/// Returns [`Error::Rejected`] if the code is not the one `state` expects and
/// [`Error::Protocol`] if the dialogue is already over.
pub fn transition(state: State, reply: &Reply) -> Result<(State, Action)> {
    let Some((expected, next, action)) = step(state) else {
        return Err(Error::Protocol(format!(
            "Reply after dialogue finished: {} {}",
            reply.code, reply.text
        )));
    };

    if reply.code != expected {
        return Err(Error::rejected(state, reply.code.as_u16(), reply.text.clone()));
    }

    Ok((next, action))
}

/// One submission run: the current state plus what the commands are built from.
#[derive(Debug)]
pub struct Dialogue<'a> {
    state: State,
    identity: String,
    credentials: &'a Credentials,
    message: &'a Message,
}

impl<'a> Dialogue<'a> {
    /// Starts a dialogue in [`State::Greeting`].
    ///
    /// CR and LF are stripped from `identity`; an empty identity falls back to
    /// [`DEFAULT_LOCAL_IDENTITY`].
    #[must_use]
    pub fn new(identity: &str, credentials: &'a Credentials, message: &'a Message) -> Self {
        let identity = strip_line_breaks(identity).trim().to_string();
        let identity = if identity.is_empty() {
            DEFAULT_LOCAL_IDENTITY.to_string()
        } else {
            identity
        };

        Self {
            state: State::Greeting,
            identity,
            credentials,
            message,
        }
    }

    /// Current state.
    #[must_use]
    pub const fn state(&self) -> State {
        self.state
    }

    /// True once QUIT has been acknowledged.
    #[must_use]
    pub const fn is_done(&self) -> bool {
        matches!(self.state, State::Done)
    }

    /// Feeds one final reply.
    ///
    /// Returns the command to write next, or `None` once the server has
    /// acknowledged QUIT. On error the state is left unchanged.
    ///
    /// # Errors
    ///
    /// See [`transition`].
    pub fn advance(&mut self, reply: &Reply) -> Result<Option<Command>> {
        let (next, action) = transition(self.state, reply)?;
        self.state = next;
        Ok(self.command(action))
    }

    fn command(&self, action: Action) -> Option<Command> {
        let command = match action {
            Action::Ehlo => Command::Ehlo {
                hostname: self.identity.clone(),
            },
            Action::AuthLogin => Command::AuthLogin,
            Action::Username => Command::AuthResponse(self.credentials.login_username()),
            Action::Password => Command::AuthResponse(self.credentials.login_password()),
            Action::MailFrom => Command::MailFrom {
                from: self.message.from().clone(),
            },
            Action::RcptTo => Command::RcptTo {
                to: self.message.to().clone(),
            },
            Action::Data => Command::Data,
            Action::Content => Command::Content(self.message.to_data()),
            Action::Quit => Command::Quit,
            Action::Finish => return None,
        };
        Some(command)
    }
}
