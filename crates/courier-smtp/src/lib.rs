//! # courier-smtp
//!
//! A small SMTP submission client that sends exactly one plain-text message
//! per call over implicit TLS (port 465).
//!
//! ## Features
//!
//! - **One message, one session**: connect, authenticate with `AUTH LOGIN`,
//!   submit, `QUIT`, close. No pooling, no retries.
//! - **Explicit state machine**: every server reply is checked against the
//!   code the current state expects; anything else aborts the call.
//! - **Injection-safe**: CR and LF are stripped from addresses and subject,
//!   body lines are dot-stuffed.
//! - **Bounded**: one timeout covers connection setup and every read.
//!
//! ## Quick Start
//!
//! ```ignore
//! use courier_smtp::{Credentials, Message, ServerEndpoint, send_mail};
//!
//! #[tokio::main]
//! async fn main() -> courier_smtp::Result<()> {
//!     let endpoint = ServerEndpoint::new("smtp.example.com", 465);
//!     let credentials = Credentials::new("mailer@example.com", "password");
//!     let message = Message::new(
//!         "mailer@example.com",
//!         "owner@example.com",
//!         "New comment on your post",
//!         "Someone replied.",
//!     )?;
//!
//!     send_mail(&endpoint, &credentials, &message).await
//! }
//! ```
//!
//! ## Dialogue
//!
//! ```text
//! GREETING ─220→ EHLO ─250→ AUTH ─334→ AUTH_USERNAME ─334→ AUTH_PASSWORD
//!    ─235→ MAIL_FROM ─250→ RCPT_TO ─250→ DATA ─354→ BODY ─250→ QUIT ─221→ DONE
//! ```
//!
//! ## Modules
//!
//! - [`client`]: `send_mail` and the dialogue driver
//! - [`command`]: SMTP command builders
//! - [`config`]: environment configuration
//! - [`connection`]: TLS setup and the line-buffered transport
//! - [`machine`]: the submission state machine
//! - [`parser`]: reply line parser
//! - [`types`]: addresses, credentials, messages, replies

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

pub mod client;
pub mod command;
pub mod config;
pub mod connection;
mod error;
pub mod machine;
pub mod parser;
pub mod types;

pub use client::{Mailer, SendOptions, deliver, send_mail, send_mail_with};
pub use config::MailerConfig;
pub use connection::{ServerEndpoint, Transport};
pub use error::{Error, Result};
pub use machine::State;
pub use types::{Address, Credentials, Message, Reply, ReplyCode};
