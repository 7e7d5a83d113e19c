//! `courier` - send one plain-text email through an SMTP submission server.
//!
//! Server and account settings come from `SMTP_*` environment variables;
//! see [`courier_smtp::config`].

#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

mod cli;

use anyhow::{Context, bail};
use clap::Parser;
use tokio::io::AsyncReadExt;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use courier_smtp::{Mailer, MailerConfig, Message};

use cli::Cli;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // RUST_LOG wins over --log-level
    let level = cli.log_level.clone();
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("courier={level},courier_smtp={level}").into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config = MailerConfig::from_env().context("invalid SMTP configuration")?;
    let mailer = Mailer::new(config);
    info!(from = %mailer.default_from(), "mailer configured");

    let body = match cli.body {
        Some(body) => body,
        None => {
            let mut body = String::new();
            tokio::io::stdin()
                .read_to_string(&mut body)
                .await
                .context("failed to read message body from stdin")?;
            body
        }
    };

    let message = match &cli.from {
        Some(from) => Message::new(from, &cli.to, &cli.subject, body),
        None => mailer.message(&cli.to, &cli.subject, body),
    }
    .context("invalid message")?;

    info!(to = %message.to(), "sending");
    if let Err(e) = mailer.send(&message).await {
        bail!(e.user_message());
    }

    Ok(())
}
