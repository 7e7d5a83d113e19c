use clap::Parser;

/// Command line arguments.
#[derive(Debug, Parser)]
#[command(name = "courier", version, about = "Send one email over SMTP submission")]
pub struct Cli {
    /// Recipient address.
    #[arg(short, long, value_name = "ADDRESS")]
    pub to: String,

    /// Subject line.
    #[arg(short, long)]
    pub subject: String,

    /// Sender address; defaults to SMTP_FROM.
    #[arg(short, long, value_name = "ADDRESS")]
    pub from: Option<String>,

    /// Message body; read from stdin when omitted.
    #[arg(short, long)]
    pub body: Option<String>,

    #[arg(
        short,
        long,
        default_value = "info",
        help = "Log level (trace, debug, info, warn, error)"
    )]
    pub log_level: String,
}
