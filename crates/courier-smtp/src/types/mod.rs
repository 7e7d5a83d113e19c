//! Core SMTP types.

mod address;
mod credentials;
mod message;
mod reply;

pub use address::{Address, strip_line_breaks};
pub use credentials::{Credentials, Secret};
pub use message::Message;
pub use reply::{Reply, ReplyCode};
