//! SMTP reply line parser.

use crate::error::{Error, Result};
use crate::types::{Reply, ReplyCode};

/// Parses one server line (CRLF already removed) into a [`Reply`].
///
/// Accepted shapes:
/// - Final: `250 OK` or a bare `250`
/// - Continuation: `250-PIPELINING`
///
/// # Errors
///
/// Returns [`Error::Protocol`] if the line does not start with three digits
/// followed by a space, a dash or nothing.
pub fn parse_reply_line(line: &str) -> Result<Reply> {
    let bytes = line.as_bytes();
    if bytes.len() < 3 || !bytes[..3].iter().all(u8::is_ascii_digit) {
        return Err(Error::Protocol(format!("Invalid reply code: {line:?}")));
    }

    let code = bytes[..3]
        .iter()
        .fold(0u16, |acc, digit| acc * 10 + u16::from(digit - b'0'));

    let continuation = match bytes.get(3) {
        None | Some(b' ') => false,
        Some(b'-') => true,
        Some(_) => {
            return Err(Error::Protocol(format!("Malformed reply line: {line:?}")));
        }
    };

    // Byte 3 is ASCII, so index 4 is a char boundary
    let text = line.get(4..).unwrap_or_default();

    let code = ReplyCode::new(code);
    Ok(if continuation {
        Reply::continuation(code, text)
    } else {
        Reply::new(code, text)
    })
}
