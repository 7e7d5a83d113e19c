//! The single plain-text message a send call delivers.

use std::fmt::Write as _;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;

use super::address::{Address, strip_line_breaks};
use crate::error::{Error, Result};

/// Sender, recipient, subject and plain-text body.
///
/// Built by the caller; the send call only reads it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    from: Address,
    to: Address,
    subject: String,
    body: String,
}

impl Message {
    /// Creates a message.
    ///
    /// CR and LF are stripped from both addresses and the subject before
    /// anything else looks at them.
    ///
    /// # Errors
    ///
    /// Returns an error if an address is invalid or the subject or body is empty.
    pub fn new(
        from: impl AsRef<str>,
        to: impl AsRef<str>,
        subject: impl AsRef<str>,
        body: impl Into<String>,
    ) -> Result<Self> {
        let from = Address::new(from)?;
        let to = Address::new(to)?;

        let subject = strip_line_breaks(subject.as_ref());
        if subject.trim().is_empty() {
            return Err(Error::InvalidMessage("subject is required".into()));
        }

        let body = body.into();
        if body.trim().is_empty() {
            return Err(Error::InvalidMessage("body is required".into()));
        }

        Ok(Self {
            from,
            to,
            subject,
            body,
        })
    }

    /// Envelope and header sender.
    #[must_use]
    pub const fn from(&self) -> &Address {
        &self.from
    }

    /// Envelope and header recipient.
    #[must_use]
    pub const fn to(&self) -> &Address {
        &self.to
    }

    /// Subject with line breaks removed.
    #[must_use]
    pub fn subject(&self) -> &str {
        &self.subject
    }

    /// Builds the DATA payload: headers, blank line, dot-stuffed body and
    /// the `\r\n.` end-of-data marker.
    ///
    /// The transport appends the final CRLF.
    #[must_use]
    pub fn to_data(&self) -> String {
        let mut data = String::with_capacity(self.body.len() + 256);

        let _ = write!(data, "From: {}\r\n", self.from);
        let _ = write!(data, "To: {}\r\n", self.to);
        data.push_str(&header_field("Subject", &self.subject));
        data.push_str("\r\n");
        data.push_str("MIME-Version: 1.0\r\n");
        data.push_str("Content-Type: text/plain; charset=utf-8\r\n");
        data.push_str("\r\n");

        for (i, line) in body_lines(&self.body).enumerate() {
            if i > 0 {
                data.push_str("\r\n");
            }
            // A leading '.' gets doubled so the line is not read as the terminator
            if line.starts_with('.') {
                data.push('.');
            }
            data.push_str(line);
        }

        data.push_str("\r\n.");
        data
    }
}

/// Splits a body on CRLF, LF or lone CR, dropping one trailing line break.
fn body_lines(body: &str) -> impl Iterator<Item = &str> {
    let body = body
        .strip_suffix("\r\n")
        .or_else(|| body.strip_suffix('\n'))
        .or_else(|| body.strip_suffix('\r'))
        .unwrap_or(body);

    body.split("\r\n").flat_map(|chunk| chunk.split(['\r', '\n']))
}

/// Width header lines are folded to when there is whitespace to fold at.
const FOLD_WIDTH: usize = 78;

/// Hard limit on a line of the message, CRLF excluded.
const MAX_LINE_OCTETS: usize = 998;

/// UTF-8 bytes per encoded-word: 48 base64 characters plus 12 of framing,
/// so `Subject: ` and one word stay within 76 characters.
const ENCODED_WORD_BYTES: usize = 36;

/// Renders `name: value` as one header field, folded with CRLF SP.
///
/// Plain ASCII values fold at spaces. Anything else, including ASCII with a
/// word too long to fit on one line, becomes a run of RFC 2047 encoded-words.
fn header_field(name: &str, value: &str) -> String {
    let room = MAX_LINE_OCTETS - name.len() - 2;
    let needs_encoding = !value.is_ascii()
        || value.contains("=?")
        || value.split(' ').any(|word| word.len() > room);

    if needs_encoding {
        let words: Vec<String> = encoded_words(value).collect();
        return format!("{name}: {}", words.join("\r\n "));
    }

    let mut field = format!("{name}:");
    let mut line_len = field.len();
    for (i, word) in value.split(' ').enumerate() {
        if i > 0 && !word.is_empty() && line_len + 1 + word.len() > FOLD_WIDTH {
            field.push_str("\r\n");
            line_len = 0;
        }
        field.push(' ');
        field.push_str(word);
        line_len += 1 + word.len();
    }
    field
}

/// Splits `value` on character boundaries into `=?utf-8?B?...?=` words.
fn encoded_words(value: &str) -> impl Iterator<Item = String> + '_ {
    let mut rest = value;
    std::iter::from_fn(move || {
        if rest.is_empty() {
            return None;
        }

        let mut end = 0;
        for (i, c) in rest.char_indices() {
            if i + c.len_utf8() > ENCODED_WORD_BYTES {
                break;
            }
            end = i + c.len_utf8();
        }

        let (chunk, tail) = rest.split_at(end);
        rest = tail;
        Some(format!("=?utf-8?B?{}?=", STANDARD.encode(chunk)))
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn message(subject: &str, body: &str) -> Message {
        Message::new("site@example.com", "owner@example.com", subject, body).unwrap()
    }

    /// Splits a DATA payload into (header lines, body lines).
    fn split_data(data: &str) -> (Vec<&str>, Vec<&str>) {
        let (headers, body) = data.split_once("\r\n\r\n").unwrap();
        (headers.split("\r\n").collect(), body.split("\r\n").collect())
    }

    #[test]
    fn data_layout() {
        let data = message("New comment", "Hello\nWorld").to_data();
        assert_eq!(
            data,
            "From: site@example.com\r\n\
             To: owner@example.com\r\n\
             Subject: New comment\r\n\
             MIME-Version: 1.0\r\n\
             Content-Type: text/plain; charset=utf-8\r\n\
             \r\n\
             Hello\r\n\
             World\r\n\
             ."
        );
    }

    #[test]
    fn leading_dots_are_doubled() {
        let data = message("dots", ".\n..two\nmid.dle\n.end").to_data();
        let (_, body) = split_data(&data);
        assert_eq!(body, vec!["..", "...two", "mid.dle", "..end", "."]);
    }

    #[test]
    fn line_endings_are_normalised() {
        let data = message("eol", "a\r\nb\rc\nd\n").to_data();
        let (_, body) = split_data(&data);
        assert_eq!(body, vec!["a", "b", "c", "d", "."]);
    }

    #[test]
    fn blank_body_lines_survive() {
        let data = message("gap", "first\n\nthird").to_data();
        let (_, body) = split_data(&data);
        assert_eq!(body, vec!["first", "", "third", "."]);
    }

    #[test]
    fn header_injection_is_neutralised() {
        let msg = Message::new(
            "site@example.com\r\n",
            "owner@example.com\nBcc:x@evil.test",
            "Hi\r\nBcc: victim@example.com",
            "body",
        );
        // The recipient collapses into an address with two @ and is refused
        assert!(msg.is_err());

        let msg = Message::new(
            "site@example.com\r\n",
            "owner@example.com\n",
            "Hi\r\nBcc: victim@example.com",
            "body",
        )
        .unwrap();
        let data = msg.to_data();
        let (headers, _) = split_data(&data);
        assert_eq!(headers.len(), 5);
        assert_eq!(headers[2], "Subject: HiBcc: victim@example.com");
        assert!(!headers.iter().any(|h| h.starts_with("Bcc")));
    }

    #[test]
    fn non_ascii_subject_is_encoded() {
        let data = message("Grüße", "x").to_data();
        let (headers, _) = split_data(&data);
        assert_eq!(headers[2], "Subject: =?utf-8?B?R3LDvMOfZQ==?=");
    }

    /// The Subject field as sent, folds included.
    fn subject_field(data: &str) -> &str {
        let start = data.find("Subject:").unwrap();
        let end = data.find("\r\nMIME-Version:").unwrap();
        &data[start..end]
    }

    fn decode_words(field: &str) -> String {
        let mut bytes = Vec::new();
        for word in field.trim_start_matches("Subject:").split("\r\n") {
            let word = word.trim();
            assert!(word.len() <= 75, "encoded-word too long: {word}");
            let payload = word
                .strip_prefix("=?utf-8?B?")
                .and_then(|w| w.strip_suffix("?="))
                .unwrap();
            bytes.extend(STANDARD.decode(payload).unwrap());
        }
        String::from_utf8(bytes).unwrap()
    }

    #[test]
    fn long_non_ascii_subject_splits_into_encoded_words() {
        let subject = "Neuer Kommentar zu Ihrem Beitrag über Grüße aus München";
        let data = message(subject, "x").to_data();
        let field = subject_field(&data);

        assert_eq!(
            field,
            "Subject: =?utf-8?B?TmV1ZXIgS29tbWVudGFyIHp1IElocmVtIEJlaXRyYWcgw7xi?=\r\n \
             =?utf-8?B?ZXIgR3LDvMOfZSBhdXMgTcO8bmNoZW4=?="
        );
        assert_eq!(decode_words(field), subject);
    }

    #[test]
    fn encoded_words_never_split_a_character() {
        let subject = "ü".repeat(100);
        let data = message(&subject, "x").to_data();
        let field = subject_field(&data);

        assert!(field.split("\r\n").all(|line| line.len() <= 76));
        assert_eq!(decode_words(field), subject);
    }

    #[test]
    fn long_ascii_subject_folds_at_spaces() {
        let subject = ["comment"; 150].join(" ");
        let data = message(&subject, "x").to_data();
        let field = subject_field(&data);

        let lines: Vec<&str> = field.split("\r\n").collect();
        assert!(lines.len() > 1);
        assert!(lines.iter().all(|line| line.len() <= FOLD_WIDTH));
        assert!(lines[1..].iter().all(|line| line.starts_with(' ')));
        assert_eq!(field.replace("\r\n", ""), format!("Subject: {subject}"));
    }

    #[test]
    fn unbreakable_ascii_subject_is_encoded() {
        let subject = "x".repeat(1200);
        let data = message(&subject, "x").to_data();
        let field = subject_field(&data);

        assert!(field.split("\r\n").all(|line| line.len() <= MAX_LINE_OCTETS));
        assert_eq!(decode_words(field), subject);
    }

    #[test]
    fn required_fields() {
        assert!(matches!(
            Message::new("a@b.c", "d@e.f", "\r\n", "body"),
            Err(Error::InvalidMessage(_))
        ));
        assert!(matches!(
            Message::new("a@b.c", "d@e.f", "subject", "  \n"),
            Err(Error::InvalidMessage(_))
        ));
        assert!(matches!(
            Message::new("", "d@e.f", "subject", "body"),
            Err(Error::InvalidAddress(_))
        ));
    }

    fn with_breaks(parts: Vec<String>, breaks: Vec<&'static str>) -> String {
        parts
            .into_iter()
            .zip(breaks.into_iter().chain(std::iter::repeat("")))
            .map(|(part, brk)| format!("{part}{brk}"))
            .collect()
    }

    fn line_break() -> impl Strategy<Value = &'static str> {
        prop_oneof![Just("\r\n"), Just("\r"), Just("\n"), Just("")]
    }

    proptest! {
        #[test]
        fn headers_never_carry_injected_breaks(
            local in prop::collection::vec("[a-z]{1,4}", 1..4),
            local_breaks in prop::collection::vec(line_break(), 0..4),
            subject in prop::collection::vec("[ -~]{1,8}", 1..5),
            subject_breaks in prop::collection::vec(line_break(), 0..5),
        ) {
            let address = format!("{}@example.com", with_breaks(local, local_breaks));
            let subject = format!("x{}", with_breaks(subject, subject_breaks));

            let msg = Message::new(&address, &address, &subject, "body").unwrap();
            let data = msg.to_data();
            let (headers, _) = split_data(&data);

            prop_assert_eq!(headers.len(), 5);
            for header in headers {
                prop_assert!(!header.contains('\r') && !header.contains('\n'));
            }
        }

        #[test]
        fn subject_lines_stay_within_limits(subject in "x\\PC{0,400}") {
            let data = message(&subject, "body").to_data();
            let field = subject_field(&data);

            for line in field.split("\r\n") {
                prop_assert!(line.len() <= MAX_LINE_OCTETS);
                prop_assert!(!line.trim().is_empty());
            }
        }

        #[test]
        fn dot_stuffing_keeps_one_terminator(
            lines in prop::collection::vec("[.a-z]{1,6}", 1..12),
        ) {
            let data = message("dots", &lines.join("\n")).to_data();
            let (_, sent) = split_data(&data);

            prop_assert_eq!(sent.len(), lines.len() + 1);
            prop_assert_eq!(sent.iter().filter(|l| **l == ".").count(), 1);
            prop_assert_eq!(*sent.last().unwrap(), ".");

            for (original, line) in lines.iter().zip(&sent) {
                if original.starts_with('.') {
                    prop_assert_eq!(line.to_string(), format!(".{original}"));
                } else {
                    prop_assert_eq!(*line, original.as_str());
                }
            }
        }
    }
}
