//! Line-oriented session over one byte stream.
//!
//! SMTP replies are CRLF-terminated lines that can arrive split across
//! reads or several to a read. The session keeps whatever follows the first
//! CRLF buffered for the next call.

use std::io;
use std::time::Duration;

use bytes::BytesMut;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::time::timeout;
use tracing::{debug, trace};

use crate::error::{Error, Result};
use crate::parser::parse_reply_line;
use crate::types::Reply;

/// Default buffer size for reading.
const DEFAULT_BUFFER_SIZE: usize = 4096;

/// Maximum line length to prevent memory exhaustion.
const MAX_LINE_LENGTH: usize = 64 * 1024;

/// One open session: the stream, its receive buffer and the timeout that
/// bounds every read and write.
pub struct Transport<S> {
    stream: S,
    buffer: BytesMut,
    timeout: Duration,
    open: bool,
}

impl<S> Transport<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    /// Wraps an already-connected stream.
    pub fn new(stream: S, timeout: Duration) -> Self {
        Self {
            stream,
            buffer: BytesMut::with_capacity(DEFAULT_BUFFER_SIZE),
            timeout,
            open: true,
        }
    }

    /// Returns true until [`Transport::close`] has run.
    pub const fn is_open(&self) -> bool {
        self.open
    }

    /// Writes `line` followed by CRLF and flushes.
    ///
    /// `line` must not contain CR or LF except inside a DATA block.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Write`] on a socket failure or after close, and
    /// [`Error::Timeout`] if the write stalls.
    pub async fn write_line(&mut self, line: &str) -> Result<()> {
        if !self.open {
            return Err(Error::Write(io::Error::new(
                io::ErrorKind::NotConnected,
                "session closed",
            )));
        }

        let mut frame = BytesMut::with_capacity(line.len() + 2);
        frame.extend_from_slice(line.as_bytes());
        frame.extend_from_slice(b"\r\n");

        let limit = self.timeout;
        let stream = &mut self.stream;
        let write = async move {
            stream.write_all(&frame).await?;
            stream.flush().await
        };

        match timeout(limit, write).await {
            Ok(Ok(())) => Ok(()),
            Ok(Err(e)) => Err(Error::Write(e)),
            Err(_) => Err(Error::Timeout(limit)),
        }
    }

    /// Reads and parses the next reply line, continuation or final.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Protocol`] for an unparseable or oversized line,
    /// [`Error::Read`] if the server hangs up and [`Error::Timeout`] if no
    /// data arrives in time.
    pub async fn read_reply(&mut self) -> Result<Reply> {
        let line = self.read_line().await?;
        parse_reply_line(&line)
    }

    /// Reads reply lines until a final one arrives; continuation lines are dropped.
    ///
    /// # Errors
    ///
    /// See [`Transport::read_reply`].
    pub async fn read_final_reply(&mut self) -> Result<Reply> {
        loop {
            let reply = self.read_reply().await?;
            if reply.is_final() {
                debug!("S: {} {}", reply.code, reply.text);
                return Ok(reply);
            }
            trace!("S: {}-{}", reply.code, reply.text);
        }
    }

    /// Shuts the stream down. Never fails; only the first call does anything.
    pub async fn close(&mut self) {
        if !self.open {
            return;
        }
        self.open = false;

        match timeout(self.timeout, self.stream.shutdown()).await {
            Ok(Ok(())) => debug!("session closed"),
            Ok(Err(e)) => debug!(error = %e, "shutdown failed, dropping stream"),
            Err(_) => debug!("shutdown timed out, dropping stream"),
        }
    }

    /// Returns one line without its CRLF.
    async fn read_line(&mut self) -> Result<String> {
        loop {
            if let Some(pos) = find_crlf(&self.buffer) {
                let line = self.buffer.split_to(pos + 2);
                return Ok(String::from_utf8_lossy(&line[..pos]).into_owned());
            }

            if self.buffer.len() > MAX_LINE_LENGTH {
                return Err(Error::Protocol("line too long".to_string()));
            }

            self.fill().await?;
        }
    }

    /// Appends whatever the next socket read returns to the buffer.
    async fn fill(&mut self) -> Result<()> {
        if !self.open {
            return Err(Error::Read(io::Error::new(
                io::ErrorKind::NotConnected,
                "session closed",
            )));
        }

        self.buffer.reserve(DEFAULT_BUFFER_SIZE);

        let limit = self.timeout;
        match timeout(limit, self.stream.read_buf(&mut self.buffer)).await {
            Ok(Ok(0)) => Err(Error::Read(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "connection closed by server",
            ))),
            Ok(Ok(_)) => Ok(()),
            Ok(Err(e)) => Err(Error::Read(e)),
            Err(_) => Err(Error::Timeout(limit)),
        }
    }
}

impl<S> std::fmt::Debug for Transport<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Transport")
            .field("buffered", &self.buffer.len())
            .field("timeout", &self.timeout)
            .field("open", &self.open)
            .finish_non_exhaustive()
    }
}

/// Finds the position of CRLF in a buffer.
fn find_crlf(buf: &[u8]) -> Option<usize> {
    buf.windows(2).position(|w| w == b"\r\n")
}
