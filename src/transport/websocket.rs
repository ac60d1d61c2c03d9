//! WebSocket client connection.
//!
//! Implements the opening handshake and frame IO over a raw TCP connection,
//! with no protocol library underneath. Only the `ws://` scheme is supported;
//! there is no TLS, no fragmentation across frames, and no ping/pong
//! keep-alive: a ping from the server is surfaced to the caller as a binary
//! message and never answered. If an intermediary closes an idle socket, the
//! next read reports [`Error::ConnectionClosed`] or a timeout.
//!
//! # Connection Flow
//!
//! 1. Parse `ws://host[:port]/path` (default port 80)
//! 2. TCP connect, bounded by [`IO_TIMEOUT`]
//! 3. Send the HTTP/1.1 Upgrade request with a random 16-byte key
//! 4. Buffer the response until `\r\n\r\n`, require status 101
//! 5. Exchange frames; every read is bounded by [`IO_TIMEOUT`]

// ============================================================================
// Imports
// ============================================================================

use std::time::Duration;

use base64::Engine;
use base64::engine::general_purpose::STANDARD as Base64Standard;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::time::timeout;
use tracing::{debug, trace};
use url::Url;

use crate::error::{Error, Result};

use super::frame::{self, Frame, Opcode};

// ============================================================================
// Constants
// ============================================================================

/// Bound for the TCP connect and for each socket read (30s).
pub const IO_TIMEOUT: Duration = Duration::from_secs(30);

/// Upper bound on the handshake response before giving up.
const MAX_HANDSHAKE_RESPONSE: usize = 64 * 1024;

/// Header terminator of the handshake response.
const HEADER_TERMINATOR: &[u8] = b"\r\n\r\n";

// ============================================================================
// WsMessage
// ============================================================================

/// A message received from the server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WsMessage {
    /// Decoded text frame.
    Text(String),
    /// Payload of a binary, ping, pong or reserved-opcode frame.
    Binary(Vec<u8>),
    /// Close frame; the peer is tearing the connection down.
    Close,
}

// ============================================================================
// WsConnection
// ============================================================================

/// A WebSocket connection to the browser's debugging endpoint.
///
/// Exclusively owns the underlying TCP stream. All reads are bounded by
/// [`IO_TIMEOUT`]; a stalled peer surfaces as [`Error::Timeout`], never as a
/// silent hang.
#[derive(Debug)]
pub struct WsConnection {
    /// Underlying TCP stream.
    stream: TcpStream,
    /// Bytes received past the handshake terminator, drained before the
    /// socket is read again so no frame bytes are lost.
    read_buf: Vec<u8>,
}

impl WsConnection {
    /// Connects and performs the opening handshake.
    ///
    /// Only `ws://host[:port]/path` addresses are accepted; the port defaults
    /// to 80. The server's `Sec-WebSocket-Accept` value is deliberately not
    /// verified; the status line check is the only validation, matching the
    /// minimal client this transport replaces. This is a documented
    /// limitation, not an oversight.
    ///
    /// # Errors
    ///
    /// - [`Error::Config`] if the URL is malformed or not `ws://`
    /// - [`Error::Connection`] / [`Error::Timeout`] if the TCP connect fails
    /// - [`Error::Handshake`] if the response status is not HTTP 101
    /// - [`Error::ConnectionClosed`] if the peer closes mid-handshake
    pub async fn connect(url: &str) -> Result<Self> {
        let parsed =
            Url::parse(url).map_err(|e| Error::config(format!("invalid WebSocket URL: {e}")))?;

        if parsed.scheme() != "ws" {
            return Err(Error::config(format!(
                "only ws:// URLs are supported, got {}://",
                parsed.scheme()
            )));
        }

        let host = parsed
            .host_str()
            .ok_or_else(|| Error::config("WebSocket URL has no host"))?
            .to_string();
        let port = parsed.port().unwrap_or(80);
        let path = parsed.path();

        debug!(%host, port, path, "Connecting WebSocket");

        let stream = timeout(IO_TIMEOUT, TcpStream::connect((host.as_str(), port)))
            .await
            .map_err(|_| Error::timeout("tcp connect", IO_TIMEOUT.as_millis() as u64))?
            .map_err(|e| Error::connection(format!("connect to {host}:{port} failed: {e}")))?;

        let mut connection = Self {
            stream,
            read_buf: Vec::new(),
        };
        connection.handshake(&host, port, path).await?;

        debug!(%host, port, "WebSocket connection established");
        Ok(connection)
    }

    /// Wraps an already-connected stream, skipping the handshake.
    ///
    /// Used by the loopback test harness to drive both frame directions.
    #[cfg(test)]
    pub(crate) fn from_stream(stream: TcpStream) -> Self {
        Self {
            stream,
            read_buf: Vec::new(),
        }
    }

    /// Sends one complete masked text frame.
    ///
    /// The message is never fragmented: header, mask key and masked payload
    /// go out as one contiguous write.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Connection`] if the write fails.
    pub async fn send_text(&mut self, text: &str) -> Result<()> {
        let wire = Frame::text(text).encode()?;

        self.stream
            .write_all(&wire)
            .await
            .map_err(|e| Error::connection(format!("frame write failed: {e}")))?;

        trace!(bytes = wire.len(), "Frame sent");
        Ok(())
    }

    /// Receives one frame and decodes it into a message.
    ///
    /// Server frames are conventionally unmasked, but a masked frame is still
    /// honored. Ping, pong and reserved-opcode frames are returned as
    /// [`WsMessage::Binary`]; no automatic pong reply is sent.
    ///
    /// # Errors
    ///
    /// - [`Error::ConnectionClosed`] if the socket closes mid-frame
    /// - [`Error::Timeout`] if no data arrives within [`IO_TIMEOUT`]
    /// - [`Error::Protocol`] if a text frame is not valid UTF-8
    pub async fn recv(&mut self) -> Result<WsMessage> {
        let header = self.read_exact(2).await?;

        let opcode_bits = header[0] & 0x0F;
        let masked = header[1] & frame::MASK_BIT != 0;
        let length_marker = header[1] & 0x7F;

        let length = match length_marker {
            frame::LEN_U16 => {
                let bytes = self.read_exact(2).await?;
                u16::from_be_bytes([bytes[0], bytes[1]]) as usize
            }
            frame::LEN_U64 => {
                let bytes = self.read_exact(8).await?;
                let mut raw = [0u8; 8];
                raw.copy_from_slice(&bytes);
                let length = u64::from_be_bytes(raw);
                usize::try_from(length)
                    .map_err(|_| Error::protocol(format!("frame length {length} exceeds platform")))?
            }
            n => n as usize,
        };

        let mask = if masked {
            let bytes = self.read_exact(4).await?;
            Some([bytes[0], bytes[1], bytes[2], bytes[3]])
        } else {
            None
        };

        let mut payload = self.read_exact(length).await?;
        if let Some(key) = mask {
            frame::apply_mask(&mut payload, key);
        }

        trace!(opcode = opcode_bits, length, masked, "Frame received");

        match Opcode::from_u8(opcode_bits) {
            Some(Opcode::Text) => {
                let text = String::from_utf8(payload)
                    .map_err(|_| Error::protocol("text frame is not valid UTF-8"))?;
                Ok(WsMessage::Text(text))
            }
            Some(Opcode::Close) => Ok(WsMessage::Close),
            _ => Ok(WsMessage::Binary(payload)),
        }
    }

    /// Closes the connection.
    ///
    /// A masked empty close frame is sent best-effort (a failure of that
    /// send is deliberately ignored) and the stream is shut down
    /// unconditionally afterwards.
    pub async fn close(mut self) {
        if let Ok(wire) = Frame::close().encode() {
            // Ignored failure: the peer may already be gone.
            let _ = self.stream.write_all(&wire).await;
        }
        let _ = self.stream.shutdown().await;

        debug!("WebSocket connection closed");
    }

    // ========================================================================
    // IO primitives
    // ========================================================================

    /// Reads exactly `count` bytes, returning them as an owned buffer.
    ///
    /// Drains handshake leftovers first, then keeps reading the socket until
    /// the target count is reached.
    ///
    /// # Errors
    ///
    /// - [`Error::ConnectionClosed`] if a read returns zero bytes early
    /// - [`Error::Timeout`] if a single read exceeds [`IO_TIMEOUT`]
    async fn read_exact(&mut self, count: usize) -> Result<Vec<u8>> {
        let mut out = Vec::with_capacity(count);

        if !self.read_buf.is_empty() {
            let take = count.min(self.read_buf.len());
            out.extend(self.read_buf.drain(..take));
        }

        let mut chunk = [0u8; 8192];
        while out.len() < count {
            let want = (count - out.len()).min(chunk.len());
            let read = timeout(IO_TIMEOUT, self.stream.read(&mut chunk[..want]))
                .await
                .map_err(|_| Error::timeout("websocket read", IO_TIMEOUT.as_millis() as u64))?
                .map_err(|e| Error::connection(format!("socket read failed: {e}")))?;

            if read == 0 {
                return Err(Error::ConnectionClosed);
            }
            out.extend_from_slice(&chunk[..read]);
        }

        Ok(out)
    }

    // ========================================================================
    // Handshake
    // ========================================================================

    /// Sends the Upgrade request and validates the response status line.
    async fn handshake(&mut self, host: &str, port: u16, path: &str) -> Result<()> {
        let key = Base64Standard.encode(rand::random::<[u8; 16]>());
        let request = format!(
            "GET {path} HTTP/1.1\r\n\
             Host: {host}:{port}\r\n\
             Upgrade: websocket\r\n\
             Connection: Upgrade\r\n\
             Sec-WebSocket-Key: {key}\r\n\
             Sec-WebSocket-Version: 13\r\n\
             \r\n"
        );

        self.stream
            .write_all(request.as_bytes())
            .await
            .map_err(|e| Error::connection(format!("handshake write failed: {e}")))?;

        // Buffer until the header terminator; length is not known up front.
        let mut response = Vec::new();
        let terminator_end = loop {
            if let Some(pos) = find_terminator(&response) {
                break pos + HEADER_TERMINATOR.len();
            }
            if response.len() > MAX_HANDSHAKE_RESPONSE {
                return Err(Error::handshake("oversized handshake response"));
            }

            let mut chunk = [0u8; 1024];
            let read = timeout(IO_TIMEOUT, self.stream.read(&mut chunk))
                .await
                .map_err(|_| Error::timeout("handshake read", IO_TIMEOUT.as_millis() as u64))?
                .map_err(|e| Error::connection(format!("handshake read failed: {e}")))?;

            if read == 0 {
                return Err(Error::ConnectionClosed);
            }
            response.extend_from_slice(&chunk[..read]);
        };

        // Anything past the terminator is already frame data; keep it.
        self.read_buf = response.split_off(terminator_end);
        response.truncate(response.len() - HEADER_TERMINATOR.len());

        let headers = String::from_utf8_lossy(&response);
        let status_line = headers.lines().next().unwrap_or_default();
        let status_code = status_line.split_whitespace().nth(1);

        if status_code != Some("101") {
            return Err(Error::handshake(format!(
                "expected HTTP 101, got: {status_line}"
            )));
        }

        Ok(())
    }
}

/// Locates the `\r\n\r\n` header terminator in the buffered response.
fn find_terminator(buf: &[u8]) -> Option<usize> {
    buf.windows(HEADER_TERMINATOR.len())
        .position(|window| window == HEADER_TERMINATOR)
}

// ============================================================================
// Tests
// ============================================================================
