//! WebSocket frame model and encoding (RFC 6455).
//!
//! A frame is the smallest unit of wire transmission: control bits, opcode,
//! payload length in one of three size classes, optional mask key, payload.
//!
//! Every frame this client puts on the wire is masked with a fresh random
//! 4-byte key, as the protocol requires for the client-to-server direction.
//! Decoding is driven by [`WsConnection`](super::WsConnection), which reads
//! header fields directly off the socket; the byte-level rules shared by both
//! directions (bit layout, length classes, masking) live here.

// ============================================================================
// Imports
// ============================================================================

use crate::error::{Error, Result};

// ============================================================================
// Constants
// ============================================================================

/// FIN bit in the first header byte.
pub(crate) const FIN_BIT: u8 = 0x80;

/// Mask bit in the second header byte.
pub(crate) const MASK_BIT: u8 = 0x80;

/// Length marker for the 16-bit extended class.
pub(crate) const LEN_U16: u8 = 126;

/// Length marker for the 64-bit extended class.
pub(crate) const LEN_U64: u8 = 127;

// ============================================================================
// Opcode
// ============================================================================

/// WebSocket frame opcode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Opcode {
    /// Continuation of a fragmented message.
    Continuation,
    /// UTF-8 text payload.
    Text,
    /// Binary payload.
    Binary,
    /// Connection close.
    Close,
    /// Ping control frame.
    Ping,
    /// Pong control frame.
    Pong,
}

impl Opcode {
    /// Parses the low nibble of the first header byte.
    ///
    /// Returns `None` for reserved opcodes; the caller treats those frames
    /// as opaque binary payloads rather than failing the connection.
    #[must_use]
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0x0 => Some(Self::Continuation),
            0x1 => Some(Self::Text),
            0x2 => Some(Self::Binary),
            0x8 => Some(Self::Close),
            0x9 => Some(Self::Ping),
            0xA => Some(Self::Pong),
            _ => None,
        }
    }

    /// Returns the wire value of this opcode.
    #[inline]
    #[must_use]
    pub const fn as_u8(self) -> u8 {
        match self {
            Self::Continuation => 0x0,
            Self::Text => 0x1,
            Self::Binary => 0x2,
            Self::Close => 0x8,
            Self::Ping => 0x9,
            Self::Pong => 0xA,
        }
    }
}

// ============================================================================
// Frame
// ============================================================================

/// A single WebSocket frame.
///
/// Messages are never fragmented by this client: one `send` produces exactly
/// one frame with FIN set.
#[derive(Debug, Clone)]
pub struct Frame {
    /// Final frame of the message.
    pub fin: bool,
    /// Frame opcode.
    pub opcode: Opcode,
    /// Mask key; `Some` marks the frame as masked.
    pub mask: Option<[u8; 4]>,
    /// Unmasked payload bytes.
    pub payload: Vec<u8>,
}

impl Frame {
    /// Creates a masked text frame for the client-to-server direction.
    #[must_use]
    pub fn text(payload: impl Into<Vec<u8>>) -> Self {
        Self {
            fin: true,
            opcode: Opcode::Text,
            mask: Some(rand::random()),
            payload: payload.into(),
        }
    }

    /// Creates a masked empty close frame.
    #[must_use]
    pub fn close() -> Self {
        Self {
            fin: true,
            opcode: Opcode::Close,
            mask: Some(rand::random()),
            payload: Vec::new(),
        }
    }

    /// Creates an unmasked frame.
    ///
    /// Server-originated frames are conventionally unmasked; this constructor
    /// exists for the loopback test harness that plays the server side.
    #[must_use]
    pub fn unmasked(opcode: Opcode, payload: impl Into<Vec<u8>>) -> Self {
        Self {
            fin: true,
            opcode,
            mask: None,
            payload: payload.into(),
        }
    }

    /// Returns `true` if the frame carries a mask key.
    #[inline]
    #[must_use]
    pub const fn is_masked(&self) -> bool {
        self.mask.is_some()
    }

    /// Encodes the frame into a single contiguous buffer.
    ///
    /// Header, extended length, mask key and (masked) payload are emitted in
    /// wire order so the whole frame goes out in one write. The length class
    /// is the smallest that fits the payload: literal below 126, 16-bit up to
    /// 65535, 64-bit beyond.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Protocol`] if a non-final frame is encoded; this
    /// client never fragments messages.
    pub fn encode(&self) -> Result<Vec<u8>> {
        if !self.fin {
            return Err(Error::protocol("fragmented frames are not supported"));
        }

        let len = self.payload.len();
        let mut buf = Vec::with_capacity(2 + 8 + 4 + len);

        buf.push(FIN_BIT | self.opcode.as_u8());

        let mask_bit = if self.is_masked() { MASK_BIT } else { 0 };
        if len < usize::from(LEN_U16) {
            buf.push(mask_bit | len as u8);
        } else if len <= usize::from(u16::MAX) {
            buf.push(mask_bit | LEN_U16);
            buf.extend_from_slice(&(len as u16).to_be_bytes());
        } else {
            buf.push(mask_bit | LEN_U64);
            buf.extend_from_slice(&(len as u64).to_be_bytes());
        }

        match self.mask {
            Some(key) => {
                buf.extend_from_slice(&key);
                let start = buf.len();
                buf.extend_from_slice(&self.payload);
                apply_mask(&mut buf[start..], key);
            }
            None => buf.extend_from_slice(&self.payload),
        }

        Ok(buf)
    }
}

// ============================================================================
// Masking
// ============================================================================

/// XORs `bytes` in place with the 4-byte mask key.
///
/// Masking is an involution: applying the same key twice restores the
/// original bytes, so this one function serves both directions.
pub fn apply_mask(bytes: &mut [u8], key: [u8; 4]) {
    for (i, byte) in bytes.iter_mut().enumerate() {
        *byte ^= key[i % 4];
    }
}

// ============================================================================
// Tests
// ============================================================================
