//! Synchronous command/response client.
//!
//! [`CdpClient`] layers id correlation on top of the WebSocket transport,
//! turning "send a command" into "send and block until the matching response
//! arrives".
//!
//! # Invariant
//!
//! At most one command is in flight at a time. The debugging protocol would
//! permit concurrent outstanding requests; this client is a strictly
//! sequential call/response cycle, which is all a linear capture needs.

// ============================================================================
// Imports
// ============================================================================

use serde_json::Value;
use tracing::{trace, warn};

use crate::error::{Error, Result};
use crate::transport::{WsConnection, WsMessage};

use super::message::{Command, Response};

// ============================================================================
// CdpClient
// ============================================================================

/// Command client over a borrowed WebSocket connection.
///
/// Owns the monotonic command-id counter; borrows the transport without
/// owning its lifetime; the caller decides when the connection closes.
pub struct CdpClient<'a> {
    /// Transport carrying the frames.
    connection: &'a mut WsConnection,
    /// Next command id; monotonic, starts at 1, unique per connection.
    next_id: u64,
}

impl<'a> CdpClient<'a> {
    /// Creates a client over an established connection.
    #[inline]
    #[must_use]
    pub fn new(connection: &'a mut WsConnection) -> Self {
        Self {
            connection,
            next_id: 1,
        }
    }

    /// Sends a command and blocks until its response arrives.
    ///
    /// The remote side may interleave unsolicited event notifications and
    /// late responses to earlier commands; anything whose id does not match
    /// the command just sent is skipped, never treated as an error. The
    /// result mapping is empty if the response carried none.
    ///
    /// # Errors
    ///
    /// - [`Error::CommandFailed`] if the response carries an error payload
    /// - [`Error::ConnectionClosed`] if the peer closes while awaiting the id
    /// - transport errors from the underlying send/receive
    pub async fn send_command(&mut self, method: &str, params: Option<Value>) -> Result<Value> {
        let id = self.next_id;
        self.next_id += 1;

        let command = Command::new(id, method, params);
        let text = serde_json::to_string(&command)?;

        trace!(id, method, "Sending command");
        self.connection.send_text(&text).await?;

        loop {
            match self.connection.recv().await? {
                WsMessage::Close => return Err(Error::ConnectionClosed),

                WsMessage::Binary(payload) => {
                    trace!(bytes = payload.len(), "Skipping non-text frame");
                }

                WsMessage::Text(text) => {
                    let response: Response = match serde_json::from_str(&text) {
                        Ok(response) => response,
                        Err(e) => {
                            warn!(error = %e, "Skipping undecodable message");
                            continue;
                        }
                    };

                    if !response.answers(id) {
                        trace!(
                            awaited = id,
                            received = ?response.id,
                            event = response.is_event(),
                            "Skipping non-matching message"
                        );
                        continue;
                    }

                    return response.into_result();
                }
            }
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
