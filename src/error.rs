//! Error types for the capture tool.
//!
//! This module defines all error types used throughout the crate.
//!
//! # Usage
//!
//! All fallible operations return [`Result<T>`] which uses [`Error`]:
//!
//! ```ignore
//! use cdp_capture::{Result, Error};
//!
//! async fn example(client: &mut CdpClient<'_>) -> Result<()> {
//!     client.send_command("Page.enable", None).await?;
//!     Ok(())
//! }
//! ```
//!
//! # Error Categories
//!
//! | Category | Variants |
//! |----------|----------|
//! | Launch | [`Error::ChromeNotFound`], [`Error::Launch`] |
//! | Discovery | [`Error::DiscoveryTimeout`], [`Error::NoPageTarget`] |
//! | Connection | [`Error::Handshake`], [`Error::Connection`], [`Error::ConnectionClosed`], [`Error::Timeout`] |
//! | Protocol | [`Error::CommandFailed`], [`Error::Protocol`] |
//! | Configuration | [`Error::Config`] |
//! | External | [`Error::Io`], [`Error::Json`] |

// ============================================================================
// Imports
// ============================================================================

use std::io::Error as IoError;
use std::result::Result as StdResult;

use serde_json::Value;
use thiserror::Error;

// ============================================================================
// Result Alias
// ============================================================================

/// Result type alias using crate [`enum@Error`].
///
/// All fallible operations in this crate return this type.
pub type Result<T> = StdResult<T, Error>;

// ============================================================================
// Error Enum
// ============================================================================

/// Main error type for the crate.
///
/// Each variant includes relevant context for debugging.
#[derive(Error, Debug)]
pub enum Error {
    // ========================================================================
    // Launch Errors
    // ========================================================================
    /// No Chrome executable could be located on this host.
    ///
    /// Non-retryable; no subprocess is spawned.
    #[error("Chrome not found")]
    ChromeNotFound,

    /// Failed to spawn the Chrome process.
    #[error("Failed to launch Chrome: {message}")]
    Launch {
        /// Description of the launch failure.
        message: String,
    },

    // ========================================================================
    // Discovery Errors
    // ========================================================================
    /// The debugging endpoint never became reachable.
    ///
    /// Returned after the bounded poll budget is exhausted.
    #[error("Could not connect to Chrome after {attempts} attempts")]
    DiscoveryTimeout {
        /// Number of polls performed before giving up.
        attempts: u32,
    },

    /// The debugging endpoint answered but listed no page target.
    #[error("No page target found")]
    NoPageTarget,

    // ========================================================================
    // Connection Errors
    // ========================================================================
    /// WebSocket upgrade handshake failed.
    ///
    /// Returned when the server does not answer with HTTP 101.
    #[error("WebSocket handshake failed: {message}")]
    Handshake {
        /// Description of the handshake failure.
        message: String,
    },

    /// Socket-level connection failure.
    #[error("Connection failed: {message}")]
    Connection {
        /// Description of the connection error.
        message: String,
    },

    /// The connection closed while data was still expected.
    #[error("Connection closed")]
    ConnectionClosed,

    /// An IO operation did not complete within its bound.
    #[error("Timeout after {timeout_ms}ms: {operation}")]
    Timeout {
        /// Description of the operation that timed out.
        operation: String,
        /// Milliseconds waited before timeout.
        timeout_ms: u64,
    },

    // ========================================================================
    // Protocol Errors
    // ========================================================================
    /// The browser reported a command failure.
    ///
    /// Carries the remote error payload verbatim.
    #[error("Command failed: {payload}")]
    CommandFailed {
        /// Error object from the response envelope.
        payload: Value,
    },

    /// Protocol violation or unexpected message shape.
    #[error("Protocol error: {message}")]
    Protocol {
        /// Description of the protocol violation.
        message: String,
    },

    // ========================================================================
    // Configuration Errors
    // ========================================================================
    /// Invalid capture configuration or URL.
    #[error("Configuration error: {message}")]
    Config {
        /// Description of the configuration error.
        message: String,
    },

    // ========================================================================
    // External Errors
    // ========================================================================
    /// IO error (output file write, port allocation).
    #[error("IO error: {0}")]
    Io(#[from] IoError),

    /// JSON serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

// ============================================================================
// Error Constructors
// ============================================================================

impl Error {
    /// Creates a launch error from a spawn failure.
    #[inline]
    pub fn launch_failed(err: IoError) -> Self {
        Self::Launch {
            message: err.to_string(),
        }
    }

    /// Creates a discovery timeout error.
    #[inline]
    pub fn discovery_timeout(attempts: u32) -> Self {
        Self::DiscoveryTimeout { attempts }
    }

    /// Creates a handshake error.
    #[inline]
    pub fn handshake(message: impl Into<String>) -> Self {
        Self::Handshake {
            message: message.into(),
        }
    }

    /// Creates a connection error.
    #[inline]
    pub fn connection(message: impl Into<String>) -> Self {
        Self::Connection {
            message: message.into(),
        }
    }

    /// Creates a timeout error.
    #[inline]
    pub fn timeout(operation: impl Into<String>, timeout_ms: u64) -> Self {
        Self::Timeout {
            operation: operation.into(),
            timeout_ms,
        }
    }

    /// Creates a command failure error carrying the remote payload.
    #[inline]
    pub fn command_failed(payload: Value) -> Self {
        Self::CommandFailed { payload }
    }

    /// Creates a protocol error.
    #[inline]
    pub fn protocol(message: impl Into<String>) -> Self {
        Self::Protocol {
            message: message.into(),
        }
    }

    /// Creates a configuration error.
    #[inline]
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }
}

// ============================================================================
// Error Predicates
// ============================================================================

impl Error {
    /// Returns `true` if this is a timeout error.
    #[inline]
    #[must_use]
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::DiscoveryTimeout { .. } | Self::Timeout { .. })
    }

    /// Returns `true` if this is a connection-level error.
    #[inline]
    #[must_use]
    pub fn is_connection_error(&self) -> bool {
        matches!(
            self,
            Self::Handshake { .. }
                | Self::Connection { .. }
                | Self::ConnectionClosed
                | Self::Timeout { .. }
        )
    }
}

// ============================================================================
// Tests
// ============================================================================
