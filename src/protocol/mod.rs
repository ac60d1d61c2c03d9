//! Command/response protocol layer.
//!
//! Message envelope types and the synchronous correlation client that turns
//! the WebSocket transport into a call/response API against the browser's
//! debugging endpoint.
//!
//! # Message Types
//!
//! | Type | Direction | Purpose |
//! |------|-----------|---------|
//! | [`Command`] | Client → Browser | `{id, method, params}` request |
//! | [`Response`] | Browser → Client | `{id, result}` or `{id, error}` |
//! | event notification | Browser → Client | id-less message, skipped |
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | `message` | Serde envelope and payload types |
//! | `client` | [`CdpClient`] id correlation |

// ============================================================================
// Submodules
// ============================================================================

/// Id correlation client.
pub mod client;

/// Message envelope and payload types.
pub mod message;

// ============================================================================
// Re-exports
// ============================================================================

pub use client::CdpClient;
pub use message::{Command, LayoutMetrics, Response, TargetDescriptor};
