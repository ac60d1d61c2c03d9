//! WebSocket transport layer.
//!
//! Hand-rolled client transport for the browser's debugging endpoint: the
//! opening handshake and the RFC 6455 frame codec, built directly on a TCP
//! stream. No protocol library sits underneath.
//!
//! # Scope
//!
//! | Supported | Not supported |
//! |-----------|---------------|
//! | `ws://` addresses | `wss://` (TLS) |
//! | Single-frame text messages | Fragmented messages |
//! | Masked client frames | Compression, subprotocols |
//! | Close frame on teardown | Ping/pong keep-alive |

// ============================================================================
// Submodules
// ============================================================================

/// Frame model and encoding.
pub mod frame;

/// Client connection: handshake and frame IO.
pub mod websocket;

// ============================================================================
// Re-exports
// ============================================================================

pub use frame::{Frame, Opcode};
pub use websocket::{IO_TIMEOUT, WsConnection, WsMessage};
