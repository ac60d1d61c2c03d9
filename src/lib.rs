//! Full-page screenshots over a hand-rolled Chrome DevTools Protocol stack.
//!
//! This crate captures a full-page image of a web page by driving headless
//! Chrome through its remote debugging protocol, with the WebSocket
//! transport and the HTTP discovery probe implemented from first principles
//! on raw TCP. No protocol or HTTP client crates sit underneath.
//!
//! # Architecture
//!
//! The capture is a strictly sequential pipeline:
//!
//! 1. Locate a Chrome executable and spawn it headless with a debugging port
//! 2. Poll `GET /json` until a connectable page target appears
//! 3. Upgrade a TCP connection to WebSocket (handshake + frame codec)
//! 4. Issue commands through an id-correlated call/response client
//! 5. Decode the base64 screenshot payload and write it to disk
//! 6. Tear the browser process down, on every exit path
//!
//! # Quick Start
//!
//! ```no_run
//! use std::path::Path;
//!
//! use cdp_capture::{CaptureOptions, CaptureSession, ImageFormat, Result};
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let options = CaptureOptions::new()
//!         .with_width(1280)
//!         .with_format(ImageFormat::Png);
//!
//!     let session = CaptureSession::new(options)?;
//!     let report = session.run("https://example.com", Path::new("page.png")).await?;
//!     println!("{} ({} bytes)", report.path.display(), report.bytes_written);
//!
//!     Ok(())
//! }
//! ```
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`browser`] | Executable lookup, process lifecycle, endpoint discovery |
//! | [`capture`] | Options and the capture state machine |
//! | [`error`] | Error types and [`Result`] alias |
//! | [`protocol`] | Command/response envelope and id correlation |
//! | [`transport`] | WebSocket handshake and frame codec |
//!
//! # Scope Limits
//!
//! Deliberate, documented limits rather than oversights: `ws://` only (no
//! TLS), one in-flight command at a time, no frame fragmentation, no
//! ping/pong keep-alive, and fixed readiness pauses instead of event-driven
//! load signals.

// ============================================================================
// Modules
// ============================================================================

/// Browser process management: locator, lifecycle, discovery.
pub mod browser;

/// Capture configuration and orchestration.
pub mod capture;

/// Error types and result aliases.
///
/// All fallible operations return [`Result<T>`] which uses [`Error`].
pub mod error;

/// Command/response protocol layer.
pub mod protocol;

/// WebSocket transport layer.
pub mod transport;

// ============================================================================
// Re-exports
// ============================================================================

// Capture types
pub use capture::{CaptureOptions, CaptureReport, CaptureSession, ImageFormat};

// Error types
pub use error::{Error, Result};

// Protocol types
pub use protocol::{CdpClient, Command, LayoutMetrics, Response, TargetDescriptor};

// Transport types
pub use transport::{WsConnection, WsMessage};

// Browser types
pub use browser::{BrowserProcess, find_chrome};
