//! Browser process management.
//!
//! Everything that happens outside the wire protocol: locating a Chrome
//! executable, spawning it with the headless flag set, polling the debugging
//! endpoint for a connectable page target, and tearing the process down.
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | `locator` | Chrome executable discovery on the host |
//! | `process` | Subprocess lifecycle: launch, guaranteed teardown |
//! | `discovery` | Bounded polling of the `GET /json` target list |

// ============================================================================
// Submodules
// ============================================================================

/// Bounded polling of the debugging endpoint.
pub mod discovery;

/// Chrome executable discovery.
pub mod locator;

/// Subprocess lifecycle.
pub mod process;

// ============================================================================
// Re-exports
// ============================================================================

pub use discovery::{DEFAULT_MAX_ATTEMPTS, DEFAULT_POLL_INTERVAL, discover_page_target};
pub use locator::find_chrome;
pub use process::{BrowserProcess, pick_debug_port};
