//! Chrome process lifecycle.
//!
//! Launches the browser as a subprocess with a fixed headless flag set and
//! guarantees its termination on every exit path of the capture flow.
//!
//! The process exposes no direct readiness signal; callers poll the
//! debugging endpoint via [`discovery`](super::discovery) to learn when it
//! is serving.

// ============================================================================
// Imports
// ============================================================================

use std::path::Path;
use std::process::Stdio;
use std::time::Duration;

use tokio::net::TcpListener;
use tokio::process::{Child, Command};
use tokio::time::timeout;
use tracing::{debug, info, warn};

use crate::error::{Error, Result};

// ============================================================================
// Constants
// ============================================================================

/// Bounded wait for the process to exit after the termination request.
const TERMINATION_WAIT: Duration = Duration::from_secs(5);

/// Initial window height; superseded by the viewport override before capture.
const INITIAL_WINDOW_HEIGHT: u32 = 800;

// ============================================================================
// Port Allocation
// ============================================================================

/// Obtains an unused local TCP port for the debugging endpoint.
///
/// Binds a listener on port 0 and reads back the OS-assigned port. The
/// listener is dropped immediately; the small window before Chrome rebinds
/// the port is accepted.
///
/// # Errors
///
/// Returns [`Error::Io`] if the loopback bind fails.
pub async fn pick_debug_port() -> Result<u16> {
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let port = listener.local_addr()?.port();

    debug!(port, "Allocated debug port");
    Ok(port)
}

// ============================================================================
// BrowserProcess
// ============================================================================

/// A launched Chrome subprocess.
///
/// Exclusively owns the child handle. [`teardown`](Self::teardown) is
/// idempotent and must run exactly once per launch regardless of how far the
/// capture got; the orchestrator calls it on every exit path.
#[derive(Debug)]
pub struct BrowserProcess {
    /// Child handle; `None` once torn down.
    child: Option<Child>,
}

impl BrowserProcess {
    /// Spawns Chrome with the fixed headless flag set.
    ///
    /// The flag set is not configurable: headless, GPU and sandbox disabled,
    /// the `/dev/shm` workaround, hidden scrollbars, the debugging port, the
    /// initial window size, and the target URL as the first navigation.
    /// Standard output and error are discarded.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Launch`] if the process fails to spawn.
    pub fn launch(executable: &Path, debug_port: u16, width: u32, url: &str) -> Result<Self> {
        let mut command = Command::new(executable);
        command
            .args(launch_args(debug_port, width))
            .arg(url)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null());

        let child = command.spawn().map_err(Error::launch_failed)?;

        info!(
            pid = child.id(),
            debug_port,
            executable = %executable.display(),
            "Chrome process spawned"
        );

        Ok(Self { child: Some(child) })
    }

    /// Returns the OS process id, if the process is still held.
    #[inline]
    #[must_use]
    pub fn id(&self) -> Option<u32> {
        self.child.as_ref().and_then(Child::id)
    }

    /// Returns `true` once teardown has run.
    #[inline]
    #[must_use]
    pub fn is_torn_down(&self) -> bool {
        self.child.is_none()
    }

    /// Terminates the process.
    ///
    /// Sends the kill request, waits up to [`TERMINATION_WAIT`] for the exit
    /// to be reaped, and forces the kill if the wait expires. Subsequent
    /// calls are no-ops, so every exit path may call this unconditionally.
    pub async fn teardown(&mut self) {
        let Some(mut child) = self.child.take() else {
            debug!("Teardown already performed");
            return;
        };

        let pid = child.id();
        if let Err(e) = child.start_kill() {
            // Already exited on its own; wait below reaps it.
            debug!(pid, error = %e, "Termination request failed");
        }

        match timeout(TERMINATION_WAIT, child.wait()).await {
            Ok(Ok(status)) => debug!(pid, %status, "Chrome process exited"),
            Ok(Err(e)) => warn!(pid, error = %e, "Failed to reap Chrome process"),
            Err(_) => {
                warn!(pid, "Chrome did not exit in time, forcing kill");
                if let Err(e) = child.kill().await {
                    warn!(pid, error = %e, "Forced kill failed");
                }
            }
        }
    }
}

/// The fixed launch flag set, minus the trailing target URL.
fn launch_args(debug_port: u16, width: u32) -> Vec<String> {
    vec![
        "--headless=new".to_string(),
        "--disable-gpu".to_string(),
        "--no-sandbox".to_string(),
        "--disable-dev-shm-usage".to_string(),
        "--hide-scrollbars".to_string(),
        format!("--remote-debugging-port={debug_port}"),
        format!("--window-size={width},{INITIAL_WINDOW_HEIGHT}"),
    ]
}

// ============================================================================
// Tests
// ============================================================================
