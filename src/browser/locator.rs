//! Chrome executable discovery.
//!
//! Locates a Chrome or Chromium binary on the current host. This is an
//! upstream collaborator of the capture flow, not part of the protocol core:
//! "no executable found" is an immediate, non-retryable failure at the call
//! site, before any subprocess is spawned.

// ============================================================================
// Imports
// ============================================================================

use std::env;
use std::path::PathBuf;

use tracing::debug;

// ============================================================================
// Lookup
// ============================================================================

/// Returns the first Chrome-compatible executable found on this host.
///
/// Checks the platform's well-known install locations first, then falls back
/// to a `PATH` probe where that is conventional.
#[must_use]
pub fn find_chrome() -> Option<PathBuf> {
    let found = platform_candidates();

    match &found {
        Some(path) => debug!(path = %path.display(), "Located Chrome executable"),
        None => debug!("No Chrome executable found"),
    }

    found
}

#[cfg(target_os = "macos")]
fn platform_candidates() -> Option<PathBuf> {
    [
        "/Applications/Google Chrome.app/Contents/MacOS/Google Chrome",
        "/Applications/Chromium.app/Contents/MacOS/Chromium",
    ]
    .iter()
    .map(PathBuf::from)
    .find(|path| path.is_file())
}

#[cfg(target_os = "windows")]
fn platform_candidates() -> Option<PathBuf> {
    let suffix = r"Google\Chrome\Application\chrome.exe";

    ["ProgramFiles", "ProgramFiles(x86)", "LocalAppData"]
        .iter()
        .filter_map(|var| env::var_os(var))
        .map(|root| PathBuf::from(root).join(suffix))
        .find(|path| path.is_file())
        .or_else(|| search_path(&["chrome.exe", "chrome"]))
}

#[cfg(not(any(target_os = "macos", target_os = "windows")))]
fn platform_candidates() -> Option<PathBuf> {
    search_path(&[
        "google-chrome",
        "google-chrome-stable",
        "chromium",
        "chromium-browser",
    ])
}

/// Probes every `PATH` directory for the first matching executable name.
#[cfg(not(target_os = "macos"))]
fn search_path(names: &[&str]) -> Option<PathBuf> {
    let path_var = env::var_os("PATH")?;

    for dir in env::split_paths(&path_var) {
        for name in names {
            let candidate = dir.join(name);
            if candidate.is_file() {
                return Some(candidate);
            }
        }
    }

    None
}

// ============================================================================
// Tests
// ============================================================================
