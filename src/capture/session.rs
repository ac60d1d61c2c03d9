//! Capture orchestration.
//!
//! [`CaptureSession`] drives the strictly sequential capture sequence:
//!
//! ```text
//! Launch → Discover → Connect → AwaitReady → GetMetrics →
//! OverrideViewport → AwaitRender → Capture → Persist → Teardown (always)
//! ```
//!
//! Success is reached only after Persist; a failure in any state goes
//! straight to Teardown and propagates. The three waits are fixed-duration
//! pauses, not event-driven readiness signals. A known brittleness, kept
//! deliberately; the constants below make the durations auditable.

// ============================================================================
// Imports
// ============================================================================

use std::path::{Path, PathBuf};
use std::time::Duration;

use base64::Engine;
use base64::engine::general_purpose::STANDARD as Base64Standard;
use serde_json::{Value, json};
use tokio::time::sleep;
use tracing::{debug, info};

use crate::browser::{
    self, BrowserProcess, DEFAULT_MAX_ATTEMPTS, DEFAULT_POLL_INTERVAL, discover_page_target,
};
use crate::error::{Error, Result};
use crate::protocol::{CdpClient, LayoutMetrics};
use crate::transport::WsConnection;

use super::options::CaptureOptions;

// ============================================================================
// Constants
// ============================================================================

/// Pause after spawning Chrome, before the first discovery poll.
const PROCESS_SETTLE: Duration = Duration::from_secs(3);

/// Pause after connecting, letting the initial page load finish.
const PAGE_SETTLE: Duration = Duration::from_secs(1);

/// Pause after the viewport override, letting the relayout render.
const RENDER_SETTLE: Duration = Duration::from_millis(500);

// ============================================================================
// CaptureReport
// ============================================================================

/// Summary of a completed capture.
#[derive(Debug, Clone)]
pub struct CaptureReport {
    /// Path the image was written to.
    pub path: PathBuf,
    /// Viewport width used for the capture.
    pub width: u32,
    /// Measured full content height.
    pub height: u32,
    /// Size of the written image in bytes.
    pub bytes_written: usize,
}

// ============================================================================
// CaptureSession
// ============================================================================

/// One full-page capture run.
///
/// Owns the end-to-end sequence and releases every resource it acquires:
/// the subprocess and the connection are torn down on every exit path,
/// success or failure.
#[derive(Debug)]
pub struct CaptureSession {
    /// Validated capture configuration.
    options: CaptureOptions,
}

impl CaptureSession {
    /// Creates a session from validated options.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if the options fail validation.
    pub fn new(options: CaptureOptions) -> Result<Self> {
        options.validate()?;
        Ok(Self { options })
    }

    /// Captures `url` and writes the image to `output`.
    ///
    /// # Errors
    ///
    /// Any failure of the sequence propagates after teardown:
    /// [`Error::ChromeNotFound`], [`Error::Launch`],
    /// [`Error::DiscoveryTimeout`], [`Error::NoPageTarget`],
    /// [`Error::Handshake`], connection and protocol errors, and
    /// [`Error::Io`] from the final write.
    pub async fn run(&self, url: &str, output: &Path) -> Result<CaptureReport> {
        let executable = browser::find_chrome().ok_or(Error::ChromeNotFound)?;
        let debug_port = browser::pick_debug_port().await?;

        let mut process =
            BrowserProcess::launch(&executable, debug_port, self.options.width, url)?;

        // Teardown runs no matter how far the sequence got.
        let result = self.drive(debug_port, output).await;
        process.teardown().await;

        result
    }

    /// Runs every state between Launch and Teardown.
    async fn drive(&self, debug_port: u16, output: &Path) -> Result<CaptureReport> {
        sleep(PROCESS_SETTLE).await;

        let target =
            discover_page_target(debug_port, DEFAULT_MAX_ATTEMPTS, DEFAULT_POLL_INTERVAL).await?;
        let ws_url = target
            .web_socket_debugger_url
            .ok_or(Error::NoPageTarget)?;
        debug!(%ws_url, "Page target discovered");

        let mut connection = WsConnection::connect(&ws_url).await?;

        // Close is best-effort and unconditional, like the teardown above.
        let result = self.capture(&mut connection, output).await;
        connection.close().await;

        result
    }

    /// Issues the protocol sequence and persists the decoded image.
    async fn capture(&self, connection: &mut WsConnection, output: &Path) -> Result<CaptureReport> {
        let mut client = CdpClient::new(connection);

        sleep(PAGE_SETTLE).await;

        let metrics_result = client.send_command("Page.getLayoutMetrics", None).await?;
        let metrics = LayoutMetrics::from_result(&metrics_result)?;
        info!(
            content_width = metrics.content_width,
            content_height = metrics.content_height,
            "Measured page content"
        );

        // Expanding the viewport to the full content height is what turns a
        // viewport screenshot into a full-page screenshot.
        client
            .send_command(
                "Emulation.setDeviceMetricsOverride",
                Some(json!({
                    "width": self.options.width,
                    "height": metrics.content_height,
                    "deviceScaleFactor": 1,
                    "mobile": false,
                })),
            )
            .await?;

        sleep(RENDER_SETTLE).await;

        let format = self.options.format;
        let mut params = json!({
            "format": format.protocol_name(),
            "captureBeyondViewport": true,
            "fromSurface": true,
        });
        if let Some(quality) = format.quality() {
            params["quality"] = json!(quality);
        }

        let screenshot = client
            .send_command("Page.captureScreenshot", Some(params))
            .await?;

        let data = screenshot
            .get("data")
            .and_then(Value::as_str)
            .ok_or_else(|| Error::protocol("screenshot response missing data field"))?;
        let bytes = Base64Standard
            .decode(data)
            .map_err(|e| Error::protocol(format!("screenshot payload is not valid base64: {e}")))?;

        // Only a fully decoded image reaches the filesystem; no partial
        // output file is left behind on failure.
        tokio::fs::write(output, &bytes).await?;

        info!(
            path = %output.display(),
            bytes = bytes.len(),
            "Screenshot persisted"
        );

        Ok(CaptureReport {
            path: output.to_path_buf(),
            width: self.options.width,
            height: metrics.content_height,
            bytes_written: bytes.len(),
        })
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use crate::capture::options::ImageFormat;
    use crate::transport::WsMessage;

    use tokio::net::{TcpListener, TcpStream};

    const PNG_MAGIC: &[u8] = &[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];

    /// Returns a connected (client, server) WebSocket pair with the
    /// handshake skipped.
    async fn ws_pair() -> (WsConnection, WsConnection) {
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let addr = listener.local_addr().expect("local addr");

        let client = TcpStream::connect(addr);
        let server = listener.accept();
        let (client, server) = tokio::join!(client, server);

        (
            WsConnection::from_stream(client.expect("connect")),
            WsConnection::from_stream(server.expect("accept").0),
        )
    }

    /// Reads one command on the fake-browser side.
    async fn read_command(server: &mut WsConnection) -> Value {
        match server.recv().await.expect("server recv") {
            WsMessage::Text(text) => serde_json::from_str(&text).expect("command json"),
            other => panic!("expected text frame, got {other:?}"),
        }
    }

    /// Answers the three capture commands the way a browser would.
    async fn fake_browser(mut server: WsConnection, screenshot: Value) {
        let metrics = read_command(&mut server).await;
        assert_eq!(metrics["method"], "Page.getLayoutMetrics");
        let response = json!({
            "id": metrics["id"],
            "result": {"contentSize": {"x": 0, "y": 0, "width": 1280.0, "height": 2400.0}}
        });
        server.send_text(&response.to_string()).await.expect("send");

        let override_cmd = read_command(&mut server).await;
        assert_eq!(override_cmd["method"], "Emulation.setDeviceMetricsOverride");
        assert_eq!(override_cmd["params"]["height"], 2400);
        assert_eq!(override_cmd["params"]["deviceScaleFactor"], 1);
        assert_eq!(override_cmd["params"]["mobile"], false);
        let response = json!({"id": override_cmd["id"], "result": {}});
        server.send_text(&response.to_string()).await.expect("send");

        let capture = read_command(&mut server).await;
        assert_eq!(capture["method"], "Page.captureScreenshot");
        assert_eq!(capture["params"]["captureBeyondViewport"], true);
        assert_eq!(capture["params"]["fromSurface"], true);
        let response = json!({"id": capture["id"], "result": screenshot});
        server.send_text(&response.to_string()).await.expect("send");
    }

    #[tokio::test]
    async fn test_capture_sequence_persists_decoded_image() {
        let (mut client, server) = ws_pair().await;

        let image = PNG_MAGIC.to_vec();
        let screenshot = json!({"data": Base64Standard.encode(&image)});
        let remote = tokio::spawn(fake_browser(server, screenshot));

        let dir = tempfile::tempdir().expect("tempdir");
        let output = dir.path().join("page.png");

        let session = CaptureSession::new(CaptureOptions::new()).expect("session");
        let report = session
            .capture(&mut client, &output)
            .await
            .expect("capture");

        assert_eq!(report.width, 1280);
        assert_eq!(report.height, 2400);
        assert_eq!(report.bytes_written, image.len());
        assert_eq!(std::fs::read(&output).expect("read output"), image);

        remote.await.expect("fake browser");
    }

    #[tokio::test]
    async fn test_jpeg_capture_requests_fixed_quality() {
        let (mut client, mut server) = ws_pair().await;

        let remote = tokio::spawn(async move {
            let metrics = read_command(&mut server).await;
            let response = json!({
                "id": metrics["id"],
                "result": {"contentSize": {"width": 800.0, "height": 600.0}}
            });
            server.send_text(&response.to_string()).await.expect("send");

            let override_cmd = read_command(&mut server).await;
            let response = json!({"id": override_cmd["id"], "result": {}});
            server.send_text(&response.to_string()).await.expect("send");

            let capture = read_command(&mut server).await;
            assert_eq!(capture["params"]["format"], "jpeg");
            assert_eq!(capture["params"]["quality"], 85);
            let response = json!({
                "id": capture["id"],
                "result": {"data": Base64Standard.encode(b"\xFF\xD8\xFF jpeg bytes")}
            });
            server.send_text(&response.to_string()).await.expect("send");
        });

        let dir = tempfile::tempdir().expect("tempdir");
        let output = dir.path().join("page.jpg");

        let options = CaptureOptions::new()
            .with_width(800)
            .with_format(ImageFormat::Jpeg);
        let session = CaptureSession::new(options).expect("session");
        session
            .capture(&mut client, &output)
            .await
            .expect("capture");

        remote.await.expect("fake browser");
    }

    #[tokio::test]
    async fn test_screenshot_error_leaves_no_output_file() {
        let (mut client, mut server) = ws_pair().await;

        let remote = tokio::spawn(async move {
            let metrics = read_command(&mut server).await;
            let response = json!({
                "id": metrics["id"],
                "result": {"contentSize": {"width": 800.0, "height": 600.0}}
            });
            server.send_text(&response.to_string()).await.expect("send");

            let override_cmd = read_command(&mut server).await;
            let response = json!({"id": override_cmd["id"], "result": {}});
            server.send_text(&response.to_string()).await.expect("send");

            let capture = read_command(&mut server).await;
            let response = json!({
                "id": capture["id"],
                "error": {"code": -32000, "message": "Unable to capture screenshot"}
            });
            server.send_text(&response.to_string()).await.expect("send");
        });

        let dir = tempfile::tempdir().expect("tempdir");
        let output = dir.path().join("page.png");

        let session = CaptureSession::new(CaptureOptions::new()).expect("session");
        let err = session
            .capture(&mut client, &output)
            .await
            .expect_err("must fail");

        assert!(matches!(err, Error::CommandFailed { .. }), "got: {err:?}");
        assert!(!output.exists(), "no partial output file may be written");

        remote.await.expect("fake browser");
    }

    #[tokio::test]
    async fn test_session_rejects_invalid_options() {
        let err = CaptureSession::new(CaptureOptions::new().with_width(0)).expect_err("must fail");
        assert!(matches!(err, Error::Config { .. }));
    }

    #[test]
    fn test_settle_durations() {
        assert_eq!(PROCESS_SETTLE.as_secs(), 3);
        assert_eq!(PAGE_SETTLE.as_secs(), 1);
        assert_eq!(RENDER_SETTLE.as_millis(), 500);
    }
}
