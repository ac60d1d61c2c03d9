//! Protocol message types.
//!
//! Defines the JSON envelope exchanged with the browser's debugging endpoint
//! and the handful of payload shapes this tool reads out of it.
//!
//! # Format
//!
//! Command:
//! ```json
//! {"id": 1, "method": "Page.getLayoutMetrics", "params": { ... }}
//! ```
//!
//! Response (exactly one of `result`/`error` on an answered command):
//! ```json
//! {"id": 1, "result": { ... }}
//! {"id": 1, "error": {"code": -32000, "message": "..."}}
//! ```
//!
//! Unsolicited event notifications carry a `method` and no `id`.

// ============================================================================
// Imports
// ============================================================================

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{Error, Result};

// ============================================================================
// Command
// ============================================================================

/// A command sent to the browser.
///
/// Ids are monotonic per connection, starting at 1, allocated by
/// [`CdpClient`](super::CdpClient).
#[derive(Debug, Clone, Serialize)]
pub struct Command {
    /// Identifier for request/response correlation.
    pub id: u64,

    /// Protocol method, `Domain.method` format.
    pub method: String,

    /// Method parameters; omitted from the wire when absent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,
}

impl Command {
    /// Creates a command.
    #[inline]
    #[must_use]
    pub fn new(id: u64, method: impl Into<String>, params: Option<Value>) -> Self {
        Self {
            id,
            method: method.into(),
            params,
        }
    }
}

// ============================================================================
// Response
// ============================================================================

/// A message received from the browser.
///
/// Command responses carry the matching `id`; event notifications carry none.
#[derive(Debug, Clone, Deserialize)]
pub struct Response {
    /// Matches the command `id`; absent on event notifications.
    #[serde(default)]
    pub id: Option<u64>,

    /// Result payload (if the command succeeded).
    #[serde(default)]
    pub result: Option<Value>,

    /// Error payload (if the command failed).
    #[serde(default)]
    pub error: Option<Value>,
}

impl Response {
    /// Returns `true` if this is an unsolicited event notification.
    #[inline]
    #[must_use]
    pub fn is_event(&self) -> bool {
        self.id.is_none()
    }

    /// Returns `true` if this message answers the given command id.
    #[inline]
    #[must_use]
    pub fn answers(&self, id: u64) -> bool {
        self.id == Some(id)
    }

    /// Extracts the result mapping, failing on a remote-reported error.
    ///
    /// A success response without a `result` field yields an empty mapping.
    ///
    /// # Errors
    ///
    /// Returns [`Error::CommandFailed`] carrying the error payload.
    pub fn into_result(self) -> Result<Value> {
        match self.error {
            Some(payload) => Err(Error::command_failed(payload)),
            None => Ok(self.result.unwrap_or_else(|| Value::Object(Map::new()))),
        }
    }
}

// ============================================================================
// TargetDescriptor
// ============================================================================

/// One debuggable target listed by the discovery endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct TargetDescriptor {
    /// Target kind; only `"page"` targets are connectable here.
    #[serde(rename = "type", default)]
    pub target_type: String,

    /// WebSocket URL of the target's debugger endpoint.
    #[serde(rename = "webSocketDebuggerUrl", default)]
    pub web_socket_debugger_url: Option<String>,
}

impl TargetDescriptor {
    /// Returns `true` if this target is a page.
    ///
    /// A page without a debugger URL is still a page; selection happens by
    /// type alone, and the missing URL surfaces as a failure downstream.
    #[inline]
    #[must_use]
    pub fn is_page(&self) -> bool {
        self.target_type == "page"
    }
}

// ============================================================================
// LayoutMetrics
// ============================================================================

/// Content dimensions reported by `Page.getLayoutMetrics`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LayoutMetrics {
    /// Full content width in CSS pixels.
    pub content_width: u32,
    /// Full content height in CSS pixels.
    pub content_height: u32,
}

impl LayoutMetrics {
    /// Extracts the content size from a `Page.getLayoutMetrics` result.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Protocol`] if `contentSize.width`/`height` are
    /// missing or not numeric.
    pub fn from_result(result: &Value) -> Result<Self> {
        let content = result
            .get("contentSize")
            .ok_or_else(|| Error::protocol("layout metrics missing contentSize"))?;

        let width = content
            .get("width")
            .and_then(Value::as_f64)
            .ok_or_else(|| Error::protocol("contentSize.width missing or not numeric"))?;
        let height = content
            .get("height")
            .and_then(Value::as_f64)
            .ok_or_else(|| Error::protocol("contentSize.height missing or not numeric"))?;

        Ok(Self {
            content_width: width as u32,
            content_height: height as u32,
        })
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use serde_json::json;

    #[test]
    fn test_command_serialization() {
        let command = Command::new(
            3,
            "Emulation.setDeviceMetricsOverride",
            Some(json!({"width": 1280, "mobile": false})),
        );
        let json = serde_json::to_string(&command).expect("serialize");

        assert!(json.contains("\"id\":3"));
        assert!(json.contains("Emulation.setDeviceMetricsOverride"));
        assert!(json.contains("\"mobile\":false"));
    }

    #[test]
    fn test_command_without_params_omits_field() {
        let command = Command::new(1, "Page.getLayoutMetrics", None);
        let json = serde_json::to_string(&command).expect("serialize");
        assert!(!json.contains("params"));
    }

    #[test]
    fn test_success_response() {
        let response: Response =
            serde_json::from_str(r#"{"id": 7, "result": {"data": "iVBOR"}}"#).expect("parse");

        assert!(response.answers(7));
        assert!(!response.answers(8));
        assert!(!response.is_event());

        let result = response.into_result().expect("success");
        assert_eq!(result.get("data").and_then(Value::as_str), Some("iVBOR"));
    }

    #[test]
    fn test_error_response_carries_payload() {
        let response: Response = serde_json::from_str(
            r#"{"id": 2, "error": {"code": -32601, "message": "method not found"}}"#,
        )
        .expect("parse");

        let err = response.into_result().expect_err("must fail");
        match err {
            Error::CommandFailed { payload } => {
                assert_eq!(payload.get("code").and_then(Value::as_i64), Some(-32601));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_result_defaults_to_empty_mapping() {
        let response: Response = serde_json::from_str(r#"{"id": 1}"#).expect("parse");
        let result = response.into_result().expect("success");
        assert_eq!(result, json!({}));
    }

    #[test]
    fn test_event_notification_has_no_id() {
        let response: Response = serde_json::from_str(
            r#"{"method": "Page.frameNavigated", "params": {"frame": {}}}"#,
        )
        .expect("parse");

        assert!(response.is_event());
        assert!(!response.answers(1));
    }

    #[test]
    fn test_target_descriptor_page_filter() {
        let targets: Vec<TargetDescriptor> = serde_json::from_str(
            r#"[
                {"type": "background_page", "webSocketDebuggerUrl": "ws://127.0.0.1:9222/devtools/page/A"},
                {"type": "page", "webSocketDebuggerUrl": "ws://127.0.0.1:9222/devtools/page/B"}
            ]"#,
        )
        .expect("parse");

        let page = targets.iter().find(|t| t.is_page()).expect("page target");
        assert_eq!(
            page.web_socket_debugger_url.as_deref(),
            Some("ws://127.0.0.1:9222/devtools/page/B")
        );
    }

    #[test]
    fn test_page_without_debugger_url_is_still_selected() {
        let target: TargetDescriptor =
            serde_json::from_str(r#"{"type": "page"}"#).expect("parse");

        assert!(target.is_page());
        assert!(target.web_socket_debugger_url.is_none());
    }

    #[test]
    fn test_layout_metrics_extraction() {
        let result = json!({
            "layoutViewport": {"clientWidth": 1280, "clientHeight": 800},
            "contentSize": {"x": 0, "y": 0, "width": 1280.0, "height": 4312.5}
        });

        let metrics = LayoutMetrics::from_result(&result).expect("metrics");
        assert_eq!(metrics.content_width, 1280);
        assert_eq!(metrics.content_height, 4312);
    }

    #[test]
    fn test_layout_metrics_missing_content_size() {
        let err = LayoutMetrics::from_result(&json!({})).expect_err("must fail");
        assert!(matches!(err, Error::Protocol { .. }));
    }
}
