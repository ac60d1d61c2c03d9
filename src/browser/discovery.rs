//! Debugging endpoint discovery.
//!
//! Polls Chrome's `GET /json` target list on loopback until a connectable
//! page target appears. The HTTP request is hand-rolled over a fresh TCP
//! connection per attempt (`Connection: close`, read to EOF) since this
//! crate carries no HTTP client.
//!
//! Discovery is the only place in the tool with retry semantics: a fixed
//! interval between attempts and a bounded attempt budget.

// ============================================================================
// Imports
// ============================================================================

use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::time::{sleep, timeout};
use tracing::debug;

use crate::error::{Error, Result};
use crate::protocol::TargetDescriptor;

// ============================================================================
// Constants
// ============================================================================

/// Default poll budget.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 10;

/// Default pause between polls.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(500);

/// Bound for each HTTP request against the endpoint.
const HTTP_TIMEOUT: Duration = Duration::from_secs(5);

/// Header terminator of the HTTP response.
const HEADER_TERMINATOR: &[u8] = b"\r\n\r\n";

// ============================================================================
// Discovery
// ============================================================================

/// Polls the debugging endpoint until a page target is available.
///
/// Each failed attempt (unreachable endpoint, bad status, unparseable body)
/// is followed by an `interval` pause. A successful response is terminal
/// either way: the first `type == "page"` descriptor is returned, and a list
/// without one fails with [`Error::NoPageTarget`] rather than being retried.
///
/// # Errors
///
/// - [`Error::DiscoveryTimeout`] once `max_attempts` polls have failed
/// - [`Error::NoPageTarget`] if the endpoint answers but lists no page
pub async fn discover_page_target(
    port: u16,
    max_attempts: u32,
    interval: Duration,
) -> Result<TargetDescriptor> {
    for attempt in 1..=max_attempts {
        match fetch_targets(port).await {
            Ok(targets) => {
                debug!(attempt, count = targets.len(), "Discovery endpoint answered");
                return targets
                    .into_iter()
                    .find(TargetDescriptor::is_page)
                    .ok_or(Error::NoPageTarget);
            }
            Err(e) => {
                debug!(attempt, max_attempts, error = %e, "Discovery attempt failed");
                sleep(interval).await;
            }
        }
    }

    Err(Error::discovery_timeout(max_attempts))
}

// ============================================================================
// HTTP Probe
// ============================================================================

/// Issues one `GET /json` request and parses the target list.
async fn fetch_targets(port: u16) -> Result<Vec<TargetDescriptor>> {
    let mut stream = timeout(HTTP_TIMEOUT, TcpStream::connect(("127.0.0.1", port)))
        .await
        .map_err(|_| Error::timeout("discovery connect", HTTP_TIMEOUT.as_millis() as u64))?
        .map_err(|e| Error::connection(format!("connect to 127.0.0.1:{port} failed: {e}")))?;

    let request = format!(
        "GET /json HTTP/1.1\r\n\
         Host: 127.0.0.1:{port}\r\n\
         Accept: application/json\r\n\
         Connection: close\r\n\
         \r\n"
    );
    stream
        .write_all(request.as_bytes())
        .await
        .map_err(|e| Error::connection(format!("discovery write failed: {e}")))?;

    // `Connection: close` lets EOF delimit the body; chunked replies are not
    // decoded and would fail the JSON parse below.
    let mut response = Vec::new();
    let mut chunk = [0u8; 4096];
    loop {
        let read = timeout(HTTP_TIMEOUT, stream.read(&mut chunk))
            .await
            .map_err(|_| Error::timeout("discovery read", HTTP_TIMEOUT.as_millis() as u64))?
            .map_err(|e| Error::connection(format!("discovery read failed: {e}")))?;

        if read == 0 {
            break;
        }
        response.extend_from_slice(&chunk[..read]);
    }

    let terminator = response
        .windows(HEADER_TERMINATOR.len())
        .position(|window| window == HEADER_TERMINATOR)
        .ok_or_else(|| Error::connection("discovery response has no header terminator"))?;

    let headers = String::from_utf8_lossy(&response[..terminator]);
    let status_line = headers.lines().next().unwrap_or_default();
    if status_line.split_whitespace().nth(1) != Some("200") {
        return Err(Error::connection(format!(
            "discovery endpoint answered: {status_line}"
        )));
    }

    let body = &response[terminator + HEADER_TERMINATOR.len()..];
    Ok(serde_json::from_slice(body)?)
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use std::time::Instant;

    use tokio::net::TcpListener;

    /// Serves canned HTTP responses, one connection per response.
    async fn spawn_endpoint(responses: Vec<String>) -> u16 {
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let port = listener.local_addr().expect("addr").port();

        tokio::spawn(async move {
            for response in responses {
                let (mut stream, _) = listener.accept().await.expect("accept");

                let mut request = Vec::new();
                let mut chunk = [0u8; 1024];
                while !request
                    .windows(HEADER_TERMINATOR.len())
                    .any(|w| w == HEADER_TERMINATOR)
                {
                    let read = stream.read(&mut chunk).await.expect("read");
                    if read == 0 {
                        break;
                    }
                    request.extend_from_slice(&chunk[..read]);
                }

                stream.write_all(response.as_bytes()).await.expect("write");
                // Dropping the stream closes the connection, delimiting the body.
            }
        });

        port
    }

    fn http_ok(body: &str) -> String {
        format!(
            "HTTP/1.1 200 OK\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
            body.len(),
            body
        )
    }

    #[tokio::test]
    async fn test_returns_first_page_target() {
        let body = r#"[
            {"type": "background_page", "webSocketDebuggerUrl": "ws://127.0.0.1:1/devtools/page/BG"},
            {"type": "page", "webSocketDebuggerUrl": "ws://127.0.0.1:1/devtools/page/FIRST"},
            {"type": "page", "webSocketDebuggerUrl": "ws://127.0.0.1:1/devtools/page/SECOND"}
        ]"#;
        let port = spawn_endpoint(vec![http_ok(body)]).await;

        let target = discover_page_target(port, 3, Duration::from_millis(10))
            .await
            .expect("target");

        assert_eq!(
            target.web_socket_debugger_url.as_deref(),
            Some("ws://127.0.0.1:1/devtools/page/FIRST")
        );
    }

    #[tokio::test]
    async fn test_no_page_target_is_terminal() {
        let port = spawn_endpoint(vec![http_ok(r#"[{"type": "service_worker"}]"#)]).await;

        let start = Instant::now();
        let err = discover_page_target(port, 10, Duration::from_millis(200))
            .await
            .expect_err("must fail");

        assert!(matches!(err, Error::NoPageTarget), "got: {err:?}");
        // Terminal on the first answer; the retry budget is not consumed.
        assert!(start.elapsed() < Duration::from_millis(150));
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_exhausts_attempt_budget() {
        // Allocate a port with nothing listening on it.
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let port = listener.local_addr().expect("addr").port();
        drop(listener);

        let interval = Duration::from_millis(30);
        let start = Instant::now();
        let err = discover_page_target(port, 3, interval)
            .await
            .expect_err("must fail");

        assert!(
            matches!(err, Error::DiscoveryTimeout { attempts: 3 }),
            "got: {err:?}"
        );
        // Three failed polls with an interval pause after each.
        assert!(start.elapsed() >= interval * 3);
    }

    #[tokio::test]
    async fn test_retries_past_bad_responses() {
        let body = r#"[{"type": "page", "webSocketDebuggerUrl": "ws://127.0.0.1:1/devtools/page/X"}]"#;
        let responses = vec![
            "HTTP/1.1 500 Internal Server Error\r\nConnection: close\r\n\r\n".to_string(),
            http_ok("not json"),
            http_ok(body),
        ];
        let port = spawn_endpoint(responses).await;

        let target = discover_page_target(port, 5, Duration::from_millis(10))
            .await
            .expect("target");

        assert!(target.is_page());
    }
}
