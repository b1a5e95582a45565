//! Bootstrap discovery of the control-channel URL.
//!
//! Every DevTools host serves `GET /json/version` on its debugging port. The
//! `webSocketDebuggerUrl` field of that document is the browser-level
//! control channel.

use std::time::Duration;

use autoclick_protocol::VersionInfo;
use tracing::debug;
use url::Url;

use crate::error::{Error, Result};

/// Loopback hosts tried for each port, in order.
const PROBE_HOSTS: &[&str] = &["127.0.0.1", "localhost"];

/// Ports to probe: last known good, configured, fallback; duplicates removed.
pub fn candidate_ports(last_good: Option<u16>, configured: u16, fallback: u16) -> Vec<u16> {
	let mut ports = Vec::with_capacity(3);
	for port in last_good.into_iter().chain([configured, fallback]) {
		if !ports.contains(&port) {
			ports.push(port);
		}
	}
	ports
}

/// HTTP client used for bootstrap probes.
pub fn probe_client(timeout: Duration) -> Result<reqwest::Client> {
	Ok(reqwest::Client::builder().timeout(timeout).no_proxy().build()?)
}

/// Checks that `raw` is a `ws://` or `wss://` URL.
pub fn validate_endpoint(raw: &str) -> Result<Url> {
	let url = Url::parse(raw).map_err(|e| Error::InvalidEndpoint {
		url: raw.to_string(),
		reason: e.to_string(),
	})?;
	match url.scheme() {
		"ws" | "wss" => Ok(url),
		other => Err(Error::InvalidEndpoint {
			url: raw.to_string(),
			reason: format!("unsupported scheme {other:?}"),
		}),
	}
}

/// Fetches `/json/version` from `port` on the loopback interface.
pub async fn fetch_version(client: &reqwest::Client, port: u16) -> Result<VersionInfo> {
	let mut last_error = "no response".to_string();

	for host in PROBE_HOSTS {
		let url = format!("http://{host}:{port}/json/version");
		let response = match client.get(&url).send().await {
			Ok(r) => r,
			Err(e) => {
				last_error = e.to_string();
				continue;
			}
		};

		if !response.status().is_success() {
			last_error = format!("unexpected status {}", response.status());
			continue;
		}

		let info: VersionInfo = response.json().await.map_err(|e| Error::Discovery {
			port,
			reason: format!("malformed version document: {e}"),
		})?;
		validate_endpoint(&info.web_socket_debugger_url)?;
		return Ok(info);
	}

	Err(Error::Discovery {
		port,
		reason: last_error,
	})
}

/// Returns the first port in `ports` that answers, with its version document.
pub async fn resolve_endpoint(client: &reqwest::Client, ports: &[u16]) -> Result<(u16, VersionInfo)> {
	for &port in ports {
		match fetch_version(client, port).await {
			Ok(info) => {
				debug!(target = "autoclick.discovery", port, url = %info.web_socket_debugger_url, "endpoint found");
				return Ok((port, info));
			}
			Err(e) => debug!(target = "autoclick.discovery", port, error = %e, "port did not answer"),
		}
	}
	Err(Error::NoEndpoint { ports: ports.to_vec() })
}

#[cfg(test)]
mod tests {
	use axum::Json;
	use axum::Router;
	use axum::routing::get;
	use serde_json::json;
	use tokio::net::TcpListener;

	use super::*;

	async fn serve_version(body: serde_json::Value) -> u16 {
		let app = Router::new().route("/json/version", get(move || async move { Json(body) }));
		let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
		let port = listener.local_addr().unwrap().port();
		tokio::spawn(async move {
			axum::serve(listener, app).await.unwrap();
		});
		port
	}

	async fn unused_port() -> u16 {
		let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
		listener.local_addr().unwrap().port()
	}

	#[test]
	fn candidate_ports_keep_order_and_dedupe() {
		assert_eq!(candidate_ports(None, 9222, 9000), [9222, 9000]);
		assert_eq!(candidate_ports(Some(9333), 9222, 9000), [9333, 9222, 9000]);
		assert_eq!(candidate_ports(Some(9222), 9222, 9000), [9222, 9000]);
		assert_eq!(candidate_ports(Some(9000), 9000, 9000), [9000]);
	}

	#[test]
	fn endpoint_must_be_websocket() {
		assert!(validate_endpoint("ws://127.0.0.1:9222/devtools/browser/abc").is_ok());
		assert!(validate_endpoint("wss://host/devtools/browser/abc").is_ok());
		assert!(matches!(
			validate_endpoint("http://127.0.0.1:9222/"),
			Err(Error::InvalidEndpoint { .. })
		));
		assert!(validate_endpoint("not a url").is_err());
	}

	#[tokio::test]
	async fn resolves_first_answering_port() {
		let dead = unused_port().await;
		let live = serve_version(json!({
			"Browser": "Chrome/126.0",
			"webSocketDebuggerUrl": "ws://127.0.0.1:1/devtools/browser/x"
		}))
		.await;

		let client = probe_client(Duration::from_millis(400)).unwrap();
		let (port, info) = resolve_endpoint(&client, &[dead, live]).await.unwrap();
		assert_eq!(port, live);
		assert_eq!(info.web_socket_debugger_url, "ws://127.0.0.1:1/devtools/browser/x");
	}

	#[tokio::test]
	async fn no_answer_names_every_port() {
		let dead = unused_port().await;
		let client = probe_client(Duration::from_millis(200)).unwrap();
		match resolve_endpoint(&client, &[dead]).await {
			Err(Error::NoEndpoint { ports }) => assert_eq!(ports, [dead]),
			other => panic!("expected NoEndpoint, got {other:?}"),
		}
	}

	#[tokio::test]
	async fn rejects_non_websocket_debugger_url() {
		let port = serve_version(json!({"webSocketDebuggerUrl": "http://127.0.0.1/"})).await;
		let client = probe_client(Duration::from_millis(400)).unwrap();
		assert!(matches!(
			fetch_version(&client, port).await,
			Err(Error::InvalidEndpoint { .. })
		));
	}
}
