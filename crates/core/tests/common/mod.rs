//! In-process DevTools endpoint for driving the session manager.
//!
//! Serves `/json/version` and a browser-level WebSocket that understands the
//! handful of methods the manager uses. Targets, evaluation results and
//! connection drops are scripted by the test.

#![allow(dead_code)]

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use autoclick::session::DOCUMENT_PROBE;
use axum::Json;
use axum::Router;
use axum::extract::ws::{Message, WebSocket};
use axum::extract::{State, WebSocketUpgrade};
use axum::routing::get;
use futures::{SinkExt, StreamExt};
use parking_lot::Mutex;
use serde_json::{Value, json};
use tokio::net::TcpListener;
use tokio::sync::{broadcast, mpsc};

#[derive(Debug, Clone)]
pub struct FakeTarget {
	pub id: String,
	pub kind: String,
	pub url: String,
	pub has_document: bool,
	/// Status the payload reports on first install.
	pub status: String,
	/// Status reported once the target has navigated.
	pub after_navigation: Option<String>,
	/// Delay before answering a payload evaluation.
	pub payload_delay: Option<Duration>,
}

impl FakeTarget {
	pub fn new(id: &str, kind: &str, url: &str) -> Self {
		Self {
			id: id.into(),
			kind: kind.into(),
			url: url.into(),
			has_document: true,
			status: "observer-installed".into(),
			after_navigation: None,
			payload_delay: None,
		}
	}

	pub fn page(id: &str) -> Self {
		Self::new(id, "page", &format!("https://app.local/{id}"))
	}

	pub fn without_document(mut self) -> Self {
		self.has_document = false;
		self
	}

	pub fn reporting(mut self, status: &str) -> Self {
		self.status = status.into();
		self
	}

	pub fn reporting_after_navigation(mut self, status: &str) -> Self {
		self.after_navigation = Some(status.into());
		self
	}

	/// Holds back payload evaluation replies, leaving the attach in flight.
	pub fn answering_after(mut self, delay: Duration) -> Self {
		self.payload_delay = Some(delay);
		self
	}

	fn info(&self) -> Value {
		json!({
			"targetId": self.id,
			"type": self.kind,
			"title": self.id,
			"url": self.url,
			"attached": false
		})
	}
}

#[derive(Default)]
struct BrowserState {
	targets: Vec<FakeTarget>,
	sessions: HashMap<String, String>,
	installed: HashMap<String, bool>,
	next_session: u64,
	attaches: HashMap<String, usize>,
	payload_evaluations: HashMap<String, usize>,
	detaches: Vec<String>,
	connections: usize,
}

impl BrowserState {
	fn target(&self, id: &str) -> Option<&FakeTarget> {
		self.targets.iter().find(|t| t.id == id)
	}

	/// How long to hold the reply to a payload evaluation.
	fn reply_delay(&self, method: &str, params: &Value, session_id: Option<&str>) -> Option<Duration> {
		if method != "Runtime.evaluate" || params["expression"].as_str() == Some(DOCUMENT_PROBE) {
			return None;
		}
		let target_id = self.sessions.get(session_id?)?;
		self.target(target_id)?.payload_delay
	}

	fn handle(&mut self, method: &str, params: &Value, session_id: Option<&str>) -> Result<Value, String> {
		match method {
			"Target.setDiscoverTargets" | "Runtime.enable" => Ok(json!({})),
			"Target.getTargets" => Ok(json!({
				"targetInfos": self.targets.iter().map(FakeTarget::info).collect::<Vec<_>>()
			})),
			"Target.attachToTarget" => {
				let target_id = params["targetId"].as_str().unwrap_or_default().to_string();
				if self.target(&target_id).is_none() {
					return Err("No target with given id found".into());
				}
				self.next_session += 1;
				let session_id = format!("S{}", self.next_session);
				self.sessions.insert(session_id.clone(), target_id.clone());
				*self.attaches.entry(target_id).or_default() += 1;
				Ok(json!({"sessionId": session_id}))
			}
			"Target.detachFromTarget" => {
				let session_id = params["sessionId"].as_str().unwrap_or_default().to_string();
				self.sessions.remove(&session_id);
				self.detaches.push(session_id);
				Ok(json!({}))
			}
			"Runtime.evaluate" => {
				let target_id = session_id
					.and_then(|s| self.sessions.get(s))
					.cloned()
					.ok_or_else(|| "Session not found".to_string())?;
				let target = self.target(&target_id).cloned().ok_or("Target closed")?;
				let expression = params["expression"].as_str().unwrap_or_default();
				if expression == DOCUMENT_PROBE {
					return Ok(json!({"result": {"type": "boolean", "value": target.has_document}}));
				}

				*self.payload_evaluations.entry(target_id.clone()).or_default() += 1;
				let installed = self.installed.entry(target_id).or_default();
				let status = if *installed {
					"already-active".to_string()
				} else {
					*installed = target.status == "observer-installed";
					target.status.clone()
				};
				Ok(json!({"result": {"type": "string", "value": status}}))
			}
			other => Err(format!("'{other}' wasn't found")),
		}
	}
}

type Shared = (Arc<Mutex<BrowserState>>, broadcast::Sender<Value>, broadcast::Sender<()>);

pub struct FakeBrowser {
	pub port: u16,
	state: Arc<Mutex<BrowserState>>,
	events: broadcast::Sender<Value>,
	kill: broadcast::Sender<()>,
}

impl FakeBrowser {
	pub async fn start(targets: Vec<FakeTarget>) -> Self {
		let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
		let port = listener.local_addr().unwrap().port();

		let state = Arc::new(Mutex::new(BrowserState {
			targets,
			..Default::default()
		}));
		let (events, _) = broadcast::channel(64);
		let (kill, _) = broadcast::channel(4);
		let shared: Shared = (Arc::clone(&state), events.clone(), kill.clone());

		let app = Router::new()
			.route(
				"/json/version",
				get(move || async move {
					Json(json!({
						"Browser": "FakeChrome/1.0",
						"webSocketDebuggerUrl": format!("ws://127.0.0.1:{port}/devtools/browser/fake")
					}))
				}),
			)
			.route(
				"/devtools/browser/fake",
				get(|ws: WebSocketUpgrade, State(shared): State<Shared>| async move {
					ws.on_upgrade(move |socket| handle_socket(socket, shared))
				}),
			)
			.with_state(shared);

		tokio::spawn(async move {
			axum::serve(listener, app).await.unwrap();
		});

		Self {
			port,
			state,
			events,
			kill,
		}
	}

	/// Adds a target and announces it.
	pub fn create_target(&self, target: FakeTarget) {
		let info = target.info();
		self.state.lock().targets.push(target);
		self.emit(json!({"method": "Target.targetCreated", "params": {"targetInfo": info}}));
	}

	/// Adds a target without announcing it; only enumeration finds it.
	pub fn add_target_silently(&self, target: FakeTarget) {
		self.state.lock().targets.push(target);
	}

	pub fn destroy_target(&self, id: &str) {
		{
			let mut state = self.state.lock();
			state.targets.retain(|t| t.id != id);
			state.sessions.retain(|_, t| t != id);
			state.installed.remove(id);
		}
		self.emit(json!({"method": "Target.targetDestroyed", "params": {"targetId": id}}));
	}

	/// Simulates a navigation: the target's context state is lost.
	pub fn clear_contexts(&self, target_id: &str) {
		let session = {
			let mut state = self.state.lock();
			state.installed.remove(target_id);
			if let Some(target) = state.targets.iter_mut().find(|t| t.id == target_id) {
				if let Some(status) = target.after_navigation.clone() {
					target.status = status;
				}
			}
			state
				.sessions
				.iter()
				.find(|(_, t)| t.as_str() == target_id)
				.map(|(s, _)| s.clone())
		};
		if let Some(session) = session {
			self.emit(json!({"method": "Runtime.executionContextsCleared", "params": {}, "sessionId": session}));
		}
	}

	/// Detaches a live session from the browser side.
	pub fn detach_remotely(&self, target_id: &str) {
		let session = {
			let mut state = self.state.lock();
			let session = state
				.sessions
				.iter()
				.find(|(_, t)| t.as_str() == target_id)
				.map(|(s, _)| s.clone());
			if let Some(session) = &session {
				state.sessions.remove(session);
			}
			session
		};
		if let Some(session) = session {
			self.emit(json!({
				"method": "Target.detachedFromTarget",
				"params": {"sessionId": session, "targetId": target_id}
			}));
		}
	}

	pub fn emit(&self, event: Value) {
		let _ = self.events.send(event);
	}

	/// Closes every open control channel.
	pub fn drop_connections(&self) {
		let _ = self.kill.send(());
	}

	pub fn attach_count(&self, target_id: &str) -> usize {
		self.state.lock().attaches.get(target_id).copied().unwrap_or(0)
	}

	pub fn payload_evaluations(&self, target_id: &str) -> usize {
		self.state.lock().payload_evaluations.get(target_id).copied().unwrap_or(0)
	}

	pub fn detach_count(&self) -> usize {
		self.state.lock().detaches.len()
	}

	pub fn connection_count(&self) -> usize {
		self.state.lock().connections
	}

	pub fn live_sessions(&self) -> usize {
		self.state.lock().sessions.len()
	}
}

async fn handle_socket(socket: WebSocket, (state, events, kill): Shared) {
	state.lock().connections += 1;
	let mut events = events.subscribe();
	let mut kill = kill.subscribe();

	let (mut ws_tx, mut ws_rx) = socket.split();
	let (out_tx, mut out_rx) = mpsc::unbounded_channel::<Message>();
	let writer = tokio::spawn(async move {
		while let Some(message) = out_rx.recv().await {
			let closing = matches!(message, Message::Close(_));
			if ws_tx.send(message).await.is_err() || closing {
				break;
			}
		}
	});

	loop {
		tokio::select! {
			_ = kill.recv() => {
				let _ = out_tx.send(Message::Close(None));
				break;
			}
			event = events.recv() => {
				if let Ok(event) = event {
					let _ = out_tx.send(Message::Text(event.to_string().into()));
				}
			}
			incoming = ws_rx.next() => {
				let Some(Ok(message)) = incoming else { break };
				let Message::Text(text) = message else { continue };
				let Ok(request) = serde_json::from_str::<Value>(&text) else { continue };

				let method = request["method"].as_str().unwrap_or_default().to_string();
				let session_id = request["sessionId"].as_str().map(str::to_owned);
				let (outcome, delay) = {
					let mut state = state.lock();
					let delay = state.reply_delay(&method, &request["params"], session_id.as_deref());
					(state.handle(&method, &request["params"], session_id.as_deref()), delay)
				};
				let mut reply = match outcome {
					Ok(result) => json!({"id": request["id"], "result": result}),
					Err(message) => json!({"id": request["id"], "error": {"code": -32000, "message": message}}),
				};
				if let Some(session_id) = session_id {
					reply["sessionId"] = json!(session_id);
				}
				let reply = Message::Text(reply.to_string().into());
				match delay {
					Some(delay) => {
						let out_tx = out_tx.clone();
						tokio::spawn(async move {
							tokio::time::sleep(delay).await;
							let _ = out_tx.send(reply);
						});
					}
					None => {
						let _ = out_tx.send(reply);
					}
				}
			}
		}
	}

	drop(out_tx);
	let _ = writer.await;
}

/// Polls `condition` until it holds or a few seconds pass.
pub async fn eventually<F>(mut condition: F) -> bool
where
	F: FnMut() -> bool,
{
	for _ in 0..300 {
		if condition() {
			return true;
		}
		tokio::time::sleep(Duration::from_millis(10)).await;
	}
	condition()
}

/// Runs `future` with a generous ceiling so a hung test fails instead of stalling.
pub async fn within<T>(future: impl Future<Output = T>) -> T {
	tokio::time::timeout(Duration::from_secs(10), future)
		.await
		.expect("test step timed out")
}
