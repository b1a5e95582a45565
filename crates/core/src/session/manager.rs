//! The session manager task.
//!
//! # Lifecycle
//!
//! ```text
//! start() ─► connect ──ok──► bootstrap (discover + enumerate + attach all)
//!              ▲  │                 │
//!              │  └─fail─► sleep ◄──┴── channel closed
//!              │            │
//!              └────────────┘        stop() ─► close + clear, task exits
//! ```
//!
//! All mutable state lives in one task. Attach sequences, re-injections and
//! heartbeat enumerations run as spawned tasks that only issue requests and
//! report back over a channel; reports from an older connection (epoch) are
//! dropped.

use std::collections::HashSet;
use std::sync::Arc;

use autoclick_protocol::methods::{
	DETACHED_FROM_TARGET, EXECUTION_CONTEXTS_CLEARED, GET_TARGETS, SET_DISCOVER_TARGETS, TARGET_CREATED, TARGET_DESTROYED,
};
use autoclick_protocol::{Event, GetTargetsResult, MatcherStatus, TargetCreated, TargetDestroyed, TargetDetached, TargetInfo};
use autoclick_runtime::{Connection, EventStream, WebSocketTransport};
use parking_lot::Mutex;
use serde_json::json;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, info, trace, warn};

use super::attach::{AttachOutcome, attach_and_inject, detach, inject};
use super::registry::SessionRegistry;
use crate::config::ManagerConfig;
use crate::discovery::{candidate_ports, probe_client, resolve_endpoint};
use crate::error::Result;
use crate::matcher::render_payload;

/// Observable manager state, published on every change.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ManagerSnapshot {
	/// Live sessions with an installed matcher.
	pub sessions: usize,
	/// Port of the current connection.
	pub active_port: Option<u16>,
	pub connected: bool,
}

struct Worker {
	stop_tx: oneshot::Sender<()>,
	handle: JoinHandle<()>,
}

/// Keeps a matcher installed in every eligible target of one browser.
pub struct SessionManager {
	config: Arc<ManagerConfig>,
	payload: Arc<str>,
	client: reqwest::Client,
	snapshot_tx: watch::Sender<ManagerSnapshot>,
	worker: Mutex<Option<Worker>>,
}

impl SessionManager {
	/// Fails when `config` does not [validate](ManagerConfig::validate).
	pub fn new(config: ManagerConfig) -> Result<Self> {
		config.validate()?;
		let payload: Arc<str> = render_payload(&config.matcher).into();
		let client = probe_client(config.probe_timeout)?;
		let (snapshot_tx, _) = watch::channel(ManagerSnapshot::default());
		Ok(Self {
			config: Arc::new(config),
			payload,
			client,
			snapshot_tx,
			worker: Mutex::new(None),
		})
	}

	/// Spawns the manager task. No-op while it is already running.
	///
	/// Must be called from within a tokio runtime.
	pub fn start(&self) {
		let mut worker = self.worker.lock();
		if worker.as_ref().is_some_and(|w| !w.handle.is_finished()) {
			return;
		}

		let (stop_tx, stop_rx) = oneshot::channel();
		let (task, report_rx) = ManagerTask::new(
			Arc::clone(&self.config),
			Arc::clone(&self.payload),
			self.client.clone(),
			self.snapshot_tx.clone(),
		);
		let handle = tokio::spawn(task.run(report_rx, stop_rx));
		*worker = Some(Worker { stop_tx, handle });
		debug!(target = "autoclick.manager", "started");
	}

	/// Stops the task, closing the connection and forgetting every session.
	///
	/// Returns once the task has exited. In-flight requests are dropped and
	/// their callers observe a closed channel.
	pub async fn stop(&self) {
		let Some(worker) = self.worker.lock().take() else {
			return;
		};
		let _ = worker.stop_tx.send(());
		if let Err(e) = worker.handle.await {
			if e.is_panic() {
				warn!(target = "autoclick.manager", error = %e, "manager task panicked");
			}
		}
		// The task publishes this too, unless it panicked.
		self.snapshot_tx.send_replace(ManagerSnapshot::default());
		debug!(target = "autoclick.manager", "stopped");
	}

	pub fn is_running(&self) -> bool {
		self.worker.lock().as_ref().is_some_and(|w| !w.handle.is_finished())
	}

	/// Number of targets with a live session.
	pub fn session_count(&self) -> usize {
		self.snapshot_tx.borrow().sessions
	}

	/// Port of the current connection, if connected.
	pub fn active_port(&self) -> Option<u16> {
		self.snapshot_tx.borrow().active_port
	}

	pub fn snapshot(&self) -> ManagerSnapshot {
		*self.snapshot_tx.borrow()
	}

	/// Receiver notified whenever the snapshot changes.
	pub fn subscribe(&self) -> watch::Receiver<ManagerSnapshot> {
		self.snapshot_tx.subscribe()
	}

	/// The expression evaluated in each target.
	pub fn payload(&self) -> &str {
		&self.payload
	}

	pub fn config(&self) -> &ManagerConfig {
		&self.config
	}
}

/// What a spawned task reports back.
enum Report {
	Attached { target: TargetInfo, outcome: AttachOutcome },
	Reinjected { session_id: String, status: Result<MatcherStatus> },
	Enumerated(Result<Vec<TargetInfo>>),
}

struct Tagged {
	epoch: u64,
	report: Report,
}

/// How a connected session ended.
enum Disconnect {
	Stopped,
	Closed,
}

struct ManagerTask {
	config: Arc<ManagerConfig>,
	payload: Arc<str>,
	client: reqwest::Client,
	snapshot_tx: watch::Sender<ManagerSnapshot>,
	registry: SessionRegistry,
	/// Targets with an attach sequence running.
	in_flight: HashSet<String>,
	last_good_port: Option<u16>,
	active_port: Option<u16>,
	epoch: u64,
	report_tx: mpsc::UnboundedSender<Tagged>,
}

impl ManagerTask {
	fn new(
		config: Arc<ManagerConfig>,
		payload: Arc<str>,
		client: reqwest::Client,
		snapshot_tx: watch::Sender<ManagerSnapshot>,
	) -> (Self, mpsc::UnboundedReceiver<Tagged>) {
		let (report_tx, report_rx) = mpsc::unbounded_channel();
		let task = Self {
			config,
			payload,
			client,
			snapshot_tx,
			registry: SessionRegistry::new(),
			in_flight: HashSet::new(),
			last_good_port: None,
			active_port: None,
			epoch: 0,
			report_tx,
		};
		(task, report_rx)
	}

	async fn run(mut self, mut report_rx: mpsc::UnboundedReceiver<Tagged>, mut stop_rx: oneshot::Receiver<()>) {
		let mut failures = 0u32;
		loop {
			let connected = tokio::select! {
				_ = &mut stop_rx => break,
				connected = self.connect() => connected,
			};

			match connected {
				Ok((connection, events)) => {
					failures = 0;
					let ended = self.drive(&connection, events, &mut report_rx, &mut stop_rx).await;
					connection.close();
					self.reset();
					if matches!(ended, Disconnect::Stopped) {
						return;
					}
					info!(
						target = "autoclick.manager",
						delay_ms = self.config.reconnect_delay.as_millis() as u64,
						"control channel closed; reconnecting"
					);
				}
				Err(e) => {
					if failures == 0 {
						warn!(target = "autoclick.manager", error = %e, "no DevTools endpoint; retrying");
					} else {
						debug!(target = "autoclick.manager", error = %e, attempt = failures + 1, "still no DevTools endpoint");
					}
					failures = failures.saturating_add(1);
				}
			}

			tokio::select! {
				_ = &mut stop_rx => break,
				_ = tokio::time::sleep(self.config.reconnect_delay) => {}
			}
		}
		self.reset();
	}

	/// Resolves a port and opens the control channel.
	async fn connect(&mut self) -> Result<(Arc<Connection>, EventStream)> {
		let ports = candidate_ports(self.last_good_port, self.config.port, self.config.fallback_port);
		let (port, info) = resolve_endpoint(&self.client, &ports).await?;
		let parts = WebSocketTransport::connect(&info.web_socket_debugger_url).await?;
		let (connection, events) = Connection::open(parts, self.config.request_timeout);

		self.last_good_port = Some(port);
		self.active_port = Some(port);
		self.epoch += 1;
		info!(
			target = "autoclick.manager",
			port,
			browser = info.browser.as_deref().unwrap_or("unknown"),
			"connected"
		);
		Ok((connection, events))
	}

	/// Enables discovery and attaches to every target that already exists.
	async fn bootstrap(&mut self, connection: &Arc<Connection>) -> Result<()> {
		connection
			.request(SET_DISCOVER_TARGETS, json!({"discover": true}), None)
			.await?;
		let targets: GetTargetsResult = connection.request_typed(GET_TARGETS, json!({}), None).await?;
		debug!(target = "autoclick.manager", count = targets.target_infos.len(), "enumerated targets");
		for target in targets.target_infos {
			self.consider(connection, target);
		}
		Ok(())
	}

	async fn drive(
		&mut self,
		connection: &Arc<Connection>,
		mut events: EventStream,
		report_rx: &mut mpsc::UnboundedReceiver<Tagged>,
		stop_rx: &mut oneshot::Receiver<()>,
	) -> Disconnect {
		let bootstrapped = tokio::select! {
			_ = &mut *stop_rx => return Disconnect::Stopped,
			result = self.bootstrap(connection) => result,
		};
		if let Err(e) = bootstrapped {
			warn!(target = "autoclick.manager", error = %e, "target discovery failed");
			return Disconnect::Closed;
		}
		self.publish();

		let period = self.config.heartbeat_interval;
		let mut heartbeat = tokio::time::interval_at(Instant::now() + period, period);
		heartbeat.set_missed_tick_behavior(MissedTickBehavior::Delay);

		loop {
			tokio::select! {
				_ = &mut *stop_rx => return Disconnect::Stopped,
				event = events.recv() => match event {
					Some(event) => self.handle_event(connection, event),
					None => return Disconnect::Closed,
				},
				Some(tagged) = report_rx.recv() => self.handle_report(connection, tagged),
				_ = heartbeat.tick() => self.spawn_enumeration(connection),
			}
		}
	}

	fn handle_event(&mut self, connection: &Arc<Connection>, event: Event) {
		match event.method.as_str() {
			TARGET_CREATED => match event.params_as::<TargetCreated>() {
				Ok(created) => self.consider(connection, created.target_info),
				Err(e) => debug!(target = "autoclick.manager", error = %e, "malformed targetCreated"),
			},
			TARGET_DESTROYED => match event.params_as::<TargetDestroyed>() {
				Ok(destroyed) => {
					self.in_flight.remove(&destroyed.target_id);
					if self.registry.forget_target(&destroyed.target_id).is_some() {
						debug!(target = "autoclick.manager", target_id = %destroyed.target_id, "target destroyed");
						self.publish();
					}
				}
				Err(e) => debug!(target = "autoclick.manager", error = %e, "malformed targetDestroyed"),
			},
			DETACHED_FROM_TARGET => match event.params_as::<TargetDetached>() {
				Ok(detached) => {
					if let Some(target_id) = self.registry.remove_session(&detached.session_id) {
						debug!(target = "autoclick.manager", %target_id, session = %detached.session_id, "session detached");
						self.publish();
					}
				}
				Err(e) => debug!(target = "autoclick.manager", error = %e, "malformed detachedFromTarget"),
			},
			EXECUTION_CONTEXTS_CLEARED => {
				if let Some(session_id) = event.session_id {
					if self.registry.target_for(&session_id).is_some() {
						self.spawn_reinject(connection, session_id);
					}
				}
			}
			other => trace!(target = "autoclick.manager", method = other, "unhandled event"),
		}
	}

	/// Starts an attach sequence unless the target is ineligible or already handled.
	fn consider(&mut self, connection: &Arc<Connection>, target: TargetInfo) {
		if !self.config.targets.is_eligible(&target) {
			trace!(target = "autoclick.manager", target_id = %target.target_id, kind = %target.kind, "ineligible target");
			return;
		}
		if self.registry.is_known(&target.target_id) || !self.in_flight.insert(target.target_id.clone()) {
			return;
		}

		let connection = Arc::clone(connection);
		let payload = Arc::clone(&self.payload);
		let report_tx = self.report_tx.clone();
		let epoch = self.epoch;
		tokio::spawn(async move {
			let outcome = attach_and_inject(&connection, &target, &payload).await;
			let _ = report_tx.send(Tagged {
				epoch,
				report: Report::Attached { target, outcome },
			});
		});
	}

	fn spawn_reinject(&self, connection: &Arc<Connection>, session_id: String) {
		let connection = Arc::clone(connection);
		let payload = Arc::clone(&self.payload);
		let report_tx = self.report_tx.clone();
		let epoch = self.epoch;
		let settle = self.config.settle_delay;
		tokio::spawn(async move {
			tokio::time::sleep(settle).await;
			let status = inject(&connection, &session_id, &payload).await;
			let _ = report_tx.send(Tagged {
				epoch,
				report: Report::Reinjected { session_id, status },
			});
		});
	}

	fn spawn_enumeration(&self, connection: &Arc<Connection>) {
		let connection = Arc::clone(connection);
		let report_tx = self.report_tx.clone();
		let epoch = self.epoch;
		tokio::spawn(async move {
			let targets = connection
				.request_typed::<GetTargetsResult>(GET_TARGETS, json!({}), None)
				.await
				.map(|r| r.target_infos)
				.map_err(Into::into);
			let _ = report_tx.send(Tagged {
				epoch,
				report: Report::Enumerated(targets),
			});
		});
	}

	fn handle_report(&mut self, connection: &Arc<Connection>, tagged: Tagged) {
		if tagged.epoch != self.epoch {
			trace!(target = "autoclick.manager", epoch = tagged.epoch, "dropping stale report");
			return;
		}

		match tagged.report {
			Report::Attached { target, outcome } => self.finish_attach(connection, target, outcome),
			Report::Reinjected { session_id, status } => match status {
				Ok(MatcherStatus::NotApplicable) => {
					if let Some(target_id) = self.registry.target_for(&session_id).map(str::to_owned) {
						self.registry.ignore(&target_id);
						self.spawn_detach(connection, session_id);
						self.publish();
					}
				}
				Ok(status) => debug!(target = "autoclick.manager", session = %session_id, %status, "re-injected"),
				Err(e) => debug!(target = "autoclick.manager", session = %session_id, error = %e, "re-injection failed"),
			},
			Report::Enumerated(Ok(targets)) => {
				trace!(target = "autoclick.manager", count = targets.len(), "heartbeat");
				for target in targets {
					self.consider(connection, target);
				}
			}
			Report::Enumerated(Err(e)) => debug!(target = "autoclick.manager", error = %e, "heartbeat failed"),
		}
	}

	fn finish_attach(&mut self, connection: &Arc<Connection>, target: TargetInfo, outcome: AttachOutcome) {
		if !self.in_flight.remove(&target.target_id) {
			// Destroyed while attaching.
			if let AttachOutcome::Registered { session_id, .. } = outcome {
				self.spawn_detach(connection, session_id);
			}
			return;
		}

		match outcome {
			AttachOutcome::Registered { session_id, status } => {
				info!(
					target = "autoclick.manager",
					target_id = %target.target_id,
					kind = %target.kind,
					url = %target.url,
					%status,
					"matcher injected"
				);
				if let Some(previous) = self.registry.register(&target.target_id, &session_id) {
					self.spawn_detach(connection, previous);
				}
				self.publish();
			}
			AttachOutcome::Ignored(reason) => {
				debug!(target = "autoclick.manager", target_id = %target.target_id, %reason, "target ignored");
				self.registry.ignore(&target.target_id);
			}
			AttachOutcome::Failed(e) => {
				warn!(target = "autoclick.manager", target_id = %target.target_id, error = %e, "attach failed");
			}
		}
	}

	fn spawn_detach(&self, connection: &Arc<Connection>, session_id: String) {
		let connection = Arc::clone(connection);
		tokio::spawn(async move { detach(&connection, &session_id).await });
	}

	/// Forgets all connection-scoped state.
	fn reset(&mut self) {
		self.registry.clear();
		self.in_flight.clear();
		self.active_port = None;
		self.epoch += 1;
		self.publish_with(false);
	}

	fn publish(&self) {
		self.publish_with(self.active_port.is_some());
	}

	fn publish_with(&self, connected: bool) {
		let next = ManagerSnapshot {
			sessions: self.registry.len(),
			active_port: self.active_port,
			connected,
		};
		self.snapshot_tx.send_if_modified(|current| {
			if *current == next {
				return false;
			}
			*current = next;
			true
		});
	}
}
