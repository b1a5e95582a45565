//! Request/response correlation on top of a transport.
//!
//! # Message Flow
//!
//! 1. Caller invokes [`Connection::request`] with a method, params and an
//!    optional flattened session id
//! 2. Connection assigns the next id and parks a oneshot slot in the pending
//!    table
//! 3. The request is queued to the writer task
//! 4. The dispatch loop consumes the single inbound queue: frames with a
//!    pending `id` resolve their slot, frames with a `method` are forwarded
//!    on the event stream, everything else is dropped
//! 5. The caller's timeout and the response race; whichever comes first
//!    removes the slot and the other becomes a no-op
//!
//! When the inbound queue ends (socket closed), every pending slot is dropped
//! and the event stream closes, which is how owners learn the channel is gone.


mod pending;

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use autoclick_protocol::{Event, Message, Request};
use parking_lot::Mutex;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, trace, warn};

use self::pending::PendingStore;
use crate::error::{Error, Result};
use crate::transport::{Transport, TransportParts};

/// Default per-request timeout.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(5);

/// Stream of out-of-band events; yields `None` once the channel is gone.
pub type EventStream = mpsc::UnboundedReceiver<Event>;

enum Outbound {
	Frame(Value),
	Close,
}

/// RAII guard ensuring the pending slot is released when a request future is
/// dropped or times out.
struct CancelGuard {
	id: u64,
	pending: Arc<PendingStore>,
	completed: bool,
}

impl CancelGuard {
	fn new(id: u64, pending: Arc<PendingStore>) -> Self {
		Self {
			id,
			pending,
			completed: false,
		}
	}

	fn complete(&mut self) {
		self.completed = true;
	}
}

impl Drop for CancelGuard {
	fn drop(&mut self) {
		if !self.completed && self.pending.cancel(self.id) {
			trace!(target = "autoclick.connection", id = self.id, "released abandoned request slot");
		}
	}
}

/// Correlated control-channel connection.
pub struct Connection {
	last_id: AtomicU64,
	pending: Arc<PendingStore>,
	outbound_tx: mpsc::UnboundedSender<Outbound>,
	request_timeout: Duration,
	/// Reader and dispatch tasks; the writer exits on its own once told to close.
	tasks: Mutex<Vec<JoinHandle<()>>>,
}

impl Connection {
	/// Starts the reader, writer and dispatch tasks for `parts`.
	///
	/// Returns the shared connection handle and the event stream fed by the
	/// dispatch loop.
	pub fn open(parts: TransportParts, request_timeout: Duration) -> (Arc<Self>, EventStream) {
		let TransportParts {
			sender,
			receiver,
			mut message_rx,
		} = parts;

		let (outbound_tx, outbound_rx) = mpsc::unbounded_channel();
		let (event_tx, event_rx) = mpsc::unbounded_channel();
		let pending = Arc::new(PendingStore::new());

		let reader = tokio::spawn(async move {
			if let Err(e) = receiver.run().await {
				warn!(target = "autoclick.connection", error = %e, "transport read error");
			}
		});

		tokio::spawn(write_loop(sender, outbound_rx));

		let dispatch_pending = Arc::clone(&pending);
		let dispatcher = tokio::spawn(async move {
			while let Some(value) = message_rx.recv().await {
				dispatch(&dispatch_pending, &event_tx, value);
			}
			let dropped = dispatch_pending.clear();
			debug!(target = "autoclick.connection", dropped, "inbound queue closed");
		});

		let connection = Arc::new(Self {
			last_id: AtomicU64::new(0),
			pending,
			outbound_tx,
			request_timeout,
			tasks: Mutex::new(vec![reader, dispatcher]),
		});
		(connection, event_rx)
	}

	/// Sends `method` and awaits its result under the default timeout.
	pub async fn request(&self, method: &str, params: Value, session_id: Option<&str>) -> Result<Value> {
		self.request_with_timeout(method, params, session_id, self.request_timeout)
			.await
	}

	/// Sends `method` and deserializes its result into `T`.
	pub async fn request_typed<T: DeserializeOwned>(
		&self,
		method: &str,
		params: Value,
		session_id: Option<&str>,
	) -> Result<T> {
		let value = self.request(method, params, session_id).await?;
		Ok(serde_json::from_value(value)?)
	}

	/// Sends `method` and awaits its result, failing only this request if
	/// nothing arrives within `timeout`.
	pub async fn request_with_timeout(
		&self,
		method: &str,
		params: Value,
		session_id: Option<&str>,
		timeout: Duration,
	) -> Result<Value> {
		let id = self.last_id.fetch_add(1, Ordering::SeqCst) + 1;

		let (tx, rx) = oneshot::channel();
		self.pending.insert(id, tx);
		let mut guard = CancelGuard::new(id, Arc::clone(&self.pending));

		let request = Request {
			id,
			method: method.to_string(),
			params,
			session_id: session_id.map(str::to_owned),
		};
		let frame = serde_json::to_value(&request)?;
		trace!(target = "autoclick.connection", id, method, session = ?session_id, "sending request");

		if self.outbound_tx.send(Outbound::Frame(frame)).is_err() {
			return Err(Error::ChannelClosed);
		}

		let reply = match tokio::time::timeout(timeout, rx).await {
			Ok(Ok(reply)) => reply,
			Ok(Err(_)) => {
				// Slot dropped by teardown; nothing left to cancel.
				guard.complete();
				return Err(Error::ChannelClosed);
			}
			Err(_) => {
				debug!(target = "autoclick.connection", id, method, "request timed out");
				return Err(Error::Timeout {
					method: method.to_string(),
					timeout_ms: timeout.as_millis() as u64,
				});
			}
		};
		guard.complete();

		reply.map_err(|e| Error::Remote {
			method: method.to_string(),
			code: e.code,
			message: e.message,
		})
	}

	/// Closes the socket and drops every pending request.
	///
	/// Waiters parked on a dropped request observe [`Error::ChannelClosed`].
	/// The event stream ends without delivering further events.
	pub fn close(&self) {
		let _ = self.outbound_tx.send(Outbound::Close);
		let dropped = self.pending.clear();
		for task in self.tasks.lock().drain(..) {
			task.abort();
		}
		debug!(target = "autoclick.connection", dropped, "connection closed");
	}

	/// True once the writer has stopped accepting frames.
	pub fn is_closed(&self) -> bool {
		self.outbound_tx.is_closed()
	}

	/// Number of requests still awaiting a response.
	pub fn pending_count(&self) -> usize {
		self.pending.len()
	}
}

impl Drop for Connection {
	fn drop(&mut self) {
		for task in self.tasks.get_mut().drain(..) {
			task.abort();
		}
	}
}

async fn write_loop(mut sender: Box<dyn Transport>, mut outbound_rx: mpsc::UnboundedReceiver<Outbound>) {
	while let Some(outbound) = outbound_rx.recv().await {
		match outbound {
			Outbound::Frame(frame) => {
				if let Err(e) = sender.send(frame).await {
					warn!(target = "autoclick.connection", error = %e, "transport write error");
					break;
				}
			}
			Outbound::Close => {
				if let Err(e) = sender.close().await {
					debug!(target = "autoclick.connection", error = %e, "close handshake failed");
				}
				break;
			}
		}
	}
}

/// Routes one inbound frame: resolve a pending request or forward an event.
fn dispatch(pending: &PendingStore, events: &mpsc::UnboundedSender<Event>, value: Value) {
	match serde_json::from_value::<Message>(value) {
		Ok(Message::Response(response)) => {
			let reply = match response.error {
				Some(error) => Err(error),
				None => Ok(response.result.unwrap_or(Value::Null)),
			};
			if !pending.resolve(response.id, reply) {
				debug!(
					target = "autoclick.connection",
					id = response.id,
					"response for unknown or expired request"
				);
			}
		}
		Ok(Message::Event(event)) => {
			trace!(target = "autoclick.connection", method = %event.method, "event");
			// Owner may have stopped listening; events are fire-and-forget.
			let _ = events.send(event);
		}
		Ok(Message::Unknown(value)) => {
			debug!(target = "autoclick.connection", frame = %value, "ignoring unrecognized frame");
		}
		Err(e) => {
			debug!(target = "autoclick.connection", error = %e, "ignoring malformed frame");
		}
	}
}
