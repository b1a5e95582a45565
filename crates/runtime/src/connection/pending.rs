//! Thread-safe table of in-flight requests.
//!
//! Uses [`DashMap`] so the dispatch loop, request futures and their
//! cancellation guards can all touch the table without an async lock. Each
//! slot is removed exactly once: by the matching response, by the request's
//! own timeout/cancellation, or by [`PendingStore::clear`] on teardown.

use autoclick_protocol::ResponseError;
use dashmap::DashMap;
use serde_json::Value;
use tokio::sync::oneshot;

/// What the remote endpoint answered: a result or its error object.
pub(crate) type Reply = std::result::Result<Value, ResponseError>;

/// Response slot for one request.
pub(crate) type Slot = oneshot::Sender<Reply>;

/// Pending requests keyed by request id.
#[derive(Default)]
pub(crate) struct PendingStore {
	slots: DashMap<u64, Slot>,
}

impl PendingStore {
	pub(crate) fn new() -> Self {
		Self::default()
	}

	pub(crate) fn insert(&self, id: u64, slot: Slot) {
		self.slots.insert(id, slot);
	}

	/// Delivers `result` to the waiter registered under `id`.
	///
	/// Returns false when no such request is pending (already timed out, or
	/// never issued by us).
	pub(crate) fn resolve(&self, id: u64, result: Reply) -> bool {
		match self.slots.remove(&id) {
			Some((_, slot)) => {
				// The waiter may have been dropped between removal and send.
				let _ = slot.send(result);
				true
			}
			None => false,
		}
	}

	/// Forgets a request without answering it.
	pub(crate) fn cancel(&self, id: u64) -> bool {
		self.slots.remove(&id).is_some()
	}

	/// Drops every slot; waiters observe a closed channel.
	pub(crate) fn clear(&self) -> usize {
		let count = self.slots.len();
		self.slots.clear();
		count
	}

	pub(crate) fn len(&self) -> usize {
		self.slots.len()
	}
}
