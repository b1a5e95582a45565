//! Target to session bookkeeping.

use std::collections::{HashMap, HashSet};

/// Live sessions by target id, plus targets rejected until destroyed.
///
/// A target id is in at most one of the two.
#[derive(Debug, Default)]
pub struct SessionRegistry {
	sessions: HashMap<String, String>,
	ignored: HashSet<String>,
}

impl SessionRegistry {
	pub fn new() -> Self {
		Self::default()
	}

	/// Records a live session. Returns the session it replaced, if any.
	pub fn register(&mut self, target_id: &str, session_id: &str) -> Option<String> {
		self.ignored.remove(target_id);
		self.sessions.insert(target_id.to_string(), session_id.to_string())
	}

	/// Marks a target as not worth attaching to. Returns its live session, if any.
	pub fn ignore(&mut self, target_id: &str) -> Option<String> {
		self.ignored.insert(target_id.to_string());
		self.sessions.remove(target_id)
	}

	/// Forgets everything about a destroyed target.
	pub fn forget_target(&mut self, target_id: &str) -> Option<String> {
		self.ignored.remove(target_id);
		self.sessions.remove(target_id)
	}

	/// Removes the entry owning `session_id`, returning its target id.
	pub fn remove_session(&mut self, session_id: &str) -> Option<String> {
		let target_id = self.target_for(session_id)?.to_string();
		self.sessions.remove(&target_id);
		Some(target_id)
	}

	pub fn target_for(&self, session_id: &str) -> Option<&str> {
		self.sessions
			.iter()
			.find(|(_, s)| s.as_str() == session_id)
			.map(|(t, _)| t.as_str())
	}

	pub fn session_for(&self, target_id: &str) -> Option<&str> {
		self.sessions.get(target_id).map(String::as_str)
	}

	/// True when the target is tracked or ignored.
	pub fn is_known(&self, target_id: &str) -> bool {
		self.sessions.contains_key(target_id) || self.ignored.contains(target_id)
	}

	pub fn is_ignored(&self, target_id: &str) -> bool {
		self.ignored.contains(target_id)
	}

	pub fn len(&self) -> usize {
		self.sessions.len()
	}

	pub fn is_empty(&self) -> bool {
		self.sessions.is_empty()
	}

	pub fn ignored_len(&self) -> usize {
		self.ignored.len()
	}

	pub fn clear(&mut self) {
		self.sessions.clear();
		self.ignored.clear();
	}
}
