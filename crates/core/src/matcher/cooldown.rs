//! Per-element click cooldowns.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use super::catalog::REVEAL_COOLDOWN;
use super::dom::{DomTree, NodeId};
use super::text::normalize;

/// Structural levels (the element plus its ancestors) in a fingerprint.
pub const FINGERPRINT_DEPTH: usize = 4;
/// Characters of normalized text kept in a fingerprint.
pub const FINGERPRINT_TEXT_LEN: usize = 40;
/// Minimum spacing between prunes.
pub const PRUNE_INTERVAL: Duration = Duration::from_secs(30);
/// Entries older than this are dropped on prune.
pub const PRUNE_MAX_AGE: Duration = Duration::from_secs(REVEAL_COOLDOWN.as_secs() * 2);

/// Identifies an element by position and text, e.g. `div:0>div:2>button:1|run`.
///
/// The path stops early at a document or shadow root.
pub fn fingerprint(tree: &DomTree, node: NodeId) -> String {
	let mut path = Vec::with_capacity(FINGERPRINT_DEPTH);
	let mut current = Some(node);
	while let Some(id) = current {
		if path.len() == FINGERPRINT_DEPTH {
			break;
		}
		let Some(tag) = tree.tag(id) else { break };
		path.push(format!("{tag}:{}", tree.sibling_index(id)));
		current = tree.parent(id);
	}
	path.reverse();

	let text: String = normalize(&tree.text_content(node))
		.chars()
		.take(FINGERPRINT_TEXT_LEN)
		.collect();
	format!("{}|{text}", path.join(">"))
}

/// Fingerprint to last-click time.
#[derive(Debug, Default)]
pub struct CooldownLedger {
	entries: HashMap<String, Instant>,
	last_prune: Option<Instant>,
}

impl CooldownLedger {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn record(&mut self, fingerprint: String, now: Instant) {
		self.entries.insert(fingerprint, now);
	}

	/// True when `fingerprint` was clicked less than `window` before `now`.
	pub fn is_cooling(&self, fingerprint: &str, now: Instant, window: Duration) -> bool {
		self.entries
			.get(fingerprint)
			.is_some_and(|at| now.saturating_duration_since(*at) < window)
	}

	/// Drops entries older than [`PRUNE_MAX_AGE`], returning how many went.
	pub fn prune(&mut self, now: Instant) -> usize {
		let before = self.entries.len();
		self.entries
			.retain(|_, at| now.saturating_duration_since(*at) <= PRUNE_MAX_AGE);
		self.last_prune = Some(now);
		before - self.entries.len()
	}

	/// Prunes unless the previous prune was under [`PRUNE_INTERVAL`] ago.
	pub fn maybe_prune(&mut self, now: Instant) -> usize {
		match self.last_prune {
			Some(last) if now.saturating_duration_since(last) < PRUNE_INTERVAL => 0,
			_ => self.prune(now),
		}
	}

	pub fn len(&self) -> usize {
		self.entries.len()
	}

	pub fn is_empty(&self) -> bool {
		self.entries.is_empty()
	}
}
