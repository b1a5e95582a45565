//! Matcher orchestration inside one execution context.

use std::time::Instant;

use autoclick_protocol::MatcherStatus;
use tracing::trace;

use super::catalog::{ActionCatalog, MatcherConfig, Pass};
use super::cooldown::CooldownLedger;
use super::dom::{DomTree, NodeId};
use super::markers::PanelMarker;
use super::search::{find_match, walk};
use super::throttle::ScanThrottle;

/// Result of one scan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanResult {
	/// No panel marker present; nothing was searched.
	Skipped,
	NoMatch,
	Clicked { phrase: String, node: NodeId },
}

impl ScanResult {
	pub fn status(&self) -> MatcherStatus {
		match self {
			ScanResult::Skipped | ScanResult::NoMatch => MatcherStatus::NoMatch,
			ScanResult::Clicked { phrase, .. } => MatcherStatus::Clicked(phrase.clone()),
		}
	}
}

/// The installed matcher: catalog, markers and cooldown ledger.
#[derive(Debug)]
pub struct ActionMatcher {
	catalog: ActionCatalog,
	markers: Vec<PanelMarker>,
	ledger: CooldownLedger,
}

impl ActionMatcher {
	pub fn new(config: &MatcherConfig) -> Self {
		Self {
			catalog: config.catalog(),
			markers: config.panel_markers.clone(),
			ledger: CooldownLedger::new(),
		}
	}

	/// True when the tree contains a panel marker, or no markers are configured.
	pub fn is_applicable(&self, tree: &DomTree) -> bool {
		self.markers.is_empty()
			|| walk(tree, tree.document())
				.into_iter()
				.any(|node| self.markers.iter().any(|m| m.matches(tree, node)))
	}

	/// Runs both passes and clicks at most one element.
	pub fn scan(&mut self, tree: &mut DomTree, now: Instant) -> ScanResult {
		let pruned = self.ledger.maybe_prune(now);
		if pruned > 0 {
			trace!(target = "autoclick.matcher", pruned, "pruned cooldown entries");
		}

		if !self.is_applicable(tree) {
			return ScanResult::Skipped;
		}

		let root = tree.document();
		for pass in [Pass::Action, Pass::Reveal] {
			for phrase in self.catalog.pass(pass) {
				let Some(candidate) = find_match(tree, root, phrase, &self.ledger, now) else {
					continue;
				};
				trace!(
					target = "autoclick.matcher",
					phrase = %phrase.text,
					%pass,
					fingerprint = %candidate.fingerprint,
					"clicking"
				);
				self.ledger.record(candidate.fingerprint, now);
				tree.click(candidate.node);
				return ScanResult::Clicked {
					phrase: phrase.text.clone(),
					node: candidate.node,
				};
			}
		}
		ScanResult::NoMatch
	}

	pub fn catalog(&self) -> &ActionCatalog {
		&self.catalog
	}

	pub fn ledger(&self) -> &CooldownLedger {
		&self.ledger
	}
}

/// One remote execution context: its document, and the matcher state
/// scoped to it.
#[derive(Debug)]
pub struct ExecutionContext {
	tree: Option<DomTree>,
	matcher: Option<ActionMatcher>,
	throttle: ScanThrottle,
}

impl ExecutionContext {
	pub fn new(tree: DomTree) -> Self {
		Self {
			tree: Some(tree),
			matcher: None,
			throttle: ScanThrottle::default(),
		}
	}

	/// A context with no document, such as a worker.
	pub fn without_document() -> Self {
		Self {
			tree: None,
			matcher: None,
			throttle: ScanThrottle::default(),
		}
	}

	/// Installs the matcher and runs the initial scan.
	///
	/// A second call in the same context returns
	/// [`MatcherStatus::AlreadyActive`] without scanning.
	pub fn inject(&mut self, config: &MatcherConfig, now: Instant) -> MatcherStatus {
		let Some(tree) = self.tree.as_mut() else {
			return MatcherStatus::NotApplicable;
		};
		if self.matcher.is_some() {
			return MatcherStatus::AlreadyActive;
		}
		let matcher = self.matcher.insert(ActionMatcher::new(config));
		matcher.scan(tree, now);
		MatcherStatus::ObserverInstalled
	}

	/// Applies a tree change and, when installed, schedules a throttled scan.
	pub fn mutate(&mut self, now: Instant, change: impl FnOnce(&mut DomTree)) {
		let Some(tree) = self.tree.as_mut() else {
			return;
		};
		change(tree);
		if self.matcher.is_some() {
			self.throttle.notify(now);
		}
	}

	/// Runs the scheduled scan when it is due.
	pub fn tick(&mut self, now: Instant) -> Option<ScanResult> {
		if !self.throttle.take_due(now) {
			return None;
		}
		self.scan_now(now)
	}

	/// Scans immediately, bypassing the throttle. `None` when not installed.
	pub fn scan_now(&mut self, now: Instant) -> Option<ScanResult> {
		let tree = self.tree.as_mut()?;
		let matcher = self.matcher.as_mut()?;
		Some(matcher.scan(tree, now))
	}

	/// Replaces the document, discarding all context-scoped state.
	pub fn navigate(&mut self, tree: DomTree) {
		*self = Self::new(tree);
	}

	pub fn is_installed(&self) -> bool {
		self.matcher.is_some()
	}

	pub fn next_scan(&self) -> Option<Instant> {
		self.throttle.due()
	}

	pub fn tree(&self) -> Option<&DomTree> {
		self.tree.as_ref()
	}

	pub fn matcher(&self) -> Option<&ActionMatcher> {
		self.matcher.as_ref()
	}

	/// Clicks recorded in the document, oldest first.
	pub fn clicks(&self) -> &[NodeId] {
		self.tree.as_ref().map(DomTree::clicks).unwrap_or_default()
	}
}
