//! Element search for a single phrase.

use std::time::Instant;

use super::catalog::{Pass, Phrase};
use super::cooldown::{CooldownLedger, fingerprint};
use super::dom::{DomTree, NodeId};
use super::text::{normalize, text_matches};

/// Keywords that make `data-testid` / `data-action` a direct hit.
pub const ALLOW_KEYWORDS: &[&str] = &["allow", "accept", "approve"];

/// Class fragments marking an element as clickable.
pub(crate) const INTERACTIVE_CLASS_HINTS: &[&str] = &["btn", "button", "clickable"];

/// Class fragments marking a busy indicator.
pub(crate) const SPINNER_CLASS_HINTS: &[&str] = &["spinner", "loading", "animate-spin"];

/// A clickable element chosen for a phrase.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
	pub node: NodeId,
	pub fingerprint: String,
}

/// Elements below `root` in document order, shadow trees included.
///
/// A host's light children come before its shadow content.
pub fn walk(tree: &DomTree, root: NodeId) -> Vec<NodeId> {
	let mut order = Vec::new();
	let mut stack = vec![root];
	while let Some(node) = stack.pop() {
		if tree.is_element(node) {
			order.push(node);
		}
		if let Some(shadow) = tree.shadow_root(node) {
			stack.push(shadow);
		}
		stack.extend(tree.children(node).iter().rev());
	}
	order
}

pub fn is_button_like(tree: &DomTree, node: NodeId) -> bool {
	let Some(tag) = tree.tag(node) else {
		return false;
	};
	if tree.attr(node, "role") == Some("button") || matches!(tag, "button" | "a" | "summary") {
		return true;
	}
	if tag == "input"
		&& matches!(
			tree.attr(node, "type").map(str::to_ascii_lowercase).as_deref(),
			Some("button" | "submit")
		) {
		return true;
	}
	if tree
		.classes(node)
		.any(|c| INTERACTIVE_CLASS_HINTS.iter().any(|hint| c.to_ascii_lowercase().contains(hint)))
	{
		return true;
	}
	if tree.has_click_handler(node) || tree.has_attr(node, "onclick") {
		return true;
	}
	tree.attr(node, "tabindex")
		.and_then(|t| t.trim().parse::<i32>().ok())
		.is_some_and(|t| t >= 0)
}

/// Nearest button-like ancestor-or-self within the node's structural root.
pub fn resolve_clickable(tree: &DomTree, node: NodeId) -> Option<NodeId> {
	let mut current = Some(node);
	while let Some(id) = current {
		if !tree.is_element(id) {
			return None;
		}
		if is_button_like(tree, id) {
			return Some(id);
		}
		current = tree.parent(id);
	}
	None
}

fn is_spinner(tree: &DomTree, node: NodeId) -> bool {
	tree.attr(node, "role") == Some("progressbar")
		|| tree.classes(node).any(|c| {
			let c = c.to_ascii_lowercase();
			SPINNER_CLASS_HINTS.iter().any(|hint| c.contains(hint))
		})
}

/// Disabled, busy or loading elements must not be clicked.
pub fn is_rejected(tree: &DomTree, node: NodeId) -> bool {
	if tree.has_attr(node, "disabled") || tree.attr(node, "aria-disabled") == Some("true") {
		return true;
	}
	if tree.has_class(node, "loading") {
		return true;
	}
	walk(tree, node).into_iter().skip(1).any(|d| is_spinner(tree, d))
}

/// True when a single element child carries all of `node`'s text, in which
/// case the child is the better hit and will be visited next.
fn delegates_text(tree: &DomTree, node: NodeId, text: &str) -> bool {
	tree.children(node)
		.iter()
		.any(|child| tree.is_element(*child) && normalize(&tree.text_content(*child)) == text)
}

fn is_priority_target(tree: &DomTree, node: NodeId) -> bool {
	let keyed = ["data-testid", "data-action"].iter().any(|attr| {
		tree.attr(node, attr).is_some_and(|v| {
			let v = v.to_ascii_lowercase();
			ALLOW_KEYWORDS.iter().any(|k| v.contains(k))
		})
	});
	keyed && is_button_like(tree, node)
}

/// Searches `root` for an element answering to `phrase`.
///
/// A rejected hit ends the search. A hit still cooling down is skipped in
/// favour of later elements.
pub fn find_match(
	tree: &DomTree,
	root: NodeId,
	phrase: &Phrase,
	ledger: &CooldownLedger,
	now: Instant,
) -> Option<Candidate> {
	for node in walk(tree, root) {
		let target = if phrase.pass == Pass::Action && is_priority_target(tree, node) {
			node
		} else {
			let text = normalize(&tree.text_content(node));
			if !text_matches(&text, &phrase.text, phrase.pass) || delegates_text(tree, node, &text) {
				continue;
			}
			match (resolve_clickable(tree, node), phrase.pass) {
				(Some(clickable), _) => clickable,
				(None, Pass::Reveal) => node,
				(None, Pass::Action) => continue,
			}
		};

		if is_rejected(tree, target) {
			return None;
		}
		let fingerprint = fingerprint(tree, target);
		if ledger.is_cooling(&fingerprint, now, phrase.pass.cooldown()) {
			continue;
		}
		return Some(Candidate {
			node: target,
			fingerprint,
		});
	}
	None
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::matcher::catalog::Origin;

	fn phrase(text: &str, pass: Pass) -> Phrase {
		Phrase {
			text: text.into(),
			pass,
			origin: Origin::BuiltIn,
		}
	}

	#[test]
	fn walk_enters_shadow_roots_after_light_children() {
		let mut tree = DomTree::new();
		let doc = tree.document();
		let host = tree.append(doc, "panel-host").id();
		let light = tree.append(host, "span").id();
		let shadow = tree.attach_shadow(host);
		let inner = tree.append(shadow, "button").id();
		let after = tree.append(doc, "footer").id();

		assert_eq!(walk(&tree, doc), [host, light, inner, after]);
	}

	#[test]
	fn button_like_forms() {
		let mut tree = DomTree::new();
		let doc = tree.document();
		let mut cases = Vec::new();
		cases.push((tree.append(doc, "button").id(), true));
		cases.push((tree.append(doc, "a").id(), true));
		cases.push((tree.append(doc, "summary").id(), true));
		cases.push((tree.append(doc, "div").attr("role", "button").id(), true));
		cases.push((tree.append(doc, "input").attr("type", "submit").id(), true));
		cases.push((tree.append(doc, "input").attr("type", "text").id(), false));
		cases.push((tree.append(doc, "div").class("action-btn").id(), true));
		cases.push((tree.append(doc, "div").class("Clickable-row").id(), true));
		cases.push((tree.append(doc, "div").on_click().id(), true));
		cases.push((tree.append(doc, "div").attr("onclick", "go()").id(), true));
		cases.push((tree.append(doc, "div").attr("tabindex", "0").id(), true));
		cases.push((tree.append(doc, "div").attr("tabindex", "-1").id(), false));
		cases.push((tree.append(doc, "span").id(), false));
		for (node, expected) in cases {
			assert_eq!(is_button_like(&tree, node), expected, "{:?}", tree.tag(node));
		}
	}

	#[test]
	fn resolution_stops_at_shadow_boundary() {
		let mut tree = DomTree::new();
		let doc = tree.document();
		let host = tree.append(doc, "button").id();
		let shadow = tree.attach_shadow(host);
		let label = tree.append(shadow, "span").text("Expand").id();

		assert_eq!(resolve_clickable(&tree, label), None);

		let inner = tree.append(shadow, "div").attr("role", "button").id();
		let nested = tree.append(inner, "span").text("Run").id();
		assert_eq!(resolve_clickable(&tree, nested), Some(inner));
	}

	#[test]
	fn rejected_states() {
		let mut tree = DomTree::new();
		let doc = tree.document();
		let disabled = tree.append(doc, "button").attr("disabled", "").id();
		let aria = tree.append(doc, "button").attr("aria-disabled", "true").id();
		let aria_false = tree.append(doc, "button").attr("aria-disabled", "false").id();
		let loading = tree.append(doc, "button").class("loading").id();
		let spinning = tree.append(doc, "button").id();
		tree.append(spinning, "svg").class("animate-spin");
		let progress = tree.append(doc, "button").id();
		tree.append(progress, "div").attr("role", "progressbar");

		for node in [disabled, aria, loading, spinning, progress] {
			assert!(is_rejected(&tree, node), "{node} should be rejected");
		}
		assert!(!is_rejected(&tree, aria_false));
	}

	#[test]
	fn priority_attribute_bypasses_text() {
		let mut tree = DomTree::new();
		let doc = tree.document();
		let button = tree
			.append(doc, "button")
			.attr("data-testid", "tool-approve-btn")
			.text("✓")
			.id();
		let ledger = CooldownLedger::new();
		let now = Instant::now();

		let hit = find_match(&tree, doc, &phrase("run", Pass::Action), &ledger, now).unwrap();
		assert_eq!(hit.node, button);
		assert!(find_match(&tree, doc, &phrase("expand", Pass::Reveal), &ledger, now).is_none());
	}

	#[test]
	fn priority_attribute_requires_button_like_element() {
		let mut tree = DomTree::new();
		let doc = tree.document();
		tree.append(doc, "div").attr("data-action", "allow");
		let ledger = CooldownLedger::new();
		assert!(find_match(&tree, doc, &phrase("run", Pass::Action), &ledger, Instant::now()).is_none());
	}

	#[test]
	fn action_skips_non_clickable_text_and_reveal_accepts_it() {
		let mut tree = DomTree::new();
		let doc = tree.document();
		let label = tree.append(doc, "span").text("Continue").id();
		let ledger = CooldownLedger::new();
		let now = Instant::now();

		assert!(find_match(&tree, doc, &phrase("continue", Pass::Action), &ledger, now).is_none());

		tree.detach(label);
		let header = tree.append(doc, "div").text("Expand").id();
		let hit = find_match(&tree, doc, &phrase("expand", Pass::Reveal), &ledger, now).unwrap();
		assert_eq!(hit.node, header);
	}

	#[test]
	fn innermost_text_owner_is_preferred() {
		let mut tree = DomTree::new();
		let doc = tree.document();
		let wrapper = tree.append(doc, "div").id();
		let row = tree.append(wrapper, "div").id();
		let label = tree.append(row, "span").text(" Expand ").id();
		let ledger = CooldownLedger::new();

		let hit = find_match(&tree, doc, &phrase("expand", Pass::Reveal), &ledger, Instant::now()).unwrap();
		assert_eq!(hit.node, label);
	}

	#[test]
	fn cooling_hit_yields_to_next_element() {
		let mut tree = DomTree::new();
		let doc = tree.document();
		let first = tree.append(doc, "button").text("Run").id();
		let second = tree.append(doc, "button").text("Run").id();
		let now = Instant::now();
		let mut ledger = CooldownLedger::new();
		ledger.record(fingerprint(&tree, first), now);

		let hit = find_match(&tree, doc, &phrase("run", Pass::Action), &ledger, now).unwrap();
		assert_eq!(hit.node, second);
	}
}
