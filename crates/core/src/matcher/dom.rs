//! Arena document tree the matcher model operates on.
//!
//! Mirrors the parts of a rendered DOM the matcher cares about: element tags
//! and attributes, light-DOM text, open shadow roots and click handlers.
//! Nodes are never freed; [`DomTree::detach`] only unlinks them.

use std::fmt;

/// Index of a node inside its [`DomTree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl fmt::Display for NodeId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "#{}", self.0)
	}
}

#[derive(Debug, Clone)]
enum NodeKind {
	Document,
	ShadowRoot { host: NodeId },
	Element(Element),
	Text(String),
}

#[derive(Debug, Clone)]
struct Element {
	tag: String,
	attrs: Vec<(String, String)>,
	click_handler: bool,
	shadow_root: Option<NodeId>,
}

#[derive(Debug, Clone)]
struct Node {
	kind: NodeKind,
	parent: Option<NodeId>,
	children: Vec<NodeId>,
}

#[derive(Debug, Clone)]
pub struct DomTree {
	nodes: Vec<Node>,
	clicks: Vec<NodeId>,
}

impl Default for DomTree {
	fn default() -> Self {
		Self::new()
	}
}

impl DomTree {
	/// Creates a tree holding only the document node.
	pub fn new() -> Self {
		Self {
			nodes: vec![Node {
				kind: NodeKind::Document,
				parent: None,
				children: Vec::new(),
			}],
			clicks: Vec::new(),
		}
	}

	pub fn document(&self) -> NodeId {
		NodeId(0)
	}

	fn push(&mut self, kind: NodeKind, parent: Option<NodeId>) -> NodeId {
		let id = NodeId(self.nodes.len());
		self.nodes.push(Node {
			kind,
			parent,
			children: Vec::new(),
		});
		if let Some(parent) = parent {
			self.nodes[parent.0].children.push(id);
		}
		id
	}

	/// Appends an element with `tag` under `parent`.
	pub fn append(&mut self, parent: NodeId, tag: &str) -> ElementMut<'_> {
		let id = self.push(
			NodeKind::Element(Element {
				tag: tag.to_ascii_lowercase(),
				attrs: Vec::new(),
				click_handler: false,
				shadow_root: None,
			}),
			Some(parent),
		);
		ElementMut { tree: self, id }
	}

	/// Appends a text node under `parent`.
	pub fn append_text(&mut self, parent: NodeId, text: &str) -> NodeId {
		self.push(NodeKind::Text(text.to_string()), Some(parent))
	}

	/// Attaches an open shadow root to `host`, returning the existing one if present.
	pub fn attach_shadow(&mut self, host: NodeId) -> NodeId {
		if let Some(root) = self.shadow_root(host) {
			return root;
		}
		let root = self.push(NodeKind::ShadowRoot { host }, None);
		if let NodeKind::Element(element) = &mut self.nodes[host.0].kind {
			element.shadow_root = Some(root);
		}
		root
	}

	/// Unlinks `node` from its parent. The subtree stays allocated but unreachable.
	pub fn detach(&mut self, node: NodeId) {
		if let Some(parent) = self.nodes[node.0].parent.take() {
			self.nodes[parent.0].children.retain(|c| *c != node);
		}
	}

	/// Sets or replaces an attribute.
	pub fn set_attr(&mut self, node: NodeId, name: &str, value: &str) {
		if let Some(element) = self.element_mut(node) {
			match element.attrs.iter_mut().find(|(n, _)| n == name) {
				Some((_, v)) => *v = value.to_string(),
				None => element.attrs.push((name.to_string(), value.to_string())),
			}
		}
	}

	pub fn remove_attr(&mut self, node: NodeId, name: &str) {
		if let Some(element) = self.element_mut(node) {
			element.attrs.retain(|(n, _)| n != name);
		}
	}

	fn element(&self, node: NodeId) -> Option<&Element> {
		match &self.nodes[node.0].kind {
			NodeKind::Element(element) => Some(element),
			_ => None,
		}
	}

	fn element_mut(&mut self, node: NodeId) -> Option<&mut Element> {
		match &mut self.nodes[node.0].kind {
			NodeKind::Element(element) => Some(element),
			_ => None,
		}
	}

	pub fn is_element(&self, node: NodeId) -> bool {
		self.element(node).is_some()
	}

	/// Lowercase tag name; `None` for non-elements.
	pub fn tag(&self, node: NodeId) -> Option<&str> {
		self.element(node).map(|e| e.tag.as_str())
	}

	pub fn attr(&self, node: NodeId, name: &str) -> Option<&str> {
		self.element(node)?
			.attrs
			.iter()
			.find(|(n, _)| n == name)
			.map(|(_, v)| v.as_str())
	}

	pub fn has_attr(&self, node: NodeId, name: &str) -> bool {
		self.attr(node, name).is_some()
	}

	/// Whitespace-separated tokens of the `class` attribute.
	pub fn classes(&self, node: NodeId) -> impl Iterator<Item = &str> {
		self.attr(node, "class").unwrap_or_default().split_whitespace()
	}

	pub fn has_class(&self, node: NodeId, class: &str) -> bool {
		self.classes(node).any(|c| c == class)
	}

	/// True when a listener was registered through [`ElementMut::on_click`].
	pub fn has_click_handler(&self, node: NodeId) -> bool {
		self.element(node).is_some_and(|e| e.click_handler)
	}

	/// Parent inside the same structural root; `None` at a document or shadow root.
	pub fn parent(&self, node: NodeId) -> Option<NodeId> {
		self.nodes[node.0].parent
	}

	/// Host element of a shadow root.
	pub fn host(&self, node: NodeId) -> Option<NodeId> {
		match self.nodes[node.0].kind {
			NodeKind::ShadowRoot { host } => Some(host),
			_ => None,
		}
	}

	pub fn children(&self, node: NodeId) -> &[NodeId] {
		&self.nodes[node.0].children
	}

	pub fn shadow_root(&self, node: NodeId) -> Option<NodeId> {
		self.element(node).and_then(|e| e.shadow_root)
	}

	/// Position of `node` among its parent's element children.
	pub fn sibling_index(&self, node: NodeId) -> usize {
		let Some(parent) = self.parent(node) else {
			return 0;
		};
		self.children(parent)
			.iter()
			.filter(|c| self.is_element(**c))
			.position(|c| *c == node)
			.unwrap_or(0)
	}

	/// Concatenated light-DOM text below `node`, shadow content excluded.
	pub fn text_content(&self, node: NodeId) -> String {
		let mut out = String::new();
		let mut stack = vec![node];
		while let Some(current) = stack.pop() {
			match &self.nodes[current.0].kind {
				NodeKind::Text(text) => out.push_str(text),
				_ => stack.extend(self.children(current).iter().rev()),
			}
		}
		out
	}

	/// Records a click on `node`.
	pub fn click(&mut self, node: NodeId) {
		self.clicks.push(node);
	}

	/// Every click so far, oldest first.
	pub fn clicks(&self) -> &[NodeId] {
		&self.clicks
	}
}

/// Builder handle returned by [`DomTree::append`].
pub struct ElementMut<'a> {
	tree: &'a mut DomTree,
	id: NodeId,
}

impl ElementMut<'_> {
	pub fn attr(self, name: &str, value: &str) -> Self {
		self.tree.set_attr(self.id, name, value);
		self
	}

	/// Adds `class` to the class list.
	pub fn class(self, class: &str) -> Self {
		let joined = match self.tree.attr(self.id, "class") {
			Some(existing) if !existing.is_empty() => format!("{existing} {class}"),
			_ => class.to_string(),
		};
		self.tree.set_attr(self.id, "class", &joined);
		self
	}

	/// Appends a text child.
	pub fn text(self, text: &str) -> Self {
		self.tree.append_text(self.id, text);
		self
	}

	pub fn on_click(self) -> Self {
		if let Some(element) = self.tree.element_mut(self.id) {
			element.click_handler = true;
		}
		self
	}

	pub fn id(&self) -> NodeId {
		self.id
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn text_content_skips_shadow_content() {
		let mut tree = DomTree::new();
		let doc = tree.document();
		let host = tree.append(doc, "div").text("outer ").id();
		tree.append(host, "span").text("inner");
		let shadow = tree.attach_shadow(host);
		tree.append(shadow, "button").text("hidden");

		assert_eq!(tree.text_content(host), "outer inner");
		assert_eq!(tree.text_content(shadow), "hidden");
		assert_eq!(tree.host(shadow), Some(host));
		assert_eq!(tree.parent(shadow), None);
	}

	#[test]
	fn sibling_index_counts_elements_only() {
		let mut tree = DomTree::new();
		let doc = tree.document();
		let list = tree.append(doc, "ul").id();
		tree.append_text(list, "  ");
		let first = tree.append(list, "li").id();
		tree.append_text(list, "  ");
		let second = tree.append(list, "li").id();

		assert_eq!(tree.sibling_index(first), 0);
		assert_eq!(tree.sibling_index(second), 1);
	}

	#[test]
	fn builder_sets_attributes_and_classes() {
		let mut tree = DomTree::new();
		let doc = tree.document();
		let node = tree
			.append(doc, "DIV")
			.class("btn")
			.class("primary")
			.attr("role", "button")
			.on_click()
			.id();

		assert_eq!(tree.tag(node), Some("div"));
		assert!(tree.has_class(node, "btn"));
		assert!(tree.has_class(node, "primary"));
		assert_eq!(tree.attr(node, "role"), Some("button"));
		assert!(tree.has_click_handler(node));

		tree.set_attr(node, "role", "link");
		tree.remove_attr(node, "class");
		assert_eq!(tree.attr(node, "role"), Some("link"));
		assert_eq!(tree.classes(node).count(), 0);
	}

	#[test]
	fn detach_unlinks_subtree() {
		let mut tree = DomTree::new();
		let doc = tree.document();
		let node = tree.append(doc, "button").text("Run").id();
		tree.detach(node);
		assert!(tree.children(doc).is_empty());
		assert_eq!(tree.parent(node), None);
	}
}
