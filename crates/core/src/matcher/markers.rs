//! Panel markers gating where the matcher is allowed to act.

use std::fmt;
use std::str::FromStr;

use super::dom::{DomTree, NodeId};
use crate::error::Error;

/// Selectors identifying the agent panel in stock hosts.
pub const DEFAULT_PANEL_MARKERS: &[&str] = &["#cascade", ".interactive-session", ".chat-widget", "[data-agent-panel]"];

/// A single-part CSS selector: `#id`, `.class`, `[attr]` or `[attr="value"]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PanelMarker {
	Id(String),
	Class(String),
	Attribute { name: String, value: Option<String> },
}

impl PanelMarker {
	pub fn matches(&self, tree: &DomTree, node: NodeId) -> bool {
		match self {
			PanelMarker::Id(id) => tree.attr(node, "id") == Some(id.as_str()),
			PanelMarker::Class(class) => tree.has_class(node, class),
			PanelMarker::Attribute { name, value: None } => tree.has_attr(node, name),
			PanelMarker::Attribute {
				name,
				value: Some(value),
			} => tree.attr(node, name) == Some(value.as_str()),
		}
	}
}

/// A CSS identifier restricted to ASCII: a letter or `_` first, or `-`
/// followed by anything but a digit.
fn is_ident(s: &str) -> bool {
	let mut chars = s.chars();
	let starts_well = match chars.next() {
		Some(c) if c.is_ascii_alphabetic() || c == '_' => true,
		Some('-') => matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_' || c == '-'),
		_ => false,
	};
	starts_well
		&& s
			.chars()
			.all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

/// Attribute values are always rendered double-quoted, so they cannot
/// carry quotes, backslashes or control characters.
fn is_plain_value(s: &str) -> bool {
	!s.chars().any(|c| c == '"' || c == '\'' || c == '\\' || c.is_control())
}

impl FromStr for PanelMarker {
	type Err = Error;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		let s = s.trim();
		let invalid = || Error::Marker(s.to_string());

		if let Some(id) = s.strip_prefix('#') {
			return is_ident(id).then(|| PanelMarker::Id(id.to_string())).ok_or_else(invalid);
		}
		if let Some(class) = s.strip_prefix('.') {
			return is_ident(class)
				.then(|| PanelMarker::Class(class.to_string()))
				.ok_or_else(invalid);
		}

		let inner = s
			.strip_prefix('[')
			.and_then(|rest| rest.strip_suffix(']'))
			.ok_or_else(invalid)?;
		let (name, value) = match inner.split_once('=') {
			Some((name, raw)) => {
				let raw = raw.trim();
				let unquoted = raw
					.strip_prefix('"')
					.and_then(|v| v.strip_suffix('"'))
					.or_else(|| raw.strip_prefix('\'').and_then(|v| v.strip_suffix('\'')))
					.unwrap_or(raw);
				if !is_plain_value(unquoted) {
					return Err(invalid());
				}
				(name.trim(), Some(unquoted.to_string()))
			}
			None => (inner.trim(), None),
		};
		if !is_ident(name) {
			return Err(invalid());
		}
		Ok(PanelMarker::Attribute {
			name: name.to_string(),
			value,
		})
	}
}

impl fmt::Display for PanelMarker {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			PanelMarker::Id(id) => write!(f, "#{id}"),
			PanelMarker::Class(class) => write!(f, ".{class}"),
			PanelMarker::Attribute { name, value: None } => write!(f, "[{name}]"),
			PanelMarker::Attribute {
				name,
				value: Some(value),
			} => write!(f, "[{name}=\"{value}\"]"),
		}
	}
}
