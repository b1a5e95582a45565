//! Phrases the matcher looks for, and the configuration they come from.

use std::fmt;
use std::time::Duration;

use super::markers::{DEFAULT_PANEL_MARKERS, PanelMarker};
use super::text::normalize;
use crate::error::Result;

/// Built-in action phrases. Short imperative verbs come first so they win
/// over longer permission phrases when several are visible.
pub const BUILTIN_ACTIONS: &[&str] = &[
	"run",
	"accept",
	"allow",
	"approve",
	"confirm",
	"continue",
	"run command",
	"accept all",
	"allow once",
	"always allow",
	"allow this conversation",
];

/// Phrases that uncover hidden actions, tried only when no action matched.
pub const BUILTIN_REVEALS: &[&str] = &["expand", "requires input"];

/// Cooldown after clicking an action element.
pub const ACTION_COOLDOWN: Duration = Duration::from_secs(5);
/// Cooldown after clicking a reveal element.
pub const REVEAL_COOLDOWN: Duration = Duration::from_secs(8);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pass {
	/// Pass 1: elements that perform the pending action.
	Action,
	/// Pass 2: elements that expand collapsed UI.
	Reveal,
}

impl Pass {
	pub fn cooldown(self) -> Duration {
		match self {
			Pass::Action => ACTION_COOLDOWN,
			Pass::Reveal => REVEAL_COOLDOWN,
		}
	}
}

impl fmt::Display for Pass {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(match self {
			Pass::Action => "action",
			Pass::Reveal => "reveal",
		})
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Origin {
	BuiltIn,
	Custom,
}

/// One catalog entry. `text` is already normalized.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Phrase {
	pub text: String,
	pub pass: Pass,
	pub origin: Origin,
}

/// Configuration shared by the matcher model and the injected payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatcherConfig {
	/// Extra action phrases appended after the built-ins.
	pub custom_phrases: Vec<String>,
	/// The context must contain one of these to be scanned; empty means any.
	pub panel_markers: Vec<PanelMarker>,
}

impl Default for MatcherConfig {
	fn default() -> Self {
		Self {
			custom_phrases: Vec::new(),
			panel_markers: DEFAULT_PANEL_MARKERS.iter().filter_map(|m| m.parse().ok()).collect(),
		}
	}
}

impl MatcherConfig {
	/// Builds a config from raw phrase and selector strings.
	pub fn from_strings<P, M>(custom_phrases: P, panel_markers: M) -> Result<Self>
	where
		P: IntoIterator,
		P::Item: Into<String>,
		M: IntoIterator,
		M::Item: AsRef<str>,
	{
		let panel_markers = panel_markers
			.into_iter()
			.map(|m| m.as_ref().parse())
			.collect::<Result<Vec<_>>>()?;
		Ok(Self {
			custom_phrases: custom_phrases.into_iter().map(Into::into).collect(),
			panel_markers,
		})
	}

	/// Same config with every context considered applicable.
	pub fn without_markers(mut self) -> Self {
		self.panel_markers.clear();
		self
	}

	pub fn catalog(&self) -> ActionCatalog {
		ActionCatalog::new(&self.custom_phrases)
	}
}

/// Ordered phrase list for both passes.
#[derive(Debug, Clone)]
pub struct ActionCatalog {
	phrases: Vec<Phrase>,
}

impl ActionCatalog {
	/// Built-ins plus `custom` action phrases, normalized and deduplicated.
	pub fn new<S: AsRef<str>>(custom: &[S]) -> Self {
		let mut catalog = Self { phrases: Vec::new() };
		for text in BUILTIN_ACTIONS {
			catalog.push(text, Pass::Action, Origin::BuiltIn);
		}
		for text in custom {
			catalog.push(text.as_ref(), Pass::Action, Origin::Custom);
		}
		for text in BUILTIN_REVEALS {
			catalog.push(text, Pass::Reveal, Origin::BuiltIn);
		}
		catalog
	}

	fn push(&mut self, raw: &str, pass: Pass, origin: Origin) {
		let text = normalize(raw);
		if text.is_empty() || self.phrases.iter().any(|p| p.text == text) {
			return;
		}
		self.phrases.push(Phrase { text, pass, origin });
	}

	/// Phrases of `pass` in priority order.
	pub fn pass(&self, pass: Pass) -> impl Iterator<Item = &Phrase> {
		self.phrases.iter().filter(move |p| p.pass == pass)
	}

	pub fn iter(&self) -> impl Iterator<Item = &Phrase> {
		self.phrases.iter()
	}

	pub fn len(&self) -> usize {
		self.phrases.len()
	}

	pub fn is_empty(&self) -> bool {
		self.phrases.is_empty()
	}
}
