//! The Action Matcher.
//!
//! The matcher is installed once per execution context. Every scan checks
//! that the context shows an agent panel, then walks the document (shadow
//! roots included) looking for the first phrase of the [`ActionCatalog`]
//! with a clickable, enabled, non-cooling element, and clicks it.
//!
//! Scans run once on install and then at most every 100ms while the tree
//! keeps changing.
//!
//! This module is a model of that algorithm over [`DomTree`], with explicit
//! time. [`render_payload`] produces the JavaScript that runs the same
//! algorithm inside a live context.


mod catalog;
mod context;
mod cooldown;
mod dom;
mod markers;
mod payload;
mod search;
mod text;
mod throttle;

pub use catalog::{
	ACTION_COOLDOWN, ActionCatalog, BUILTIN_ACTIONS, BUILTIN_REVEALS, MatcherConfig, Origin, Pass, Phrase, REVEAL_COOLDOWN,
};
pub use context::{ActionMatcher, ExecutionContext, ScanResult};
pub use cooldown::{CooldownLedger, fingerprint};
pub use dom::{DomTree, ElementMut, NodeId};
pub use markers::{DEFAULT_PANEL_MARKERS, PanelMarker};
pub use payload::{STATE_KEY, render_payload};
pub use search::{ALLOW_KEYWORDS, Candidate, find_match, is_button_like, is_rejected, resolve_clickable, walk};
pub use text::{MAX_TEXT_LEN, normalize, text_matches};
pub use throttle::{SCAN_THROTTLE, ScanThrottle};
