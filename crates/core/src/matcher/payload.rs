//! The injected program: a self-contained expression evaluated in each
//! remote context.
//!
//! The script template lives in `payload.js`; its configuration object is
//! rendered from the same constants the Rust model uses. Evaluating the
//! expression yields one of the status strings understood by
//! [`MatcherStatus`](autoclick_protocol::MatcherStatus).

use serde::Serialize;

use super::catalog::{ACTION_COOLDOWN, MatcherConfig, Pass, REVEAL_COOLDOWN};
use super::cooldown::{FINGERPRINT_DEPTH, FINGERPRINT_TEXT_LEN, PRUNE_INTERVAL, PRUNE_MAX_AGE};
use super::search::{ALLOW_KEYWORDS, INTERACTIVE_CLASS_HINTS, SPINNER_CLASS_HINTS};
use super::text::{MAX_TEXT_LEN, MIN_FUZZY_PHRASE_LEN, PREFIX_RATIO, WORD_RATIO};
use super::throttle::SCAN_THROTTLE;

const TEMPLATE: &str = include_str!("payload.js");
const CONFIG_PLACEHOLDER: &str = "__AUTOCLICK_CONFIG__";

/// Registry key of the context-scoped state object (`Symbol.for`).
pub const STATE_KEY: &str = "autoclick.matcher.state";

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct PayloadConfig<'a> {
	state_key: &'static str,
	actions: Vec<&'a str>,
	reveals: Vec<&'a str>,
	markers: Vec<String>,
	max_text_len: usize,
	min_fuzzy_phrase_len: usize,
	prefix_ratio: usize,
	word_ratio: usize,
	allow_keywords: &'static [&'static str],
	interactive_class_hints: &'static [&'static str],
	spinner_class_hints: &'static [&'static str],
	action_cooldown_ms: u64,
	reveal_cooldown_ms: u64,
	prune_interval_ms: u64,
	prune_max_age_ms: u64,
	throttle_ms: u64,
	fingerprint_depth: usize,
	fingerprint_text_len: usize,
}

/// Renders the injection expression for `config`.
pub fn render_payload(config: &MatcherConfig) -> String {
	let catalog = config.catalog();
	let payload = PayloadConfig {
		state_key: STATE_KEY,
		actions: catalog.pass(Pass::Action).map(|p| p.text.as_str()).collect(),
		reveals: catalog.pass(Pass::Reveal).map(|p| p.text.as_str()).collect(),
		markers: config.panel_markers.iter().map(ToString::to_string).collect(),
		max_text_len: MAX_TEXT_LEN,
		min_fuzzy_phrase_len: MIN_FUZZY_PHRASE_LEN,
		prefix_ratio: PREFIX_RATIO,
		word_ratio: WORD_RATIO,
		allow_keywords: ALLOW_KEYWORDS,
		interactive_class_hints: INTERACTIVE_CLASS_HINTS,
		spinner_class_hints: SPINNER_CLASS_HINTS,
		action_cooldown_ms: ACTION_COOLDOWN.as_millis() as u64,
		reveal_cooldown_ms: REVEAL_COOLDOWN.as_millis() as u64,
		prune_interval_ms: PRUNE_INTERVAL.as_millis() as u64,
		prune_max_age_ms: PRUNE_MAX_AGE.as_millis() as u64,
		throttle_ms: SCAN_THROTTLE.as_millis() as u64,
		fingerprint_depth: FINGERPRINT_DEPTH,
		fingerprint_text_len: FINGERPRINT_TEXT_LEN,
	};
	// Plain strings and numbers only, so serialization cannot fail.
	let json = serde_json::to_string(&payload).unwrap_or_else(|_| "{}".to_string());
	TEMPLATE.replacen(CONFIG_PLACEHOLDER, &json, 1)
}
