//! Text normalization and phrase matching rules.

use super::catalog::Pass;

/// Rendered text longer than this never matches.
pub const MAX_TEXT_LEN: usize = 50;
/// Phrases shorter than this only match exactly.
pub const MIN_FUZZY_PHRASE_LEN: usize = 5;
/// Plain prefix matches allow text up to this multiple of the phrase length.
pub const PREFIX_RATIO: usize = 3;
/// Word-boundary prefix and containment matches allow up to this multiple.
pub const WORD_RATIO: usize = 5;

/// Collapses whitespace runs to single spaces, trims and lowercases.
pub fn normalize(text: &str) -> String {
	text.split_whitespace()
		.collect::<Vec<_>>()
		.join(" ")
		.to_lowercase()
}

/// Whether normalized `text` counts as `phrase` for the given pass.
pub fn text_matches(text: &str, phrase: &str, pass: Pass) -> bool {
	let text_len = text.chars().count();
	if text_len == 0 || text_len > MAX_TEXT_LEN {
		return false;
	}
	if text == phrase {
		return true;
	}

	let phrase_len = phrase.chars().count();
	if phrase_len < MIN_FUZZY_PHRASE_LEN {
		return false;
	}

	if text.starts_with(phrase) && text_len <= phrase_len * PREFIX_RATIO {
		return true;
	}
	let within_word_cap = text_len <= phrase_len * WORD_RATIO;
	if within_word_cap && text.starts_with(phrase) && text[phrase.len()..].starts_with(' ') {
		return true;
	}
	pass == Pass::Reveal && within_word_cap && text.contains(phrase)
}
