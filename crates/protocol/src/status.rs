//! Status values returned by the injected matcher.
//!
//! These strings are the only thing the matcher ever reports back over the
//! control channel, so both sides agree on them through this type.

use std::fmt;
use std::str::FromStr;

const ALREADY_ACTIVE: &str = "already-active";
const OBSERVER_INSTALLED: &str = "observer-installed";
const NO_MATCH: &str = "no-match";
const NOT_APPLICABLE: &str = "not-applicable";
const CLICKED_PREFIX: &str = "clicked:";

/// Result of one matcher evaluation.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum MatcherStatus {
	/// The context already hosts an installed matcher; nothing was done.
	AlreadyActive,
	/// Fresh install; matching continues asynchronously inside the context.
	ObserverInstalled,
	/// A scan clicked the element matching this phrase.
	Clicked(String),
	/// A scan ran and found nothing to click.
	NoMatch,
	/// The context cannot host the matcher at all.
	NotApplicable,
}

impl MatcherStatus {
	/// True when the manager should keep the session it injected into.
	pub fn keeps_session(&self) -> bool {
		!matches!(self, MatcherStatus::NotApplicable)
	}
}

impl fmt::Display for MatcherStatus {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			MatcherStatus::AlreadyActive => f.write_str(ALREADY_ACTIVE),
			MatcherStatus::ObserverInstalled => f.write_str(OBSERVER_INSTALLED),
			MatcherStatus::Clicked(phrase) => write!(f, "{CLICKED_PREFIX}{phrase}"),
			MatcherStatus::NoMatch => f.write_str(NO_MATCH),
			MatcherStatus::NotApplicable => f.write_str(NOT_APPLICABLE),
		}
	}
}

/// Returned when a status string is outside the known vocabulary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseStatusError(pub String);

impl fmt::Display for ParseStatusError {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "unrecognized matcher status: {:?}", self.0)
	}
}

impl std::error::Error for ParseStatusError {}

impl FromStr for MatcherStatus {
	type Err = ParseStatusError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s {
			ALREADY_ACTIVE => Ok(MatcherStatus::AlreadyActive),
			OBSERVER_INSTALLED => Ok(MatcherStatus::ObserverInstalled),
			NO_MATCH => Ok(MatcherStatus::NoMatch),
			NOT_APPLICABLE => Ok(MatcherStatus::NotApplicable),
			other => match other.strip_prefix(CLICKED_PREFIX) {
				Some(phrase) if !phrase.is_empty() => Ok(MatcherStatus::Clicked(phrase.to_string())),
				_ => Err(ParseStatusError(other.to_string())),
			},
		}
	}
}
