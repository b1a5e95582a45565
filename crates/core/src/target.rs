//! Target eligibility.

use autoclick_protocol::TargetInfo;

use crate::error::Result;

/// Target types worth injecting into by default.
pub const DEFAULT_TARGET_KINDS: &[&str] = &["page", "iframe", "webview"];

/// URLs never injected into by default: browser chrome and extensions.
pub const DEFAULT_EXCLUDED_URLS: &[&str] = &["devtools://*", "chrome-extension://*", "chrome://*"];

/// Decides which discovered targets get a session.
#[derive(Debug, Clone)]
pub struct TargetFilter {
	kinds: Vec<String>,
	exclude_urls: Vec<glob::Pattern>,
}

impl Default for TargetFilter {
	fn default() -> Self {
		Self {
			kinds: DEFAULT_TARGET_KINDS.iter().map(|k| k.to_string()).collect(),
			exclude_urls: DEFAULT_EXCLUDED_URLS
				.iter()
				.filter_map(|p| glob::Pattern::new(p).ok())
				.collect(),
		}
	}
}

impl TargetFilter {
	/// Builds a filter from target kinds and glob URL exclusions.
	///
	/// Fails on the first pattern that does not compile.
	pub fn from_patterns<K, P>(kinds: K, exclude_urls: P) -> Result<Self>
	where
		K: IntoIterator,
		K::Item: Into<String>,
		P: IntoIterator,
		P::Item: AsRef<str>,
	{
		let exclude_urls = exclude_urls
			.into_iter()
			.map(|p| glob::Pattern::new(p.as_ref()))
			.collect::<std::result::Result<Vec<_>, _>>()?;
		Ok(Self {
			kinds: kinds.into_iter().map(Into::into).collect(),
			exclude_urls,
		})
	}

	/// Exclusion patterns as their source strings.
	pub fn exclude_patterns(&self) -> impl Iterator<Item = &str> {
		self.exclude_urls.iter().map(glob::Pattern::as_str)
	}

	/// True when `target` has an accepted type and an URL not excluded.
	pub fn is_eligible(&self, target: &TargetInfo) -> bool {
		self.kinds.iter().any(|k| *k == target.kind) && !self.exclude_urls.iter().any(|p| p.matches(&target.url))
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn target(kind: &str, url: &str) -> TargetInfo {
		TargetInfo {
			target_id: "T".into(),
			kind: kind.into(),
			title: String::new(),
			url: url.into(),
			attached: false,
		}
	}

	#[test]
	fn default_filter_accepts_rendering_targets() {
		let filter = TargetFilter::default();
		assert!(filter.is_eligible(&target("page", "vscode-file://vscode-app/workbench.html")));
		assert!(filter.is_eligible(&target("iframe", "https://example.com/")));
		assert!(filter.is_eligible(&target("webview", "")));
	}

	#[test]
	fn default_filter_rejects_workers_and_devtools() {
		let filter = TargetFilter::default();
		assert!(!filter.is_eligible(&target("service_worker", "https://example.com/sw.js")));
		assert!(!filter.is_eligible(&target("browser", "")));
		assert!(!filter.is_eligible(&target("page", "devtools://devtools/bundled/inspector.html")));
		assert!(!filter.is_eligible(&target("page", "chrome-extension://abc/popup.html")));
	}

	#[test]
	fn custom_patterns_are_applied() {
		let filter = TargetFilter::from_patterns(["page"], ["https://*.internal/*"]).unwrap();
		assert!(!filter.is_eligible(&target("page", "https://build.internal/status")));
		assert!(filter.is_eligible(&target("page", "https://example.com/")));
		assert!(!filter.is_eligible(&target("iframe", "https://example.com/")));
		assert_eq!(filter.exclude_patterns().collect::<Vec<_>>(), ["https://*.internal/*"]);
	}

	#[test]
	fn invalid_pattern_is_an_error() {
		assert!(TargetFilter::from_patterns(["page"], ["[unclosed"]).is_err());
	}
}
