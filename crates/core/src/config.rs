//! Session manager settings.

use std::time::Duration;

use autoclick_runtime::DEFAULT_REQUEST_TIMEOUT;

use crate::error::{Error, Result};
use crate::matcher::MatcherConfig;
use crate::target::TargetFilter;

/// Port most Chromium hosts expose remote debugging on.
pub const DEFAULT_PORT: u16 = 9222;
/// Legacy port tried last.
pub const DEFAULT_FALLBACK_PORT: u16 = 9000;
pub const DEFAULT_RECONNECT_DELAY: Duration = Duration::from_secs(3);
pub const DEFAULT_HEARTBEAT_INTERVAL: Duration = Duration::from_secs(30);
/// Delay between `Runtime.executionContextsCleared` and re-injection.
pub const DEFAULT_SETTLE_DELAY: Duration = Duration::from_millis(750);
/// Per-host timeout for the `/json/version` probe.
pub const DEFAULT_PROBE_TIMEOUT: Duration = Duration::from_millis(400);

/// Everything the [`SessionManager`](crate::SessionManager) needs to run.
#[derive(Debug, Clone)]
pub struct ManagerConfig {
	pub port: u16,
	pub fallback_port: u16,
	pub request_timeout: Duration,
	pub reconnect_delay: Duration,
	pub heartbeat_interval: Duration,
	pub settle_delay: Duration,
	pub probe_timeout: Duration,
	pub targets: TargetFilter,
	pub matcher: MatcherConfig,
}

impl Default for ManagerConfig {
	fn default() -> Self {
		Self {
			port: DEFAULT_PORT,
			fallback_port: DEFAULT_FALLBACK_PORT,
			request_timeout: DEFAULT_REQUEST_TIMEOUT,
			reconnect_delay: DEFAULT_RECONNECT_DELAY,
			heartbeat_interval: DEFAULT_HEARTBEAT_INTERVAL,
			settle_delay: DEFAULT_SETTLE_DELAY,
			probe_timeout: DEFAULT_PROBE_TIMEOUT,
			targets: TargetFilter::default(),
			matcher: MatcherConfig::default(),
		}
	}
}

impl ManagerConfig {
	pub fn with_port(mut self, port: u16) -> Self {
		self.port = port;
		self
	}

	pub fn with_fallback_port(mut self, port: u16) -> Self {
		self.fallback_port = port;
		self
	}

	pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
		self.request_timeout = timeout;
		self
	}

	pub fn with_reconnect_delay(mut self, delay: Duration) -> Self {
		self.reconnect_delay = delay;
		self
	}

	pub fn with_heartbeat_interval(mut self, interval: Duration) -> Self {
		self.heartbeat_interval = interval;
		self
	}

	pub fn with_settle_delay(mut self, delay: Duration) -> Self {
		self.settle_delay = delay;
		self
	}

	pub fn with_targets(mut self, targets: TargetFilter) -> Self {
		self.targets = targets;
		self
	}

	pub fn with_matcher(mut self, matcher: MatcherConfig) -> Self {
		self.matcher = matcher;
		self
	}

	/// Every period except the settle delay must be non-zero.
	pub fn validate(&self) -> Result<()> {
		let periods = [
			("request_timeout", self.request_timeout),
			("reconnect_delay", self.reconnect_delay),
			("heartbeat_interval", self.heartbeat_interval),
			("probe_timeout", self.probe_timeout),
		];
		match periods.into_iter().find(|(_, value)| value.is_zero()) {
			Some((field, _)) => Err(Error::InvalidConfig {
				field,
				reason: "must be greater than zero",
			}),
			None => Ok(()),
		}
	}
}
