//! Leading-edge coalescing of tree change notifications.

use std::time::{Duration, Instant};

/// Delay between the first change in a quiet period and the scan it triggers.
pub const SCAN_THROTTLE: Duration = Duration::from_millis(100);

/// At most one scheduled scan at a time; notifications while one is pending
/// are folded into it.
#[derive(Debug, Clone)]
pub struct ScanThrottle {
	delay: Duration,
	scheduled: Option<Instant>,
}

impl Default for ScanThrottle {
	fn default() -> Self {
		Self::new(SCAN_THROTTLE)
	}
}

impl ScanThrottle {
	pub fn new(delay: Duration) -> Self {
		Self { delay, scheduled: None }
	}

	/// Registers a change. Returns true when this call scheduled a new scan.
	pub fn notify(&mut self, now: Instant) -> bool {
		if self.scheduled.is_some() {
			return false;
		}
		self.scheduled = Some(now + self.delay);
		true
	}

	/// When the pending scan fires, if any.
	pub fn due(&self) -> Option<Instant> {
		self.scheduled
	}

	/// Consumes the pending scan when it is due at `now`.
	pub fn take_due(&mut self, now: Instant) -> bool {
		match self.scheduled {
			Some(at) if at <= now => {
				self.scheduled = None;
				true
			}
			_ => false,
		}
	}
}
