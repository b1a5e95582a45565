//! Error types for discovery, session management and matcher configuration.

use autoclick_protocol::ParseStatusError;
use thiserror::Error;

/// Result type alias for this crate.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
	/// None of the candidate ports answered the bootstrap endpoint.
	#[error("No DevTools endpoint responded on ports {ports:?}")]
	NoEndpoint { ports: Vec<u16> },

	/// A single port answered, but not usefully.
	#[error("Discovery on port {port} failed: {reason}")]
	Discovery { port: u16, reason: String },

	/// The advertised control-channel URL is not a WebSocket URL.
	#[error("Invalid control-channel URL {url}: {reason}")]
	InvalidEndpoint { url: String, reason: String },

	#[error("HTTP client error: {0}")]
	Http(#[from] reqwest::Error),

	#[error(transparent)]
	Runtime(#[from] autoclick_runtime::Error),

	#[error("Invalid URL pattern: {0}")]
	Pattern(#[from] glob::PatternError),

	#[error("Invalid panel marker {0:?}")]
	Marker(String),

	/// Evaluation threw inside the remote context.
	#[error("Evaluation failed: {0}")]
	Evaluation(String),

	#[error(transparent)]
	Status(#[from] ParseStatusError),

	/// A [`ManagerConfig`](crate::ManagerConfig) value the manager cannot run with.
	#[error("Invalid {field}: {reason}")]
	InvalidConfig { field: &'static str, reason: &'static str },
}

impl Error {
	/// True when the underlying request timed out.
	pub fn is_timeout(&self) -> bool {
		matches!(self, Error::Runtime(e) if e.is_timeout())
	}

	/// True when the control channel closed underneath the operation.
	pub fn is_channel_closed(&self) -> bool {
		matches!(self, Error::Runtime(e) if e.is_channel_closed())
	}
}
