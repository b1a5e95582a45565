//! Error types for the control-channel runtime.

use thiserror::Error;

/// Result type alias for runtime operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while talking to the remote endpoint.
#[derive(Debug, Error)]
pub enum Error {
	/// Failed to establish the WebSocket connection.
	#[error("Failed to connect to {url}: {reason}")]
	ConnectionFailed { url: String, reason: String },

	/// Transport-level error (socket read/write).
	#[error("Transport error: {0}")]
	TransportError(String),

	/// A frame could not be interpreted.
	#[error("Protocol error: {0}")]
	ProtocolError(String),

	/// The remote endpoint answered with an error object.
	#[error("{method} failed ({code}): {message}")]
	Remote {
		method: String,
		code: i64,
		message: String,
	},

	/// No response arrived within the per-request timeout.
	#[error("Timeout after {timeout_ms}ms waiting for {method}")]
	Timeout { method: String, timeout_ms: u64 },

	/// The connection went away before the response arrived.
	#[error("Channel closed unexpectedly")]
	ChannelClosed,

	/// JSON serialization/deserialization error.
	#[error("JSON error: {0}")]
	Json(#[from] serde_json::Error),
}

impl Error {
	/// Returns true if this is a per-request timeout.
	pub fn is_timeout(&self) -> bool {
		matches!(self, Error::Timeout { .. })
	}

	/// Returns true if the connection closed underneath the request.
	pub fn is_channel_closed(&self) -> bool {
		matches!(self, Error::ChannelClosed)
	}

	/// Returns the remote error code, if the endpoint rejected the request.
	pub fn remote_code(&self) -> Option<i64> {
		match self {
			Error::Remote { code, .. } => Some(*code),
			_ => None,
		}
	}
}
