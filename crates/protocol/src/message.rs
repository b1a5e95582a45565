//! Request, response and event envelopes.
//!
//! Outgoing frames are always [`Request`]s. Incoming frames are classified by
//! [`Message`]: anything carrying an `id` is a [`Response`], anything carrying
//! a `method` is an [`Event`], everything else lands in [`Message::Unknown`].

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Command sent to the remote endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Request {
	pub id: u64,
	pub method: String,
	pub params: Value,
	/// Flattened session the command is routed to; `None` for browser-level commands.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub session_id: Option<String>,
}

/// Error object carried by a failed response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseError {
	#[serde(default)]
	pub code: i64,
	pub message: String,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub data: Option<Value>,
}

/// Reply correlated to a [`Request`] by `id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Response {
	pub id: u64,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub result: Option<Value>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub error: Option<ResponseError>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub session_id: Option<String>,
}

/// Out-of-band notification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
	pub method: String,
	#[serde(default)]
	pub params: Value,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub session_id: Option<String>,
}

impl Event {
	/// Deserializes `params` into a typed payload.
	pub fn params_as<T: serde::de::DeserializeOwned>(&self) -> serde_json::Result<T> {
		serde_json::from_value(self.params.clone())
	}
}

/// Discriminated union of incoming frames.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Message {
	/// Has an `id` field.
	Response(Response),
	/// Has a `method` field and no `id`.
	Event(Event),
	/// Neither; kept so a stray frame never aborts the dispatch loop.
	Unknown(Value),
}
