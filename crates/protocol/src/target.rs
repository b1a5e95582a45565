//! Target descriptors and typed method payloads.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A discoverable rendering context.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TargetInfo {
	pub target_id: String,
	/// `page`, `iframe`, `webview`, `service_worker`, `browser`, ...
	#[serde(rename = "type")]
	pub kind: String,
	#[serde(default)]
	pub title: String,
	#[serde(default)]
	pub url: String,
	#[serde(default)]
	pub attached: bool,
}

impl TargetInfo {
	/// True for the generic `page` type, which needs a document probe before injection.
	pub fn is_generic_page(&self) -> bool {
		self.kind == "page"
	}
}

/// `Target.getTargets` result.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetTargetsResult {
	#[serde(default)]
	pub target_infos: Vec<TargetInfo>,
}

/// `Target.attachToTarget` result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttachToTargetResult {
	pub session_id: String,
}

/// `Target.targetCreated` params.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TargetCreated {
	pub target_info: TargetInfo,
}

/// `Target.targetDestroyed` params.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TargetDestroyed {
	pub target_id: String,
}

/// `Target.detachedFromTarget` params.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TargetDetached {
	pub session_id: String,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub target_id: Option<String>,
}

/// Mirror of a remote value returned by `Runtime.evaluate`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteObject {
	#[serde(rename = "type")]
	pub kind: String,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub value: Option<Value>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub description: Option<String>,
}

/// `Runtime.evaluate` result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvaluateResult {
	pub result: RemoteObject,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub exception_details: Option<Value>,
}

impl EvaluateResult {
	/// Returns the by-value string result, if the expression produced one.
	pub fn as_str(&self) -> Option<&str> {
		self.result.value.as_ref().and_then(Value::as_str)
	}

	/// Returns the by-value boolean result, if the expression produced one.
	pub fn as_bool(&self) -> Option<bool> {
		self.result.value.as_ref().and_then(Value::as_bool)
	}

	/// Short human-readable description of a thrown exception.
	pub fn exception_text(&self) -> Option<String> {
		let details = self.exception_details.as_ref()?;
		let text = details
			.get("exception")
			.and_then(|e| e.get("description"))
			.or_else(|| details.get("text"))
			.and_then(Value::as_str)
			.unwrap_or("exception thrown");
		Some(text.to_string())
	}
}

/// `/json/version` response subset from the bootstrap HTTP endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionInfo {
	#[serde(rename = "webSocketDebuggerUrl")]
	pub web_socket_debugger_url: String,
	#[serde(rename = "Browser", default, skip_serializing_if = "Option::is_none")]
	pub browser: Option<String>,
}
