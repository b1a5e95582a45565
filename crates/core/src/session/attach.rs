//! Attach, probe and inject for a single target.

use std::fmt;

use autoclick_protocol::methods::{ATTACH_TO_TARGET, DETACH_FROM_TARGET, RUNTIME_ENABLE, RUNTIME_EVALUATE};
use autoclick_protocol::{AttachToTargetResult, EvaluateResult, MatcherStatus, TargetInfo};
use autoclick_runtime::Connection;
use serde_json::json;
use tracing::debug;

use crate::error::{Error, Result};

/// Expression that is `true` only in contexts with a rendered document.
pub const DOCUMENT_PROBE: &str = "typeof document !== 'undefined' && !!document.documentElement";

/// Why a target was put on the ignored set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IgnoreReason {
	/// The document probe did not return `true`.
	NoDocument,
	/// The payload reported `not-applicable`.
	NotApplicable,
}

impl fmt::Display for IgnoreReason {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(match self {
			IgnoreReason::NoDocument => "no document",
			IgnoreReason::NotApplicable => "not applicable",
		})
	}
}

/// How an attach sequence ended. The session is already detached for every
/// variant but `Registered`.
#[derive(Debug)]
pub enum AttachOutcome {
	Registered { session_id: String, status: MatcherStatus },
	Ignored(IgnoreReason),
	Failed(Error),
}

/// Evaluates `expression` by value in `session_id`.
pub async fn evaluate(connection: &Connection, session_id: &str, expression: &str) -> Result<EvaluateResult> {
	let result: EvaluateResult = connection
		.request_typed(
			RUNTIME_EVALUATE,
			json!({"expression": expression, "returnByValue": true, "awaitPromise": false}),
			Some(session_id),
		)
		.await?;
	match result.exception_text() {
		Some(text) => Err(Error::Evaluation(text)),
		None => Ok(result),
	}
}

/// Evaluates the matcher payload and parses the status it reports.
pub async fn inject(connection: &Connection, session_id: &str, payload: &str) -> Result<MatcherStatus> {
	let result = evaluate(connection, session_id, payload).await?;
	let status = result
		.as_str()
		.ok_or_else(|| Error::Evaluation(format!("payload returned {:?}", result.result.value)))?;
	Ok(status.parse()?)
}

/// Best-effort detach; failures are only logged.
pub async fn detach(connection: &Connection, session_id: &str) {
	if let Err(e) = connection
		.request(DETACH_FROM_TARGET, json!({"sessionId": session_id}), None)
		.await
	{
		debug!(target = "autoclick.attach", session = session_id, error = %e, "detach failed");
	}
}

async fn has_document(connection: &Connection, session_id: &str) -> Result<bool> {
	match evaluate(connection, session_id, DOCUMENT_PROBE).await {
		Ok(result) => Ok(result.as_bool() == Some(true)),
		Err(Error::Evaluation(_)) => Ok(false),
		Err(e) => Err(e),
	}
}

enum SessionVerdict {
	Keep(MatcherStatus),
	Ignore(IgnoreReason),
}

/// Runs the full sequence for `target`: attach, enable the runtime, probe
/// generic pages for a document, inject.
///
/// A target keeps its session only when the payload reports anything other
/// than `not-applicable`.
pub async fn attach_and_inject(connection: &Connection, target: &TargetInfo, payload: &str) -> AttachOutcome {
	let attached: AttachToTargetResult = match connection
		.request_typed(
			ATTACH_TO_TARGET,
			json!({"targetId": target.target_id, "flatten": true}),
			None,
		)
		.await
	{
		Ok(attached) => attached,
		Err(e) => return AttachOutcome::Failed(e.into()),
	};
	let session_id = attached.session_id;

	match run_session(connection, target, &session_id, payload).await {
		Ok(SessionVerdict::Keep(status)) => AttachOutcome::Registered { session_id, status },
		Ok(SessionVerdict::Ignore(reason)) => {
			debug!(target = "autoclick.attach", target_id = %target.target_id, %reason, "ignoring target");
			detach(connection, &session_id).await;
			AttachOutcome::Ignored(reason)
		}
		Err(e) => {
			detach(connection, &session_id).await;
			AttachOutcome::Failed(e)
		}
	}
}

async fn run_session(
	connection: &Connection,
	target: &TargetInfo,
	session_id: &str,
	payload: &str,
) -> Result<SessionVerdict> {
	connection.request(RUNTIME_ENABLE, json!({}), Some(session_id)).await?;

	if target.is_generic_page() && !has_document(connection, session_id).await? {
		return Ok(SessionVerdict::Ignore(IgnoreReason::NoDocument));
	}

	let status = inject(connection, session_id, payload).await?;
	if status.keeps_session() {
		Ok(SessionVerdict::Keep(status))
	} else {
		Ok(SessionVerdict::Ignore(IgnoreReason::NotApplicable))
	}
}
