//! Wire types for the DevTools control channel.
//!
//! This crate holds the serializable shapes shared between the runtime
//! (which moves JSON frames over the socket) and the core crate (which
//! interprets them):
//!
//! - [`message`]: request / response / event envelopes
//! - [`target`]: target descriptors and the result payloads of the
//!   `Target.*` and `Runtime.*` methods the manager uses
//! - [`status`]: the status strings returned by the injected matcher

pub mod message;
pub mod methods;
pub mod status;
pub mod target;

pub use message::{Event, Message, Request, Response, ResponseError};
pub use status::{MatcherStatus, ParseStatusError};
pub use target::{
	AttachToTargetResult, EvaluateResult, GetTargetsResult, RemoteObject, TargetCreated,
	TargetDestroyed, TargetDetached, TargetInfo, VersionInfo,
};
