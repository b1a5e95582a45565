//! Keeps an auto-clicking matcher alive in every eligible DevTools target.
//!
//! The [`SessionManager`] owns one control-channel connection to a browser
//! (or Electron host) exposing the DevTools protocol. It discovers targets,
//! attaches a flattened session to each eligible one and evaluates the
//! [`matcher`] payload inside it. The payload then runs on its own inside the
//! remote context, clicking approval buttons whenever they appear.
//!
//! ```text
//! discovery ──► SessionManager ──► attach ──► Runtime.evaluate(payload)
//!                   │   ▲                            │
//!                   │   └──── Outcome (registered / ignored / failed)
//!                   ▼
//!             SessionRegistry  (target id ⇄ session id, ignored set)
//! ```
//!
//! [`matcher`] also contains a Rust model of the in-context algorithm over an
//! arena DOM, which the payload is rendered from and tested against.

pub mod config;
pub mod discovery;
pub mod error;
pub mod matcher;
pub mod session;
pub mod target;

pub use autoclick_protocol::{MatcherStatus, TargetInfo};
pub use config::ManagerConfig;
pub use error::{Error, Result};
pub use matcher::{ActionCatalog, ActionMatcher, ExecutionContext, MatcherConfig, PanelMarker, Pass, render_payload};
pub use session::{ManagerSnapshot, SessionManager, SessionRegistry};
pub use target::TargetFilter;
