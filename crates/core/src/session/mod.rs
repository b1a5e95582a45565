//! Session management: discovery-driven attach, injection and teardown.

pub mod attach;
mod manager;
mod registry;

pub use attach::{AttachOutcome, DOCUMENT_PROBE, IgnoreReason, attach_and_inject};
pub use manager::{ManagerSnapshot, SessionManager};
pub use registry::SessionRegistry;
