//! Control-channel runtime: transport and request correlation.
//!
//! ```text
//! ┌──────────────┐
//! │  autoclick   │  Session manager (targets, sessions, injection)
//! └──────┬───────┘
//!        │ request(method, params, session?) / event stream
//! ┌──────▼───────┐
//! │   runtime    │  This crate
//! │  ┌────────┐  │
//! │  │ Conn   │  │  id correlation, per-request timeout, dispatch loop
//! │  └────────┘  │
//! │  ┌────────┐  │
//! │  │ Trans  │  │  WebSocket (or in-memory) frames
//! │  └────────┘  │
//! └──────────────┘
//! ```

pub mod connection;
pub mod error;
pub mod transport;

pub use connection::{Connection, DEFAULT_REQUEST_TIMEOUT, EventStream};
pub use error::{Error, Result};
pub use transport::{
	ChannelPeer, ChannelTransport, Transport, TransportParts, TransportReceiver, WebSocketTransport,
};
