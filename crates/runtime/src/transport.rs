//! Duplex transports carrying JSON frames.
//!
//! A transport is split into a sending half ([`Transport`]) and a receiving
//! half ([`TransportReceiver`]). The receiver pushes every decoded frame into
//! one unbounded queue; the [`Connection`](crate::Connection) owns the other
//! end of that queue and is its only consumer.
//!
//! Two implementations exist:
//! - [`WebSocketTransport`]: the real control channel
//! - [`ChannelTransport`]: an in-memory pair used to drive a connection
//!   without a socket


use std::future::Future;
use std::pin::Pin;

use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use serde_json::Value;
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message as WsMessage;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};
use tracing::debug;

use crate::error::{Error, Result};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Boxed future returned by transport methods.
pub type TransportFuture<'a> = Pin<Box<dyn Future<Output = Result<()>> + Send + 'a>>;

/// Sending half of a transport.
pub trait Transport: Send {
	/// Serializes and writes one frame.
	fn send(&mut self, message: Value) -> TransportFuture<'_>;

	/// Politely closes the underlying stream.
	fn close(&mut self) -> TransportFuture<'_>;
}

/// Receiving half of a transport.
pub trait TransportReceiver: Send {
	/// Reads frames until the stream ends, forwarding each decoded frame.
	///
	/// Returns `Ok(())` on an orderly close.
	fn run(self: Box<Self>) -> TransportFuture<'static>;
}

/// Both halves of a transport plus the queue the receiver feeds.
pub struct TransportParts {
	pub sender: Box<dyn Transport>,
	pub receiver: Box<dyn TransportReceiver>,
	pub message_rx: mpsc::UnboundedReceiver<Value>,
}

/// Decodes a text frame, dropping anything that is not JSON.
fn decode_frame(text: &str) -> Option<Value> {
	match serde_json::from_str::<Value>(text) {
		Ok(value) => Some(value),
		Err(e) => {
			debug!(target = "autoclick.transport", error = %e, "dropping malformed frame");
			None
		}
	}
}

/// WebSocket control channel.
pub struct WebSocketTransport;

impl WebSocketTransport {
	/// Connects to `url` and splits the socket into transport halves.
	pub async fn connect(url: &str) -> Result<TransportParts> {
		let (stream, _) = connect_async(url).await.map_err(|e| Error::ConnectionFailed {
			url: url.to_string(),
			reason: e.to_string(),
		})?;
		debug!(target = "autoclick.transport", url, "websocket connected");

		let (sink, stream) = stream.split();
		let (message_tx, message_rx) = mpsc::unbounded_channel();

		Ok(TransportParts {
			sender: Box::new(WebSocketTransportSender { sink }),
			receiver: Box::new(WebSocketTransportReceiver { stream, message_tx }),
			message_rx,
		})
	}
}

/// Writes frames to the socket.
pub struct WebSocketTransportSender {
	sink: SplitSink<WsStream, WsMessage>,
}

impl Transport for WebSocketTransportSender {
	fn send(&mut self, message: Value) -> TransportFuture<'_> {
		Box::pin(async move {
			let text = serde_json::to_string(&message)?;
			self.sink
				.send(WsMessage::Text(text))
				.await
				.map_err(|e| Error::TransportError(e.to_string()))
		})
	}

	fn close(&mut self) -> TransportFuture<'_> {
		Box::pin(async move {
			self.sink
				.close()
				.await
				.map_err(|e| Error::TransportError(e.to_string()))
		})
	}
}

/// Reads frames from the socket.
pub struct WebSocketTransportReceiver {
	stream: SplitStream<WsStream>,
	message_tx: mpsc::UnboundedSender<Value>,
}

impl TransportReceiver for WebSocketTransportReceiver {
	fn run(self: Box<Self>) -> TransportFuture<'static> {
		let WebSocketTransportReceiver {
			mut stream,
			message_tx,
		} = *self;

		Box::pin(async move {
			while let Some(frame) = stream.next().await {
				let frame = frame.map_err(|e| Error::TransportError(e.to_string()))?;
				let value = match frame {
					WsMessage::Text(text) => decode_frame(&text),
					WsMessage::Binary(bytes) => std::str::from_utf8(&bytes).ok().and_then(decode_frame),
					WsMessage::Close(_) => break,
					_ => None,
				};
				if let Some(value) = value {
					if message_tx.send(value).is_err() {
						// Connection dropped its queue; nobody is listening anymore.
						break;
					}
				}
			}
			debug!(target = "autoclick.transport", "websocket stream ended");
			Ok(())
		})
	}
}

/// In-memory transport whose remote side is a pair of channels.
pub struct ChannelTransport;

/// The far side of a [`ChannelTransport`].
pub struct ChannelPeer {
	/// Frames written by the local sender.
	pub outbound_rx: mpsc::UnboundedReceiver<Value>,
	/// Frames delivered to the local receiver.
	pub inbound_tx: mpsc::UnboundedSender<Value>,
}

impl ChannelTransport {
	/// Creates connected transport halves and the peer that drives them.
	pub fn pair() -> (TransportParts, ChannelPeer) {
		let (outbound_tx, outbound_rx) = mpsc::unbounded_channel();
		let (inbound_tx, inbound_rx) = mpsc::unbounded_channel();
		let (message_tx, message_rx) = mpsc::unbounded_channel();

		let parts = TransportParts {
			sender: Box::new(ChannelTransportSender {
				outbound_tx: Some(outbound_tx),
			}),
			receiver: Box::new(ChannelTransportReceiver {
				inbound_rx,
				message_tx,
			}),
			message_rx,
		};
		let peer = ChannelPeer {
			outbound_rx,
			inbound_tx,
		};
		(parts, peer)
	}
}

struct ChannelTransportSender {
	outbound_tx: Option<mpsc::UnboundedSender<Value>>,
}

impl Transport for ChannelTransportSender {
	fn send(&mut self, message: Value) -> TransportFuture<'_> {
		let result = match &self.outbound_tx {
			Some(tx) => tx.send(message).map_err(|_| Error::ChannelClosed),
			None => Err(Error::ChannelClosed),
		};
		Box::pin(async move { result })
	}

	fn close(&mut self) -> TransportFuture<'_> {
		self.outbound_tx = None;
		Box::pin(async { Ok(()) })
	}
}

struct ChannelTransportReceiver {
	inbound_rx: mpsc::UnboundedReceiver<Value>,
	message_tx: mpsc::UnboundedSender<Value>,
}

impl TransportReceiver for ChannelTransportReceiver {
	fn run(self: Box<Self>) -> TransportFuture<'static> {
		let ChannelTransportReceiver {
			mut inbound_rx,
			message_tx,
		} = *self;

		Box::pin(async move {
			while let Some(value) = inbound_rx.recv().await {
				if message_tx.send(value).is_err() {
					break;
				}
			}
			Ok(())
		})
	}
}
