//! Transport abstraction for WAMP sessions.
//!
//! A [`Transport`] moves opaque [`Payload`]s between this client and a
//! router. The session runtime never looks inside a payload; encoding is
//! the serializer's job. Two implementations ship:
//!
//! - [`WebSocketTransport`] - the production transport, negotiating the
//!   codec's sub-protocol during the HTTP upgrade
//! - [`memory_pair`] - an in-process connected pair used by tests and
//!   loopback wiring

mod memory;
mod websocket;


use async_trait::async_trait;

use crate::error::Result;
use wamp_protocol::Payload;

pub use memory::{MemoryTransport, memory_pair};
pub use websocket::WebSocketTransport;

/// A bidirectional, message-oriented connection to a peer.
///
/// `receive` is intended for a single consumer (the session's receive
/// loop); `send` may be called concurrently from any task. All methods
/// report [`Error::Transport`] once the underlying connection is gone.
///
/// [`Error::Transport`]: crate::error::Error::Transport
#[async_trait]
pub trait Transport: Send + Sync {
	/// Sends one payload to the peer.
	async fn send(&self, payload: Payload) -> Result<()>;

	/// Blocks until the next payload arrives or the connection dies.
	async fn receive(&self) -> Result<Payload>;

	/// Closes the connection. Idempotent.
	async fn close(&self) -> Result<()>;
}
