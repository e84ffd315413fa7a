//! In-process transport pair.
//!
//! Two [`MemoryTransport`]s connected back to back: whatever one end
//! sends, the other receives. Closing either end fails the peer's next
//! receive, which is exactly how a dropped network connection presents,
//! so tests can exercise teardown paths without a socket.

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::mpsc;

use crate::error::{Error, Result};
use crate::transport::Transport;
use wamp_protocol::Payload;

/// One end of an in-process transport pair.
pub struct MemoryTransport {
	outgoing: Mutex<Option<mpsc::UnboundedSender<Payload>>>,
	incoming: tokio::sync::Mutex<mpsc::UnboundedReceiver<Payload>>,
}

/// Creates a connected transport pair.
pub fn memory_pair() -> (MemoryTransport, MemoryTransport) {
	let (left_tx, left_rx) = mpsc::unbounded_channel();
	let (right_tx, right_rx) = mpsc::unbounded_channel();
	(
		MemoryTransport {
			outgoing: Mutex::new(Some(left_tx)),
			incoming: tokio::sync::Mutex::new(right_rx),
		},
		MemoryTransport {
			outgoing: Mutex::new(Some(right_tx)),
			incoming: tokio::sync::Mutex::new(left_rx),
		},
	)
}

#[async_trait]
impl Transport for MemoryTransport {
	async fn send(&self, payload: Payload) -> Result<()> {
		let guard = self.outgoing.lock();
		let sender = guard
			.as_ref()
			.ok_or_else(|| Error::Transport("connection closed".into()))?;
		sender
			.send(payload)
			.map_err(|_| Error::Transport("peer closed the connection".into()))
	}

	async fn receive(&self) -> Result<Payload> {
		self.incoming
			.lock()
			.await
			.recv()
			.await
			.ok_or_else(|| Error::Transport("peer closed the connection".into()))
	}

	async fn close(&self) -> Result<()> {
		self.outgoing.lock().take();
		Ok(())
	}
}
