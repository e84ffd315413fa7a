//! WebSocket transport on `tokio-tungstenite`.

use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::sync::Mutex;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::http::HeaderValue;
use tokio_tungstenite::tungstenite::protocol::Message as WsMessage;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};

use crate::error::{Error, Result};
use crate::transport::Transport;
use wamp_protocol::Payload;

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Client WebSocket connection to a WAMP router.
///
/// The sink and stream halves are locked independently: operations send
/// concurrently while the receive loop owns the read side.
pub struct WebSocketTransport {
	sink: Mutex<SplitSink<WsStream, WsMessage>>,
	stream: Mutex<SplitStream<WsStream>>,
}

impl WebSocketTransport {
	/// Connects to `uri`, offering `sub_protocol` during the upgrade.
	///
	/// Fails if the server answers the offer with a different
	/// sub-protocol; an answer with none at all is tolerated, since some
	/// routers omit the header while still speaking the offered codec.
	pub async fn connect(uri: &str, sub_protocol: &str) -> Result<Self> {
		let mut request = uri
			.into_client_request()
			.map_err(|e| Error::Transport(format!("invalid endpoint '{uri}': {e}")))?;
		request.headers_mut().insert(
			"Sec-WebSocket-Protocol",
			HeaderValue::from_str(sub_protocol)
				.map_err(|e| Error::Transport(format!("invalid sub-protocol: {e}")))?,
		);

		let (stream, response) = connect_async(request)
			.await
			.map_err(|e| Error::Transport(format!("connect to '{uri}' failed: {e}")))?;

		if let Some(negotiated) = response.headers().get("Sec-WebSocket-Protocol") {
			if negotiated.as_bytes() != sub_protocol.as_bytes() {
				return Err(Error::Transport(format!(
					"server negotiated sub-protocol {negotiated:?}, offered {sub_protocol}"
				)));
			}
		}

		tracing::debug!(uri, sub_protocol, "websocket connected");

		let (sink, stream) = stream.split();
		Ok(Self {
			sink: Mutex::new(sink),
			stream: Mutex::new(stream),
		})
	}
}

#[async_trait::async_trait]
impl Transport for WebSocketTransport {
	async fn send(&self, payload: Payload) -> Result<()> {
		let frame = match payload {
			Payload::Text(text) => WsMessage::Text(text),
			Payload::Binary(bytes) => WsMessage::Binary(bytes),
		};
		self.sink
			.lock()
			.await
			.send(frame)
			.await
			.map_err(|e| Error::Transport(format!("send failed: {e}")))
	}

	async fn receive(&self) -> Result<Payload> {
		let mut stream = self.stream.lock().await;
		loop {
			let frame = stream
				.next()
				.await
				.ok_or_else(|| Error::Transport("connection closed".into()))?
				.map_err(|e| Error::Transport(format!("receive failed: {e}")))?;

			match frame {
				WsMessage::Text(text) => return Ok(Payload::Text(text)),
				WsMessage::Binary(bytes) => return Ok(Payload::Binary(bytes)),
				// Tungstenite answers pings internally; neither frame
				// carries session data.
				WsMessage::Ping(_) | WsMessage::Pong(_) => continue,
				WsMessage::Close(_) => {
					return Err(Error::Transport("connection closed by peer".into()));
				}
				WsMessage::Frame(_) => continue,
			}
		}
	}

	async fn close(&self) -> Result<()> {
		// Best effort: the peer may already be gone.
		let _ = self.sink.lock().await.send(WsMessage::Close(None)).await;
		Ok(())
	}
}
