//! Client entry point: configuration plus connect.

use std::sync::Arc;

use wamp_protocol::{JsonSerializer, Serializer};
use wamp_runtime::{
	AnonymousAuthenticator, Authenticator, BaseSession, Result, Session, SessionJoiner, Transport,
};

/// Configures how sessions are established: which authenticator answers
/// the router and which codec frames the wire.
///
/// Defaults to anonymous authentication over the JSON codec.
///
/// # Example
///
/// ```ignore
/// use wamp::{Client, TicketAuthenticator};
///
/// let client = Client::new()
///     .with_authenticator(TicketAuthenticator::new("alice", "s3cret"));
/// let session = client.connect("ws://localhost:8080/ws", "realm1").await?;
/// ```
#[derive(Clone)]
pub struct Client {
	authenticator: Arc<dyn Authenticator>,
	serializer: Arc<dyn Serializer>,
}

impl Client {
	/// Creates a client with anonymous authentication and the JSON codec.
	pub fn new() -> Self {
		Self {
			authenticator: Arc::new(AnonymousAuthenticator::default()),
			serializer: Arc::new(JsonSerializer),
		}
	}

	/// Replaces the authenticator.
	pub fn with_authenticator(mut self, authenticator: impl Authenticator + 'static) -> Self {
		self.authenticator = Arc::new(authenticator);
		self
	}

	/// Replaces the codec.
	pub fn with_serializer(mut self, serializer: impl Serializer + 'static) -> Self {
		self.serializer = Arc::new(serializer);
		self
	}

	/// Connects to a router endpoint, joins `realm`, and returns the
	/// running session.
	pub async fn connect(&self, uri: &str, realm: &str) -> Result<Session> {
		let base = self.joiner().join(uri, realm).await?;
		Ok(Session::new(base))
	}

	/// Joins `realm` over an already-connected transport.
	///
	/// Useful for transports other than the built-in WebSocket, and for
	/// tests running against an in-process peer.
	pub async fn connect_transport(
		&self,
		transport: Arc<dyn Transport>,
		realm: &str,
	) -> Result<Session> {
		let base: BaseSession = self.joiner().join_transport(transport, realm).await?;
		Ok(Session::new(base))
	}

	fn joiner(&self) -> SessionJoiner {
		SessionJoiner::new(Arc::clone(&self.authenticator), Arc::clone(&self.serializer))
	}
}

impl Default for Client {
	fn default() -> Self {
		Self::new()
	}
}
