//! Session establishment: the HELLO / CHALLENGE / AUTHENTICATE / WELCOME
//! handshake.
//!
//! [`SessionJoiner`] owns an authenticator and a serializer, connects a
//! transport, and walks the handshake until the router either welcomes the
//! client or aborts. The result is a [`BaseSession`]: the established
//! connection plus the identity the router assigned, ready to be handed to
//! the session engine.

use std::sync::Arc;

use serde_json::{Value, json};

use crate::auth::Authenticator;
use crate::error::{Error, Result};
use crate::transport::{Transport, WebSocketTransport};
use wamp_protocol::{Dict, Message, Serializer, client_roles};

/// Identity assigned by the router during the handshake.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionDetails {
	/// Router-assigned session id.
	pub session_id: u64,
	/// The realm actually joined.
	pub realm: String,
	/// Authenticated identity.
	pub auth_id: String,
	/// Role the router assigned to this identity.
	pub auth_role: String,
}

/// An established connection: transport, serializer, and session identity.
///
/// Produced by [`SessionJoiner::join`] and consumed by the session engine.
pub struct BaseSession {
	transport: Arc<dyn Transport>,
	serializer: Arc<dyn Serializer>,
	details: SessionDetails,
}

impl BaseSession {
	/// Assembles a base session from an already-joined connection.
	pub fn new(
		transport: Arc<dyn Transport>,
		serializer: Arc<dyn Serializer>,
		details: SessionDetails,
	) -> Self {
		Self {
			transport,
			serializer,
			details,
		}
	}

	/// Serializes and sends one message.
	pub async fn send_message(&self, message: &Message) -> Result<()> {
		let payload = self.serializer.serialize(message)?;
		self.transport.send(payload).await
	}

	/// Receives and deserializes the next message.
	pub async fn receive_message(&self) -> Result<Message> {
		let payload = self.transport.receive().await?;
		Ok(self.serializer.deserialize(&payload)?)
	}

	/// The underlying transport.
	pub fn transport(&self) -> &Arc<dyn Transport> {
		&self.transport
	}

	/// The codec in use.
	pub fn serializer(&self) -> &Arc<dyn Serializer> {
		&self.serializer
	}

	/// The identity assigned during the handshake.
	pub fn details(&self) -> &SessionDetails {
		&self.details
	}
}

impl std::fmt::Debug for BaseSession {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("BaseSession")
			.field("details", &self.details)
			.finish()
	}
}

/// Performs the client side of the session handshake.
pub struct SessionJoiner {
	authenticator: Arc<dyn Authenticator>,
	serializer: Arc<dyn Serializer>,
}

impl SessionJoiner {
	/// Creates a joiner with the given authenticator and serializer.
	pub fn new(authenticator: Arc<dyn Authenticator>, serializer: Arc<dyn Serializer>) -> Self {
		Self {
			authenticator,
			serializer,
		}
	}

	/// Connects a WebSocket to `uri` and joins `realm`.
	pub async fn join(&self, uri: &str, realm: &str) -> Result<BaseSession> {
		let transport =
			WebSocketTransport::connect(uri, self.serializer.sub_protocol()).await?;
		self.join_transport(Arc::new(transport), realm).await
	}

	/// Joins `realm` over an already-connected transport.
	///
	/// This is the seam tests use to run the handshake over a memory
	/// pair.
	pub async fn join_transport(
		&self,
		transport: Arc<dyn Transport>,
		realm: &str,
	) -> Result<BaseSession> {
		let hello = Message::Hello {
			realm: realm.to_string(),
			details: self.hello_details(),
		};
		send(&*transport, &*self.serializer, &hello).await?;

		loop {
			let payload = transport.receive().await?;
			match self.serializer.deserialize(&payload)? {
				Message::Welcome { session_id, details } => {
					let details = session_details(session_id, realm, &details);
					tracing::debug!(
						session_id = details.session_id,
						realm = %details.realm,
						auth_id = %details.auth_id,
						"session joined"
					);
					return Ok(BaseSession::new(
						transport,
						Arc::clone(&self.serializer),
						details,
					));
				}
				Message::Challenge { auth_method, extra } => {
					tracing::debug!(%auth_method, "answering challenge");
					let signature = self.authenticator.authenticate(&extra)?;
					let authenticate = Message::Authenticate {
						signature,
						extra: self.authenticator.auth_extra(),
					};
					send(&*transport, &*self.serializer, &authenticate).await?;
				}
				Message::Abort { details, reason } => {
					let message = details
						.get("message")
						.and_then(Value::as_str)
						.map(str::to_owned);
					return Err(Error::Abort { reason, message });
				}
				other => {
					return Err(Error::Protocol(format!(
						"unexpected message during handshake: {other:?}"
					)));
				}
			}
		}
	}

	fn hello_details(&self) -> Dict {
		let mut details = Dict::new();
		details.insert("roles".into(), Value::Object(client_roles()));
		details.insert(
			"authmethods".into(),
			json!([self.authenticator.auth_method()]),
		);
		let auth_id = self.authenticator.auth_id();
		if !auth_id.is_empty() {
			details.insert("authid".into(), json!(auth_id));
		}
		details
	}
}

async fn send(
	transport: &dyn Transport,
	serializer: &dyn Serializer,
	message: &Message,
) -> Result<()> {
	let payload = serializer.serialize(message)?;
	transport.send(payload).await
}

fn session_details(session_id: u64, requested_realm: &str, welcome: &Dict) -> SessionDetails {
	let field = |key: &str| {
		welcome
			.get(key)
			.and_then(Value::as_str)
			.unwrap_or_default()
			.to_string()
	};
	let realm = welcome
		.get("realm")
		.and_then(Value::as_str)
		.unwrap_or(requested_realm)
		.to_string();
	SessionDetails {
		session_id,
		realm,
		auth_id: field("authid"),
		auth_role: field("authrole"),
	}
}

#[cfg(test)]
mod tests {
	use serde_json::Map;

	use super::*;
	use crate::auth::{AnonymousAuthenticator, TicketAuthenticator};
	use crate::transport::memory_pair;
	use wamp_protocol::JsonSerializer;

	fn joiner(authenticator: impl Authenticator + 'static) -> SessionJoiner {
		SessionJoiner::new(Arc::new(authenticator), Arc::new(JsonSerializer))
	}

	async fn peer_receive(peer: &dyn Transport) -> Message {
		let payload = peer.receive().await.unwrap();
		JsonSerializer.deserialize(&payload).unwrap()
	}

	async fn peer_send(peer: &dyn Transport, message: &Message) {
		let payload = JsonSerializer.serialize(message).unwrap();
		peer.send(payload).await.unwrap();
	}

	#[tokio::test]
	async fn anonymous_join_round_trip() {
		let (client, router) = memory_pair();
		let router = Arc::new(router);

		let peer = {
			let router = Arc::clone(&router);
			tokio::spawn(async move {
				let hello = peer_receive(&*router).await;
				let Message::Hello { realm, details } = hello else {
					panic!("expected HELLO, got {hello:?}");
				};
				assert_eq!(realm, "realm1");
				assert!(details.contains_key("roles"));

				let mut welcome = Map::new();
				welcome.insert("authid".into(), json!("anonymous-1"));
				welcome.insert("authrole".into(), json!("anonymous"));
				peer_send(
					&*router,
					&Message::Welcome {
						session_id: 42,
						details: welcome,
					},
				)
				.await;
			})
		};

		let base = joiner(AnonymousAuthenticator::default())
			.join_transport(Arc::new(client), "realm1")
			.await
			.unwrap();
		peer.await.unwrap();

		assert_eq!(
			base.details(),
			&SessionDetails {
				session_id: 42,
				realm: "realm1".into(),
				auth_id: "anonymous-1".into(),
				auth_role: "anonymous".into(),
			}
		);
	}

	#[tokio::test]
	async fn ticket_challenge_round_trip() {
		let (client, router) = memory_pair();
		let router = Arc::new(router);

		let peer = {
			let router = Arc::clone(&router);
			tokio::spawn(async move {
				let Message::Hello { details, .. } = peer_receive(&*router).await else {
					panic!("expected HELLO");
				};
				assert_eq!(details.get("authmethods"), Some(&json!(["ticket"])));
				assert_eq!(details.get("authid"), Some(&json!("alice")));

				peer_send(
					&*router,
					&Message::Challenge {
						auth_method: "ticket".into(),
						extra: Map::new(),
					},
				)
				.await;

				let authenticate = peer_receive(&*router).await;
				let Message::Authenticate { signature, .. } = authenticate else {
					panic!("expected AUTHENTICATE, got {authenticate:?}");
				};
				assert_eq!(signature, "s3cret");

				let mut welcome = Map::new();
				welcome.insert("authid".into(), json!("alice"));
				welcome.insert("authrole".into(), json!("user"));
				peer_send(
					&*router,
					&Message::Welcome {
						session_id: 7,
						details: welcome,
					},
				)
				.await;
			})
		};

		let base = joiner(TicketAuthenticator::new("alice", "s3cret"))
			.join_transport(Arc::new(client), "realm1")
			.await
			.unwrap();
		peer.await.unwrap();

		assert_eq!(base.details().auth_id, "alice");
		assert_eq!(base.details().auth_role, "user");
	}

	#[tokio::test]
	async fn abort_surfaces_reason() {
		let (client, router) = memory_pair();
		let router = Arc::new(router);

		let peer = {
			let router = Arc::clone(&router);
			tokio::spawn(async move {
				let _ = peer_receive(&*router).await;
				let mut details = Map::new();
				details.insert("message".into(), json!("no such realm"));
				peer_send(
					&*router,
					&Message::Abort {
						details,
						reason: "wamp.error.no_such_realm".into(),
					},
				)
				.await;
			})
		};

		let err = joiner(AnonymousAuthenticator::default())
			.join_transport(Arc::new(client), "nowhere")
			.await
			.unwrap_err();
		peer.await.unwrap();

		match err {
			Error::Abort { reason, message } => {
				assert_eq!(reason, "wamp.error.no_such_realm");
				assert_eq!(message.as_deref(), Some("no such realm"));
			}
			other => panic!("expected Abort, got {other:?}"),
		}
	}

	#[tokio::test]
	async fn challenge_to_anonymous_is_an_error() {
		let (client, router) = memory_pair();
		let router = Arc::new(router);

		let peer = {
			let router = Arc::clone(&router);
			tokio::spawn(async move {
				let _ = peer_receive(&*router).await;
				peer_send(
					&*router,
					&Message::Challenge {
						auth_method: "ticket".into(),
						extra: Map::new(),
					},
				)
				.await;
			})
		};

		let err = joiner(AnonymousAuthenticator::default())
			.join_transport(Arc::new(client), "realm1")
			.await
			.unwrap_err();
		peer.await.unwrap();

		assert!(matches!(err, Error::Protocol(_)));
	}

	#[tokio::test]
	async fn unexpected_handshake_message_is_a_violation() {
		let (client, router) = memory_pair();
		let router = Arc::new(router);

		let peer = {
			let router = Arc::clone(&router);
			tokio::spawn(async move {
				let _ = peer_receive(&*router).await;
				peer_send(
					&*router,
					&Message::Subscribed {
						request_id: 1,
						subscription_id: 2,
					},
				)
				.await;
			})
		};

		let err = joiner(AnonymousAuthenticator::default())
			.join_transport(Arc::new(client), "realm1")
			.await
			.unwrap_err();
		peer.await.unwrap();

		assert!(matches!(err, Error::Protocol(_)));
	}

	#[tokio::test]
	async fn welcome_realm_falls_back_to_requested() {
		let details = session_details(1, "realm9", &Map::new());
		assert_eq!(details.realm, "realm9");
		assert_eq!(details.auth_id, "");
	}
}
