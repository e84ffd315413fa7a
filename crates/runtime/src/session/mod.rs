//! The session engine: operation surface, pending tables, and the receive
//! loop.
//!
//! One [`Session`] owns one established connection. Callers issue RPC and
//! pubsub operations concurrently; each operation draws a fresh request id,
//! parks a one-shot completion handle keyed by that id, sends its message,
//! and suspends. A single spawned receive loop decodes every inbound
//! message and resolves the matching handle, invokes a registered handler,
//! or tears the session down.
//!
//! # Message Flow
//!
//! 1. Caller invokes an operation (e.g. `call`)
//! 2. The session assigns a request id and parks a oneshot sender for it
//! 3. The request is serialized and sent via the transport
//! 4. The caller awaits on the oneshot receiver
//! 5. The receive loop observes the correlated reply (or error)
//! 6. The reply is routed by request id and the oneshot resolves
//!
//! # Locking
//!
//! All session state - pending tables, live registrations and
//! subscriptions, the parked goodbye waiter, and the connected flag - sits
//! behind one mutex with short critical sections. The lock is never held
//! across an await: handlers are cloned out before invocation and waiters
//! are resolved after the guard drops where ordering allows it.


use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::{Notify, oneshot};

use crate::error::{Error, Result};
use crate::id::RequestIdGenerator;
use crate::joiner::{BaseSession, SessionDetails};
use crate::transport::Transport;
use wamp_protocol::{
	Args, CallOptions, Dict, Kwargs, Message, PublishOptions, RegisterOptions, Serializer,
	SubscribeOptions, code, uri,
};

/// How long `leave` waits for the peer's answering GOODBYE before closing
/// the connection anyway.
const GOODBYE_TIMEOUT: Duration = Duration::from_secs(10);

/// Boxed future returned by procedure and event handlers.
pub type HandlerFuture<T> = Pin<Box<dyn Future<Output = Result<T>> + Send>>;

/// An RPC endpoint implementation: invocation in, result (or error) out.
pub type ProcedureHandler = Arc<dyn Fn(Invocation) -> HandlerFuture<CallResult> + Send + Sync>;

/// A topic event consumer.
pub type EventHandler = Arc<dyn Fn(Event) -> HandlerFuture<()> + Send + Sync>;

/// The outcome of a successful `call`, or the value a procedure handler
/// produces for a YIELD.
#[derive(Debug, Clone, Default)]
pub struct CallResult {
	/// Positional result payload.
	pub args: Args,
	/// Keyword result payload.
	pub kwargs: Kwargs,
	/// Result details (sent as YIELD options when produced by a handler).
	pub details: Dict,
}

/// A procedure invocation delivered to a registered handler.
#[derive(Debug, Clone, Default)]
pub struct Invocation {
	/// Positional call payload.
	pub args: Args,
	/// Keyword call payload.
	pub kwargs: Kwargs,
	/// Invocation details from the router.
	pub details: Dict,
}

/// A topic event delivered to a subscription handler.
#[derive(Debug, Clone, Default)]
pub struct Event {
	/// Positional event payload.
	pub args: Args,
	/// Keyword event payload.
	pub kwargs: Kwargs,
	/// Event details from the router.
	pub details: Dict,
	/// Router-assigned id of this publication.
	pub publication_id: u64,
}

/// A live procedure registration.
///
/// Returned by [`Session::register`]; the id is router-assigned and
/// distinct from the request id that created it.
#[derive(Debug)]
pub struct Registration {
	id: u64,
	session: Session,
}

impl Registration {
	/// The router-assigned registration id.
	pub fn id(&self) -> u64 {
		self.id
	}

	/// Unregisters this procedure. Equivalent to
	/// [`Session::unregister`] with [`id`](Self::id).
	pub async fn unregister(&self) -> Result<()> {
		self.session.unregister(self.id).await
	}
}

/// A live topic subscription.
#[derive(Debug)]
pub struct Subscription {
	id: u64,
	session: Session,
}

impl Subscription {
	/// The router-assigned subscription id.
	pub fn id(&self) -> u64 {
		self.id
	}

	/// Unsubscribes from the topic. Equivalent to
	/// [`Session::unsubscribe`] with [`id`](Self::id).
	pub async fn unsubscribe(&self) -> Result<()> {
		self.session.unsubscribe(self.id).await
	}
}

/// Pending register: the handler only goes live once REGISTERED arrives.
struct PendingRegister {
	handler: ProcedureHandler,
	waiter: oneshot::Sender<Result<u64>>,
}

/// Pending unregister: remembers which registration to drop on success.
struct PendingUnregister {
	registration_id: u64,
	waiter: oneshot::Sender<Result<()>>,
}

struct PendingSubscribe {
	handler: EventHandler,
	waiter: oneshot::Sender<Result<u64>>,
}

struct PendingUnsubscribe {
	subscription_id: u64,
	waiter: oneshot::Sender<Result<()>>,
}

/// All mutable session state, guarded by one mutex (single-writer
/// discipline).
#[derive(Default)]
struct State {
	connected: bool,
	pending_calls: HashMap<u64, oneshot::Sender<Result<CallResult>>>,
	pending_registers: HashMap<u64, PendingRegister>,
	pending_unregisters: HashMap<u64, PendingUnregister>,
	pending_subscribes: HashMap<u64, PendingSubscribe>,
	pending_unsubscribes: HashMap<u64, PendingUnsubscribe>,
	pending_publishes: HashMap<u64, oneshot::Sender<Result<()>>>,
	registrations: HashMap<u64, ProcedureHandler>,
	subscriptions: HashMap<u64, EventHandler>,
	goodbye: Option<oneshot::Sender<()>>,
}

/// Whether the receive loop should keep running after a dispatch.
enum Flow {
	Continue,
	Closed,
}

/// A connected WAMP session.
///
/// Cheap to clone; all clones share the same connection and state. The
/// receive loop runs on its own task from construction until GOODBYE or
/// transport death.
#[derive(Clone)]
pub struct Session {
	inner: Arc<SessionInner>,
}

struct SessionInner {
	transport: Arc<dyn Transport>,
	serializer: Arc<dyn Serializer>,
	details: SessionDetails,
	ids: RequestIdGenerator,
	state: Mutex<State>,
	/// Signalled by teardown so a receive loop blocked on the transport
	/// exits promptly.
	closed: Notify,
}

impl Session {
	/// Wraps an established connection and starts its receive loop.
	pub fn new(base: BaseSession) -> Self {
		let transport = Arc::clone(base.transport());
		let serializer = Arc::clone(base.serializer());
		let details = base.details().clone();

		let inner = Arc::new(SessionInner {
			transport,
			serializer,
			details,
			ids: RequestIdGenerator::new(),
			state: Mutex::new(State {
				connected: true,
				..State::default()
			}),
			closed: Notify::new(),
		});

		tokio::spawn(receive_loop(Arc::clone(&inner)));

		Self { inner }
	}

	/// Router-assigned session id.
	pub fn id(&self) -> u64 {
		self.inner.details.session_id
	}

	/// The realm this session joined.
	pub fn realm(&self) -> &str {
		&self.inner.details.realm
	}

	/// Authenticated identity.
	pub fn auth_id(&self) -> &str {
		&self.inner.details.auth_id
	}

	/// Role the router assigned to this identity.
	pub fn auth_role(&self) -> &str {
		&self.inner.details.auth_role
	}

	/// Returns `true` until GOODBYE or transport death.
	pub fn is_connected(&self) -> bool {
		self.inner.state.lock().connected
	}

	/// Draws the next request id from this session's sequence.
	pub fn next_request_id(&self) -> u64 {
		self.inner.ids.next()
	}

	/// Calls a remote procedure and waits for its result.
	pub async fn call(
		&self,
		procedure: &str,
		args: Args,
		kwargs: Kwargs,
		options: CallOptions,
	) -> Result<CallResult> {
		let request_id = self.inner.ids.next();
		let (tx, rx) = oneshot::channel();
		{
			let mut state = self.inner.state.lock();
			if !state.connected {
				return Err(Error::SessionClosed);
			}
			state.pending_calls.insert(request_id, tx);
		}

		let message = Message::Call {
			request_id,
			options: options.to_dict(),
			procedure: procedure.to_string(),
			args,
			kwargs,
		};
		if let Err(e) = self.inner.send(&message).await {
			self.inner.state.lock().pending_calls.remove(&request_id);
			return Err(e);
		}

		rx.await.map_err(|_| Error::SessionClosed)?
	}

	/// Registers a procedure and waits for the router's confirmation.
	///
	/// The handler runs inline on the receive loop: while it executes, no
	/// further inbound messages are dispatched, and its YIELD is sent
	/// before the next INVOCATION is read. A handler must therefore not
	/// await this session's own round trips.
	pub async fn register(
		&self,
		procedure: &str,
		handler: ProcedureHandler,
		options: RegisterOptions,
	) -> Result<Registration> {
		let request_id = self.inner.ids.next();
		let (tx, rx) = oneshot::channel();
		{
			let mut state = self.inner.state.lock();
			if !state.connected {
				return Err(Error::SessionClosed);
			}
			state
				.pending_registers
				.insert(request_id, PendingRegister { handler, waiter: tx });
		}

		let message = Message::Register {
			request_id,
			options: options.to_dict(),
			procedure: procedure.to_string(),
		};
		if let Err(e) = self.inner.send(&message).await {
			self.inner.state.lock().pending_registers.remove(&request_id);
			return Err(e);
		}

		let registration_id = rx.await.map_err(|_| Error::SessionClosed)??;
		Ok(Registration {
			id: registration_id,
			session: self.clone(),
		})
	}

	/// Unregisters a procedure by its registration id.
	///
	/// On a peer-reported error the registration stays live; it is only
	/// removed once the router confirms with UNREGISTERED.
	pub async fn unregister(&self, registration_id: u64) -> Result<()> {
		let request_id = self.inner.ids.next();
		let (tx, rx) = oneshot::channel();
		{
			let mut state = self.inner.state.lock();
			if !state.connected {
				return Err(Error::SessionClosed);
			}
			state.pending_unregisters.insert(
				request_id,
				PendingUnregister {
					registration_id,
					waiter: tx,
				},
			);
		}

		let message = Message::Unregister {
			request_id,
			registration_id,
		};
		if let Err(e) = self.inner.send(&message).await {
			self.inner
				.state
				.lock()
				.pending_unregisters
				.remove(&request_id);
			return Err(e);
		}

		rx.await.map_err(|_| Error::SessionClosed)?
	}

	/// Publishes an event to a topic.
	///
	/// Without [`PublishOptions::acknowledge`] this returns as soon as the
	/// message is sent; with it, it waits for the router's PUBLISHED (or
	/// fails with the router's error).
	pub async fn publish(
		&self,
		topic: &str,
		args: Args,
		kwargs: Kwargs,
		options: PublishOptions,
	) -> Result<()> {
		let request_id = self.inner.ids.next();
		let acknowledge = options.wants_acknowledge();

		let rx = {
			let mut state = self.inner.state.lock();
			if !state.connected {
				return Err(Error::SessionClosed);
			}
			if acknowledge {
				let (tx, rx) = oneshot::channel();
				state.pending_publishes.insert(request_id, tx);
				Some(rx)
			} else {
				None
			}
		};

		let message = Message::Publish {
			request_id,
			options: options.to_dict(),
			topic: topic.to_string(),
			args,
			kwargs,
		};
		if let Err(e) = self.inner.send(&message).await {
			if acknowledge {
				self.inner.state.lock().pending_publishes.remove(&request_id);
			}
			return Err(e);
		}

		match rx {
			Some(rx) => rx.await.map_err(|_| Error::SessionClosed)?,
			None => Ok(()),
		}
	}

	/// Subscribes to a topic and waits for the router's confirmation.
	///
	/// The handler runs inline on the receive loop, like a procedure
	/// handler.
	pub async fn subscribe(
		&self,
		topic: &str,
		handler: EventHandler,
		options: SubscribeOptions,
	) -> Result<Subscription> {
		let request_id = self.inner.ids.next();
		let (tx, rx) = oneshot::channel();
		{
			let mut state = self.inner.state.lock();
			if !state.connected {
				return Err(Error::SessionClosed);
			}
			state
				.pending_subscribes
				.insert(request_id, PendingSubscribe { handler, waiter: tx });
		}

		let message = Message::Subscribe {
			request_id,
			options: options.to_dict(),
			topic: topic.to_string(),
		};
		if let Err(e) = self.inner.send(&message).await {
			self.inner.state.lock().pending_subscribes.remove(&request_id);
			return Err(e);
		}

		let subscription_id = rx.await.map_err(|_| Error::SessionClosed)??;
		Ok(Subscription {
			id: subscription_id,
			session: self.clone(),
		})
	}

	/// Unsubscribes from a topic by its subscription id.
	///
	/// Mirrors [`unregister`](Self::unregister): a peer-reported error
	/// leaves the subscription live.
	pub async fn unsubscribe(&self, subscription_id: u64) -> Result<()> {
		let request_id = self.inner.ids.next();
		let (tx, rx) = oneshot::channel();
		{
			let mut state = self.inner.state.lock();
			if !state.connected {
				return Err(Error::SessionClosed);
			}
			state.pending_unsubscribes.insert(
				request_id,
				PendingUnsubscribe {
					subscription_id,
					waiter: tx,
				},
			);
		}

		let message = Message::Unsubscribe {
			request_id,
			subscription_id,
		};
		if let Err(e) = self.inner.send(&message).await {
			self.inner
				.state
				.lock()
				.pending_unsubscribes
				.remove(&request_id);
			return Err(e);
		}

		rx.await.map_err(|_| Error::SessionClosed)?
	}

	/// Leaves the realm: sends GOODBYE and waits for the peer's answering
	/// GOODBYE (two-phase close), bounded by a 10-second timeout.
	///
	/// Whatever the peer does, the session is closed when this returns:
	/// every outstanding operation fails with `SessionClosed` and further
	/// operations are rejected without touching the transport.
	pub async fn leave(&self) -> Result<()> {
		let (tx, rx) = oneshot::channel();
		{
			let mut state = self.inner.state.lock();
			// A second concurrent leave would clobber the parked waiter.
			if !state.connected || state.goodbye.is_some() {
				return Err(Error::SessionClosed);
			}
			state.goodbye = Some(tx);
		}

		let message = Message::Goodbye {
			details: Dict::new(),
			reason: uri::CLOSE_REALM.to_string(),
		};
		if let Err(e) = self.inner.send(&message).await {
			// The transport is already dead; the receive loop will tear
			// the session down.
			self.inner.state.lock().goodbye = None;
			return Err(e);
		}

		match tokio::time::timeout(GOODBYE_TIMEOUT, rx).await {
			// Peer answered; the receive loop already tore down.
			Ok(Ok(())) => Ok(()),
			// Torn down underneath us (transport death). Closed either way.
			Ok(Err(_)) => Ok(()),
			Err(_) => {
				tracing::warn!("peer did not answer GOODBYE; closing session anyway");
				self.inner.teardown().await;
				Ok(())
			}
		}
	}
}

impl std::fmt::Debug for Session {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("Session")
			.field("session_id", &self.inner.details.session_id)
			.field("realm", &self.inner.details.realm)
			.field("connected", &self.is_connected())
			.finish()
	}
}

impl SessionInner {
	async fn send(&self, message: &Message) -> Result<()> {
		tracing::debug!(code = ?message.type_code(), "sending message");
		let payload = self.serializer.serialize(message)?;
		self.transport.send(payload).await
	}

	/// Closes the session exactly once: flips the connected flag, fails
	/// every outstanding waiter, resolves a parked goodbye waiter, and
	/// closes the transport.
	async fn teardown(&self) {
		let goodbye = {
			let mut state = self.state.lock();
			if !state.connected {
				return;
			}
			state.connected = false;
			drain_pending(&mut state);
			state.registrations.clear();
			state.subscriptions.clear();
			state.goodbye.take()
		};
		if let Some(tx) = goodbye {
			let _ = tx.send(());
		}
		let _ = self.transport.close().await;
		self.closed.notify_one();
	}

	/// Routes one inbound message. Errors are protocol violations the
	/// loop logs; they never kill the session.
	async fn dispatch(&self, message: Message) -> Result<Flow> {
		match message {
			Message::Result {
				request_id,
				details,
				args,
				kwargs,
			} => {
				let waiter = self.state.lock().pending_calls.remove(&request_id);
				match waiter {
					Some(tx) => {
						let _ = tx.send(Ok(CallResult {
							args,
							kwargs,
							details,
						}));
					}
					// Abandoned caller or router bug; dropped either way.
					None => {
						tracing::debug!(request_id, "RESULT for no pending call, dropped")
					}
				}
				Ok(Flow::Continue)
			}

			Message::Registered {
				request_id,
				registration_id,
			} => {
				let pending = self.state.lock().pending_registers.remove(&request_id);
				let Some(PendingRegister { handler, waiter }) = pending else {
					return Err(Error::Protocol(format!(
						"REGISTERED for unknown request {request_id}"
					)));
				};
				self.state
					.lock()
					.registrations
					.insert(registration_id, handler);
				let _ = waiter.send(Ok(registration_id));
				Ok(Flow::Continue)
			}

			Message::Unregistered { request_id } => {
				let pending = self.state.lock().pending_unregisters.remove(&request_id);
				let Some(PendingUnregister {
					registration_id,
					waiter,
				}) = pending
				else {
					return Err(Error::Protocol(format!(
						"UNREGISTERED for unknown request {request_id}"
					)));
				};
				self.state.lock().registrations.remove(&registration_id);
				let _ = waiter.send(Ok(()));
				Ok(Flow::Continue)
			}

			Message::Published { request_id, .. } => {
				let waiter = self.state.lock().pending_publishes.remove(&request_id);
				let Some(tx) = waiter else {
					return Err(Error::Protocol(format!(
						"PUBLISHED for unknown request {request_id}"
					)));
				};
				let _ = tx.send(Ok(()));
				Ok(Flow::Continue)
			}

			Message::Subscribed {
				request_id,
				subscription_id,
			} => {
				let pending = self.state.lock().pending_subscribes.remove(&request_id);
				let Some(PendingSubscribe { handler, waiter }) = pending else {
					return Err(Error::Protocol(format!(
						"SUBSCRIBED for unknown request {request_id}"
					)));
				};
				self.state
					.lock()
					.subscriptions
					.insert(subscription_id, handler);
				let _ = waiter.send(Ok(subscription_id));
				Ok(Flow::Continue)
			}

			Message::Unsubscribed { request_id } => {
				let pending = self.state.lock().pending_unsubscribes.remove(&request_id);
				let Some(PendingUnsubscribe {
					subscription_id,
					waiter,
				}) = pending
				else {
					return Err(Error::Protocol(format!(
						"UNSUBSCRIBED for unknown request {request_id}"
					)));
				};
				self.state.lock().subscriptions.remove(&subscription_id);
				let _ = waiter.send(Ok(()));
				Ok(Flow::Continue)
			}

			Message::Event {
				subscription_id,
				publication_id,
				details,
				args,
				kwargs,
			} => {
				let handler = self
					.state
					.lock()
					.subscriptions
					.get(&subscription_id)
					.cloned();
				match handler {
					Some(handler) => {
						let event = Event {
							args,
							kwargs,
							details,
							publication_id,
						};
						if let Err(e) = handler(event).await {
							tracing::warn!(subscription_id, "event handler failed: {e}");
						}
					}
					None => tracing::debug!(
						subscription_id,
						"EVENT for unknown subscription, ignored"
					),
				}
				Ok(Flow::Continue)
			}

			Message::Invocation {
				request_id,
				registration_id,
				details,
				args,
				kwargs,
			} => {
				let handler = self
					.state
					.lock()
					.registrations
					.get(&registration_id)
					.cloned();
				let Some(handler) = handler else {
					tracing::debug!(
						registration_id,
						"INVOCATION for unknown registration, ignored"
					);
					return Ok(Flow::Continue);
				};

				let invocation = Invocation {
					args,
					kwargs,
					details,
				};
				let reply = match handler(invocation).await {
					Ok(result) => Message::Yield {
						request_id,
						options: result.details,
						args: result.args,
						kwargs: result.kwargs,
					},
					Err(Error::Application { uri, args, kwargs }) => Message::Error {
						request_type: code::INVOCATION,
						request_id,
						details: Dict::new(),
						error: uri,
						args,
						kwargs,
					},
					Err(e) => Message::Error {
						request_type: code::INVOCATION,
						request_id,
						details: Dict::new(),
						error: uri::RUNTIME_ERROR.to_string(),
						args: vec![serde_json::Value::String(e.to_string())],
						kwargs: Kwargs::new(),
					},
				};
				if let Err(e) = self.send(&reply).await {
					tracing::warn!(request_id, "failed to answer invocation: {e}");
				}
				Ok(Flow::Continue)
			}

			Message::Error {
				request_type,
				request_id,
				error,
				args,
				kwargs,
				..
			} => {
				self.route_error(request_type, request_id, error, args, kwargs)?;
				Ok(Flow::Continue)
			}

			Message::Goodbye { reason, .. } => {
				tracing::debug!(%reason, "peer sent GOODBYE");
				let leaving = self.state.lock().goodbye.is_some();
				if !leaving {
					// Peer-initiated close: echo before tearing down.
					let reply = Message::Goodbye {
						details: Dict::new(),
						reason: uri::GOODBYE_AND_OUT.to_string(),
					};
					let _ = self.send(&reply).await;
				}
				self.teardown().await;
				Ok(Flow::Closed)
			}

			Message::Unknown(value) => {
				tracing::debug!(%value, "unknown message variant, ignored");
				Ok(Flow::Continue)
			}

			// Messages a client never receives mid-session (HELLO,
			// WELCOME, CALL, ...): ignored, non-fatal.
			other => {
				tracing::debug!(code = ?other.type_code(), "unexpected message, ignored");
				Ok(Flow::Continue)
			}
		}
	}

	/// Routes an ERROR to the pending map its originating type names.
	fn route_error(
		&self,
		request_type: u64,
		request_id: u64,
		error: String,
		args: Args,
		kwargs: Kwargs,
	) -> Result<()> {
		let app_error = || Error::Application {
			uri: error.clone(),
			args: args.clone(),
			kwargs: kwargs.clone(),
		};
		let unknown = || {
			Error::Protocol(format!(
				"ERROR for unknown request {request_id} (type {request_type})"
			))
		};

		let mut state = self.state.lock();
		match request_type {
			code::CALL => {
				let tx = state.pending_calls.remove(&request_id).ok_or_else(unknown)?;
				let _ = tx.send(Err(app_error()));
			}
			code::REGISTER => {
				// The handler never went live; dropping it here discards it.
				let pending = state
					.pending_registers
					.remove(&request_id)
					.ok_or_else(unknown)?;
				let _ = pending.waiter.send(Err(app_error()));
			}
			code::UNREGISTER => {
				// The registration stays live on a failed unregister.
				let pending = state
					.pending_unregisters
					.remove(&request_id)
					.ok_or_else(unknown)?;
				let _ = pending.waiter.send(Err(app_error()));
			}
			code::PUBLISH => {
				let tx = state
					.pending_publishes
					.remove(&request_id)
					.ok_or_else(unknown)?;
				let _ = tx.send(Err(app_error()));
			}
			code::SUBSCRIBE => {
				let pending = state
					.pending_subscribes
					.remove(&request_id)
					.ok_or_else(unknown)?;
				let _ = pending.waiter.send(Err(app_error()));
			}
			code::UNSUBSCRIBE => {
				// The subscription stays live on a failed unsubscribe.
				let pending = state
					.pending_unsubscribes
					.remove(&request_id)
					.ok_or_else(unknown)?;
				let _ = pending.waiter.send(Err(app_error()));
			}
			other => {
				return Err(Error::Protocol(format!(
					"ERROR with unexpected originating type {other}"
				)));
			}
		}
		Ok(())
	}
}

/// Fails every outstanding waiter with `SessionClosed`, exactly once each.
fn drain_pending(state: &mut State) {
	for (_, tx) in state.pending_calls.drain() {
		let _ = tx.send(Err(Error::SessionClosed));
	}
	for (_, pending) in state.pending_registers.drain() {
		let _ = pending.waiter.send(Err(Error::SessionClosed));
	}
	for (_, pending) in state.pending_unregisters.drain() {
		let _ = pending.waiter.send(Err(Error::SessionClosed));
	}
	for (_, pending) in state.pending_subscribes.drain() {
		let _ = pending.waiter.send(Err(Error::SessionClosed));
	}
	for (_, pending) in state.pending_unsubscribes.drain() {
		let _ = pending.waiter.send(Err(Error::SessionClosed));
	}
	for (_, tx) in state.pending_publishes.drain() {
		let _ = tx.send(Err(Error::SessionClosed));
	}
}

/// The perpetual receive loop: one per session, alive until GOODBYE or a
/// fatal transport error.
async fn receive_loop(inner: Arc<SessionInner>) {
	loop {
		let payload = tokio::select! {
			received = inner.transport.receive() => match received {
				Ok(payload) => payload,
				Err(e) => {
					tracing::error!("transport failed, closing session: {e}");
					inner.teardown().await;
					break;
				}
			},
			() = inner.closed.notified() => break,
		};

		let message = match inner.serializer.deserialize(&payload) {
			Ok(message) => message,
			// A single malformed message is skipped; only transport
			// death ends the loop.
			Err(e) => {
				tracing::warn!("undecodable message skipped: {e}");
				continue;
			}
		};

		match inner.dispatch(message).await {
			Ok(Flow::Continue) => {}
			Ok(Flow::Closed) => break,
			Err(e) => tracing::warn!("{e}"),
		}
	}
}
