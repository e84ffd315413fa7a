//! End-to-end tests: a scripted in-process router on the far end of a
//! memory transport pair, driven through the public `wamp` API.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use serde_json::json;
use wamp::{
	Args, CallOptions, CallResult, Client, Dict, Error, Event, EventHandler, HandlerFuture,
	Invocation, JsonSerializer, Kwargs, ProcedureHandler, PublishOptions, RegisterOptions,
	Serializer, SubscribeOptions, Transport, memory_pair, uri,
};
use wamp_protocol::{Message, code};
use wamp_runtime::MemoryTransport;

struct ScriptedRouter {
	transport: Arc<MemoryTransport>,
}

impl ScriptedRouter {
	async fn receive(&self) -> Message {
		let payload = tokio::time::timeout(Duration::from_secs(1), self.transport.receive())
			.await
			.expect("router receive timed out")
			.unwrap();
		JsonSerializer.deserialize(&payload).unwrap()
	}

	async fn send(&self, message: &Message) {
		let payload = JsonSerializer.serialize(message).unwrap();
		self.transport.send(payload).await.unwrap();
	}

	/// Answers the client's HELLO with a WELCOME.
	async fn accept_join(&self, session_id: u64) {
		let hello = self.receive().await;
		let Message::Hello { .. } = hello else {
			panic!("expected HELLO, got {hello:?}");
		};
		let mut details = Dict::new();
		details.insert("authid".into(), json!("anonymous-1"));
		details.insert("authrole".into(), json!("anonymous"));
		self.send(&Message::Welcome {
			session_id,
			details,
		})
		.await;
	}
}

/// Connects a client session to a scripted router over a memory pair.
async fn connect_pair() -> (wamp::Session, ScriptedRouter) {
	let (near, far) = memory_pair();
	let router = ScriptedRouter {
		transport: Arc::new(far),
	};

	let joining = tokio::spawn(async move {
		Client::new()
			.connect_transport(Arc::new(near) as Arc<dyn Transport>, "realm1")
			.await
	});
	router.accept_join(7001).await;
	let session = joining.await.unwrap().unwrap();
	(session, router)
}

fn echo_handler() -> ProcedureHandler {
	Arc::new(|invocation: Invocation| -> HandlerFuture<CallResult> {
		Box::pin(async move {
			Ok(CallResult {
				args: invocation.args,
				kwargs: invocation.kwargs,
				..CallResult::default()
			})
		})
	})
}

#[tokio::test]
async fn join_exposes_session_identity() {
	let (session, _router) = connect_pair().await;
	assert_eq!(session.id(), 7001);
	assert_eq!(session.realm(), "realm1");
	assert_eq!(session.auth_id(), "anonymous-1");
	assert_eq!(session.auth_role(), "anonymous");
	assert!(session.is_connected());
}

#[tokio::test]
async fn call_round_trip_through_the_router() {
	let (session, router) = connect_pair().await;

	let calling = tokio::spawn({
		let session = session.clone();
		async move {
			session
				.call(
					"com.example.add",
					vec![json!(2), json!(3)],
					Kwargs::new(),
					CallOptions::new(),
				)
				.await
		}
	});

	let Message::Call {
		request_id,
		procedure,
		args,
		..
	} = router.receive().await
	else {
		panic!("expected CALL");
	};
	assert_eq!(procedure, "com.example.add");
	let sum = args[0].as_i64().unwrap() + args[1].as_i64().unwrap();
	router
		.send(&Message::Result {
			request_id,
			details: Dict::new(),
			args: vec![json!(sum)],
			kwargs: Kwargs::new(),
		})
		.await;

	let result = calling.await.unwrap().unwrap();
	assert_eq!(result.args, vec![json!(5)]);
}

#[tokio::test]
async fn registered_procedure_serves_calls_until_unregistered() {
	let (session, router) = connect_pair().await;

	// Register; the router confirms.
	let registering = tokio::spawn({
		let session = session.clone();
		async move {
			session
				.register("com.example.echo", echo_handler(), RegisterOptions::new())
				.await
		}
	});
	let Message::Register { request_id, .. } = router.receive().await else {
		panic!("expected REGISTER");
	};
	router
		.send(&Message::Registered {
			request_id,
			registration_id: 300,
		})
		.await;
	let registration = registering.await.unwrap().unwrap();

	// First call: the router routes it back into this session's handler
	// as an INVOCATION, then relays the YIELD as the RESULT.
	let calling = tokio::spawn({
		let session = session.clone();
		async move {
			session
				.call(
					"com.example.echo",
					vec![json!("round trip")],
					Kwargs::new(),
					CallOptions::new(),
				)
				.await
		}
	});
	let Message::Call {
		request_id: call_id,
		args,
		..
	} = router.receive().await
	else {
		panic!("expected CALL");
	};
	router
		.send(&Message::Invocation {
			request_id: 9100,
			registration_id: 300,
			details: Dict::new(),
			args,
			kwargs: Kwargs::new(),
		})
		.await;
	let Message::Yield {
		request_id: yield_id,
		args,
		..
	} = router.receive().await
	else {
		panic!("expected YIELD");
	};
	assert_eq!(yield_id, 9100);
	router
		.send(&Message::Result {
			request_id: call_id,
			details: Dict::new(),
			args,
			kwargs: Kwargs::new(),
		})
		.await;
	let result = calling.await.unwrap().unwrap();
	assert_eq!(result.args, vec![json!("round trip")]);

	// Unregister; the router confirms and forgets the procedure.
	let unregistering = tokio::spawn(async move { registration.unregister().await });
	let Message::Unregister { request_id, .. } = router.receive().await else {
		panic!("expected UNREGISTER");
	};
	router.send(&Message::Unregistered { request_id }).await;
	unregistering.await.unwrap().unwrap();

	// Second call: no live registration, the router reports the error.
	let calling = tokio::spawn({
		let session = session.clone();
		async move {
			session
				.call("com.example.echo", Args::new(), Kwargs::new(), CallOptions::new())
				.await
		}
	});
	let Message::Call { request_id, .. } = router.receive().await else {
		panic!("expected CALL");
	};
	router
		.send(&Message::Error {
			request_type: code::CALL,
			request_id,
			details: Dict::new(),
			error: uri::NO_SUCH_PROCEDURE.into(),
			args: Args::new(),
			kwargs: Kwargs::new(),
		})
		.await;
	let err = calling.await.unwrap().unwrap_err();
	assert_eq!(err.error_uri(), Some(uri::NO_SUCH_PROCEDURE));
}

#[tokio::test]
async fn publish_and_receive_own_event() {
	let (session, router) = connect_pair().await;
	let seen: Arc<Mutex<Vec<Args>>> = Arc::new(Mutex::new(Vec::new()));

	// Subscribe; the router confirms.
	let handler: EventHandler = {
		let seen = Arc::clone(&seen);
		Arc::new(move |event: Event| -> HandlerFuture<()> {
			let seen = Arc::clone(&seen);
			Box::pin(async move {
				seen.lock().push(event.args);
				Ok(())
			})
		})
	};
	let subscribing = tokio::spawn({
		let session = session.clone();
		async move {
			session
				.subscribe("com.example.updates", handler, SubscribeOptions::new())
				.await
		}
	});
	let Message::Subscribe { request_id, .. } = router.receive().await else {
		panic!("expected SUBSCRIBE");
	};
	router
		.send(&Message::Subscribed {
			request_id,
			subscription_id: 70,
		})
		.await;
	let subscription = subscribing.await.unwrap().unwrap();

	// Acknowledged publish; the router fans the event back to us.
	let publishing = tokio::spawn({
		let session = session.clone();
		async move {
			session
				.publish(
					"com.example.updates",
					vec![json!("breaking news")],
					Kwargs::new(),
					PublishOptions::new().acknowledge(true).exclude_me(false),
				)
				.await
		}
	});
	let Message::Publish {
		request_id, args, ..
	} = router.receive().await
	else {
		panic!("expected PUBLISH");
	};
	router
		.send(&Message::Published {
			request_id,
			publication_id: 555,
		})
		.await;
	router
		.send(&Message::Event {
			subscription_id: 70,
			publication_id: 555,
			details: Dict::new(),
			args,
			kwargs: Kwargs::new(),
		})
		.await;
	publishing.await.unwrap().unwrap();

	// Unsubscribe so delivery is confirmed complete before asserting.
	let unsubscribing = tokio::spawn(async move { subscription.unsubscribe().await });
	let Message::Unsubscribe { request_id, .. } = router.receive().await else {
		panic!("expected UNSUBSCRIBE");
	};
	router.send(&Message::Unsubscribed { request_id }).await;
	unsubscribing.await.unwrap().unwrap();

	assert_eq!(*seen.lock(), vec![vec![json!("breaking news")]]);
}

#[tokio::test]
async fn leave_then_everything_fails_closed() {
	let (session, router) = connect_pair().await;

	let leaving = tokio::spawn({
		let session = session.clone();
		async move { session.leave().await }
	});
	let Message::Goodbye { reason, .. } = router.receive().await else {
		panic!("expected GOODBYE");
	};
	assert_eq!(reason, uri::CLOSE_REALM);
	router
		.send(&Message::Goodbye {
			details: Dict::new(),
			reason: uri::GOODBYE_AND_OUT.into(),
		})
		.await;
	leaving.await.unwrap().unwrap();

	assert!(!session.is_connected());
	for err in [
		session
			.call("com.example.x", Args::new(), Kwargs::new(), CallOptions::new())
			.await
			.unwrap_err(),
		session
			.publish("com.example.x", Args::new(), Kwargs::new(), PublishOptions::new())
			.await
			.unwrap_err(),
		session
			.subscribe("com.example.x", noop_event_handler(), SubscribeOptions::new())
			.await
			.unwrap_err(),
		session
			.register("com.example.x", echo_handler(), RegisterOptions::new())
			.await
			.unwrap_err(),
	] {
		assert!(matches!(err, Error::SessionClosed), "got {err:?}");
	}
}

#[tokio::test]
async fn router_abort_fails_the_connect() {
	let (near, far) = memory_pair();
	let router = ScriptedRouter {
		transport: Arc::new(far),
	};

	let joining = tokio::spawn(async move {
		Client::new()
			.connect_transport(Arc::new(near) as Arc<dyn Transport>, "no-such-realm")
			.await
	});
	let Message::Hello { realm, .. } = router.receive().await else {
		panic!("expected HELLO");
	};
	assert_eq!(realm, "no-such-realm");
	router
		.send(&Message::Abort {
			details: Dict::new(),
			reason: "wamp.error.no_such_realm".into(),
		})
		.await;

	let err = joining.await.unwrap().unwrap_err();
	assert!(matches!(err, Error::Abort { .. }), "got {err:?}");
}

fn noop_event_handler() -> EventHandler {
	Arc::new(|_: Event| -> HandlerFuture<()> { Box::pin(async { Ok(()) }) })
}
