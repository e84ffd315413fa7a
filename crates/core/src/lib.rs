//! wamp: a WAMP client for Rust.
//!
//! One connected [`Session`] multiplexes four roles over a single
//! persistent connection: calling remote procedures, exposing procedures,
//! publishing events, and subscribing to topics.
//!
//! # Examples
//!
//! ## Call a remote procedure
//!
//! ```ignore
//! use wamp::{CallOptions, Client};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let session = Client::new()
//!         .connect("ws://localhost:8080/ws", "realm1")
//!         .await?;
//!
//!     let result = session
//!         .call(
//!             "com.example.add",
//!             vec![2.into(), 3.into()],
//!             Default::default(),
//!             CallOptions::new(),
//!         )
//!         .await?;
//!     println!("sum = {:?}", result.args);
//!
//!     session.leave().await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Expose a procedure and subscribe to a topic
//!
//! ```ignore
//! use std::sync::Arc;
//! use wamp::{
//!     CallResult, Client, HandlerFuture, Invocation, RegisterOptions, SubscribeOptions,
//! };
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let session = Client::new()
//!         .connect("ws://localhost:8080/ws", "realm1")
//!         .await?;
//!
//!     let registration = session
//!         .register(
//!             "com.example.echo",
//!             Arc::new(|inv: Invocation| -> HandlerFuture<CallResult> {
//!                 Box::pin(async move {
//!                     Ok(CallResult { args: inv.args, ..Default::default() })
//!                 })
//!             }),
//!             RegisterOptions::new(),
//!         )
//!         .await?;
//!
//!     let subscription = session
//!         .subscribe(
//!             "com.example.updates",
//!             Arc::new(|event| Box::pin(async move {
//!                 println!("update: {:?}", event.args);
//!                 Ok(())
//!             })),
//!             SubscribeOptions::new(),
//!         )
//!         .await?;
//!
//!     // ... later
//!     registration.unregister().await?;
//!     subscription.unsubscribe().await?;
//!     session.leave().await?;
//!     Ok(())
//! }
//! ```

mod client;

pub use client::Client;

// Protocol layer: options, payload aliases, codec seam.
pub use wamp_protocol::{
	Args, CallOptions, Dict, JsonSerializer, Kwargs, Payload, PublishOptions, RegisterOptions,
	Serializer, SubscribeOptions, uri,
};

// Runtime layer: session surface, handles, errors, seams.
pub use wamp_runtime::{
	AnonymousAuthenticator, Authenticator, CallResult, Error, Event, EventHandler, HandlerFuture,
	Invocation, ProcedureHandler, Registration, Result, Session, SessionDetails, Subscription,
	TicketAuthenticator, Transport, WebSocketTransport, memory_pair,
};
