//! WAMP session runtime - transport, handshake, and message correlation.
//!
//! This crate provides the low-level runtime for speaking WAMP with a
//! router over a persistent connection:
//!
//! - **Transport**: bidirectional payload delivery over WebSocket (or an
//!   in-process pair)
//! - **Joiner**: the HELLO / CHALLENGE / AUTHENTICATE / WELCOME handshake
//! - **Session**: request/response correlation, handler dispatch, and the
//!   perpetual receive loop
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────┐
//! │   wamp-rs   │  Client facade (Client, re-exports)
//! └──────┬──────┘
//!        │
//! ┌──────▼──────┐
//! │ wamp-runtime│  This crate
//! │  ┌────────┐ │
//! │  │Session │ │  id correlation + dispatch
//! │  └────────┘ │
//! │  ┌────────┐ │
//! │  │ Joiner │ │  session establishment
//! │  └────────┘ │
//! │  ┌────────┐ │
//! │  │ Trans  │ │  WebSocket / memory transport
//! │  └────────┘ │
//! └──────┬──────┘
//!        │
//! ┌──────▼──────┐
//! │wamp-protocol│  Wire messages + serializers
//! └─────────────┘
//! ```

pub mod auth;
pub mod error;
pub mod id;
pub mod joiner;
pub mod session;
pub mod transport;

// Re-export key types at crate root
pub use auth::{AnonymousAuthenticator, Authenticator, TicketAuthenticator};
pub use error::{Error, Result};
pub use id::RequestIdGenerator;
pub use joiner::{BaseSession, SessionDetails, SessionJoiner};
pub use session::{
	CallResult, Event, EventHandler, HandlerFuture, Invocation, ProcedureHandler, Registration,
	Session, Subscription,
};
pub use transport::{MemoryTransport, Transport, WebSocketTransport, memory_pair};
