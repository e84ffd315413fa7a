//! Wire types for the WAMP protocol.
//!
//! This crate contains the typed protocol messages, their positional-array
//! encoding, the codec seam, and the option dictionaries used for
//! communication with a WAMP router. These types represent the "protocol
//! layer" - the shapes of data as they appear on the wire.
//!
//! # Design Philosophy
//!
//! Types in this crate are:
//! - **Pure data**: No behavior beyond serialization/deserialization
//! - **1:1 with protocol**: Match the WAMP basic-profile message set
//! - **Stable**: Changes only when the wire protocol changes
//!
//! Session behavior (correlation, dispatch, handshake) lives in
//! `wamp-runtime`; the ergonomic client API lives in `wamp-rs`.

pub mod message;
pub mod options;
pub mod serializer;
pub mod types;

pub use message::{Message, MessageError, code};
pub use options::{CallOptions, PublishOptions, RegisterOptions, SubscribeOptions};
pub use serializer::{CodecError, JsonSerializer, Payload, Serializer};
pub use types::{Args, Dict, Kwargs, client_roles, uri};
