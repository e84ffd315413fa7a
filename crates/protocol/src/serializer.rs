//! Message serializers and the transport payload they produce.
//!
//! A [`Serializer`] maps typed [`Message`]s to and from the opaque
//! [`Payload`]s a transport carries, and names the WebSocket sub-protocol
//! it negotiates. The shipped implementation is JSON; msgpack/CBOR codecs
//! would implement the same trait with binary payloads.

use thiserror::Error;

use crate::message::{Message, MessageError};

/// An encoded message as it travels over a transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Payload {
	/// Text frame (JSON codec).
	Text(String),
	/// Binary frame (msgpack/CBOR codecs).
	Binary(Vec<u8>),
}

/// Error produced while encoding or decoding a payload.
#[derive(Debug, Error)]
pub enum CodecError {
	/// The payload bytes are not valid for this codec.
	#[error("malformed payload: {0}")]
	Malformed(#[from] serde_json::Error),

	/// The payload decoded, but not to a well-formed WAMP message.
	#[error(transparent)]
	Message(#[from] MessageError),

	/// The payload frame type does not match the codec (e.g. a binary
	/// frame handed to the JSON codec).
	#[error("unexpected {0} frame for this codec")]
	UnexpectedFrame(&'static str),
}

/// Maps typed messages to and from transport payloads.
pub trait Serializer: Send + Sync {
	/// Encodes a message into a payload.
	fn serialize(&self, message: &Message) -> Result<Payload, CodecError>;

	/// Decodes a payload into a message.
	fn deserialize(&self, payload: &Payload) -> Result<Message, CodecError>;

	/// The WebSocket sub-protocol identifier negotiated for this codec.
	fn sub_protocol(&self) -> &'static str;
}

/// JSON codec: text frames, sub-protocol `wamp.2.json`.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonSerializer;

impl Serializer for JsonSerializer {
	fn serialize(&self, message: &Message) -> Result<Payload, CodecError> {
		Ok(Payload::Text(serde_json::to_string(&message.to_value())?))
	}

	fn deserialize(&self, payload: &Payload) -> Result<Message, CodecError> {
		let Payload::Text(text) = payload else {
			return Err(CodecError::UnexpectedFrame("binary"));
		};
		Ok(Message::from_value(serde_json::from_str(text)?)?)
	}

	fn sub_protocol(&self) -> &'static str {
		"wamp.2.json"
	}
}
