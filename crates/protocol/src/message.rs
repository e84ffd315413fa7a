//! Typed WAMP protocol messages and their wire encoding.
//!
//! Every WAMP message is a positional JSON array whose first element is a
//! numeric type code. Because the encoding is positional rather than keyed,
//! conversion to and from [`serde_json::Value`] is written by hand here
//! instead of derived: [`Message::to_value`] builds the array and
//! [`Message::from_value`] parses it back, validating arity and element
//! types for every recognized code.
//!
//! Messages with an unrecognized type code decode to [`Message::Unknown`]
//! so that new router features never kill a session; a recognized code with
//! a malformed body is a [`MessageError`].

use serde_json::{Map, Value, json};
use thiserror::Error;

use crate::types::{Args, Dict, Kwargs};

/// Message type codes from the WAMP basic profile.
pub mod code {
	pub const HELLO: u64 = 1;
	pub const WELCOME: u64 = 2;
	pub const ABORT: u64 = 3;
	pub const CHALLENGE: u64 = 4;
	pub const AUTHENTICATE: u64 = 5;
	pub const GOODBYE: u64 = 6;
	pub const ERROR: u64 = 8;
	pub const PUBLISH: u64 = 16;
	pub const PUBLISHED: u64 = 17;
	pub const SUBSCRIBE: u64 = 32;
	pub const SUBSCRIBED: u64 = 33;
	pub const UNSUBSCRIBE: u64 = 34;
	pub const UNSUBSCRIBED: u64 = 35;
	pub const EVENT: u64 = 36;
	pub const CALL: u64 = 48;
	pub const RESULT: u64 = 50;
	pub const REGISTER: u64 = 64;
	pub const REGISTERED: u64 = 65;
	pub const UNREGISTER: u64 = 66;
	pub const UNREGISTERED: u64 = 67;
	pub const INVOCATION: u64 = 68;
	pub const YIELD: u64 = 70;
}

/// Error produced when a wire value cannot be decoded as a WAMP message.
#[derive(Debug, Error)]
pub enum MessageError {
	/// The top-level value is not a non-empty array.
	#[error("message is not a non-empty array")]
	NotAnArray,

	/// The message array is shorter than its type code requires.
	#[error("message {code} has {len} elements, expected at least {expected}")]
	BadArity { code: u64, len: usize, expected: usize },

	/// An element has the wrong JSON type.
	#[error("message {code}: element {index} is not a {expected}")]
	BadElement {
		code: u64,
		index: usize,
		expected: &'static str,
	},
}

/// A decoded WAMP protocol message.
///
/// Field names follow the WAMP spec: `request_id` correlates a reply to the
/// request that produced it, while `registration_id` / `subscription_id` /
/// `publication_id` are router-assigned identifiers for live bindings.
#[derive(Debug, Clone, PartialEq)]
pub enum Message {
	Hello {
		realm: String,
		details: Dict,
	},
	Welcome {
		session_id: u64,
		details: Dict,
	},
	Abort {
		details: Dict,
		reason: String,
	},
	Challenge {
		auth_method: String,
		extra: Dict,
	},
	Authenticate {
		signature: String,
		extra: Dict,
	},
	Goodbye {
		details: Dict,
		reason: String,
	},
	Error {
		request_type: u64,
		request_id: u64,
		details: Dict,
		error: String,
		args: Args,
		kwargs: Kwargs,
	},
	Publish {
		request_id: u64,
		options: Dict,
		topic: String,
		args: Args,
		kwargs: Kwargs,
	},
	Published {
		request_id: u64,
		publication_id: u64,
	},
	Subscribe {
		request_id: u64,
		options: Dict,
		topic: String,
	},
	Subscribed {
		request_id: u64,
		subscription_id: u64,
	},
	Unsubscribe {
		request_id: u64,
		subscription_id: u64,
	},
	Unsubscribed {
		request_id: u64,
	},
	Event {
		subscription_id: u64,
		publication_id: u64,
		details: Dict,
		args: Args,
		kwargs: Kwargs,
	},
	Call {
		request_id: u64,
		options: Dict,
		procedure: String,
		args: Args,
		kwargs: Kwargs,
	},
	Result {
		request_id: u64,
		details: Dict,
		args: Args,
		kwargs: Kwargs,
	},
	Register {
		request_id: u64,
		options: Dict,
		procedure: String,
	},
	Registered {
		request_id: u64,
		registration_id: u64,
	},
	Unregister {
		request_id: u64,
		registration_id: u64,
	},
	Unregistered {
		request_id: u64,
	},
	Invocation {
		request_id: u64,
		registration_id: u64,
		details: Dict,
		args: Args,
		kwargs: Kwargs,
	},
	Yield {
		request_id: u64,
		options: Dict,
		args: Args,
		kwargs: Kwargs,
	},
	/// A message with a type code this client does not recognize.
	/// Carried whole so dispatch can log it and move on.
	Unknown(Value),
}

impl Message {
	/// Returns the numeric type code of this message, or `None` for
	/// [`Message::Unknown`].
	pub fn type_code(&self) -> Option<u64> {
		Some(match self {
			Message::Hello { .. } => code::HELLO,
			Message::Welcome { .. } => code::WELCOME,
			Message::Abort { .. } => code::ABORT,
			Message::Challenge { .. } => code::CHALLENGE,
			Message::Authenticate { .. } => code::AUTHENTICATE,
			Message::Goodbye { .. } => code::GOODBYE,
			Message::Error { .. } => code::ERROR,
			Message::Publish { .. } => code::PUBLISH,
			Message::Published { .. } => code::PUBLISHED,
			Message::Subscribe { .. } => code::SUBSCRIBE,
			Message::Subscribed { .. } => code::SUBSCRIBED,
			Message::Unsubscribe { .. } => code::UNSUBSCRIBE,
			Message::Unsubscribed { .. } => code::UNSUBSCRIBED,
			Message::Event { .. } => code::EVENT,
			Message::Call { .. } => code::CALL,
			Message::Result { .. } => code::RESULT,
			Message::Register { .. } => code::REGISTER,
			Message::Registered { .. } => code::REGISTERED,
			Message::Unregister { .. } => code::UNREGISTER,
			Message::Unregistered { .. } => code::UNREGISTERED,
			Message::Invocation { .. } => code::INVOCATION,
			Message::Yield { .. } => code::YIELD,
			Message::Unknown(_) => return None,
		})
	}

	/// Encodes this message as its positional wire array.
	pub fn to_value(&self) -> Value {
		match self {
			Message::Hello { realm, details } => {
				json!([code::HELLO, realm, details])
			}
			Message::Welcome { session_id, details } => {
				json!([code::WELCOME, session_id, details])
			}
			Message::Abort { details, reason } => {
				json!([code::ABORT, details, reason])
			}
			Message::Challenge { auth_method, extra } => {
				json!([code::CHALLENGE, auth_method, extra])
			}
			Message::Authenticate { signature, extra } => {
				json!([code::AUTHENTICATE, signature, extra])
			}
			Message::Goodbye { details, reason } => {
				json!([code::GOODBYE, details, reason])
			}
			Message::Error {
				request_type,
				request_id,
				details,
				error,
				args,
				kwargs,
			} => with_payload(
				json!([code::ERROR, request_type, request_id, details, error]),
				args,
				kwargs,
			),
			Message::Publish {
				request_id,
				options,
				topic,
				args,
				kwargs,
			} => with_payload(
				json!([code::PUBLISH, request_id, options, topic]),
				args,
				kwargs,
			),
			Message::Published {
				request_id,
				publication_id,
			} => json!([code::PUBLISHED, request_id, publication_id]),
			Message::Subscribe {
				request_id,
				options,
				topic,
			} => json!([code::SUBSCRIBE, request_id, options, topic]),
			Message::Subscribed {
				request_id,
				subscription_id,
			} => json!([code::SUBSCRIBED, request_id, subscription_id]),
			Message::Unsubscribe {
				request_id,
				subscription_id,
			} => json!([code::UNSUBSCRIBE, request_id, subscription_id]),
			Message::Unsubscribed { request_id } => {
				json!([code::UNSUBSCRIBED, request_id])
			}
			Message::Event {
				subscription_id,
				publication_id,
				details,
				args,
				kwargs,
			} => with_payload(
				json!([code::EVENT, subscription_id, publication_id, details]),
				args,
				kwargs,
			),
			Message::Call {
				request_id,
				options,
				procedure,
				args,
				kwargs,
			} => with_payload(
				json!([code::CALL, request_id, options, procedure]),
				args,
				kwargs,
			),
			Message::Result {
				request_id,
				details,
				args,
				kwargs,
			} => with_payload(json!([code::RESULT, request_id, details]), args, kwargs),
			Message::Register {
				request_id,
				options,
				procedure,
			} => json!([code::REGISTER, request_id, options, procedure]),
			Message::Registered {
				request_id,
				registration_id,
			} => json!([code::REGISTERED, request_id, registration_id]),
			Message::Unregister {
				request_id,
				registration_id,
			} => json!([code::UNREGISTER, request_id, registration_id]),
			Message::Unregistered { request_id } => {
				json!([code::UNREGISTERED, request_id])
			}
			Message::Invocation {
				request_id,
				registration_id,
				details,
				args,
				kwargs,
			} => with_payload(
				json!([code::INVOCATION, request_id, registration_id, details]),
				args,
				kwargs,
			),
			Message::Yield {
				request_id,
				options,
				args,
				kwargs,
			} => with_payload(json!([code::YIELD, request_id, options]), args, kwargs),
			Message::Unknown(value) => value.clone(),
		}
	}

	/// Decodes a wire array into a typed message.
	///
	/// Unrecognized type codes yield [`Message::Unknown`]; malformed bodies
	/// of recognized codes are errors.
	pub fn from_value(value: Value) -> Result<Message, MessageError> {
		let items = value.as_array().ok_or(MessageError::NotAnArray)?;
		let code = items
			.first()
			.and_then(Value::as_u64)
			.ok_or(MessageError::NotAnArray)?;

		let view = MessageView { code, items };
		let message = match code {
			code::HELLO => Message::Hello {
				realm: view.string(1)?,
				details: view.dict(2)?,
			},
			code::WELCOME => Message::Welcome {
				session_id: view.id(1)?,
				details: view.dict(2)?,
			},
			code::ABORT => Message::Abort {
				details: view.dict(1)?,
				reason: view.string(2)?,
			},
			code::CHALLENGE => Message::Challenge {
				auth_method: view.string(1)?,
				extra: view.dict(2)?,
			},
			code::AUTHENTICATE => Message::Authenticate {
				signature: view.string(1)?,
				extra: view.dict(2)?,
			},
			code::GOODBYE => Message::Goodbye {
				details: view.dict(1)?,
				reason: view.string(2)?,
			},
			code::ERROR => Message::Error {
				request_type: view.id(1)?,
				request_id: view.id(2)?,
				details: view.dict(3)?,
				error: view.string(4)?,
				args: view.args(5)?,
				kwargs: view.kwargs(6)?,
			},
			code::PUBLISH => Message::Publish {
				request_id: view.id(1)?,
				options: view.dict(2)?,
				topic: view.string(3)?,
				args: view.args(4)?,
				kwargs: view.kwargs(5)?,
			},
			code::PUBLISHED => Message::Published {
				request_id: view.id(1)?,
				publication_id: view.id(2)?,
			},
			code::SUBSCRIBE => Message::Subscribe {
				request_id: view.id(1)?,
				options: view.dict(2)?,
				topic: view.string(3)?,
			},
			code::SUBSCRIBED => Message::Subscribed {
				request_id: view.id(1)?,
				subscription_id: view.id(2)?,
			},
			code::UNSUBSCRIBE => Message::Unsubscribe {
				request_id: view.id(1)?,
				subscription_id: view.id(2)?,
			},
			code::UNSUBSCRIBED => Message::Unsubscribed {
				request_id: view.id(1)?,
			},
			code::EVENT => Message::Event {
				subscription_id: view.id(1)?,
				publication_id: view.id(2)?,
				details: view.dict(3)?,
				args: view.args(4)?,
				kwargs: view.kwargs(5)?,
			},
			code::CALL => Message::Call {
				request_id: view.id(1)?,
				options: view.dict(2)?,
				procedure: view.string(3)?,
				args: view.args(4)?,
				kwargs: view.kwargs(5)?,
			},
			code::RESULT => Message::Result {
				request_id: view.id(1)?,
				details: view.dict(2)?,
				args: view.args(3)?,
				kwargs: view.kwargs(4)?,
			},
			code::REGISTER => Message::Register {
				request_id: view.id(1)?,
				options: view.dict(2)?,
				procedure: view.string(3)?,
			},
			code::REGISTERED => Message::Registered {
				request_id: view.id(1)?,
				registration_id: view.id(2)?,
			},
			code::UNREGISTER => Message::Unregister {
				request_id: view.id(1)?,
				registration_id: view.id(2)?,
			},
			code::UNREGISTERED => Message::Unregistered {
				request_id: view.id(1)?,
			},
			code::INVOCATION => Message::Invocation {
				request_id: view.id(1)?,
				registration_id: view.id(2)?,
				details: view.dict(3)?,
				args: view.args(4)?,
				kwargs: view.kwargs(5)?,
			},
			code::YIELD => Message::Yield {
				request_id: view.id(1)?,
				options: view.dict(2)?,
				args: view.args(3)?,
				kwargs: view.kwargs(4)?,
			},
			_ => Message::Unknown(value),
		};
		Ok(message)
	}
}

/// Appends the optional `args`/`kwargs` tail to an encoded message.
///
/// Both are omitted when empty; a non-empty `kwargs` forces an explicit
/// (possibly empty) `args` array so positions stay aligned.
fn with_payload(base: Value, args: &Args, kwargs: &Kwargs) -> Value {
	let Value::Array(mut items) = base else {
		unreachable!("message base is always an array");
	};
	if !args.is_empty() || !kwargs.is_empty() {
		items.push(Value::Array(args.clone()));
	}
	if !kwargs.is_empty() {
		items.push(Value::Object(kwargs.clone()));
	}
	Value::Array(items)
}

/// Borrowed view over a message array with typed, arity-checked accessors.
struct MessageView<'a> {
	code: u64,
	items: &'a [Value],
}

impl MessageView<'_> {
	fn required(&self, index: usize) -> Result<&Value, MessageError> {
		self.items.get(index).ok_or(MessageError::BadArity {
			code: self.code,
			len: self.items.len(),
			expected: index + 1,
		})
	}

	fn id(&self, index: usize) -> Result<u64, MessageError> {
		self.required(index)?
			.as_u64()
			.ok_or(MessageError::BadElement {
				code: self.code,
				index,
				expected: "non-negative integer",
			})
	}

	fn string(&self, index: usize) -> Result<String, MessageError> {
		self.required(index)?
			.as_str()
			.map(str::to_owned)
			.ok_or(MessageError::BadElement {
				code: self.code,
				index,
				expected: "string",
			})
	}

	fn dict(&self, index: usize) -> Result<Dict, MessageError> {
		self.required(index)?
			.as_object()
			.cloned()
			.ok_or(MessageError::BadElement {
				code: self.code,
				index,
				expected: "object",
			})
	}

	/// Optional trailing args array; absent means empty.
	fn args(&self, index: usize) -> Result<Args, MessageError> {
		match self.items.get(index) {
			None => Ok(Vec::new()),
			Some(value) => value.as_array().cloned().ok_or(MessageError::BadElement {
				code: self.code,
				index,
				expected: "array",
			}),
		}
	}

	/// Optional trailing kwargs object; absent means empty.
	fn kwargs(&self, index: usize) -> Result<Kwargs, MessageError> {
		match self.items.get(index) {
			None => Ok(Map::new()),
			Some(value) => value.as_object().cloned().ok_or(MessageError::BadElement {
				code: self.code,
				index,
				expected: "object",
			}),
		}
	}
}
