//! Shared value aliases and well-known URIs.
//!
//! WAMP payloads are open-ended JSON structures: positional arguments,
//! keyword arguments, and option/detail dictionaries. These aliases name
//! the three shapes the rest of the workspace passes around.

use serde_json::{Map, Value};

/// Positional arguments of a call, event, or error payload.
pub type Args = Vec<Value>;

/// Keyword arguments of a call, event, or error payload.
pub type Kwargs = Map<String, Value>;

/// An open options/details dictionary as it appears on the wire.
pub type Dict = Map<String, Value>;

/// Well-known URIs from the WAMP basic profile.
pub mod uri {
	/// Goodbye reason sent by the peer that initiates a session close.
	pub const CLOSE_REALM: &str = "wamp.close.close_realm";

	/// Goodbye reason echoed by the peer acknowledging a close.
	pub const GOODBYE_AND_OUT: &str = "wamp.close.goodbye_and_out";

	/// Error reported when a procedure handler fails without a
	/// protocol-level error of its own.
	pub const RUNTIME_ERROR: &str = "wamp.error.runtime_error";

	/// Error reported for a call to a procedure nobody registered.
	pub const NO_SUCH_PROCEDURE: &str = "wamp.error.no_such_procedure";

	/// Error reported for an unregister of an unknown registration.
	pub const NO_SUCH_REGISTRATION: &str = "wamp.error.no_such_registration";

	/// Error reported for an unsubscribe of an unknown subscription.
	pub const NO_SUCH_SUBSCRIPTION: &str = "wamp.error.no_such_subscription";
}

/// Builds the client role announcement sent in HELLO.
///
/// This client always offers all four basic-profile roles: caller, callee,
/// publisher, and subscriber, each with no advertised features.
pub fn client_roles() -> Dict {
	let mut roles = Map::new();
	for role in ["caller", "callee", "publisher", "subscriber"] {
		roles.insert(role.to_string(), Value::Object(Map::new()));
	}
	roles
}
