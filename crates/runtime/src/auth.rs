//! Client authenticators for session establishment.
//!
//! An [`Authenticator`] tells the joiner which auth method to announce in
//! HELLO and how to answer a CHALLENGE. Cryptographic schemes (CRA,
//! cryptosign) are out of scope for this crate; they would implement the
//! same trait.

use wamp_protocol::Dict;

use crate::error::{Error, Result};

/// Answers the router's authentication flow on behalf of a client.
pub trait Authenticator: Send + Sync {
	/// The auth method announced in HELLO (e.g. `"anonymous"`,
	/// `"ticket"`).
	fn auth_method(&self) -> &str;

	/// The authid announced in HELLO.
	fn auth_id(&self) -> &str;

	/// Extra data for the AUTHENTICATE message.
	fn auth_extra(&self) -> Dict {
		Dict::new()
	}

	/// Produces the signature for a CHALLENGE with the given extra data.
	fn authenticate(&self, extra: &Dict) -> Result<String>;
}

/// Joins without credentials.
#[derive(Debug, Clone, Default)]
pub struct AnonymousAuthenticator {
	auth_id: String,
}

impl AnonymousAuthenticator {
	/// Creates an anonymous authenticator with an optional authid.
	pub fn new(auth_id: impl Into<String>) -> Self {
		Self {
			auth_id: auth_id.into(),
		}
	}
}

impl Authenticator for AnonymousAuthenticator {
	fn auth_method(&self) -> &str {
		"anonymous"
	}

	fn auth_id(&self) -> &str {
		&self.auth_id
	}

	fn authenticate(&self, _extra: &Dict) -> Result<String> {
		// A router that challenges an anonymous join is misbehaving.
		Err(Error::Protocol(
			"anonymous authentication cannot answer a challenge".into(),
		))
	}
}

/// Answers a challenge with a shared ticket string.
#[derive(Debug, Clone)]
pub struct TicketAuthenticator {
	auth_id: String,
	ticket: String,
}

impl TicketAuthenticator {
	/// Creates a ticket authenticator for `auth_id`.
	pub fn new(auth_id: impl Into<String>, ticket: impl Into<String>) -> Self {
		Self {
			auth_id: auth_id.into(),
			ticket: ticket.into(),
		}
	}
}

impl Authenticator for TicketAuthenticator {
	fn auth_method(&self) -> &str {
		"ticket"
	}

	fn auth_id(&self) -> &str {
		&self.auth_id
	}

	fn authenticate(&self, _extra: &Dict) -> Result<String> {
		Ok(self.ticket.clone())
	}
}
