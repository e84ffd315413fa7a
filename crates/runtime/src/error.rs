//! Error types for the WAMP session runtime.

use thiserror::Error;
use wamp_protocol::{Args, Kwargs};

/// Result type alias for runtime operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in the WAMP session runtime.
#[derive(Debug, Error)]
pub enum Error {
	/// Transport-level failure: connect, send, or receive broke. Fatal to
	/// the session.
	#[error("transport error: {0}")]
	Transport(String),

	/// The router aborted the handshake before a session was established.
	#[error("session aborted by peer: {reason}")]
	Abort {
		/// Machine-readable abort reason URI.
		reason: String,
		/// Optional human-readable message from the abort details.
		message: Option<String>,
	},

	/// The peer sent something the protocol does not allow here: a reply
	/// for an unknown request id, a mismatched originating type, or an
	/// out-of-place message.
	#[error("protocol violation: {0}")]
	Protocol(String),

	/// The peer reported an application-level failure for a specific
	/// request, carrying a machine-readable URI plus its payload.
	#[error("{uri}")]
	Application {
		/// Machine-readable error identifier.
		uri: String,
		/// Positional error payload.
		args: Args,
		/// Keyword error payload.
		kwargs: Kwargs,
	},

	/// The session is closed; the operation was not sent.
	#[error("session closed")]
	SessionClosed,

	/// Payload encode/decode failure.
	#[error("codec error: {0}")]
	Codec(#[from] wamp_protocol::CodecError),

	/// I/O error.
	#[error("I/O error: {0}")]
	Io(#[from] std::io::Error),
}

impl Error {
	/// Returns the error URI if this is a peer-reported application error.
	pub fn error_uri(&self) -> Option<&str> {
		match self {
			Error::Application { uri, .. } => Some(uri),
			_ => None,
		}
	}

	/// Returns true if this error means the session is unusable.
	pub fn is_fatal(&self) -> bool {
		matches!(self, Error::Transport(_) | Error::SessionClosed)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn application_error_exposes_uri() {
		let err = Error::Application {
			uri: "com.example.error.denied".into(),
			args: Vec::new(),
			kwargs: Kwargs::new(),
		};
		assert_eq!(err.error_uri(), Some("com.example.error.denied"));
		assert!(!err.is_fatal());
	}

	#[test]
	fn transport_and_closed_are_fatal() {
		assert!(Error::Transport("broken pipe".into()).is_fatal());
		assert!(Error::SessionClosed.is_fatal());
		assert!(!Error::Protocol("stray reply".into()).is_fatal());
	}
}
