//! Option structs for the session operation surface.
//!
//! Each operation takes a typed options struct that serializes into the
//! open WAMP options dictionary. Unset fields are omitted from the wire;
//! `extra` carries router-specific keys this client does not model.

use serde::Serialize;
use serde_json::Value;

use crate::types::Dict;

/// Options for `call`.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CallOptions {
	/// Router-side call timeout in milliseconds. Enforced by the peer,
	/// not by this client.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub timeout: Option<u64>,

	/// Ask the router to disclose this caller's identity to the callee.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub disclose_me: Option<bool>,

	/// Additional options passed through untouched.
	#[serde(flatten)]
	pub extra: Dict,
}

impl CallOptions {
	/// Creates new default options.
	pub fn new() -> Self {
		Self::default()
	}

	/// Sets the router-side timeout in milliseconds.
	pub fn timeout(mut self, timeout: u64) -> Self {
		self.timeout = Some(timeout);
		self
	}

	/// Requests caller identity disclosure.
	pub fn disclose_me(mut self, disclose: bool) -> Self {
		self.disclose_me = Some(disclose);
		self
	}

	/// Serializes into the wire options dictionary.
	pub fn to_dict(&self) -> Dict {
		to_dict(self)
	}
}

/// Options for `publish`.
#[derive(Debug, Clone, Default, Serialize)]
pub struct PublishOptions {
	/// Request a PUBLISHED acknowledgement from the router. Without it,
	/// `publish` is fire-and-forget.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub acknowledge: Option<bool>,

	/// Whether this session's own subscriptions receive the event.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub exclude_me: Option<bool>,

	/// Additional options passed through untouched.
	#[serde(flatten)]
	pub extra: Dict,
}

impl PublishOptions {
	/// Creates new default options.
	pub fn new() -> Self {
		Self::default()
	}

	/// Requests a PUBLISHED acknowledgement.
	pub fn acknowledge(mut self, acknowledge: bool) -> Self {
		self.acknowledge = Some(acknowledge);
		self
	}

	/// Controls self-delivery of the published event.
	pub fn exclude_me(mut self, exclude: bool) -> Self {
		self.exclude_me = Some(exclude);
		self
	}

	/// Returns `true` if an acknowledgement was requested.
	pub fn wants_acknowledge(&self) -> bool {
		self.acknowledge == Some(true)
	}

	/// Serializes into the wire options dictionary.
	pub fn to_dict(&self) -> Dict {
		to_dict(self)
	}
}

/// Options for `register`.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RegisterOptions {
	/// Match policy for the procedure URI (`"exact"`, `"prefix"`,
	/// `"wildcard"`). Routers default to exact.
	#[serde(rename = "match", skip_serializing_if = "Option::is_none")]
	pub match_policy: Option<String>,

	/// Additional options passed through untouched.
	#[serde(flatten)]
	pub extra: Dict,
}

impl RegisterOptions {
	/// Creates new default options.
	pub fn new() -> Self {
		Self::default()
	}

	/// Sets the URI match policy.
	pub fn match_policy(mut self, policy: impl Into<String>) -> Self {
		self.match_policy = Some(policy.into());
		self
	}

	/// Serializes into the wire options dictionary.
	pub fn to_dict(&self) -> Dict {
		to_dict(self)
	}
}

/// Options for `subscribe`.
#[derive(Debug, Clone, Default, Serialize)]
pub struct SubscribeOptions {
	/// Match policy for the topic URI (`"exact"`, `"prefix"`,
	/// `"wildcard"`). Routers default to exact.
	#[serde(rename = "match", skip_serializing_if = "Option::is_none")]
	pub match_policy: Option<String>,

	/// Additional options passed through untouched.
	#[serde(flatten)]
	pub extra: Dict,
}

impl SubscribeOptions {
	/// Creates new default options.
	pub fn new() -> Self {
		Self::default()
	}

	/// Sets the URI match policy.
	pub fn match_policy(mut self, policy: impl Into<String>) -> Self {
		self.match_policy = Some(policy.into());
		self
	}

	/// Serializes into the wire options dictionary.
	pub fn to_dict(&self) -> Dict {
		to_dict(self)
	}
}

fn to_dict<T: Serialize>(options: &T) -> Dict {
	match serde_json::to_value(options) {
		Ok(Value::Object(map)) => map,
		_ => Dict::new(),
	}
}

#[cfg(test)]
mod tests {
	use serde_json::json;

	use super::*;

	#[test]
	fn default_options_serialize_empty() {
		assert!(CallOptions::new().to_dict().is_empty());
		assert!(PublishOptions::new().to_dict().is_empty());
		assert!(RegisterOptions::new().to_dict().is_empty());
		assert!(SubscribeOptions::new().to_dict().is_empty());
	}

	#[test]
	fn call_options_set_fields() {
		let dict = CallOptions::new().timeout(5000).disclose_me(true).to_dict();
		assert_eq!(dict.get("timeout"), Some(&json!(5000)));
		assert_eq!(dict.get("disclose_me"), Some(&json!(true)));
	}

	#[test]
	fn publish_acknowledge_flag() {
		let options = PublishOptions::new().acknowledge(true);
		assert!(options.wants_acknowledge());
		assert_eq!(options.to_dict().get("acknowledge"), Some(&json!(true)));

		assert!(!PublishOptions::new().wants_acknowledge());
		assert!(!PublishOptions::new().acknowledge(false).wants_acknowledge());
	}

	#[test]
	fn match_policy_uses_wire_key() {
		let dict = SubscribeOptions::new().match_policy("prefix").to_dict();
		assert_eq!(dict.get("match"), Some(&json!("prefix")));
	}

	#[test]
	fn extra_keys_are_flattened() {
		let mut options = CallOptions::new();
		options.extra.insert("receive_progress".into(), json!(true));
		let dict = options.to_dict();
		assert_eq!(dict.get("receive_progress"), Some(&json!(true)));
	}
}
