//! Session-scoped request id generation.

use std::sync::atomic::{AtomicU64, Ordering};

/// Monotonic request id source, one per session.
///
/// Ids start at 1 and increase by 1; no two calls on the same generator
/// ever return the same value. WAMP caps ids at 2^53, far beyond what a
/// single session can exhaust.
#[derive(Debug)]
pub struct RequestIdGenerator {
	next: AtomicU64,
}

impl RequestIdGenerator {
	/// Creates a generator whose first id is 1.
	pub fn new() -> Self {
		Self {
			next: AtomicU64::new(1),
		}
	}

	/// Returns the next request id.
	pub fn next(&self) -> u64 {
		self.next.fetch_add(1, Ordering::SeqCst)
	}
}

impl Default for RequestIdGenerator {
	fn default() -> Self {
		Self::new()
	}
}

#[cfg(test)]
mod tests {
	use std::sync::Arc;

	use super::*;

	#[test]
	fn ids_start_at_one_and_increment() {
		let generator = RequestIdGenerator::new();
		assert_eq!(generator.next(), 1);
		assert_eq!(generator.next(), 2);
		assert_eq!(generator.next(), 3);
	}

	#[tokio::test]
	async fn concurrent_callers_get_distinct_ids() {
		let generator = Arc::new(RequestIdGenerator::new());
		let mut handles = Vec::new();
		for _ in 0..8 {
			let generator = Arc::clone(&generator);
			handles.push(tokio::spawn(async move {
				(0..100).map(|_| generator.next()).collect::<Vec<_>>()
			}));
		}

		let mut all = Vec::new();
		for handle in handles {
			all.extend(handle.await.unwrap());
		}
		all.sort_unstable();
		let len = all.len();
		all.dedup();
		assert_eq!(all.len(), len, "duplicate request id handed out");
		assert_eq!(all.first(), Some(&1));
	}
}
