//! Fixed-delay, bounded-attempt retry decisions for upstream calls.
//!
//! The policy is a pure function of the failure and the number of attempts
//! made so far. Sleeping and re-issuing the call is left to the caller
//! (see [`crate::client::with_retry`]).

use std::num::NonZeroU8;
use std::time::Duration;

use crate::client::UpstreamError;

#[cfg(test)]
#[path = "retry_tests.rs"]
mod tests;

/// Retry configuration shared by every upstream client.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct Policy {
	/// Total number of attempts, including the first one.
	#[serde(default = "default_attempts")]
	pub attempts: NonZeroU8,
	/// Fixed delay between attempts.
	#[serde(default = "default_backoff", with = "crate::serde_dur")]
	pub backoff: Duration,
}

const DEFAULT_ATTEMPTS: NonZeroU8 = NonZeroU8::new(3).unwrap();

fn default_attempts() -> NonZeroU8 {
	DEFAULT_ATTEMPTS
}

fn default_backoff() -> Duration {
	Duration::from_millis(500)
}

impl Default for Policy {
	fn default() -> Self {
		Self {
			attempts: default_attempts(),
			backoff: default_backoff(),
		}
	}
}

/// Outcome of consulting the policy after a failed attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
	/// Sleep for `after`, then issue the call again.
	Retry { after: Duration },
	/// Give up and surface the failure unchanged.
	Fail,
}

impl Policy {
	pub fn new(attempts: NonZeroU8, backoff: Duration) -> Self {
		Self { attempts, backoff }
	}

	/// Decide what to do after `attempt` calls (1-based) have been made and the
	/// last one failed with `error`.
	///
	/// Only server and transport failures are retried; not-found and client
	/// errors fail on first occurrence.
	pub fn should_retry(&self, error: &UpstreamError, attempt: u8) -> RetryDecision {
		if error.is_retryable() && attempt < self.attempts.get() {
			RetryDecision::Retry {
				after: self.backoff,
			}
		} else {
			RetryDecision::Fail
		}
	}
}
