//! Field constraints checked before a record reaches the store.

use crate::types::{MovieInfo, Review};

/// Every violated constraint of one record, as a single deterministic message.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct ValidationError {
	message: String,
}

impl ValidationError {
	/// Sorts and de-duplicates the violation messages, then joins them with `", "`.
	pub fn from_violations<I, S>(violations: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		let mut messages: Vec<String> = violations.into_iter().map(Into::into).collect();
		messages.sort();
		messages.dedup();
		Self {
			message: messages.join(", "),
		}
	}

	pub fn message(&self) -> &str {
		&self.message
	}
}

pub trait Validate {
	/// Messages for each violated constraint, in no particular order.
	fn violations(&self) -> Vec<&'static str>;

	fn validate(&self) -> Result<(), ValidationError> {
		let violations = self.violations();
		if violations.is_empty() {
			Ok(())
		} else {
			Err(ValidationError::from_violations(violations))
		}
	}
}

impl Validate for MovieInfo {
	fn violations(&self) -> Vec<&'static str> {
		let mut violations = Vec::new();
		if self.name.trim().is_empty() {
			violations.push("movieInfo.name must be present");
		}
		if self.year <= 0 {
			violations.push("movieInfo.year must be positive");
		}
		if self.cast.is_empty() || self.cast.iter().any(|member| member.trim().is_empty()) {
			violations.push("movieInfo.cast must be present");
		}
		violations
	}
}

impl Validate for Review {
	fn violations(&self) -> Vec<&'static str> {
		let mut violations = Vec::new();
		if self
			.movie_info_id
			.as_deref()
			.is_none_or(|id| id.trim().is_empty())
		{
			violations.push("review.movieInfoId must not be null");
		}
		if self.rating.is_some_and(|rating| rating < 0.0) {
			violations.push("review.rating must be positive");
		}
		violations
	}
}
