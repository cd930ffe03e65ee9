//! Outbound clients for the metadata and review upstreams.
//!
//! Every call is classified exactly once into an [`Outcome`]; clients turn the
//! outcome into a typed result and run it under the shared retry [`Policy`].

use std::future::Future;
use std::time::Duration;

use http::StatusCode;
use tracing::{debug, warn};

use crate::retry::{Policy, RetryDecision};

mod movie_info;
mod review;

pub use movie_info::{MovieInfoClient, MovieInfoStream};
pub use review::ReviewClient;

/// Failure surfaced by an upstream client.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UpstreamError {
	/// The requested record does not exist upstream.
	#[error("{0}")]
	NotFound(String),
	/// The upstream rejected the request; `detail` is its response body.
	#[error("{detail}")]
	Client { status: StatusCode, detail: String },
	/// The upstream failed; `detail` is its response body.
	#[error("{detail}")]
	Server { status: StatusCode, detail: String },
	/// Connection refused, timeout, or an unreadable response.
	#[error("upstream transport failure: {0}")]
	Transport(String),
}

impl UpstreamError {
	/// Server and transport failures may succeed on a later attempt.
	pub fn is_retryable(&self) -> bool {
		matches!(self, UpstreamError::Server { .. } | UpstreamError::Transport(_))
	}

	pub(crate) fn transport(err: impl std::fmt::Display) -> Self {
		UpstreamError::Transport(err.to_string())
	}
}

/// Classification of one outbound call.
#[derive(Debug)]
pub enum Outcome {
	Success(reqwest::Response),
	NotFound,
	ClientError { status: StatusCode, detail: String },
	ServerError { status: StatusCode, detail: String },
	Transport(String),
}

impl Outcome {
	/// Convert a non-success outcome into the matching error. Callers that give
	/// 404 a domain meaning handle [`Outcome::NotFound`] before calling this.
	pub fn into_error(self) -> UpstreamError {
		match self {
			Outcome::Success(response) => UpstreamError::Transport(format!(
				"unexpected success status {}",
				response.status()
			)),
			Outcome::NotFound => UpstreamError::NotFound(StatusCode::NOT_FOUND.to_string()),
			Outcome::ClientError { status, detail } => UpstreamError::Client { status, detail },
			Outcome::ServerError { status, detail } => UpstreamError::Server { status, detail },
			Outcome::Transport(detail) => UpstreamError::Transport(detail),
		}
	}
}

/// Send `request` and classify the response by status code.
///
/// Error bodies are read in full and kept verbatim as the error detail.
pub async fn exchange(request: reqwest::RequestBuilder) -> Outcome {
	let response = match request.send().await {
		Ok(response) => response,
		Err(e) => return Outcome::Transport(e.to_string()),
	};

	let status = response.status();
	if status.is_success() {
		return Outcome::Success(response);
	}
	if status == StatusCode::NOT_FOUND {
		return Outcome::NotFound;
	}
	if !status.is_client_error() && !status.is_server_error() {
		return Outcome::Transport(format!("unexpected status {status}"));
	}

	let detail = match response.text().await {
		Ok(detail) => detail,
		Err(e) => return Outcome::Transport(e.to_string()),
	};
	if status.is_client_error() {
		Outcome::ClientError { status, detail }
	} else {
		Outcome::ServerError { status, detail }
	}
}

/// Run `call` until it succeeds or `policy` says to stop.
///
/// On exhaustion the last error is returned as-is. Dropping the returned future
/// abandons any in-flight call and pending backoff.
pub async fn with_retry<T, F, Fut>(policy: &Policy, upstream: &str, mut call: F) -> Result<T, UpstreamError>
where
	F: FnMut() -> Fut,
	Fut: Future<Output = Result<T, UpstreamError>>,
{
	let mut attempt: u8 = 0;
	loop {
		attempt = attempt.saturating_add(1);
		let error = match call().await {
			Ok(value) => return Ok(value),
			Err(error) => error,
		};

		match policy.should_retry(&error, attempt) {
			RetryDecision::Retry { after } => {
				debug!(upstream, attempt, delay = ?after, error = %error, "retrying upstream call");
				tokio::time::sleep(after).await;
			},
			RetryDecision::Fail => {
				if error.is_retryable() {
					warn!(upstream, attempt, error = %error, "upstream retries exhausted");
				}
				return Err(error);
			},
		}
	}
}

/// Build the HTTP client shared by every upstream client.
///
/// Only the connect phase is bounded here; single-record calls set their own
/// request timeout so long-lived streams are not cut off.
pub fn http_client(connect_timeout: Duration) -> Result<reqwest::Client, UpstreamError> {
	reqwest::Client::builder()
		.connect_timeout(connect_timeout)
		.build()
		.map_err(UpstreamError::transport)
}
