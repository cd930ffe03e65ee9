use axum::response::{IntoResponse, Response};
use http::StatusCode;
use tracing::error;

use crate::client::UpstreamError;
use crate::store::StoreError;
use crate::validation::ValidationError;

/// Error returned by HTTP handlers. Rendered as a plain-text body carrying the
/// message verbatim.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
	#[error(transparent)]
	Validation(#[from] ValidationError),
	#[error(transparent)]
	Upstream(#[from] UpstreamError),
	#[error(transparent)]
	Store(#[from] StoreError),
}

impl ApiError {
	pub fn status(&self) -> StatusCode {
		match self {
			ApiError::Validation(_) => StatusCode::BAD_REQUEST,
			ApiError::Upstream(UpstreamError::NotFound(_)) => StatusCode::NOT_FOUND,
			ApiError::Upstream(UpstreamError::Client { status, .. }) if status.is_client_error() => {
				*status
			},
			ApiError::Upstream(UpstreamError::Client { .. }) => StatusCode::BAD_REQUEST,
			ApiError::Upstream(UpstreamError::Server { .. }) => StatusCode::INTERNAL_SERVER_ERROR,
			ApiError::Upstream(UpstreamError::Transport(_)) => StatusCode::BAD_GATEWAY,
			ApiError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
		}
	}
}

impl IntoResponse for ApiError {
	fn into_response(self) -> Response {
		let status = self.status();
		let message = self.to_string();
		error!(%status, error = %message, "request failed");
		(status, message).into_response()
	}
}
