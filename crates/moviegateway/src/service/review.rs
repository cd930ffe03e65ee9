//! Review service, mounted at `/v1/reviews`.

use std::sync::Arc;

use axum::Json;
use axum::Router;
use axum::extract::{Path, Query, State};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, put};
use http::StatusCode;
use serde::Deserialize;
use tower_http::trace::TraceLayer;
use tracing::info;

use super::{ApiError, sse};
use crate::broadcast::Broadcaster;
use crate::store::Repository;
use crate::types::Review;
use crate::validation::Validate;

#[derive(Clone)]
pub struct ReviewState {
	pub repository: Arc<dyn Repository<Review>>,
	pub broadcaster: Broadcaster<Review>,
}

pub fn router(state: ReviewState) -> Router {
	Router::new()
		.route("/v1/reviews", get(list).post(create))
		.route("/v1/reviews/stream", get(stream))
		.route("/v1/reviews/{id}", put(update).delete(remove))
		.layer(TraceLayer::new_for_http())
		.with_state(state)
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListQuery {
	movie_info_id: Option<String>,
}

async fn create(
	State(state): State<ReviewState>,
	Json(review): Json<Review>,
) -> Result<(StatusCode, Json<Review>), ApiError> {
	review.validate()?;
	let saved = state.repository.save(review).await?;
	info!(
		id = saved.review_id.as_deref(),
		movie_info_id = saved.movie_info_id.as_deref(),
		"review created"
	);
	state.broadcaster.publish(saved.clone());
	Ok((StatusCode::CREATED, Json(saved)))
}

async fn list(
	State(state): State<ReviewState>,
	Query(query): Query<ListQuery>,
) -> Result<Json<Vec<Review>>, ApiError> {
	let reviews = match query.movie_info_id {
		Some(movie_info_id) => state.repository.find_by_secondary_key(&movie_info_id).await?,
		None => state.repository.find_all().await?,
	};
	Ok(Json(reviews))
}

/// Only the comment and rating change; the review stays attached to its movie.
async fn update(
	State(state): State<ReviewState>,
	Path(id): Path<String>,
	Json(update): Json<Review>,
) -> Result<Response, ApiError> {
	let Some(mut existing) = state.repository.find_by_id(&id).await? else {
		return Ok(StatusCode::NOT_FOUND.into_response());
	};
	existing.comment = update.comment;
	existing.rating = update.rating;
	let saved = state.repository.save(existing).await?;
	Ok(Json(saved).into_response())
}

async fn remove(State(state): State<ReviewState>, Path(id): Path<String>) -> Result<StatusCode, ApiError> {
	state.repository.delete_by_id(&id).await?;
	Ok(StatusCode::NO_CONTENT)
}

async fn stream(State(state): State<ReviewState>) -> impl IntoResponse {
	sse::subscription(state.broadcaster.subscribe())
}
