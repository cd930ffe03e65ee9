//! Movie metadata service, mounted at `/v1/movieinfos`.

use std::sync::Arc;

use axum::Json;
use axum::Router;
use axum::extract::{Path, Query, State};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use http::StatusCode;
use serde::Deserialize;
use tower_http::trace::TraceLayer;
use tracing::info;

use super::{ApiError, sse};
use crate::broadcast::Broadcaster;
use crate::store::Repository;
use crate::types::MovieInfo;
use crate::validation::Validate;

#[derive(Clone)]
pub struct InfoState {
	pub repository: Arc<dyn Repository<MovieInfo>>,
	pub broadcaster: Broadcaster<MovieInfo>,
}

pub fn router(state: InfoState) -> Router {
	Router::new()
		.route("/v1/movieinfos", get(list).post(create))
		.route("/v1/movieinfos/stream", get(stream))
		.route("/v1/movieinfos/{id}", get(find).put(update).delete(remove))
		.layer(TraceLayer::new_for_http())
		.with_state(state)
}

#[derive(Debug, Default, Deserialize)]
struct ListQuery {
	year: Option<i32>,
}

async fn create(
	State(state): State<InfoState>,
	Json(movie_info): Json<MovieInfo>,
) -> Result<(StatusCode, Json<MovieInfo>), ApiError> {
	movie_info.validate()?;
	let saved = state.repository.save(movie_info).await?;
	info!(id = saved.movie_info_id.as_deref(), name = %saved.name, "movie info created");
	state.broadcaster.publish(saved.clone());
	Ok((StatusCode::CREATED, Json(saved)))
}

async fn list(
	State(state): State<InfoState>,
	Query(query): Query<ListQuery>,
) -> Result<Json<Vec<MovieInfo>>, ApiError> {
	let records = match query.year {
		Some(year) => state.repository.find_by_secondary_key(&year.to_string()).await?,
		None => state.repository.find_all().await?,
	};
	Ok(Json(records))
}

async fn find(State(state): State<InfoState>, Path(id): Path<String>) -> Result<Response, ApiError> {
	Ok(match state.repository.find_by_id(&id).await? {
		Some(record) => Json(record).into_response(),
		None => StatusCode::NOT_FOUND.into_response(),
	})
}

async fn update(
	State(state): State<InfoState>,
	Path(id): Path<String>,
	Json(update): Json<MovieInfo>,
) -> Result<Response, ApiError> {
	let Some(mut existing) = state.repository.find_by_id(&id).await? else {
		return Ok(StatusCode::NOT_FOUND.into_response());
	};
	existing.replace_with(update);
	let saved = state.repository.save(existing).await?;
	Ok(Json(saved).into_response())
}

async fn remove(State(state): State<InfoState>, Path(id): Path<String>) -> Result<StatusCode, ApiError> {
	state.repository.delete_by_id(&id).await?;
	Ok(StatusCode::NO_CONTENT)
}

async fn stream(State(state): State<InfoState>) -> impl IntoResponse {
	sse::subscription(state.broadcaster.subscribe())
}
