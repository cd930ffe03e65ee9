//! Aggregating movies service, mounted at `/v1/movies`.

use axum::Json;
use axum::Router;
use axum::extract::{Path, State};
use axum::response::IntoResponse;
use axum::routing::get;
use futures::TryStreamExt;
use tower_http::trace::TraceLayer;
use tracing::warn;

use super::{ApiError, sse};
use crate::aggregator::MoviesAggregator;
use crate::client::MovieInfoClient;
use crate::types::Movie;

#[derive(Clone)]
pub struct MoviesState {
	pub aggregator: MoviesAggregator,
	/// Source of the relayed metadata stream.
	pub movie_info: MovieInfoClient,
}

pub fn router(state: MoviesState) -> Router {
	Router::new()
		.route("/v1/movies/stream", get(stream))
		.route("/v1/movies/{id}", get(find))
		.layer(TraceLayer::new_for_http())
		.with_state(state)
}

async fn find(State(state): State<MoviesState>, Path(id): Path<String>) -> Result<Json<Movie>, ApiError> {
	Ok(Json(state.aggregator.get_movie(&id).await?))
}

async fn stream(State(state): State<MoviesState>) -> Result<impl IntoResponse, ApiError> {
	let upstream = state.movie_info.retrieve_movie_info_stream().await?;
	let relayed = upstream.inspect_err(|error| warn!(%error, "movie info stream ended"));
	Ok(sse::relay(relayed))
}
