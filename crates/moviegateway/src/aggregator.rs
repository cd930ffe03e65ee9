//! Composes metadata and reviews into one [`Movie`].

use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use crate::client::{MovieInfoClient, ReviewClient, UpstreamError};
use crate::types::{Movie, MovieInfo, Review};

/// Source of metadata records (abstraction over the metadata client).
#[async_trait]
pub trait MovieInfoSource: Send + Sync {
	async fn movie_info(&self, movie_id: &str) -> Result<MovieInfo, UpstreamError>;
}

/// Source of reviews. A movie without reviews yields an empty list.
#[async_trait]
pub trait ReviewSource: Send + Sync {
	async fn reviews(&self, movie_info_id: &str) -> Result<Vec<Review>, UpstreamError>;
}

#[async_trait]
impl MovieInfoSource for MovieInfoClient {
	async fn movie_info(&self, movie_id: &str) -> Result<MovieInfo, UpstreamError> {
		self.retrieve_movie_info(movie_id).await
	}
}

#[async_trait]
impl ReviewSource for ReviewClient {
	async fn reviews(&self, movie_info_id: &str) -> Result<Vec<Review>, UpstreamError> {
		self.retrieve_reviews(movie_info_id).await
	}
}

/// Builds composite movies from the two upstreams. Holds no per-request
/// state, so one instance serves every request.
#[derive(Clone)]
pub struct MoviesAggregator {
	info: Arc<dyn MovieInfoSource>,
	reviews: Arc<dyn ReviewSource>,
}

impl MoviesAggregator {
	pub fn new(info: Arc<dyn MovieInfoSource>, reviews: Arc<dyn ReviewSource>) -> Self {
		Self { info, reviews }
	}

	/// Look up the metadata for `movie_id`, then its reviews.
	///
	/// Reviews are only requested once metadata has been found, using the id
	/// the metadata upstream reported. Any failure from either source fails the
	/// whole lookup.
	pub async fn get_movie(&self, movie_id: &str) -> Result<Movie, UpstreamError> {
		let movie_info = self.info.movie_info(movie_id).await?;
		let movie_info_id = movie_info.movie_info_id.as_deref().unwrap_or(movie_id);
		let reviews = self.reviews.reviews(movie_info_id).await?;
		debug!(movie_id, movie_info_id, reviews = reviews.len(), "aggregated movie");
		Ok(Movie::new(movie_info, reviews))
	}
}
