use std::time::Duration;

use tracing::debug;
use url::Url;

use super::{Outcome, UpstreamError, exchange, with_retry};
use crate::retry::Policy;
use crate::types::Review;

const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(5);

/// Client for the review upstream.
#[derive(Debug, Clone)]
pub struct ReviewClient {
	http: reqwest::Client,
	base_url: Url,
	retry: Policy,
	request_timeout: Duration,
}

impl ReviewClient {
	/// `base_url` points at the review collection, e.g.
	/// `http://localhost:8081/v1/reviews`.
	pub fn new(http: reqwest::Client, base_url: Url, retry: Policy) -> Self {
		Self {
			http,
			base_url,
			retry,
			request_timeout: DEFAULT_REQUEST_TIMEOUT,
		}
	}

	pub fn with_request_timeout(mut self, request_timeout: Duration) -> Self {
		self.request_timeout = request_timeout;
		self
	}

	/// Fetch every review for one movie, in upstream order.
	///
	/// A 404 is a movie with no reviews, not an error.
	pub async fn retrieve_reviews(&self, movie_info_id: &str) -> Result<Vec<Review>, UpstreamError> {
		let mut url = self.base_url.clone();
		url.query_pairs_mut().append_pair("movieInfoId", movie_info_id);

		let reviews = with_retry(&self.retry, "reviews", || self.fetch_once(url.clone())).await?;
		debug!(movie_info_id, count = reviews.len(), "retrieved reviews");
		Ok(reviews)
	}

	async fn fetch_once(&self, url: Url) -> Result<Vec<Review>, UpstreamError> {
		let request = self.http.get(url).timeout(self.request_timeout);
		match exchange(request).await {
			Outcome::Success(response) => response
				.json::<Vec<Review>>()
				.await
				.map_err(UpstreamError::transport),
			Outcome::NotFound => Ok(Vec::new()),
			other => Err(other.into_error()),
		}
	}
}
