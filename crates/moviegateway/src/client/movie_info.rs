use std::time::Duration;

use bytes::Bytes;
use futures::future::ready;
use futures::stream::{BoxStream, Stream, StreamExt};
use http::header::ACCEPT;
use sse_stream::SseStream;
use tracing::debug;
use url::Url;

use super::{Outcome, UpstreamError, exchange, with_retry};
use crate::retry::Policy;
use crate::types::MovieInfo;

/// Live sequence of metadata records pushed by the upstream. Ends after the
/// first error.
pub type MovieInfoStream = BoxStream<'static, Result<MovieInfo, UpstreamError>>;

const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(5);

/// Client for the movie metadata upstream.
#[derive(Debug, Clone)]
pub struct MovieInfoClient {
	http: reqwest::Client,
	base_url: Url,
	retry: Policy,
	request_timeout: Duration,
}

impl MovieInfoClient {
	/// `base_url` points at the metadata collection, e.g.
	/// `http://localhost:8080/v1/movieinfos`.
	pub fn new(http: reqwest::Client, base_url: Url, retry: Policy) -> Self {
		Self {
			http,
			base_url,
			retry,
			request_timeout: DEFAULT_REQUEST_TIMEOUT,
		}
	}

	/// Upper bound for one single-record attempt. Does not apply to streams.
	pub fn with_request_timeout(mut self, request_timeout: Duration) -> Self {
		self.request_timeout = request_timeout;
		self
	}

	/// Fetch one metadata record.
	///
	/// A 404 becomes [`UpstreamError::NotFound`] immediately. Server and
	/// transport failures are retried per the configured policy.
	pub async fn retrieve_movie_info(&self, movie_id: &str) -> Result<MovieInfo, UpstreamError> {
		let url = self.url_for(movie_id)?;
		let info = with_retry(&self.retry, "movie-info", || self.fetch_once(url.clone(), movie_id)).await?;
		debug!(movie_id, "retrieved movie info");
		Ok(info)
	}

	async fn fetch_once(&self, url: Url, movie_id: &str) -> Result<MovieInfo, UpstreamError> {
		let request = self.http.get(url).timeout(self.request_timeout);
		match exchange(request).await {
			Outcome::Success(response) => response
				.json::<MovieInfo>()
				.await
				.map_err(UpstreamError::transport),
			Outcome::NotFound => Err(UpstreamError::NotFound(format!(
				"No movie info for id {movie_id}"
			))),
			other => Err(other.into_error()),
		}
	}

	/// Open the upstream's server-push stream of newly created records.
	///
	/// Failing to connect is reported here; once connected, a broken connection
	/// or an undecodable event ends the stream with one error item. Never
	/// retried.
	pub async fn retrieve_movie_info_stream(&self) -> Result<MovieInfoStream, UpstreamError> {
		let url = self.url_for("stream")?;
		let request = self.http.get(url).header(ACCEPT, "text/event-stream");
		let response = match exchange(request).await {
			Outcome::Success(response) => response,
			other => return Err(other.into_error()),
		};
		debug!("connected to movie info stream");
		Ok(decode_events(response.bytes_stream()))
	}

	fn url_for(&self, segment: &str) -> Result<Url, UpstreamError> {
		let mut url = self.base_url.clone();
		url
			.path_segments_mut()
			.map_err(|_| UpstreamError::Transport(format!("{} cannot be a base url", self.base_url)))?
			.pop_if_empty()
			.push(segment);
		Ok(url)
	}
}

fn decode_events<S>(bytes: S) -> MovieInfoStream
where
	S: Stream<Item = reqwest::Result<Bytes>> + Send + 'static,
{
	SseStream::from_byte_stream(bytes)
		.filter_map(|event| {
			ready(match event {
				Ok(sse) => sse
					.data
					.filter(|data| !data.trim().is_empty())
					.map(|data| serde_json::from_str::<MovieInfo>(&data).map_err(UpstreamError::transport)),
				Err(e) => Some(Err(UpstreamError::transport(e))),
			})
		})
		.scan(false, |failed, item| {
			if *failed {
				return ready(None);
			}
			*failed = item.is_err();
			ready(Some(item))
		})
		.boxed()
}
