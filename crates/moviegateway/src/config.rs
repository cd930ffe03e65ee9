//! Process configuration loaded from YAML.

use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::aggregator::MoviesAggregator;
use crate::broadcast::DEFAULT_BUFFER;
use crate::client::{MovieInfoClient, ReviewClient, UpstreamError, http_client};
use crate::retry::Policy;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
	#[error("failed to read config: {0}")]
	Io(#[from] std::io::Error),
	#[error("invalid config: {0}")]
	Yaml(#[from] serde_yaml::Error),
	#[error("failed to build http client: {0}")]
	Client(#[from] UpstreamError),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields, default)]
pub struct Config {
	/// Listen address. Each service falls back to its own default port.
	pub bind: Option<SocketAddr>,
	pub upstream: UpstreamConfig,
	/// Per-subscriber backlog for the record streams.
	pub stream_buffer: usize,
	pub logging: LoggingConfig,
}

impl Default for Config {
	fn default() -> Self {
		Self {
			bind: None,
			upstream: UpstreamConfig::default(),
			stream_buffer: DEFAULT_BUFFER,
			logging: LoggingConfig::default(),
		}
	}
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields, default)]
pub struct UpstreamConfig {
	pub movies_info_url: Url,
	pub reviews_url: Url,
	/// Bounds each single-record attempt. Streams are not subject to it.
	#[serde(with = "crate::serde_dur")]
	pub request_timeout: Duration,
	/// Bounds connection setup for every upstream call, streams included.
	#[serde(with = "crate::serde_dur")]
	pub connect_timeout: Duration,
	pub retry: Policy,
}

impl Default for UpstreamConfig {
	fn default() -> Self {
		Self {
			movies_info_url: Url::parse("http://localhost:8080/v1/movieinfos")
				.unwrap_or_else(|_| unreachable!("static url")),
			reviews_url: Url::parse("http://localhost:8081/v1/reviews")
				.unwrap_or_else(|_| unreachable!("static url")),
			request_timeout: Duration::from_secs(5),
			connect_timeout: Duration::from_secs(2),
			retry: Policy::default(),
		}
	}
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum LogFormat {
	#[default]
	Text,
	Json,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields, default)]
pub struct LoggingConfig {
	pub format: LogFormat,
	/// `EnvFilter` directives. `RUST_LOG` takes precedence when set.
	pub filter: Option<String>,
}

impl Config {
	pub async fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
		let contents = fs_err::tokio::read_to_string(path.as_ref()).await?;
		Self::from_yaml(&contents)
	}

	/// An empty document yields the defaults.
	pub fn from_yaml(contents: &str) -> Result<Self, ConfigError> {
		if contents.trim().is_empty() {
			return Ok(Self::default());
		}
		Ok(serde_yaml::from_str(contents)?)
	}

	/// Build both upstream clients over one shared connection pool.
	pub fn clients(&self) -> Result<Clients, ConfigError> {
		let upstream = &self.upstream;
		let http = http_client(upstream.connect_timeout)?;
		let movie_info = MovieInfoClient::new(
			http.clone(),
			upstream.movies_info_url.clone(),
			upstream.retry.clone(),
		)
		.with_request_timeout(upstream.request_timeout);
		let reviews = ReviewClient::new(http, upstream.reviews_url.clone(), upstream.retry.clone())
			.with_request_timeout(upstream.request_timeout);
		Ok(Clients { movie_info, reviews })
	}
}

/// Upstream clients built from one [`Config`]. Cloning shares the pool.
#[derive(Debug, Clone)]
pub struct Clients {
	pub movie_info: MovieInfoClient,
	pub reviews: ReviewClient,
}

impl Clients {
	pub fn aggregator(&self) -> MoviesAggregator {
		MoviesAggregator::new(Arc::new(self.movie_info.clone()), Arc::new(self.reviews.clone()))
	}
}
