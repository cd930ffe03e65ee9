//! Aggregation through the movies service against stubbed upstreams.

use std::num::NonZeroU8;
use std::time::Duration;

use assert_matches::assert_matches;
use axum::body::Body;
use http::{Request, StatusCode};
use moviegateway::client::{MovieInfoClient, http_client};
use moviegateway::retry::Policy;
use moviegateway::{Movie, UpstreamError};
use serde_json::json;
use tower::ServiceExt;
use url::Url;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, ResponseTemplate};

use crate::common::{MOVIE_INFOS_PATH, REVIEWS_PATH, Upstreams, batman_begins, fast_retry};

async fn get(upstreams: &Upstreams, uri: &str) -> (StatusCode, bytes::Bytes) {
	let response = upstreams
		.movies_router()
		.oneshot(Request::get(uri).body(Body::empty()).unwrap())
		.await
		.unwrap();
	let status = response.status();
	let body = axum::body::to_bytes(response.into_body(), 1024 * 1024).await.unwrap();
	(status, body)
}

async fn mount_info(upstreams: &Upstreams, id: &str, response: ResponseTemplate, calls: u64) {
	Mock::given(method("GET"))
		.and(path(format!("{MOVIE_INFOS_PATH}/{id}")))
		.respond_with(response)
		.expect(calls)
		.mount(&upstreams.info)
		.await;
}

async fn mount_reviews(upstreams: &Upstreams, id: &str, response: ResponseTemplate, calls: u64) {
	Mock::given(method("GET"))
		.and(path(REVIEWS_PATH))
		.and(query_param("movieInfoId", id))
		.respond_with(response)
		.expect(calls)
		.mount(&upstreams.reviews)
		.await;
}

#[tokio::test]
async fn test_retrieve_movie_by_id() {
	let upstreams = Upstreams::start().await;
	mount_info(
		&upstreams,
		"abc",
		ResponseTemplate::new(200).set_body_json(batman_begins("abc")),
		1,
	)
	.await;
	mount_reviews(
		&upstreams,
		"abc",
		ResponseTemplate::new(200).set_body_json(json!([
			{"reviewId": "1", "movieInfoId": "abc", "comment": "Awesome Movie", "rating": 9.0},
			{"reviewId": "2", "movieInfoId": "abc", "comment": "Excellent Movie", "rating": 8.0},
		])),
		1,
	)
	.await;

	let (status, body) = get(&upstreams, "/v1/movies/abc").await;
	assert_eq!(status, StatusCode::OK);
	let movie: Movie = serde_json::from_slice(&body).unwrap();
	assert_eq!(movie.movie_info, batman_begins("abc"));
	assert_eq!(movie.reviews.len(), 2);
	assert_eq!(movie.reviews[1].comment.as_deref(), Some("Excellent Movie"));

	let raw: serde_json::Value = serde_json::from_slice(&body).unwrap();
	assert_eq!(raw["movieInfo"]["name"], "Batman Begins");
	assert_eq!(raw["movieInfo"]["release_date"], "2005-06-15");
}

#[tokio::test]
async fn test_metadata_not_found_never_fetches_reviews() {
	let upstreams = Upstreams::start().await;
	mount_info(&upstreams, "abc", ResponseTemplate::new(404), 1).await;
	mount_reviews(&upstreams, "abc", ResponseTemplate::new(200).set_body_json(json!([])), 0).await;

	let (status, body) = get(&upstreams, "/v1/movies/abc").await;
	assert_eq!(status, StatusCode::NOT_FOUND);
	assert_eq!(&body[..], b"No movie info for id abc");
}

#[tokio::test]
async fn test_reviews_not_found_is_empty() {
	let upstreams = Upstreams::start().await;
	mount_info(
		&upstreams,
		"abc",
		ResponseTemplate::new(200).set_body_json(batman_begins("abc")),
		1,
	)
	.await;
	mount_reviews(&upstreams, "abc", ResponseTemplate::new(404), 1).await;

	let (status, body) = get(&upstreams, "/v1/movies/abc").await;
	assert_eq!(status, StatusCode::OK);
	let movie: Movie = serde_json::from_slice(&body).unwrap();
	assert!(movie.reviews.is_empty());
}

#[tokio::test]
async fn test_metadata_server_error_retried_exactly_three_times() {
	let upstreams = Upstreams::start().await;
	mount_info(
		&upstreams,
		"abc",
		ResponseTemplate::new(500).set_body_string("MovieInfo Service Unavailable"),
		3,
	)
	.await;
	mount_reviews(&upstreams, "abc", ResponseTemplate::new(200), 0).await;

	let (status, body) = get(&upstreams, "/v1/movies/abc").await;
	assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
	assert_eq!(&body[..], b"MovieInfo Service Unavailable");
}

#[tokio::test]
async fn test_reviews_server_error_retried_exactly_three_times() {
	let upstreams = Upstreams::start().await;
	mount_info(
		&upstreams,
		"abc",
		ResponseTemplate::new(200).set_body_json(batman_begins("abc")),
		1,
	)
	.await;
	mount_reviews(
		&upstreams,
		"abc",
		ResponseTemplate::new(503).set_body_string("Review Service Unavailable"),
		3,
	)
	.await;

	let (status, body) = get(&upstreams, "/v1/movies/abc").await;
	assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
	assert_eq!(&body[..], b"Review Service Unavailable");
}

#[tokio::test]
async fn test_metadata_client_error_not_retried() {
	let upstreams = Upstreams::start().await;
	mount_info(
		&upstreams,
		"abc",
		ResponseTemplate::new(400).set_body_string("invalid movie id"),
		1,
	)
	.await;

	let (status, body) = get(&upstreams, "/v1/movies/abc").await;
	assert_eq!(status, StatusCode::BAD_REQUEST);
	assert_eq!(&body[..], b"invalid movie id");
}

#[tokio::test]
async fn test_reviews_client_error_not_retried() {
	let upstreams = Upstreams::start().await;
	mount_info(
		&upstreams,
		"abc",
		ResponseTemplate::new(200).set_body_json(batman_begins("abc")),
		1,
	)
	.await;
	mount_reviews(
		&upstreams,
		"abc",
		ResponseTemplate::new(400).set_body_string("movieInfoId must be numeric"),
		// One attempt each for the two lookups below.
		2,
	)
	.await;

	let (status, body) = get(&upstreams, "/v1/movies/abc").await;
	assert_eq!(status, StatusCode::BAD_REQUEST);
	assert_eq!(&body[..], b"movieInfoId must be numeric");

	let err = upstreams.review_client().retrieve_reviews("abc").await.unwrap_err();
	assert_eq!(
		err,
		UpstreamError::Client {
			status: StatusCode::BAD_REQUEST,
			detail: "movieInfoId must be numeric".to_string(),
		}
	);
}

#[tokio::test]
async fn test_undecodable_metadata_body_retried_as_transport() {
	let upstreams = Upstreams::start().await;
	mount_info(&upstreams, "abc", ResponseTemplate::new(200).set_body_string("not json"), 3).await;

	let err = upstreams.movie_info_client().retrieve_movie_info("abc").await.unwrap_err();
	assert_matches!(err, UpstreamError::Transport(_));
}

#[tokio::test]
async fn test_undecodable_reviews_body_retried_as_transport() {
	let upstreams = Upstreams::start().await;
	mount_info(
		&upstreams,
		"abc",
		ResponseTemplate::new(200).set_body_json(batman_begins("abc")),
		1,
	)
	.await;
	mount_reviews(&upstreams, "abc", ResponseTemplate::new(200).set_body_string("not json"), 3).await;

	let (status, _) = get(&upstreams, "/v1/movies/abc").await;
	assert_eq!(status, StatusCode::BAD_GATEWAY);
}

#[tokio::test]
async fn test_request_timeout_retried_as_transport() {
	let upstreams = Upstreams::start().await;
	mount_info(
		&upstreams,
		"abc",
		ResponseTemplate::new(200)
			.set_body_json(batman_begins("abc"))
			.set_delay(Duration::from_millis(500)),
		3,
	)
	.await;

	let client = upstreams
		.movie_info_client()
		.with_request_timeout(Duration::from_millis(50));
	let err = client.retrieve_movie_info("abc").await.unwrap_err();
	assert_matches!(err, UpstreamError::Transport(_));
}

#[tokio::test]
async fn test_recovers_when_upstream_comes_back() {
	let upstreams = Upstreams::start().await;
	Mock::given(method("GET"))
		.and(path(format!("{MOVIE_INFOS_PATH}/abc")))
		.respond_with(ResponseTemplate::new(502))
		.up_to_n_times(2)
		.expect(2)
		.mount(&upstreams.info)
		.await;
	mount_info(
		&upstreams,
		"abc",
		ResponseTemplate::new(200).set_body_json(batman_begins("abc")),
		1,
	)
	.await;
	mount_reviews(&upstreams, "abc", ResponseTemplate::new(200).set_body_json(json!([])), 1).await;

	let movie = upstreams.aggregator().get_movie("abc").await.unwrap();
	assert_eq!(movie.movie_info.name, "Batman Begins");
}

#[tokio::test]
async fn test_unreachable_upstream_is_transport_error() {
	// Reserve a port, then release it so every connection is refused.
	let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
	let addr = listener.local_addr().unwrap();
	drop(listener);

	let client = MovieInfoClient::new(
		http_client(Duration::from_millis(500)).unwrap(),
		Url::parse(&format!("http://{addr}{MOVIE_INFOS_PATH}")).unwrap(),
		fast_retry(),
	);
	let err = client.retrieve_movie_info("abc").await.unwrap_err();
	assert_matches!(err, UpstreamError::Transport(_));
}

#[tokio::test]
async fn test_concurrent_requests_see_their_own_fixtures() {
	let upstreams = Upstreams::start().await;
	let ids: Vec<String> = (0..12).map(|i| format!("movie-{i}")).collect();
	for id in &ids {
		let mut info = batman_begins(id);
		info.name = format!("Movie {id}");
		mount_info(&upstreams, id, ResponseTemplate::new(200).set_body_json(info), 1).await;
		mount_reviews(
			&upstreams,
			id,
			ResponseTemplate::new(200)
				.set_body_json(json!([{"movieInfoId": id, "comment": format!("review of {id}"), "rating": 7.5}])),
			1,
		)
		.await;
	}

	let aggregator = upstreams.aggregator();
	let handles: Vec<_> = ids
		.iter()
		.cloned()
		.map(|id| {
			let aggregator = aggregator.clone();
			tokio::spawn(async move {
				let movie = aggregator.get_movie(&id).await;
				(id, movie)
			})
		})
		.collect();

	for handle in handles {
		let (id, movie) = handle.await.unwrap();
		let movie = movie.unwrap();
		assert_eq!(movie.movie_info.name, format!("Movie {id}"));
		assert_eq!(movie.reviews.len(), 1);
		assert_eq!(movie.reviews[0].comment, Some(format!("review of {id}")));
	}
}

#[tokio::test]
async fn test_dropped_request_abandons_pending_retry() {
	let upstreams =
		Upstreams::with_retry(Policy::new(NonZeroU8::new(3).unwrap(), Duration::from_secs(2))).await;
	Mock::given(method("GET"))
		.and(path(format!("{MOVIE_INFOS_PATH}/abc")))
		.respond_with(ResponseTemplate::new(500))
		.mount(&upstreams.info)
		.await;

	let aggregator = upstreams.aggregator();
	let result = tokio::time::timeout(Duration::from_millis(300), aggregator.get_movie("abc")).await;
	assert!(result.is_err(), "request should still be waiting on its backoff");

	// Had the retry survived the drop, a second call would land within the backoff window.
	tokio::time::sleep(Duration::from_millis(2500)).await;
	let received = upstreams.info.received_requests().await.unwrap();
	assert_eq!(received.len(), 1);
	assert!(upstreams.reviews.received_requests().await.unwrap().is_empty());
}
