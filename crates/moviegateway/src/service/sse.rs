use std::convert::Infallible;

use axum::BoxError;
use axum::response::sse::{Event, KeepAlive, Sse};
use futures::stream::{Stream, StreamExt};
use serde::Serialize;

use crate::broadcast::Subscription;

/// Expose a broadcaster subscription as a never-ending event stream.
///
/// Dropping the response body (client disconnect) drops the subscription.
pub fn subscription<T>(
	subscription: Subscription<T>,
) -> Sse<impl Stream<Item = Result<Event, axum::Error>>>
where
	T: Serialize + Clone + Send + 'static,
{
	relay(subscription.map(Ok::<_, Infallible>))
}

/// Render each item as one JSON `data:` event. An error item aborts the body.
pub fn relay<S, T, E>(items: S) -> Sse<impl Stream<Item = Result<Event, axum::Error>>>
where
	S: Stream<Item = Result<T, E>> + Send + 'static,
	T: Serialize,
	E: Into<BoxError>,
{
	let events = items.map(|item| match item {
		Ok(item) => Event::default().json_data(item),
		Err(e) => Err(axum::Error::new(e)),
	});
	Sse::new(events).keep_alive(KeepAlive::default())
}
