//! Replay-latest publish/subscribe channel for newly created records.
//!
//! The broadcaster keeps the most recently published item and fans every new
//! item out to all attached subscribers. A subscriber attaching late first
//! receives the retained item, then everything published after it attached.

use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll, ready};

use futures::Stream;
use parking_lot::Mutex;
use tokio::sync::broadcast;
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::wrappers::errors::BroadcastStreamRecvError;
use tracing::{debug, warn};

/// Default number of items buffered per subscriber before the oldest are dropped.
pub const DEFAULT_BUFFER: usize = 16;

/// Process-wide broadcaster for one record type. Cloning shares the channel.
pub struct Broadcaster<T> {
	inner: Arc<Inner<T>>,
}

struct Inner<T> {
	// Guards the replay slot and orders it against subscribe.
	latest: Mutex<Option<T>>,
	tx: broadcast::Sender<T>,
}

impl<T> Clone for Broadcaster<T> {
	fn clone(&self) -> Self {
		Self {
			inner: Arc::clone(&self.inner),
		}
	}
}

impl<T: Clone + Send + 'static> Default for Broadcaster<T> {
	fn default() -> Self {
		Self::new(DEFAULT_BUFFER)
	}
}

impl<T: Clone + Send + 'static> Broadcaster<T> {
	/// `buffer` bounds each subscriber's backlog; a subscriber that falls
	/// further behind loses its oldest pending items.
	pub fn new(buffer: usize) -> Self {
		let (tx, _) = broadcast::channel(buffer.max(1));
		Self {
			inner: Arc::new(Inner {
				latest: Mutex::new(None),
				tx,
			}),
		}
	}

	/// Publish `item` to every attached subscriber and retain it for late ones.
	///
	/// Never waits on subscribers and never fails.
	pub fn publish(&self, item: T) {
		let mut latest = self.inner.latest.lock();
		*latest = Some(item.clone());
		let delivered = self.inner.tx.send(item).unwrap_or(0);
		debug!(subscribers = delivered, "published item");
	}

	/// Attach a new subscriber.
	///
	/// The returned stream yields the retained item (if any), then every item
	/// published afterwards, in publish order. It has no natural end; dropping
	/// it detaches the subscriber.
	pub fn subscribe(&self) -> Subscription<T> {
		let latest = self.inner.latest.lock();
		let rx = self.inner.tx.subscribe();
		debug!(subscribers = self.inner.tx.receiver_count(), "subscriber attached");
		Subscription {
			replay: latest.clone(),
			rx: BroadcastStream::new(rx),
		}
	}

	/// The most recently published item.
	pub fn latest(&self) -> Option<T> {
		self.inner.latest.lock().clone()
	}

	pub fn subscriber_count(&self) -> usize {
		self.inner.tx.receiver_count()
	}
}

/// One subscriber's view of a [`Broadcaster`].
pub struct Subscription<T> {
	replay: Option<T>,
	rx: BroadcastStream<T>,
}

// Nothing in a subscription is structurally pinned.
impl<T> Unpin for Subscription<T> {}

impl<T: Clone + Send + 'static> Stream for Subscription<T> {
	type Item = T;

	fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<T>> {
		if let Some(item) = self.replay.take() {
			return Poll::Ready(Some(item));
		}
		loop {
			match ready!(Pin::new(&mut self.rx).poll_next(cx)) {
				Some(Ok(item)) => return Poll::Ready(Some(item)),
				Some(Err(BroadcastStreamRecvError::Lagged(skipped))) => {
					warn!(skipped, "slow subscriber dropped items");
				},
				None => return Poll::Ready(None),
			}
		}
	}
}
