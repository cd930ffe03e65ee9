//! Movie aggregation gateway.
//!
//! Combines a movie-metadata upstream and a review upstream into a single
//! composite view, and republishes newly created records to live event-stream
//! subscribers.

pub mod aggregator;
pub mod broadcast;
pub mod client;
pub mod config;
pub mod retry;
pub mod serde_dur;
pub mod service;
pub mod store;
pub mod telemetry;
pub mod types;
pub mod validation;

pub use aggregator::MoviesAggregator;
pub use broadcast::{Broadcaster, Subscription};
pub use client::{MovieInfoClient, ReviewClient, UpstreamError};
pub use config::Config;
pub use types::{Movie, MovieInfo, Review};
