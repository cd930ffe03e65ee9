//! Records exchanged with the upstream services and returned to callers.

use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};

use crate::store::Record;

/// Canonical movie metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MovieInfo {
	/// Assigned by the store on first save, never changed afterwards.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub movie_info_id: Option<String>,
	#[serde(default)]
	pub name: String,
	#[serde(default)]
	pub year: i32,
	#[serde(default)]
	pub cast: Vec<String>,
	#[serde(rename = "release_date")]
	pub release_date: NaiveDate,
}

impl MovieInfo {
	pub fn new(
		name: impl Into<String>,
		year: i32,
		cast: Vec<String>,
		release_date: NaiveDate,
	) -> Self {
		Self {
			movie_info_id: None,
			name: name.into(),
			year,
			cast,
			release_date,
		}
	}

	pub fn with_id(mut self, id: impl Into<String>) -> Self {
		self.movie_info_id = Some(id.into());
		self
	}

	/// Replace every mutable field with the values from `update`, keeping the id.
	pub fn replace_with(&mut self, update: MovieInfo) {
		self.name = update.name;
		self.year = update.year;
		self.cast = update.cast;
		self.release_date = update.release_date;
	}
}

impl Record for MovieInfo {
	fn id(&self) -> Option<&str> {
		self.movie_info_id.as_deref()
	}

	fn set_id(&mut self, id: String) {
		self.movie_info_id = Some(id);
	}

	fn secondary_key(&self) -> Option<String> {
		Some(self.year.to_string())
	}
}

/// A review of one movie. `movie_info_id` is advisory, nothing checks that the
/// referenced metadata exists.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Review {
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub review_id: Option<String>,
	#[serde(default, deserialize_with = "de_opt_id")]
	pub movie_info_id: Option<String>,
	#[serde(default)]
	pub comment: Option<String>,
	#[serde(default)]
	pub rating: Option<f64>,
}

impl Review {
	pub fn new(movie_info_id: impl Into<String>, comment: impl Into<String>, rating: f64) -> Self {
		Self {
			review_id: None,
			movie_info_id: Some(movie_info_id.into()),
			comment: Some(comment.into()),
			rating: Some(rating),
		}
	}
}

impl Record for Review {
	fn id(&self) -> Option<&str> {
		self.review_id.as_deref()
	}

	fn set_id(&mut self, id: String) {
		self.review_id = Some(id);
	}

	fn secondary_key(&self) -> Option<String> {
		self.movie_info_id.clone()
	}
}

/// Metadata plus its reviews. Built per request, never stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Movie {
	pub movie_info: MovieInfo,
	#[serde(default)]
	pub reviews: Vec<Review>,
}

impl Movie {
	pub fn new(movie_info: MovieInfo, reviews: Vec<Review>) -> Self {
		Self {
			movie_info,
			reviews,
		}
	}
}

// Review services in the wild emit the metadata id as either a JSON string or a number.
fn de_opt_id<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
	D: Deserializer<'de>,
{
	#[derive(Deserialize)]
	#[serde(untagged)]
	enum RawId {
		Text(String),
		Number(i64),
	}

	Ok(Option::<RawId>::deserialize(deserializer)?.map(|raw| match raw {
		RawId::Text(s) => s,
		RawId::Number(n) => n.to_string(),
	}))
}
