//! Human readable durations (`500ms`, `5s`, `1m30s`) for config fields.

use std::time::Duration;

use serde::{Deserialize, Deserializer, Serializer};

pub fn serialize<S: Serializer>(dur: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
	serializer.serialize_str(&durationfmt::to_string(*dur))
}

pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
	let raw = String::deserialize(deserializer)?;
	parse(&raw).map_err(serde::de::Error::custom)
}

/// Parse a duration string. Negative durations are rejected.
pub fn parse(raw: &str) -> Result<Duration, String> {
	let nanos = go_parse_duration::parse_duration(raw)
		.map_err(|e| format!("invalid duration '{raw}': {e:?}"))?;
	let nanos = u64::try_from(nanos).map_err(|_| format!("negative duration '{raw}'"))?;
	Ok(Duration::from_nanos(nanos))
}
