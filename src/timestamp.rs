use chrono::{NaiveDateTime, Utc};
use thiserror::Error;

pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";
/// Environment variable holding the creation timestamp shared by one run.
pub const NOW_VAR: &str = "NOW";

pub fn parse_timestamp(timestamp: &str) -> Result<NaiveDateTime, TimestampError>
{
	NaiveDateTime::parse_from_str(timestamp, TIMESTAMP_FORMAT).map_err(|_| TimestampError::Parse(timestamp.to_owned()))
}

pub fn format_timestamp(time: &NaiveDateTime) -> String
{
	time.format(TIMESTAMP_FORMAT).to_string()
}

/// Decides the creation timestamp from `NOW` or the clock, publishing the result back to `NOW`.
pub(crate) fn resolve_creation_timestamp() -> String
{
	if let Ok(now) = std::env::var(NOW_VAR)
	{
		// only the leading timestamp has to parse, anything after it is carried along
		if NaiveDateTime::parse_and_remainder(&now, TIMESTAMP_FORMAT).is_ok()
		{
			return now;
		}
		tracing::info!("{NOW_VAR} environment variable set, but not in YYYY-MM-DDTHH:MM:SSZ format so ignoring");
	}
	let now = format_timestamp(&Utc::now().naive_utc());
	std::env::set_var(NOW_VAR, &now);
	now
}

#[derive(Clone, Debug, Eq, Error, PartialEq)]
pub enum TimestampError
{
	#[error("error parsing timestamp {0:?}")]
	Parse(String),
}
