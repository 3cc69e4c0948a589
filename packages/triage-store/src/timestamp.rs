use time::{
	OffsetDateTime, PrimitiveDateTime, UtcOffset,
	format_description::{BorrowedFormatItem, well_known::Rfc3339},
	macros::{datetime, format_description},
};

use crate::{Error, Result};

/// Cursor value used when nothing durable can be recovered.
pub const DEFAULT_CURSOR: &str = "2024-01-01T00:00:00Z";
pub const DEFAULT_CURSOR_TIME: OffsetDateTime = datetime!(2024-01-01 00:00:00 UTC);

const ZONELESS: &[BorrowedFormatItem<'_>] =
	format_description!("[year]-[month]-[day]T[hour]:[minute]:[second]");
const ZONELESS_FRACTION: &[BorrowedFormatItem<'_>] =
	format_description!("[year]-[month]-[day]T[hour]:[minute]:[second].[subsecond]");
const MINUTE_ZONELESS: &[BorrowedFormatItem<'_>] =
	format_description!("[year]-[month]-[day]T[hour]:[minute]");
const MINUTE_ZULU: &[BorrowedFormatItem<'_>] =
	format_description!("[year]-[month]-[day]T[hour]:[minute]Z");
const MINUTE_OFFSET: &[BorrowedFormatItem<'_>] = format_description!(
	"[year]-[month]-[day]T[hour]:[minute][offset_hour sign:mandatory]:[offset_minute]"
);
const RECORD_DATETIME: &[BorrowedFormatItem<'_>] =
	format_description!("[year]-[month]-[day] [hour]:[minute]:[second]");

/// Parses an ISO-8601 issue time into a UTC instant.
///
/// Accepts RFC 3339 with `Z` or a numeric offset, the same with minute precision, and zone-less
/// values, which are read as UTC.
pub fn parse_timestamp(raw: &str) -> Result<OffsetDateTime> {
	let trimmed = raw.trim();

	if let Ok(ts) = OffsetDateTime::parse(trimmed, &Rfc3339) {
		return Ok(ts.to_offset(UtcOffset::UTC));
	}
	if let Ok(ts) = OffsetDateTime::parse(trimmed, MINUTE_OFFSET) {
		return Ok(ts.to_offset(UtcOffset::UTC));
	}

	for format in [ZONELESS, ZONELESS_FRACTION, MINUTE_ZULU, MINUTE_ZONELESS] {
		if let Ok(ts) = PrimitiveDateTime::parse(trimmed, format) {
			return Ok(ts.assume_utc());
		}
	}

	Err(Error::MalformedTimestamp { value: raw.to_string() })
}

/// Renders an instant as RFC 3339 in UTC, with the `Z` suffix.
pub fn format_utc(ts: OffsetDateTime) -> Result<String> {
	ts.to_offset(UtcOffset::UTC)
		.format(&Rfc3339)
		.map_err(|_| Error::MalformedTimestamp { value: ts.to_string() })
}

/// Local wall-clock time, or UTC when the local offset cannot be determined.
pub fn now_local() -> OffsetDateTime {
	OffsetDateTime::now_local().unwrap_or_else(|_| OffsetDateTime::now_utc())
}

/// `YYYY-MM-DD HH:MM:SS`, the `datetime` column format of feedback rows.
pub fn record_datetime(ts: OffsetDateTime) -> String {
	ts.format(RECORD_DATETIME).unwrap_or_else(|_| ts.to_string())
}
