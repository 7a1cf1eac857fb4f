//! UTC time sources and OCPP timestamp encoding.
//!
//! OCPP 1.6 puts every timestamp on the wire as ISO-8601 with a `Z` suffix.
//! Everything stored in the database is naive UTC (no zone marker) so that
//! comparisons and uniqueness checks never have to account for offsets.

use chrono::{DateTime, NaiveDateTime, Utc};
use thiserror::Error;

/// Current UTC time, formatted for the wire: `2024-01-01T12:00:00.123456Z`.
pub fn utc_now_iso() -> String {
    to_ocpp_iso(&Utc::now())
}

/// Current UTC time as a naive (zone-less) datetime, for DB storage.
pub fn utc_now_naive() -> NaiveDateTime {
    Utc::now().naive_utc()
}

/// Format any UTC instant the way OCPP expects it on the wire.
pub fn to_ocpp_iso(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(chrono::SecondsFormat::Micros, true)
}

#[derive(Debug, Error)]
pub enum TimestampError {
    #[error("invalid OCPP timestamp {0:?}: {1}")]
    Invalid(String, chrono::ParseError),
}

/// Parse an inbound OCPP timestamp (`Z` suffix or explicit offset) into a
/// naive UTC datetime suitable for storage.
pub fn parse_ocpp_timestamp(raw: &str) -> Result<NaiveDateTime, TimestampError> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc).naive_utc())
        .map_err(|e| TimestampError::Invalid(raw.to_string(), e))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wire_timestamp_ends_with_z() {
        assert!(utc_now_iso().ends_with('Z'));
    }

    #[test]
    fn roundtrip_within_a_second() {
        let now = utc_now_naive();
        let wire = utc_now_iso();
        let parsed = parse_ocpp_timestamp(&wire).unwrap();
        let delta = (parsed - now).num_milliseconds().abs();
        assert!(delta < 1000, "round trip drifted by {delta}ms");
    }

    #[test]
    fn parses_offset_form() {
        let parsed = parse_ocpp_timestamp("2024-01-01T10:00:00+00:00").unwrap();
        assert_eq!(parsed.to_string(), "2024-01-01 10:00:00");
    }

    #[test]
    fn rejects_garbage() {
        assert!(parse_ocpp_timestamp("not-a-timestamp").is_err());
    }
}
