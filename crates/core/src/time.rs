use chrono::{DateTime, NaiveDateTime, SecondsFormat, Utc};

/// Time source shared by services so tests can pin "now".
#[derive(Debug, Clone, Copy, Default)]
pub enum Clock {
    #[default]
    Default,
    Fixed(DateTime<Utc>),
}

impl Clock {
    /// Returns a clock that uses the current system time.
    #[must_use]
    pub fn default_clock() -> Self {
        Self::Default
    }

    /// Returns a clock fixed at the given timestamp.
    #[must_use]
    pub fn fixed(at: DateTime<Utc>) -> Self {
        Self::Fixed(at)
    }

    #[must_use]
    pub fn now(&self) -> DateTime<Utc> {
        match self {
            Clock::Default => Utc::now(),
            Clock::Fixed(t) => *t,
        }
    }
}

#[must_use]
pub fn to_stored_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Parse a stored timestamp into epoch milliseconds.
///
/// Accepts RFC 3339 and offset-less ISO 8601 (read as UTC). Anything else is `None`.
#[must_use]
pub fn parse_timestamp_millis(raw: &str) -> Option<i64> {
    let raw = raw.trim();
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Some(parsed.timestamp_millis());
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|naive| naive.and_utc().timestamp_millis())
}

/// Human-readable form of a stored timestamp, e.g. `Nov 14, 2023, 10:13 PM` (UTC).
///
/// `"Never"` when absent; the raw string when it cannot be parsed.
#[must_use]
pub fn format_timestamp(raw: Option<&str>) -> String {
    let Some(raw) = raw.filter(|r| !r.is_empty()) else {
        return "Never".to_string();
    };
    match parse_timestamp_millis(raw).and_then(DateTime::<Utc>::from_timestamp_millis) {
        Some(at) => at.format("%b %-d, %Y, %-I:%M %p").to_string(),
        None => raw.to_string(),
    }
}

/// Deterministic timestamp for tests and examples (2023-11-14T22:13:20Z).
pub const FIXED_TEST_TIMESTAMP: i64 = 1_700_000_000;

/// Returns a deterministic `DateTime<Utc>` for tests and doc examples.
///
/// # Panics
///
/// Panics if the fixed timestamp cannot be represented.
#[must_use]
pub fn fixed_now() -> DateTime<Utc> {
    DateTime::<Utc>::from_timestamp(FIXED_TEST_TIMESTAMP, 0)
        .expect("fixed timestamp should be valid")
}

/// Returns a `Clock` fixed at the deterministic test timestamp.
#[must_use]
pub fn fixed_clock() -> Clock {
    Clock::fixed(fixed_now())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stamp_round_trips_through_parser() {
        let clock = fixed_clock();
        let stamp = to_stored_timestamp(clock.now());
        assert_eq!(stamp, "2023-11-14T22:13:20.000Z");
        assert_eq!(
            parse_timestamp_millis(&stamp),
            Some(FIXED_TEST_TIMESTAMP * 1000)
        );
    }

    #[test]
    fn parses_offsets_and_naive_iso() {
        assert_eq!(
            parse_timestamp_millis("2023-11-14T23:13:20+01:00"),
            Some(FIXED_TEST_TIMESTAMP * 1000)
        );
        assert_eq!(
            parse_timestamp_millis("2023-11-14T22:13:20"),
            Some(FIXED_TEST_TIMESTAMP * 1000)
        );
        assert_eq!(parse_timestamp_millis("yesterday"), None);
    }

    #[test]
    fn formats_for_display() {
        assert_eq!(format_timestamp(None), "Never");
        assert_eq!(format_timestamp(Some("garbled")), "garbled");
        assert_eq!(
            format_timestamp(Some("2023-11-14T22:13:20Z")),
            "Nov 14, 2023, 10:13 PM"
        );
    }
}
