use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime};

/// Parses raw strings into dates for `Date` properties.
pub trait DateParser: Send + Sync {
    /// The parsed date, or `None` when `raw` is not a date.
    fn parse(&self, raw: &str) -> Option<DateTime<FixedOffset>>;
}

/// Accepts RFC 3339 plus the common naive layouts, which are taken as UTC.
#[derive(Debug, Default, Clone, Copy)]
pub struct ChronoDateParser;

const NAIVE_DATE_TIMES: [&str; 2] = ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"];

impl DateParser for ChronoDateParser {
    fn parse(&self, raw: &str) -> Option<DateTime<FixedOffset>> {
        let raw = raw.trim();
        if let Ok(date) = DateTime::parse_from_rfc3339(raw) {
            return Some(date);
        }
        for format in NAIVE_DATE_TIMES {
            if let Ok(date) = NaiveDateTime::parse_from_str(raw, format) {
                return Some(date.and_utc().fixed_offset());
            }
        }
        NaiveDate::parse_from_str(raw, "%Y-%m-%d")
            .ok()
            .and_then(|date| date.and_hms_opt(0, 0, 0))
            .map(|date| date.and_utc().fixed_offset())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_common_layouts() {
        let parser = ChronoDateParser;
        for raw in [
            "2024-03-01T12:30:00+02:00",
            "2024-03-01 12:30:00",
            "2024-03-01T12:30:00",
            "2024-03-01",
        ] {
            assert!(parser.parse(raw).is_some(), "{raw}");
        }
        assert_eq!(
            parser.parse("2024-03-01").map(|d| d.to_rfc3339()),
            Some("2024-03-01T00:00:00+00:00".to_string())
        );
    }

    #[test]
    fn rejects_garbage() {
        let parser = ChronoDateParser;
        assert_eq!(parser.parse("yesterday"), None);
        assert_eq!(parser.parse("2024-13-01"), None);
    }
}
