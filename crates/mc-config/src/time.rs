//! Timestamp formats accepted in option mappings.

use chrono::{NaiveDate, NaiveDateTime};

use crate::validate::{ValidationError, ValidationResult};

/// Canonical timestamp format, shared with the sample CSV time column.
pub const TIME_FORMAT: &str = "%Y/%m/%d %H:%M:%S";

/// Date-only format; parsed as midnight.
pub const DATE_FORMAT: &str = "%Y/%m/%d";

/// ISO-8601 local timestamp without offset.
pub const ISO_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// Parse an option timestamp in any accepted format.
pub fn parse_time(key: &str, text: &str) -> ValidationResult<NaiveDateTime> {
    let text = text.trim();
    if let Ok(t) = NaiveDateTime::parse_from_str(text, TIME_FORMAT) {
        return Ok(t);
    }
    if let Ok(t) = NaiveDateTime::parse_from_str(text, ISO_FORMAT) {
        return Ok(t);
    }
    if let Ok(d) = NaiveDate::parse_from_str(text, DATE_FORMAT) {
        return Ok(NaiveDateTime::from(d));
    }
    Err(ValidationError::ParseError {
        key: key.to_string(),
        message: format!(
            "{:?} is not a timestamp (expected YYYY/MM/DD HH:MM:SS, YYYY/MM/DD or YYYY-MM-DDTHH:MM:SS)",
            text
        ),
    })
}

/// Format a timestamp in the canonical format.
pub fn format_time(t: &NaiveDateTime) -> String {
    t.format(TIME_FORMAT).to_string()
}

/// Serde adapter writing timestamps in [`TIME_FORMAT`].
pub mod serde_format {
    use chrono::NaiveDateTime;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(t: &NaiveDateTime, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&super::format_time(t))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<NaiveDateTime, D::Error> {
        let text = String::deserialize(d)?;
        super::parse_time("time", &text).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Timelike;

    #[test]
    fn parses_all_accepted_formats() {
        let full = parse_time("t", "2021/03/04 05:06:07").unwrap();
        let iso = parse_time("t", "2021-03-04T05:06:07").unwrap();
        assert_eq!(full, iso);

        let date = parse_time("t", "2021/03/04").unwrap();
        assert_eq!(date.date(), full.date());
        assert_eq!(date.hour(), 0);
    }

    #[test]
    fn rejects_garbage() {
        let err = parse_time("bg_time_init", "yesterday").unwrap_err();
        assert!(matches!(err, ValidationError::ParseError { ref key, .. } if key == "bg_time_init"));
    }

    #[test]
    fn format_matches_canonical() {
        let t = parse_time("t", "2021/03/04 05:06:07").unwrap();
        assert_eq!(format_time(&t), "2021/03/04 05:06:07");
    }
}
