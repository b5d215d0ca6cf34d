//! Compact `yyyyMMdd` date codec.
//!
//! The catalog encodes submission and approval dates as eight-digit strings
//! (`"20241231"`). Empty strings and `null` mean "no date".

use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serializer};

use crate::{LicatError, Result};

const COMPACT_FORMAT: &str = "%Y%m%d";

/// Parse a compact date. Empty input is `None`; anything that is not exactly
/// eight digits forming a valid calendar date is a decode error.
pub fn parse_compact_date(raw: &str) -> Result<Option<NaiveDate>> {
    if raw.is_empty() {
        return Ok(None);
    }
    if raw.len() != 8 || !raw.bytes().all(|b| b.is_ascii_digit()) {
        return Err(LicatError::Decode(format!(
            "expected an 8-digit yyyyMMdd date, got '{raw}'"
        )));
    }
    NaiveDate::parse_from_str(raw, COMPACT_FORMAT)
        .map(Some)
        .map_err(|e| LicatError::Decode(format!("invalid date '{raw}': {e}")))
}

/// Format a date in compact form.
pub fn format_compact_date(date: NaiveDate) -> String {
    date.format(COMPACT_FORMAT).to_string()
}

/// Serde adapter for `Option<NaiveDate>` fields, used with `#[serde(with = "compact_date")]`.
pub mod compact_date {
    use super::*;

    pub fn serialize<S: Serializer>(
        date: &Option<NaiveDate>,
        serializer: S,
    ) -> std::result::Result<S::Ok, S::Error> {
        match date {
            Some(d) => serializer.serialize_str(&format_compact_date(*d)),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> std::result::Result<Option<NaiveDate>, D::Error> {
        let raw: Option<String> = Option::deserialize(deserializer)?;
        match raw {
            None => Ok(None),
            Some(s) => parse_compact_date(&s).map_err(serde::de::Error::custom),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_compact_form() {
        let date = parse_compact_date("20250201").unwrap();
        assert_eq!(date, NaiveDate::from_ymd_opt(2025, 2, 1));
    }

    #[test]
    fn empty_is_none() {
        assert_eq!(parse_compact_date("").unwrap(), None);
    }

    #[test]
    fn dashed_form_is_rejected() {
        let err = parse_compact_date("2025-02-01").unwrap_err();
        assert!(matches!(err, LicatError::Decode(_)));
    }

    #[test]
    fn impossible_calendar_date_is_rejected() {
        assert!(parse_compact_date("20250230").is_err());
    }

    #[test]
    fn signed_or_short_years_are_rejected() {
        assert!(parse_compact_date("+2025020").is_err());
        assert!(parse_compact_date("2025021").is_err());
    }

    #[test]
    fn formats_with_zero_padding() {
        let date = NaiveDate::from_ymd_opt(2024, 1, 5).unwrap();
        assert_eq!(format_compact_date(date), "20240105");
    }
}
