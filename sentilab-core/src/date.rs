//! Date normalization across heterogeneous source formats.
//!
//! Formats are attempted in a fixed priority order and the first full-string
//! match wins. Offset-bearing timestamps are shifted to UTC by their embedded
//! offset before the calendar date is taken. There is no permissive fallback:
//! text that matches none of the known formats is reported as unparseable.

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Known source formats, in the order they are attempted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DateFormat {
    /// `2020-01-15 09:30:00+00:00`, `2020-01-15T09:30:00Z`
    IsoWithOffset,
    /// `2020-01-15 09:30:00`
    IsoDateTime,
    /// `01/15/2020 09:30`
    UsDateTime,
    /// `01/15/2020`
    UsDate,
    /// `15-01-2020 09:30`
    EuropeanDateTime,
    /// `15-01-2020`
    EuropeanDate,
    /// `2020-01-15`
    IsoDate,
}

impl DateFormat {
    /// Attempt order. An offset-bearing pattern must precede the bare ISO
    /// date so a zoned timestamp is never truncated by the weaker pattern.
    pub const PRIORITY: [DateFormat; 7] = [
        DateFormat::IsoWithOffset,
        DateFormat::IsoDateTime,
        DateFormat::UsDateTime,
        DateFormat::UsDate,
        DateFormat::EuropeanDateTime,
        DateFormat::EuropeanDate,
        DateFormat::IsoDate,
    ];

    fn patterns(self) -> &'static [&'static str] {
        match self {
            DateFormat::IsoWithOffset => &[
                "%Y-%m-%d %H:%M:%S%.f%:z",
                "%Y-%m-%d %H:%M:%S%.f%z",
                "%Y-%m-%dT%H:%M:%S%.f%:z",
                "%Y-%m-%dT%H:%M:%S%.f%z",
            ],
            DateFormat::IsoDateTime => &["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"],
            DateFormat::UsDateTime => &["%m/%d/%Y %H:%M:%S", "%m/%d/%Y %H:%M"],
            DateFormat::UsDate => &["%m/%d/%Y"],
            DateFormat::EuropeanDateTime => &["%d-%m-%Y %H:%M:%S", "%d-%m-%Y %H:%M"],
            DateFormat::EuropeanDate => &["%d-%m-%Y"],
            DateFormat::IsoDate => &["%Y-%m-%d"],
        }
    }

    /// Parse `text` with this format only. Returns a zone-naive timestamp
    /// (UTC for offset-bearing input) and whether a time component was present.
    fn attempt(self, text: &str) -> Option<(NaiveDate, Option<NaiveTime>)> {
        match self {
            DateFormat::IsoWithOffset => {
                let zoned = self
                    .patterns()
                    .iter()
                    .find_map(|p| DateTime::parse_from_str(text, p).ok())
                    .or_else(|| DateTime::parse_from_rfc3339(text).ok())?;
                let utc = zoned.naive_utc();
                Some((utc.date(), Some(utc.time())))
            }
            DateFormat::IsoDateTime
            | DateFormat::UsDateTime
            | DateFormat::EuropeanDateTime => self
                .patterns()
                .iter()
                .find_map(|p| NaiveDateTime::parse_from_str(text, p).ok())
                .map(|dt| (dt.date(), Some(dt.time()))),
            DateFormat::UsDate | DateFormat::EuropeanDate | DateFormat::IsoDate => self
                .patterns()
                .iter()
                .find_map(|p| NaiveDate::parse_from_str(text, p).ok())
                .map(|d| (d, None)),
        }
    }
}

/// A successfully normalized value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NormalizedTimestamp {
    /// Calendar date (UTC for offset-bearing input).
    pub date: NaiveDate,
    /// Time of day when the source carried one.
    pub time: Option<NaiveTime>,
    /// The format that matched.
    pub format: DateFormat,
}

/// The text matched none of the known formats.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unparseable date: {0:?}")]
pub struct UnparseableDate(pub String);

/// Date normalizer over the fixed [`DateFormat::PRIORITY`] list.
pub struct DateNormalizer;

impl DateNormalizer {
    /// Parse `text` into a normalized timestamp, or report it unparseable.
    pub fn parse(text: &str) -> Result<NormalizedTimestamp, UnparseableDate> {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return Err(UnparseableDate(text.to_string()));
        }
        DateFormat::PRIORITY
            .iter()
            .find_map(|&format| {
                format
                    .attempt(trimmed)
                    .map(|(date, time)| NormalizedTimestamp { date, time, format })
            })
            .ok_or_else(|| UnparseableDate(text.to_string()))
    }

    /// Calendar date only; `None` when unparseable.
    pub fn normalize(text: &str) -> Option<NaiveDate> {
        Self::parse(text).ok().map(|ts| ts.date)
    }
}

/// Shorthand for [`DateNormalizer::normalize`].
pub fn normalize_date(text: &str) -> Option<NaiveDate> {
    DateNormalizer::normalize(text)
}

/// Shorthand for [`DateNormalizer::parse`], keeping the time of day.
pub fn parse_timestamp(text: &str) -> Result<NormalizedTimestamp, UnparseableDate> {
    DateNormalizer::parse(text)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn every_supported_format_normalizes_to_same_date() {
        let cases = [
            ("2020-01-15 09:30:00+00:00", DateFormat::IsoWithOffset),
            ("2020-01-15 09:30:00+0000", DateFormat::IsoWithOffset),
            ("2020-01-15T09:30:00Z", DateFormat::IsoWithOffset),
            ("2020-01-15 09:30:00.250-04:00", DateFormat::IsoWithOffset),
            ("2020-01-15 09:30:00", DateFormat::IsoDateTime),
            ("2020-01-15T09:30:00", DateFormat::IsoDateTime),
            ("01/15/2020 09:30", DateFormat::UsDateTime),
            ("01/15/2020 09:30:15", DateFormat::UsDateTime),
            ("01/15/2020", DateFormat::UsDate),
            ("15-01-2020 09:30", DateFormat::EuropeanDateTime),
            ("15-01-2020", DateFormat::EuropeanDate),
            ("2020-01-15", DateFormat::IsoDate),
        ];
        for (text, format) in cases {
            let ts = DateNormalizer::parse(text).unwrap_or_else(|e| panic!("{text}: {e}"));
            assert_eq!(ts.date, ymd(2020, 1, 15), "{text}");
            assert_eq!(ts.format, format, "{text}");
        }
    }

    #[test]
    fn free_text_is_unparseable_not_guessed() {
        assert!(DateNormalizer::parse("15th of January").is_err());
        assert!(DateNormalizer::parse("January 15, 2020").is_err());
        assert_eq!(normalize_date("yesterday"), None);
        assert_eq!(normalize_date(""), None);
        assert_eq!(normalize_date("   "), None);
    }

    #[test]
    fn partial_matches_are_rejected() {
        assert_eq!(normalize_date("2020-01-15abc"), None);
        assert_eq!(normalize_date("2020-01-15 09:30:00 EST"), None);
    }

    #[test]
    fn impossible_calendar_dates_are_rejected() {
        assert_eq!(normalize_date("2020-02-30"), None);
        assert_eq!(normalize_date("13/01/2020"), None);
    }

    #[test]
    fn offset_is_applied_before_taking_the_date() {
        // 22:30 at UTC-5 is 03:30 the next day in UTC.
        let ts = DateNormalizer::parse("2020-01-15 22:30:00-05:00").unwrap();
        assert_eq!(ts.date, ymd(2020, 1, 16));
        assert_eq!(ts.time, NaiveTime::from_hms_opt(3, 30, 0));

        // Midday values stay on the same calendar day.
        assert_eq!(
            normalize_date("2020-06-05 10:30:54-04:00"),
            Some(ymd(2020, 6, 5))
        );
    }

    #[test]
    fn us_format_wins_over_european_for_slash_dates() {
        assert_eq!(normalize_date("02/03/2021"), Some(ymd(2021, 2, 3)));
        // Dashes only match the European pattern.
        assert_eq!(normalize_date("02-03-2021"), Some(ymd(2021, 3, 2)));
    }

    #[test]
    fn surrounding_whitespace_is_ignored() {
        assert_eq!(normalize_date("  2020-01-15\n"), Some(ymd(2020, 1, 15)));
    }

    #[test]
    fn date_only_formats_carry_no_time() {
        assert_eq!(parse_timestamp("2020-01-15").unwrap().time, None);
        assert!(DateNormalizer::parse("01/15/2020 16:05").unwrap().time.is_some());
    }

    #[test]
    fn error_carries_original_text() {
        let err = DateNormalizer::parse("not a date").unwrap_err();
        assert_eq!(err, UnparseableDate("not a date".into()));
        assert!(err.to_string().contains("not a date"));
    }
}
