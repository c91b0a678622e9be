//! Engagement record schema
//!
//! One row of the input table is one observation of a social post:
//! when it was published, where (platform, region), what it was about
//! (content theme) and the raw interaction counts.
//!
//! Category columns are open sets. Platforms, regions and themes are
//! plain strings discovered at load time, never fixed enums.

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// Columns the input table must provide, in canonical write order
pub const REQUIRED_COLUMNS: [&str; 8] = [
    "timestamp",
    "platform",
    "region",
    "content_theme",
    "views",
    "likes",
    "shares",
    "comments",
];

/// Format used when writing timestamps back to CSV. Fractional seconds are
/// written only when present.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.f";

const DATE_TIME_FORMATS: [&str; 6] = [
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
];

/// A single engagement observation.
///
/// Records are immutable once ingested. The engagement rate is not part of
/// the record; it is derived by [`crate::metrics::MetricDeriver`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngagementRecord {
    /// Publication time (naive, as written in the source table)
    #[serde(with = "timestamp_format")]
    pub timestamp: NaiveDateTime,
    /// Platform the post was published on (e.g. "TikTok")
    pub platform: String,
    /// Audience region (e.g. "France")
    pub region: String,
    /// Editorial theme (e.g. "Environment")
    pub content_theme: String,
    pub views: u64,
    pub likes: u64,
    pub shares: u64,
    pub comments: u64,
}

impl EngagementRecord {
    /// Create a record with all counts at zero
    pub fn new(
        timestamp: NaiveDateTime,
        platform: impl Into<String>,
        region: impl Into<String>,
        content_theme: impl Into<String>,
    ) -> Self {
        EngagementRecord {
            timestamp,
            platform: platform.into(),
            region: region.into(),
            content_theme: content_theme.into(),
            views: 0,
            likes: 0,
            shares: 0,
            comments: 0,
        }
    }

    /// Set the interaction counts
    pub fn with_counts(mut self, views: u64, likes: u64, shares: u64, comments: u64) -> Self {
        self.views = views;
        self.likes = likes;
        self.shares = shares;
        self.comments = comments;
        self
    }

    /// Calendar date of the observation (time-of-day discarded)
    pub fn date(&self) -> NaiveDate {
        self.timestamp.date()
    }
}

/// One CSV row before validation. Every field is kept as text so that a bad
/// cell rejects its row instead of aborting the whole load.
#[derive(Debug, Clone, Deserialize)]
pub struct RawRow {
    pub timestamp: String,
    pub platform: String,
    pub region: String,
    pub content_theme: String,
    pub views: String,
    pub likes: String,
    pub shares: String,
    pub comments: String,
}

impl RawRow {
    /// Validate the row and convert it into an [`EngagementRecord`]
    pub fn validate(self) -> Result<EngagementRecord, RowError> {
        let timestamp =
            parse_timestamp(&self.timestamp).ok_or_else(|| RowError::InvalidTimestamp {
                value: self.timestamp.clone(),
            })?;

        Ok(EngagementRecord {
            timestamp,
            platform: require_category("platform", self.platform)?,
            region: require_category("region", self.region)?,
            content_theme: require_category("content_theme", self.content_theme)?,
            views: parse_count("views", &self.views)?,
            likes: parse_count("likes", &self.likes)?,
            shares: parse_count("shares", &self.shares)?,
            comments: parse_count("comments", &self.comments)?,
        })
    }
}

/// Reasons a single row is rejected during ingestion
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RowError {
    #[error("unparseable timestamp {value:?}")]
    InvalidTimestamp { value: String },

    #[error("column {column} must be a non-negative integer, got {value:?}")]
    InvalidCount { column: String, value: String },

    #[error("column {column} is empty")]
    EmptyCategory { column: String },

    #[error("unreadable row: {message}")]
    Unreadable { message: String },
}

/// Parse a timestamp in any of the accepted ISO-like layouts.
///
/// RFC 3339 values carrying an offset are converted to UTC and the offset is
/// dropped. A bare date maps to midnight.
pub fn parse_timestamp(value: &str) -> Option<NaiveDateTime> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }

    for format in DATE_TIME_FORMATS {
        if let Ok(parsed) = NaiveDateTime::parse_from_str(value, format) {
            return Some(parsed);
        }
    }

    if let Ok(parsed) = DateTime::parse_from_rfc3339(value) {
        return Some(parsed.naive_utc());
    }

    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
}

fn parse_count(column: &str, value: &str) -> Result<u64, RowError> {
    value
        .trim()
        .parse::<u64>()
        .map_err(|_| RowError::InvalidCount {
            column: column.to_string(),
            value: value.to_string(),
        })
}

fn require_category(column: &str, value: String) -> Result<String, RowError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(RowError::EmptyCategory {
            column: column.to_string(),
        });
    }
    if trimmed.len() == value.len() {
        Ok(value)
    } else {
        Ok(trimmed.to_string())
    }
}

mod timestamp_format {
    use super::{parse_timestamp, TIMESTAMP_FORMAT};
    use chrono::NaiveDateTime;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(value: &NaiveDateTime, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(&value.format(TIMESTAMP_FORMAT))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<NaiveDateTime, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        parse_timestamp(&raw)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid timestamp: {raw}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Timelike;

    fn raw_row() -> RawRow {
        RawRow {
            timestamp: "2024-03-09 14:32:00".to_string(),
            platform: "TikTok".to_string(),
            region: "France".to_string(),
            content_theme: "Environment".to_string(),
            views: "52000".to_string(),
            likes: "7800".to_string(),
            shares: "2080".to_string(),
            comments: "1040".to_string(),
        }
    }

    #[test]
    fn test_parse_timestamp_layouts() {
        let expected = NaiveDate::from_ymd_opt(2024, 3, 9)
            .unwrap()
            .and_hms_opt(14, 32, 0)
            .unwrap();

        assert_eq!(parse_timestamp("2024-03-09 14:32:00"), Some(expected));
        assert_eq!(parse_timestamp("2024-03-09T14:32:00"), Some(expected));
        assert_eq!(parse_timestamp("2024-03-09 14:32"), Some(expected));
        assert_eq!(parse_timestamp("2024-03-09T14:32:00Z"), Some(expected));
        assert_eq!(parse_timestamp("2024-03-09T16:32:00+02:00"), Some(expected));
        assert_eq!(
            parse_timestamp("2024-03-09 14:32:00.250").map(|t| t.nanosecond()),
            Some(250_000_000)
        );
    }

    #[test]
    fn test_parse_timestamp_bare_date_is_midnight() {
        let parsed = parse_timestamp("2024-03-09").unwrap();
        assert_eq!(parsed.hour(), 0);
        assert_eq!(parsed.date(), NaiveDate::from_ymd_opt(2024, 3, 9).unwrap());
    }

    #[test]
    fn test_parse_timestamp_rejects_garbage() {
        assert_eq!(parse_timestamp(""), None);
        assert_eq!(parse_timestamp("yesterday"), None);
        assert_eq!(parse_timestamp("2024-02-30 10:00:00"), None);
    }

    #[test]
    fn test_validate_row() {
        let record = raw_row().validate().unwrap();
        assert_eq!(record.platform, "TikTok");
        assert_eq!(record.views, 52000);
        assert_eq!(record.comments, 1040);
    }

    #[test]
    fn test_validate_rejects_negative_count() {
        let mut row = raw_row();
        row.likes = "-4".to_string();

        assert_eq!(
            row.validate(),
            Err(RowError::InvalidCount {
                column: "likes".to_string(),
                value: "-4".to_string(),
            })
        );
    }

    #[test]
    fn test_validate_rejects_fractional_count() {
        let mut row = raw_row();
        row.views = "100.5".to_string();
        assert!(matches!(
            row.validate(),
            Err(RowError::InvalidCount { column, .. }) if column == "views"
        ));
    }

    #[test]
    fn test_validate_rejects_blank_platform() {
        let mut row = raw_row();
        row.platform = "   ".to_string();
        assert_eq!(
            row.validate(),
            Err(RowError::EmptyCategory {
                column: "platform".to_string()
            })
        );
    }

    #[test]
    fn test_serialize_uses_csv_timestamp_format() {
        let record = raw_row().validate().unwrap();
        let json = serde_json::to_string(&record).unwrap();
        assert!(json.contains("\"timestamp\":\"2024-03-09 14:32:00\""));

        let back: EngagementRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(back, record);
    }

    #[test]
    fn test_serialize_keeps_fractional_seconds() {
        let mut row = raw_row();
        row.timestamp = "2024-03-09 10:00:00.750".to_string();
        let record = row.validate().unwrap();

        let json = serde_json::to_string(&record).unwrap();
        assert!(json.contains("\"timestamp\":\"2024-03-09 10:00:00.750\""));

        let back: EngagementRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(back.timestamp.nanosecond(), 750_000_000);
    }
}
