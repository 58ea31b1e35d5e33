//! Date parsing and US-style display formatting.

use chrono::{DateTime, NaiveDate, TimeZone, Utc};

use crate::error::{Result, StorageError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DateStyle {
    /// `January 15, 2024`
    #[default]
    Long,
    /// `Jan 15, 2024`
    Medium,
    /// `1/15/2024`
    Short,
    /// `2024-01-15`
    Iso,
}

impl DateStyle {
    fn pattern(self) -> &'static str {
        match self {
            DateStyle::Long => "%B %-d, %Y",
            DateStyle::Medium => "%b %-d, %Y",
            DateStyle::Short => "%-m/%-d/%Y",
            DateStyle::Iso => "%Y-%m-%d",
        }
    }
}

pub fn format_date(date: &DateTime<Utc>) -> String {
    format_date_with(date, DateStyle::Long)
}

pub fn format_date_with(date: &DateTime<Utc>, style: DateStyle) -> String {
    date.format(style.pattern()).to_string()
}

/// Format an epoch-millisecond timestamp, e.g. an envelope's.
pub fn format_millis(millis: i64, style: DateStyle) -> Result<String> {
    let date = Utc
        .timestamp_millis_opt(millis)
        .single()
        .ok_or_else(|| StorageError::InvalidDate(format!("timestamp out of range: {millis}")))?;
    Ok(format_date_with(&date, style))
}

/// Parse RFC 3339, a bare `YYYY-MM-DD` (midnight UTC), or epoch milliseconds.
pub fn parse_date(input: &str) -> Result<DateTime<Utc>> {
    let input = input.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(input) {
        return Ok(dt.with_timezone(&Utc));
    }
    if let Ok(date) = NaiveDate::parse_from_str(input, "%Y-%m-%d") {
        if let Some(midnight) = date.and_hms_opt(0, 0, 0) {
            return Ok(midnight.and_utc());
        }
    }
    if let Ok(millis) = input.parse::<i64>() {
        if let Some(dt) = Utc.timestamp_millis_opt(millis).single() {
            return Ok(dt);
        }
    }
    Err(StorageError::InvalidDate(input.to_string()))
}
