//! Column codecs shared by the table modules
//!
//! Timestamps are stored as RFC 3339 UTC text, calendar dates as `YYYY-MM-DD`,
//! enums as their snake_case name. Malformed values surface as
//! `FromSqlConversionFailure` instead of being silently replaced.

use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use rusqlite::types::Type;
use rusqlite::{Error, Result as SqliteResult, Row};
use std::str::FromStr;

fn conversion_error<E>(idx: usize, err: E) -> Error
where
    E: std::error::Error + Send + Sync + 'static,
{
    Error::FromSqlConversionFailure(idx, Type::Text, Box::new(err))
}

pub fn timestamp(row: &Row, idx: usize) -> SqliteResult<DateTime<Utc>> {
    let raw: String = row.get(idx)?;
    DateTime::parse_from_rfc3339(&raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| conversion_error(idx, e))
}

pub fn opt_timestamp(row: &Row, idx: usize) -> SqliteResult<Option<DateTime<Utc>>> {
    let raw: Option<String> = row.get(idx)?;
    raw.map(|s| {
        DateTime::parse_from_rfc3339(&s)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(|e| conversion_error(idx, e))
    })
    .transpose()
}

pub fn date(row: &Row, idx: usize) -> SqliteResult<NaiveDate> {
    let raw: String = row.get(idx)?;
    NaiveDate::parse_from_str(&raw, DATE_FORMAT).map_err(|e| conversion_error(idx, e))
}

pub fn opt_date(row: &Row, idx: usize) -> SqliteResult<Option<NaiveDate>> {
    let raw: Option<String> = row.get(idx)?;
    raw.map(|s| NaiveDate::parse_from_str(&s, DATE_FORMAT).map_err(|e| conversion_error(idx, e)))
        .transpose()
}

pub fn enumeration<T>(row: &Row, idx: usize) -> SqliteResult<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    let raw: String = row.get(idx)?;
    raw.parse().map_err(|e| conversion_error(idx, e))
}

pub fn flag(row: &Row, idx: usize) -> SqliteResult<bool> {
    Ok(row.get::<_, i64>(idx)? != 0)
}

pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Fixed-width UTC stamps so text comparison matches time order
pub fn ts(value: &DateTime<Utc>) -> String {
    value.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub fn opt_ts(value: &Option<DateTime<Utc>>) -> Option<String> {
    value.as_ref().map(ts)
}

pub fn day(value: &NaiveDate) -> String {
    value.format(DATE_FORMAT).to_string()
}

pub fn opt_day(value: &Option<NaiveDate>) -> Option<String> {
    value.as_ref().map(day)
}
