//! The single stored timestamp representation.
//!
//! Every timestamp column is UTC text in SQLite's `datetime()` layout,
//! written by the storage engine at insert time. Reads parse exactly this
//! layout and nothing else.

use chrono::{DateTime, NaiveDateTime, Utc};
use rusqlite::types::Type;
use rusqlite::Row;

pub const STORED_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
const DISPLAY_FORMAT: &str = "%B %-d, %Y %H:%M";

pub fn parse(value: &str) -> Result<DateTime<Utc>, chrono::ParseError> {
    NaiveDateTime::parse_from_str(value, STORED_FORMAT).map(|naive| naive.and_utc())
}

/// Human-readable form used on rendered pages, e.g. `January 2, 2006 15:04`.
pub fn display(ts: &DateTime<Utc>) -> String {
    ts.format(DISPLAY_FORMAT).to_string()
}

/// Read a stored timestamp column, surfacing malformed values as a conversion error.
pub fn column(row: &Row<'_>, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    let raw: String = row.get(idx)?;
    parse(&raw).map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}
