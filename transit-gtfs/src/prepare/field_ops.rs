use std::str::FromStr;

use chrono::NaiveDate;

use crate::feed::{FeedFile, FeedRow};
use crate::import::ImportWarning;

/// position of a row in a feed file, used to build row warnings.
#[derive(Clone, Copy, Debug)]
pub struct RowRef {
    pub file: FeedFile,
    pub row: usize,
}

impl RowRef {
    pub fn new(file: FeedFile, row: usize) -> Self {
        Self { file, row }
    }

    pub fn missing(&self, field: &str) -> ImportWarning {
        ImportWarning::MissingField {
            file: self.file,
            row: self.row,
            field: field.to_string(),
        }
    }

    pub fn invalid(&self, field: &str, value: &str) -> ImportWarning {
        ImportWarning::InvalidFieldValue {
            file: self.file,
            row: self.row,
            field: field.to_string(),
            value: value.to_string(),
        }
    }
}

/// trimmed field value, None when absent or blank.
pub fn field<'a>(row: &'a FeedRow, name: &str) -> Option<&'a str> {
    row.get(name).map(|v| v.trim()).filter(|v| !v.is_empty())
}

pub fn owned_field(row: &FeedRow, name: &str) -> Option<String> {
    field(row, name).map(String::from)
}

pub fn required_field<'a>(
    row: &'a FeedRow,
    at: &RowRef,
    name: &str,
) -> Result<&'a str, ImportWarning> {
    field(row, name).ok_or_else(|| at.missing(name))
}

/// parses an optional field. a present but unparseable value is a warning.
pub fn parse_field<T: FromStr>(
    row: &FeedRow,
    at: &RowRef,
    name: &str,
) -> Result<Option<T>, ImportWarning> {
    match field(row, name) {
        None => Ok(None),
        Some(value) => value
            .parse::<T>()
            .map(Some)
            .map_err(|_| at.invalid(name, value)),
    }
}

pub fn parse_required<T: FromStr>(
    row: &FeedRow,
    at: &RowRef,
    name: &str,
) -> Result<T, ImportWarning> {
    parse_field(row, at, name)?.ok_or_else(|| at.missing(name))
}

/// GTFS time `H:MM:SS` in seconds since the start of the service day. hours may exceed 24
/// for trips running past midnight.
pub fn parse_gtfs_time(value: &str) -> Option<u32> {
    let mut parts = value.trim().split(':');
    let hours = parts.next()?.parse::<u32>().ok()?;
    let minutes = parts.next()?.parse::<u32>().ok()?;
    let seconds = parts.next()?.parse::<u32>().ok()?;
    if parts.next().is_some() || minutes >= 60 || seconds >= 60 {
        return None;
    }
    hours
        .checked_mul(3600)?
        .checked_add(minutes * 60 + seconds)
}

pub fn parse_time_field(
    row: &FeedRow,
    at: &RowRef,
    name: &str,
) -> Result<Option<u32>, ImportWarning> {
    match field(row, name) {
        None => Ok(None),
        Some(value) => parse_gtfs_time(value)
            .map(Some)
            .ok_or_else(|| at.invalid(name, value)),
    }
}

/// GTFS date `YYYYMMDD`
pub fn parse_gtfs_date(value: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), "%Y%m%d").ok()
}

pub fn parse_date_field(row: &FeedRow, at: &RowRef, name: &str) -> Result<NaiveDate, ImportWarning> {
    let value = required_field(row, at, name)?;
    parse_gtfs_date(value).ok_or_else(|| at.invalid(name, value))
}

/// GTFS colors are 6 hex digits without `#`. returns `#RRGGBB`, None when the
/// value is not a color.
pub fn normalize_color(value: &str) -> Option<String> {
    let hex = value.trim().trim_start_matches('#');
    if hex.len() == 6 && hex.chars().all(|c| c.is_ascii_hexdigit()) {
        Some(format!("#{}", hex.to_ascii_uppercase()))
    } else {
        None
    }
}
