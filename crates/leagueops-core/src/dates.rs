//! Calendar-date parsing for season and off-date strings.
//!
//! Dates arrive as `M/D/YYYY`, `M/D/YY` or (off-dates only) `M/D`. Every
//! parsed date is anchored at [`ANCHOR_HOUR_UTC`] so that comparisons against
//! submission timestamps never straddle a timezone boundary.

use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveTime, TimeZone, Utc};
use thiserror::Error;

/// Hour of day (UTC) every calendar date is pinned to.
pub const ANCHOR_HOUR_UTC: i64 = 7;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DateParseError {
    #[error("date is empty")]
    Empty,

    #[error("\"{0}\" is not in M/D/YYYY or M/D/YY form")]
    Format(String),

    #[error("\"{0}\" is not a valid calendar date")]
    OutOfRange(String),
}

/// Pin a calendar date to the anchor hour.
#[must_use]
pub fn anchor(date: NaiveDate) -> DateTime<Utc> {
    Utc.from_utc_datetime(&(date.and_time(NaiveTime::MIN) + Duration::hours(ANCHOR_HOUR_UTC)))
}

/// Parse a season start date. A year is required; two-digit years are
/// read as `2000 + yy`.
///
/// # Errors
///
/// Returns [`DateParseError`] if the string is blank, lacks a year, or does
/// not name a real calendar date.
pub fn parse_season_date(raw: &str) -> Result<DateTime<Utc>, DateParseError> {
    let (month, day, year) = split_parts(raw)?;
    let year = year.ok_or_else(|| DateParseError::Format(raw.trim().to_string()))?;
    build_date(raw, year, month, day).map(anchor)
}

/// Parse a single off-date token.
///
/// Tokens without a year take the season's year, rolling into the next year
/// when the date would otherwise fall before the season starts (a November
/// season with a `1/5` off-date).
///
/// # Errors
///
/// Returns [`DateParseError`] for blank or malformed tokens.
pub fn parse_off_date(
    raw: &str,
    season_start: DateTime<Utc>,
) -> Result<DateTime<Utc>, DateParseError> {
    let (month, day, year) = split_parts(raw)?;
    if let Some(year) = year {
        return build_date(raw, year, month, day).map(anchor);
    }

    let season_date = season_start.date_naive();
    let same_year = build_date(raw, season_date.year(), month, day)?;
    if same_year >= season_date {
        return Ok(anchor(same_year));
    }
    build_date(raw, season_date.year() + 1, month, day).map(anchor)
}

/// Parse a comma-separated off-date list into sorted, de-duplicated anchored
/// dates. Blank tokens are ignored; malformed tokens are logged and skipped.
#[must_use]
pub fn parse_off_dates(raw: &str, season_start: DateTime<Utc>) -> Vec<DateTime<Utc>> {
    let mut dates: Vec<DateTime<Utc>> = raw
        .split(',')
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .filter_map(|token| match parse_off_date(token, season_start) {
            Ok(date) => Some(date),
            Err(e) => {
                tracing::warn!(token, error = %e, "skipping unparseable off-date");
                None
            }
        })
        .collect();
    dates.sort_unstable();
    dates.dedup();
    dates
}

fn split_parts(raw: &str) -> Result<(u32, u32, Option<i32>), DateParseError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(DateParseError::Empty);
    }

    let format_err = || DateParseError::Format(trimmed.to_string());
    let parts: Vec<&str> = trimmed.split('/').map(str::trim).collect();
    let is_numeric = |s: &&str| !s.is_empty() && s.chars().all(|c| c.is_ascii_digit());
    if !(2..=3).contains(&parts.len()) || !parts.iter().all(is_numeric) {
        return Err(format_err());
    }

    let month = parts[0].parse::<u32>().map_err(|_| format_err())?;
    let day = parts[1].parse::<u32>().map_err(|_| format_err())?;
    let year = match parts.get(2) {
        None => None,
        Some(y) if y.len() <= 2 => Some(2000 + y.parse::<i32>().map_err(|_| format_err())?),
        Some(y) if y.len() == 4 => Some(y.parse::<i32>().map_err(|_| format_err())?),
        Some(_) => return Err(format_err()),
    };
    Ok((month, day, year))
}

fn build_date(raw: &str, year: i32, month: u32, day: u32) -> Result<NaiveDate, DateParseError> {
    NaiveDate::from_ymd_opt(year, month, day)
        .ok_or_else(|| DateParseError::OutOfRange(raw.trim().to_string()))
}
