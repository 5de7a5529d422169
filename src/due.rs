//! Parsing of typed due times.
//!
//! Accepted forms, after trimming:
//! - `YYYY-MM-DD HH:MM` / `YYYY/MM/DD HH:MM`
//! - `YYYY-MM-DD` / `YYYY/MM/DD` (meaning 09:00 that day)
//! - RFC 3339 timestamps
//!
//! The literal `none` clears a due time.

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};

use crate::models::timestamp::local_to_utc;
use crate::{Error, Result};

const DATE_TIME_FORMATS: &[&str] = &["%Y-%m-%d %H:%M", "%Y/%m/%d %H:%M"];
const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d"];

/// Hour a date-only due time resolves to.
pub const DEFAULT_DUE_HOUR: u32 = 9;

/// Parse wall-clock input in one of the accepted local formats.
pub fn parse_due_time(input: &str) -> Option<NaiveDateTime> {
    let input = input.trim();
    if input.is_empty() {
        return None;
    }

    for format in DATE_TIME_FORMATS {
        if let Ok(parsed) = NaiveDateTime::parse_from_str(input, format) {
            return Some(parsed);
        }
    }

    let morning = NaiveTime::from_hms_opt(DEFAULT_DUE_HOUR, 0, 0)?;
    DATE_FORMATS
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(input, format).ok())
        .map(|date| date.and_time(morning))
}

/// Resolve a command-line due argument.
///
/// Returns `Ok(None)` for `none`, the parsed instant otherwise.
pub fn parse_due_arg(input: &str) -> Result<Option<DateTime<Utc>>> {
    let trimmed = input.trim();
    if trimmed.eq_ignore_ascii_case("none") {
        return Ok(None);
    }

    if let Some(naive) = parse_due_time(trimmed) {
        return Ok(Some(local_to_utc(naive)));
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Ok(Some(dt.with_timezone(&Utc)));
    }

    Err(Error::InvalidInput(format!(
        "Unrecognized due time '{}': use YYYY-MM-DD [HH:MM], YYYY/MM/DD [HH:MM], RFC 3339, or 'none'",
        input
    )))
}
