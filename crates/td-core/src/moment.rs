//! Datetime storage format and the user-facing moment grammar.
//!
//! Datetimes are persisted as fixed-format UTC strings so that their
//! lexicographic order matches their chronological order. User-facing
//! "moments" are either a calendar datetime in one of a few accepted formats
//! or a delay such as `2w`, resolved against a caller-supplied "now" in the
//! requested direction.

use chrono::{Duration, NaiveDate, NaiveDateTime};

use crate::{Error, Result};

/// Fixed UTC datetime format used in storage.
pub const DT_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

const USER_DATETIME_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"];

const USER_DATE_FORMAT: &str = "%Y-%m-%d";

/// Whether a delay is applied forward (deadlines, start lines) or backward
/// (creation-time bounds) from now.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Future,
    Past,
}

/// Render a datetime in the storage format.
pub fn format_dt(dt: NaiveDateTime) -> String {
    dt.format(DT_FORMAT).to_string()
}

/// Parse a datetime in the storage format.
pub fn parse_dt(value: &str) -> Result<NaiveDateTime> {
    NaiveDateTime::parse_from_str(value, DT_FORMAT).map_err(|_| Error::MalformedDatetime {
        value: value.to_string(),
    })
}

fn unit_seconds(unit: char) -> Option<i64> {
    match unit {
        // 30.5 days, splitting the difference between month lengths
        'm' => Some(2_635_200),
        'w' => Some(7 * 24 * 3600),
        'd' => Some(24 * 3600),
        'h' => Some(3600),
        _ => None,
    }
}

/// Parse a period of time such as `3d` or `2w`, returned in seconds.
pub fn parse_period(input: &str) -> Result<i64> {
    let invalid = || Error::InvalidPeriod {
        input: input.to_string(),
    };
    let unit = input.chars().next_back().ok_or_else(invalid)?;
    let seconds = unit_seconds(unit).ok_or_else(invalid)?;
    let digits = &input[..input.len() - unit.len_utf8()];
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(invalid());
    }
    let value: i64 = digits.parse().map_err(|_| invalid())?;
    if value == 0 {
        return Err(invalid());
    }
    Ok(value * seconds)
}

/// Parse a moment: either a delay applied to `now` in the given direction, or
/// a calendar date/datetime.
pub fn parse_moment(input: &str, now: NaiveDateTime, direction: Direction) -> Result<NaiveDateTime> {
    if let Ok(seconds) = parse_period(input) {
        let offset = Duration::seconds(seconds);
        return Ok(match direction {
            Direction::Future => now + offset,
            Direction::Past => now - offset,
        });
    }
    for format in USER_DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(input, format) {
            return Ok(dt);
        }
    }
    if let Ok(date) = NaiveDate::parse_from_str(input, USER_DATE_FORMAT) {
        return Ok(date.and_hms_opt(0, 0, 0).unwrap_or_default());
    }
    Err(Error::InvalidMoment {
        input: input.to_string(),
    })
}

/// Human-friendly rendering of a remaining duration, coarsest sensible unit
/// only.
pub fn human_remaining(seconds: i64) -> String {
    let magnitude = seconds.abs();
    let sign = if seconds < 0 { "-" } else { "" };
    if magnitude >= 2 * 24 * 3600 {
        format!("{sign}{} days", magnitude / (24 * 3600))
    } else if magnitude >= 2 * 3600 {
        format!("{sign}{} hours", magnitude / 3600)
    } else if magnitude >= 2 * 60 {
        format!("{sign}{} minutes", magnitude / 60)
    } else {
        format!("{sign}{} seconds", magnitude)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dt(s: &str) -> NaiveDateTime {
        parse_dt(s).unwrap()
    }

    #[test]
    fn storage_format_round_trips() {
        let value = "2023-11-19 08:30:00";
        assert_eq!(format_dt(dt(value)), value);
    }

    #[test]
    fn parse_period_accepts_the_delay_grammar() {
        assert_eq!(parse_period("3d").unwrap(), 3 * 24 * 3600);
        assert_eq!(parse_period("2w").unwrap(), 14 * 24 * 3600);
        assert_eq!(parse_period("12h").unwrap(), 12 * 3600);
        assert_eq!(parse_period("1m").unwrap(), 2_635_200);
    }

    #[test]
    fn parse_period_rejects_everything_else() {
        for input in ["", "d", "3", "3x", "x3d", "3.5d", "0d", "-2d"] {
            assert!(parse_period(input).is_err(), "accepted {input:?}");
        }
    }

    #[test]
    fn parse_moment_resolves_delays_in_both_directions() {
        let now = dt("2023-11-20 00:00:00");
        assert_eq!(
            parse_moment("2d", now, Direction::Future).unwrap(),
            dt("2023-11-22 00:00:00")
        );
        assert_eq!(
            parse_moment("1w", now, Direction::Past).unwrap(),
            dt("2023-11-13 00:00:00")
        );
    }

    #[test]
    fn parse_moment_accepts_calendar_forms() {
        let now = dt("2023-11-20 00:00:00");
        assert_eq!(
            parse_moment("2023-12-01", now, Direction::Future).unwrap(),
            dt("2023-12-01 00:00:00")
        );
        assert_eq!(
            parse_moment("2023-12-01 10:20:30", now, Direction::Future).unwrap(),
            dt("2023-12-01 10:20:30")
        );
        assert_eq!(
            parse_moment("2023-12-01T10:20:30", now, Direction::Future).unwrap(),
            dt("2023-12-01 10:20:30")
        );
        assert!(parse_moment("next tuesday", now, Direction::Future).is_err());
    }

    #[test]
    fn human_remaining_picks_the_coarsest_unit() {
        assert_eq!(human_remaining(3 * 24 * 3600), "3 days");
        assert_eq!(human_remaining(5 * 3600), "5 hours");
        assert_eq!(human_remaining(10 * 60), "10 minutes");
        assert_eq!(human_remaining(42), "42 seconds");
        assert_eq!(human_remaining(-3 * 24 * 3600), "-3 days");
    }
}
