//! Occurrence arithmetic for recurring tasks.
//!
//! A recurring task re-arms every `period` seconds from its start time. The
//! occurrence window bracketing "now" is a pure function of
//! `(start, period, now)`; no iteration state is stored anywhere.

use chrono::{Duration, NaiveDateTime};

/// The `(previous, next)` occurrence pair around `now`: conceptually, `start`
/// is advanced by `period` until it exceeds `now`; the last non-exceeding
/// value is the previous occurrence and the first exceeding one is the next.
/// Computed in closed form so a short period over a long elapsed time costs
/// nothing.
pub fn occurrence_window(
    start: NaiveDateTime,
    period_seconds: i64,
    now: NaiveDateTime,
) -> (NaiveDateTime, NaiveDateTime) {
    if period_seconds <= 0 {
        return (start, start);
    }
    let elapsed = (now - start).num_seconds();
    let advances = if elapsed < 0 {
        0
    } else {
        elapsed / period_seconds + 1
    };
    let next = start + Duration::seconds(advances * period_seconds);
    let previous = next - Duration::seconds(period_seconds);
    (previous, next)
}

/// Whether the occurrence window starting at `previous_occurrence` has been
/// satisfied by a completion at `last_done`.
pub fn current_period_is_done(
    last_done: Option<NaiveDateTime>,
    previous_occurrence: NaiveDateTime,
) -> bool {
    last_done.is_some_and(|done| done >= previous_occurrence)
}
