//! Recurrence completion tracking.
//!
//! Recurring tasks never flip their `done` column; each satisfied occurrence
//! appends one row to the done history instead. Completing a task routes
//! through [`complete_task`], which picks the right mechanism from the
//! task's period.

use chrono::NaiveDateTime;
use rusqlite::{params, Connection};

use td_core::moment;
use td_core::recurrence;

use crate::row::optional_datetime_from_sql;
use crate::tasks::TaskStore;
use crate::Result;

/// Outcome of a completion attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DoneOutcome {
    /// One-shot task marked done.
    Done,
    /// Recurring task satisfied for its current occurrence window.
    RecurrenceDone { next: NaiveDateTime },
    /// One-shot task that was already done; nothing changed.
    AlreadyDone,
    /// Recurring task whose current window was already satisfied; nothing
    /// changed.
    RecurrenceAlreadyDone { next: NaiveDateTime },
    /// No task with that id.
    NotFound,
}

/// Database operations for the recurrence done history.
pub struct DoneHistoryStore<'a> {
    conn: &'a Connection,
}

impl<'a> DoneHistoryStore<'a> {
    /// Create a new done-history store.
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    /// The most recent completion recorded for a task, if any.
    pub fn last_done(&self, task_id: i64) -> Result<Option<NaiveDateTime>> {
        let value: Option<String> = self.conn.query_row(
            "SELECT MAX(done_datetime) FROM TaskDoneHistory WHERE task_id = ?1",
            [task_id],
            |row| row.get(0),
        )?;
        Ok(optional_datetime_from_sql(value)?)
    }

    /// Append one completion event.
    pub fn record_done(&self, task_id: i64, at: NaiveDateTime) -> Result<()> {
        self.conn.execute(
            "INSERT INTO TaskDoneHistory (task_id, done_datetime) VALUES (?1, ?2)",
            params![task_id, moment::format_dt(at)],
        )?;
        Ok(())
    }

    /// Number of completion events recorded for a task.
    pub fn count(&self, task_id: i64) -> Result<i64> {
        let count = self.conn.query_row(
            "SELECT COUNT(*) FROM TaskDoneHistory WHERE task_id = ?1",
            [task_id],
            |row| row.get(0),
        )?;
        Ok(count)
    }
}

/// Complete the task with id `task_id` at `now`.
///
/// One-shot tasks get their `done` timestamp set (at most once). Recurring
/// tasks append to the done history, unless the current occurrence window is
/// already satisfied, in which case nothing changes and the outcome says so.
pub fn complete_task(conn: &Connection, task_id: i64, now: NaiveDateTime) -> Result<DoneOutcome> {
    let tasks = TaskStore::new(conn);
    let Some(task) = tasks.get(task_id)? else {
        return Ok(DoneOutcome::NotFound);
    };
    match task.period {
        None => {
            if tasks.set_done(task_id, now)? == 0 {
                Ok(DoneOutcome::AlreadyDone)
            } else {
                Ok(DoneOutcome::Done)
            }
        }
        Some(period) => {
            let (previous, next) = recurrence::occurrence_window(task.start, period, now);
            if recurrence::current_period_is_done(task.last_period_done, previous) {
                Ok(DoneOutcome::RecurrenceAlreadyDone { next })
            } else {
                DoneHistoryStore::new(conn).record_done(task_id, now)?;
                Ok(DoneOutcome::RecurrenceDone { next })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tasks::NewTaskOptions;
    use crate::Database;

    fn dt(s: &str) -> NaiveDateTime {
        moment::parse_dt(s).unwrap()
    }

    const WEEK: i64 = 7 * 24 * 3600;

    fn add_weekly(db: &Database, start: &str) -> i64 {
        TaskStore::new(db.connection())
            .add(
                "weekly",
                None,
                ".work",
                NewTaskOptions {
                    start: Some(dt(start)),
                    period: Some(WEEK),
                    ..Default::default()
                },
                dt(start),
            )
            .unwrap()
    }

    #[test]
    fn completing_a_one_shot_task_sets_done_once() {
        let db = Database::open_in_memory().unwrap();
        let tasks = TaskStore::new(db.connection());
        let now = dt("2023-11-20 12:00:00");
        let id = tasks.add("once", None, ".work", NewTaskOptions::default(), now).unwrap();
        assert_eq!(complete_task(db.connection(), id, now).unwrap(), DoneOutcome::Done);
        assert_eq!(
            complete_task(db.connection(), id, now).unwrap(),
            DoneOutcome::AlreadyDone
        );
        assert_eq!(
            complete_task(db.connection(), 404, now).unwrap(),
            DoneOutcome::NotFound
        );
    }

    #[test]
    fn completing_a_recurring_task_never_touches_done() {
        let db = Database::open_in_memory().unwrap();
        let id = add_weekly(&db, "2023-11-19 00:00:00");
        let now = dt("2023-11-20 12:00:00");
        let outcome = complete_task(db.connection(), id, now).unwrap();
        assert_eq!(
            outcome,
            DoneOutcome::RecurrenceDone {
                next: dt("2023-11-26 00:00:00")
            }
        );
        let task = TaskStore::new(db.connection()).get(id).unwrap().unwrap();
        assert_eq!(task.done, None);
        assert_eq!(task.last_period_done, Some(now));
    }

    #[test]
    fn second_completion_in_the_same_window_is_a_no_op() {
        let db = Database::open_in_memory().unwrap();
        let id = add_weekly(&db, "2023-11-19 00:00:00");
        let history = DoneHistoryStore::new(db.connection());
        let first = dt("2023-11-20 12:00:00");
        let second = dt("2023-11-22 12:00:00");
        complete_task(db.connection(), id, first).unwrap();
        assert_eq!(
            complete_task(db.connection(), id, second).unwrap(),
            DoneOutcome::RecurrenceAlreadyDone {
                next: dt("2023-11-26 00:00:00")
            }
        );
        assert_eq!(history.count(id).unwrap(), 1);
    }

    #[test]
    fn one_completion_per_window_accumulates_history() {
        let db = Database::open_in_memory().unwrap();
        let id = add_weekly(&db, "2023-11-05 00:00:00");
        let history = DoneHistoryStore::new(db.connection());
        for now in [
            "2023-11-06 09:00:00",
            "2023-11-13 09:00:00",
            "2023-11-20 09:00:00",
        ] {
            let outcome = complete_task(db.connection(), id, dt(now)).unwrap();
            assert!(matches!(outcome, DoneOutcome::RecurrenceDone { .. }));
        }
        assert_eq!(history.count(id).unwrap(), 3);
    }

    #[test]
    fn last_done_is_the_most_recent_entry() {
        let db = Database::open_in_memory().unwrap();
        let id = add_weekly(&db, "2023-11-05 00:00:00");
        let history = DoneHistoryStore::new(db.connection());
        assert_eq!(history.last_done(id).unwrap(), None);
        history.record_done(id, dt("2023-11-06 09:00:00")).unwrap();
        history.record_done(id, dt("2023-11-13 09:00:00")).unwrap();
        assert_eq!(
            history.last_done(id).unwrap(),
            Some(dt("2023-11-13 09:00:00"))
        );
    }
}
