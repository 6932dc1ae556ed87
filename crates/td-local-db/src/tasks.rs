//! Task storage: CRUD, batch done/remove, filtered retrieval and the
//! advisory editing lock.
//!
//! Every row fetched here comes back joined with its owning context and the
//! most recent recurrence completion, so relevance, ordering and occurrence
//! checks need no further lookups. Candidate rows are filtered and ordered
//! in memory, keeping the deadline arithmetic in whole seconds.

use chrono::NaiveDateTime;
use rusqlite::{params, Connection, OptionalExtension};
use tracing::debug;

use td_core::moment;
use td_core::order;
use td_core::visibility;
use td_core::{ContextRef, Task};

use crate::contexts::{ContextOptions, ContextStore};
use crate::row::{datetime_from_sql, optional_datetime_from_sql, visibility_from_sql};
use crate::Result;

const TASK_COLUMNS: &str = "t.id, t.title, t.content, t.created, t.deadline, t.start, \
t.priority, t.done, t.editing, t.ping, t.period, t.front, \
c.id, c.path, c.priority, c.visibility, \
(SELECT MAX(h.done_datetime) FROM TaskDoneHistory h WHERE h.task_id = t.id)";

/// Fields that may accompany a new task; anything left `None` takes the
/// schema default (`start` falls back to the creation instant).
#[derive(Debug, Clone, Copy, Default)]
pub struct NewTaskOptions {
    pub start: Option<NaiveDateTime>,
    pub deadline: Option<NaiveDateTime>,
    pub priority: Option<i64>,
    pub period: Option<i64>,
    pub front: Option<bool>,
}

/// A partial update. Outer `None` leaves the field alone; for the nullable
/// columns the inner option distinguishes "set" from "clear".
#[derive(Debug, Clone, Default)]
pub struct TaskPatch {
    pub title: Option<String>,
    pub content: Option<String>,
    pub start: Option<NaiveDateTime>,
    pub deadline: Option<Option<NaiveDateTime>>,
    pub priority: Option<i64>,
    pub period: Option<Option<i64>>,
    pub front: Option<Option<bool>>,
}

/// Database operations for tasks.
pub struct TaskStore<'a> {
    conn: &'a Connection,
}

impl<'a> TaskStore<'a> {
    /// Create a new task store.
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    /// Insert a new task under `context_path`, resolving or creating the
    /// context first. Returns the new task's id.
    pub fn add(
        &self,
        title: &str,
        content: Option<&str>,
        context_path: &str,
        options: NewTaskOptions,
        now: NaiveDateTime,
    ) -> Result<i64> {
        let cid = ContextStore::new(self.conn)
            .get_or_create(context_path, ContextOptions::default())?;
        self.conn.execute(
            "INSERT INTO Task (title, content, created, start, deadline, priority, period, front, context)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            params![
                title,
                content,
                moment::format_dt(now),
                moment::format_dt(options.start.unwrap_or(now)),
                options.deadline.map(moment::format_dt),
                options.priority.unwrap_or(1),
                options.period,
                options.front,
                cid
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    /// Patch the named fields of a task; a supplied context path is resolved
    /// (created on demand) and the task reassigned. Returns the number of
    /// rows updated, zero when the id does not exist.
    pub fn update(
        &self,
        task_id: i64,
        context_path: Option<&str>,
        patch: TaskPatch,
    ) -> Result<usize> {
        let context_id = match context_path {
            Some(path) => Some(
                ContextStore::new(self.conn).get_or_create(path, ContextOptions::default())?,
            ),
            None => None,
        };
        let updated = self.conn.execute(
            "UPDATE Task SET
                title = COALESCE(?1, title),
                content = COALESCE(?2, content),
                start = COALESCE(?3, start),
                deadline = CASE WHEN ?4 THEN ?5 ELSE deadline END,
                priority = COALESCE(?6, priority),
                period = CASE WHEN ?7 THEN ?8 ELSE period END,
                front = CASE WHEN ?9 THEN ?10 ELSE front END,
                context = COALESCE(?11, context)
             WHERE id = ?12",
            params![
                patch.title,
                patch.content,
                patch.start.map(moment::format_dt),
                patch.deadline.is_some(),
                patch.deadline.flatten().map(moment::format_dt),
                patch.priority,
                patch.period.is_some(),
                patch.period.flatten(),
                patch.front.is_some(),
                patch.front.flatten(),
                context_id,
                task_id
            ],
        )?;
        Ok(updated)
    }

    /// Fetch one task, fully resolved, or `None`.
    pub fn get(&self, task_id: i64) -> Result<Option<Task>> {
        let query = format!(
            "SELECT {TASK_COLUMNS} FROM Task t
              JOIN Context c ON t.context = c.id
             WHERE t.id = ?1"
        );
        let task = self
            .conn
            .query_row(&query, [task_id], read_task)
            .optional()?;
        Ok(task)
    }

    /// Mark a task done at `now`. A no-op (zero) for an already-done or
    /// missing task.
    pub fn set_done(&self, task_id: i64, now: NaiveDateTime) -> Result<usize> {
        let updated = self.conn.execute(
            "UPDATE Task SET done = ?1 WHERE id = ?2 AND done IS NULL",
            params![moment::format_dt(now), task_id],
        )?;
        Ok(updated)
    }

    /// Mark several tasks done; returns the ids that were missing or already
    /// done.
    pub fn set_done_many(&self, task_ids: &[i64], now: NaiveDateTime) -> Result<Vec<i64>> {
        let mut missed = Vec::new();
        for &task_id in task_ids {
            if self.set_done(task_id, now)? == 0 {
                missed.push(task_id);
            }
        }
        Ok(missed)
    }

    /// Reactivate a completed task by clearing its done timestamp.
    pub fn set_undone(&self, task_id: i64) -> Result<usize> {
        let updated = self.conn.execute(
            "UPDATE Task SET done = NULL WHERE id = ?1 AND done IS NOT NULL",
            [task_id],
        )?;
        Ok(updated)
    }

    /// Reactivate several tasks; returns the ids that were missing or still
    /// active.
    pub fn set_undone_many(&self, task_ids: &[i64]) -> Result<Vec<i64>> {
        let mut missed = Vec::new();
        for &task_id in task_ids {
            if self.set_undone(task_id)? == 0 {
                missed.push(task_id);
            }
        }
        Ok(missed)
    }

    /// Delete one task.
    pub fn remove(&self, task_id: i64) -> Result<usize> {
        let removed = self
            .conn
            .execute("DELETE FROM Task WHERE id = ?1", [task_id])?;
        Ok(removed)
    }

    /// Delete several tasks; returns the ids that were not found.
    pub fn remove_many(&self, task_ids: &[i64]) -> Result<Vec<i64>> {
        let mut missed = Vec::new();
        for &task_id in task_ids {
            if self.remove(task_id)? == 0 {
                missed.push(task_id);
            }
        }
        Ok(missed)
    }

    /// Delete completed tasks, optionally only those created strictly before
    /// `before`. Returns the number of tasks removed.
    pub fn purge(&self, before: Option<NaiveDateTime>) -> Result<usize> {
        let removed = match before {
            Some(cutoff) => self.conn.execute(
                "DELETE FROM Task WHERE done IS NOT NULL AND created < ?1",
                [moment::format_dt(cutoff)],
            )?,
            None => self
                .conn
                .execute("DELETE FROM Task WHERE done IS NOT NULL", [])?,
        };
        debug!(removed, "purged completed tasks");
        Ok(removed)
    }

    /// Take the advisory editing lock on a task. Returns false, without
    /// mutating anything, when the lock is already held (or the task does
    /// not exist). Non-blocking: a concurrent editor is refused, not queued.
    pub fn take_editing_lock(&self, task_id: i64) -> Result<bool> {
        let taken = self.conn.execute(
            "UPDATE Task SET editing = 1 WHERE id = ?1 AND editing = 0",
            [task_id],
        )?;
        Ok(taken == 1)
    }

    /// Release the advisory editing lock.
    pub fn release_editing_lock(&self, task_id: i64) -> Result<()> {
        self.conn.execute(
            "UPDATE Task SET editing = 0 WHERE id = ?1",
            [task_id],
        )?;
        Ok(())
    }

    /// Increment a task's ping counter. Returns zero when the id does not
    /// exist.
    pub fn ping(&self, task_id: i64) -> Result<usize> {
        let updated = self
            .conn
            .execute("UPDATE Task SET ping = ping + 1 WHERE id = ?1", [task_id])?;
        Ok(updated)
    }

    /// Current tasks under `context_path`, ordered for display.
    ///
    /// Non-recursive queries return exactly the context's own tasks. A
    /// recursive query walks the subtree and keeps the tasks whose effective
    /// visibility makes them relevant to the query root; recurring tasks
    /// already satisfied for their current occurrence window stay out.
    pub fn list(
        &self,
        context_path: &str,
        recursive: bool,
        now: NaiveDateTime,
    ) -> Result<Vec<Task>> {
        let scope = if recursive {
            "(c.path = ?1 OR c.path LIKE ?1 || '.%')"
        } else {
            "c.path = ?1"
        };
        let query = format!(
            "SELECT {TASK_COLUMNS} FROM Task t
              JOIN Context c ON t.context = c.id
             WHERE {scope}
               AND t.done IS NULL
               AND t.start <= ?2"
        );
        let mut tasks = self.query_tasks(&query, params![context_path, moment::format_dt(now)])?;
        if recursive {
            tasks.retain(|task| {
                visibility::is_relevant(&task.context.path, task.visibility(), context_path)
            });
        }
        tasks.retain(|task| !task.current_period_is_done(now));
        order::sort_for_display(&mut tasks, now);
        Ok(tasks)
    }

    /// Tasks that have not started yet, under `context_path`, ordered by
    /// start time.
    pub fn future(&self, context_path: &str, now: NaiveDateTime) -> Result<Vec<Task>> {
        let query = format!(
            "SELECT {TASK_COLUMNS} FROM Task t
              JOIN Context c ON t.context = c.id
             WHERE (c.path = ?1 OR c.path LIKE ?1 || '.%')
               AND t.done IS NULL
               AND t.start > ?2
             ORDER BY t.start"
        );
        self.query_tasks(&query, params![context_path, moment::format_dt(now)])
    }

    /// Substring search on task titles within the subtree at `context_path`,
    /// with optional completion filter and creation-time bounds. The term is
    /// matched literally; case sensitivity is per call.
    pub fn search(
        &self,
        term: &str,
        context_path: &str,
        done: Option<bool>,
        before: Option<NaiveDateTime>,
        after: Option<NaiveDateTime>,
        case_sensitive: bool,
    ) -> Result<Vec<Task>> {
        let query = format!(
            "SELECT {TASK_COLUMNS} FROM Task t
              JOIN Context c ON t.context = c.id
             WHERE (c.path = ?1 OR c.path LIKE ?1 || '.%')
               AND (?2 IS NULL
                    OR (CASE WHEN ?2 THEN t.done IS NOT NULL ELSE t.done IS NULL END))
               AND (?3 IS NULL OR t.created < ?3)
               AND (?4 IS NULL OR t.created > ?4)
               AND (CASE WHEN ?5
                         THEN instr(t.title, ?6) > 0
                         ELSE instr(lower(t.title), lower(?6)) > 0 END)
             ORDER BY t.created, t.id"
        );
        self.query_tasks(
            &query,
            params![
                context_path,
                done,
                before.map(moment::format_dt),
                after.map(moment::format_dt),
                case_sensitive,
                term
            ],
        )
    }

    /// Every task, completed or not, ordered by creation time.
    pub fn history(&self) -> Result<Vec<Task>> {
        let query = format!(
            "SELECT {TASK_COLUMNS} FROM Task t
              JOIN Context c ON t.context = c.id
             ORDER BY t.created, t.id"
        );
        self.query_tasks(&query, [])
    }

    /// The highest task id ever assigned, used for display padding.
    pub fn greatest_id(&self) -> Result<Option<i64>> {
        let id = self
            .conn
            .query_row("SELECT MAX(id) FROM Task", [], |row| row.get(0))?;
        Ok(id)
    }

    fn query_tasks<P: rusqlite::Params>(&self, query: &str, params: P) -> Result<Vec<Task>> {
        let mut stmt = self.conn.prepare(query)?;
        let mapped = stmt.query_map(params, read_task)?;
        Ok(mapped.collect::<rusqlite::Result<Vec<_>>>()?)
    }
}

fn read_task(row: &rusqlite::Row<'_>) -> rusqlite::Result<Task> {
    Ok(Task {
        id: row.get(0)?,
        title: row.get(1)?,
        content: row.get(2)?,
        created: datetime_from_sql(row.get(3)?)?,
        deadline: optional_datetime_from_sql(row.get(4)?)?,
        start: datetime_from_sql(row.get(5)?)?,
        priority: row.get(6)?,
        done: optional_datetime_from_sql(row.get(7)?)?,
        editing: row.get(8)?,
        ping: row.get(9)?,
        period: row.get(10)?,
        front: row.get(11)?,
        context: ContextRef {
            id: row.get(12)?,
            path: row.get(13)?,
            priority: row.get(14)?,
            visibility: visibility_from_sql(row.get(15)?)?,
        },
        last_period_done: optional_datetime_from_sql(row.get(16)?)?,
    })
}
