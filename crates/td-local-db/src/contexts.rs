//! Context tree storage: creation on demand, cascading rename/move/delete
//! and subtree aggregates.
//!
//! The tree lives in a flat relation keyed by dotted path strings; subtree
//! queries match path prefixes at dot boundaries so sibling contexts with a
//! shared name prefix never bleed into each other's subtree.

use chrono::NaiveDateTime;
use rusqlite::{params, Connection, OptionalExtension, Transaction, TransactionBehavior};
use tracing::debug;

use td_core::moment;
use td_core::path;
use td_core::{Context, ContextTally, Visibility};

use crate::row::visibility_from_sql;
use crate::Result;

/// Options applied to a context at creation time or through [`ContextStore::set`].
#[derive(Debug, Clone, Copy, Default)]
pub struct ContextOptions {
    pub priority: Option<i64>,
    pub visibility: Option<Visibility>,
}

impl ContextOptions {
    pub fn is_empty(&self) -> bool {
        self.priority.is_none() && self.visibility.is_none()
    }
}

/// Outcome of a cascading rename.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenameOutcome {
    /// Number of context rows whose path was rewritten.
    Renamed(usize),
    /// A context already exists at the renamed path; nothing was changed.
    Conflict,
}

/// Database operations for the context tree.
pub struct ContextStore<'a> {
    conn: &'a Connection,
}

impl<'a> ContextStore<'a> {
    /// Create a new context store.
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    /// Resolve `path` to a context id, inserting the context and any missing
    /// ancestors on the way down. `options` apply only if the leaf context
    /// is created by this call.
    ///
    /// Creation is insert-then-fallback-select: the unique constraint on
    /// `path` resolves a race with a concurrent creator, with no window in
    /// which both could insert.
    pub fn get_or_create(&self, path: &str, options: ContextOptions) -> Result<i64> {
        if path.is_empty() {
            return self.root_id();
        }
        let parent = path::parent(path).unwrap_or("");
        let mut prefix = String::new();
        for name in path::segments(parent) {
            prefix.push(path::SEPARATOR);
            prefix.push_str(name);
            self.try_insert(&prefix, ContextOptions::default())?;
        }
        match self.try_insert(path, options)? {
            Some(id) => Ok(id),
            None => self.id_of(path),
        }
    }

    /// Whether a context exists at `path`.
    pub fn exists(&self, path: &str) -> Result<bool> {
        let row = self
            .conn
            .query_row("SELECT 1 FROM Context WHERE path = ?1", [path], |_| Ok(()))
            .optional()?;
        Ok(row.is_some())
    }

    /// Apply option updates to the context at `path`, creating it first if
    /// absent. Returns the number of rows updated.
    pub fn set(&self, path: &str, options: ContextOptions) -> Result<usize> {
        let cid = self.get_or_create(path, ContextOptions::default())?;
        let updated = self.conn.execute(
            "UPDATE Context SET
                priority = COALESCE(?1, priority),
                visibility = COALESCE(?2, visibility)
             WHERE id = ?3",
            params![
                options.priority,
                options.visibility.map(Visibility::as_str),
                cid
            ],
        )?;
        Ok(updated)
    }

    /// Rename the context at `path` to `new_leaf`, cascading into every
    /// descendant path.
    ///
    /// The conflict check and the rewrite run under one IMMEDIATE
    /// transaction so a concurrent writer cannot slip a colliding path in
    /// between. Descendant paths are rewritten row by row from their ids: a
    /// textual replace over the path column would also rewrite a descendant
    /// whose relative suffix repeats the parent's own name.
    pub fn rename(&self, path: &str, new_leaf: &str) -> Result<RenameOutcome> {
        let renamed = path::rename(path, new_leaf)?;
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        let taken = tx
            .query_row(
                "SELECT 1 FROM Context WHERE path = ?1",
                [renamed.as_str()],
                |_| Ok(()),
            )
            .optional()?;
        if taken.is_some() {
            return Ok(RenameOutcome::Conflict);
        }
        let rows: Vec<(i64, String)> = {
            let mut stmt = tx.prepare(
                "SELECT id, path FROM Context
                 WHERE path = ?1 OR path LIKE ?1 || '.%'",
            )?;
            let mapped = stmt.query_map([path], |row| Ok((row.get(0)?, row.get(1)?)))?;
            mapped.collect::<rusqlite::Result<_>>()?
        };
        let mut affected = 0;
        {
            let mut update = tx.prepare("UPDATE Context SET path = ?1 WHERE id = ?2")?;
            for (id, old_path) in &rows {
                let new_path = format!("{renamed}{}", &old_path[path.len()..]);
                affected += update.execute(params![new_path, id])?;
            }
        }
        tx.commit()?;
        debug!(affected, "renamed context subtree");
        Ok(RenameOutcome::Renamed(affected))
    }

    /// Reassign the tasks directly owned by `src` to `dst`, creating `dst`
    /// if needed. Subcontexts are left alone. Returns the number of tasks
    /// moved.
    pub fn move_tasks(&self, src: &str, dst: &str) -> Result<usize> {
        let dst_id = self.get_or_create(dst, ContextOptions::default())?;
        let moved = self.conn.execute(
            "UPDATE Task SET context = ?1
             WHERE context = (SELECT id FROM Context WHERE path = ?2)",
            params![dst_id, src],
        )?;
        Ok(moved)
    }

    /// Move the whole subtree rooted at `src` under `dst`: every
    /// descendant's tasks are reassigned to the corresponding path below
    /// `dst`. Returns the number of tasks moved.
    pub fn move_all(&self, src: &str, dst: &str) -> Result<usize> {
        let paths: Vec<String> = {
            let mut stmt = self.conn.prepare(
                "SELECT path FROM Context
                 WHERE path = ?1 OR path LIKE ?1 || '.%'
                 ORDER BY path",
            )?;
            let mapped = stmt.query_map([src], |row| row.get(0))?;
            mapped.collect::<rusqlite::Result<_>>()?
        };
        let mut moved = 0;
        for src_path in paths {
            let dst_path = format!("{dst}{}", &src_path[src.len()..]);
            moved += self.move_tasks(&src_path, &dst_path)?;
        }
        Ok(moved)
    }

    /// Delete the context at `path` and, through the cascading foreign keys,
    /// every descendant context and their tasks. Returns the number of
    /// context rows removed.
    pub fn remove(&self, path: &str) -> Result<usize> {
        let removed = self.conn.execute(
            "DELETE FROM Context WHERE path = ?1 OR path LIKE ?1 || '.%'",
            [path],
        )?;
        debug!(removed, "removed context subtree");
        Ok(removed)
    }

    /// Every context under (and including) `path`, annotated with the count
    /// of current tasks it directly owns and the recursive total over its
    /// subtree, ordered by path. Completed and not-yet-started tasks do not
    /// count.
    pub fn descendants(&self, path: &str, now: NaiveDateTime) -> Result<Vec<ContextTally>> {
        let mut stmt = self.conn.prepare(
            "SELECT c.id, c.path, c.priority, c.visibility,
                    COUNT(own.id) AS own_tasks,
                    (SELECT COUNT(t.id)
                       FROM Context c1
                       JOIN Task t ON t.context = c1.id
                      WHERE (c1.path = c.path OR c1.path LIKE c.path || '.%')
                        AND t.start <= ?2
                        AND t.done IS NULL) AS total_tasks
               FROM Context c
               LEFT JOIN Task own
                 ON own.context = c.id AND own.start <= ?2 AND own.done IS NULL
              WHERE c.path = ?1 OR c.path LIKE ?1 || '.%'
              GROUP BY c.id
              ORDER BY c.path",
        )?;
        let mapped = stmt.query_map(params![path, moment::format_dt(now)], read_tally)?;
        Ok(mapped.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    /// Direct children of `path` that are not hidden, ordered by priority
    /// then subtree task total. Children whose subtree holds no current task
    /// are skipped unless `include_empty` is set.
    pub fn subcontexts(
        &self,
        path: &str,
        include_empty: bool,
        now: NaiveDateTime,
    ) -> Result<Vec<ContextTally>> {
        let filter = if include_empty {
            ""
        } else {
            "HAVING total_tasks > 0"
        };
        let query = format!(
            "SELECT c.id, c.path, c.priority, c.visibility,
                    COUNT(own.id) AS own_tasks,
                    (SELECT COUNT(t.id)
                       FROM Context c1
                       JOIN Task t ON t.context = c1.id
                      WHERE (c1.path = c.path OR c1.path LIKE c.path || '.%')
                        AND t.start <= ?2
                        AND t.done IS NULL) AS total_tasks
               FROM Context c
               LEFT JOIN Task own
                 ON own.context = c.id AND own.start <= ?2 AND own.done IS NULL
              WHERE c.path LIKE ?1 || '.%'
                AND c.path NOT LIKE ?1 || '.%.%'
                AND c.visibility != 'hidden'
              GROUP BY c.id
              {filter}
              ORDER BY c.priority DESC, total_tasks DESC"
        );
        let mut stmt = self.conn.prepare(&query)?;
        let mapped = stmt.query_map(params![path, moment::format_dt(now)], read_tally)?;
        Ok(mapped.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    /// Direct undone task count and direct subcontext count at `path`, used
    /// to build a confirmation prompt before a destructive removal.
    pub fn basic_tally(&self, path: &str) -> Result<(i64, i64)> {
        let tasks = self.conn.query_row(
            "SELECT COUNT(t.id) FROM Task t
              JOIN Context c ON t.context = c.id
             WHERE c.path = ?1 AND t.done IS NULL",
            [path],
            |row| row.get(0),
        )?;
        let subcontexts = self.conn.query_row(
            "SELECT COUNT(id) FROM Context
             WHERE path LIKE ?1 || '.%'
               AND path NOT LIKE ?1 || '.%.%'",
            [path],
            |row| row.get(0),
        )?;
        Ok((tasks, subcontexts))
    }

    fn root_id(&self) -> Result<i64> {
        self.id_of("")
    }

    fn id_of(&self, path: &str) -> Result<i64> {
        let id = self
            .conn
            .query_row("SELECT id FROM Context WHERE path = ?1", [path], |row| {
                row.get(0)
            })?;
        Ok(id)
    }

    /// Insert a context row, returning `None` when the path already exists.
    fn try_insert(&self, path: &str, options: ContextOptions) -> Result<Option<i64>> {
        let result = self.conn.execute(
            "INSERT INTO Context (path, priority, visibility) VALUES (?1, ?2, ?3)",
            params![
                path,
                options.priority.unwrap_or(1),
                options.visibility.unwrap_or_default().as_str()
            ],
        );
        match result {
            Ok(_) => Ok(Some(self.conn.last_insert_rowid())),
            Err(err) if is_unique_violation(&err) => Ok(None),
            Err(err) => Err(err.into()),
        }
    }
}

fn is_unique_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(e, _) if e.code == rusqlite::ErrorCode::ConstraintViolation
    )
}

fn read_tally(row: &rusqlite::Row<'_>) -> rusqlite::Result<ContextTally> {
    Ok(ContextTally {
        context: Context {
            id: row.get(0)?,
            path: row.get(1)?,
            priority: row.get(2)?,
            visibility: visibility_from_sql(row.get(3)?)?,
        },
        own_tasks: row.get(4)?,
        total_tasks: row.get(5)?,
    })
}
