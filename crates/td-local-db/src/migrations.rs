//! Database migration management.
//!
//! The schema evolves through an ordered, append-only list of migration
//! batches. The last applied version is recorded in `schema_migrations`;
//! opening a database applies every batch above that version, each inside
//! its own transaction. Released entries are never edited.

use rusqlite::Connection;
use tracing::debug;

/// v1: the context tree and the task relation, with the root context seeded.
const MIGRATION_V1: &str = r#"
CREATE TABLE Context (
    id INTEGER NOT NULL PRIMARY KEY AUTOINCREMENT UNIQUE,
    path TEXT NOT NULL UNIQUE,
    priority INTEGER NOT NULL DEFAULT 1,
    visibility TEXT NOT NULL DEFAULT 'normal'
);
CREATE TABLE Task (
    id INTEGER NOT NULL PRIMARY KEY AUTOINCREMENT UNIQUE,
    title TEXT NOT NULL,
    created TEXT NOT NULL DEFAULT (datetime('now')),
    deadline TEXT,
    start TEXT NOT NULL DEFAULT (datetime('now')),
    priority INTEGER NOT NULL DEFAULT 1,
    done TEXT,
    context INTEGER NOT NULL REFERENCES Context(id) ON DELETE CASCADE
);
INSERT INTO Context (path) VALUES ('');
CREATE INDEX PathIndex ON Context (path ASC);
"#;

/// v2: long-form bodies and the advisory editing lock.
const MIGRATION_V2: &str = r#"
ALTER TABLE Task ADD COLUMN content TEXT;
ALTER TABLE Task ADD COLUMN editing INTEGER NOT NULL DEFAULT 0;
CREATE INDEX DoneIndex ON Task (done);
CREATE INDEX CreatedIndex ON Task (created);
"#;

/// v3: recurrence, dependencies and the remaining task columns.
const MIGRATION_V3: &str = r#"
ALTER TABLE Task ADD COLUMN ping INTEGER NOT NULL DEFAULT 0;
ALTER TABLE Task ADD COLUMN period INTEGER;
ALTER TABLE Task ADD COLUMN front INTEGER;
CREATE TABLE TaskDependency (
    task_id INTEGER NOT NULL REFERENCES Task(id) ON DELETE CASCADE,
    dependency_id INTEGER NOT NULL REFERENCES Task(id) ON DELETE CASCADE
);
CREATE INDEX DependencyTaskIndex ON TaskDependency (task_id);
CREATE INDEX DependencyIndex ON TaskDependency (dependency_id);
CREATE TABLE TaskDoneHistory (
    task_id INTEGER NOT NULL REFERENCES Task(id) ON DELETE CASCADE,
    done_datetime TEXT NOT NULL
);
CREATE INDEX DoneHistoryTaskIndex ON TaskDoneHistory (task_id);
"#;

const MIGRATIONS: &[&str] = &[MIGRATION_V1, MIGRATION_V2, MIGRATION_V3];

/// Apply all pending migrations.
pub fn migrate(conn: &Connection) -> crate::Result<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS schema_migrations (
            version INTEGER PRIMARY KEY,
            applied_at TEXT NOT NULL DEFAULT (datetime('now'))
        );",
    )?;
    let current = current_version(conn)?;
    for (index, batch) in MIGRATIONS.iter().enumerate() {
        let version = (index + 1) as i64;
        if version <= current {
            continue;
        }
        let tx = conn.unchecked_transaction()?;
        tx.execute_batch(batch).map_err(|err| {
            crate::Error::migration(format!("migration v{version} failed: {err}"))
        })?;
        tx.execute(
            "INSERT INTO schema_migrations (version) VALUES (?1)",
            [version],
        )?;
        tx.commit()?;
        debug!(version, "applied migration");
    }
    Ok(())
}

/// The last applied schema version; 0 for a fresh database.
pub fn current_version(conn: &Connection) -> crate::Result<i64> {
    let version: Option<i64> =
        conn.query_row("SELECT MAX(version) FROM schema_migrations", [], |row| {
            row.get(0)
        })?;
    Ok(version.unwrap_or(0))
}
