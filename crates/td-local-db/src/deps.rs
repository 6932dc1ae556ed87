//! Task-to-task dependency storage.
//!
//! A bare edge relation: `task_id` depends on `dependency_id`. Both ends
//! cascade on task deletion. No uniqueness or cycle constraint is enforced
//! here; resolution order is a concern for the layers above.

use rusqlite::{params, Connection};

use crate::Result;

/// Database operations for task dependencies.
pub struct DependencyStore<'a> {
    conn: &'a Connection,
}

impl<'a> DependencyStore<'a> {
    /// Create a new dependency store.
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    /// Record that `task_id` depends on `dependency_id`.
    pub fn add(&self, task_id: i64, dependency_id: i64) -> Result<()> {
        self.conn.execute(
            "INSERT INTO TaskDependency (task_id, dependency_id) VALUES (?1, ?2)",
            params![task_id, dependency_id],
        )?;
        Ok(())
    }

    /// Drop every dependency recorded for `task_id`. Returns the number of
    /// edges removed.
    pub fn clear(&self, task_id: i64) -> Result<usize> {
        let removed = self.conn.execute(
            "DELETE FROM TaskDependency WHERE task_id = ?1",
            [task_id],
        )?;
        Ok(removed)
    }

    /// Replace the dependency set of `task_id`.
    pub fn set(&self, task_id: i64, dependency_ids: &[i64]) -> Result<()> {
        self.clear(task_id)?;
        for &dependency_id in dependency_ids {
            self.add(task_id, dependency_id)?;
        }
        Ok(())
    }

    /// The ids `task_id` depends on.
    pub fn dependencies_of(&self, task_id: i64) -> Result<Vec<i64>> {
        let mut stmt = self.conn.prepare(
            "SELECT dependency_id FROM TaskDependency WHERE task_id = ?1 ORDER BY dependency_id",
        )?;
        let mapped = stmt.query_map([task_id], |row| row.get(0))?;
        Ok(mapped.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    /// The ids that depend on `task_id`.
    pub fn dependents_of(&self, task_id: i64) -> Result<Vec<i64>> {
        let mut stmt = self.conn.prepare(
            "SELECT task_id FROM TaskDependency WHERE dependency_id = ?1 ORDER BY task_id",
        )?;
        let mapped = stmt.query_map([task_id], |row| row.get(0))?;
        Ok(mapped.collect::<rusqlite::Result<Vec<_>>>()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tasks::{NewTaskOptions, TaskStore};
    use crate::Database;
    use td_core::moment;

    fn setup() -> (Database, i64, i64, i64) {
        let db = Database::open_in_memory().unwrap();
        let now = moment::parse_dt("2023-11-20 12:00:00").unwrap();
        let tasks = TaskStore::new(db.connection());
        let a = tasks.add("a", None, ".work", NewTaskOptions::default(), now).unwrap();
        let b = tasks.add("b", None, ".work", NewTaskOptions::default(), now).unwrap();
        let c = tasks.add("c", None, ".work", NewTaskOptions::default(), now).unwrap();
        (db, a, b, c)
    }

    #[test]
    fn edges_are_readable_from_both_ends() {
        let (db, a, b, c) = setup();
        let store = DependencyStore::new(db.connection());
        store.add(a, b).unwrap();
        store.add(a, c).unwrap();
        store.add(c, b).unwrap();
        assert_eq!(store.dependencies_of(a).unwrap(), vec![b, c]);
        assert_eq!(store.dependents_of(b).unwrap(), vec![a, c]);
    }

    #[test]
    fn set_replaces_the_whole_edge_set() {
        let (db, a, b, c) = setup();
        let store = DependencyStore::new(db.connection());
        store.set(a, &[b]).unwrap();
        store.set(a, &[c]).unwrap();
        assert_eq!(store.dependencies_of(a).unwrap(), vec![c]);
        store.set(a, &[]).unwrap();
        assert!(store.dependencies_of(a).unwrap().is_empty());
    }

    #[test]
    fn removing_a_task_cascades_its_edges() {
        let (db, a, b, _c) = setup();
        let store = DependencyStore::new(db.connection());
        store.add(a, b).unwrap();
        TaskStore::new(db.connection()).remove(b).unwrap();
        assert!(store.dependencies_of(a).unwrap().is_empty());
    }
}
