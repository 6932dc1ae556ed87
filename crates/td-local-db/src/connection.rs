//! Database connection management.

use rusqlite::Connection;
use std::path::Path;

use crate::migrations;

/// Handle to one open database connection.
///
/// The engine is built for single-threaded, short-lived-process use: a
/// command invocation opens one connection, performs one logical operation
/// and closes. Opening runs any pending migrations.
#[derive(Debug)]
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open the database at `path`, creating and migrating it if necessary.
    pub fn open<P: AsRef<Path>>(path: P) -> crate::Result<Self> {
        let conn = Connection::open(path)?;
        Self::initialize(conn)
    }

    /// Open an in-memory database for testing.
    pub fn open_in_memory() -> crate::Result<Self> {
        let conn = Connection::open_in_memory()?;
        Self::initialize(conn)
    }

    fn initialize(conn: Connection) -> crate::Result<Self> {
        // Cascading deletes and case-sensitive substring search both depend
        // on these; neither pragma persists in the file.
        conn.pragma_update(None, "foreign_keys", "ON")?;
        conn.pragma_update(None, "case_sensitive_like", "ON")?;
        migrations::migrate(&conn)?;
        Ok(Self { conn })
    }

    /// The underlying connection, borrowed by the store types.
    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    /// Close the connection, committing pending work.
    pub fn close(self) -> crate::Result<()> {
        self.conn.close().map_err(|(_, err)| err.into())
    }
}
