//! SQLite persistence for the td todo list.
//!
//! This crate provides the on-disk relations behind the context tree and its
//! tasks: one connection handle per command invocation, an additive
//! migration list, and store types over the `Context`, `Task`,
//! `TaskDependency` and `TaskDoneHistory` tables.

pub mod connection;
pub mod contexts;
pub mod deps;
pub mod migrations;
pub mod recurring;
mod row;
pub mod schema;
pub mod tasks;

/// Result type for database operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for database operations.
///
/// Expected outcomes of normal use (ids that do not exist, a rename that
/// collides, a refused editing lock) are return values on the individual
/// operations, not variants here.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Migration error: {message}")]
    Migration { message: String },

    #[error(transparent)]
    Core(#[from] td_core::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Generic database error: {0}")]
    Generic(String),
}

impl Error {
    /// Create a new migration error.
    pub fn migration<S: Into<String>>(message: S) -> Self {
        Self::Migration {
            message: message.into(),
        }
    }

    /// Create a new generic database error.
    pub fn generic<S: Into<String>>(message: S) -> Self {
        Self::Generic(message.into())
    }
}

/// Database connection and management.
pub use connection::Database;

/// Context tree storage.
pub use contexts::{ContextOptions, ContextStore, RenameOutcome};

/// Task-to-task dependency storage.
pub use deps::DependencyStore;

/// Recurrence completion tracking.
pub use recurring::{complete_task, DoneHistoryStore, DoneOutcome};

/// Task storage.
pub use tasks::{NewTaskOptions, TaskPatch, TaskStore};
