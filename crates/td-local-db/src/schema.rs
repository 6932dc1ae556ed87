//! Schema constants.

/// Current schema version: the length of the migration list.
pub const SCHEMA_VERSION: i64 = 3;

// Table names
pub const TABLE_SCHEMA_MIGRATIONS: &str = "schema_migrations";
pub const TABLE_CONTEXT: &str = "Context";
pub const TABLE_TASK: &str = "Task";
pub const TABLE_TASK_DEPENDENCY: &str = "TaskDependency";
pub const TABLE_TASK_DONE_HISTORY: &str = "TaskDoneHistory";
