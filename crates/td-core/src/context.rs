//! Context tree nodes.

use serde::{Deserialize, Serialize};

use crate::path;
use crate::visibility::Visibility;

/// A node in the hierarchical task-grouping namespace.
///
/// The `path` field is the internal dot-prefixed tree key; the root context
/// has the empty path. Every non-root context has a parent row in the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Context {
    pub id: i64,
    pub path: String,
    pub priority: i64,
    pub visibility: Visibility,
}

impl Context {
    /// User-facing path, without the leading separator.
    pub fn display_path(&self) -> &str {
        path::decode(&self.path)
    }

    /// The context's own name, the final path segment.
    pub fn name(&self) -> &str {
        path::name(&self.path)
    }

    pub fn depth(&self) -> usize {
        path::depth(&self.path)
    }

    pub fn is_root(&self) -> bool {
        self.path.is_empty()
    }
}

/// A context annotated with task counts, as returned by subtree listings.
/// `own_tasks` counts the tasks the context directly owns; `total_tasks`
/// counts its whole subtree. Both exclude completed and not-yet-started
/// tasks.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContextTally {
    pub context: Context,
    pub own_tasks: i64,
    pub total_tasks: i64,
}
