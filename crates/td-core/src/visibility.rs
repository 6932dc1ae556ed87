//! Task relevance: how far up the context tree a task bleeds into listings.

use serde::{Deserialize, Serialize};

use crate::path;

/// Visibility attribute of a context, inherited by its tasks as their
/// effective visibility. Stored as `hidden`, `normal` or `wide` text;
/// `normal` behaves as discreet.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    /// Relevant only to a query naming the exact context.
    Hidden,
    /// Relevant to the context and its ancestors, with one exception: from
    /// the root query the task shows only if its context is a direct child
    /// of the root.
    #[default]
    #[serde(rename = "normal")]
    Discreet,
    /// Relevant to the context, its ancestors, and always to the root.
    Wide,
}

impl Visibility {
    /// Parse the stored text form. `discreet` is accepted as a synonym for
    /// `normal`.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "hidden" => Some(Self::Hidden),
            "normal" | "discreet" => Some(Self::Discreet),
            "wide" => Some(Self::Wide),
            _ => None,
        }
    }

    /// The stored text form.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Hidden => "hidden",
            Self::Discreet => "normal",
            Self::Wide => "wide",
        }
    }
}

/// Decide whether a task owned by `task_ctx` surfaces under a query for
/// `query_ctx`, given the task's effective visibility. Both paths are in the
/// internal (dot-prefixed) form.
///
/// An exact context match is always relevant, whatever the visibility. The
/// discreet root case is deliberate legacy behavior: from the root, discreet
/// tasks deeper than one level stay out of sight even though every other
/// ancestor on their chain sees them.
pub fn is_relevant(task_ctx: &str, visibility: Visibility, query_ctx: &str) -> bool {
    if task_ctx == query_ctx {
        return true;
    }
    match visibility {
        Visibility::Hidden => false,
        Visibility::Discreet => {
            if query_ctx.is_empty() {
                path::depth(task_ctx) == 1
            } else {
                path::is_within(task_ctx, query_ctx)
            }
        }
        Visibility::Wide => query_ctx.is_empty() || path::is_within(task_ctx, query_ctx),
    }
}
