//! Task domain type.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::recurrence;
use crate::visibility::Visibility;

/// The owning-context attributes a task carries out of the store: enough to
/// decide relevance and ordering without a second lookup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContextRef {
    pub id: i64,
    pub path: String,
    pub priority: i64,
    pub visibility: Visibility,
}

/// A task row, fully resolved.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    pub id: i64,
    pub title: String,
    /// Long-form body, edited through a text editor rather than the command
    /// line.
    pub content: Option<String>,
    pub created: NaiveDateTime,
    pub start: NaiveDateTime,
    pub deadline: Option<NaiveDateTime>,
    pub priority: i64,
    /// Completion timestamp; `None` while the task is active. Recurring
    /// tasks never set this, their completions live in the done history.
    pub done: Option<NaiveDateTime>,
    pub context: ContextRef,
    /// Advisory editing lock, persisted so a concurrent edit invocation is
    /// refused instead of clobbering the first editor's work.
    pub editing: bool,
    pub ping: i64,
    /// Recurrence period in seconds; `None` for one-shot tasks.
    pub period: Option<i64>,
    pub front: Option<bool>,
    /// Most recent recurrence completion, when any.
    pub last_period_done: Option<NaiveDateTime>,
}

impl Task {
    /// Effective visibility, inherited from the owning context.
    pub fn visibility(&self) -> Visibility {
        self.context.visibility
    }

    pub fn is_recurring(&self) -> bool {
        self.period.is_some()
    }

    pub fn is_done(&self) -> bool {
        self.done.is_some()
    }

    pub fn has_started(&self, now: NaiveDateTime) -> bool {
        now >= self.start
    }

    /// Whole seconds until the deadline; negative once overdue, `None`
    /// without a deadline.
    pub fn remaining_seconds(&self, now: NaiveDateTime) -> Option<i64> {
        self.deadline.map(|deadline| (deadline - now).num_seconds())
    }

    /// True for a recurring task whose current occurrence window has already
    /// been satisfied.
    pub fn current_period_is_done(&self, now: NaiveDateTime) -> bool {
        let Some(period) = self.period else {
            return false;
        };
        let (previous, _) = recurrence::occurrence_window(self.start, period, now);
        recurrence::current_period_is_done(self.last_period_done, previous)
    }
}
