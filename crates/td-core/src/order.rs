//! Deterministic display ordering for task listings.
//!
//! Tasks are totally ordered by (priority desc, time remaining to the
//! deadline asc, owning-context priority desc, creation time asc). Remaining
//! time is compared in whole seconds; a missing deadline sorts as infinitely
//! far in the future.

use chrono::NaiveDateTime;

use crate::task::Task;

/// The comparable sort key of one task at a given instant.
pub fn order_key(task: &Task, now: NaiveDateTime) -> (i64, i64, i64, NaiveDateTime) {
    let remaining = task.remaining_seconds(now).unwrap_or(i64::MAX);
    (-task.priority, remaining, -task.context.priority, task.created)
}

/// Sort tasks for display. The underlying sort is stable, so equal keys keep
/// their incoming order and re-sorting is a no-op.
pub fn sort_for_display(tasks: &mut [Task], now: NaiveDateTime) {
    tasks.sort_by_key(|task| order_key(task, now));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::moment::parse_dt;
    use crate::task::ContextRef;
    use crate::visibility::Visibility;

    fn dt(s: &str) -> NaiveDateTime {
        parse_dt(s).unwrap()
    }

    fn task(id: i64, priority: i64, deadline: Option<&str>, ctx_priority: i64, created: &str) -> Task {
        Task {
            id,
            title: format!("task {id}"),
            content: None,
            created: dt(created),
            start: dt(created),
            deadline: deadline.map(|d| dt(d)),
            priority,
            done: None,
            context: ContextRef {
                id: 1,
                path: ".work".to_string(),
                priority: ctx_priority,
                visibility: Visibility::Discreet,
            },
            editing: false,
            ping: 0,
            period: None,
            front: None,
            last_period_done: None,
        }
    }

    #[test]
    fn priority_dominates() {
        let now = dt("2023-11-20 00:00:00");
        let mut tasks = vec![
            task(1, 1, Some("2023-11-21 00:00:00"), 1, "2023-11-01 00:00:00"),
            task(2, 5, None, 1, "2023-11-02 00:00:00"),
        ];
        sort_for_display(&mut tasks, now);
        assert_eq!(tasks[0].id, 2);
    }

    #[test]
    fn nearer_deadline_wins_within_a_priority() {
        let now = dt("2023-11-20 00:00:00");
        let mut tasks = vec![
            task(1, 1, None, 1, "2023-11-01 00:00:00"),
            task(2, 1, Some("2023-12-01 00:00:00"), 1, "2023-11-01 00:00:00"),
            task(3, 1, Some("2023-11-21 00:00:00"), 1, "2023-11-01 00:00:00"),
        ];
        sort_for_display(&mut tasks, now);
        assert_eq!(tasks.iter().map(|t| t.id).collect::<Vec<_>>(), vec![3, 2, 1]);
    }

    #[test]
    fn context_priority_then_creation_break_ties() {
        let now = dt("2023-11-20 00:00:00");
        let mut tasks = vec![
            task(1, 1, None, 1, "2023-11-02 00:00:00"),
            task(2, 1, None, 1, "2023-11-01 00:00:00"),
            task(3, 1, None, 9, "2023-11-03 00:00:00"),
        ];
        sort_for_display(&mut tasks, now);
        assert_eq!(tasks.iter().map(|t| t.id).collect::<Vec<_>>(), vec![3, 2, 1]);
    }

    #[test]
    fn sorting_is_idempotent() {
        let now = dt("2023-11-20 00:00:00");
        let mut tasks = vec![
            task(1, 2, Some("2023-11-25 00:00:00"), 1, "2023-11-01 00:00:00"),
            task(2, 2, Some("2023-11-25 00:00:00"), 1, "2023-11-01 00:00:00"),
            task(3, 1, None, 1, "2023-11-01 00:00:00"),
        ];
        sort_for_display(&mut tasks, now);
        let first_pass: Vec<i64> = tasks.iter().map(|t| t.id).collect();
        sort_for_display(&mut tasks, now);
        let second_pass: Vec<i64> = tasks.iter().map(|t| t.id).collect();
        assert_eq!(first_pass, second_pass);
        // Equal keys keep their insertion order.
        assert_eq!(first_pass, vec![1, 2, 3]);
    }
}
