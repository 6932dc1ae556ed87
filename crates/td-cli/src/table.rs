//! Plain-text rendering for listings.
//!
//! Deliberately thin: aligned columns, cell truncation, nothing more. The
//! interesting decisions (which tasks, in which order) are all made by the
//! stores.

use chrono::NaiveDateTime;

use td_core::moment;
use td_core::path;
use td_core::{ContextTally, Task};

/// Truncate a cell to `length` characters, ellipsized when it does not fit.
pub fn limit_str(string: &str, length: usize) -> String {
    if string.chars().count() <= length {
        return string.to_string();
    }
    if length <= 3 {
        string.chars().take(length).collect()
    } else {
        let cut: String = string.chars().take(length - 3).collect();
        format!("{cut}...")
    }
}

/// One task line: hex id, title, then the annotations that differ from the
/// defaults.
pub fn task_line(task: &Task, query_path: &str, id_width: usize, now: NaiveDateTime) -> String {
    let mut line = format!("{:>width$x} | {}", task.id, task.title, width = id_width);
    if task.context.path != query_path {
        line.push_str(&format!(" #{}", path::decode(&task.context.path)));
    }
    if let Some(remaining) = task.remaining_seconds(now) {
        line.push_str(&format!(" ~ {} remaining", moment::human_remaining(remaining)));
    }
    if task.priority != 1 {
        line.push_str(&format!(" !{}", task.priority));
    }
    if task.front.unwrap_or(false) {
        if let Some(content) = &task.content {
            line.push('\n');
            line.push_str(content.trim_end());
        }
    }
    line
}

pub fn print_tasks(tasks: &[Task], query_path: &str, id_width: usize, now: NaiveDateTime) {
    for task in tasks {
        println!("{}", task_line(task, query_path, id_width, now));
    }
}

pub fn print_contexts(tallies: &[ContextTally]) {
    println!("{:<40} {:>9} {:>11}", "context", "own tasks", "total tasks");
    println!("{} {} {}", "-".repeat(40), "-".repeat(9), "-".repeat(11));
    for tally in tallies {
        println!(
            "{:<40} {:>9} {:>11}",
            limit_str(tally.context.display_path(), 40),
            tally.own_tasks,
            tally.total_tasks
        );
    }
}

pub fn print_history(tasks: &[Task], id_width: usize) {
    for task in tasks {
        let status = if task.is_done() { "DONE" } else { "" };
        println!(
            "{:>width$x}  {:<44} {}  {:<20} {}",
            task.id,
            limit_str(&task.title, 44),
            task.created.format("%Y-%m-%d"),
            limit_str(path::decode(&task.context.path), 20),
            status,
            width = id_width
        );
    }
}

/// Search and future listings show the tasks with their completion state or
/// start moment.
pub fn print_search(tasks: &[Task], id_width: usize, now: NaiveDateTime) {
    for task in tasks {
        let mut line = task_line(task, "", id_width, now);
        if task.is_done() {
            line.push_str(" [DONE]");
        }
        println!("{line}");
    }
}

pub fn print_future(tasks: &[Task], id_width: usize) {
    for task in tasks {
        println!(
            "{:>width$x} | {} (starts {})",
            task.id,
            task.title,
            moment::format_dt(task.start),
            width = id_width
        );
    }
}
