//! td command-line interface.
//!
//! The CLI is a thin layer over the stores: argument parsing, dispatch and
//! plain-text rendering. Task ids are displayed and accepted in hexadecimal;
//! moments and periods use the grammar of [`td_core::moment`].

pub mod commands;
pub mod table;

use std::path::PathBuf;

use td_core::Visibility;

// Re-export CLI types for testing
pub use clap::{Parser, Subcommand};

/// Parse a hexadecimal task id as displayed in listings.
pub fn parse_task_id(value: &str) -> Result<i64, String> {
    i64::from_str_radix(value, 16).map_err(|_| format!("invalid task ID: {value}"))
}

/// Parse a visibility name.
pub fn parse_visibility(value: &str) -> Result<Visibility, String> {
    Visibility::parse(value)
        .ok_or_else(|| format!("VISIBILITY must be 'normal', 'hidden' or 'wide', not {value:?}"))
}

/// Parse a recurrence period such as `1w`.
pub fn parse_period_arg(value: &str) -> Result<i64, String> {
    td_core::moment::parse_period(value).map_err(|err| err.to_string())
}

#[derive(Parser)]
#[command(name = "td")]
#[command(about = "Context-tree todo list manager")]
#[command(version, long_about = None)]
pub struct Cli {
    /// Context to list, e.g. `work.project` (defaults to the root)
    pub context: Option<String>,

    /// Print the listing as JSON instead of text
    #[arg(long)]
    pub json: bool,

    /// Data directory (defaults to $TD_DATA_DIR, ./.toduh, or ~/.toduh)
    #[arg(long, global = true, value_name = "DIR")]
    pub data_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Add a task
    Add(AddArgs),
    /// Mark tasks as done
    Done {
        #[arg(required = true, value_parser = parse_task_id)]
        ids: Vec<i64>,
    },
    /// Reactivate completed tasks
    Undone {
        #[arg(required = true, value_parser = parse_task_id)]
        ids: Vec<i64>,
    },
    /// Update fields of a task
    Task(TaskArgs),
    /// Edit a task's title and body in a text editor
    Edit {
        #[arg(value_parser = parse_task_id)]
        id: i64,
    },
    /// Remove tasks
    Rm {
        #[arg(required = true, value_parser = parse_task_id)]
        ids: Vec<i64>,
    },
    /// Set options of a context, or rename it
    Ctx(CtxArgs),
    /// Move every task of a context's subtree under another context
    Mv {
        source: String,
        destination: String,
    },
    /// Remove a context, its subcontexts and all their tasks
    Rmctx {
        context: String,
        /// Skip the confirmation prompt
        #[arg(long)]
        force: bool,
    },
    /// List the contexts of a subtree with their task counts
    Contexts {
        context: Option<String>,
    },
    /// Every task ever created, oldest first
    History,
    /// Search task titles
    Search(SearchArgs),
    /// Tasks that have not started yet
    Future {
        context: Option<String>,
    },
    /// Bump a task's ping counter
    Ping {
        #[arg(required = true, value_parser = parse_task_id)]
        ids: Vec<i64>,
    },
    /// Delete completed tasks
    Purge {
        /// Only remove tasks created before this moment
        #[arg(long)]
        before: Option<String>,
    },
}

#[derive(clap::Args)]
pub struct AddArgs {
    /// Task title
    pub title: String,

    /// Deadline of the task (a moment: 2023-12-01, or a delay: 2w)
    #[arg(short = 'd', long, value_name = "MOMENT")]
    pub deadline: Option<String>,

    /// Moment the task starts to show in listings
    #[arg(short = 's', long, value_name = "MOMENT")]
    pub start: Option<String>,

    /// Context of the task
    #[arg(short = 'c', long)]
    pub context: Option<String>,

    /// Priority of the task
    #[arg(short = 'p', long)]
    pub priority: Option<i64>,

    /// Make the task recurrent with this period, e.g. 1w
    #[arg(long, value_parser = parse_period_arg)]
    pub period: Option<i64>,

    /// Show the long-form body in listings
    #[arg(long, value_name = "BOOL")]
    pub front: Option<bool>,

    /// Write a long-form body in a text editor before adding
    #[arg(long)]
    pub edit: bool,
}

#[derive(clap::Args)]
pub struct TaskArgs {
    #[arg(value_parser = parse_task_id)]
    pub id: i64,

    /// New title
    #[arg(long)]
    pub title: Option<String>,

    /// New long-form body
    #[arg(short = 't', long)]
    pub text: Option<String>,

    /// New deadline; 'none' removes the current one
    #[arg(short = 'd', long, value_name = "MOMENT")]
    pub deadline: Option<String>,

    /// New start moment
    #[arg(short = 's', long, value_name = "MOMENT")]
    pub start: Option<String>,

    /// New context
    #[arg(short = 'c', long)]
    pub context: Option<String>,

    /// New priority
    #[arg(short = 'p', long)]
    pub priority: Option<i64>,

    /// New recurrence period; 'none' makes the task one-shot again
    #[arg(long, value_name = "PERIOD")]
    pub period: Option<String>,

    /// Show the long-form body in listings
    #[arg(long, value_name = "BOOL")]
    pub front: Option<bool>,

    /// Task ids this task depends on; 'nothing' clears them
    #[arg(long, value_name = "ID", num_args = 1..)]
    pub depends_on: Option<Vec<String>>,
}

#[derive(clap::Args)]
pub struct CtxArgs {
    pub context: String,

    /// Priority of the context
    #[arg(short = 'p', long)]
    pub priority: Option<i64>,

    /// Visibility of the context: normal, hidden or wide
    #[arg(short = 'v', long, value_parser = parse_visibility)]
    pub visibility: Option<Visibility>,

    /// Rename the context (right-most name only)
    #[arg(long, value_name = "NAME")]
    pub name: Option<String>,
}

#[derive(clap::Args)]
pub struct SearchArgs {
    /// Substring to look for in task titles
    pub term: String,

    /// Context to search in, with recursion
    #[arg(short = 'c', long)]
    pub context: Option<String>,

    /// Restrict the search to done tasks
    #[arg(long, conflicts_with = "undone")]
    pub done: bool,

    /// Restrict the search to undone tasks
    #[arg(long)]
    pub undone: bool,

    /// Only tasks created before this moment
    #[arg(long, value_name = "MOMENT")]
    pub before: Option<String>,

    /// Only tasks created after this moment
    #[arg(long, value_name = "MOMENT")]
    pub after: Option<String>,

    /// Make the search case-sensitive
    #[arg(long)]
    pub case: bool,
}
