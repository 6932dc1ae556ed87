//! Command dispatch: one short-lived process per invocation, one open
//! connection, one logical operation.

use std::env;
use std::fs;
use std::io::{self, Write as _};
use std::path::{Path, PathBuf};

use chrono::{NaiveDateTime, Utc};
use tracing::warn;

use td_core::editor;
use td_core::moment::{self, Direction};
use td_core::path;
use td_local_db::{
    complete_task, ContextOptions, ContextStore, Database, DependencyStore, DoneOutcome,
    NewTaskOptions, RenameOutcome, TaskPatch, TaskStore,
};

use crate::table;
use crate::{AddArgs, Cli, Commands, CtxArgs, SearchArgs, TaskArgs};

const TASK_NOT_FOUND: &str = "Task not found.";
const CTX_NOT_FOUND: &str = "Context not found.";

const DATA_DIR_NAME: &str = ".toduh";
const DATABASE_NAME: &str = "data.sqlite";

/// Resolve the data directory: explicit flag, then `$TD_DATA_DIR`, then a
/// `.toduh` directory in the current directory, then one in the home
/// directory.
fn resolve_data_dir(flag: Option<&Path>) -> PathBuf {
    if let Some(dir) = flag {
        return dir.to_path_buf();
    }
    if let Ok(dir) = env::var("TD_DATA_DIR") {
        return PathBuf::from(dir);
    }
    let local = Path::new(DATA_DIR_NAME);
    if local.is_dir() {
        return local.to_path_buf();
    }
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(DATA_DIR_NAME)
}

/// Path to the database file, creating the data directory if needed.
pub fn data_file(flag: Option<&Path>) -> io::Result<PathBuf> {
    let dir = resolve_data_dir(flag);
    fs::create_dir_all(&dir)?;
    Ok(dir.join(DATABASE_NAME))
}

/// Run one command against the store. "Now" is captured once here and
/// threaded through every operation.
pub fn run(cli: Cli) -> anyhow::Result<()> {
    let now = Utc::now().naive_utc();
    let db_path = data_file(cli.data_dir.as_deref())?;
    let db = Database::open(&db_path)?;
    let result = dispatch(&db, &cli, now);
    let closed = db.close();
    result?;
    closed?;
    Ok(())
}

fn dispatch(db: &Database, cli: &Cli, now: NaiveDateTime) -> anyhow::Result<()> {
    match &cli.command {
        None => list(db, cli.context.as_deref().unwrap_or(""), cli.json, now),
        Some(Commands::Add(args)) => add(db, args, now),
        Some(Commands::Done { ids }) => done(db, ids, now),
        Some(Commands::Undone { ids }) => undone(db, ids),
        Some(Commands::Task(args)) => update_task(db, args, now),
        Some(Commands::Edit { id }) => edit(db, *id),
        Some(Commands::Rm { ids }) => remove(db, ids),
        Some(Commands::Ctx(args)) => ctx(db, args),
        Some(Commands::Mv {
            source,
            destination,
        }) => mv(db, source, destination),
        Some(Commands::Rmctx { context, force }) => rmctx(db, context, *force),
        Some(Commands::Contexts { context }) => {
            contexts(db, context.as_deref().unwrap_or(""), now)
        }
        Some(Commands::History) => history(db),
        Some(Commands::Search(args)) => search(db, args, now),
        Some(Commands::Future { context }) => future(db, context.as_deref().unwrap_or(""), now),
        Some(Commands::Ping { ids }) => ping(db, ids),
        Some(Commands::Purge { before }) => purge(db, before.as_deref(), now),
    }
}

fn parse_opt_moment(
    value: Option<&str>,
    now: NaiveDateTime,
    direction: Direction,
) -> anyhow::Result<Option<NaiveDateTime>> {
    Ok(value
        .map(|v| moment::parse_moment(v, now, direction))
        .transpose()?)
}

fn id_width(tasks: &TaskStore) -> anyhow::Result<usize> {
    Ok(tasks
        .greatest_id()?
        .map(|id| format!("{id:x}").len())
        .unwrap_or(1))
}

fn list(db: &Database, context: &str, json: bool, now: NaiveDateTime) -> anyhow::Result<()> {
    let query = path::encode(context);
    let store = TaskStore::new(db.connection());
    let tasks = store.list(&query, true, now)?;
    if json {
        println!("{}", serde_json::to_string_pretty(&tasks)?);
        return Ok(());
    }
    let width = id_width(&store)?;
    table::print_tasks(&tasks, &query, width, now);
    for tally in ContextStore::new(db.connection()).subcontexts(&query, false, now)? {
        println!(
            "#{} ({})",
            path::decode(&tally.context.path),
            tally.total_tasks
        );
    }
    Ok(())
}

fn add(db: &Database, args: &AddArgs, now: NaiveDateTime) -> anyhow::Result<()> {
    let mut title = args.title.clone();
    let mut content = None;
    if args.edit {
        let document = editor::edit_in_editor(&editor::compose_document(&title, None))?;
        let (edited_title, edited_content) = editor::parse_document(&document);
        if !edited_title.is_empty() {
            title = edited_title;
        }
        if !edited_content.is_empty() {
            content = Some(edited_content);
        }
    }
    let options = NewTaskOptions {
        start: parse_opt_moment(args.start.as_deref(), now, Direction::Future)?,
        deadline: parse_opt_moment(args.deadline.as_deref(), now, Direction::Future)?,
        priority: args.priority,
        period: args.period,
        front: args.front,
    };
    let context = path::encode(args.context.as_deref().unwrap_or(""));
    let id = TaskStore::new(db.connection()).add(&title, content.as_deref(), &context, options, now)?;
    println!("Task {id:x} added.");
    Ok(())
}

fn done(db: &Database, ids: &[i64], now: NaiveDateTime) -> anyhow::Result<()> {
    for &id in ids {
        match complete_task(db.connection(), id, now)? {
            DoneOutcome::Done => println!("Task {id:x} done."),
            DoneOutcome::RecurrenceDone { next } => println!(
                "Task {id:x} done for the current period. Next occurrence: {}",
                moment::format_dt(next)
            ),
            DoneOutcome::AlreadyDone => println!("Task {id:x} is already done."),
            DoneOutcome::RecurrenceAlreadyDone { next } => println!(
                "Task {id:x} is already done for the current period. Next occurrence: {}",
                moment::format_dt(next)
            ),
            DoneOutcome::NotFound => println!("Task not found: {id:x}"),
        }
    }
    Ok(())
}

fn undone(db: &Database, ids: &[i64]) -> anyhow::Result<()> {
    let missed = TaskStore::new(db.connection()).set_undone_many(ids)?;
    report_missed(&missed);
    Ok(())
}

fn remove(db: &Database, ids: &[i64]) -> anyhow::Result<()> {
    let missed = TaskStore::new(db.connection()).remove_many(ids)?;
    report_missed(&missed);
    Ok(())
}

fn report_missed(missed: &[i64]) {
    for id in missed {
        println!("Task not found: {id:x}");
    }
}

fn update_task(db: &Database, args: &TaskArgs, now: NaiveDateTime) -> anyhow::Result<()> {
    let deadline = match args.deadline.as_deref() {
        None => None,
        Some(v) if v.eq_ignore_ascii_case("none") => Some(None),
        Some(v) => Some(Some(moment::parse_moment(v, now, Direction::Future)?)),
    };
    let period = match args.period.as_deref() {
        None => None,
        Some(v) if v.eq_ignore_ascii_case("none") => Some(None),
        Some(v) => Some(Some(moment::parse_period(v)?)),
    };
    let patch = TaskPatch {
        title: args.title.clone(),
        content: args.text.clone(),
        start: parse_opt_moment(args.start.as_deref(), now, Direction::Future)?,
        deadline,
        priority: args.priority,
        period,
        front: args.front.map(Some),
    };
    let context = args.context.as_deref().map(path::encode);
    let updated = TaskStore::new(db.connection()).update(args.id, context.as_deref(), patch)?;
    if updated == 0 {
        println!("{TASK_NOT_FOUND}");
        return Ok(());
    }
    if let Some(dependencies) = &args.depends_on {
        let store = DependencyStore::new(db.connection());
        if dependencies.len() == 1 && dependencies[0] == "nothing" {
            store.clear(args.id)?;
        } else {
            let ids = dependencies
                .iter()
                .map(|v| crate::parse_task_id(v))
                .collect::<Result<Vec<_>, _>>()
                .map_err(anyhow::Error::msg)?;
            store.set(args.id, &ids)?;
        }
    }
    Ok(())
}

/// Releases the advisory editing lock on drop, whether or not the editor
/// step succeeded.
struct EditingGuard<'a> {
    tasks: &'a TaskStore<'a>,
    id: i64,
}

impl Drop for EditingGuard<'_> {
    fn drop(&mut self) {
        if let Err(err) = self.tasks.release_editing_lock(self.id) {
            warn!(task = self.id, "failed to release editing lock: {err}");
        }
    }
}

fn edit(db: &Database, id: i64) -> anyhow::Result<()> {
    let tasks = TaskStore::new(db.connection());
    let Some(task) = tasks.get(id)? else {
        println!("{TASK_NOT_FOUND}");
        return Ok(());
    };
    if !tasks.take_editing_lock(id)? {
        println!("Task {id:x} is already being edited in another session.");
        return Ok(());
    }
    let _guard = EditingGuard { tasks: &tasks, id };
    let document = editor::compose_document(&task.title, task.content.as_deref());
    let edited = editor::edit_in_editor(&document)?;
    let (title, content) = editor::parse_document(&edited);
    let patch = TaskPatch {
        title: (!title.is_empty()).then_some(title),
        content: Some(content),
        ..Default::default()
    };
    tasks.update(id, None, patch)?;
    Ok(())
}

fn ctx(db: &Database, args: &CtxArgs) -> anyhow::Result<()> {
    let context = path::encode(&args.context);
    let store = ContextStore::new(db.connection());
    let options = ContextOptions {
        priority: args.priority,
        visibility: args.visibility,
    };
    if !options.is_empty() {
        store.set(&context, options)?;
    } else if args.name.is_none() {
        store.get_or_create(&context, ContextOptions::default())?;
    }
    if let Some(name) = &args.name {
        match store.rename(&context, name)? {
            RenameOutcome::Conflict => {
                println!("A context named {name:?} already exists at this level.")
            }
            RenameOutcome::Renamed(count) => println!("{count} context(s) renamed."),
        }
    }
    Ok(())
}

fn mv(db: &Database, source: &str, destination: &str) -> anyhow::Result<()> {
    let moved = ContextStore::new(db.connection())
        .move_all(&path::encode(source), &path::encode(destination))?;
    println!("{moved} task(s) moved.");
    Ok(())
}

fn rmctx(db: &Database, context: &str, force: bool) -> anyhow::Result<()> {
    let context = path::encode(context);
    if context.is_empty() {
        println!("Can't remove the root context.");
        return Ok(());
    }
    let store = ContextStore::new(db.connection());
    if !store.exists(&context)? {
        println!("{CTX_NOT_FOUND}");
        return Ok(());
    }
    if !force {
        let (tasks, subcontexts) = store.basic_tally(&context)?;
        print!(
            "This will remove {tasks} task(s) and {subcontexts} direct subcontext(s). Proceed? [y/N] "
        );
        io::stdout().flush()?;
        let mut answer = String::new();
        io::stdin().read_line(&mut answer)?;
        if !matches!(answer.trim(), "y" | "Y" | "yes") {
            println!("Aborted.");
            return Ok(());
        }
    }
    let removed = store.remove(&context)?;
    println!("{removed} context(s) removed.");
    Ok(())
}

fn contexts(db: &Database, context: &str, now: NaiveDateTime) -> anyhow::Result<()> {
    let tallies = ContextStore::new(db.connection()).descendants(&path::encode(context), now)?;
    table::print_contexts(&tallies);
    Ok(())
}

fn history(db: &Database) -> anyhow::Result<()> {
    let store = TaskStore::new(db.connection());
    let tasks = store.history()?;
    let width = id_width(&store)?;
    table::print_history(&tasks, width);
    Ok(())
}

fn search(db: &Database, args: &SearchArgs, now: NaiveDateTime) -> anyhow::Result<()> {
    let context = path::encode(args.context.as_deref().unwrap_or(""));
    let done = if args.done {
        Some(true)
    } else if args.undone {
        Some(false)
    } else {
        None
    };
    let before = parse_opt_moment(args.before.as_deref(), now, Direction::Past)?;
    let after = parse_opt_moment(args.after.as_deref(), now, Direction::Past)?;
    let store = TaskStore::new(db.connection());
    let hits = store.search(&args.term, &context, done, before, after, args.case)?;
    let width = id_width(&store)?;
    table::print_search(&hits, width, now);
    Ok(())
}

fn future(db: &Database, context: &str, now: NaiveDateTime) -> anyhow::Result<()> {
    let store = TaskStore::new(db.connection());
    let tasks = store.future(&path::encode(context), now)?;
    let width = id_width(&store)?;
    table::print_future(&tasks, width);
    Ok(())
}

fn ping(db: &Database, ids: &[i64]) -> anyhow::Result<()> {
    let store = TaskStore::new(db.connection());
    for &id in ids {
        if store.ping(id)? == 0 {
            println!("Task not found: {id:x}");
        } else if let Some(task) = store.get(id)? {
            println!("Task {id:x} ping: {}", task.ping);
        }
    }
    Ok(())
}

fn purge(db: &Database, before: Option<&str>, now: NaiveDateTime) -> anyhow::Result<()> {
    let before = parse_opt_moment(before, now, Direction::Past)?;
    let removed = TaskStore::new(db.connection()).purge(before)?;
    println!("{removed} task(s) purged.");
    Ok(())
}
