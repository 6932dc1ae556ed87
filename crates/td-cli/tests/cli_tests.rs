use td_cli::{Cli, Commands, Parser};

#[test]
fn test_bare_invocation_lists_the_root() {
    let cli = Cli::try_parse_from(["td"]).unwrap();
    assert!(cli.context.is_none());
    assert!(cli.command.is_none());
}

#[test]
fn test_positional_context_is_not_a_subcommand() {
    let cli = Cli::try_parse_from(["td", "work.project"]).unwrap();
    assert_eq!(cli.context.as_deref(), Some("work.project"));
    assert!(cli.command.is_none());
}

#[test]
fn test_cli_parsing_add_with_options() {
    let cli = Cli::try_parse_from([
        "td", "add", "buy milk", "--deadline", "2w", "--context", "home", "--priority", "3",
        "--period", "1w",
    ])
    .unwrap();
    let Some(Commands::Add(args)) = cli.command else {
        panic!("expected add");
    };
    assert_eq!(args.title, "buy milk");
    assert_eq!(args.deadline.as_deref(), Some("2w"));
    assert_eq!(args.context.as_deref(), Some("home"));
    assert_eq!(args.priority, Some(3));
    assert_eq!(args.period, Some(7 * 24 * 3600));
}

#[test]
fn test_cli_parsing_hex_ids() {
    let cli = Cli::try_parse_from(["td", "done", "a", "1f"]).unwrap();
    assert!(matches!(
        cli.command,
        Some(Commands::Done { ref ids }) if ids == &vec![10, 31]
    ));

    let err = Cli::try_parse_from(["td", "done", "xyz"]);
    assert!(err.is_err());
}

#[test]
fn test_cli_parsing_ctx_rename() {
    let cli = Cli::try_parse_from(["td", "ctx", "work.project", "--name", "archive"]).unwrap();
    let Some(Commands::Ctx(args)) = cli.command else {
        panic!("expected ctx");
    };
    assert_eq!(args.context, "work.project");
    assert_eq!(args.name.as_deref(), Some("archive"));
}

#[test]
fn test_cli_parsing_ctx_visibility() {
    let cli = Cli::try_parse_from(["td", "ctx", "work", "--visibility", "hidden"]).unwrap();
    let Some(Commands::Ctx(args)) = cli.command else {
        panic!("expected ctx");
    };
    assert_eq!(args.visibility, Some(td_core::Visibility::Hidden));

    let err = Cli::try_parse_from(["td", "ctx", "work", "--visibility", "loud"]);
    assert!(err.is_err());
}

#[test]
fn test_cli_parsing_search_flags() {
    let cli = Cli::try_parse_from([
        "td", "search", "report", "--context", "work", "--done", "--before", "1w", "--case",
    ])
    .unwrap();
    let Some(Commands::Search(args)) = cli.command else {
        panic!("expected search");
    };
    assert_eq!(args.term, "report");
    assert_eq!(args.context.as_deref(), Some("work"));
    assert!(args.done);
    assert!(args.case);
    assert_eq!(args.before.as_deref(), Some("1w"));

    let conflict = Cli::try_parse_from(["td", "search", "report", "--done", "--undone"]);
    assert!(conflict.is_err());
}

#[test]
fn test_cli_parsing_mv_and_rmctx() {
    let cli = Cli::try_parse_from(["td", "mv", "work.old", "archive"]).unwrap();
    assert!(matches!(
        cli.command,
        Some(Commands::Mv { ref source, ref destination })
            if source == "work.old" && destination == "archive"
    ));

    let cli = Cli::try_parse_from(["td", "rmctx", "work.old", "--force"]).unwrap();
    assert!(matches!(
        cli.command,
        Some(Commands::Rmctx { ref context, force: true }) if context == "work.old"
    ));
}

#[test]
fn test_data_dir_flag_is_global() {
    let cli = Cli::try_parse_from(["td", "history", "--data-dir", "/tmp/elsewhere"]).unwrap();
    assert_eq!(
        cli.data_dir.as_deref(),
        Some(std::path::Path::new("/tmp/elsewhere"))
    );
    assert!(matches!(cli.command, Some(Commands::History)));
}

mod end_to_end {
    use td_cli::{commands, Cli, Parser};
    use td_local_db::{Database, TaskStore};

    fn run(dir: &std::path::Path, args: &[&str]) {
        let mut argv = vec!["td"];
        argv.extend_from_slice(args);
        argv.extend_from_slice(&["--data-dir", dir.to_str().unwrap()]);
        let cli = Cli::try_parse_from(argv).unwrap();
        commands::run(cli).unwrap();
    }

    #[test]
    fn test_add_done_purge_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        run(dir.path(), &["add", "first task", "--context", "work"]);
        run(dir.path(), &["add", "second task"]);
        run(dir.path(), &["done", "1"]);
        run(dir.path(), &["purge"]);

        let db = Database::open(dir.path().join("data.sqlite")).unwrap();
        let store = TaskStore::new(db.connection());
        assert!(store.get(1).unwrap().is_none());
        let survivor = store.get(2).unwrap().unwrap();
        assert_eq!(survivor.title, "second task");
        assert_eq!(survivor.context.path, "");
    }

    #[test]
    fn test_ctx_rename_cascades_from_the_cli() {
        let dir = tempfile::tempdir().unwrap();
        run(dir.path(), &["add", "deep", "--context", "work.project.sub"]);
        run(dir.path(), &["ctx", "work.project", "--name", "archive"]);

        let db = Database::open(dir.path().join("data.sqlite")).unwrap();
        let store = TaskStore::new(db.connection());
        assert_eq!(
            store.get(1).unwrap().unwrap().context.path,
            ".work.archive.sub"
        );
    }
}
