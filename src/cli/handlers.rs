use std::path::Path;

use chrono::{Local, Utc};
use tracing::{debug, info};

use crate::cli::commands::*;
use crate::cli::output::*;
use crate::io::config_io::{self, CONFIG_FILE, DB_FILE, LOG_FILE};
use crate::io::logging::{self, LogTarget};
use crate::model::ViewMode;
use crate::ops::filter::{Filters, filter_tasks};
use crate::ops::loader;
use crate::ops::quick_add::{create_task, parse_quick_add};
use crate::store::Store;

type CmdResult = Result<(), Box<dyn std::error::Error>>;

// ---------------------------------------------------------------------------
// Dispatch
// ---------------------------------------------------------------------------

pub fn dispatch(cli: Cli) -> CmdResult {
    let config_path = config_io::config_dir().join(CONFIG_FILE);
    let (config, _) = config_io::read_config(&config_path)?;
    let db_path = cli
        .db
        .clone()
        .unwrap_or_else(|| config_io::data_dir(&config).join(DB_FILE));

    match cli.command {
        None => {
            // The TUI owns the terminal, so its log goes to a file
            logging::init(LogTarget::File(
                &config_io::data_dir(&config).join(LOG_FILE),
            ))?;
            crate::tui::run(config, Some(config_path), db_path)
        }
        Some(cmd) => {
            logging::init(LogTarget::Stderr)?;
            let store = open_store(&db_path)?;
            match cmd {
                Commands::Add(args) => cmd_add(&store, args),
                Commands::List(args) => cmd_list(&store, args),
                Commands::Projects(args) => cmd_projects(&store, args.json),
                Commands::Tags(args) => cmd_tags(&store, args.json),
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn open_store(path: &Path) -> Result<Store, Box<dyn std::error::Error>> {
    debug!(db = %path.display(), "opening store");
    Store::open(path).map_err(|e| format!("{}: {}", path.display(), e).into())
}

fn print_json<T: serde::Serialize>(value: &T) -> CmdResult {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

// ---------------------------------------------------------------------------
// Commands
// ---------------------------------------------------------------------------

fn cmd_add(store: &Store, args: AddArgs) -> CmdResult {
    let sentence = args.words.join(" ");
    let qa = parse_quick_add(&sentence, Local::now());
    let task = create_task(store, &qa, Utc::now())?;
    info!(id = %task.id, "task added");
    println!("Added {} ({})", task.title, task.id);
    Ok(())
}

fn cmd_list(store: &Store, args: ListArgs) -> CmdResult {
    let data = loader::reload(store)?;
    let mode = if args.all {
        ViewMode::All
    } else {
        ViewMode::Active
    };
    let visible = filter_tasks(
        &data.tasks,
        mode,
        &Filters::default(),
        &data.projects,
        Utc::now(),
    );

    if args.json {
        let tasks: Vec<TaskJson> = visible
            .iter()
            .map(|&i| task_to_json(&data.tasks[i], &data.blocked))
            .collect();
        return print_json(&tasks);
    }

    if visible.is_empty() {
        println!("No tasks.");
        return Ok(());
    }
    for &i in &visible {
        for line in format_task_tree(&data.tasks[i], &data.projects, &data.blocked) {
            println!("{}", line);
        }
    }
    Ok(())
}

fn cmd_projects(store: &Store, json: bool) -> CmdResult {
    let projects = store.list_projects()?;
    if json {
        let out: Vec<ProjectJson> = projects.iter().map(project_to_json).collect();
        return print_json(&out);
    }
    for project in &projects {
        println!("{}", format_project_line(project));
    }
    Ok(())
}

fn cmd_tags(store: &Store, json: bool) -> CmdResult {
    let tags = store.list_tags()?;
    if json {
        let out: Vec<TagJson> = tags.iter().map(tag_to_json).collect();
        return print_json(&out);
    }
    if tags.is_empty() {
        println!("No tags.");
        return Ok(());
    }
    for tag in &tags {
        println!("{}", format_tag_line(tag));
    }
    Ok(())
}
