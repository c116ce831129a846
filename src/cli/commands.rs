use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(name = "tend", about = concat!("tend v", env!("CARGO_PKG_VERSION"), " - tasks in your terminal"), version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Use this database instead of <data_dir>/tend.db
    #[arg(long, global = true, value_name = "PATH")]
    pub db: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Quick-add a task: words, #project, @tag, !priority, due:<date>
    Add(AddArgs),
    /// List top-level tasks with their subtasks
    List(ListArgs),
    /// List projects
    Projects(JsonArgs),
    /// List tags
    Tags(JsonArgs),
}

#[derive(Args)]
pub struct AddArgs {
    /// The task sentence
    #[arg(required = true, num_args = 1..)]
    pub words: Vec<String>,
}

#[derive(Args)]
pub struct ListArgs {
    /// Include done tasks. Archived tasks are never listed.
    #[arg(long)]
    pub all: bool,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Args)]
pub struct JsonArgs {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}
