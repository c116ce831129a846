/// Categories used to group commands in the help overlay
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum CommandCategory {
    Edit,
    Organize,
    Filter,
    Time,
    System,
}

/// A colon command: canonical name, aliases, and whether it takes arguments
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommandDef {
    pub name: &'static str,
    pub aliases: &'static [&'static str],
    pub has_args: bool,
    pub usage: &'static str,
    pub description: &'static str,
    pub category: CommandCategory,
}

const fn cmd(
    name: &'static str,
    aliases: &'static [&'static str],
    has_args: bool,
    usage: &'static str,
    description: &'static str,
    category: CommandCategory,
) -> CommandDef {
    CommandDef {
        name,
        aliases,
        has_args,
        usage,
        description,
        category,
    }
}

use CommandCategory::*;

pub const COMMANDS: &[CommandDef] = &[
    cmd("due", &["d"], true, ":due <date|none>", "Set due date", Edit),
    cmd("priority", &["pri", "p"], true, ":priority <low|medium|high|urgent>", "Set priority", Edit),
    cmd("tag", &["t"], true, ":tag <name>", "Toggle tag", Edit),
    cmd("project", &["proj", "mv", "move"], true, ":project <name>", "Move to project", Edit),
    cmd("parent", &["setparent"], false, ":parent", "Choose parent task", Edit),
    cmd("newproject", &["np", "addproject"], true, ":newproject <name>", "Create project", Organize),
    cmd("deleteproject", &["dp"], true, ":deleteproject <name>", "Delete project", Organize),
    cmd("recolor", &[], false, ":recolor", "Reassign project colors", Organize),
    cmd("newtag", &["nt", "addtag"], true, ":newtag <name>", "Create tag", Organize),
    cmd("recolortags", &[], false, ":recolortags", "Reassign tag colors", Organize),
    cmd("done", &["complete", "finish"], false, ":done", "Mark done", Edit),
    cmd("archive", &["arch"], false, ":archive", "Archive", Edit),
    cmd("delete", &["del", "rm"], false, ":delete", "Delete", Edit),
    cmd("theme", &[], true, ":theme <name>", "Switch theme", System),
    cmd("sort", &[], true, ":sort <priority|due|created|title>", "Sort list", Filter),
    cmd("filter", &["f"], true, ":filter [text]", "Filter by text", Filter),
    cmd("filterproject", &["fp"], false, ":filterproject", "Filter by project", Filter),
    cmd("filtertag", &["ft"], false, ":filtertag", "Filter by tags", Filter),
    cmd("clear", &[], false, ":clear", "Clear filters", Filter),
    cmd("projects", &["lsp"], false, ":projects", "List projects", Organize),
    cmd("tags", &["lst"], false, ":tags", "List tags", Organize),
    cmd("starttime", &["start", "track"], false, ":starttime", "Start timer", Time),
    cmd("stoptime", &["stop"], false, ":stoptime", "Stop timer", Time),
    cmd("addtime", &["logtime"], true, ":addtime <30m|1h|1h30m>", "Log time", Time),
    cmd("help", &["h", "?"], false, ":help", "Show help", System),
];

/// Resolve a verb (name or alias) to its command
pub fn resolve(verb: &str) -> Option<&'static CommandDef> {
    let verb = verb.to_lowercase();
    COMMANDS
        .iter()
        .find(|c| c.name == verb || c.aliases.contains(&verb.as_str()))
}

/// Split a command line into its verb and whitespace-joined arguments
pub fn split_command_line(line: &str) -> (&str, String) {
    let mut words = line.split_whitespace();
    let verb = words.next().unwrap_or("");
    (verb, words.collect::<Vec<_>>().join(" "))
}

/// Commands whose name or any alias starts with the typed verb. A command
/// the verb names exactly comes first. Once the input contains a space the
/// verb is settled and nothing is suggested.
pub fn suggestions(input: &str) -> Vec<&'static CommandDef> {
    if input.contains(' ') {
        return Vec::new();
    }
    let prefix = input.to_lowercase();
    let mut matches: Vec<&'static CommandDef> = COMMANDS
        .iter()
        .filter(|c| {
            c.name.starts_with(&prefix) || c.aliases.iter().any(|a| a.starts_with(&prefix))
        })
        .collect();
    if let Some(pos) = matches
        .iter()
        .position(|c| c.name == prefix || c.aliases.contains(&prefix.as_str()))
    {
        let exact = matches.remove(pos);
        matches.insert(0, exact);
    }
    matches
}

/// Input text after accepting `def` as the verb.
///
/// With no space typed yet the whole input becomes the canonical name, plus a
/// trailing space when the command takes arguments. Otherwise the typed
/// arguments are kept and only the verb is replaced.
pub fn apply_suggestion(input: &str, def: &CommandDef) -> String {
    match input.split_once(' ') {
        Some((_, args)) => format!("{} {}", def.name, args),
        None if def.has_args => format!("{} ", def.name),
        None => def.name.to_string(),
    }
}
