use chrono::Local;
use crossterm::event::{KeyCode, KeyEvent};
use tracing::debug;

use crate::model::Priority;
use crate::ops::dates::parse_natural_date;
use crate::tui::app::{App, Mode};
use crate::tui::command_actions::{self, CommandDef};

use super::edit_line;

pub(super) fn handle_command(app: &mut App, key: KeyEvent) {
    let suggestions = command_actions::suggestions(&app.input.text);
    match key.code {
        KeyCode::Esc => {
            app.input.clear();
            app.mode = Mode::default();
        }
        KeyCode::Up if !suggestions.is_empty() => {
            app.command_suggestion =
                (app.command_suggestion + suggestions.len() - 1) % suggestions.len();
        }
        KeyCode::Down if !suggestions.is_empty() => {
            app.command_suggestion = (app.command_suggestion + 1) % suggestions.len();
        }
        KeyCode::Tab => {
            if let Some(def) = highlighted(app, &suggestions) {
                accept_suggestion(app, def);
            }
        }
        KeyCode::Enter => {
            // A bare partial verb completes first
            if !app.input.text.contains(' ')
                && let Some(def) = highlighted(app, &suggestions)
            {
                accept_suggestion(app, def);
                if def.has_args {
                    return;
                }
            }
            let line = std::mem::take(&mut app.input.text);
            app.input.clear();
            app.mode = Mode::default();
            execute_command(app, &line);
        }
        KeyCode::Backspace if app.input.text.is_empty() => {
            app.mode = Mode::default();
        }
        _ => {
            let before = app.input.text.clone();
            if edit_line(&mut app.input, key) && app.input.text != before {
                app.command_suggestion = 0;
            }
        }
    }
}

fn highlighted(app: &App, suggestions: &[&'static CommandDef]) -> Option<&'static CommandDef> {
    if app.input.text.is_empty() {
        return None;
    }
    suggestions
        .get(app.command_suggestion.min(suggestions.len().saturating_sub(1)))
        .copied()
}

fn accept_suggestion(app: &mut App, def: &CommandDef) {
    let text = command_actions::apply_suggestion(&app.input.text, def);
    app.input.set(&text);
    app.command_suggestion = 0;
}

/// Run one command line. Every outcome, including bad input, ends up in the
/// status line.
pub(crate) fn execute_command(app: &mut App, line: &str) {
    let (verb, args) = command_actions::split_command_line(line);
    if verb.is_empty() {
        return;
    }
    let Some(def) = command_actions::resolve(verb) else {
        app.set_status(format!("Unknown command: {}", verb));
        return;
    };
    debug!(command = def.name, args = %args, "executing command");

    match def.name {
        "due" => match args.to_lowercase().as_str() {
            "" => app.set_status("Usage: due <date|none>"),
            "none" | "clear" => app.set_due(None),
            _ => match parse_natural_date(&args, Local::now()) {
                Some(due) => app.set_due(Some(due)),
                None => app.set_status(format!("Could not parse date: {}", args)),
            },
        },
        "priority" => match Priority::from_keyword(&args) {
            Some(priority) => app.set_priority(priority),
            None if args.is_empty() => app.set_status("Usage: priority <low|medium|high|urgent>"),
            None => app.set_status(format!("Unknown priority: {}", args)),
        },
        "tag" => app.toggle_tag_by_name(&args),
        "project" => {
            if args.is_empty() {
                app.open_project_selector();
            } else {
                app.move_to_project_named(&args);
            }
        }
        "parent" => app.open_parent_selector(),
        "newproject" => app.create_project(&args),
        "deleteproject" => app.delete_project(&args),
        "recolor" => app.recolor_projects(),
        "newtag" => app.create_tag(&args),
        "recolortags" => app.recolor_tags(),
        "done" => app.mark_done(),
        "archive" => app.archive(),
        "delete" => app.request_delete(),
        "theme" => app.set_theme(&args),
        "sort" => {
            if args.is_empty() {
                app.set_status("Usage: sort <priority|due|created|title>");
            } else {
                app.set_sort(&args);
            }
        }
        "filter" => app.set_text_filter(&args),
        "filterproject" => app.open_project_filter(),
        "filtertag" => app.open_tag_filter(),
        "clear" => app.clear_filters(),
        "projects" => app.list_projects(),
        "tags" => app.list_tags(),
        "starttime" => app.start_timer(),
        "stoptime" => app.stop_timer(),
        "addtime" => app.add_time(&args),
        "help" => app.show_help = true,
        _ => app.set_status(format!("Unknown command: {}", verb)),
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_keys::*;
    use super::*;
    use crate::model::{INBOX_ID, SortKey, TaskStatus};
    use crate::tui::app::test_support::*;
    use crate::tui::worker::Request;
    use pretty_assertions::assert_eq;

    fn loaded(titles: &[&str]) -> (App, crate::store::Store) {
        let (mut app, store) = app_with_store();
        for title in titles {
            seed(&store, title, Priority::Medium);
        }
        app.request(Request::Reload);
        pump(&mut app, &store);
        (app, store)
    }

    fn run(app: &mut App, line: &str) {
        press(app, KeyCode::Char(':'));
        type_str(app, line);
        press(app, KeyCode::Enter);
    }

    #[test]
    fn unknown_verb_is_a_status_not_an_error() {
        let (mut app, _store) = loaded(&[]);
        execute_command(&mut app, "frobnicate now");
        assert_eq!(app.status.as_deref(), Some("Unknown command: frobnicate"));
        assert!(app.outbox.is_empty());
    }

    #[test]
    fn priority_alias_sets_targets() {
        let (mut app, store) = loaded(&["A"]);
        run(&mut app, "pri urgent");
        pump(&mut app, &store);
        assert_eq!(app.all_tasks[0].priority, Priority::Urgent);

        execute_command(&mut app, "priority extreme");
        assert_eq!(app.status.as_deref(), Some("Unknown priority: extreme"));
    }

    #[test]
    fn due_accepts_dates_and_none() {
        let (mut app, store) = loaded(&["A"]);
        execute_command(&mut app, "due tomorrow");
        pump(&mut app, &store);
        assert!(app.all_tasks[0].due_date.is_some());

        execute_command(&mut app, "d none");
        pump(&mut app, &store);
        assert!(app.all_tasks[0].due_date.is_none());

        execute_command(&mut app, "due someday");
        assert_eq!(app.status.as_deref(), Some("Could not parse date: someday"));
    }

    #[test]
    fn enter_completes_argless_command_and_runs_it() {
        let (mut app, store) = loaded(&["A"]);
        app.view.view_mode = crate::model::ViewMode::All;
        run(&mut app, "comp");
        assert_eq!(app.mode, Mode::default());
        pump(&mut app, &store);
        assert_eq!(app.all_tasks[0].status, TaskStatus::Done);
    }

    #[test]
    fn enter_on_partial_verb_with_args_waits_for_them() {
        let (mut app, _store) = loaded(&["A"]);
        press(&mut app, KeyCode::Char(':'));
        type_str(&mut app, "sor");
        press(&mut app, KeyCode::Enter);
        assert_eq!(app.mode, Mode::Command);
        assert_eq!(app.input.text, "sort ");
        type_str(&mut app, "title");
        press(&mut app, KeyCode::Enter);
        assert_eq!(app.view.sort, SortKey::Title);
        assert_eq!(app.status.as_deref(), Some("Sorted by title"));
    }

    #[test]
    fn enter_on_exact_alias_picks_that_command() {
        let (mut app, _store) = loaded(&["Buy milk", "Call mom"]);
        app.view.view_mode = crate::model::ViewMode::All;
        press(&mut app, KeyCode::Char(':'));
        type_str(&mut app, "f");
        press(&mut app, KeyCode::Enter);
        assert_eq!(app.mode, Mode::Command);
        assert_eq!(app.input.text, "filter ");
        assert!(app.outbox.is_empty());
        assert!(app.all_tasks.iter().all(|t| t.status != TaskStatus::Done));

        type_str(&mut app, "milk");
        press(&mut app, KeyCode::Enter);
        assert_eq!(titles(&app), vec!["Buy milk"]);
    }

    #[test]
    fn suggestion_cycling_wraps() {
        let (mut app, _store) = loaded(&[]);
        press(&mut app, KeyCode::Char(':'));
        type_str(&mut app, "st");
        press(&mut app, KeyCode::Up);
        assert_eq!(app.command_suggestion, 1);
        press(&mut app, KeyCode::Tab);
        assert_eq!(app.input.text, "stoptime");
    }

    #[test]
    fn backspace_on_empty_leaves_command_mode() {
        let (mut app, _store) = loaded(&[]);
        press(&mut app, KeyCode::Char(':'));
        press(&mut app, KeyCode::Backspace);
        assert_eq!(app.mode, Mode::default());
    }

    #[test]
    fn project_command_needs_existing_project() {
        let (mut app, store) = loaded(&["A"]);
        execute_command(&mut app, "mv Garden");
        assert_eq!(app.status.as_deref(), Some("Project not found: Garden"));

        execute_command(&mut app, "newproject Garden");
        pump(&mut app, &store);
        assert_eq!(app.status.as_deref(), Some("Created project: Garden"));

        execute_command(&mut app, "mv garden");
        pump(&mut app, &store);
        assert_eq!(app.all_tasks[0].project_id.as_deref(), Some("garden"));

        execute_command(&mut app, "np garden");
        assert_eq!(app.status.as_deref(), Some("Project already exists: Garden"));
    }

    #[test]
    fn deleteproject_moves_tasks_to_inbox() {
        let (mut app, store) = loaded(&["A"]);
        execute_command(&mut app, "newproject Garden");
        pump(&mut app, &store);
        execute_command(&mut app, "mv garden");
        pump(&mut app, &store);
        app.view.filters.project_id = Some("garden".into());

        execute_command(&mut app, "dp Garden");
        pump(&mut app, &store);
        assert_eq!(app.status.as_deref(), Some("Deleted project: Garden"));
        assert!(!app.projects.contains_key("garden"));
        assert!(app.view.filters.project_id.is_none());
        assert_eq!(app.all_tasks[0].project_id.as_deref(), Some(INBOX_ID));

        execute_command(&mut app, "deleteproject Garden");
        assert_eq!(app.status.as_deref(), Some("Project not found: Garden"));
        execute_command(&mut app, "deleteproject inbox");
        assert_eq!(app.status.as_deref(), Some("The Inbox cannot be deleted"));
        assert!(app.outbox.is_empty());
    }

    #[test]
    fn filter_and_clear() {
        let (mut app, _store) = loaded(&["Buy milk", "Call mom"]);
        execute_command(&mut app, "f milk");
        assert_eq!(titles(&app), vec!["Buy milk"]);
        assert_eq!(app.status.as_deref(), Some("Filter: milk"));
        execute_command(&mut app, "clear");
        assert_eq!(titles(&app).len(), 2);
    }

    #[test]
    fn addtime_validates_duration() {
        let (mut app, store) = loaded(&["A"]);
        execute_command(&mut app, "addtime soon");
        assert_eq!(
            app.status.as_deref(),
            Some("Invalid duration: soon (use e.g. 30m, 1h, 1h30m)")
        );
        execute_command(&mut app, "logtime 1h30m");
        pump(&mut app, &store);
        assert_eq!(app.status.as_deref(), Some("Logged 1h30m"));
    }

    #[test]
    fn addtime_rejects_overflowing_duration() {
        let (mut app, _store) = loaded(&["A"]);
        execute_command(&mut app, "addtime 999999999999999999h");
        assert_eq!(
            app.status.as_deref(),
            Some("Invalid duration: 999999999999999999h (use e.g. 30m, 1h, 1h30m)")
        );
        assert!(app.outbox.is_empty());
    }

    #[test]
    fn listing_commands() {
        let (mut app, store) = loaded(&[]);
        store.ensure_tag("deep").unwrap();
        app.request(Request::Reload);
        pump(&mut app, &store);
        execute_command(&mut app, "lsp");
        assert_eq!(app.status.as_deref(), Some("Projects: Inbox"));
        execute_command(&mut app, "tags");
        assert_eq!(app.status.as_deref(), Some("Tags: @deep"));
    }
}
