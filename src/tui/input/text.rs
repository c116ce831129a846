use crossterm::event::{KeyCode, KeyEvent};

use crate::tui::app::{App, Mode};

use super::edit_line;

/// Add, AddSubtask and Edit: a title prompt. Enter commits, Esc cancels.
pub(super) fn handle_text(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Esc => {
            app.input.clear();
            app.mode = Mode::default();
        }
        KeyCode::Enter => {
            let title = std::mem::take(&mut app.input.text);
            app.input.clear();
            match std::mem::take(&mut app.mode) {
                Mode::Add => {
                    app.create_task(&title);
                }
                Mode::AddSubtask { parent_id } => {
                    app.create_subtask(&parent_id, &title);
                }
                Mode::Edit { task_id } => app.rename_task(&task_id, &title),
                _ => {}
            }
        }
        _ => {
            edit_line(&mut app.input, key);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_keys::*;
    use crate::model::Priority;
    use crate::tui::app::Mode;
    use crate::tui::app::test_support::*;
    use crate::tui::worker::Request;
    use crossterm::event::KeyCode;
    use pretty_assertions::assert_eq;

    #[test]
    fn edit_prefills_and_renames() {
        let (mut app, store) = app_with_store();
        let task = seed(&store, "Draft", Priority::Medium);
        app.request(Request::Reload);
        pump(&mut app, &store);

        press(&mut app, KeyCode::Enter);
        assert_eq!(
            app.mode,
            Mode::Edit {
                task_id: task.id.clone()
            }
        );
        assert_eq!(app.input.text, "Draft");
        type_str(&mut app, " v2");
        press(&mut app, KeyCode::Enter);
        pump(&mut app, &store);
        assert_eq!(titles(&app), vec!["Draft v2"]);
    }

    #[test]
    fn empty_title_is_ignored() {
        let (mut app, store) = app_with_store();
        press(&mut app, KeyCode::Char('a'));
        type_str(&mut app, "   ");
        press(&mut app, KeyCode::Enter);
        assert_eq!(app.mode, Mode::default());
        assert!(app.outbox.is_empty());
        pump(&mut app, &store);
        assert!(app.rows.is_empty());
    }

    #[test]
    fn escape_discards_input() {
        let (mut app, store) = app_with_store();
        let task = seed(&store, "Keep", Priority::Medium);
        app.request(Request::Reload);
        pump(&mut app, &store);

        press(&mut app, KeyCode::Enter);
        press(&mut app, KeyCode::Backspace);
        press(&mut app, KeyCode::Esc);
        assert_eq!(app.mode, Mode::default());
        assert!(app.outbox.is_empty());
        assert_eq!(app.find_task(&task.id).unwrap().title, "Keep");
    }

    #[test]
    fn subtask_prompt_adds_under_cursor() {
        let (mut app, store) = app_with_store();
        seed(&store, "Move house", Priority::Medium);
        app.request(Request::Reload);
        pump(&mut app, &store);

        press(&mut app, KeyCode::Char('s'));
        type_str(&mut app, "Pack books");
        press(&mut app, KeyCode::Enter);
        pump(&mut app, &store);
        assert_eq!(titles(&app), vec!["Move house", "Pack books"]);
        assert_eq!(app.view.cursor, 1);
    }
}
