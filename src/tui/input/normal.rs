use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use crate::tui::app::{App, Mode};

pub(super) fn handle_normal(app: &mut App, key: KeyEvent) {
    // A status message lasts until the next key
    app.status = None;

    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
    match key.code {
        KeyCode::Char('z') if ctrl => app.undo(),
        KeyCode::Char('y') if ctrl => app.redo(),
        _ if ctrl => {}

        // Movement
        KeyCode::Char('j') | KeyCode::Down => app.move_cursor_by(1),
        KeyCode::Char('k') | KeyCode::Up => app.move_cursor_by(-1),
        KeyCode::Char('g') | KeyCode::Home => app.move_cursor(0),
        KeyCode::Char('G') | KeyCode::End => app.move_cursor(app.rows.len().saturating_sub(1)),
        KeyCode::PageDown => app.move_cursor_by(app.half_page() as isize),
        KeyCode::PageUp => app.move_cursor_by(-(app.half_page() as isize)),

        // Selection
        KeyCode::Char(' ') => app.toggle_selection(),
        KeyCode::Char('V') => app.select_all_visible(),
        KeyCode::Esc => app.clear_one_layer(),

        // Edits
        KeyCode::Char('a') => app.begin_add(),
        KeyCode::Char('s') => app.begin_add_subtask(),
        KeyCode::Enter => app.begin_edit(),
        KeyCode::Tab => app.toggle_done(),
        KeyCode::Char('d') => app.request_delete(),
        KeyCode::Char('p') => app.cycle_priority(),

        // Modes
        KeyCode::Char('/') => {
            app.search_restore = app.view.filters.text.clone();
            let text = app.search_restore.clone();
            app.input.set(&text);
            app.mode = Mode::Search;
        }
        KeyCode::Char(':') => {
            app.input.clear();
            app.command_suggestion = 0;
            app.mode = Mode::Command;
        }
        KeyCode::Char('?') => app.show_help = true,
        KeyCode::Char('q') => app.should_quit = true,

        // Selectors
        KeyCode::Char('m') => app.open_project_selector(),
        KeyCode::Char('t') => app.open_tag_selector(),
        KeyCode::Char('b') => app.open_dependency_selector(),
        KeyCode::Char('P') => app.open_parent_selector(),
        KeyCode::Char('M') => app.open_project_filter(),
        KeyCode::Char('T') => app.open_tag_filter(),

        // View
        KeyCode::Char('o') => app.toggle_expand(),
        KeyCode::Char('E') => app.expand_all(),
        KeyCode::Char('C') => app.collapse_all(),
        KeyCode::Char('H') => app.cycle_view_mode(),
        KeyCode::Char('A') => app.toggle_active_all(),
        KeyCode::Char('w') => app.toggle_wrap(),
        KeyCode::Char('r') => app.reload(),
        _ => {}
    }
}
