use crossterm::event::{KeyCode, KeyEvent};

use crate::tui::app::{App, Mode};

use super::edit_line;

/// Live search: the text filter follows the input on every keystroke.
pub(super) fn handle_search(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Esc => {
            app.view.filters.text = std::mem::take(&mut app.search_restore);
            app.input.clear();
            app.mode = Mode::default();
            app.refresh_keeping_cursor();
        }
        KeyCode::Enter => {
            app.search_restore.clear();
            app.input.clear();
            app.mode = Mode::default();
        }
        _ => {
            if edit_line(&mut app.input, key) && app.input.text != app.view.filters.text {
                app.view.filters.text = app.input.text.clone();
                app.refresh_keeping_cursor();
            }
        }
    }
}
