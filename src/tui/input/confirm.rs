use crossterm::event::{KeyCode, KeyEvent};

use crate::tui::app::{App, Mode};

/// Delete confirmation: `y` deletes, `n` or Esc cancels, anything else is ignored.
pub(super) fn handle_confirm(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Char('y') | KeyCode::Char('Y') => {
            if let Mode::ConfirmDelete { ids } = std::mem::take(&mut app.mode) {
                app.delete_tasks(&ids);
            }
        }
        KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => {
            app.mode = Mode::default();
            app.set_status("Delete cancelled");
        }
        _ => {}
    }
}
