use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use crate::tui::app::{App, Mode};

/// Keys while a selector popup is open. Letters go to the type-to-filter
/// query, so only arrows (and Ctrl-N/Ctrl-P) move the cursor.
pub(super) fn handle_selector(app: &mut App, key: KeyEvent) {
    let Mode::Normal(Some(selector)) = &mut app.mode else {
        return;
    };
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
    match key.code {
        KeyCode::Esc => app.mode = Mode::default(),
        KeyCode::Enter => {
            if let Mode::Normal(Some(selector)) = std::mem::take(&mut app.mode) {
                app.apply_selector(selector);
            }
        }
        KeyCode::Up => selector.move_by(-1),
        KeyCode::Down => selector.move_by(1),
        KeyCode::Char('p') if ctrl => selector.move_by(-1),
        KeyCode::Char('n') if ctrl => selector.move_by(1),
        KeyCode::Backspace => selector.pop_query(),
        KeyCode::Char(c) if !ctrl => {
            selector.push_query(c);
        }
        _ => {}
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
    fn tag_selector_stays_open_and_toggles() {
        let (mut app, store) = app_with_store();
        let task = seed(&store, "Errand", Priority::Medium);
        store.ensure_tag("home").unwrap();
        store.ensure_tag("work").unwrap();
        app.request(Request::Reload);
        pump(&mut app, &store);

        press(&mut app, KeyCode::Char('t'));
        type_str(&mut app, "wo");
        press(&mut app, KeyCode::Enter);
        assert!(app.mode.selector().is_some());
        pump(&mut app, &store);
        assert!(app.find_task(&task.id).unwrap().has_tag("work"));

        // Still open after the reload; toggle it back off
        press(&mut app, KeyCode::Enter);
        pump(&mut app, &store);
        assert!(!app.find_task(&task.id).unwrap().has_tag("work"));

        press(&mut app, KeyCode::Esc);
        assert_eq!(app.mode, Mode::default());
    }

    #[test]
    fn project_selector_moves_and_closes() {
        let (mut app, store) = app_with_store();
        let task = seed(&store, "Report", Priority::Medium);
        store.ensure_project("Work").unwrap();
        app.request(Request::Reload);
        pump(&mut app, &store);

        press(&mut app, KeyCode::Char('m'));
        type_str(&mut app, "work");
        press(&mut app, KeyCode::Enter);
        assert_eq!(app.mode, Mode::default());
        pump(&mut app, &store);
        assert_eq!(
            app.find_task(&task.id).unwrap().project_id.as_deref(),
            Some("work")
        );
    }

    #[test]
    fn empty_match_keeps_selector_open() {
        let (mut app, store) = app_with_store();
        seed(&store, "Report", Priority::Medium);
        app.request(Request::Reload);
        pump(&mut app, &store);

        press(&mut app, KeyCode::Char('m'));
        type_str(&mut app, "zzz");
        press(&mut app, KeyCode::Enter);
        assert!(app.mode.selector().is_some());
        press(&mut app, KeyCode::Backspace);
        assert_eq!(app.mode.selector().unwrap().query, "zz");
    }

    #[test]
    fn tag_filter_selector_filters_list() {
        let (mut app, store) = app_with_store();
        seed(&store, "Plain", Priority::Medium);
        let tagged = seed(&store, "Tagged", Priority::Low);
        let mut with_tag = tagged.clone();
        with_tag.tags = vec![store.ensure_tag("deep").unwrap()];
        store.update_task(&with_tag).unwrap();
        app.request(Request::Reload);
        pump(&mut app, &store);

        press(&mut app, KeyCode::Char('T'));
        type_str(&mut app, "deep");
        press(&mut app, KeyCode::Enter);
        assert_eq!(titles(&app), vec!["Tagged"]);
        assert!(app.mode.selector().is_some());
    }
}
