use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, Paragraph};

use crate::tui::app::App;
use crate::tui::command_actions;

/// Maximum number of visible entries in the dropdown
const MAX_VISIBLE: usize = 8;

/// Render command suggestions floating just above the status row
pub fn render_suggestions(frame: &mut Frame, app: &App, status_area: Rect) {
    if app.input.text.is_empty() {
        return;
    }
    let matches = command_actions::suggestions(&app.input.text);
    if matches.is_empty() {
        return;
    }

    let bg = app.theme.background;
    let count = matches.len().min(MAX_VISIBLE);
    let selected = app.command_suggestion.min(matches.len() - 1);

    let usage_w = matches.iter().map(|c| c.usage.len()).max().unwrap_or(0);
    let desc_w = matches.iter().map(|c| c.description.len()).max().unwrap_or(0);
    // prefix + usage + gap + description + borders
    let max_width = 3 + usage_w + 2 + desc_w + 3;

    let popup_w = (max_width as u16)
        .min(status_area.width.saturating_sub(2))
        .max(12);
    let popup_h = (count as u16 + 2).min(status_area.y); // +2 for borders
    if popup_h < 3 {
        return;
    }
    let popup_area = Rect::new(
        status_area.x,
        status_area.y - popup_h,
        popup_w,
        popup_h,
    );

    // Scroll window around selected item
    let scroll_start = if selected >= MAX_VISIBLE {
        selected - MAX_VISIBLE + 1
    } else {
        0
    };

    let mut lines: Vec<Line> = Vec::new();
    for (i, def) in matches.iter().enumerate().skip(scroll_start).take(MAX_VISIBLE) {
        let is_selected = i == selected;
        let style = if is_selected {
            Style::default()
                .fg(app.theme.text_bright)
                .bg(app.theme.selection_bg)
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(app.theme.text).bg(bg)
        };
        let desc_bg = if is_selected {
            app.theme.selection_bg
        } else {
            bg
        };

        let prefix = if is_selected { " \u{25B8} " } else { "   " };
        lines.push(Line::from(vec![
            Span::styled(prefix, style),
            Span::styled(format!("{:<width$}  ", def.usage, width = usage_w), style),
            Span::styled(def.description, Style::default().fg(app.theme.dim).bg(desc_bg)),
        ]));
    }

    frame.render_widget(Clear, popup_area);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(app.theme.dim).bg(bg))
        .style(Style::default().bg(bg));

    let paragraph = Paragraph::new(lines)
        .block(block)
        .style(Style::default().bg(bg));
    frame.render_widget(paragraph, popup_area);
}

#[cfg(test)]
mod tests {
    use crate::model::Config;
    use crate::tui::app::{App, Mode};
    use crate::tui::render::test_helpers::render_app;

    #[test]
    fn lists_matching_commands_with_usage() {
        let mut app = App::new(Config::default(), None);
        app.mode = Mode::Command;
        app.input.set("st");
        app.command_suggestion = 1;
        let out = render_app(&mut app);
        assert!(out.contains(":starttime"));
        assert!(out.contains("\u{25B8} :stoptime"));
        assert!(out.contains("Stop timer"));
    }

    #[test]
    fn nothing_once_args_start() {
        let mut app = App::new(Config::default(), None);
        app.mode = Mode::Command;
        app.input.set("due tomorrow");
        let out = render_app(&mut app);
        assert!(!out.contains("Set due date"));
    }
}
