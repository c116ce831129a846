use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;

use crate::tui::app::{App, Mode, TextInput};
use crate::util::unicode::display_width;

/// Render the status row (bottom of screen)
pub fn render_status_row(frame: &mut Frame, app: &App, area: Rect) {
    let bg = app.theme.background;
    let width = area.width as usize;

    let (mut spans, hint) = match &app.mode {
        Mode::Normal(None) => match &app.status {
            Some(msg) => {
                let color = if msg.starts_with("Error") {
                    app.theme.red
                } else {
                    app.theme.text
                };
                (
                    vec![Span::styled(
                        format!(" {}", msg),
                        Style::default().fg(color).bg(bg),
                    )],
                    "",
                )
            }
            None => (Vec::new(), "? help  : command  q quit"),
        },
        Mode::Normal(Some(_)) => (
            Vec::new(),
            "type to filter  \u{2191}\u{2193} move  Enter choose  Esc close",
        ),
        Mode::Add => (prompt(app, "Add: ", &app.input), "Enter save  Esc cancel"),
        Mode::AddSubtask { .. } => (
            prompt(app, "Add subtask: ", &app.input),
            "Enter save  Esc cancel",
        ),
        Mode::Edit { .. } => (prompt(app, "Edit: ", &app.input), "Enter save  Esc cancel"),
        Mode::Search => (prompt(app, "/", &app.input), "Enter keep  Esc cancel"),
        Mode::Command => (prompt(app, ":", &app.input), "Tab complete  Enter run"),
        Mode::ConfirmDelete { ids } => {
            let what = if ids.len() == 1 {
                "1 task".to_string()
            } else {
                format!("{} tasks", ids.len())
            };
            (
                vec![Span::styled(
                    format!(" Delete {} (with subtasks)? (y/n)", what),
                    Style::default()
                        .fg(app.theme.red)
                        .bg(bg)
                        .add_modifier(Modifier::BOLD),
                )],
                "",
            )
        }
    };

    // Right-aligned dim hint, when it fits
    let content_width: usize = spans.iter().map(|s| display_width(&s.content)).sum();
    let hint_width = display_width(hint);
    if !hint.is_empty() && content_width + hint_width < width {
        let padding = width - content_width - hint_width;
        spans.push(Span::styled(" ".repeat(padding), Style::default().bg(bg)));
        spans.push(Span::styled(hint, Style::default().fg(app.theme.dim).bg(bg)));
    }

    let paragraph = Paragraph::new(Line::from(spans)).style(Style::default().bg(bg));
    frame.render_widget(paragraph, area);
}

/// `label` then the input with a block cursor at its byte position
fn prompt<'a>(app: &App, label: &str, input: &TextInput) -> Vec<Span<'a>> {
    let bg = app.theme.background;
    let text_style = Style::default().fg(app.theme.text_bright).bg(bg);
    let cursor = input.cursor.min(input.text.len());
    vec![
        Span::styled(
            label.to_string(),
            Style::default().fg(app.theme.highlight).bg(bg),
        ),
        Span::styled(input.text[..cursor].to_string(), text_style),
        Span::styled("\u{258C}", Style::default().fg(app.theme.highlight).bg(bg)), // ▌ cursor
        Span::styled(input.text[cursor..].to_string(), text_style),
    ]
}
