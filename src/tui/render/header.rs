use chrono::Utc;
use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;

use crate::model::format_elapsed;
use crate::ops::filter::format_active_filters;
use crate::tui::app::App;
use crate::util::unicode::{display_width, truncate_to_width};

/// Top row: app name, view mode and filter summary on the left, the running
/// timer on the right.
pub fn render_header(frame: &mut Frame, app: &App, area: Rect) {
    let bg = app.theme.background;
    let width = area.width as usize;

    let mut spans = vec![
        Span::styled(
            " tend ",
            Style::default()
                .fg(app.theme.background)
                .bg(app.theme.highlight)
                .add_modifier(Modifier::BOLD),
        ),
        Span::styled(
            format!(" {} ", app.view.view_mode.label()),
            Style::default().fg(app.theme.text_bright).bg(bg),
        ),
    ];

    let count = app.rows.iter().filter(|r| !r.is_subtask()).count();
    spans.push(Span::styled(
        format!("{} ", count),
        Style::default().fg(app.theme.dim).bg(bg),
    ));

    let timer = app.active_timer.as_ref().map(|entry| {
        let title = app
            .find_task(&entry.task_id)
            .map(|t| t.title.as_str())
            .unwrap_or("?");
        format!(
            "\u{23F1} {} {} ",
            truncate_to_width(title, 24),
            format_elapsed(entry.elapsed(Utc::now()))
        )
    });
    let timer_width = timer.as_deref().map_or(0, display_width);

    if let Some(summary) = format_active_filters(&app.view.filters, &app.projects, &app.tags) {
        let used: usize = spans.iter().map(|s| display_width(&s.content)).sum();
        let room = width.saturating_sub(used + timer_width + 1);
        spans.push(Span::styled(
            truncate_to_width(&summary, room),
            Style::default().fg(app.theme.yellow).bg(bg),
        ));
    }

    if let Some(timer) = timer {
        let used: usize = spans.iter().map(|s| display_width(&s.content)).sum();
        if used + timer_width <= width {
            spans.push(Span::styled(
                " ".repeat(width - used - timer_width),
                Style::default().bg(bg),
            ));
            spans.push(Span::styled(
                timer,
                Style::default().fg(app.theme.green).bg(bg),
            ));
        }
    }

    frame.render_widget(
        Paragraph::new(Line::from(spans)).style(Style::default().bg(bg)),
        area,
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Config, TimeEntry};
    use crate::tui::render::test_helpers::{TERM_W, render_to_string};

    #[test]
    fn shows_view_mode_and_filters() {
        let mut app = App::new(Config::default(), None);
        app.view.filters.text = "milk".into();
        let out = render_to_string(TERM_W, 1, |frame, area| render_header(frame, &app, area));
        assert!(out.contains("tend"));
        assert!(out.contains("Active"));
        assert!(out.contains("Filters: Text: milk"));
    }

    #[test]
    fn shows_running_timer() {
        let mut app = App::new(Config::default(), None);
        let now = Utc::now();
        app.active_timer = Some(TimeEntry {
            id: "t".into(),
            task_id: "missing".into(),
            description: None,
            started_at: now - chrono::Duration::seconds(65),
            ended_at: None,
            duration: None,
            created_at: now,
        });
        let out = render_to_string(TERM_W, 1, |frame, area| render_header(frame, &app, area));
        assert!(out.contains("1m0"));
    }
}
