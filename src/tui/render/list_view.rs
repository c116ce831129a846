use chrono::{Local, Utc};
use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;
use regex::Regex;

use crate::model::Task;
use crate::tui::app::App;
use crate::util::unicode::{display_width, truncate_to_width, wrap_to_width};

use super::push_highlighted_spans;

/// Below this many title cells the metadata column is dropped
const MIN_TITLE_WIDTH: usize = 12;

/// Per-row facts that don't come from the task itself
struct RowInfo {
    is_subtask: bool,
    is_cursor: bool,
    is_selected: bool,
    is_blocked: bool,
    is_expanded: bool,
}

pub fn render_list_view(frame: &mut Frame, app: &App, area: Rect) {
    let bg = app.theme.background;

    if app.rows.is_empty() {
        let line = if app.view.filters.is_active() {
            let msg = " no matching tasks ";
            let padding = (area.width as usize).saturating_sub(msg.len() + 1);
            let warn_style = Style::default()
                .fg(app.theme.text_bright)
                .bg(Color::Rgb(0x8D, 0x0B, 0x0B))
                .add_modifier(Modifier::BOLD);
            Line::from(vec![
                Span::styled(" ".repeat(padding), Style::default().bg(bg)),
                Span::styled(msg, warn_style),
            ])
        } else {
            Line::from(Span::styled(
                " No tasks. Press a to add one.",
                Style::default().fg(app.theme.dim).bg(bg),
            ))
        };
        frame.render_widget(Paragraph::new(line).style(Style::default().bg(bg)), area);
        return;
    }

    let search_re = app.search_re();
    let height = area.height as usize;
    let width = area.width as usize;
    let mut lines: Vec<Line> = Vec::with_capacity(height);

    for (i, row) in app.rows.iter().enumerate().skip(app.view.scroll_offset) {
        if lines.len() >= height {
            break;
        }
        let Some(task) = app.row_task(row) else {
            continue;
        };
        let info = RowInfo {
            is_subtask: row.is_subtask(),
            is_cursor: i == app.view.cursor,
            is_selected: app.view.selected.contains(&task.id),
            is_blocked: app.blocked.contains(&task.id),
            is_expanded: app.view.expanded.contains(&task.id),
        };
        lines.extend(render_task_lines(
            app,
            task,
            &info,
            width,
            search_re.as_ref(),
        ));
    }
    lines.truncate(height);

    frame.render_widget(Paragraph::new(lines).style(Style::default().bg(bg)), area);
}

/// One task as one line, or several when wrapping is on.
fn render_task_lines<'a>(
    app: &App,
    task: &Task,
    info: &RowInfo,
    width: usize,
    search_re: Option<&Regex>,
) -> Vec<Line<'a>> {
    let theme = &app.theme;
    let row_bg = if info.is_cursor {
        theme.cursor_bg
    } else if info.is_selected {
        theme.selection_bg
    } else {
        theme.background
    };
    let base = Style::default().bg(row_bg);
    let dim = base.fg(theme.dim);

    // Prefix: selection bar, status glyph, indent or expansion marker, priority badge
    let mut prefix: Vec<Span> = Vec::new();
    if info.is_selected {
        prefix.push(Span::styled("\u{258C}", base.fg(theme.highlight)));
    } else {
        prefix.push(Span::styled(" ", base));
    }
    let status_style = if info.is_cursor {
        base.fg(theme.status_color(task.status))
            .add_modifier(Modifier::BOLD)
    } else {
        base.fg(theme.status_color(task.status))
    };
    prefix.push(Span::styled(task.status.glyph(), status_style));
    prefix.push(Span::styled(" ", base));
    if info.is_subtask {
        prefix.push(Span::styled("  \u{2514} ", dim));
    } else if !task.subtasks.is_empty() {
        let marker = if info.is_expanded { "\u{25BC} " } else { "\u{25B6} " };
        prefix.push(Span::styled(marker, dim));
    } else {
        prefix.push(Span::styled("  ", base));
    }
    prefix.push(Span::styled(
        format!("{:<3} ", task.priority.badge()),
        base.fg(theme.priority_color(task.priority)),
    ));
    let prefix_width: usize = prefix.iter().map(|s| display_width(&s.content)).sum();

    let mut meta = meta_spans(app, task, info, base);
    let mut meta_width: usize = meta.iter().map(|s| display_width(&s.content)).sum();
    if width < prefix_width + meta_width + MIN_TITLE_WIDTH {
        meta.clear();
        meta_width = 0;
    }
    let title_room = width.saturating_sub(prefix_width + meta_width).max(1);

    let title_style = if task.is_done() {
        base.fg(theme.dim)
    } else if info.is_cursor {
        base.fg(theme.text_bright).add_modifier(Modifier::BOLD)
    } else {
        base.fg(theme.text)
    };
    let highlight = Style::default()
        .fg(theme.search_match_fg)
        .bg(theme.search_match_bg)
        .add_modifier(Modifier::BOLD);

    let title_lines = if app.view.wrap {
        wrap_to_width(&task.title, title_room)
    } else {
        vec![truncate_to_width(&task.title, title_room)]
    };

    let mut lines = Vec::with_capacity(title_lines.len());
    for (n, text) in title_lines.iter().enumerate() {
        let mut spans: Vec<Span> = if n == 0 {
            std::mem::take(&mut prefix)
        } else {
            vec![Span::styled(" ".repeat(prefix_width), base)]
        };
        push_highlighted_spans(&mut spans, text, title_style, highlight, search_re);

        let used = prefix_width + display_width(text);
        if n == 0 {
            let pad = width.saturating_sub(used + meta_width);
            spans.push(Span::styled(" ".repeat(pad), base));
            spans.append(&mut meta);
        } else {
            spans.push(Span::styled(" ".repeat(width.saturating_sub(used)), base));
        }
        lines.push(Line::from(spans));
    }
    lines
}

/// Right-hand column: subtask progress, project, tags, due date, blocked marker.
fn meta_spans<'a>(app: &App, task: &Task, info: &RowInfo, base: Style) -> Vec<Span<'a>> {
    let theme = &app.theme;
    let mut spans = Vec::new();

    if !task.subtasks.is_empty() {
        let done = task.subtasks.iter().filter(|s| s.is_done()).count();
        spans.push(Span::styled(
            format!(" {}/{}", done, task.subtasks.len()),
            base.fg(theme.dim),
        ));
    }

    // Subtasks share the parent's project; showing it again is noise
    if !info.is_subtask
        && let Some(project) = task.project_id.as_ref().and_then(|id| app.projects.get(id))
        && !project.is_inbox()
    {
        spans.push(Span::styled(
            format!(" #{}", project.name),
            base.fg(theme.entity_color(&project.color)),
        ));
    }

    for tag in &task.tags {
        spans.push(Span::styled(
            format!(" {}", tag.display_name()),
            base.fg(theme.entity_color(&tag.color)),
        ));
    }

    if let Some(due) = task.due_date {
        let now = Utc::now();
        let (text, color) = if task.is_overdue(now) {
            (
                format!(" overdue {}", due.with_timezone(&Local).format("%b %-d")),
                theme.red,
            )
        } else if task.is_due_today(Local::now()) {
            (" due today".to_string(), theme.yellow)
        } else {
            (
                format!(" due {}", due.with_timezone(&Local).format("%b %-d")),
                theme.dim,
            )
        };
        spans.push(Span::styled(text, base.fg(color)));
    }

    if info.is_blocked {
        spans.push(Span::styled(" blocked", base.fg(theme.red)));
    }

    if !spans.is_empty() {
        spans.push(Span::styled(" ", base));
    }
    spans
}

#[cfg(test)]
mod tests {
    use crate::model::Priority;
    use crate::tui::app::test_support::*;
    use crate::tui::render::test_helpers::render_app;
    use crate::tui::worker::Request;

    #[test]
    fn rows_show_badge_title_and_tags() {
        let (mut app, store) = app_with_store();
        let mut task = seed(&store, "Write report", Priority::Urgent);
        task.tags = vec![store.ensure_tag("deep").unwrap()];
        store.update_task(&task).unwrap();
        seed(&store, "Read mail", Priority::Low);
        app.request(Request::Reload);
        pump(&mut app, &store);

        let out = render_app(&mut app);
        let lines: Vec<&str> = out.lines().collect();
        assert!(lines[1].contains("URG Write report"));
        assert!(lines[1].contains("@deep"));
        assert!(lines[2].contains("low Read mail"));
    }

    #[test]
    fn expanded_parent_shows_subtasks_and_progress() {
        let (mut app, store) = app_with_store();
        let parent = seed(&store, "Trip", Priority::Medium);
        seed_subtask(&store, &parent, "Book flight");
        app.request(Request::Reload);
        pump(&mut app, &store);

        let collapsed = render_app(&mut app);
        assert!(collapsed.contains("\u{25B6} med Trip"));
        assert!(collapsed.contains("0/1"));
        assert!(!collapsed.contains("Book flight"));

        app.toggle_expand();
        let expanded = render_app(&mut app);
        assert!(expanded.contains("\u{25BC} med Trip"));
        assert!(expanded.contains("\u{2514} med Book flight"));
    }

    #[test]
    fn blocked_and_project_markers() {
        let (mut app, store) = app_with_store();
        let project = store.ensure_project("Work").unwrap();
        let mut a = seed(&store, "Deploy", Priority::High);
        a.project_id = Some(project.id.clone());
        store.update_task(&a).unwrap();
        let b = seed(&store, "Review", Priority::Low);
        store.add_dependency(&a.id, &b.id).unwrap();
        app.request(Request::Reload);
        pump(&mut app, &store);

        let out = render_app(&mut app);
        let deploy = out.lines().find(|l| l.contains("Deploy")).unwrap();
        assert!(deploy.contains("#Work"));
        assert!(deploy.contains("blocked"));
    }

    #[test]
    fn long_titles_truncate_or_wrap() {
        let (mut app, store) = app_with_store();
        let long = "word ".repeat(30);
        seed(&store, long.trim(), Priority::Medium);
        app.request(Request::Reload);
        pump(&mut app, &store);

        let out = render_app(&mut app);
        assert!(out.lines().nth(1).unwrap().contains('\u{2026}'));

        app.view.wrap = true;
        let out = render_app(&mut app);
        assert!(!out.contains('\u{2026}'));
        assert!(out.lines().nth(2).unwrap().trim_start().starts_with("word"));
    }

    #[test]
    fn empty_states() {
        let (mut app, _store) = app_with_store();
        assert!(render_app(&mut app).contains("No tasks"));
        app.view.filters.text = "zzz".into();
        assert!(render_app(&mut app).contains("no matching tasks"));
    }
}
