use ratatui::Frame;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, Paragraph};

use crate::tui::app::App;
use crate::tui::command_actions::{COMMANDS, CommandCategory};

const KEY_SECTIONS: &[(&str, &[(&str, &str)])] = &[
    (
        "Navigation",
        &[
            (" \u{2191}\u{2193}/jk", "Move cursor up/down"),
            (" g/G", "Jump to top/bottom"),
            (" PgUp/PgDn", "Move half a page"),
            (" o", "Expand / collapse subtasks"),
            (" E / C", "Expand / collapse all"),
        ],
    ),
    (
        "Tasks",
        &[
            (" a", "Add task"),
            (" s", "Add subtask"),
            (" Enter", "Edit title"),
            (" Tab", "Toggle done"),
            (" p", "Cycle priority"),
            (" d", "Delete"),
            (" m", "Move to project"),
            (" t", "Toggle tags"),
            (" b", "Toggle blockers"),
            (" P", "Choose parent"),
        ],
    ),
    (
        "Selection",
        &[
            (" Space", "Select / deselect"),
            (" V", "Select all visible"),
            (" Esc", "Clear selection, then filters"),
        ],
    ),
    (
        "View",
        &[
            (" /", "Search"),
            (" M", "Filter by project"),
            (" T", "Filter by tags"),
            (" H", "Cycle view mode"),
            (" A", "Active / all"),
            (" w", "Toggle wrapping"),
            (" r", "Reload"),
        ],
    ),
    (
        "Global",
        &[
            (" :", "Command line"),
            (" Ctrl+Z / Ctrl+Y", "Undo / redo"),
            (" ?", "Toggle this help"),
            (" q", "Quit"),
        ],
    ),
];

fn category_label(category: CommandCategory) -> &'static str {
    match category {
        CommandCategory::Edit => "Commands: edit",
        CommandCategory::Organize => "Commands: organize",
        CommandCategory::Filter => "Commands: filter",
        CommandCategory::Time => "Commands: time",
        CommandCategory::System => "Commands: system",
    }
}

/// Render the help overlay (toggled with ?)
pub fn render_help_overlay(frame: &mut Frame, app: &App, area: Rect) {
    // Center the overlay, leaving some margin
    let overlay_area = centered_rect(60, 80, area);

    // Clear the area behind the overlay
    frame.render_widget(Clear, overlay_area);

    let bg = app.theme.background;
    let key_style = Style::default()
        .fg(app.theme.highlight)
        .bg(bg)
        .add_modifier(Modifier::BOLD);
    let desc_style = Style::default().fg(app.theme.text).bg(bg);
    let header_style = Style::default()
        .fg(app.theme.text_bright)
        .bg(bg)
        .add_modifier(Modifier::BOLD);

    let mut lines: Vec<Line> = Vec::new();

    lines.push(Line::from(Span::styled(" Key Bindings", header_style)));
    lines.push(Line::from(""));

    for (title, bindings) in KEY_SECTIONS {
        lines.push(Line::from(Span::styled(format!(" {}", title), header_style)));
        for (key, desc) in *bindings {
            add_binding(&mut lines, key, desc, key_style, desc_style);
        }
        lines.push(Line::from(""));
    }

    let mut categories: Vec<CommandCategory> = COMMANDS.iter().map(|c| c.category).collect();
    categories.sort();
    categories.dedup();
    for category in categories {
        lines.push(Line::from(Span::styled(
            format!(" {}", category_label(category)),
            header_style,
        )));
        for def in COMMANDS.iter().filter(|c| c.category == category) {
            lines.push(Line::from(vec![
                Span::styled(format!(" {:<28}", def.usage), key_style),
                Span::styled(def.description, desc_style),
            ]));
        }
        lines.push(Line::from(""));
    }

    // Keep the last page in view when scrolled past the end
    let inner_height = overlay_area.height.saturating_sub(2) as usize;
    let max_scroll = lines.len().saturating_sub(inner_height);
    let scroll = app.help_scroll.min(max_scroll);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(app.theme.dim).bg(bg))
        .style(Style::default().bg(bg));

    let paragraph = Paragraph::new(lines)
        .block(block)
        .style(Style::default().bg(bg))
        .scroll((scroll as u16, 0));

    frame.render_widget(paragraph, overlay_area);
}

fn add_binding<'a>(
    lines: &mut Vec<Line<'a>>,
    key: &'a str,
    desc: &'a str,
    key_style: Style,
    desc_style: Style,
) {
    let key_width = 16;
    let padded_key = format!("{:<width$}", key, width = key_width);
    lines.push(Line::from(vec![
        Span::styled(padded_key, key_style),
        Span::styled(desc, desc_style),
    ]));
}

/// Create a centered rectangle of the given percentage of the parent
pub(super) fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(area);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}
