use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, Paragraph};

use crate::tui::app::{App, Selector, SelectorEntry, SelectorKind};
use crate::util::unicode::{display_width, truncate_to_width};

/// Maximum number of visible entries in the popup
const MAX_VISIBLE: usize = 10;

/// Render a selector as a bordered popup centered over the list.
pub fn render_selector(frame: &mut Frame, app: &App, selector: &Selector, list_area: Rect) {
    let bg = app.theme.background;
    let entries = selector.entries();
    let count = entries.len().clamp(1, MAX_VISIBLE);

    let widest = entries
        .iter()
        .map(|e| match e {
            SelectorEntry::Sentinel(label) => display_width(label),
            SelectorEntry::Item(item) => display_width(&item.label),
        })
        .max()
        .unwrap_or(0)
        .max(display_width(selector.title()));
    // prefix (3) + check (4) + label + padding
    let popup_w = ((widest + 10) as u16)
        .clamp(24, list_area.width.saturating_sub(4).max(24))
        .min(list_area.width);
    // +2 for borders, +1 for the query line
    let popup_h = ((count + 3) as u16).min(list_area.height);
    let x = list_area.x + list_area.width.saturating_sub(popup_w) / 2;
    let y = list_area.y + list_area.height.saturating_sub(popup_h) / 2;
    let popup_area = Rect::new(x, y, popup_w, popup_h);
    let inner_w = popup_w.saturating_sub(2) as usize;

    let mut lines: Vec<Line> = Vec::new();
    lines.push(Line::from(vec![
        Span::styled(
            format!(" > {}", selector.query),
            Style::default().fg(app.theme.text_bright).bg(bg),
        ),
        Span::styled("\u{258C}", Style::default().fg(app.theme.highlight).bg(bg)),
    ]));

    if entries.is_empty() {
        lines.push(Line::from(Span::styled(
            "   no matches",
            Style::default().fg(app.theme.dim).bg(bg),
        )));
    }

    // Scroll window around the cursor
    let scroll_start = if selector.cursor >= MAX_VISIBLE {
        selector.cursor - MAX_VISIBLE + 1
    } else {
        0
    };

    for (i, entry) in entries.iter().enumerate().skip(scroll_start).take(MAX_VISIBLE) {
        let is_selected = i == selector.cursor;
        let row_bg = if is_selected {
            app.theme.selection_bg
        } else {
            bg
        };
        let prefix = if is_selected { " \u{25B8} " } else { "   " };
        let mut spans = vec![Span::styled(
            prefix,
            Style::default().fg(app.theme.highlight).bg(row_bg),
        )];

        match entry {
            SelectorEntry::Sentinel(label) => {
                spans.push(Span::styled(
                    truncate_to_width(label, inner_w.saturating_sub(3)),
                    Style::default()
                        .fg(app.theme.dim)
                        .bg(row_bg)
                        .add_modifier(Modifier::ITALIC),
                ));
            }
            SelectorEntry::Item(item) => {
                let checked = app.selector_checked(selector, item);
                let check = match selector.kind {
                    SelectorKind::Tag | SelectorKind::Dependency | SelectorKind::TagFilter => {
                        if checked { "[x] " } else { "[ ] " }
                    }
                    _ => {
                        if checked { "\u{25CF} " } else { "  " }
                    }
                };
                spans.push(Span::styled(
                    check,
                    Style::default().fg(app.theme.green).bg(row_bg),
                ));
                let fg = item
                    .color
                    .as_deref()
                    .map_or(app.theme.text, |c| app.theme.entity_color(c));
                let mut style = Style::default().fg(fg).bg(row_bg);
                if is_selected {
                    style = style.add_modifier(Modifier::BOLD);
                }
                let room = inner_w.saturating_sub(3 + display_width(check));
                spans.push(Span::styled(truncate_to_width(&item.label, room), style));
            }
        }

        let used: usize = spans.iter().map(|s| display_width(&s.content)).sum();
        spans.push(Span::styled(
            " ".repeat(inner_w.saturating_sub(used)),
            Style::default().bg(row_bg),
        ));
        lines.push(Line::from(spans));
    }

    frame.render_widget(Clear, popup_area);

    let block = Block::default()
        .borders(Borders::ALL)
        .title(Span::styled(
            format!(" {} ", selector.title()),
            Style::default()
                .fg(app.theme.text_bright)
                .bg(bg)
                .add_modifier(Modifier::BOLD),
        ))
        .border_style(Style::default().fg(app.theme.dim).bg(bg))
        .style(Style::default().bg(bg));

    frame.render_widget(
        Paragraph::new(lines).block(block).style(Style::default().bg(bg)),
        popup_area,
    );
}
