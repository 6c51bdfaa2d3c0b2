use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};

use super::styles;
use crate::app::{App, Row};

/// Compute the display width of a list of spans
fn spans_width(spans: &[Span]) -> usize {
    spans.iter().map(|s| s.content.chars().count()).sum()
}

/// Render the top status bar
///
///   repo · branch (vs base)                3 changes · 2/5 commits tracked
pub fn render_top_bar(f: &mut Frame, area: Rect, app: &App) {
    let left = vec![
        Span::styled(
            format!(" {}", app.repo_name),
            Style::default()
                .fg(styles::CYAN)
                .add_modifier(Modifier::BOLD),
        ),
        Span::styled(" · ", Style::default().fg(styles::BORDER)),
        Span::styled(app.current_branch.clone(), Style::default().fg(styles::GREEN)),
        Span::styled(
            format!(" (vs {})", app.base_branch),
            Style::default().fg(styles::DIM),
        ),
    ];

    let groups = app.nav.groups().len();
    let mut right = vec![
        Span::styled(
            format!("{} change{}", groups, if groups == 1 { "" } else { "s" }),
            Style::default().fg(styles::BRIGHT),
        ),
        Span::styled(
            format!(
                " · {}/{} commits tracked",
                app.tracked_count,
                app.commits.len()
            ),
            Style::default().fg(styles::MUTED),
        ),
    ];
    if app.watching {
        right.push(Span::styled(" · ", Style::default().fg(styles::BORDER)));
        right.push(Span::styled("watching", Style::default().fg(styles::GREEN)));
    }
    right.push(Span::raw(" "));

    let pad = (area.width as usize).saturating_sub(spans_width(&left) + spans_width(&right));
    let mut spans = left;
    spans.push(Span::raw(" ".repeat(pad)));
    spans.extend(right);

    f.render_widget(Paragraph::new(Line::from(spans)).style(styles::panel_style()), area);
}

/// Render the bottom key-hint bar. Hints follow the selected row kind.
pub fn render_bottom_bar(f: &mut Frame, area: Rect, app: &App) {
    let mut hints: Vec<(&str, &str)> = vec![("j/k", "move")];
    if let Some(row) = app.nav.selected_row() {
        hints.push(("⏎", if row.is_expanded() { "collapse" } else { "expand" }));
        if matches!(row, Row::File { .. }) {
            hints.push(("c", "context"));
        }
    }
    hints.extend([("g/G", "top/bottom"), ("r", "reload"), ("q", "quit")]);

    let mut spans = vec![Span::raw(" ")];
    for (key, label) in hints {
        spans.push(Span::styled(key, styles::key_hint_style()));
        spans.push(Span::styled(format!(" {}  ", label), styles::dim_style()));
    }

    f.render_widget(Paragraph::new(Line::from(spans)).style(styles::panel_style()), area);
}

/// Transient notification in the top-right corner
pub fn render_watch_notification(f: &mut Frame, area: Rect, message: &str) {
    let notif_width = message.chars().count() as u16 + 4;
    let notif_x = area.x + area.width.saturating_sub(notif_width + 2);
    let notif_y = area.y + 1;

    let notif_area = Rect {
        x: notif_x,
        y: notif_y.min(area.bottom().saturating_sub(1)),
        width: notif_width.min(area.width),
        height: 1,
    };

    let notif = Paragraph::new(Line::from(vec![
        Span::styled(" ● ", Style::default().fg(styles::GREEN)),
        Span::styled(message.to_string(), Style::default().fg(styles::TEXT)),
        Span::raw(" "),
    ]))
    .style(Style::default().bg(styles::PANEL).fg(styles::TEXT));

    f.render_widget(notif, notif_area);
}
