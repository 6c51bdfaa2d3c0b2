use ratatui::{
    layout::Rect,
    style::Style,
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};

use super::highlight::Highlighter;
use super::styles;
use super::utils::{expand_tabs, first_line, truncate};
use crate::app::{App, Row, VisualRow};
use crate::config::DisplayConfig;
use crate::git::{CommitInfo, LineType};

const FILE_INDENT: &str = "    ";
const BODY_INDENT: &str = "      ";

/// Render the visible window of the reasoning tree
pub fn render(f: &mut Frame, area: Rect, app: &App, hl: &Highlighter) {
    if app.nav.is_empty() {
        render_empty(f, area, app);
        return;
    }

    let nav = &app.nav;
    let width = area.width as usize;
    let lines: Vec<Line> = nav
        .flatten_visual()
        .iter()
        .skip(nav.scroll_offset())
        .take(area.height as usize)
        .map(|row| {
            let selected = matches!(row, VisualRow::Selectable { selectable_index, .. }
                if *selectable_index == nav.selected_index());
            row_line(row, selected, &app.config.display, &app.commits, hl, width)
        })
        .collect();

    f.render_widget(Paragraph::new(lines).style(styles::default_style()), area);
}

fn render_empty(f: &mut Frame, area: Rect, app: &App) {
    let commit_count = app.commits.len();
    let message = if commit_count == 0 {
        format!("No commits between {} and {}", app.base_branch, app.current_branch)
    } else {
        format!(
            "{} commit{} on this branch, none tracked yet",
            commit_count,
            if commit_count == 1 { "" } else { "s" }
        )
    };
    let lines = vec![
        Line::from(""),
        Line::from(Span::styled(format!("  {}", message), styles::reasoning_style())),
        Line::from(""),
        Line::from(Span::styled(
            format!("  Tracking files are read from {}", app.tracking_dir.display()),
            styles::dim_style(),
        )),
        Line::from(Span::styled(
            "  as <short-sha>.json. The view updates when they appear.",
            styles::dim_style(),
        )),
    ];
    f.render_widget(Paragraph::new(lines).style(styles::default_style()), area);
}

/// Build the terminal line for one visual row
fn row_line(
    row: &VisualRow,
    selected: bool,
    display: &DisplayConfig,
    commits: &[CommitInfo],
    hl: &Highlighter,
    width: usize,
) -> Line<'static> {
    match *row {
        VisualRow::Selectable { row, .. } => selectable_line(row, selected, width),
        VisualRow::CommitMarker { commit } => {
            let info = commits.iter().find(|c| c.sha == commit);
            commit_marker_line(commit, info, width)
        }
        VisualRow::HunkHeader { hunk } => Line::from(vec![
            Span::raw(BODY_INDENT),
            Span::styled(format!("#{} ", hunk.index), styles::dim_style()),
            Span::styled(hunk.header.clone(), styles::hunk_header_style()),
        ]),
        VisualRow::Line { line, path } => {
            let style = match line.kind {
                LineType::Added => styles::add_style(),
                LineType::Removed => styles::del_style(),
                LineType::Context => styles::context_style(),
            };
            let mut spans = vec![Span::raw(BODY_INDENT)];
            if display.line_numbers {
                spans.push(Span::styled(
                    format!(
                        "{} {} ",
                        line_number(line.old_line_number),
                        line_number(line.new_line_number)
                    ),
                    styles::dim_style(),
                ));
            }
            spans.push(Span::styled(line.marker().to_string(), style));
            let text = expand_tabs(&line.text, display.tab_width as usize);
            spans.extend(hl.highlight_line(&text, path, style));
            Line::from(spans)
        }
        VisualRow::Gap { gap, resolved } => {
            let count = gap.line_count();
            let mut spans = vec![
                Span::raw(BODY_INDENT),
                Span::styled(
                    format!(
                        " ⋯ {} hidden line{} ({}-{}) ",
                        count,
                        if count == 1 { "" } else { "s" },
                        gap.old_start_line,
                        gap.old_end_line
                    ),
                    styles::gap_style(),
                ),
            ];
            if !resolved {
                spans.push(Span::styled("  c", styles::key_hint_style()));
                spans.push(Span::styled(" show", styles::dim_style()));
            }
            Line::from(spans)
        }
        VisualRow::Context {
            line_number: n,
            text,
            path,
        } => {
            let mut spans = vec![Span::raw(BODY_INDENT)];
            if display.line_numbers {
                spans.push(Span::styled(
                    format!("{} {} ", line_number(Some(n)), line_number(None)),
                    styles::dim_style(),
                ));
            }
            spans.push(Span::styled(" ", styles::gap_style()));
            let text = expand_tabs(text, display.tab_width as usize);
            spans.extend(hl.highlight_line(&text, path, styles::gap_style()));
            Line::from(spans)
        }
    }
}

/// `── abcdef1 subject · author ──` between the hunks of different commits
fn commit_marker_line(sha: &str, info: Option<&CommitInfo>, width: usize) -> Line<'static> {
    let label = match info {
        Some(info) => {
            let room = width.saturating_sub(BODY_INDENT.len() + 17 + info.author.chars().count());
            format!(
                "{} {} · {}",
                short_sha(sha),
                truncate(first_line(&info.message), room),
                info.author
            )
        }
        None => short_sha(sha).to_string(),
    };
    Line::from(Span::styled(
        format!("{}── {} ──", BODY_INDENT, label),
        styles::commit_marker_style(),
    ))
}

fn selectable_line(row: Row, selected: bool, width: usize) -> Line<'static> {
    let arrow = if row.is_expanded() { "▾" } else { "▸" };
    let base = if selected {
        styles::selected_style()
    } else {
        Style::default()
    };

    match row {
        Row::Reasoning { group, .. } => {
            let stats = format!(
                "  {} file{} · {} hunk{}",
                group.file_count(),
                if group.file_count() == 1 { "" } else { "s" },
                group.hunk_count(),
                if group.hunk_count() == 1 { "" } else { "s" },
            );
            let room = width.saturating_sub(3 + stats.chars().count());
            Line::from(vec![
                Span::styled(format!(" {} ", arrow), base),
                Span::styled(
                    truncate(first_line(&group.reasoning), room),
                    styles::reasoning_style().patch(base),
                ),
                Span::styled(stats, styles::dim_style().patch(base)),
            ])
            .style(base)
        }
        Row::File { file, .. } => {
            let (adds, dels) = file.hunks.iter().fold((0, 0), |(a, d), h| {
                (a + h.hunk.additions(), d + h.hunk.deletions())
            });
            let numbers: Vec<String> = file.hunk_numbers.iter().map(|n| format!("#{}", n)).collect();
            Line::from(vec![
                Span::styled(format!("{}{} ", FILE_INDENT, arrow), base),
                Span::styled(file.path.clone(), styles::file_style().patch(base)),
                Span::styled(format!("  +{}", adds), styles::count_added().patch(base)),
                Span::styled(format!(" -{}", dels), styles::count_deleted().patch(base)),
                Span::styled(format!("  {}", numbers.join(" ")), styles::dim_style().patch(base)),
            ])
            .style(base)
        }
    }
}

fn line_number(n: Option<usize>) -> String {
    n.map(|n| format!("{:>4}", n))
        .unwrap_or_else(|| "    ".to_string())
}

fn short_sha(sha: &str) -> &str {
    sha.get(..7).unwrap_or(sha)
}
