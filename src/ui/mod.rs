pub mod highlight;
mod status_bar;
mod styles;
mod tree_view;
mod utils;

use crate::app::App;
use crate::tracking::ReasoningGroup;
use highlight::Highlighter;
use ratatui::layout::{Constraint, Direction, Layout};
use ratatui::Frame;
use std::fmt::Write;

const TOP_BAR_HEIGHT: u16 = 1;
const BOTTOM_BAR_HEIGHT: u16 = 1;

/// Rows left for the tree in a terminal of `height` rows
pub fn body_height(height: u16) -> usize {
    height.saturating_sub(TOP_BAR_HEIGHT + BOTTOM_BAR_HEIGHT).max(1) as usize
}

/// Render the entire UI
pub fn draw(f: &mut Frame, app: &App, hl: &Highlighter) {
    let outer = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(TOP_BAR_HEIGHT),
            Constraint::Min(1),
            Constraint::Length(BOTTOM_BAR_HEIGHT),
        ])
        .split(f.area());

    status_bar::render_top_bar(f, outer[0], app);
    tree_view::render(f, outer[1], app, hl);
    status_bar::render_bottom_bar(f, outer[2], app);

    if let Some(ref msg) = app.watch_message {
        status_bar::render_watch_notification(f, f.area(), msg);
    }
}

/// Plain-text rendering of the grouped tree for `--print`.
/// With `patch`, each file is followed by its hunks as unified diff text.
pub fn plain_text(groups: &[ReasoningGroup], patch: bool) -> String {
    let mut out = String::new();
    for group in groups {
        let _ = writeln!(out, "{}", group.reasoning.replace('\n', "\n  "));
        for file in &group.files {
            let numbers: Vec<String> = file.hunk_numbers.iter().map(|n| format!("#{}", n)).collect();
            let commits: Vec<&str> = file
                .commits()
                .into_iter()
                .map(|c| c.get(..7).unwrap_or(c))
                .collect();
            let _ = writeln!(
                out,
                "  {}  {}  ({})",
                file.path,
                numbers.join(" "),
                commits.join(", ")
            );
            if patch {
                for commit_hunk in &file.hunks {
                    for line in commit_hunk.hunk.to_text().lines() {
                        let _ = writeln!(out, "    {}", line);
                    }
                }
            }
        }
        out.push('\n');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::git::{DiffLine, Hunk, LineType};
    use crate::tracking::{CommitHunk, FileHunks};

    fn make_hunk(index: usize) -> Hunk {
        Hunk {
            index,
            header: "@@ -1 +1 @@".into(),
            old_start: 1,
            old_lines: 1,
            new_start: 1,
            new_lines: 1,
            lines: Vec::new(),
        }
    }

    #[test]
    fn body_height_leaves_room_for_bars() {
        assert_eq!(body_height(24), 22);
        assert_eq!(body_height(1), 1);
    }

    #[test]
    fn plain_text_lists_groups_and_files() {
        let groups = vec![ReasoningGroup {
            reasoning: "fix typo".into(),
            files: vec![FileHunks {
                path: "a.txt".into(),
                hunks: vec![
                    CommitHunk {
                        commit: "1234567890".into(),
                        hunk: make_hunk(1),
                    },
                    CommitHunk {
                        commit: "abcdef0000".into(),
                        hunk: make_hunk(3),
                    },
                ],
                hunk_numbers: vec![1, 3],
            }],
        }];
        assert_eq!(
            plain_text(&groups, false),
            "fix typo\n  a.txt  #1 #3  (1234567, abcdef0)\n\n"
        );
    }

    #[test]
    fn plain_text_with_patch_includes_hunk_bodies() {
        let mut hunk = make_hunk(1);
        hunk.lines = vec![
            DiffLine {
                kind: LineType::Removed,
                text: "teh".into(),
                old_line_number: Some(1),
                new_line_number: None,
            },
            DiffLine {
                kind: LineType::Added,
                text: "the".into(),
                old_line_number: None,
                new_line_number: Some(1),
            },
        ];
        let groups = vec![ReasoningGroup {
            reasoning: "fix typo".into(),
            files: vec![FileHunks {
                path: "a.txt".into(),
                hunks: vec![CommitHunk {
                    commit: "1234567890".into(),
                    hunk,
                }],
                hunk_numbers: vec![1],
            }],
        }];
        assert_eq!(
            plain_text(&groups, true),
            "fix typo\n  a.txt  #1  (1234567)\n    @@ -1 +1 @@\n    -teh\n    +the\n\n"
        );
    }

    #[test]
    fn plain_text_empty() {
        assert_eq!(plain_text(&[], true), "");
    }
}
