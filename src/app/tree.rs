use crate::git::{compute_gaps, DiffLine, Gap, Hunk};
use crate::tracking::{FileHunks, ReasoningGroup};
use std::collections::{HashMap, HashSet};

// ── Rows ──

/// Stable identity of a selectable row, independent of group ordering
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum RowKey {
    Reasoning(String),
    File { reasoning: String, path: String },
}

/// A row the cursor can land on
#[derive(Debug, Clone, Copy)]
pub enum Row<'a> {
    Reasoning {
        group: &'a ReasoningGroup,
        expanded: bool,
    },
    File {
        group: &'a ReasoningGroup,
        file: &'a FileHunks,
        expanded: bool,
    },
}

impl Row<'_> {
    pub fn key(&self) -> RowKey {
        match self {
            Row::Reasoning { group, .. } => RowKey::Reasoning(group.reasoning.clone()),
            Row::File { group, file, .. } => RowKey::File {
                reasoning: group.reasoning.clone(),
                path: file.path.clone(),
            },
        }
    }

    pub fn is_expanded(&self) -> bool {
        match self {
            Row::Reasoning { expanded, .. } | Row::File { expanded, .. } => *expanded,
        }
    }
}

/// One rendered line of the tree. Only `Selectable` rows take the cursor;
/// the rest exist for drawing and scroll accounting.
#[derive(Debug, Clone, Copy)]
pub enum VisualRow<'a> {
    Selectable { row: Row<'a>, selectable_index: usize },
    /// Separates hunks of different commits within one file
    CommitMarker { commit: &'a str },
    HunkHeader { hunk: &'a Hunk },
    Line { line: &'a DiffLine, path: &'a str },
    Gap { gap: Gap, resolved: bool },
    /// A resolved hidden-context line, numbered in the pre-image
    Context {
        line_number: usize,
        text: &'a str,
        path: &'a str,
    },
}

/// Identifies a gap's text: commit, file and inclusive pre-image range
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct GapKey {
    pub commit: String,
    pub path: String,
    pub start: usize,
    pub end: usize,
}

impl GapKey {
    fn new(commit: &str, path: &str, gap: &Gap) -> Self {
        Self {
            commit: commit.to_string(),
            path: path.to_string(),
            start: gap.old_start_line,
            end: gap.old_end_line,
        }
    }
}

// ── Navigation State ──

/// Selection, expansion and scroll over the reasoning tree.
///
/// Expansion is keyed by reasoning text and file path so it survives
/// reordering when the groups are rebuilt.
#[derive(Debug, Default)]
pub struct NavigationState {
    groups: Vec<ReasoningGroup>,
    expanded_reasoning: HashSet<String>,
    /// reasoning text -> expanded file paths under it
    expanded_files: HashMap<String, HashSet<String>>,
    selected_index: usize,
    scroll_offset: usize,
    viewport_height: usize,
    context: HashMap<GapKey, Vec<String>>,
}

impl NavigationState {
    pub fn new(groups: Vec<ReasoningGroup>) -> Self {
        Self {
            groups,
            viewport_height: 1,
            ..Self::default()
        }
    }

    pub fn groups(&self) -> &[ReasoningGroup] {
        &self.groups
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    pub fn selected_index(&self) -> usize {
        self.selected_index
    }

    pub fn scroll_offset(&self) -> usize {
        self.scroll_offset
    }

    pub fn viewport_height(&self) -> usize {
        self.viewport_height
    }

    pub fn is_reasoning_expanded(&self, reasoning: &str) -> bool {
        self.expanded_reasoning.contains(reasoning)
    }

    pub fn is_file_expanded(&self, reasoning: &str, path: &str) -> bool {
        self.expanded_files
            .get(reasoning)
            .is_some_and(|paths| paths.contains(path))
    }

    // ── Flattening ──

    /// Reasoning rows, plus file rows under expanded reasoning rows
    pub fn flatten_selectable(&self) -> Vec<Row<'_>> {
        let mut rows = Vec::new();
        for group in &self.groups {
            let expanded = self.is_reasoning_expanded(&group.reasoning);
            rows.push(Row::Reasoning { group, expanded });
            if !expanded {
                continue;
            }
            for file in &group.files {
                rows.push(Row::File {
                    group,
                    file,
                    expanded: self.is_file_expanded(&group.reasoning, &file.path),
                });
            }
        }
        rows
    }

    /// Selectable rows with the diff body of every expanded file inlined
    pub fn flatten_visual(&self) -> Vec<VisualRow<'_>> {
        let mut out = Vec::new();
        for (selectable_index, row) in self.flatten_selectable().into_iter().enumerate() {
            out.push(VisualRow::Selectable {
                row,
                selectable_index,
            });
            if let Row::File {
                file,
                expanded: true,
                ..
            } = row
            {
                self.push_file_body(file, &mut out);
            }
        }
        out
    }

    fn push_file_body<'a>(&'a self, file: &'a FileHunks, out: &mut Vec<VisualRow<'a>>) {
        let slices = commit_slices(file);
        let multi_commit = slices.len() > 1;

        for (commit, hunks) in slices {
            if multi_commit {
                out.push(VisualRow::CommitMarker { commit });
            }
            let gaps = compute_gaps(&hunks);
            for (i, &hunk) in hunks.iter().enumerate() {
                for gap in gaps.iter().filter(|g| g.after_hunk.map_or(0, |a| a + 1) == i) {
                    self.push_gap(commit, &file.path, *gap, out);
                }
                out.push(VisualRow::HunkHeader { hunk });
                out.extend(hunk.lines.iter().map(|line| VisualRow::Line {
                    line,
                    path: &file.path,
                }));
            }
        }
    }

    fn push_gap<'a>(&'a self, commit: &'a str, path: &'a str, gap: Gap, out: &mut Vec<VisualRow<'a>>) {
        let lines = self.context.get(&GapKey::new(commit, path, &gap));
        out.push(VisualRow::Gap {
            gap,
            resolved: lines.is_some(),
        });
        if let Some(lines) = lines {
            for (offset, text) in lines.iter().enumerate() {
                out.push(VisualRow::Context {
                    line_number: gap.old_start_line + offset,
                    text,
                    path,
                });
            }
        }
    }

    pub fn selectable_count(&self) -> usize {
        self.flatten_selectable().len()
    }

    pub fn selected_row(&self) -> Option<Row<'_>> {
        self.flatten_selectable().get(self.selected_index).copied()
    }

    fn selected_key(&self) -> Option<RowKey> {
        self.selected_row().map(|row| row.key())
    }

    // ── Movement ──

    /// Move the cursor by `delta` selectable rows, clamped to the ends
    pub fn move_selection(&mut self, delta: isize) {
        let count = self.selectable_count();
        if count == 0 {
            return;
        }
        let target = self.selected_index.saturating_add_signed(delta);
        self.selected_index = target.min(count - 1);
        self.ensure_visible();
    }

    pub fn jump_to_top(&mut self) {
        self.selected_index = 0;
        self.ensure_visible();
    }

    pub fn jump_to_bottom(&mut self) {
        self.selected_index = self.selectable_count().saturating_sub(1);
        self.ensure_visible();
    }

    // ── Expansion ──

    /// Toggle the selected row. Collapsing a reasoning row also collapses
    /// every file under it.
    pub fn toggle_expand(&mut self) {
        match self.selected_key() {
            Some(RowKey::Reasoning(reasoning)) => {
                if self.expanded_reasoning.remove(&reasoning) {
                    self.expanded_files.remove(&reasoning);
                } else {
                    self.expanded_reasoning.insert(reasoning);
                }
            }
            Some(RowKey::File { reasoning, path }) => {
                let paths = self.expanded_files.entry(reasoning.clone()).or_default();
                if !paths.remove(&path) {
                    paths.insert(path);
                }
                if paths.is_empty() {
                    self.expanded_files.remove(&reasoning);
                }
            }
            None => return,
        }
        self.ensure_visible();
    }

    /// Expand the selected file row if it is collapsed
    pub fn expand_selected_file(&mut self) {
        if let Some(RowKey::File { reasoning, path }) = self.selected_key() {
            self.expanded_files.entry(reasoning).or_default().insert(path);
            self.ensure_visible();
        }
    }

    // ── Scrolling ──

    /// Rows moved by a half-page jump, at least one
    pub fn half_page(&self) -> isize {
        (self.viewport_height / 2).max(1) as isize
    }

    pub fn set_viewport_height(&mut self, height: usize) {
        self.viewport_height = height.max(1);
        self.ensure_visible();
    }

    /// Keep the selected row inside the viewport, moving the scroll offset
    /// as little as possible. Also pulls the offset back when the visual
    /// list shrank below it.
    fn ensure_visible(&mut self) {
        let (position, total) = {
            let visual = self.flatten_visual();
            let position = visual.iter().position(|row| {
                matches!(row, VisualRow::Selectable { selectable_index, .. }
                    if *selectable_index == self.selected_index)
            });
            (position.unwrap_or(0), visual.len())
        };
        let height = self.viewport_height.max(1);

        self.scroll_offset = self.scroll_offset.min(total.saturating_sub(height));
        if position < self.scroll_offset {
            self.scroll_offset = position;
        } else if position >= self.scroll_offset + height {
            self.scroll_offset = position + 1 - height;
        }
    }

    fn clamp_selection(&mut self) {
        self.selected_index = self
            .selected_index
            .min(self.selectable_count().saturating_sub(1));
    }

    // ── Rebuild ──

    /// Swap in freshly aggregated groups, keeping expansion and selection
    /// by identity. A selected file that disappeared falls back to its
    /// reasoning row.
    pub fn rebuild(&mut self, groups: Vec<ReasoningGroup>) {
        let previous = self.selected_key();
        self.groups = groups;

        let groups = &self.groups;
        self.expanded_reasoning
            .retain(|r| groups.iter().any(|g| &g.reasoning == r));
        self.expanded_files.retain(|reasoning, paths| {
            let Some(group) = groups.iter().find(|g| &g.reasoning == reasoning) else {
                return false;
            };
            paths.retain(|p| group.file(p).is_some());
            !paths.is_empty()
        });

        if let Some(key) = previous {
            let keys: Vec<RowKey> = self.flatten_selectable().iter().map(Row::key).collect();
            let fallback = match &key {
                RowKey::File { reasoning, .. } => Some(RowKey::Reasoning(reasoning.clone())),
                RowKey::Reasoning(_) => None,
            };
            if let Some(pos) = keys.iter().position(|k| *k == key) {
                self.selected_index = pos;
            } else if let Some(pos) = fallback.and_then(|f| keys.iter().position(|k| *k == f)) {
                self.selected_index = pos;
            }
        }

        self.clamp_selection();
        self.ensure_visible();
    }

    /// Forget all state, e.g. after switching branches
    pub fn reset(&mut self, groups: Vec<ReasoningGroup>) {
        let viewport_height = self.viewport_height;
        *self = Self::new(groups);
        self.viewport_height = viewport_height.max(1);
    }

    // ── Hidden Context ──

    /// Gaps of the selected file row, across every contributing commit
    pub fn selected_gaps(&self) -> Vec<GapKey> {
        let Some(Row::File { file, .. }) = self.selected_row() else {
            return Vec::new();
        };
        commit_slices(file)
            .into_iter()
            .flat_map(|(commit, hunks)| {
                compute_gaps(&hunks)
                    .into_iter()
                    .map(move |gap| GapKey::new(commit, &file.path, &gap))
            })
            .collect()
    }

    pub fn has_context(&self, key: &GapKey) -> bool {
        self.context.contains_key(key)
    }

    pub fn set_context(&mut self, key: GapKey, lines: Vec<String>) {
        self.context.insert(key, lines);
        self.ensure_visible();
    }

    pub fn clear_context(&mut self, keys: &[GapKey]) {
        for key in keys {
            self.context.remove(key);
        }
        self.ensure_visible();
    }
}

/// A file's hunks split per commit (first-seen order), each sorted by index
fn commit_slices(file: &FileHunks) -> Vec<(&str, Vec<&Hunk>)> {
    file.commits()
        .into_iter()
        .map(|commit| {
            let mut hunks: Vec<&Hunk> = file
                .hunks
                .iter()
                .filter(|h| h.commit == commit)
                .map(|h| &h.hunk)
                .collect();
            hunks.sort_by_key(|h| h.index);
            (commit, hunks)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::git::LineType;
    use crate::tracking::CommitHunk;

    /// A hunk of `len` context lines starting at `old_start`
    fn make_hunk(index: usize, old_start: usize, len: usize) -> Hunk {
        Hunk {
            index,
            header: format!("@@ -{},{} +{},{} @@", old_start, len, old_start, len),
            old_start,
            old_lines: len,
            new_start: old_start,
            new_lines: len,
            lines: (0..len)
                .map(|i| DiffLine {
                    kind: LineType::Context,
                    text: format!("line {}", old_start + i),
                    old_line_number: Some(old_start + i),
                    new_line_number: Some(old_start + i),
                })
                .collect(),
        }
    }

    fn make_file(path: &str, hunks: Vec<(&str, Hunk)>) -> FileHunks {
        FileHunks {
            path: path.to_string(),
            hunk_numbers: hunks.iter().map(|(_, h)| h.index).collect(),
            hunks: hunks
                .into_iter()
                .map(|(commit, hunk)| CommitHunk {
                    commit: commit.to_string(),
                    hunk,
                })
                .collect(),
        }
    }

    /// A group whose files each hold one 2-line hunk
    fn make_group(reasoning: &str, paths: &[&str]) -> ReasoningGroup {
        ReasoningGroup {
            reasoning: reasoning.to_string(),
            files: paths
                .iter()
                .map(|p| make_file(p, vec![("c1", make_hunk(1, 1, 2))]))
                .collect(),
        }
    }

    fn expanded_file_count(state: &NavigationState) -> usize {
        state.expanded_files.values().map(HashSet::len).sum()
    }

    fn make_state(groups: Vec<ReasoningGroup>, height: usize) -> NavigationState {
        let mut state = NavigationState::new(groups);
        state.set_viewport_height(height);
        state
    }

    fn selected_key(state: &NavigationState) -> Option<RowKey> {
        state.selected_key()
    }

    fn file_key(reasoning: &str, path: &str) -> RowKey {
        RowKey::File {
            reasoning: reasoning.to_string(),
            path: path.to_string(),
        }
    }

    // ── flatten ──

    #[test]
    fn collapsed_tree_lists_only_reasoning_rows() {
        let state = make_state(vec![make_group("a", &["x.rs"]), make_group("b", &["y.rs"])], 10);
        let rows = state.flatten_selectable();
        assert_eq!(rows.len(), 2);
        assert!(rows.iter().all(|r| matches!(r, Row::Reasoning { .. })));
        assert_eq!(state.flatten_visual().len(), 2);
    }

    #[test]
    fn expanded_reasoning_lists_its_files() {
        let mut state = make_state(vec![make_group("a", &["x.rs", "y.rs"]), make_group("b", &["z.rs"])], 10);
        state.toggle_expand();

        let keys: Vec<RowKey> = state.flatten_selectable().iter().map(Row::key).collect();
        assert_eq!(
            keys,
            vec![
                RowKey::Reasoning("a".into()),
                file_key("a", "x.rs"),
                file_key("a", "y.rs"),
                RowKey::Reasoning("b".into()),
            ]
        );
    }

    #[test]
    fn expanded_file_body_is_visual_only() {
        let mut state = make_state(vec![make_group("a", &["x.rs"])], 10);
        state.toggle_expand();
        state.move_selection(1);
        state.toggle_expand();

        assert_eq!(state.selectable_count(), 2);
        let visual = state.flatten_visual();
        // reasoning, file, hunk header, two lines
        assert_eq!(visual.len(), 5);
        assert!(matches!(visual[2], VisualRow::HunkHeader { .. }));
        assert!(matches!(visual[4], VisualRow::Line { path: "x.rs", .. }));
    }

    #[test]
    fn gaps_render_between_hunks() {
        let file = make_file(
            "x.rs",
            vec![("c1", make_hunk(2, 10, 1)), ("c1", make_hunk(1, 1, 1))],
        );
        let group = ReasoningGroup {
            reasoning: "a".into(),
            files: vec![file],
        };
        let mut state = make_state(vec![group], 20);
        state.toggle_expand();
        state.move_selection(1);
        state.toggle_expand();

        let visual = state.flatten_visual();
        // hunk 1 sorts first; the gap 2..=9 sits between the hunks
        assert!(matches!(visual[2], VisualRow::HunkHeader { hunk } if hunk.index == 1));
        match visual[4] {
            VisualRow::Gap { gap, resolved } => {
                assert_eq!((gap.old_start_line, gap.old_end_line), (2, 9));
                assert!(!resolved);
            }
            other => panic!("expected gap row, got {:?}", other),
        }
        assert!(matches!(visual[5], VisualRow::HunkHeader { hunk } if hunk.index == 2));
    }

    #[test]
    fn file_spanning_commits_gets_markers() {
        let file = make_file(
            "x.rs",
            vec![("c2", make_hunk(1, 1, 1)), ("c1", make_hunk(1, 1, 1))],
        );
        let group = ReasoningGroup {
            reasoning: "a".into(),
            files: vec![file],
        };
        let mut state = make_state(vec![group], 20);
        state.toggle_expand();
        state.move_selection(1);
        state.toggle_expand();

        let markers: Vec<&str> = state
            .flatten_visual()
            .iter()
            .filter_map(|r| match r {
                VisualRow::CommitMarker { commit } => Some(*commit),
                _ => None,
            })
            .collect();
        assert_eq!(markers, vec!["c2", "c1"]);
    }

    // ── move ──

    #[test]
    fn move_clamps_at_both_ends() {
        let mut state = make_state(vec![make_group("a", &[]), make_group("b", &[])], 10);
        state.move_selection(-5);
        assert_eq!(state.selected_index(), 0);
        state.move_selection(10);
        assert_eq!(state.selected_index(), 1);
    }

    #[test]
    fn empty_tree_ignores_everything() {
        let mut state = make_state(Vec::new(), 10);
        state.move_selection(1);
        state.toggle_expand();
        state.jump_to_bottom();
        state.expand_selected_file();
        assert_eq!(state.selected_index(), 0);
        assert_eq!(state.scroll_offset(), 0);
        assert!(state.selected_row().is_none());
        assert!(state.selected_gaps().is_empty());
    }

    // ── toggle ──

    #[test]
    fn collapsing_reasoning_collapses_its_files() {
        let mut state = make_state(vec![make_group("g", &["x.rs", "y.rs"]), make_group("h", &["z.rs"])], 50);
        state.toggle_expand();
        state.move_selection(1);
        state.toggle_expand();
        state.move_selection(1);
        state.toggle_expand();
        assert_eq!(expanded_file_count(&state), 2);

        state.jump_to_top();
        state.toggle_expand();
        assert!(!state.is_reasoning_expanded("g"));
        assert_eq!(expanded_file_count(&state), 0);

        // re-expanding does not resurrect the files
        state.toggle_expand();
        assert!(!state.is_file_expanded("g", "x.rs"));
        assert!(!state.is_file_expanded("g", "y.rs"));
    }

    #[test]
    fn toggling_file_leaves_siblings_and_parent() {
        let mut state = make_state(vec![make_group("g", &["x.rs", "y.rs"])], 50);
        state.toggle_expand();
        state.move_selection(2);
        state.toggle_expand();
        assert!(state.is_file_expanded("g", "y.rs"));
        assert!(!state.is_file_expanded("g", "x.rs"));

        state.toggle_expand();
        assert_eq!(expanded_file_count(&state), 0);
        assert!(state.is_reasoning_expanded("g"));
    }

    // ── scroll ──

    #[test]
    fn scroll_moves_minimally() {
        let groups = (0..10).map(|i| make_group(&format!("g{}", i), &[])).collect();
        let mut state = make_state(groups, 3);

        state.move_selection(3);
        assert_eq!(state.scroll_offset(), 1, "selection lands on bottom edge");
        state.move_selection(-1);
        assert_eq!(state.scroll_offset(), 1, "still visible, no scroll");
        state.move_selection(-2);
        assert_eq!(state.scroll_offset(), 0, "selection lands on top edge");
    }

    #[test]
    fn jump_to_bottom_and_top() {
        let groups = (0..10).map(|i| make_group(&format!("g{}", i), &[])).collect();
        let mut state = make_state(groups, 4);

        state.jump_to_bottom();
        assert_eq!(state.selected_index(), 9);
        assert_eq!(state.scroll_offset(), 6);

        state.jump_to_top();
        assert_eq!(state.selected_index(), 0);
        assert_eq!(state.scroll_offset(), 0);
    }

    #[test]
    fn scroll_accounts_for_diff_rows() {
        let big = ReasoningGroup {
            reasoning: "big".into(),
            files: vec![make_file("x.rs", vec![("c1", make_hunk(1, 1, 20))])],
        };
        let mut state = make_state(vec![big, make_group("next", &[])], 5);
        state.toggle_expand();
        state.move_selection(1);
        state.toggle_expand();

        // reasoning, file, header, 20 lines, then "next" at visual row 23
        state.move_selection(1);
        assert_eq!(state.selected_index(), 2);
        assert_eq!(state.scroll_offset(), 23 + 1 - 5);
    }

    #[test]
    fn shrinking_tree_pulls_scroll_back() {
        let big = |len| ReasoningGroup {
            reasoning: "big".into(),
            files: vec![make_file("x.rs", vec![("c1", make_hunk(1, 1, len))])],
        };
        let mut state = make_state(vec![big(20), make_group("next", &[])], 5);
        state.toggle_expand();
        state.move_selection(1);
        state.toggle_expand();
        state.move_selection(1);
        assert_eq!(state.scroll_offset(), 19);

        // big, file, header, one line, next
        state.rebuild(vec![big(1), make_group("next", &[])]);
        assert_eq!(state.flatten_visual().len(), 5);
        assert_eq!(state.scroll_offset(), 0);
    }

    #[test]
    fn collapse_keeps_selection_visible() {
        let big = ReasoningGroup {
            reasoning: "big".into(),
            files: vec![make_file("x.rs", vec![("c1", make_hunk(1, 1, 20))])],
        };
        let mut state = make_state(vec![big, make_group("next", &[])], 5);
        state.toggle_expand();
        state.move_selection(1);
        state.toggle_expand();
        state.move_selection(1);

        state.jump_to_top();
        state.toggle_expand();
        assert_eq!(state.flatten_visual().len(), 2);
        assert_eq!(state.scroll_offset(), 0);
    }

    #[test]
    fn zero_viewport_is_treated_as_one() {
        let mut state = make_state(vec![make_group("a", &[]), make_group("b", &[])], 0);
        assert_eq!(state.viewport_height(), 1);
        state.move_selection(1);
        assert_eq!(state.scroll_offset(), 1);
    }

    #[test]
    fn half_page_moves_on_one_row_viewport() {
        let groups = vec![make_group("a", &[]), make_group("b", &[])];
        let mut state = make_state(groups, 1);
        assert_eq!(state.half_page(), 1);
        state.move_selection(state.half_page());
        assert_eq!(state.selected_index(), 1);

        state.set_viewport_height(10);
        assert_eq!(state.half_page(), 5);
    }

    // ── rebuild ──

    #[test]
    fn rebuild_keeps_state_by_key_when_order_changes() {
        let mut state = make_state(vec![make_group("a", &["x.rs"]), make_group("b", &["y.rs"])], 50);
        state.move_selection(1);
        state.toggle_expand();
        state.move_selection(1);
        state.toggle_expand();
        assert_eq!(selected_key(&state), Some(file_key("b", "y.rs")));

        // "b" now sorts first
        state.rebuild(vec![make_group("b", &["y.rs", "w.rs"]), make_group("a", &["x.rs"])]);
        assert!(state.is_reasoning_expanded("b"));
        assert!(state.is_file_expanded("b", "y.rs"));
        assert_eq!(selected_key(&state), Some(file_key("b", "y.rs")));
        assert_eq!(state.selected_index(), 1);
    }

    #[test]
    fn rebuild_falls_back_to_parent_row() {
        let mut state = make_state(vec![make_group("a", &[]), make_group("b", &["x.rs", "y.rs"])], 50);
        state.move_selection(1);
        state.toggle_expand();
        state.move_selection(2);
        assert_eq!(selected_key(&state), Some(file_key("b", "y.rs")));

        state.rebuild(vec![make_group("a", &[]), make_group("b", &["x.rs"])]);
        assert_eq!(selected_key(&state), Some(RowKey::Reasoning("b".into())));
    }

    #[test]
    fn rebuild_drops_vanished_keys_and_clamps() {
        let mut state = make_state(vec![make_group("a", &["x.rs"]), make_group("b", &["y.rs"])], 50);
        state.move_selection(1);
        state.toggle_expand();
        state.move_selection(1);
        state.toggle_expand();

        state.rebuild(vec![make_group("c", &[])]);
        assert_eq!(state.selected_index(), 0);
        assert!(!state.is_reasoning_expanded("b"));
        assert_eq!(expanded_file_count(&state), 0);

        state.rebuild(Vec::new());
        assert_eq!(state.selected_index(), 0);
        assert!(state.selected_row().is_none());
    }

    #[test]
    fn reset_clears_expansion_but_keeps_viewport() {
        let mut state = make_state(vec![make_group("a", &["x.rs"])], 7);
        state.toggle_expand();
        state.reset(vec![make_group("a", &["x.rs"])]);
        assert!(!state.is_reasoning_expanded("a"));
        assert_eq!(state.viewport_height(), 7);
    }

    // ── context ──

    #[test]
    fn resolved_context_is_inlined_after_gap() {
        let file = make_file(
            "x.rs",
            vec![("c1", make_hunk(1, 1, 1)), ("c1", make_hunk(2, 5, 1))],
        );
        let group = ReasoningGroup {
            reasoning: "a".into(),
            files: vec![file],
        };
        let mut state = make_state(vec![group], 50);
        state.toggle_expand();
        state.move_selection(1);
        state.expand_selected_file();

        let gaps = state.selected_gaps();
        assert_eq!(
            gaps,
            vec![GapKey {
                commit: "c1".into(),
                path: "x.rs".into(),
                start: 2,
                end: 4,
            }]
        );

        state.set_context(gaps[0].clone(), vec!["two".into(), "three".into(), "four".into()]);
        assert!(state.has_context(&gaps[0]));
        let visual = state.flatten_visual();
        assert!(matches!(visual[4], VisualRow::Gap { resolved: true, .. }));
        assert!(matches!(
            visual[5],
            VisualRow::Context { line_number: 2, text: "two", .. }
        ));
        assert!(matches!(visual[7], VisualRow::Context { line_number: 4, .. }));

        state.clear_context(&gaps);
        assert!(!state.has_context(&gaps[0]));
        assert_eq!(state.flatten_visual().len(), 7);
    }

    #[test]
    fn gaps_only_for_file_rows() {
        let state = make_state(vec![make_group("a", &["x.rs"])], 10);
        assert!(state.selected_gaps().is_empty());
    }
}
