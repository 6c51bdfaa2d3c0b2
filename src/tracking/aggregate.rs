use super::loader::TrackedCommit;
use super::schema::TrackingRecord;
use crate::git::{git_show_commit, split_commit_diff, CommitInfo, FileDiff, Hunk};
use anyhow::Result;
use std::cmp::Reverse;
use std::collections::HashMap;

// ── Groups ──

/// A hunk together with the commit whose diff it was parsed from
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitHunk {
    pub commit: String,
    pub hunk: Hunk,
}

/// The hunks of one file that belong to a logical change
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileHunks {
    pub path: String,
    pub hunks: Vec<CommitHunk>,
    /// Resolved hunk numbers, parallel to `hunks`
    pub hunk_numbers: Vec<usize>,
}

impl FileHunks {
    fn contains(&self, commit: &str, index: usize) -> bool {
        self.hunks
            .iter()
            .any(|h| h.commit == commit && h.hunk.index == index)
    }

    fn push(&mut self, hunk: CommitHunk) {
        if self.contains(&hunk.commit, hunk.hunk.index) {
            return;
        }
        self.hunk_numbers.push(hunk.hunk.index);
        self.hunks.push(hunk);
    }

    /// Commits contributing to this file, in first-seen order
    pub fn commits(&self) -> Vec<&str> {
        let mut seen: Vec<&str> = Vec::new();
        for h in &self.hunks {
            if !seen.contains(&h.commit.as_str()) {
                seen.push(&h.commit);
            }
        }
        seen
    }
}

/// One logical change and every file/hunk that contributes to it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReasoningGroup {
    pub reasoning: String,
    pub files: Vec<FileHunks>,
}

impl ReasoningGroup {
    pub fn file_count(&self) -> usize {
        self.files.len()
    }

    pub fn hunk_count(&self) -> usize {
        self.files.iter().map(|f| f.hunks.len()).sum()
    }

    pub fn file(&self, path: &str) -> Option<&FileHunks> {
        self.files.iter().find(|f| f.path == path)
    }
}

// ── Aggregation ──

/// Incremental builder for reasoning groups.
///
/// Groups are keyed by exact reasoning text and kept in first-seen order
/// until `finish` sorts them.
#[derive(Debug, Default)]
pub struct Aggregator {
    groups: Vec<ReasoningGroup>,
    index: HashMap<String, usize>,
}

impl Aggregator {
    pub fn new() -> Self {
        Self::default()
    }

    fn group_mut(&mut self, reasoning: &str) -> &mut ReasoningGroup {
        let idx = match self.index.get(reasoning) {
            Some(&idx) => idx,
            None => {
                self.groups.push(ReasoningGroup {
                    reasoning: reasoning.to_string(),
                    files: Vec::new(),
                });
                self.index.insert(reasoning.to_string(), self.groups.len() - 1);
                self.groups.len() - 1
            }
        };
        &mut self.groups[idx]
    }

    fn add_hunks(&mut self, reasoning: &str, path: &str, hunks: Vec<CommitHunk>) {
        let group = self.group_mut(reasoning);
        if hunks.is_empty() {
            return;
        }
        let pos = match group.files.iter().position(|f| f.path == path) {
            Some(pos) => pos,
            None => {
                group.files.push(FileHunks {
                    path: path.to_string(),
                    hunks: Vec::new(),
                    hunk_numbers: Vec::new(),
                });
                group.files.len() - 1
            }
        };
        let entry = &mut group.files[pos];
        for hunk in hunks {
            entry.push(hunk);
        }
    }

    /// Fold one tracking record in, resolving its hunk numbers against the
    /// parsed hunks of that commit's file. Unknown numbers are dropped.
    pub fn fold(&mut self, record: &TrackingRecord<'_>, file_hunks: &[Hunk]) {
        let resolved: Vec<CommitHunk> = record
            .hunk_numbers
            .iter()
            .filter_map(|&n| file_hunks.iter().find(|h| h.index == n))
            .map(|hunk| CommitHunk {
                commit: record.commit.to_string(),
                hunk: hunk.clone(),
            })
            .collect();
        self.add_hunks(record.reasoning, record.path, resolved);
    }

    /// Merge another partial aggregation into this one
    pub fn merge(&mut self, other: Aggregator) {
        for group in other.groups {
            self.group_mut(&group.reasoning);
            for file in group.files {
                self.add_hunks(&group.reasoning, &file.path, file.hunks);
            }
        }
    }

    /// Drop groups with no files and sort by descending file count.
    /// The sort is stable so ties keep first-seen order.
    pub fn finish(self) -> Vec<ReasoningGroup> {
        let mut groups: Vec<ReasoningGroup> = self
            .groups
            .into_iter()
            .filter(|g| !g.files.is_empty())
            .collect();
        groups.sort_by_key(|g| Reverse(g.file_count()));
        groups
    }
}

// ── Diff Source ──

/// Supplies the parsed per-file diffs of a commit
pub trait DiffSource {
    fn commit_diffs(&mut self, commit: &str) -> Result<Vec<FileDiff>>;
}

/// Reads commit diffs from the local repository.
///
/// Commits are immutable, so parsed diffs are cached by SHA across reloads.
pub struct GitDiffSource {
    repo_root: String,
    cache: HashMap<String, Vec<FileDiff>>,
}

impl GitDiffSource {
    pub fn new(repo_root: &str) -> Self {
        Self {
            repo_root: repo_root.to_string(),
            cache: HashMap::new(),
        }
    }

    /// Drop cached diffs of commits no longer under review
    pub fn retain(&mut self, commits: &[CommitInfo]) {
        self.cache
            .retain(|sha, _| commits.iter().any(|c| &c.sha == sha));
    }
}

impl DiffSource for GitDiffSource {
    fn commit_diffs(&mut self, commit: &str) -> Result<Vec<FileDiff>> {
        if let Some(diffs) = self.cache.get(commit) {
            return Ok(diffs.clone());
        }
        log::debug!("Fetching diff for {}", commit);
        let raw = git_show_commit(&self.repo_root, commit)?;
        let diffs = split_commit_diff(&raw);
        self.cache.insert(commit.to_string(), diffs.clone());
        Ok(diffs)
    }
}

/// Group the tracked hunks of `commits` by reasoning text.
///
/// Each commit is folded on its own and merged into the total. Its diff is
/// fetched at most once; a commit whose diff cannot be fetched contributes
/// nothing.
pub fn aggregate_by_reasoning<S: DiffSource>(
    commits: &[TrackedCommit],
    source: &mut S,
) -> Vec<ReasoningGroup> {
    let mut total = Aggregator::new();
    let mut fetched: HashMap<&str, Vec<FileDiff>> = HashMap::new();

    for tracked in commits {
        let Some(changeset) = &tracked.tracking else {
            continue;
        };
        let sha = tracked.commit.sha.as_str();
        let diffs = fetched
            .entry(sha)
            .or_insert_with(|| match source.commit_diffs(sha) {
                Ok(diffs) => diffs,
                Err(e) => {
                    log::warn!("Skipping {}: {:#}", tracked.commit.short_sha, e);
                    Vec::new()
                }
            });

        let mut agg = Aggregator::new();
        for record in changeset.records() {
            // Tracking files may carry a short SHA; key hunks by the full one
            let record = TrackingRecord { commit: sha, ..record };
            let hunks = diffs
                .iter()
                .find(|f| f.path == record.path)
                .map(|f| f.hunks.as_slice())
                .unwrap_or(&[]);
            agg.fold(&record, hunks);
        }
        total.merge(agg);
    }

    total.finish()
}
