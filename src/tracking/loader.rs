use super::schema::Changeset;
use crate::git::CommitInfo;
use std::path::Path;
use std::time::SystemTime;

/// A commit on the branch paired with its tracking file, if any
#[derive(Debug, Clone)]
pub struct TrackedCommit {
    pub commit: CommitInfo,
    pub tracking: Option<Changeset>,
}

/// Load the tracking file for each commit from `dir`.
///
/// Files are named by short SHA, with the full SHA accepted as a fallback.
/// A missing file means the commit is untracked; a malformed one is logged
/// and treated the same way.
pub fn load_tracking(dir: &Path, commits: &[CommitInfo]) -> Vec<TrackedCommit> {
    commits
        .iter()
        .map(|commit| TrackedCommit {
            commit: commit.clone(),
            tracking: read_changeset(dir, commit),
        })
        .collect()
}

/// Keep only commits that have tracking data
pub fn tracked_only(commits: Vec<TrackedCommit>) -> Vec<TrackedCommit> {
    commits
        .into_iter()
        .filter(|c| c.tracking.is_some())
        .collect()
}

fn read_changeset(dir: &Path, commit: &CommitInfo) -> Option<Changeset> {
    let candidates = [&commit.short_sha, &commit.sha];
    let (path, content) = candidates.iter().find_map(|name| {
        let path = dir.join(format!("{}.json", name));
        std::fs::read_to_string(&path).ok().map(|c| (path, c))
    })?;

    match serde_json::from_str::<Changeset>(&content) {
        Ok(changeset) => {
            log::debug!(
                "Loaded {} (v{}, {} changes, by {})",
                path.display(),
                changeset.version,
                changeset.changes.len(),
                if changeset.author.is_empty() { "unknown" } else { &changeset.author }
            );
            Some(changeset)
        }
        Err(e) => {
            log::warn!("Failed to parse {}: {}", path.display(), e);
            None
        }
    }
}

/// Get the mtime of the most recently modified tracking file
pub fn latest_tracking_mtime(dir: &Path) -> Option<SystemTime> {
    let pattern = dir.join("*.json");
    glob::glob(&pattern.to_string_lossy())
        .ok()?
        .filter_map(|entry| entry.ok())
        .filter_map(|path| std::fs::metadata(&path).ok()?.modified().ok())
        .max()
}
