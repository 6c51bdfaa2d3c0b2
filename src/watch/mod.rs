use anyhow::{Context, Result};
use notify::{RecommendedWatcher, RecursiveMode};
use notify_debouncer_mini::{new_debouncer, DebouncedEventKind};
use std::path::{Path, PathBuf};
use std::sync::mpsc;
use std::time::Duration;

/// Events emitted by the file watcher
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatchEvent {
    /// A tracking file was written or removed
    TrackingChanged,
    /// HEAD moved to another branch or commit
    BranchChanged,
}

/// A debounced watcher over the tracking directory and the git directory's HEAD
pub struct FileWatcher {
    _watcher: notify_debouncer_mini::Debouncer<RecommendedWatcher>,
}

impl FileWatcher {
    /// Start watching. The tracking directory is created if missing so the
    /// agent's first write is seen. Events are debounced by `debounce_ms`.
    pub fn new(
        tracking_dir: &Path,
        git_dir: &Path,
        debounce_ms: u64,
        tx: mpsc::Sender<WatchEvent>,
    ) -> Result<Self> {
        std::fs::create_dir_all(tracking_dir)
            .with_context(|| format!("Failed to create {}", tracking_dir.display()))?;

        let tracking = tracking_dir.to_path_buf();
        let git = git_dir.to_path_buf();
        let mut debouncer = new_debouncer(
            Duration::from_millis(debounce_ms),
            move |result: std::result::Result<Vec<notify_debouncer_mini::DebouncedEvent>, notify::Error>| {
                let events = match result {
                    Ok(events) => events,
                    Err(e) => {
                        log::warn!("Watcher error: {}", e);
                        return;
                    }
                };
                let paths: Vec<PathBuf> = events
                    .into_iter()
                    .filter(|e| e.kind == DebouncedEventKind::Any)
                    .map(|e| e.path)
                    .collect();
                if let Some(event) = classify(&paths, &tracking, &git) {
                    let _ = tx.send(event);
                }
            },
        )?;

        // HEAD is replaced by rename on checkout, so watch its directory
        debouncer
            .watcher()
            .watch(tracking_dir, RecursiveMode::NonRecursive)?;
        debouncer.watcher().watch(git_dir, RecursiveMode::NonRecursive)?;

        Ok(FileWatcher {
            _watcher: debouncer,
        })
    }
}

/// Reduce a batch of changed paths to the strongest event, if any.
/// A branch switch wins over tracking changes since it reloads everything.
fn classify(paths: &[PathBuf], tracking_dir: &Path, git_dir: &Path) -> Option<WatchEvent> {
    let mut event = None;
    for path in paths {
        let parent = path.parent();
        if parent == Some(git_dir) && path.file_name().is_some_and(|n| n == "HEAD") {
            return Some(WatchEvent::BranchChanged);
        }
        if parent == Some(tracking_dir) && path.extension().is_some_and(|e| e == "json") {
            event = Some(WatchEvent::TrackingChanged);
        }
    }
    event
}
