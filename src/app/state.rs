use super::tree::NavigationState;
use crate::config::{self, CwConfig};
use crate::git::{self, CommitInfo};
use crate::tracking::{self, GitDiffSource, ReasoningGroup};
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use std::time::SystemTime;

/// Startup options that override config
#[derive(Debug, Default)]
pub struct Options {
    pub path: Option<String>,
    pub base: Option<String>,
    pub tracking_dir: Option<PathBuf>,
}

// ── Main App State ──

pub struct App {
    pub repo_root: String,

    /// Short name shown in the top bar
    pub repo_name: String,

    pub current_branch: String,

    /// Base the branch is compared against
    pub base_branch: String,

    /// Base was pinned with --base, never re-detected
    base_pinned: bool,

    pub tracking_dir: PathBuf,

    /// Resolved git dir (differs from `<root>/.git` in worktrees)
    pub git_dir: PathBuf,

    pub config: CwConfig,

    /// Reasoning tree navigation
    pub nav: NavigationState,

    /// Commits under review, tracked or not, newest first
    pub commits: Vec<CommitInfo>,

    /// Commits with a tracking file
    pub tracked_count: usize,

    source: GitDiffSource,

    /// Should the app quit?
    pub should_quit: bool,

    /// Whether watch mode is active
    pub watching: bool,

    /// Last notification message
    pub watch_message: Option<String>,

    /// Ticks since last notification (for auto-clearing)
    pub watch_message_ticks: u8,

    /// Polling fallback snapshot
    last_tracking_mtime: Option<SystemTime>,
    last_head: Option<String>,
}

/// What the polling fallback noticed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollChange {
    Tracking,
    Head,
}

impl App {
    /// Resolve the repository and load the initial tree
    pub fn new(opts: Options) -> Result<Self> {
        let dir = match &opts.path {
            Some(path) => std::fs::canonicalize(path)
                .with_context(|| format!("Path not found: {}", path))?
                .to_string_lossy()
                .to_string(),
            None => ".".to_string(),
        };
        let repo_root = git::get_repo_root_in(&dir)?;
        let config = config::load_config(&repo_root);
        let current_branch = git::get_current_branch_in(&repo_root)?;
        let git_dir = git::git_dir_in(&repo_root)?;

        let base_pinned = opts.base.is_some();
        let base_branch = match opts.base {
            Some(base) => base,
            None => git::detect_base_branch_in(&repo_root)?,
        };
        let tracking_dir = opts
            .tracking_dir
            .unwrap_or_else(|| config.tracking_dir(&repo_root));
        let repo_name = Path::new(&repo_root)
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| repo_root.clone());

        log::info!(
            "Opening {} on {} (vs {}), tracking in {}",
            repo_root,
            current_branch,
            base_branch,
            tracking_dir.display()
        );

        let mut app = App {
            source: GitDiffSource::new(&repo_root),
            repo_root,
            repo_name,
            current_branch,
            base_branch,
            base_pinned,
            tracking_dir,
            git_dir,
            config,
            nav: NavigationState::default(),
            commits: Vec::new(),
            tracked_count: 0,
            should_quit: false,
            watching: false,
            watch_message: None,
            watch_message_ticks: 0,
            last_tracking_mtime: None,
            last_head: None,
        };
        let groups = app.load_groups()?;
        app.nav = NavigationState::new(groups);
        Ok(app)
    }

    // ── Loading ──

    /// Read commits and tracking files, then aggregate
    pub fn load_groups(&mut self) -> Result<Vec<ReasoningGroup>> {
        let history = &self.config.history;
        let commits = git::branch_commits(
            &self.repo_root,
            &self.base_branch,
            &self.current_branch,
            history.max_commits,
            history.first_parent,
        )?;
        let tracked = tracking::tracked_only(tracking::load_tracking(&self.tracking_dir, &commits));
        self.source.retain(&commits);

        self.tracked_count = tracked.len();
        self.last_tracking_mtime = tracking::latest_tracking_mtime(&self.tracking_dir);
        self.last_head = self.read_head();

        let groups = tracking::aggregate_by_reasoning(&tracked, &mut self.source);
        log::debug!(
            "{} groups from {}/{} tracked commits",
            groups.len(),
            self.tracked_count,
            commits.len()
        );
        self.commits = commits;
        Ok(groups)
    }

    /// Reload after tracking files changed, keeping the tree state
    pub fn reload(&mut self) -> Result<()> {
        let groups = self.load_groups()?;
        self.nav.rebuild(groups);
        Ok(())
    }

    /// Reload after HEAD moved. A new branch starts from a fresh tree.
    pub fn reload_branch(&mut self) -> Result<()> {
        let branch = git::get_current_branch_in(&self.repo_root)?;
        if branch == self.current_branch {
            return self.reload();
        }

        log::info!("Branch changed: {} -> {}", self.current_branch, branch);
        self.current_branch = branch;
        if !self.base_pinned {
            self.base_branch = git::detect_base_branch_in(&self.repo_root)?;
        }
        let groups = self.load_groups()?;
        self.nav.reset(groups);
        Ok(())
    }

    // ── Polling Fallback ──

    fn read_head(&self) -> Option<String> {
        std::fs::read_to_string(self.git_dir.join("HEAD")).ok()
    }

    /// Compare tracking mtimes and HEAD against the last load
    pub fn poll_changes(&self) -> Option<PollChange> {
        if self.read_head() != self.last_head {
            return Some(PollChange::Head);
        }
        if tracking::latest_tracking_mtime(&self.tracking_dir) != self.last_tracking_mtime {
            return Some(PollChange::Tracking);
        }
        None
    }

    // ── Hidden Context ──

    /// Show or hide the hidden lines around the selected file's hunks
    pub fn toggle_context(&mut self) {
        let gaps = self.nav.selected_gaps();
        if gaps.is_empty() {
            self.notify("No hidden context here");
            return;
        }
        if gaps.iter().all(|key| self.nav.has_context(key)) {
            self.nav.clear_context(&gaps);
            return;
        }

        self.nav.expand_selected_file();
        let mut failed = 0usize;
        for key in gaps {
            if self.nav.has_context(&key) {
                continue;
            }
            // Gap lines are numbered in the pre-image
            let rev = format!("{}^", key.commit);
            match git::file_lines_at(&self.repo_root, &rev, &key.path, key.start, key.end) {
                Ok(lines) => self.nav.set_context(key, lines),
                Err(e) => {
                    log::warn!("Context for {} {}-{}: {:#}", key.path, key.start, key.end, e);
                    failed += 1;
                }
            }
        }
        if failed > 0 {
            self.notify(&format!(
                "Could not load {} context range{}",
                failed,
                if failed == 1 { "" } else { "s" }
            ));
        }
    }

    // ── Notifications ──

    pub fn notify(&mut self, msg: &str) {
        self.watch_message = Some(msg.to_string());
        self.watch_message_ticks = 0;
    }

    /// Called on every event loop iteration to auto-clear notifications
    pub fn tick(&mut self) {
        if self.watch_message.is_some() {
            self.watch_message_ticks += 1;
            if self.watch_message_ticks > 20 {
                self.watch_message = None;
                self.watch_message_ticks = 0;
            }
        }
    }
}
