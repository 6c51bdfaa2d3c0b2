use anyhow::{Context, Result};
use std::path::PathBuf;
use std::process::Command;

/// A commit on the branch under review
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitInfo {
    pub sha: String,
    pub short_sha: String,
    pub author: String,
    pub message: String,
}

const FIELD_SEP: char = '\x1f';

// ── Repo Info ──

/// Get the repository root directory for a specific path
pub fn get_repo_root_in(dir: &str) -> Result<String> {
    let output = Command::new("git")
        .args(["rev-parse", "--show-toplevel"])
        .current_dir(dir)
        .output()
        .context(format!("Failed to run git in '{}'", dir))?;

    if !output.status.success() {
        anyhow::bail!("Not a git repository: {}", dir);
    }

    Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
}

/// Get current branch for a specific repo root
pub fn get_current_branch_in(repo_root: &str) -> Result<String> {
    let output = Command::new("git")
        .args(["rev-parse", "--abbrev-ref", "HEAD"])
        .current_dir(repo_root)
        .output()
        .context("Failed to get current branch")?;

    if !output.status.success() {
        anyhow::bail!("Failed to determine current branch");
    }

    Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
}

/// Resolve the git directory (a worktree's `.git` may be a file pointing elsewhere)
pub fn git_dir_in(repo_root: &str) -> Result<PathBuf> {
    let output = Command::new("git")
        .args(["rev-parse", "--absolute-git-dir"])
        .current_dir(repo_root)
        .output()
        .context("Failed to locate git directory")?;

    if !output.status.success() {
        anyhow::bail!("Failed to locate git directory in {}", repo_root);
    }

    Ok(PathBuf::from(String::from_utf8_lossy(&output.stdout).trim()))
}

/// Auto-detect the base branch by checking upstream tracking, then falling
/// back to common names (main, master, develop).
pub fn detect_base_branch_in(repo_root: &str) -> Result<String> {
    // Helper: run a git command and return trimmed stdout on success
    let run = |args: &[&str]| -> Option<String> {
        let out = Command::new("git")
            .args(args)
            .current_dir(repo_root)
            .output()
            .ok()?;
        if out.status.success() {
            Some(String::from_utf8_lossy(&out.stdout).trim().to_string())
        } else {
            None
        }
    };

    let current = run(&["rev-parse", "--abbrev-ref", "HEAD"]).unwrap_or_default();

    // Try upstream tracking branch
    if let Some(upstream) = run(&["rev-parse", "--abbrev-ref", "@{upstream}"]) {
        if let Some(branch) = upstream.split('/').last() {
            if branch != current && !branch.is_empty() {
                if run(&["rev-parse", "--verify", branch]).is_some() {
                    return Ok(branch.to_string());
                }
                if run(&["rev-parse", "--verify", &upstream]).is_some() {
                    return Ok(upstream);
                }
            }
        }
    }

    // Common local branch names
    for candidate in &["main", "master", "develop", "dev"] {
        if *candidate != current && run(&["rev-parse", "--verify", candidate]).is_some() {
            return Ok(candidate.to_string());
        }
    }

    // Remote-tracking branches as last resort
    for candidate in &["origin/main", "origin/master", "origin/develop"] {
        if run(&["rev-parse", "--verify", candidate]).is_some() {
            return Ok(candidate.to_string());
        }
    }

    Ok(current)
}

// ── History ──

/// List the commits under review, newest first.
///
/// On a feature branch this is `base..HEAD`; when HEAD is the base branch
/// itself the latest `max_commits` commits are used instead.
pub fn branch_commits(
    repo_root: &str,
    base: &str,
    current: &str,
    max_commits: usize,
    first_parent: bool,
) -> Result<Vec<CommitInfo>> {
    let log_format = format!("--format=%H{0}%h{0}%an{0}%s", FIELD_SEP);
    let limit = format!("-n{}", max_commits);
    let range = format!("{}..HEAD", base);

    let mut args: Vec<&str> = vec!["log", &log_format];
    if first_parent {
        args.push("--first-parent");
    }
    if base.is_empty() || base == current {
        args.push(&limit);
    } else {
        args.push(&range);
    }

    let output = Command::new("git")
        .args(&args)
        .current_dir(repo_root)
        .output()
        .context("Failed to run git log")?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        // An unborn HEAD has no history yet
        if stderr.contains("does not have any commits") {
            return Ok(Vec::new());
        }
        anyhow::bail!("git log failed: {}", stderr.trim());
    }

    Ok(parse_log(&String::from_utf8_lossy(&output.stdout)))
}

fn parse_log(raw: &str) -> Vec<CommitInfo> {
    raw.lines()
        .filter_map(|line| {
            let mut fields = line.splitn(4, FIELD_SEP);
            let sha = fields.next()?.trim();
            if sha.is_empty() {
                return None;
            }
            Some(CommitInfo {
                sha: sha.to_string(),
                short_sha: fields.next()?.to_string(),
                author: fields.next().unwrap_or("").to_string(),
                message: fields.next().unwrap_or("").to_string(),
            })
        })
        .collect()
}

// ── Diff ──

/// Get the full unified diff introduced by a single commit
pub fn git_show_commit(repo_root: &str, sha: &str) -> Result<String> {
    let output = Command::new("git")
        // Same hunks the tracking agent numbers, with paths in a fixed shape
        .args(["-c", "core.quotePath=false", "show", sha])
        .args(["--format=", "--no-color", "--no-ext-diff"])
        .args(["--src-prefix=a/", "--dst-prefix=b/"])
        .current_dir(repo_root)
        .output()
        .context("Failed to run git show")?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        anyhow::bail!("git show {} failed: {}", sha, stderr.trim());
    }

    Ok(String::from_utf8_lossy(&output.stdout).to_string())
}

/// Read lines `start..=end` (1-based) of `path` as it was at `rev`
pub fn file_lines_at(
    repo_root: &str,
    rev: &str,
    path: &str,
    start: usize,
    end: usize,
) -> Result<Vec<String>> {
    let object = format!("{}:{}", rev, path);
    let output = Command::new("git")
        .args(["show", &object])
        .current_dir(repo_root)
        .output()
        .context("Failed to run git show")?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        anyhow::bail!("Cannot read {}: {}", object, stderr.trim());
    }

    let content = String::from_utf8_lossy(&output.stdout);
    Ok(slice_lines(&content, start, end))
}

fn slice_lines(content: &str, start: usize, end: usize) -> Vec<String> {
    if start == 0 || end < start {
        return Vec::new();
    }
    content
        .lines()
        .skip(start - 1)
        .take(end + 1 - start)
        .map(str::to_string)
        .collect()
}
