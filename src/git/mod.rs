mod diff;
mod gaps;
mod repo;

pub use diff::{split_commit_diff, DiffLine, FileDiff, Hunk, LineType};
pub use gaps::{compute_gaps, Gap};
pub use repo::{
    branch_commits, detect_base_branch_in, file_lines_at, get_current_branch_in,
    get_repo_root_in, git_dir_in, git_show_commit, CommitInfo,
};
