mod aggregate;
mod loader;
mod schema;

pub use aggregate::{aggregate_by_reasoning, FileHunks, GitDiffSource, ReasoningGroup};
pub use loader::{latest_tracking_mtime, load_tracking, tracked_only};

#[cfg(test)]
pub use aggregate::CommitHunk;
