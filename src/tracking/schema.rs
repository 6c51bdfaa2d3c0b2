use serde::{Deserialize, Serialize};

// ── <sha>.json ──

/// Tracking file written by the agent for one commit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Changeset {
    #[serde(default = "default_version")]
    pub version: u32,
    pub commit: String,
    #[serde(default)]
    pub author: String,
    #[serde(default)]
    pub changes: Vec<Change>,
}

/// One logical change: a reasoning string and the hunks it explains
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Change {
    pub reasoning: String,
    #[serde(default)]
    pub files: Vec<FileChange>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileChange {
    pub path: String,
    /// 1-based hunk numbers into this commit's diff of `path`
    #[serde(default)]
    pub hunks: Vec<usize>,
}

fn default_version() -> u32 {
    1
}

/// Flattened `(commit, reasoning, path, hunks)` tuple
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrackingRecord<'a> {
    pub commit: &'a str,
    pub reasoning: &'a str,
    pub path: &'a str,
    pub hunk_numbers: &'a [usize],
}

impl Changeset {
    /// All records in file order
    pub fn records(&self) -> impl Iterator<Item = TrackingRecord<'_>> {
        self.changes.iter().flat_map(move |change| {
            change.files.iter().map(move |file| TrackingRecord {
                commit: &self.commit,
                reasoning: &change.reasoning,
                path: &file.path,
                hunk_numbers: &file.hunks,
            })
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_minimal_file() {
        let json = r#"{
            "commit": "abc1234",
            "changes": [
                { "reasoning": "fix typo", "files": [{ "path": "a.txt", "hunks": [1] }] }
            ]
        }"#;
        let cs: Changeset = serde_json::from_str(json).unwrap();
        assert_eq!(cs.version, 1);
        assert_eq!(cs.author, "");
        assert_eq!(cs.changes[0].files[0].hunks, vec![1]);
    }

    #[test]
    fn ignores_unknown_fields() {
        let json = r#"{ "version": 2, "commit": "c", "author": "agent", "extra": true, "changes": [] }"#;
        let cs: Changeset = serde_json::from_str(json).unwrap();
        assert_eq!(cs.version, 2);
        assert_eq!(cs.author, "agent");
    }

    #[test]
    fn missing_commit_is_an_error() {
        assert!(serde_json::from_str::<Changeset>(r#"{ "changes": [] }"#).is_err());
    }

    #[test]
    fn records_flatten_in_order() {
        let cs = Changeset {
            version: 1,
            commit: "c1".into(),
            author: String::new(),
            changes: vec![
                Change {
                    reasoning: "first".into(),
                    files: vec![
                        FileChange { path: "a.rs".into(), hunks: vec![1, 2] },
                        FileChange { path: "b.rs".into(), hunks: vec![3] },
                    ],
                },
                Change {
                    reasoning: "second".into(),
                    files: vec![FileChange { path: "a.rs".into(), hunks: vec![4] }],
                },
            ],
        };
        let records: Vec<_> = cs.records().collect();
        assert_eq!(records.len(), 3);
        assert_eq!(records[0].path, "a.rs");
        assert_eq!(records[0].hunk_numbers, &[1, 2]);
        assert_eq!(records[2].reasoning, "second");
        assert!(records.iter().all(|r| r.commit == "c1"));
    }
}
