use super::diff::Hunk;
use std::borrow::Borrow;

/// A run of pre-image lines that no hunk shows
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Gap {
    /// Position of the preceding hunk in the slice, or None for the gap
    /// above the first hunk
    pub after_hunk: Option<usize>,
    pub old_start_line: usize,
    pub old_end_line: usize,
}

impl Gap {
    pub fn line_count(&self) -> usize {
        self.old_end_line + 1 - self.old_start_line
    }

    fn between(after_hunk: Option<usize>, start: usize, end: usize) -> Option<Gap> {
        (start >= 1 && start <= end).then_some(Gap {
            after_hunk,
            old_start_line: start,
            old_end_line: end,
        })
    }
}

/// Compute the hidden-context ranges around an ordered list of hunks.
///
/// Hunks must come from one file diff and be in old-line order. The tail
/// after the last hunk is never reported since its length is unknown
/// without the file itself.
pub fn compute_gaps<H: Borrow<Hunk>>(hunks: &[H]) -> Vec<Gap> {
    let mut gaps = Vec::new();

    if let Some(first) = hunks.first() {
        let first: &Hunk = first.borrow();
        if let Some(gap) = Gap::between(None, 1, first.old_start.saturating_sub(1)) {
            gaps.push(gap);
        }
    }

    for (i, pair) in hunks.windows(2).enumerate() {
        let (prev, next): (&Hunk, &Hunk) = (pair[0].borrow(), pair[1].borrow());
        let start = prev.old_start + prev.old_lines;
        let end = next.old_start.saturating_sub(1);
        if let Some(gap) = Gap::between(Some(i), start, end) {
            gaps.push(gap);
        }
    }

    gaps
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn make_hunk(index: usize, old_start: usize, old_lines: usize) -> Hunk {
        Hunk {
            index,
            header: format!("@@ -{},{} +{},{} @@", old_start, old_lines, old_start, old_lines),
            old_start,
            old_lines,
            new_start: old_start,
            new_lines: old_lines,
            lines: Vec::new(),
        }
    }

    #[test]
    fn gap_between_two_hunks() {
        let gaps = compute_gaps(&[make_hunk(1, 1, 1), make_hunk(2, 10, 1)]);
        assert_eq!(
            gaps,
            vec![Gap {
                after_hunk: Some(0),
                old_start_line: 2,
                old_end_line: 9,
            }]
        );
        assert_eq!(gaps[0].line_count(), 8);
    }

    #[test]
    fn gap_before_first_hunk() {
        let gaps = compute_gaps(&[make_hunk(1, 5, 3)]);
        assert_eq!(gaps.len(), 1);
        assert_eq!(gaps[0].after_hunk, None);
        assert_eq!((gaps[0].old_start_line, gaps[0].old_end_line), (1, 4));
    }

    #[test]
    fn contiguous_hunks_have_no_gap() {
        let gaps = compute_gaps(&[make_hunk(1, 1, 4), make_hunk(2, 5, 2)]);
        assert!(gaps.is_empty());
    }

    #[test]
    fn new_file_hunk_has_no_gap() {
        assert!(compute_gaps(&[make_hunk(1, 0, 0)]).is_empty());
    }

    #[test]
    fn empty_hunk_list_has_no_gaps() {
        assert!(compute_gaps::<Hunk>(&[]).is_empty());
    }

    #[test]
    fn pure_insertion_hunk_leaves_anchor_line_in_next_gap() {
        // "@@ -3,0 +4,2 @@" inserts after line 3 without showing it
        let gaps = compute_gaps(&[make_hunk(1, 3, 0), make_hunk(2, 8, 1)]);
        assert_eq!(gaps[0].old_end_line, 2);
        assert_eq!((gaps[1].old_start_line, gaps[1].old_end_line), (3, 7));
    }

    #[test]
    fn gaps_and_hunks_partition_prefix_of_file() {
        let hunks = vec![
            make_hunk(1, 4, 3),
            make_hunk(2, 7, 2),
            make_hunk(3, 15, 5),
            make_hunk(4, 40, 0),
            make_hunk(5, 40, 6),
        ];
        let mut covered: Vec<usize> = Vec::new();
        for h in &hunks {
            covered.extend(h.old_start..h.old_start + h.old_lines);
        }
        for g in compute_gaps(&hunks) {
            covered.extend(g.old_start_line..=g.old_end_line);
        }
        let unique: HashSet<usize> = covered.iter().copied().collect();
        assert_eq!(unique.len(), covered.len(), "ranges overlap");

        let last = hunks.last().unwrap();
        let expected: HashSet<usize> = (1..last.old_start + last.old_lines).collect();
        assert_eq!(unique, expected);
    }
}
