use thiserror::Error;

/// Errors from parsing a single file's patch body
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("malformed hunk header on line {line}: {text}")]
    MalformedHeader { line: usize, text: String },
    #[error(
        "hunk {hunk} is truncated: expected -{expected_old} +{expected_new} lines, saw -{seen_old} +{seen_new}"
    )]
    Truncated {
        hunk: usize,
        expected_old: usize,
        seen_old: usize,
        expected_new: usize,
        seen_new: usize,
    },
    #[error("hunk {hunk} has content past its declared length on line {line}: {text}")]
    Overflow { hunk: usize, line: usize, text: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineType {
    Context,
    Added,
    Removed,
}

/// A single line in a diff hunk
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiffLine {
    pub kind: LineType,
    pub text: String,
    pub old_line_number: Option<usize>,
    pub new_line_number: Option<usize>,
}

impl DiffLine {
    pub fn marker(&self) -> char {
        match self.kind {
            LineType::Added => '+',
            LineType::Removed => '-',
            LineType::Context => ' ',
        }
    }
}

/// A diff hunk with header and lines
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Hunk {
    /// 1-based position among the file's hunks, in order of appearance
    pub index: usize,
    /// The `@@ ... @@` line exactly as it appeared
    pub header: String,
    pub old_start: usize,
    pub old_lines: usize,
    pub new_start: usize,
    pub new_lines: usize,
    pub lines: Vec<DiffLine>,
}

impl Hunk {
    /// Format this hunk back into unified-diff text
    pub fn to_text(&self) -> String {
        let mut text = String::new();
        text.push_str(&self.header);
        text.push('\n');
        for line in &self.lines {
            text.push(line.marker());
            text.push_str(&line.text);
            text.push('\n');
        }
        text
    }

    pub fn additions(&self) -> usize {
        self.lines.iter().filter(|l| l.kind == LineType::Added).count()
    }

    pub fn deletions(&self) -> usize {
        self.lines.iter().filter(|l| l.kind == LineType::Removed).count()
    }

    fn old_seen(&self) -> usize {
        self.lines.iter().filter(|l| l.kind != LineType::Added).count()
    }

    fn new_seen(&self) -> usize {
        self.lines.iter().filter(|l| l.kind != LineType::Removed).count()
    }
}

/// One file's hunks as produced by a single commit
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileDiff {
    pub path: String,
    pub hunks: Vec<Hunk>,
}

/// Parse one file's patch body (no `---`/`+++` header lines) into hunks.
///
/// A patch without any `@@` header yields an empty list. Lines before the
/// first header are ignored, as are `\ No newline at end of file` markers.
/// Header counts decide where a hunk ends, so `+++`/`---` lines inside a
/// hunk are content. Once both counts are met only blank lines and markers
/// may follow; any other content line is an `Overflow` error.
pub fn parse_hunks(patch: &str) -> Result<Vec<Hunk>, ParseError> {
    let mut hunks: Vec<Hunk> = Vec::new();
    let mut current: Option<Hunk> = None;
    let mut old_line: usize = 0;
    let mut new_line: usize = 0;

    for (line_idx, line) in patch.lines().enumerate() {
        if line.starts_with("@@") {
            if let Some(hunk) = current.take() {
                hunks.push(finalize(hunk)?);
            }
            let mut hunk = parse_hunk_header(line).ok_or_else(|| ParseError::MalformedHeader {
                line: line_idx + 1,
                text: line.to_string(),
            })?;
            hunk.index = hunks.len() + 1;
            old_line = hunk.old_start;
            new_line = hunk.new_start;
            current = Some(hunk);
            continue;
        }

        let Some(hunk) = current.as_mut() else {
            continue;
        };
        if old_line - hunk.old_start >= hunk.old_lines
            && new_line - hunk.new_start >= hunk.new_lines
        {
            if line.starts_with(['+', '-', ' ']) {
                return Err(ParseError::Overflow {
                    hunk: hunk.index,
                    line: line_idx + 1,
                    text: line.to_string(),
                });
            }
            continue;
        }

        if let Some(text) = line.strip_prefix('+') {
            hunk.lines.push(DiffLine {
                kind: LineType::Added,
                text: text.to_string(),
                old_line_number: None,
                new_line_number: Some(new_line),
            });
            new_line += 1;
        } else if let Some(text) = line.strip_prefix('-') {
            hunk.lines.push(DiffLine {
                kind: LineType::Removed,
                text: text.to_string(),
                old_line_number: Some(old_line),
                new_line_number: None,
            });
            old_line += 1;
        } else if line.is_empty() || line.starts_with(' ') {
            hunk.lines.push(DiffLine {
                kind: LineType::Context,
                text: line.get(1..).unwrap_or("").to_string(),
                old_line_number: Some(old_line),
                new_line_number: Some(new_line),
            });
            old_line += 1;
            new_line += 1;
        }
        // Skip \ No newline at end of file
    }

    if let Some(hunk) = current {
        hunks.push(finalize(hunk)?);
    }

    Ok(hunks)
}

fn finalize(hunk: Hunk) -> Result<Hunk, ParseError> {
    let (seen_old, seen_new) = (hunk.old_seen(), hunk.new_seen());
    if seen_old != hunk.old_lines || seen_new != hunk.new_lines {
        return Err(ParseError::Truncated {
            hunk: hunk.index,
            expected_old: hunk.old_lines,
            seen_old,
            expected_new: hunk.new_lines,
            seen_new,
        });
    }
    Ok(hunk)
}

/// Parse a hunk header like "@@ -10,4 +10,15 @@ fn foo()".
/// The returned hunk has index 0; the caller assigns it.
fn parse_hunk_header(line: &str) -> Option<Hunk> {
    let after_first = line.strip_prefix("@@ ")?;
    let end_idx = after_first.find(" @@")?;
    let range_str = &after_first[..end_idx];

    let mut parts = range_str.split(' ');
    let old = parts.next()?.strip_prefix('-')?;
    let new = parts.next()?.strip_prefix('+')?;
    if parts.next().is_some() {
        return None;
    }

    let (old_start, old_lines) = parse_range(old)?;
    let (new_start, new_lines) = parse_range(new)?;

    Some(Hunk {
        index: 0,
        header: line.to_string(),
        old_start,
        old_lines,
        new_start,
        new_lines,
        lines: Vec::new(),
    })
}

/// Parse "start,count" or just "start" (count defaults to 1)
fn parse_range(s: &str) -> Option<(usize, usize)> {
    if let Some((start, count)) = s.split_once(',') {
        Some((start.parse().ok()?, count.parse().ok()?))
    } else {
        Some((s.parse().ok()?, 1))
    }
}

/// Split multi-file `git show` output into per-file diffs.
///
/// A file whose body fails to parse is kept with zero hunks so that one bad
/// patch never hides the rest of the commit.
pub fn split_commit_diff(raw: &str) -> Vec<FileDiff> {
    let mut files: Vec<FileDiff> = Vec::new();
    let mut path: Option<String> = None;
    let mut prefixed = true;
    let mut body = String::new();
    let mut in_body = false;

    for line in raw.lines() {
        if let Some(rest) = line.strip_prefix("diff --git ") {
            flush(path.take(), &body, &mut files);
            body.clear();
            in_body = false;
            // Fallback for deletions and binaries, refined by "+++"
            let (old, new) = header_paths(rest);
            prefixed = old.starts_with("a/") && new.starts_with("b/");
            path = Some(strip_side(new, prefixed));
            continue;
        }
        if !in_body {
            if let Some(new_path) = line.strip_prefix("+++ ") {
                if new_path != "/dev/null" {
                    path = Some(strip_side(unquote(new_path), prefixed));
                }
                continue;
            }
            if !line.starts_with("@@") {
                continue;
            }
            in_body = true;
        }
        body.push_str(line);
        body.push('\n');
    }
    flush(path, &body, &mut files);

    files
}

/// The old and new paths of a `diff --git` line, unquoted.
///
/// Unquoted paths may contain spaces, so an unrenamed file is recognised by
/// its two identical halves.
fn header_paths(rest: &str) -> (String, String) {
    if rest.starts_with('"') {
        if let Some((old, tail)) = take_quoted(rest) {
            let tail = tail.strip_prefix(' ').unwrap_or(tail);
            return (old, unquote(tail));
        }
    }
    if rest.ends_with('"') {
        if let Some(pos) = rest.rfind(" \"") {
            return (rest[..pos].to_string(), unquote(&rest[pos + 1..]));
        }
    }

    let half = rest.len() / 2;
    if rest.len() % 2 == 1
        && rest.is_char_boundary(half)
        && rest[half..].starts_with(' ')
        && rest[..half] == rest[half + 1..]
    {
        return (rest[..half].to_string(), rest[..half].to_string());
    }
    let split = rest.rfind(" b/").or_else(|| rest.rfind(' '));
    match split {
        Some(pos) => (rest[..pos].to_string(), rest[pos + 1..].to_string()),
        None => (rest.to_string(), rest.to_string()),
    }
}

fn strip_side(path: String, prefixed: bool) -> String {
    match path.strip_prefix("b/") {
        Some(stripped) if prefixed => stripped.to_string(),
        _ => path,
    }
}

/// Undo git's C-style quoting of a path; unquoted input is returned as is
fn unquote(s: &str) -> String {
    match take_quoted(s) {
        Some((path, "")) => path,
        _ => s.to_string(),
    }
}

/// Read one `"..."` token with C escapes (octal bytes included) and return
/// it with the text after the closing quote.
fn take_quoted(s: &str) -> Option<(String, &str)> {
    let inner = s.strip_prefix('"')?;
    let bytes = inner.as_bytes();
    let mut out: Vec<u8> = Vec::new();
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'"' => return Some((String::from_utf8_lossy(&out).into_owned(), &inner[i + 1..])),
            b'\\' => {
                let esc = *bytes.get(i + 1)?;
                i += 2;
                match esc {
                    b'0'..=b'7' => {
                        let digits = inner.get(i - 1..i + 2)?;
                        out.push(u8::from_str_radix(digits, 8).ok()?);
                        i += 2;
                    }
                    b'a' => out.push(0x07),
                    b'b' => out.push(0x08),
                    b't' => out.push(b'\t'),
                    b'n' => out.push(b'\n'),
                    b'v' => out.push(0x0b),
                    b'f' => out.push(0x0c),
                    b'r' => out.push(b'\r'),
                    other => out.push(other),
                }
            }
            other => {
                out.push(other);
                i += 1;
            }
        }
    }
    None
}

fn flush(path: Option<String>, body: &str, files: &mut Vec<FileDiff>) {
    let Some(path) = path else { return };
    let hunks = match parse_hunks(body) {
        Ok(hunks) => hunks,
        Err(e) => {
            log::warn!("Skipping hunks of {}: {}", path, e);
            Vec::new()
        }
    };
    files.push(FileDiff { path, hunks });
}
