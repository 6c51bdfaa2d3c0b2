/// Truncate to `max_len` chars, ending with … when cut.
/// Counts chars rather than bytes so multi-byte UTF-8 is not split.
pub(crate) fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        return s.to_string();
    }
    if max_len == 0 {
        return String::new();
    }
    let truncated: String = s.chars().take(max_len - 1).collect();
    format!("{}…", truncated)
}

/// Replace tabs with spaces up to the next multiple of `width`
pub(crate) fn expand_tabs(s: &str, width: usize) -> String {
    if !s.contains('\t') || width == 0 {
        return s.to_string();
    }
    let mut out = String::with_capacity(s.len());
    let mut col = 0usize;
    for ch in s.chars() {
        if ch == '\t' {
            let pad = width - col % width;
            out.extend(std::iter::repeat(' ').take(pad));
            col += pad;
        } else {
            out.push(ch);
            col += 1;
        }
    }
    out
}

/// First line of a possibly multi-line reasoning text
pub(crate) fn first_line(s: &str) -> &str {
    s.lines().next().unwrap_or("")
}
