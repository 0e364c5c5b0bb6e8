//! Source layout of a top-level mapping.
//!
//! The parsed tree loses everything serde_yaml does not model: comments,
//! quote style, indentation, directives. This pass recovers it from the
//! text by slicing the source at the column-0 key lines, so each key keeps
//! the exact lines it was written with.

#[derive(Debug, Default)]
pub(crate) struct Layout {
    /// Lines above the first key, including directives and `---`.
    pub header: Vec<String>,
    /// Blank and column-0 comment lines directly above each key, in key
    /// order. The first entry is always empty since its block is part of
    /// the header.
    pub leading: Vec<Vec<String>>,
    /// Source lines of each key, from its key line to the end of its value.
    pub bodies: Vec<Vec<String>>,
    /// Lines after the body of the last key.
    pub trailer: Vec<String>,
}

/// Slice `source` at its top-level key lines.
///
/// Returns `None` when the number of key lines found does not match
/// `key_count` (flow-style roots, complex keys, multi-line flow values).
pub(crate) fn scan(source: &str, key_count: usize) -> Option<Layout> {
    let lines: Vec<&str> = source.lines().collect();

    let key_lines: Vec<usize> = lines
        .iter()
        .enumerate()
        .filter(|(_, line)| is_top_level_key(line))
        .map(|(i, _)| i)
        .collect();

    if key_lines.len() != key_count {
        return None;
    }

    let (Some(&first_key), Some(&last_key)) = (key_lines.first(), key_lines.last()) else {
        return Some(Layout::default());
    };

    let leading_len: Vec<usize> = key_lines
        .iter()
        .map(|&line| attached_len(&lines, line))
        .collect();

    let trailer_start = lines.len()
        - lines[last_key + 1..]
            .iter()
            .rev()
            .take_while(|l| is_detached(l) || l.starts_with("..."))
            .count();

    let mut leading = Vec::with_capacity(key_count);
    let mut bodies = Vec::with_capacity(key_count);
    for (i, &start) in key_lines.iter().enumerate() {
        let end = match key_lines.get(i + 1) {
            Some(&next) => next - leading_len[i + 1],
            None => trailer_start,
        };
        bodies.push(owned(&lines[start..end]));

        if i == 0 {
            leading.push(Vec::new());
        } else {
            leading.push(owned(&lines[start - leading_len[i]..start]));
        }
    }

    let header_start = lines[..first_key]
        .iter()
        .take_while(|l| l.trim().is_empty())
        .count();
    let header = owned(&lines[header_start..first_key]);

    let mut trailer = owned(&lines[trailer_start..]);
    while trailer.last().is_some_and(|l| l.trim().is_empty()) {
        trailer.pop();
    }

    Some(Layout {
        header,
        leading,
        bodies,
        trailer,
    })
}

fn owned(lines: &[&str]) -> Vec<String> {
    lines.iter().map(|l| l.to_string()).collect()
}

/// Number of blank and column-0 comment lines directly above `line`.
fn attached_len(lines: &[&str], line: usize) -> usize {
    lines[..line]
        .iter()
        .rev()
        .take_while(|l| is_detached(l))
        .count()
}

fn is_detached(line: &str) -> bool {
    line.trim().is_empty() || line.starts_with('#')
}

fn is_top_level_key(line: &str) -> bool {
    let Some(first) = line.chars().next() else {
        return false;
    };
    if first.is_whitespace() || matches!(first, '#' | '-' | '?' | '{' | '[' | '%' | '.') {
        return false;
    }
    line.contains(':')
}
