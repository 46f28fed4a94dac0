//! Comment stripping.
//!
//! Produces the normalized line list every checker after the bracket gate
//! consumes. Line numbers always refer to the original text.

use lazy_static::lazy_static;
use regex::{Captures, Regex};

use super::SourceLine;

lazy_static! {
    /// Non-nested block comment, ending at the first `*/`.
    static ref BLOCK_COMMENT: Regex = Regex::new(r"(?s)/\*.*?\*/").unwrap();
}

/// Characters that end a physical line. `\r\n` counts as one boundary.
const LINE_BREAKS: &[char] = &[
    '\n', '\r', '\x0b', '\x0c', '\x1c', '\x1d', '\x1e', '\u{85}', '\u{2028}', '\u{2029}',
];

/// Split `code` into physical lines.
///
/// Breaks on `\n`, `\r\n`, a bare `\r`, form feeds, vertical tabs, the
/// ASCII separators and the Unicode line/paragraph separators. A trailing
/// boundary does not start an extra empty line.
pub fn split_lines(code: &str) -> Vec<&str> {
    let mut lines = Vec::new();
    let mut start = 0;
    let mut chars = code.char_indices().peekable();

    while let Some((idx, ch)) = chars.next() {
        if !LINE_BREAKS.contains(&ch) {
            continue;
        }
        lines.push(&code[start..idx]);
        start = idx + ch.len_utf8();
        if ch == '\r' {
            if let Some(&(next, '\n')) = chars.peek() {
                chars.next();
                start = next + 1;
            }
        }
    }
    if start < code.len() {
        lines.push(&code[start..]);
    }

    lines
}

/// Remove block and line comments, returning the non-empty trimmed lines.
///
/// `//` inside a string literal is still treated as a comment start.
pub fn strip_comments(code: &str) -> Vec<SourceLine> {
    // Keep the newlines a block comment spanned so numbering is preserved.
    let without_blocks = BLOCK_COMMENT.replace_all(code, |caps: &Captures| {
        "\n".repeat(split_lines(&caps[0]).len().saturating_sub(1))
    });

    split_lines(&without_blocks)
        .into_iter()
        .enumerate()
        .filter_map(|(i, line)| {
            let code_part = match line.find("//") {
                Some(idx) => &line[..idx],
                None => line,
            };
            let trimmed = code_part.trim();
            if trimmed.is_empty() {
                None
            } else {
                Some(SourceLine::new(i + 1, trimmed))
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn texts(lines: &[SourceLine]) -> Vec<(usize, &str)> {
        lines.iter().map(|l| (l.number, l.text.as_str())).collect()
    }

    #[test]
    fn test_line_comments_removed() {
        let lines = strip_comments("a = 1 // set a\n// whole line\nb = 2");
        assert_eq!(texts(&lines), vec![(1, "a = 1"), (3, "b = 2")]);
    }

    #[test]
    fn test_version_marker_is_a_comment() {
        let lines = strip_comments("//@version=5\nindicator(\"X\")");
        assert_eq!(texts(&lines), vec![(2, "indicator(\"X\")")]);
    }

    #[test]
    fn test_block_comment_keeps_original_numbering() {
        let code = "/* header\n   spans\n   lines */\nplot(close)\nx = 1 /* inline */ + 2";
        let lines = strip_comments(code);
        assert_eq!(texts(&lines), vec![(4, "plot(close)"), (5, "x = 1  + 2")]);
    }

    #[test]
    fn test_every_line_boundary_counts() {
        let lines = strip_comments("//@version=5\rindicator('X')\u{2028}plot(close)\r\n\x0cx = 1");
        assert_eq!(
            texts(&lines),
            vec![(2, "indicator('X')"), (3, "plot(close)"), (5, "x = 1")]
        );
    }

    #[test]
    fn test_block_comment_with_bare_cr_keeps_numbering() {
        let lines = strip_comments("/* a\rb */\rplot(close)");
        assert_eq!(texts(&lines), vec![(3, "plot(close)")]);
    }

    #[test]
    fn test_split_lines() {
        assert_eq!(split_lines("a\r\nb\rc\nd"), vec!["a", "b", "c", "d"]);
        assert_eq!(split_lines("a\u{85}b\u{2029}c"), vec!["a", "b", "c"]);
        assert_eq!(split_lines("a\n"), vec!["a"]);
        assert_eq!(split_lines("\n"), vec![""]);
        assert_eq!(split_lines("a\n\nb"), vec!["a", "", "b"]);
        assert!(split_lines("").is_empty());
    }

    #[test]
    fn test_block_comment_stops_at_first_close() {
        let lines = strip_comments("/* a */ b = 1 /* c */");
        assert_eq!(texts(&lines), vec![(1, "b = 1")]);
    }

    #[test]
    fn test_blank_and_whitespace_lines_dropped() {
        let lines = strip_comments("\n   \n\tfoo()\n\n");
        assert_eq!(texts(&lines), vec![(3, "foo()")]);
    }

    #[test]
    fn test_slashes_in_strings_are_not_protected() {
        let lines = strip_comments("s = \"http://x\"");
        assert_eq!(texts(&lines), vec![(1, "s = \"http:")]);
    }

    #[test]
    fn test_empty_input() {
        assert!(strip_comments("").is_empty());
        assert!(strip_comments("// only\n/* block */").is_empty());
    }
}
