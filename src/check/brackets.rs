//! Bracket balancing over the raw script text.
//!
//! This is the only fatal check: when it fails nothing else runs.

use super::{split_lines, CheckOutcome, Diagnostic, DiagnosticCode};

/// An opening bracket still waiting for its partner.
#[derive(Debug, Clone, Copy)]
struct OpenBracket {
    ch: char,
    line: usize,
    column: usize,
}

fn opener_for(close: char) -> Option<char> {
    match close {
        ')' => Some('('),
        ']' => Some('['),
        '}' => Some('{'),
        _ => None,
    }
}

/// Stack-based matching of `()`, `[]` and `{}`, ignoring brackets inside
/// single- or double-quoted strings. Stops at the first problem.
pub fn validate_brackets(code: &str) -> CheckOutcome {
    let mut stack: Vec<OpenBracket> = Vec::new();
    let mut in_double = false;
    let mut in_single = false;

    // String state carries across lines.
    for (line_idx, line) in split_lines(code).into_iter().enumerate() {
        let line_num = line_idx + 1;
        for (col_idx, ch) in line.chars().enumerate() {
            let column = col_idx + 1;

            if ch == '"' && !in_single {
                in_double = !in_double;
            } else if ch == '\'' && !in_double {
                in_single = !in_single;
            }
            if in_double || in_single {
                continue;
            }

            match ch {
                '(' | '[' | '{' => stack.push(OpenBracket {
                    ch,
                    line: line_num,
                    column,
                }),
                ')' | ']' | '}' => {
                    let Some(open) = stack.pop() else {
                        return CheckOutcome::fail(Diagnostic::new(
                            DiagnosticCode::UnmatchedClosing,
                            line_num,
                            format!(
                                "Unmatched closing bracket '{}' at line {}, column {}.",
                                ch, line_num, column
                            ),
                        ));
                    };
                    if opener_for(ch) != Some(open.ch) {
                        return CheckOutcome::fail(Diagnostic::new(
                            DiagnosticCode::MismatchedBracket,
                            line_num,
                            format!(
                                "Mismatched brackets. Expected '{}' but found '{}' at line {}, column {}.",
                                open.ch, ch, line_num, column
                            ),
                        ));
                    }
                }
                _ => {}
            }
        }
    }

    match stack.pop() {
        Some(open) => CheckOutcome::fail(Diagnostic::new(
            DiagnosticCode::UnclosedBracket,
            open.line,
            format!(
                "Unclosed opening bracket '{}' at line {}, column {}.",
                open.ch, open.line, open.column
            ),
        )),
        None => CheckOutcome::pass(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_balanced_brackets() {
        let outcome = validate_brackets("a = (b + c[1])\nf = {x: [1, (2)]}");
        assert!(outcome.ok);
        assert!(outcome.diagnostic.is_none());
    }

    #[test]
    fn test_unclosed_bracket() {
        let outcome = validate_brackets("a = (b + c[1]");
        assert!(!outcome.ok);
        assert_eq!(outcome.code(), Some(DiagnosticCode::UnclosedBracket));
        let d = outcome.diagnostic.unwrap();
        assert_eq!(d.line, 1);
        assert!(d.message.contains("'(' at line 1, column 5"));
    }

    #[test]
    fn test_unclosed_reports_most_recent_opener() {
        let outcome = validate_brackets("a = (\nb = [");
        let d = outcome.diagnostic.unwrap();
        assert_eq!(d.code, DiagnosticCode::UnclosedBracket);
        assert_eq!(d.line, 2);
        assert!(d.message.contains("'['"));
    }

    #[test]
    fn test_unmatched_closing_bracket() {
        let outcome = validate_brackets("a = b + c)");
        assert!(!outcome.ok);
        let d = outcome.diagnostic.unwrap();
        assert_eq!(d.code, DiagnosticCode::UnmatchedClosing);
        assert!(d.message.contains("')' at line 1, column 10"));
    }

    #[test]
    fn test_mismatched_brackets() {
        let outcome = validate_brackets("a = (b + c[1})");
        let d = outcome.diagnostic.unwrap();
        assert_eq!(d.code, DiagnosticCode::MismatchedBracket);
        assert!(d.message.contains("Expected '[' but found '}'"));
        assert!(d.message.contains("column 13"));
    }

    #[test]
    fn test_first_failure_stops_scan() {
        // The mismatch on line 1 wins over the unmatched closer on line 2.
        let outcome = validate_brackets("x = (]\ny = )");
        assert_eq!(outcome.code(), Some(DiagnosticCode::MismatchedBracket));
    }

    #[test]
    fn test_brackets_in_strings_ignored() {
        assert!(validate_brackets(r#"label = "(not a bracket""#).ok);
        assert!(validate_brackets("label = ')]}'").ok);
        assert!(validate_brackets(r#"s = "it's (fine""#).ok);
        assert!(validate_brackets(r#"s = '"[' + "']""#).ok);
    }

    #[test]
    fn test_string_state_spans_lines() {
        assert!(validate_brackets("s = \"open (\nstill string )\" + f(1)").ok);
    }

    #[test]
    fn test_bare_cr_starts_a_new_line() {
        let d = validate_brackets("a = 1\rb = (2\u{2028}c = 3").diagnostic.unwrap();
        assert_eq!(d.code, DiagnosticCode::UnclosedBracket);
        assert_eq!(d.line, 2);
        assert!(d.message.contains("column 5"));
    }

    #[test]
    fn test_columns_count_characters() {
        let outcome = validate_brackets("é = b)");
        assert!(outcome.diagnostic.unwrap().message.contains("column 6"));
    }
}
