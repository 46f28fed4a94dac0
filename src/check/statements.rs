//! Statement-level heuristics: reassignment targets and ternaries.

use lazy_static::lazy_static;
use regex::Regex;

use super::{Diagnostic, DiagnosticCode, SourceLine};

lazy_static! {
    /// Everything before the first `:=` that contains no `=`.
    static ref REASSIGNMENT: Regex = Regex::new(r"^\s*([^=]+?)\s*:=").unwrap();
    static ref IDENTIFIER: Regex = Regex::new(r"^[a-zA-Z_][a-zA-Z0-9_]*$").unwrap();
}

/// Flag `:=` reassignments whose target is not a plain identifier.
pub fn validate_assignments(lines: &[SourceLine]) -> Vec<Diagnostic> {
    lines
        .iter()
        .filter_map(|line| {
            let caps = REASSIGNMENT.captures(&line.text)?;
            let target = caps.get(1)?.as_str().trim();
            if IDENTIFIER.is_match(target) {
                return None;
            }
            Some(Diagnostic::new(
                DiagnosticCode::InvalidAssignmentTarget,
                line.number,
                format!(
                    "Invalid assignment target: `{}`. The target of an assignment must be a valid variable name.",
                    target
                ),
            ))
        })
        .collect()
}

/// Warn on lines with a `?` but no `:`.
///
/// Same-line only: a conditional split across lines is reported too.
pub fn validate_ternary(lines: &[SourceLine]) -> Vec<Diagnostic> {
    lines
        .iter()
        .filter(|line| line.text.contains('?') && !line.text.contains(':'))
        .map(|line| {
            Diagnostic::new(
                DiagnosticCode::MalformedTernary,
                line.number,
                "Potential malformed ternary operator: found `?` without a matching `:`. Ensure the structure is `condition ? value_if_true : value_if_false`.",
            )
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::check::strip_comments;

    #[test]
    fn test_valid_assignment() {
        assert!(validate_assignments(&strip_comments("myVar := close")).is_empty());
        assert!(validate_assignments(&strip_comments("  _x1 := 2")).is_empty());
    }

    #[test]
    fn test_plain_declaration_ignored() {
        assert!(validate_assignments(&strip_comments("a = 1\nb == c")).is_empty());
    }

    #[test]
    fn test_invalid_assignment_literal() {
        let errors = validate_assignments(&strip_comments("10 := close"));
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].code, DiagnosticCode::InvalidAssignmentTarget);
        assert!(errors[0].message.contains("`10`"));
    }

    #[test]
    fn test_invalid_assignment_expression() {
        let errors = validate_assignments(&strip_comments("x = 1\n(high - low) := myRange"));
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].line, 2);
        assert!(errors[0].message.contains("`(high - low)`"));
    }

    #[test]
    fn test_history_reference_target_rejected() {
        let errors = validate_assignments(&strip_comments("x[1] := 2"));
        assert_eq!(errors.len(), 1);
    }

    #[test]
    fn test_valid_ternary() {
        assert!(validate_ternary(&strip_comments("c = a > b ? a : b")).is_empty());
    }

    #[test]
    fn test_malformed_ternary() {
        let warnings = validate_ternary(&strip_comments("c = a > b ? a"));
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].code, DiagnosticCode::MalformedTernary);
    }

    #[test]
    fn test_multiline_ternary_is_flagged() {
        let warnings = validate_ternary(&strip_comments("c = a > b ? a\n : b"));
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].line, 1);
    }
}
