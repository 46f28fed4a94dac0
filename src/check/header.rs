//! Script header checks: version marker and declaration call.

use lazy_static::lazy_static;
use regex::Regex;

use super::{split_lines, CheckOutcome, Diagnostic, DiagnosticCode, SourceLine};

/// Marker that must open every script.
pub const VERSION_MARKER: &str = "//@version=5";

/// Legacy declaration name replaced by `indicator()` in v5.
const LEGACY_DECLARATION: &str = "study(";

lazy_static! {
    /// A leading string literal as first positional argument: `indicator("X"`.
    static ref POSITIONAL_TITLE: Regex = Regex::new(r#"^\s*\w+\s*\(\s*["']"#).unwrap();
}

/// The kind of script a declaration call introduces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeclarationKind {
    Indicator,
    Strategy,
    Library,
}

impl DeclarationKind {
    pub const ALL: &'static [DeclarationKind] = &[
        DeclarationKind::Indicator,
        DeclarationKind::Strategy,
        DeclarationKind::Library,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            DeclarationKind::Indicator => "indicator",
            DeclarationKind::Strategy => "strategy",
            DeclarationKind::Library => "library",
        }
    }

    /// Detect a declaration call at the start of a stripped line.
    pub fn of_line(line: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|kind| {
            line.strip_prefix(kind.name())
                .is_some_and(|rest| rest.starts_with('('))
        })
    }
}

/// Check that the first meaningful raw line carries the version marker.
///
/// Blank lines and lines that open or close a block comment may precede it.
pub fn validate_version(code: &str, lines: &[SourceLine]) -> CheckOutcome {
    if lines.is_empty() {
        return CheckOutcome::fail(Diagnostic::new(
            DiagnosticCode::EmptyScript,
            0,
            "Code is empty or only contains comments.",
        ));
    }

    let first = split_lines(code).into_iter().enumerate().find_map(|(i, raw)| {
        let trimmed = raw.trim();
        let meaningful =
            !trimmed.is_empty() && !trimmed.starts_with("/*") && !trimmed.ends_with("*/");
        meaningful.then_some((i + 1, trimmed))
    });

    match first {
        Some((_, text)) if text.starts_with(VERSION_MARKER) => CheckOutcome::pass(),
        other => {
            let line = other.map(|(n, _)| n).unwrap_or(1);
            CheckOutcome::fail(Diagnostic::new(
                DiagnosticCode::VersionNotFirst,
                line,
                format!("The script must start with `{}`.", VERSION_MARKER),
            ))
        }
    }
}

/// Check that exactly one declaration exists and carries its required
/// parameters.
///
/// Returns at most one diagnostic. A missing title is reported before a
/// missing `overlay`/`format`, so both never surface together.
pub fn validate_declaration(lines: &[SourceLine]) -> CheckOutcome {
    let declarations: Vec<(&SourceLine, DeclarationKind)> = lines
        .iter()
        .filter_map(|l| DeclarationKind::of_line(&l.text).map(|kind| (l, kind)))
        .collect();

    let (line, kind) = match declarations.as_slice() {
        [] => {
            if let Some(legacy) = lines.iter().find(|l| l.text.starts_with(LEGACY_DECLARATION)) {
                return CheckOutcome::fail(Diagnostic::new(
                    DiagnosticCode::DeprecatedFunction,
                    legacy.number,
                    "The function `study()` is deprecated. Use `indicator()` or `strategy()` instead.",
                ));
            }
            return CheckOutcome::fail(Diagnostic::new(
                DiagnosticCode::MissingDeclaration,
                0,
                "Missing script declaration. Use `indicator()`, `strategy()`, or `library()`.",
            ));
        }
        [single] => *single,
        many => {
            let numbers: Vec<String> = many.iter().map(|(l, _)| l.number.to_string()).collect();
            return CheckOutcome::fail(Diagnostic::new(
                DiagnosticCode::MultipleDeclarations,
                0,
                format!(
                    "Multiple script declarations found on lines [{}].",
                    numbers.join(", ")
                ),
            ));
        }
    };

    let text = line.text.as_str();
    let has_title = text.contains("title=") || POSITIONAL_TITLE.is_match(text);
    if !has_title {
        return CheckOutcome::fail(Diagnostic::new(
            DiagnosticCode::MissingTitle,
            line.number,
            "The script declaration is missing a `title` parameter.",
        ));
    }

    match kind {
        DeclarationKind::Indicator if !text.contains("overlay=") => {
            CheckOutcome::warn(Diagnostic::new(
                DiagnosticCode::MissingOverlay,
                line.number,
                "The `indicator()` declaration is missing the `overlay` parameter.",
            ))
        }
        DeclarationKind::Library if !text.contains("format=") => {
            CheckOutcome::fail(Diagnostic::new(
                DiagnosticCode::MissingLibraryFormat,
                line.number,
                "The `library()` declaration is missing the `format` parameter.",
            ))
        }
        _ => CheckOutcome::pass(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::check::strip_comments;

    fn version(code: &str) -> CheckOutcome {
        validate_version(code, &strip_comments(code))
    }

    fn declaration(code: &str) -> CheckOutcome {
        validate_declaration(&strip_comments(code))
    }

    #[test]
    fn test_valid_version() {
        assert!(version("//@version=5\nfoo()").ok);
    }

    #[test]
    fn test_missing_version() {
        let outcome = version("indicator('Test', overlay=true)");
        assert!(!outcome.ok);
        assert_eq!(outcome.code(), Some(DiagnosticCode::VersionNotFirst));
    }

    #[test]
    fn test_leading_whitespace_allowed() {
        assert!(version("\n   \n//@version=5\nindicator('Test', overlay=true)").ok);
    }

    #[test]
    fn test_code_before_version() {
        let outcome = version("foo()\n//@version=5");
        assert!(!outcome.ok);
        let d = outcome.diagnostic.unwrap();
        assert_eq!(d.code, DiagnosticCode::VersionNotFirst);
        assert_eq!(d.line, 1);
    }

    #[test]
    fn test_version_error_cites_offending_line() {
        let d = version("\n\nplot(close)").diagnostic.unwrap();
        assert_eq!(d.line, 3);
    }

    #[test]
    fn test_block_comment_before_version() {
        assert!(version("/* header */\n//@version=5\nplot(close)").ok);
        assert!(version("/*\n*/\n//@version=5\nplot(close)").ok);
    }

    #[test]
    fn test_other_version_rejected() {
        assert!(!version("//@version=4\nstudy('x')").ok);
    }

    #[test]
    fn test_empty_script() {
        let outcome = version("// nothing here\n");
        assert_eq!(outcome.code(), Some(DiagnosticCode::EmptyScript));
        assert_eq!(outcome.diagnostic.unwrap().line, 0);
    }

    #[test]
    fn test_valid_indicator() {
        let outcome = declaration("indicator('Test', overlay=true)");
        assert_eq!(outcome, CheckOutcome::pass());
    }

    #[test]
    fn test_named_title() {
        assert_eq!(
            declaration("strategy(title='S', overlay=true)"),
            CheckOutcome::pass()
        );
    }

    #[test]
    fn test_missing_declaration() {
        let outcome = declaration("a = 1");
        assert!(!outcome.ok);
        assert_eq!(outcome.code(), Some(DiagnosticCode::MissingDeclaration));
    }

    #[test]
    fn test_legacy_study_declaration() {
        let outcome = declaration("a = 1\nstudy('Old', overlay=true)");
        assert!(!outcome.ok);
        let d = outcome.diagnostic.unwrap();
        assert_eq!(d.code, DiagnosticCode::DeprecatedFunction);
        assert_eq!(d.line, 2);
        assert!(d.message.contains("indicator() or strategy()"));
    }

    #[test]
    fn test_multiple_declarations() {
        let outcome = declaration("indicator('a', overlay=true)\nx = 1\nstrategy('b')");
        assert!(!outcome.ok);
        let d = outcome.diagnostic.unwrap();
        assert_eq!(d.code, DiagnosticCode::MultipleDeclarations);
        assert_eq!(d.line, 0);
        assert!(d.message.contains("[1, 3]"));
    }

    #[test]
    fn test_missing_title() {
        let outcome = declaration("indicator(overlay=true)");
        assert!(!outcome.ok);
        assert_eq!(outcome.code(), Some(DiagnosticCode::MissingTitle));
    }

    #[test]
    fn test_missing_overlay_is_warning() {
        let outcome = declaration("indicator('My Script')");
        assert!(outcome.ok);
        assert_eq!(outcome.code(), Some(DiagnosticCode::MissingOverlay));
    }

    #[test]
    fn test_missing_title_wins_over_missing_overlay() {
        let outcome = declaration("indicator(precision=2)");
        assert!(!outcome.ok);
        assert_eq!(outcome.code(), Some(DiagnosticCode::MissingTitle));
    }

    #[test]
    fn test_library_missing_format_is_error() {
        let outcome = declaration("library('Lib')");
        assert!(!outcome.ok);
        assert_eq!(outcome.code(), Some(DiagnosticCode::MissingLibraryFormat));

        assert_eq!(
            declaration("library('Lib', format=format.price)"),
            CheckOutcome::pass()
        );
    }

    #[test]
    fn test_strategy_needs_no_overlay() {
        assert_eq!(declaration("strategy('S')"), CheckOutcome::pass());
    }

    #[test]
    fn test_declaration_kind_requires_call() {
        assert_eq!(
            DeclarationKind::of_line("indicator(\"x\")"),
            Some(DeclarationKind::Indicator)
        );
        assert_eq!(DeclarationKind::of_line("indicator_value = 1"), None);
        assert_eq!(DeclarationKind::of_line("x = indicator(\"x\")"), None);
    }
}
