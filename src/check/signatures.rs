//! Call-site validation against the function signature table.
//!
//! Only lines that *start* with a call are inspected. Calls embedded in
//! larger expressions (`x = ta.sma(close)`) are skipped; this is a line
//! heuristic, not a parser.

use lazy_static::lazy_static;
use regex::Regex;

use super::{Diagnostic, DiagnosticCode, SourceLine};
use crate::rules::RuleTable;

lazy_static! {
    /// `name(args)` or `ns.name(args)` anchored at line start; `args` runs to
    /// the last `)` on the line.
    static ref CALL_STATEMENT: Regex =
        Regex::new(r"^([a-zA-Z0-9_]+\.[a-zA-Z0-9_]+|[a-zA-Z0-9_]+)\s*\((.*)\)").unwrap();

    static ref NAKED_INPUT: Regex = Regex::new(r"\binput\s*\(").unwrap();
    static ref TYPED_INPUT: Regex = Regex::new(r"input\.\w+\s*\(").unwrap();
}

/// A call statement recognised at the start of a line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallSite<'a> {
    pub name: &'a str,
    pub arguments: &'a str,
}

/// Match a leading call statement, returning `None` for other line shapes.
pub fn parse_call(line: &str) -> Option<CallSite<'_>> {
    let caps = CALL_STATEMENT.captures(line.trim())?;
    Some(CallSite {
        name: caps.get(1)?.as_str(),
        arguments: caps.get(2)?.as_str(),
    })
}

/// Split an argument list on commas outside nested parentheses.
///
/// Blank input yields no arguments; `f(a,)` yields two.
pub fn split_arguments(arguments: &str) -> Vec<&str> {
    if arguments.trim().is_empty() {
        return Vec::new();
    }

    let mut parts = Vec::new();
    let mut depth: i32 = 0;
    let mut start = 0;
    for (idx, ch) in arguments.char_indices() {
        match ch {
            '(' => depth += 1,
            ')' => depth -= 1,
            ',' if depth == 0 => {
                parts.push(arguments[start..idx].trim());
                start = idx + ch.len_utf8();
            }
            _ => {}
        }
    }
    parts.push(arguments[start..].trim());
    parts
}

/// Validate call statements against `rules` and flag untyped `input()` calls.
///
/// Returns `(errors, warnings)`. No call-site rule currently warns; the
/// warnings list is part of the contract so rules can grow into it.
pub fn validate_syntax(
    lines: &[SourceLine],
    rules: &RuleTable,
) -> (Vec<Diagnostic>, Vec<Diagnostic>) {
    let mut errors = validate_function_calls(lines, rules);
    let warnings = Vec::new();

    for line in lines {
        if NAKED_INPUT.is_match(&line.text) && !TYPED_INPUT.is_match(&line.text) {
            errors.push(Diagnostic::new(
                DiagnosticCode::NakedInput,
                line.number,
                "Naked `input()` is deprecated. Specify a type, e.g., `input.int()`.",
            ));
        }
    }

    (errors, warnings)
}

fn validate_function_calls(lines: &[SourceLine], rules: &RuleTable) -> Vec<Diagnostic> {
    let mut errors = Vec::new();

    for line in lines {
        let Some(call) = parse_call(&line.text) else {
            continue;
        };

        // Left for the bracket balancer.
        if call.arguments.matches('(').count() != call.arguments.matches(')').count() {
            continue;
        }

        let Some(signature) = rules.get(call.name) else {
            continue;
        };

        if signature.deprecated {
            errors.push(Diagnostic::new(
                DiagnosticCode::DeprecatedFunction,
                line.number,
                format!(
                    "Function `{}` is deprecated. Use `{}` instead.",
                    call.name,
                    signature.replacement.as_deref().unwrap_or("a newer function")
                ),
            ));
            continue;
        }

        let provided = split_arguments(call.arguments).len();
        let required = signature.required_count();
        if provided < required {
            errors.push(Diagnostic::new(
                DiagnosticCode::ArgumentCount,
                line.number,
                format!(
                    "Invalid argument count for `{}`. Expected at least {}, but got {}.",
                    call.name, required, provided
                ),
            ));
        }
    }

    errors
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::check::strip_comments;
    use crate::rules::{FunctionSignature, RuleTable};

    fn table() -> RuleTable {
        RuleTable::from_signatures(vec![
            FunctionSignature::new("plot", &["series"]),
            FunctionSignature::new("ta.sma", &["source", "length"]),
            FunctionSignature::new("math.max", &["number0", "number1"]),
            FunctionSignature::deprecated("study", Some("indicator() or strategy()")),
            FunctionSignature::deprecated("security", None),
        ])
    }

    fn check(code: &str) -> (Vec<Diagnostic>, Vec<Diagnostic>) {
        validate_syntax(&strip_comments(code), &table())
    }

    #[test]
    fn test_parse_call_shapes() {
        assert_eq!(
            parse_call("plot(ta.sma(close, 14))"),
            Some(CallSite {
                name: "plot",
                arguments: "ta.sma(close, 14)"
            })
        );
        assert_eq!(parse_call("ta.sma (close)").unwrap().name, "ta.sma");
        assert!(parse_call("x = ta.sma(close, 14)").is_none());
        assert!(parse_call("a.b.c(1)").is_none());
    }

    #[test]
    fn test_split_arguments_respects_nesting() {
        assert_eq!(split_arguments("ta.sma(close, 14), color.red"), vec!["ta.sma(close, 14)", "color.red"]);
        assert_eq!(split_arguments(""), Vec::<&str>::new());
        assert_eq!(split_arguments("   "), Vec::<&str>::new());
        assert_eq!(split_arguments("a,"), vec!["a", ""]);
        assert_eq!(split_arguments("f(g(1, 2), 3)"), vec!["f(g(1, 2), 3)"]);
    }

    #[test]
    fn test_valid_call() {
        let (errors, warnings) = check("plot(close)\nta.sma(close, 14)");
        assert!(errors.is_empty());
        assert!(warnings.is_empty());
    }

    #[test]
    fn test_nested_call_is_one_argument() {
        let (errors, _) = check("plot(ta.sma(close, 14))");
        assert!(errors.is_empty());
    }

    #[test]
    fn test_too_few_arguments() {
        let (errors, _) = check("ta.sma(close)");
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].code, DiagnosticCode::ArgumentCount);
        assert!(errors[0].message.contains("ta.sma"));
        assert!(errors[0].message.contains("Expected at least 2, but got 1"));
    }

    #[test]
    fn test_empty_argument_list() {
        let (errors, _) = check("plot()");
        assert_eq!(errors.len(), 1);
        assert!(errors[0].message.contains("Expected at least 1, but got 0"));
    }

    #[test]
    fn test_deprecated_skips_arity() {
        let (errors, _) = check("study()");
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].code, DiagnosticCode::DeprecatedFunction);
        assert!(errors[0].message.contains("Use `indicator() or strategy()` instead"));
    }

    #[test]
    fn test_deprecated_without_replacement() {
        let (errors, _) = check("security(syminfo.tickerid, \"D\", close)");
        assert!(errors[0].message.contains("a newer function"));
    }

    #[test]
    fn test_unknown_function_passes() {
        let (errors, _) = check("myFunc()\nlabel.new()");
        assert!(errors.is_empty());
    }

    #[test]
    fn test_embedded_call_skipped() {
        let (errors, _) = check("x = ta.sma(close)");
        assert!(errors.is_empty());
    }

    #[test]
    fn test_unbalanced_argument_text_skipped() {
        // Greedy capture stops at the last ')', leaving "close, (14" inside.
        let (errors, _) = check("ta.sma(close, (14)");
        assert!(errors.is_empty());
    }

    #[test]
    fn test_naked_input() {
        let (errors, _) = check("len = input(14)\nsrc = input.source(close)");
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].code, DiagnosticCode::NakedInput);
        assert_eq!(errors[0].line, 1);
    }

    #[test]
    fn test_call_errors_precede_input_errors() {
        let (errors, _) = check("len = input(14)\nplot()");
        let codes: Vec<_> = errors.iter().map(|e| e.code).collect();
        assert_eq!(codes, vec![DiagnosticCode::ArgumentCount, DiagnosticCode::NakedInput]);
    }
}
