//! Pinecheck - static analysis quality gate for Pine Script v5.
//!
//! Pinecheck validates indicator, strategy and library scripts without
//! executing them. It produces a report of errors and warnings plus a 0-100
//! quality score, so a generation loop can decide whether a candidate script
//! is usable or needs another repair pass.
//!
//! # Architecture
//!
//! - `check`: line- and token-level checks and the runner that orders them
//! - `rules`: function signature table (built-in or loaded from JSON/YAML)
//! - `score`: score derivation
//! - `report`: output formatting (pretty, JSON, SARIF)
//! - `cli`: command-line entry points
//!
//! # Example
//!
//! ```
//! let report = pinecheck::comprehensive_check(
//!     "//@version=5\nindicator(\"X\", overlay=true)\nplot(ta.sma(close, 14))",
//! );
//! assert!(report.is_valid());
//! assert_eq!(report.score(), 100);
//! ```

pub mod check;
pub mod cli;
pub mod report;
pub mod rules;
pub mod score;

pub use check::{
    comprehensive_check, strip_comments, validate_assignments, validate_brackets,
    validate_declaration, validate_syntax, validate_ternary, validate_version, ActivityLog,
    CheckEvent, CheckOutcome, Diagnostic, DiagnosticCode, EventSink, FileReport, Report, Runner,
    SourceLine,
};
pub use rules::{FunctionSignature, RuleError, RuleTable};
