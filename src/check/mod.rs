//! Static checks for Pine Script v5 source.
//!
//! Every check works on lines and tokens, not an AST. The bracket check
//! reads the raw text; all others read the comment-stripped lines.

mod brackets;
mod comments;
mod events;
mod header;
mod runner;
mod signatures;
mod statements;
mod types;

pub use brackets::validate_brackets;
pub use comments::{split_lines, strip_comments};
pub use events::{ActivityLog, CheckEvent, EventSink, NullSink, Stage};
pub use header::{validate_declaration, validate_version, DeclarationKind, VERSION_MARKER};
pub use runner::{comprehensive_check, FileReport, Runner};
pub use signatures::{parse_call, split_arguments, validate_syntax, CallSite};
pub use statements::{validate_assignments, validate_ternary};
pub use types::{CheckOutcome, Diagnostic, DiagnosticCode, Report, Severity, SourceLine};
