//! Check runner that orchestrates all checks.

use rayon::prelude::*;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::rules::RuleTable;

use super::{
    split_lines, strip_comments, validate_assignments, validate_brackets, validate_declaration,
    validate_syntax, validate_ternary, validate_version, ActivityLog, CheckEvent, Diagnostic,
    EventSink, NullSink, Report, Stage,
};

/// Run every check on `code` against the built-in rule table.
pub fn comprehensive_check(code: &str) -> Report {
    Runner::with_builtin_rules().check(code)
}

/// The report for one checked file.
#[derive(Debug, Clone, Serialize)]
pub struct FileReport {
    pub file: String,
    #[serde(flatten)]
    pub report: Report,
    /// Newest activity events, oldest first. Empty unless requested.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub activity: Vec<CheckEvent>,
}

impl FileReport {
    /// Valid, and at least `min_score` when one is given.
    pub fn passes(&self, min_score: Option<u8>) -> bool {
        self.report.is_valid() && min_score.map_or(true, |min| self.report.score() >= min)
    }
}

/// Executes all checks against scripts using one shared rule table.
#[derive(Debug, Clone)]
pub struct Runner {
    rules: Arc<RuleTable>,
    activity_capacity: usize,
}

impl Runner {
    /// Create a new runner over `rules`.
    pub fn new(rules: Arc<RuleTable>) -> Self {
        Self {
            rules,
            activity_capacity: 0,
        }
    }

    pub fn with_builtin_rules() -> Self {
        Self::new(RuleTable::builtin())
    }

    /// Keep up to `capacity` activity events per file in [`FileReport`]s.
    pub fn activity_capacity(mut self, capacity: usize) -> Self {
        self.activity_capacity = capacity;
        self
    }

    pub fn rules(&self) -> &RuleTable {
        &self.rules
    }

    /// Run all checks and build the report.
    pub fn check(&self, code: &str) -> Report {
        self.check_with_events(code, &mut NullSink)
    }

    /// Run all checks, reporting progress to `sink`.
    ///
    /// The bracket check runs first; when it fails the report holds that
    /// single error and nothing else runs.
    pub fn check_with_events(&self, code: &str, sink: &mut dyn EventSink) -> Report {
        sink.record(CheckEvent::Started {
            lines: split_lines(code).len(),
        });

        let brackets = validate_brackets(code);
        if let Some(diagnostic) = brackets.diagnostic.filter(|_| !brackets.ok) {
            tracing::debug!(code = %diagnostic.code, line = diagnostic.line, "bracket gate failed");
            sink.record(CheckEvent::BracketGateFailed {
                code: diagnostic.code,
                line: diagnostic.line,
            });
            return finish(Report::new(vec![diagnostic], Vec::new()), sink);
        }
        sink.record(CheckEvent::StageFinished {
            stage: Stage::Brackets,
            errors: 0,
            warnings: 0,
        });

        let lines = strip_comments(code);
        let mut errors: Vec<Diagnostic> = Vec::new();
        let mut warnings: Vec<Diagnostic> = Vec::new();

        let version = validate_version(code, &lines);
        let version_errors = usize::from(version.diagnostic.is_some());
        errors.extend(version.diagnostic);
        sink.record(CheckEvent::StageFinished {
            stage: Stage::Version,
            errors: version_errors,
            warnings: 0,
        });

        let declaration = validate_declaration(&lines);
        let (decl_errors, decl_warnings) = match declaration.diagnostic {
            Some(d) if declaration.ok => {
                warnings.push(d);
                (0, 1)
            }
            Some(d) => {
                errors.push(d);
                (1, 0)
            }
            None => (0, 0),
        };
        sink.record(CheckEvent::StageFinished {
            stage: Stage::Declaration,
            errors: decl_errors,
            warnings: decl_warnings,
        });

        let header_count = errors.len();
        let (syntax_errors, syntax_warnings) = validate_syntax(&lines, &self.rules);
        let mut syntax_error_count = 0;
        for d in syntax_errors {
            // A legacy declaration is already reported by the header check.
            if errors[..header_count].iter().any(|h| h.same_site(&d)) {
                tracing::debug!(code = %d.code, line = d.line, "skipping duplicate diagnostic");
                continue;
            }
            errors.push(d);
            syntax_error_count += 1;
        }
        sink.record(CheckEvent::StageFinished {
            stage: Stage::Syntax,
            errors: syntax_error_count,
            warnings: syntax_warnings.len(),
        });
        warnings.extend(syntax_warnings);

        let assignment_errors = validate_assignments(&lines);
        sink.record(CheckEvent::StageFinished {
            stage: Stage::Assignments,
            errors: assignment_errors.len(),
            warnings: 0,
        });
        errors.extend(assignment_errors);

        let ternary_warnings = validate_ternary(&lines);
        sink.record(CheckEvent::StageFinished {
            stage: Stage::Ternary,
            errors: 0,
            warnings: ternary_warnings.len(),
        });
        warnings.extend(ternary_warnings);

        finish(Report::new(errors, warnings), sink)
    }

    /// Check one in-memory script, capturing activity if configured.
    pub fn check_source(&self, name: &str, code: &str) -> FileReport {
        let mut log = ActivityLog::with_capacity(self.activity_capacity);
        let report = self.check_with_events(code, &mut log);
        FileReport {
            file: name.to_string(),
            report,
            activity: log.entries().cloned().collect(),
        }
    }

    /// Check a set of files in parallel. Results keep the input order.
    pub fn run(&self, files: &[PathBuf]) -> anyhow::Result<Vec<FileReport>> {
        files
            .par_iter()
            .map(|path| self.check_file(path))
            .collect()
    }

    fn check_file(&self, path: &Path) -> anyhow::Result<FileReport> {
        let code = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("reading {}: {}", path.display(), e))?;
        Ok(self.check_source(&path.to_string_lossy(), &code))
    }
}

fn finish(report: Report, sink: &mut dyn EventSink) -> Report {
    tracing::debug!(
        is_valid = report.is_valid(),
        errors = report.errors().len(),
        warnings = report.warnings().len(),
        score = report.score(),
        "check finished"
    );
    sink.record(CheckEvent::Finished {
        is_valid: report.is_valid(),
        score: report.score(),
    });
    report
}
