//! Core types for check results.

use serde::{Deserialize, Serialize};

/// Severity levels for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Severity::Error => write!(f, "error"),
            Severity::Warning => write!(f, "warning"),
        }
    }
}

/// Stable diagnostic codes.
///
/// Callers pattern-match on the rendered string (`"E103"`), so variants must
/// never be renumbered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum DiagnosticCode {
    #[serde(rename = "E001")]
    EmptyScript,
    #[serde(rename = "E002")]
    VersionNotFirst,
    #[serde(rename = "E003")]
    MissingDeclaration,
    #[serde(rename = "E004")]
    MultipleDeclarations,
    #[serde(rename = "E005")]
    MissingTitle,
    #[serde(rename = "W001")]
    MissingOverlay,
    #[serde(rename = "W002")]
    MissingLibraryFormat,
    #[serde(rename = "E102")]
    DeprecatedFunction,
    #[serde(rename = "E103")]
    ArgumentCount,
    #[serde(rename = "E104")]
    NakedInput,
    #[serde(rename = "E201")]
    UnmatchedClosing,
    #[serde(rename = "E202")]
    MismatchedBracket,
    #[serde(rename = "E203")]
    UnclosedBracket,
    #[serde(rename = "E301")]
    InvalidAssignmentTarget,
    #[serde(rename = "W201")]
    MalformedTernary,
}

impl DiagnosticCode {
    pub const ALL: &'static [DiagnosticCode] = &[
        DiagnosticCode::EmptyScript,
        DiagnosticCode::VersionNotFirst,
        DiagnosticCode::MissingDeclaration,
        DiagnosticCode::MultipleDeclarations,
        DiagnosticCode::MissingTitle,
        DiagnosticCode::MissingOverlay,
        DiagnosticCode::MissingLibraryFormat,
        DiagnosticCode::DeprecatedFunction,
        DiagnosticCode::ArgumentCount,
        DiagnosticCode::NakedInput,
        DiagnosticCode::UnmatchedClosing,
        DiagnosticCode::MismatchedBracket,
        DiagnosticCode::UnclosedBracket,
        DiagnosticCode::InvalidAssignmentTarget,
        DiagnosticCode::MalformedTernary,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            DiagnosticCode::EmptyScript => "E001",
            DiagnosticCode::VersionNotFirst => "E002",
            DiagnosticCode::MissingDeclaration => "E003",
            DiagnosticCode::MultipleDeclarations => "E004",
            DiagnosticCode::MissingTitle => "E005",
            DiagnosticCode::MissingOverlay => "W001",
            DiagnosticCode::MissingLibraryFormat => "W002",
            DiagnosticCode::DeprecatedFunction => "E102",
            DiagnosticCode::ArgumentCount => "E103",
            DiagnosticCode::NakedInput => "E104",
            DiagnosticCode::UnmatchedClosing => "E201",
            DiagnosticCode::MismatchedBracket => "E202",
            DiagnosticCode::UnclosedBracket => "E203",
            DiagnosticCode::InvalidAssignmentTarget => "E301",
            DiagnosticCode::MalformedTernary => "W201",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|c| c.as_str() == s)
    }

    /// Severity implied by the code prefix.
    ///
    /// W002 carries a `W` prefix but is reported as an error by the
    /// declaration checker; the list a diagnostic lands in is authoritative.
    pub fn default_severity(&self) -> Severity {
        if self.as_str().starts_with('W') {
            Severity::Warning
        } else {
            Severity::Error
        }
    }

    /// Short human-readable name, used by SARIF output.
    pub fn title(&self) -> &'static str {
        match self {
            DiagnosticCode::EmptyScript => "EmptyScript",
            DiagnosticCode::VersionNotFirst => "VersionNotFirst",
            DiagnosticCode::MissingDeclaration => "MissingDeclaration",
            DiagnosticCode::MultipleDeclarations => "MultipleDeclarations",
            DiagnosticCode::MissingTitle => "MissingTitle",
            DiagnosticCode::MissingOverlay => "MissingOverlay",
            DiagnosticCode::MissingLibraryFormat => "MissingLibraryFormat",
            DiagnosticCode::DeprecatedFunction => "DeprecatedFunction",
            DiagnosticCode::ArgumentCount => "ArgumentCount",
            DiagnosticCode::NakedInput => "NakedInput",
            DiagnosticCode::UnmatchedClosing => "UnmatchedClosingBracket",
            DiagnosticCode::MismatchedBracket => "MismatchedBracket",
            DiagnosticCode::UnclosedBracket => "UnclosedBracket",
            DiagnosticCode::InvalidAssignmentTarget => "InvalidAssignmentTarget",
            DiagnosticCode::MalformedTernary => "MalformedTernary",
        }
    }
}

impl std::fmt::Display for DiagnosticCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One stripped source line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceLine {
    /// 1-based line number in the original text.
    pub number: usize,
    pub text: String,
}

impl SourceLine {
    pub fn new(number: usize, text: impl Into<String>) -> Self {
        Self {
            number,
            text: text.into(),
        }
    }
}

/// A single reported issue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub code: DiagnosticCode,
    /// 1-based line, or 0 when the issue is not tied to a line.
    pub line: usize,
    pub message: String,
}

impl Diagnostic {
    pub fn new(code: DiagnosticCode, line: usize, message: impl Into<String>) -> Self {
        Self {
            code,
            line,
            message: message.into(),
        }
    }

    /// Whether this diagnostic reports the same code on the same line.
    pub fn same_site(&self, other: &Diagnostic) -> bool {
        self.code == other.code && self.line == other.line
    }
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.line > 0 {
            write!(f, "{} line {}: {}", self.code, self.line, self.message)
        } else {
            write!(f, "{}: {}", self.code, self.message)
        }
    }
}

/// Result of a pass/fail check that reports at most one diagnostic.
///
/// `ok == true` with a diagnostic means a non-fatal warning.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckOutcome {
    pub ok: bool,
    pub diagnostic: Option<Diagnostic>,
}

impl CheckOutcome {
    pub fn pass() -> Self {
        Self {
            ok: true,
            diagnostic: None,
        }
    }

    pub fn fail(diagnostic: Diagnostic) -> Self {
        Self {
            ok: false,
            diagnostic: Some(diagnostic),
        }
    }

    pub fn warn(diagnostic: Diagnostic) -> Self {
        Self {
            ok: true,
            diagnostic: Some(diagnostic),
        }
    }

    /// The diagnostic code, if any.
    pub fn code(&self) -> Option<DiagnosticCode> {
        self.diagnostic.as_ref().map(|d| d.code)
    }
}

/// The outcome of one full validation pass.
///
/// Fields are private so the score can only be derived, never set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Report {
    is_valid: bool,
    errors: Vec<Diagnostic>,
    warnings: Vec<Diagnostic>,
    score: u8,
}

impl Report {
    /// Build a report and derive validity and score from the diagnostics.
    pub fn new(errors: Vec<Diagnostic>, warnings: Vec<Diagnostic>) -> Self {
        let score = crate::score::calculate(errors.len(), warnings.len());
        Self {
            is_valid: errors.is_empty(),
            errors,
            warnings,
            score,
        }
    }

    pub fn is_valid(&self) -> bool {
        self.is_valid
    }

    pub fn errors(&self) -> &[Diagnostic] {
        &self.errors
    }

    pub fn warnings(&self) -> &[Diagnostic] {
        &self.warnings
    }

    pub fn score(&self) -> u8 {
        self.score
    }

    /// Check whether any diagnostic (error or warning) has the given code.
    pub fn has_code(&self, code: DiagnosticCode) -> bool {
        self.errors
            .iter()
            .chain(self.warnings.iter())
            .any(|d| d.code == code)
    }

    /// All diagnostics tagged with the severity of the list they belong to.
    pub fn diagnostics(&self) -> impl Iterator<Item = (Severity, &Diagnostic)> {
        self.errors
            .iter()
            .map(|d| (Severity::Error, d))
            .chain(self.warnings.iter().map(|d| (Severity::Warning, d)))
    }
}
