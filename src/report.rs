//! Output formatting for pinecheck results.
//!
//! Supports three output formats:
//! - Pretty: colored terminal output for human readability
//! - JSON: structured output for programmatic consumption
//! - SARIF: Static Analysis Results Interchange Format for IDE/CI integration

use colored::*;
use serde::Serialize;
use std::collections::BTreeSet;

use crate::check::{Diagnostic, DiagnosticCode, FileReport, Severity};
use crate::score;

// =============================================================================
// JSON Format
// =============================================================================

/// JSON report covering every checked file.
#[derive(Serialize)]
pub struct JsonReport<'a> {
    pub version: &'static str,
    pub rules: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_score: Option<u8>,
    pub passed: bool,
    pub files_checked: usize,
    pub files: &'a [FileReport],
}

/// Build the JSON report structure.
pub fn json_report<'a>(
    rules: &'a str,
    results: &'a [FileReport],
    min_score: Option<u8>,
) -> JsonReport<'a> {
    let passed = results.iter().all(|r| r.passes(min_score));
    JsonReport {
        version: env!("CARGO_PKG_VERSION"),
        rules,
        min_score,
        passed,
        files_checked: results.len(),
        files: results,
    }
}

/// Write results in JSON format.
pub fn write_json(rules: &str, results: &[FileReport], min_score: Option<u8>) -> anyhow::Result<()> {
    let json = serde_json::to_string_pretty(&json_report(rules, results, min_score))?;
    println!("{}", json);
    Ok(())
}

// =============================================================================
// SARIF Format
// =============================================================================

const SARIF_VERSION: &str = "2.1.0";
const SARIF_SCHEMA: &str = "https://raw.githubusercontent.com/oasis-tcs/sarif-spec/master/Schemata/sarif-schema-2.1.0.json";
const TOOL_NAME: &str = "pinecheck";

#[derive(Serialize)]
pub struct SarifReport {
    version: String,
    #[serde(rename = "$schema")]
    schema: String,
    runs: Vec<SarifRun>,
}

#[derive(Serialize)]
struct SarifRun {
    tool: SarifTool,
    results: Vec<SarifResult>,
}

#[derive(Serialize)]
struct SarifTool {
    driver: SarifDriver,
}

#[derive(Serialize)]
struct SarifDriver {
    name: String,
    version: String,
    rules: Vec<SarifRule>,
}

#[derive(Serialize)]
struct SarifRule {
    id: String,
    name: String,
    #[serde(rename = "shortDescription")]
    short_description: SarifMessage,
    #[serde(rename = "defaultConfiguration")]
    default_config: SarifRuleConfig,
}

#[derive(Serialize)]
struct SarifRuleConfig {
    level: String,
}

#[derive(Serialize)]
struct SarifResult {
    #[serde(rename = "ruleId")]
    rule_id: String,
    level: String,
    message: SarifMessage,
    locations: Vec<SarifLocation>,
}

#[derive(Serialize)]
struct SarifMessage {
    text: String,
}

#[derive(Serialize)]
struct SarifLocation {
    #[serde(rename = "physicalLocation")]
    physical_location: SarifPhysicalLocation,
}

#[derive(Serialize)]
struct SarifPhysicalLocation {
    #[serde(rename = "artifactLocation")]
    artifact_location: SarifArtifact,
    region: SarifRegion,
}

#[derive(Serialize)]
struct SarifArtifact {
    uri: String,
}

#[derive(Serialize)]
struct SarifRegion {
    #[serde(rename = "startLine")]
    start_line: usize,
}

fn short_description(code: DiagnosticCode) -> &'static str {
    match code {
        DiagnosticCode::EmptyScript => "Script is empty or only contains comments",
        DiagnosticCode::VersionNotFirst => "Script must start with //@version=5",
        DiagnosticCode::MissingDeclaration => "Missing indicator(), strategy() or library() declaration",
        DiagnosticCode::MultipleDeclarations => "More than one script declaration",
        DiagnosticCode::MissingTitle => "Script declaration has no title",
        DiagnosticCode::MissingOverlay => "indicator() declaration has no overlay parameter",
        DiagnosticCode::MissingLibraryFormat => "library() declaration has no format parameter",
        DiagnosticCode::DeprecatedFunction => "Call to a deprecated function",
        DiagnosticCode::ArgumentCount => "Call has fewer arguments than required",
        DiagnosticCode::NakedInput => "Untyped input() call",
        DiagnosticCode::UnmatchedClosing => "Closing bracket without an opener",
        DiagnosticCode::MismatchedBracket => "Closing bracket does not match its opener",
        DiagnosticCode::UnclosedBracket => "Opening bracket is never closed",
        DiagnosticCode::InvalidAssignmentTarget => "Reassignment target is not a variable name",
        DiagnosticCode::MalformedTernary => "Ternary operator without ':'",
    }
}

/// Severity a code is actually reported with.
fn reported_severity(code: DiagnosticCode) -> Severity {
    match code {
        // The declaration check always fails on a missing library format.
        DiagnosticCode::MissingLibraryFormat => Severity::Error,
        other => other.default_severity(),
    }
}

fn map_severity_to_level(severity: Severity) -> &'static str {
    match severity {
        Severity::Error => "error",
        Severity::Warning => "warning",
    }
}

fn sarif_result(file: &str, severity: Severity, d: &Diagnostic) -> SarifResult {
    SarifResult {
        rule_id: d.code.as_str().to_string(),
        level: map_severity_to_level(severity).to_string(),
        message: SarifMessage {
            text: d.message.clone(),
        },
        locations: vec![SarifLocation {
            physical_location: SarifPhysicalLocation {
                artifact_location: SarifArtifact {
                    uri: file.replace('\\', "/"),
                },
                region: SarifRegion {
                    start_line: if d.line > 0 { d.line } else { 1 },
                },
            },
        }],
    }
}

/// Build the SARIF report structure.
pub fn sarif_report(results: &[FileReport]) -> SarifReport {
    let mut codes: BTreeSet<DiagnosticCode> = BTreeSet::new();
    let mut sarif_results = Vec::new();

    for file in results {
        for (severity, d) in file.report.diagnostics() {
            codes.insert(d.code);
            sarif_results.push(sarif_result(&file.file, severity, d));
        }
    }

    let rules = codes
        .into_iter()
        .map(|code| SarifRule {
            id: code.as_str().to_string(),
            name: code.title().to_string(),
            short_description: SarifMessage {
                text: short_description(code).to_string(),
            },
            default_config: SarifRuleConfig {
                level: map_severity_to_level(reported_severity(code)).to_string(),
            },
        })
        .collect();

    SarifReport {
        version: SARIF_VERSION.to_string(),
        schema: SARIF_SCHEMA.to_string(),
        runs: vec![SarifRun {
            tool: SarifTool {
                driver: SarifDriver {
                    name: TOOL_NAME.to_string(),
                    version: env!("CARGO_PKG_VERSION").to_string(),
                    rules,
                },
            },
            results: sarif_results,
        }],
    }
}

/// Write results in SARIF format.
pub fn write_sarif(results: &[FileReport]) -> anyhow::Result<()> {
    let json = serde_json::to_string_pretty(&sarif_report(results))?;
    println!("{}", json);
    Ok(())
}

// =============================================================================
// Pretty Format
// =============================================================================

/// Write results in pretty (human-readable) format.
pub fn write_pretty(rules: &str, results: &[FileReport], min_score: Option<u8>) {
    // Header
    println!();
    print!("  ");
    print!("{}", "pinecheck".cyan().bold());
    println!(" v{}", env!("CARGO_PKG_VERSION"));
    println!();
    print!("  {}", "Rules: ".dimmed());
    println!("{}", rules);
    println!();

    for file in results {
        write_file(file, min_score);
    }

    write_final_status(results, min_score);
    println!();
}

fn write_file(file: &FileReport, min_score: Option<u8>) {
    let report = &file.report;
    if file.passes(min_score) {
        print!("  {}", "✓ PASS".green());
    } else {
        print!("  {}", "✗ FAIL".red());
    }
    print!("  {}", file.file.blue());
    print!("  Score: ");
    write_colored_score(report.score());
    print!("  Grade: ");
    write_colored_grade(score::grade(report.score()));
    println!();

    for (severity, d) in report.diagnostics() {
        write_severity_tag(severity);
        print!("{:<6}", d.code.as_str().dimmed());
        if d.line > 0 {
            print!("{}", format!("line {}", d.line).dimmed());
        }
        println!();
        println!("            {}", d.message);
    }

    if !file.activity.is_empty() {
        println!("    {}", "Activity:".dimmed());
        for event in &file.activity {
            println!("      {}", event.to_string().dimmed());
        }
    }
    println!();
}

fn write_colored_score(s: u8) {
    match s {
        s if s >= 90 => print!("{}", s.to_string().green().bold()),
        s if s >= 75 => print!("{}", s.to_string().green()),
        s if s >= 50 => print!("{}", s.to_string().yellow()),
        s if s >= 25 => print!("{}", s.to_string().yellow().bold()),
        _ => print!("{}", s.to_string().red()),
    }
}

fn write_colored_grade(grade: &str) {
    match grade {
        "A" => print!("{}", grade.green().bold()),
        "B" => print!("{}", grade.green()),
        "C" => print!("{}", grade.yellow()),
        "D" => print!("{}", grade.yellow().bold()),
        _ => print!("{}", grade.red()),
    }
}

fn write_severity_tag(severity: Severity) {
    match severity {
        Severity::Error => print!("    {} ", "ERROR".red()),
        Severity::Warning => print!("    {} ", "WARN ".yellow()),
    }
}

fn write_final_status(results: &[FileReport], min_score: Option<u8>) {
    let errors: usize = results.iter().map(|r| r.report.errors().len()).sum();
    let warnings: usize = results.iter().map(|r| r.report.warnings().len()).sum();
    let failed = results
        .iter()
        .filter(|r| !r.passes(min_score))
        .count();

    print!(
        "  {}",
        format!(
            "{} file(s), {} error(s), {} warning(s)",
            results.len(),
            errors,
            warnings
        )
        .dimmed()
    );
    if let Some(min) = min_score {
        print!("  {}", format!("Minimum score: {}", min).dimmed());
    }
    print!("  ");
    if failed == 0 {
        print!("{}", "PASSED".green());
    } else {
        print!("{}", format!("FAILED ({})", failed).red());
    }
    println!();
}
