//! Command-line interface for pinecheck.

use clap::{Parser, Subcommand};
use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use walkdir::WalkDir;

use crate::check::{FileReport, Runner};
use crate::report;
use crate::rules::{self, RuleTable};

/// Exit codes.
pub const EXIT_SUCCESS: i32 = 0;
pub const EXIT_FAILED: i32 = 1;
pub const EXIT_ERROR: i32 = 2;

/// Default rule table file names to search for.
const DEFAULT_RULES_NAMES: &[&str] = &["pinecheck.json", "pinecheck.yaml", ".pinecheck.yaml"];

/// Script file extension.
const PINE_EXTENSION: &str = "pine";

/// Path argument meaning "read the script from stdin".
const STDIN_PATH: &str = "-";

/// Static analysis quality gate for Pine Script v5.
///
/// Pinecheck validates scripts without executing them: bracket balance,
/// version marker, declaration call, function signatures, reassignment
/// targets and ternaries. Each script gets a 0-100 quality score.
#[derive(Parser)]
#[command(name = "pinecheck")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Check Pine Script files
    #[command(visible_alias = "check")]
    Lint(LintArgs),
    /// Show or export the function signature table
    Rules(RulesArgs),
}

/// Arguments for the lint command.
#[derive(Parser)]
pub struct LintArgs {
    /// Files or directories to check ("-" reads stdin)
    #[arg(required = true)]
    pub paths: Vec<PathBuf>,

    /// Path to a rule table (JSON or YAML, default: auto-discover)
    #[arg(short, long)]
    pub rules: Option<PathBuf>,

    /// Output format: pretty, json, or sarif
    #[arg(short, long, default_value = "pretty")]
    pub format: String,

    /// Minimum acceptable score (exit non-zero if any file scores lower)
    #[arg(short, long)]
    pub min_score: Option<u8>,

    /// Show the last N activity events for each file
    #[arg(short, long)]
    pub activity: Option<usize>,
}

/// Arguments for the rules command.
#[derive(Parser)]
pub struct RulesArgs {
    /// Path to a rule table (default: auto-discover)
    #[arg(short, long)]
    pub rules: Option<PathBuf>,

    /// Write the table as JSON to this file instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// List function names and arities instead of printing JSON
    #[arg(short, long)]
    pub list: bool,
}

/// Where a rule table came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RulesSource {
    File(PathBuf),
    Builtin,
}

impl std::fmt::Display for RulesSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RulesSource::File(p) => write!(f, "{}", p.display()),
            RulesSource::Builtin => write!(f, "built-in"),
        }
    }
}

/// Find a rule table: explicit path, then the working directory, then the
/// per-user config directory.
pub fn discover_rules(explicit: Option<&Path>) -> RulesSource {
    if let Some(p) = explicit {
        return RulesSource::File(p.to_path_buf());
    }
    for name in DEFAULT_RULES_NAMES {
        let path = PathBuf::from(name);
        if path.exists() {
            return RulesSource::File(path);
        }
    }
    match rules::user_rules_path() {
        Some(path) if path.exists() => RulesSource::File(path),
        _ => RulesSource::Builtin,
    }
}

/// Load and validate the rule table a source points at.
pub fn load_rules(source: &RulesSource) -> anyhow::Result<Arc<RuleTable>> {
    let table = match source {
        RulesSource::File(path) => Arc::new(RuleTable::parse_file(path)?),
        RulesSource::Builtin => RuleTable::builtin(),
    };
    rules::validate(&table)?;
    tracing::info!(source = %source, functions = table.len(), "using rule table");
    Ok(table)
}

/// Collect `.pine` files under `root`, skipping hidden directories.
pub fn collect_files(root: &Path) -> anyhow::Result<Vec<PathBuf>> {
    let mut files = Vec::new();

    for entry in WalkDir::new(root)
        .follow_links(true)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| {
            let name = e.file_name().to_string_lossy();
            let hidden = name.starts_with('.') && e.depth() > 0;
            !(e.file_type().is_dir() && (hidden || name == "node_modules"))
        })
    {
        let entry = entry?;
        if entry.file_type().is_file() {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) == Some(PINE_EXTENSION) {
                files.push(path.to_path_buf());
            }
        }
    }

    Ok(files)
}

/// Run the lint command.
pub fn run_lint(args: &LintArgs) -> anyhow::Result<i32> {
    // Validate format
    if args.format != "pretty" && args.format != "json" && args.format != "sarif" {
        eprintln!(
            "Error: invalid format {:?}, must be 'pretty', 'json', or 'sarif'",
            args.format
        );
        return Ok(EXIT_ERROR);
    }

    if let Some(min) = args.min_score {
        if min > 100 {
            eprintln!("Error: --min-score must be between 0 and 100, got {}", min);
            return Ok(EXIT_ERROR);
        }
    }

    let source = discover_rules(args.rules.as_deref());
    let table = match load_rules(&source) {
        Ok(t) => t,
        Err(e) => {
            eprintln!("Error loading rules from {}: {}", source, e);
            return Ok(EXIT_ERROR);
        }
    };

    let runner = Runner::new(table).activity_capacity(args.activity.unwrap_or(0));

    let mut results: Vec<FileReport> = Vec::new();
    let mut files: Vec<PathBuf> = Vec::new();
    for path in &args.paths {
        if path.as_os_str() == STDIN_PATH {
            let mut code = String::new();
            std::io::stdin().read_to_string(&mut code)?;
            results.push(runner.check_source("<stdin>", &code));
            continue;
        }

        let metadata = match std::fs::metadata(path) {
            Ok(m) => m,
            Err(e) => {
                eprintln!("Error: cannot access path {:?}: {}", path, e);
                return Ok(EXIT_ERROR);
            }
        };
        if metadata.is_dir() {
            files.extend(collect_files(path)?);
        } else {
            files.push(path.clone());
        }
    }

    if files.is_empty() && results.is_empty() {
        eprintln!("Warning: no files to check");
        return Ok(EXIT_SUCCESS);
    }

    tracing::info!(files = files.len(), "checking files");
    results.extend(runner.run(&files)?);

    let rules_label = source.to_string();
    match args.format.as_str() {
        "json" => report::write_json(&rules_label, &results, args.min_score)?,
        "sarif" => report::write_sarif(&results)?,
        _ => report::write_pretty(&rules_label, &results, args.min_score),
    }

    if results.iter().all(|r| r.passes(args.min_score)) {
        Ok(EXIT_SUCCESS)
    } else {
        Ok(EXIT_FAILED)
    }
}

/// Run the rules command.
pub fn run_rules(args: &RulesArgs) -> anyhow::Result<i32> {
    let source = discover_rules(args.rules.as_deref());
    let table = load_rules(&source)?;

    if args.list {
        return list_rules(&source, &table);
    }

    let json = table.to_json_pretty()?;
    match &args.output {
        Some(path) => {
            if path.exists() {
                eprintln!("Error: file already exists: {}", path.display());
                eprintln!("Remove it or use --output to specify a different path");
                return Ok(EXIT_ERROR);
            }
            if let Some(parent) = path.parent() {
                if !parent.as_os_str().is_empty() && parent != Path::new(".") {
                    std::fs::create_dir_all(parent)?;
                }
            }
            std::fs::write(path, json)?;
            println!("Wrote {} rules from {} to {}", table.len(), source, path.display());
        }
        None => println!("{}", json),
    }

    Ok(EXIT_SUCCESS)
}

/// List function signatures in the table.
fn list_rules(source: &RulesSource, table: &RuleTable) -> anyhow::Result<i32> {
    println!("Rule table: {} ({} functions)", source, table.len());
    println!();

    for sig in table.signatures() {
        if sig.deprecated {
            let replacement = sig.replacement.as_deref().unwrap_or("a newer function");
            println!("  {:<22} deprecated, use {}", sig.name, replacement);
        } else {
            let required: Vec<&str> = sig.required_parameters().collect();
            println!("  {:<22} requires ({})", sig.name, required.join(", "));
        }
    }

    Ok(EXIT_SUCCESS)
}
