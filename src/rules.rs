//! Function signature table for call-site validation.
//!
//! The table maps call names (`plot`, `ta.sma`) to their parameters and
//! deprecation status. A built-in table ships with the binary; projects can
//! override it with a JSON or YAML file of the same shape:
//!
//! ```json
//! {
//!   "function_signatures": {
//!     "ta.sma": {
//!       "parameters": {
//!         "source": { "required": true },
//!         "length": { "required": true }
//!       }
//!     },
//!     "study": { "deprecated": true, "replacement": "indicator()" }
//!   }
//! }
//! ```
//!
//! The table is read-only once loaded and shared between checks.

use directories::ProjectDirs;
use lazy_static::lazy_static;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;

/// Rule table embedded in the binary.
pub const BUILTIN_RULES: &str = include_str!("templates/pine_rules.json");

static BUILTIN: Lazy<Arc<RuleTable>> = Lazy::new(|| {
    Arc::new(RuleTable::from_json(BUILTIN_RULES).expect("built-in rule table must parse"))
});

lazy_static! {
    /// Names the call-site matcher can recognise.
    static ref CALL_NAME: Regex =
        Regex::new(r"^([a-zA-Z0-9_]+\.[a-zA-Z0-9_]+|[a-zA-Z0-9_]+)$").unwrap();
}

/// Errors raised while loading or validating a rule table.
#[derive(Error, Debug)]
pub enum RuleError {
    #[error("reading rule table {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid JSON rule table: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid YAML rule table: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("invalid rule for `{name}`: {reason}")]
    Invalid { name: String, reason: String },
}

/// One declared parameter of a function.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize, Default)]
pub struct ParameterSpec {
    #[serde(default)]
    pub required: bool,
    /// Free-form type annotation, informational only.
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
}

/// Parameters in declaration order.
///
/// Serialized as a map keyed by parameter name; the order of the source file
/// is kept so required parameters can be listed the way they were written.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Parameters(Vec<(String, ParameterSpec)>);

impl Parameters {
    pub fn iter(&self) -> impl Iterator<Item = (&str, &ParameterSpec)> {
        self.0.iter().map(|(name, spec)| (name.as_str(), spec))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<'de> Deserialize<'de> for Parameters {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct ParametersVisitor;

        impl<'de> Visitor<'de> for ParametersVisitor {
            type Value = Parameters;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a map of parameter name to parameter spec")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Parameters, A::Error> {
                let mut params = Vec::with_capacity(map.size_hint().unwrap_or(0));
                while let Some((name, spec)) = map.next_entry::<String, ParameterSpec>()? {
                    params.push((name, spec));
                }
                Ok(Parameters(params))
            }
        }

        deserializer.deserialize_map(ParametersVisitor)
    }
}

impl Serialize for Parameters {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (name, spec) in &self.0 {
            map.serialize_entry(name, spec)?;
        }
        map.end()
    }
}

/// A function's entry in the rule file.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
struct SignatureEntry {
    #[serde(default, skip_serializing_if = "Parameters::is_empty")]
    parameters: Parameters,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    deprecated: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    replacement: Option<String>,
}

/// On-disk rule file. Unknown top-level keys are ignored.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
struct RuleFile {
    #[serde(default)]
    version: String,
    #[serde(default)]
    function_signatures: BTreeMap<String, SignatureEntry>,
}

/// A known function and what a call to it must look like.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionSignature {
    pub name: String,
    pub parameters: Parameters,
    pub deprecated: bool,
    pub replacement: Option<String>,
}

impl FunctionSignature {
    /// A current function whose listed parameters are all required.
    pub fn new(name: &str, required: &[&str]) -> Self {
        let parameters = required
            .iter()
            .map(|p| {
                (
                    p.to_string(),
                    ParameterSpec {
                        required: true,
                        kind: None,
                    },
                )
            })
            .collect();
        Self {
            name: name.to_string(),
            parameters: Parameters(parameters),
            deprecated: false,
            replacement: None,
        }
    }

    /// A deprecated function with an optional suggested replacement.
    pub fn deprecated(name: &str, replacement: Option<&str>) -> Self {
        Self {
            name: name.to_string(),
            parameters: Parameters::default(),
            deprecated: true,
            replacement: replacement.map(str::to_string),
        }
    }

    /// Names of required parameters, in declaration order.
    pub fn required_parameters(&self) -> impl Iterator<Item = &str> {
        self.parameters
            .iter()
            .filter(|(_, spec)| spec.required)
            .map(|(name, _)| name)
    }

    pub fn required_count(&self) -> usize {
        self.required_parameters().count()
    }

    fn from_entry(name: String, entry: SignatureEntry) -> Self {
        Self {
            name,
            parameters: entry.parameters,
            deprecated: entry.deprecated,
            replacement: entry.replacement,
        }
    }

    fn to_entry(&self) -> SignatureEntry {
        SignatureEntry {
            parameters: self.parameters.clone(),
            deprecated: self.deprecated,
            replacement: self.replacement.clone(),
        }
    }
}

/// Read-only lookup of function signatures by exact call name.
#[derive(Debug, Clone, Default)]
pub struct RuleTable {
    version: String,
    signatures: HashMap<String, FunctionSignature>,
}

impl RuleTable {
    /// The table shipped with the binary, parsed once per process.
    pub fn builtin() -> Arc<RuleTable> {
        Arc::clone(&BUILTIN)
    }

    /// Build a table directly from signatures.
    pub fn from_signatures(signatures: impl IntoIterator<Item = FunctionSignature>) -> Self {
        Self {
            version: String::new(),
            signatures: signatures
                .into_iter()
                .map(|s| (s.name.clone(), s))
                .collect(),
        }
    }

    pub fn from_json(content: &str) -> Result<Self, RuleError> {
        let file: RuleFile = serde_json::from_str(content)?;
        Ok(Self::from_file(file))
    }

    pub fn from_yaml(content: &str) -> Result<Self, RuleError> {
        let file: RuleFile = serde_yaml::from_str(content)?;
        Ok(Self::from_file(file))
    }

    /// Parse a rule table file: `.json` as JSON, anything else as YAML.
    pub fn parse_file<P: AsRef<Path>>(path: P) -> Result<Self, RuleError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| RuleError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let table = match path.extension().and_then(|e| e.to_str()) {
            Some("json") => Self::from_json(&content)?,
            _ => Self::from_yaml(&content)?,
        };
        tracing::debug!(
            path = %path.display(),
            functions = table.len(),
            "loaded rule table"
        );
        Ok(table)
    }

    fn from_file(file: RuleFile) -> Self {
        Self {
            version: file.version,
            signatures: file
                .function_signatures
                .into_iter()
                .map(|(name, entry)| (name.clone(), FunctionSignature::from_entry(name, entry)))
                .collect(),
        }
    }

    /// Look up a call name, e.g. `plot` or `ta.sma`.
    pub fn get(&self, name: &str) -> Option<&FunctionSignature> {
        self.signatures.get(name)
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn len(&self) -> usize {
        self.signatures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.signatures.is_empty()
    }

    /// Signatures sorted by name.
    pub fn signatures(&self) -> Vec<&FunctionSignature> {
        let mut all: Vec<_> = self.signatures.values().collect();
        all.sort_by(|a, b| a.name.cmp(&b.name));
        all
    }

    /// Render the table in the on-disk JSON shape.
    pub fn to_json_pretty(&self) -> Result<String, RuleError> {
        let file = RuleFile {
            version: self.version.clone(),
            function_signatures: self
                .signatures
                .iter()
                .map(|(name, sig)| (name.clone(), sig.to_entry()))
                .collect(),
        };
        Ok(serde_json::to_string_pretty(&file)?)
    }
}

/// Per-user rule table location, e.g. `~/.config/pinecheck/rules.json`.
pub fn user_rules_path() -> Option<PathBuf> {
    ProjectDirs::from("", "", "pinecheck").map(|dirs| dirs.config_dir().join("rules.json"))
}

/// Validate a rule table for correctness.
pub fn validate(table: &RuleTable) -> Result<(), RuleError> {
    for sig in table.signatures.values() {
        if !CALL_NAME.is_match(&sig.name) {
            return Err(RuleError::Invalid {
                name: sig.name.clone(),
                reason: "name must be `ident` or `namespace.ident`".to_string(),
            });
        }
        if sig.replacement.as_deref().is_some_and(|r| r.trim().is_empty()) {
            return Err(RuleError::Invalid {
                name: sig.name.clone(),
                reason: "replacement must not be empty".to_string(),
            });
        }
        if !sig.deprecated && sig.replacement.is_some() {
            tracing::warn!(function = %sig.name, "replacement given for a function that is not deprecated");
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_builtin_table_parses_and_validates() {
        let table = RuleTable::builtin();
        assert!(!table.is_empty());
        validate(&table).unwrap();

        let sma = table.get("ta.sma").unwrap();
        assert_eq!(sma.required_count(), 2);
        assert_eq!(table.get("plot").unwrap().required_count(), 1);

        let study = table.get("study").unwrap();
        assert!(study.deprecated);
        assert_eq!(study.replacement.as_deref(), Some("indicator() or strategy()"));
    }

    #[test]
    fn test_builtin_is_shared() {
        let a = RuleTable::builtin();
        let b = RuleTable::builtin();
        assert!(Arc::ptr_eq(&a, &b));
    }

    #[test]
    fn test_parameter_order_preserved() {
        let json = r#"{
            "function_signatures": {
                "f": { "parameters": {
                    "zeta": { "required": true },
                    "alpha": { "required": false },
                    "mid": { "required": true }
                } }
            }
        }"#;
        let table = RuleTable::from_json(json).unwrap();
        let required: Vec<_> = table.get("f").unwrap().required_parameters().collect();
        assert_eq!(required, vec!["zeta", "mid"]);
    }

    #[test]
    fn test_unknown_keys_ignored() {
        let json = r#"{
            "deprecated_functions": [],
            "common_patterns": {},
            "function_signatures": { "g": { "parameters": {}, "notes": "x" } }
        }"#;
        let table = RuleTable::from_json(json).unwrap();
        assert_eq!(table.get("g").unwrap().required_count(), 0);
    }

    #[test]
    fn test_parse_yaml_file() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("rules.yaml");
        std::fs::write(
            &path,
            r#"
version: "5"
function_signatures:
  ta.sma:
    parameters:
      source: { required: true }
      length: { required: true }
  study:
    deprecated: true
"#,
        )
        .unwrap();

        let table = RuleTable::parse_file(&path).unwrap();
        assert_eq!(table.version(), "5");
        assert_eq!(table.get("ta.sma").unwrap().required_count(), 2);
        assert!(table.get("study").unwrap().replacement.is_none());
    }

    #[test]
    fn test_parse_missing_file() {
        let err = RuleTable::parse_file("/nonexistent/rules.json").unwrap_err();
        assert!(matches!(err, RuleError::Io { .. }));
    }

    #[test]
    fn test_json_export_reloads() {
        let table = RuleTable::builtin();
        let json = table.to_json_pretty().unwrap();
        let reloaded = RuleTable::from_json(&json).unwrap();
        assert_eq!(reloaded.len(), table.len());
        assert_eq!(reloaded.get("ta.macd"), table.get("ta.macd"));
    }

    #[test]
    fn test_validate_rejects_bad_names() {
        let table = RuleTable::from_signatures(vec![FunctionSignature::new("a.b.c", &[])]);
        assert!(matches!(validate(&table), Err(RuleError::Invalid { .. })));

        let table = RuleTable::from_signatures(vec![FunctionSignature::deprecated("old", Some(" "))]);
        assert!(validate(&table).is_err());
    }
}
