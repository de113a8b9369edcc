//! Pre-flight checks for model and policy files
//!
//! These checks are purely syntactic. The model check only looks for the
//! four section headers every Casbin model needs; the policy check only
//! makes sure each rule row has at least two comma-separated fields.
//! Understanding what the sections or rules *mean* is left to the engine.

use regex::Regex;
use std::collections::HashSet;
use std::fmt;
use std::path::Path;
use std::sync::OnceLock;
use thiserror::Error;

/// Sections a model file must declare, in canonical order.
pub const REQUIRED_SECTIONS: [&str; 4] = [
    "request_definition",
    "policy_definition",
    "policy_effect",
    "matchers",
];

/// Which of the two input files a check is about
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    Model,
    Policy,
}

impl fmt::Display for FileKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FileKind::Model => f.write_str("Model"),
            FileKind::Policy => f.write_str("Policy"),
        }
    }
}

impl FileKind {
    fn noun(self) -> &'static str {
        match self {
            FileKind::Model => "model",
            FileKind::Policy => "policy",
        }
    }
}

/// Reasons a file can fail validation
///
/// The `Display` text of each variant is the exact message reported to the
/// user, so it doubles as the `message` of a failed [`ValidationOutcome`].
#[derive(Debug, Error)]
pub enum ValidationError {
    /// The path does not point at a regular file
    #[error("{kind} file not found: {path}")]
    NotFound { kind: FileKind, path: String },

    /// One or more required model sections are absent
    #[error("Missing required sections: {}", .0.join(", "))]
    MissingSections(Vec<String>),

    /// A policy row with fewer than two fields
    #[error("Invalid policy line: {0}")]
    MalformedLine(String),

    /// Reading the file failed part-way
    #[error("Error validating {} file: {}", .kind.noun(), .source)]
    Io {
        kind: FileKind,
        #[source]
        source: std::io::Error,
    },
}

/// Result of validating a single file
///
/// Carries no state beyond the one check it describes. `rules` is only
/// meaningful for a successful policy check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationOutcome {
    /// Whether the file passed
    pub is_valid: bool,
    /// Human-readable summary or failure reason
    pub message: String,
    /// Number of accepted policy rows
    pub rules: usize,
}

impl ValidationOutcome {
    fn valid(message: impl Into<String>, rules: usize) -> Self {
        ValidationOutcome {
            is_valid: true,
            message: message.into(),
            rules,
        }
    }
}

impl From<ValidationError> for ValidationOutcome {
    fn from(err: ValidationError) -> Self {
        ValidationOutcome {
            is_valid: false,
            message: err.to_string(),
            rules: 0,
        }
    }
}

fn section_regex() -> &'static Regex {
    static SECTION: OnceLock<Regex> = OnceLock::new();
    SECTION.get_or_init(|| Regex::new(r"^\[(\w+)\]$").expect("section pattern is valid"))
}

/// Validate a Casbin model file
///
/// Passes when all of [`REQUIRED_SECTIONS`] appear as `[section]` header
/// lines. Blank lines and `#` comments are skipped; section bodies are not
/// inspected.
///
/// # Examples
///
/// ```rust
/// use casbin_cli::validation::validate_model;
///
/// let outcome = validate_model("does/not/exist.conf");
/// assert!(!outcome.is_valid);
/// assert!(outcome.message.starts_with("Model file not found"));
/// ```
pub fn validate_model(path: impl AsRef<Path>) -> ValidationOutcome {
    match check_model(path.as_ref()) {
        Ok(()) => ValidationOutcome::valid("Model file is valid", 0),
        Err(err) => err.into(),
    }
}

/// Validate a Casbin policy file
///
/// Every non-blank, non-comment line must split into at least two
/// comma-separated fields. An empty policy is valid.
///
/// # Examples
///
/// ```rust
/// use casbin_cli::validation::validate_policy;
///
/// let outcome = validate_policy("does/not/exist.csv");
/// assert!(!outcome.is_valid);
/// assert!(outcome.message.contains("does/not/exist.csv"));
/// ```
pub fn validate_policy(path: impl AsRef<Path>) -> ValidationOutcome {
    match check_policy(path.as_ref()) {
        Ok(0) => ValidationOutcome::valid("Policy file is valid (no rules found)", 0),
        Ok(rules) => {
            ValidationOutcome::valid(format!("Policy file is valid ({} rules found)", rules), rules)
        }
        Err(err) => err.into(),
    }
}

/// Read a file's lines, yielding only the trimmed, meaningful ones
///
/// The file handle is dropped before this returns.
fn read_content_lines(path: &Path, kind: FileKind) -> Result<Vec<String>, ValidationError> {
    if !path.is_file() {
        return Err(ValidationError::NotFound {
            kind,
            path: path.display().to_string(),
        });
    }

    let content =
        std::fs::read_to_string(path).map_err(|source| ValidationError::Io { kind, source })?;

    Ok(content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(str::to_owned)
        .collect())
}

fn check_model(path: &Path) -> Result<(), ValidationError> {
    let lines = read_content_lines(path, FileKind::Model)?;

    let found: HashSet<&str> = lines
        .iter()
        .filter_map(|line| section_regex().captures(line))
        .filter_map(|caps| caps.get(1))
        .map(|m| m.as_str())
        .collect();

    let missing: Vec<String> = REQUIRED_SECTIONS
        .iter()
        .filter(|section| !found.contains(**section))
        .map(|section| section.to_string())
        .collect();

    if missing.is_empty() {
        Ok(())
    } else {
        Err(ValidationError::MissingSections(missing))
    }
}

fn check_policy(path: &Path) -> Result<usize, ValidationError> {
    let lines = read_content_lines(path, FileKind::Policy)?;

    let mut accepted = 0;
    for line in &lines {
        let fields: Vec<&str> = line.split(',').map(str::trim).collect();
        if fields.len() < 2 {
            return Err(ValidationError::MalformedLine(line.clone()));
        }
        accepted += 1;
    }

    Ok(accepted)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_temp(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    const BASIC_MODEL: &str = r#"
# access list
[request_definition]
r = sub, obj, act

[policy_definition]
p = sub, obj, act

[policy_effect]
e = some(where (p.eft == allow))

[matchers]
m = r.sub == p.sub && r.obj == p.obj && r.act == p.act
"#;

    #[test]
    fn test_valid_model() {
        let file = write_temp(BASIC_MODEL);
        let outcome = validate_model(file.path());
        assert!(outcome.is_valid);
        assert_eq!(outcome.message, "Model file is valid");
    }

    #[test]
    fn test_model_missing_sections_are_listed_in_order() {
        let file = write_temp("[request_definition]\nr = sub, obj, act\n[policy_effect]\n");
        let outcome = validate_model(file.path());
        assert!(!outcome.is_valid);
        assert_eq!(
            outcome.message,
            "Missing required sections: policy_definition, matchers"
        );
    }

    #[test]
    fn test_commented_section_header_does_not_count() {
        let model = BASIC_MODEL.replace("[matchers]", "# [matchers]");
        let file = write_temp(&model);
        let outcome = validate_model(file.path());
        assert!(!outcome.is_valid);
        assert!(outcome.message.ends_with("matchers"));
    }

    #[test]
    fn test_model_not_found() {
        let outcome = validate_model("no_such_model.conf");
        assert!(!outcome.is_valid);
        assert_eq!(outcome.message, "Model file not found: no_such_model.conf");
    }

    #[test]
    fn test_directory_is_not_a_file() {
        let dir = tempfile::tempdir().unwrap();
        let outcome = validate_policy(dir.path());
        assert!(!outcome.is_valid);
        assert!(outcome.message.starts_with("Policy file not found"));
    }

    #[test]
    fn test_policy_counts_rules() {
        let file = write_temp("p, alice, data1, read\n\n# comment\np, bob, data2, write\n");
        let outcome = validate_policy(file.path());
        assert!(outcome.is_valid);
        assert_eq!(outcome.rules, 2);
        assert_eq!(outcome.message, "Policy file is valid (2 rules found)");
    }

    #[test]
    fn test_empty_policy_is_valid() {
        let file = write_temp("# nothing yet\n\n");
        let outcome = validate_policy(file.path());
        assert!(outcome.is_valid);
        assert_eq!(outcome.message, "Policy file is valid (no rules found)");
    }

    #[test]
    fn test_first_malformed_policy_line_is_reported() {
        let file = write_temp("p, alice, data1, read\nbroken\nalso-broken\n");
        let outcome = validate_policy(file.path());
        assert!(!outcome.is_valid);
        assert_eq!(outcome.message, "Invalid policy line: broken");
    }
}
