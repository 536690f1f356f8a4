//! Errors produced while running declarations: positioned DSL errors, their
//! aggregate, validation collections, and engine-internal failures.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::panic::Location;

// ──────────────────────────────────────────────
// Provenance
// ──────────────────────────────────────────────

/// Source location of a declaration, captured at the call site of a
/// construction function.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Provenance {
    pub file: String,
    pub line: u32,
}

impl Provenance {
    pub fn new(file: impl Into<String>, line: u32) -> Self {
        Provenance {
            file: file.into(),
            line,
        }
    }

    /// Location of the first caller outside `#[track_caller]` frames.
    #[track_caller]
    pub fn caller() -> Self {
        let loc = Location::caller();
        Provenance {
            file: loc.file().to_owned(),
            line: loc.line(),
        }
    }
}

impl fmt::Display for Provenance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.file, self.line)
    }
}

// ──────────────────────────────────────────────
// DSL errors
// ──────────────────────────────────────────────

/// Engine pass an error was reported in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    Run,
    Validate,
    Finalize,
}

/// A single declaration or validation error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DslError {
    pub phase: Phase,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
    pub file: String,
    pub line: u32,
    pub message: String,
}

impl DslError {
    pub fn new(
        phase: Phase,
        context: Option<&str>,
        prov: Option<&Provenance>,
        message: impl Into<String>,
    ) -> Self {
        DslError {
            phase,
            context: context.map(str::to_owned),
            file: prov.map(|p| p.file.clone()).unwrap_or_default(),
            line: prov.map(|p| p.line).unwrap_or(0),
            message: message.into(),
        }
    }

    /// Serialize with every field present (null for a missing context).
    pub fn to_json_value(&self) -> serde_json::Value {
        serde_json::json!({
            "context": self.context,
            "file":    self.file,
            "line":    self.line,
            "message": self.message,
            "phase":   self.phase,
        })
    }
}

impl fmt::Display for DslError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.file.is_empty() {
            write!(f, "[{}:{}] ", self.file, self.line)?;
        }
        match &self.context {
            Some(ctx) => write!(f, "{} in {}", self.message, ctx),
            None => write!(f, "{} (top level)", self.message),
        }
    }
}

/// Aggregate of every error collected during a run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Errors(Vec<DslError>);

impl Errors {
    pub fn new() -> Self {
        Errors(Vec::new())
    }

    pub fn push(&mut self, err: DslError) {
        self.0.push(err);
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, DslError> {
        self.0.iter()
    }

    pub fn clear(&mut self) {
        self.0.clear();
    }

    pub fn as_slice(&self) -> &[DslError] {
        &self.0
    }

    pub fn into_vec(self) -> Vec<DslError> {
        self.0
    }
}

impl fmt::Display for Errors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, err) in self.0.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{}", err)?;
        }
        Ok(())
    }
}

impl std::error::Error for Errors {}

impl IntoIterator for Errors {
    type Item = DslError;
    type IntoIter = std::vec::IntoIter<DslError>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a Errors {
    type Item = &'a DslError;
    type IntoIter = std::slice::Iter<'a, DslError>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

// ──────────────────────────────────────────────
// Validation errors
// ──────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub struct ValidationEntry {
    pub context: String,
    pub message: String,
    pub prov: Option<Provenance>,
}

/// Problems found by a definition's validation hook. Validation keeps going
/// after the first problem so every entry reaches the caller.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ValidationErrors {
    entries: Vec<ValidationEntry>,
}

impl ValidationErrors {
    pub fn new() -> Self {
        ValidationErrors::default()
    }

    pub fn add(
        &mut self,
        context: impl Into<String>,
        prov: Option<&Provenance>,
        message: impl Into<String>,
    ) {
        self.entries.push(ValidationEntry {
            context: context.into(),
            message: message.into(),
            prov: prov.cloned(),
        });
    }

    pub fn merge(&mut self, other: ValidationErrors) {
        self.entries.extend(other.entries);
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ValidationEntry> {
        self.entries.iter()
    }

    pub fn into_result(self) -> Result<(), ValidationErrors> {
        if self.entries.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, e) in self.entries.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{}: {}", e.context, e.message)?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationErrors {}

impl IntoIterator for ValidationErrors {
    type Item = ValidationEntry;
    type IntoIter = std::vec::IntoIter<ValidationEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

// ──────────────────────────────────────────────
// Engine errors
// ──────────────────────────────────────────────

/// Failures of a run. Everything but `Dsl` stops processing immediately.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("root {0:?} is already registered")]
    DuplicateRoot(String),

    #[error("root {root:?} depends on unregistered root {dependency:?}")]
    UnknownDependency { root: String, dependency: String },

    #[error("dependency cycle: {first:?} and {second:?} depend on each other")]
    DependencyCycle { first: String, second: String },

    #[error("too many generated roots, infinite loop? (gave up after {sweeps} sweeps)")]
    TooManyRoots { sweeps: usize },

    #[error("too many generated definitions in root {root:?}, infinite loop? (gave up after {iterations} iterations)")]
    TooManyDefinitions { root: String, iterations: usize },

    #[error("{0}")]
    Dsl(Errors),
}

impl EngineError {
    /// The collected declaration/validation errors, if this is an aggregate.
    pub fn errors(&self) -> Option<&Errors> {
        match self {
            EngineError::Dsl(errs) => Some(errs),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_includes_location_and_context() {
        let prov = Provenance::new("design.rs", 12);
        let err = DslError::new(Phase::Run, Some("type \"A\""), Some(&prov), "unknown type \"C\"");
        assert_eq!(
            err.to_string(),
            "[design.rs:12] unknown type \"C\" in type \"A\""
        );
    }

    #[test]
    fn display_marks_top_level_errors() {
        let prov = Provenance::new("design.rs", 3);
        let err = DslError::new(Phase::Run, None, Some(&prov), "multiple API definitions");
        assert_eq!(
            err.to_string(),
            "[design.rs:3] multiple API definitions (top level)"
        );
    }

    #[test]
    fn aggregate_joins_entries_with_newlines() {
        let mut errs = Errors::new();
        errs.push(DslError::new(Phase::Run, None, None, "first"));
        errs.push(DslError::new(Phase::Validate, Some("resource \"r\""), None, "second"));
        assert_eq!(errs.to_string(), "first (top level)\nsecond in resource \"r\"");
        assert_eq!(errs.len(), 2);
    }

    #[test]
    fn caller_points_at_this_file() {
        let prov = Provenance::caller();
        assert!(prov.file.ends_with("error.rs"));
    }

    #[test]
    fn json_value_always_has_every_field() {
        let err = DslError::new(Phase::Validate, None, None, "boom");
        let v = err.to_json_value();
        assert!(v.get("context").unwrap().is_null());
        assert_eq!(v["phase"], "validate");
        assert_eq!(v["line"], 0);
    }

    #[test]
    fn validation_errors_into_result() {
        assert!(ValidationErrors::new().into_result().is_ok());
        let mut verr = ValidationErrors::new();
        verr.add("type \"A\"", None, "type name cannot be empty");
        let err = verr.into_result().unwrap_err();
        assert_eq!(err.to_string(), "type \"A\": type name cannot be empty");
    }
}
