//! Structured query errors
//!
//! Every failure a query can hit is a `QueryError` variant. Errors never end
//! the session: the caller reports them and waits for the next query. Each
//! variant carries a machine-readable code, a human-readable message and,
//! where useful, a hint on how to fix the input.

use crate::NumberError;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Expected query layout, shown with unit errors
pub const INPUT_FORMAT: &str = "\
Input Format: Number, ConvertFrom, *ConvertTo
          or: help *Category
(* ConvertTo & Category are optional)";

/// Short usage examples, shown with empty input
pub const USAGE_TIP: &str = "\
Enter any of the following:
  4, km
  4, kilometer
  4, kilometer, mile
  help
  help mass";

/// Standard error codes (machine-readable)
pub mod codes {
    pub const INPUT_EMPTY: &str = "INPUT_EMPTY";
    pub const SEPARATOR_MISSING: &str = "SEPARATOR_MISSING";
    pub const TOO_MANY_SEPARATORS: &str = "TOO_MANY_SEPARATORS";
    pub const VALUE_EMPTY: &str = "VALUE_EMPTY";
    pub const VALUE_INVALID: &str = "VALUE_INVALID";
    pub const UNIT_EMPTY: &str = "UNIT_EMPTY";
    pub const UNIT_INVALID: &str = "UNIT_INVALID";
    pub const AMBIGUOUS_UNIT: &str = "AMBIGUOUS_UNIT";
    pub const TOO_MANY_MATCHES: &str = "TOO_MANY_MATCHES";
    pub const CATEGORY_MISMATCH: &str = "CATEGORY_MISMATCH";
    pub const FORMULA_UNAVAILABLE: &str = "FORMULA_UNAVAILABLE";
    pub const DATASET_UNAVAILABLE: &str = "DATASET_UNAVAILABLE";
}

/// Severity level of an error
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Query answered with a degraded value ("N/A")
    Warning,
    /// Query rejected, retype and try again
    Error,
    /// Process cannot start
    Fatal,
}

/// Failure of a single query
#[derive(Debug, Clone, PartialEq, Error, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum QueryError {
    #[error("Input Error! Input can't be empty.")]
    InputEmpty,

    #[error("Comma Missing! Separate value and its unit with a comma.")]
    SeparatorMissing,

    #[error("Multiple Commas! Only one or max two commas are allowed, found {count}.")]
    TooManySeparators { count: usize },

    #[error("Value Error! Value can't be empty.")]
    ValueEmpty,

    #[error("Value Error! '{value}' is not a valid number.")]
    ValueInvalid { value: String },

    #[error("Unit Error! Unit at position {position} can't be empty.")]
    UnitEmpty { position: usize },

    #[error("Unit Error! '{unit}' is either not available or is invalid.")]
    UnitInvalid { unit: String },

    #[error("Unit Error! Unit '{unit}' not found! Suggestions: {}", .suggestions.join(", "))]
    AmbiguousUnit { unit: String, suggestions: Vec<String> },

    #[error("There are {count} related items to your query '{unit}'. Please be more specific.")]
    TooManyMatches { unit: String, count: usize },

    #[error("Invalid Units! Expecting both units of same category, found ({first}, {second}).")]
    CategoryMismatch { first: String, second: String },

    #[error("Formula from '{from}' to '{to}' is not available.")]
    FormulaUnavailable { from: String, to: String },
}

impl QueryError {
    /// Machine-readable code
    pub fn code(&self) -> &'static str {
        match self {
            QueryError::InputEmpty => codes::INPUT_EMPTY,
            QueryError::SeparatorMissing => codes::SEPARATOR_MISSING,
            QueryError::TooManySeparators { .. } => codes::TOO_MANY_SEPARATORS,
            QueryError::ValueEmpty => codes::VALUE_EMPTY,
            QueryError::ValueInvalid { .. } => codes::VALUE_INVALID,
            QueryError::UnitEmpty { .. } => codes::UNIT_EMPTY,
            QueryError::UnitInvalid { .. } => codes::UNIT_INVALID,
            QueryError::AmbiguousUnit { .. } => codes::AMBIGUOUS_UNIT,
            QueryError::TooManyMatches { .. } => codes::TOO_MANY_MATCHES,
            QueryError::CategoryMismatch { .. } => codes::CATEGORY_MISMATCH,
            QueryError::FormulaUnavailable { .. } => codes::FORMULA_UNAVAILABLE,
        }
    }

    /// Suggestion for fixing the input, if there is a useful one
    pub fn hint(&self) -> Option<&'static str> {
        match self {
            QueryError::InputEmpty => Some(USAGE_TIP),
            QueryError::SeparatorMissing => Some("Like: 1, km"),
            QueryError::ValueEmpty => Some("Tip: Enter 1, km"),
            QueryError::UnitEmpty { .. } => Some(INPUT_FORMAT),
            QueryError::AmbiguousUnit { .. } => Some("Retype the query using one of the suggestions"),
            QueryError::CategoryMismatch { .. } => Some("Enter 'help <category>' to list its units"),
            _ => None,
        }
    }

    pub fn severity(&self) -> Severity {
        match self {
            QueryError::FormulaUnavailable { .. } => Severity::Warning,
            _ => Severity::Error,
        }
    }
}

impl From<NumberError> for QueryError {
    fn from(err: NumberError) -> Self {
        match err {
            NumberError::Empty => QueryError::ValueEmpty,
            NumberError::Invalid(value) => QueryError::ValueInvalid { value },
        }
    }
}

/// Flattened error report, ready for display or JSON output
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Diagnostic {
    /// Machine-readable error code
    pub code: String,

    /// Human-readable error message
    pub message: String,

    /// Suggestion for fixing the error
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,

    pub severity: Severity,
}

impl Diagnostic {
    pub fn new(code: impl Into<String>, message: impl Into<String>, severity: Severity) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            hint: None,
            severity,
        }
    }

    /// Builder: add hint
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }

    /// Report for a dataset that could not be loaded
    pub fn dataset_unavailable(details: impl Into<String>) -> Self {
        Self::new(
            codes::DATASET_UNAVAILABLE,
            format!("Dataset Error: {}", details.into()),
            Severity::Fatal,
        )
        .with_hint("Point UNITCONV_DATASET at a valid dataset file")
    }
}

impl From<&QueryError> for Diagnostic {
    fn from(err: &QueryError) -> Self {
        let diagnostic = Diagnostic::new(err.code(), err.to_string(), err.severity());
        match err.hint() {
            Some(hint) => diagnostic.with_hint(hint),
            None => diagnostic,
        }
    }
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)?;
        if let Some(ref hint) = self.hint {
            write!(f, "\n{}", hint)?;
        }
        Ok(())
    }
}
