//! Unitconv Core - Fundamental types
//!
//! This crate provides the core types used throughout unitconv:
//! - `parse_value` / `format_result`: user numbers in, display strings out
//! - `Formula`: typed conversion expressions over the variable `n`
//! - `QueryError`: the failure taxonomy for a single query

mod number;
mod formula;
mod error;

pub use number::{NumberError, parse_value, format_result, format_scientific, format_plain, NOT_AVAILABLE};
pub use formula::{Formula, FormulaError, Expr, Op, Func, VARIABLE, MAX_DEPTH};
pub use error::{QueryError, Diagnostic, Severity, codes, INPUT_FORMAT, USAGE_TIP};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::{Formula, QueryError, Diagnostic, Severity};
    pub use crate::{parse_value, format_result};
    pub use crate::error::codes;
}
