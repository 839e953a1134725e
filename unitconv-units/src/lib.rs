//! Unitconv Units - catalog, lookup and conversion
//!
//! Queries look like `4, km` (every unit of the category) or
//! `4, km, mile` (one target unit). Unit names may be misspelled or
//! abbreviated; see [`QueryParser`] for the resolution order.

mod catalog;
mod suggest;
mod resolve;
mod convert;
mod parse;
mod help;

pub use catalog::{Category, DatasetError, ResolvedUnit, UnitCatalog, UnitEntry};
pub use suggest::{edit_distance, suggest};
pub use resolve::FormulaResolver;
pub use convert::{ConversionResult, Converter};
pub use parse::{Notice, ParsedQuery, QueryParser, Resolution, ResolvedQuery, MAX_LISTED_SUGGESTIONS, SEPARATOR};
pub use help::CategoryHelp;

use std::path::Path;

use serde::Serialize;
use unitconv_core::QueryError;

/// Everything a successful query produced
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QueryOutcome {
    pub value: f64,
    pub source: ResolvedUnit,
    /// Substitutions made while resolving unit names
    pub notices: Vec<Notice>,
    /// One entry for `value, from, to`, one per other unit for `value, unit`
    pub results: Vec<ConversionResult>,
    /// Whether the query named a target unit
    pub targeted: bool,
}

/// Main conversion engine
#[derive(Debug, Clone)]
pub struct UnitConverter {
    catalog: UnitCatalog,
}

impl UnitConverter {
    pub fn new(catalog: UnitCatalog) -> Self {
        Self { catalog }
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, DatasetError> {
        UnitCatalog::load(path).map(Self::new)
    }

    pub fn from_json_str(json: &str) -> Result<Self, DatasetError> {
        UnitCatalog::from_json_str(json).map(Self::new)
    }

    pub fn catalog(&self) -> &UnitCatalog {
        &self.catalog
    }

    pub fn parser(&self) -> QueryParser<'_> {
        QueryParser::new(&self.catalog)
    }

    pub fn converter(&self) -> Converter<'_> {
        Converter::new(&self.catalog)
    }

    /// Converted value formatted for display, or `"N/A"`
    pub fn convert(&self, value: f64, from: &str, to: &str, category: &str) -> String {
        self.converter().convert(value, from, to, category)
    }

    /// Every other unit of `category`, in catalog order
    pub fn convert_all(&self, value: f64, unit: &str, category: &str) -> Vec<ConversionResult> {
        self.converter().convert_all(value, &ResolvedUnit::new(unit, category))
    }

    pub fn help(&self, query: Option<&str>) -> CategoryHelp {
        self.catalog.help(query)
    }

    /// Parse, resolve and evaluate one query line
    pub fn run(&self, query: &str) -> Result<QueryOutcome, QueryError> {
        let parsed = self.parser().parse(query)?;
        let converter = self.converter();

        let (results, targeted) = match &parsed.query {
            ResolvedQuery::Single { value, unit } => (converter.convert_all(*value, unit), false),
            ResolvedQuery::Pair { value, from, to } => (vec![converter.convert_pair(*value, from, to)], true),
        };

        Ok(QueryOutcome {
            value: parsed.query.value(),
            source: parsed.query.source().clone(),
            notices: parsed.notices,
            results,
            targeted,
        })
    }
}
