//! Conversion evaluation and result formatting

use serde::Serialize;
use tracing::debug;
use unitconv_core::{format_plain, format_result, QueryError, NOT_AVAILABLE};

use crate::catalog::{ResolvedUnit, UnitCatalog};
use crate::resolve::FormulaResolver;

/// One evaluated conversion
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConversionResult {
    /// Display string, `"N/A"` when no value could be computed
    pub formatted_value: String,
    /// Raw result, absent when unavailable
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<f64>,
    pub source_unit: String,
    pub target_unit: String,
    pub category: String,
    /// Formula text used, absent for self-conversion or missing formulas
    #[serde(skip_serializing_if = "Option::is_none")]
    pub formula: Option<String>,
}

impl ConversionResult {
    pub fn is_available(&self) -> bool {
        self.value.is_some()
    }
}

/// Applies catalog formulas to values
#[derive(Debug, Clone, Copy)]
pub struct Converter<'a> {
    catalog: &'a UnitCatalog,
    resolver: FormulaResolver<'a>,
}

impl<'a> Converter<'a> {
    pub fn new(catalog: &'a UnitCatalog) -> Self {
        Converter {
            catalog,
            resolver: FormulaResolver::new(catalog),
        }
    }

    /// Raw converted value. Missing formulas and evaluation faults are both
    /// `FormulaUnavailable`.
    pub fn evaluate(&self, n: f64, from: &str, to: &str, category: &str) -> Result<f64, QueryError> {
        let unavailable = || QueryError::FormulaUnavailable {
            from: from.to_string(),
            to: to.to_string(),
        };

        let formula = self.resolver.resolve(from, to, category).ok_or_else(unavailable)?;
        formula.eval(n).map_err(|e| {
            debug!(from, to, formula = formula.source(), error = %e, "formula evaluation failed");
            unavailable()
        })
    }

    /// Converted value formatted for display, or `"N/A"`
    pub fn convert(&self, n: f64, from: &str, to: &str, category: &str) -> String {
        self.evaluate(n, from, to, category)
            .ok()
            .and_then(format_result)
            .unwrap_or_else(|| NOT_AVAILABLE.to_string())
    }

    /// Convert between two resolved units. Same unit echoes the value back
    /// without touching the formula table.
    pub fn convert_pair(&self, n: f64, from: &ResolvedUnit, to: &ResolvedUnit) -> ConversionResult {
        if from.name == to.name {
            return ConversionResult {
                formatted_value: format_plain(n),
                value: Some(n),
                source_unit: from.name.clone(),
                target_unit: to.name.clone(),
                category: from.category.clone(),
                formula: None,
            };
        }

        let formula = self
            .resolver
            .resolve(&from.name, &to.name, &from.category)
            .map(|f| f.source().to_string());

        let value = self.evaluate(n, &from.name, &to.name, &from.category).ok();
        let formatted_value = value
            .and_then(format_result)
            .unwrap_or_else(|| NOT_AVAILABLE.to_string());

        ConversionResult {
            formatted_value,
            value,
            source_unit: from.name.clone(),
            target_unit: to.name.clone(),
            category: from.category.clone(),
            formula,
        }
    }

    /// Convert into every other unit of the source's category, in catalog order
    pub fn convert_all(&self, n: f64, from: &ResolvedUnit) -> Vec<ConversionResult> {
        let category = match self.catalog.category(&from.category) {
            Some(c) => c,
            None => return Vec::new(),
        };

        category
            .unit_names()
            .filter(|name| *name != from.name)
            .map(|name| self.convert_pair(n, from, &ResolvedUnit::new(name, &category.name)))
            .collect()
    }
}
