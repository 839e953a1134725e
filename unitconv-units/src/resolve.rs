//! Formula lookup between two units of one category

use crate::catalog::UnitCatalog;
use unitconv_core::Formula;

/// Finds the formula converting one unit into another
#[derive(Debug, Clone, Copy)]
pub struct FormulaResolver<'a> {
    catalog: &'a UnitCatalog,
}

impl<'a> FormulaResolver<'a> {
    pub fn new(catalog: &'a UnitCatalog) -> Self {
        FormulaResolver { catalog }
    }

    /// Formula for `from -> to` inside `category`, by exact unit names.
    ///
    /// A unit's list skips its own slot, so a target positioned after the
    /// source sits one index to the left. Returns `None` for unknown names,
    /// `from == to`, or a slot without a formula.
    pub fn resolve(&self, from: &str, to: &str, category: &str) -> Option<&'a Formula> {
        let category = self.catalog.category(category)?;
        let p1 = category.position(from)?;
        let p2 = category.position(to)?;

        if p1 == p2 {
            return None;
        }

        let idx = if p1 < p2 { p2 - 1 } else { p2 };
        category.units[p1].formulas.get(idx)?.as_ref()
    }
}
