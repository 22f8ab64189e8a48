//! Heuristic text-to-dataset extraction
//!
//! Turns the free-form markdown produced by the OCR stage into three
//! chart-ready series. The input is walked line by line, in order, and each
//! line goes through independent passes:
//!
//! 1. **sections** - keyword lines (`销售额`, `增长率`, `产品`, ...) set a
//!    sticky tag deciding which series the following rows feed
//! 2. **table** - `|` or tab separated rows under a tagged section become one
//!    point per numeric column, keyed by the first cell
//! 3. **inline** - `label: value unit` lines always feed the sales series,
//!    whatever the current section
//!
//! Extraction never fails. Text without recognizable structure yields empty
//! datasets; what to show instead is up to the presentation layer.
//!
//! # Example
//!
//! ```
//! use docviz_client::extractor::extract;
//!
//! let datasets = extract("1月: 4200万元\n2月: 5800万元");
//! assert_eq!(datasets.sales.len(), 2);
//! assert!(datasets.growth.is_empty());
//! ```

mod inline;
mod numeric;
mod sections;
mod table;

use serde::{Deserialize, Serialize};

use crate::types::Dataset;
use sections::Section;

/// Label of the sales/revenue series
pub const SALES_LABEL: &str = "sales";
/// Label of the growth-rate series
pub const GROWTH_LABEL: &str = "growth";
/// Label of the per-category series
pub const CATEGORY_LABEL: &str = "category";

/// The three series extracted from one text
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ExtractedDatasets {
    /// Revenue/sales figures, including every inline `label: value` line
    pub sales: Dataset,
    /// Growth-rate figures
    pub growth: Dataset,
    /// Per-product or per-category figures
    pub category: Dataset,
}

impl Default for ExtractedDatasets {
    fn default() -> Self {
        Self {
            sales: Dataset::new(SALES_LABEL),
            growth: Dataset::new(GROWTH_LABEL),
            category: Dataset::new(CATEGORY_LABEL),
        }
    }
}

impl ExtractedDatasets {
    /// True when no series received a single point
    pub fn is_empty(&self) -> bool {
        self.sales.is_empty() && self.growth.is_empty() && self.category.is_empty()
    }

    /// All three series, in sales/growth/category order
    pub fn datasets(&self) -> [&Dataset; 3] {
        [&self.sales, &self.growth, &self.category]
    }

    fn series_mut(&mut self, section: Section) -> Option<&mut Dataset> {
        match section {
            Section::None => None,
            Section::Sales => Some(&mut self.sales),
            Section::Growth => Some(&mut self.growth),
            Section::Category => Some(&mut self.category),
        }
    }
}

/// Extract sales, growth and category series from raw OCR text
///
/// Pure and deterministic: the same input always produces the same
/// datasets. Duplicate categories are kept in encounter order.
pub fn extract(raw_text: &str) -> ExtractedDatasets {
    let mut out = ExtractedDatasets::default();
    let mut section = Section::None;

    for line in raw_text.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        match table::parse_row(line) {
            Some(row) if row.is_separator() => {}
            Some(row) => {
                let points = row.points();
                if points.is_empty() {
                    // Header row: may name the series of the rows below it
                    if let Some(tagged) = sections::detect_section(line) {
                        section = tagged;
                    }
                } else if let Some(series) = out.series_mut(section) {
                    series.points.extend(points);
                }
            }
            None => {
                if let Some(tagged) = sections::detect_section(line) {
                    section = tagged;
                }
            }
        }

        if let Some(point) = inline::parse_inline(line) {
            out.sales.points.push(point);
        }
    }

    tracing::debug!(
        sales = out.sales.len(),
        growth = out.growth.len(),
        category = out.category.len(),
        "extracted datasets"
    );
    out
}
