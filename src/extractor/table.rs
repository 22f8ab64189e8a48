//! Delimiter-separated rows (markdown tables, tab-separated text)

use super::numeric::parse_number;
use crate::types::DataPoint;

/// A line needs at least this many delimiter-separated fields to be a row
const MIN_FIELDS: usize = 3;

/// One delimiter-separated line, cells trimmed
#[derive(Debug, PartialEq)]
pub(crate) struct Row<'a> {
    cells: Vec<&'a str>,
}

impl<'a> Row<'a> {
    /// Category key taken from the first cell, list marker and bold stripped
    pub(crate) fn category(&self) -> &'a str {
        self.cells[0]
            .trim_start_matches(['-', '+'])
            .trim()
            .trim_matches('*')
            .trim()
    }

    /// Markdown alignment row such as `|---|:---:|`
    pub(crate) fn is_separator(&self) -> bool {
        self.cells.iter().all(|cell| {
            !cell.is_empty()
                && cell.contains('-')
                && cell.chars().all(|c| matches!(c, '-' | ':' | ' '))
        })
    }

    /// One point per parsable value cell, in column order
    ///
    /// Cells that do not parse are skipped.
    pub(crate) fn points(&self) -> Vec<DataPoint> {
        let category = self.category();
        self.cells[1..]
            .iter()
            .filter_map(|cell| parse_number(cell))
            .map(|value| DataPoint::new(category, value))
            .collect()
    }
}

/// Split `line` on `|` (preferred) or tab
///
/// The outer pipes of a markdown row are dropped, so `| 1月 | 4200 |` has
/// the cells `1月` and `4200`.
pub(crate) fn parse_row(line: &str) -> Option<Row<'_>> {
    let delimiter = if line.contains('|') {
        '|'
    } else if line.contains('\t') {
        '\t'
    } else {
        return None;
    };

    let fields: Vec<&str> = line.split(delimiter).map(str::trim).collect();
    if fields.len() < MIN_FIELDS {
        return None;
    }

    let mut cells = fields.as_slice();
    if delimiter == '|' {
        if let [first, rest @ ..] = cells
            && first.is_empty()
        {
            cells = rest;
        }
        if let [rest @ .., last] = cells
            && last.is_empty()
        {
            cells = rest;
        }
    }

    match cells {
        [first, _, ..] if !first.is_empty() => Some(Row {
            cells: cells.to_vec(),
        }),
        _ => None,
    }
}
