use std::ops::Range;

use anyhow::Result;
use thiserror::Error;

use super::Form;

#[derive(Error, Debug)]
#[error("row {row_idx} has {found} cells, expected {expected}")]
pub struct RaggedPlatError {
    pub row_idx: usize,
    pub expected: usize,
    pub found: usize,
}

#[derive(Error, Debug)]
#[error("row {row_idx} is empty; every row needs at least a label cell")]
pub struct EmptyRowError {
    pub row_idx: usize,
}

/// One microclass: a label cell at column 0 followed by one form per
/// plat column. Column indices are shared across all rows of a plat.
#[derive(Clone, Debug)]
pub struct Row {
    cells: Vec<Form>,
}

impl Row {
    pub fn new(cells: Vec<Form>) -> Self {
        Row { cells }
    }

    pub fn width(&self) -> usize {
        self.cells.len()
    }

    pub fn label(&self) -> &Form {
        &self.cells[0]
    }

    pub fn form(&self, column: usize) -> &Form {
        &self.cells[column]
    }

    /// The non-label column indices of this row.
    pub fn columns(&self) -> Range<usize> {
        1..self.cells.len()
    }

    /// The non-label forms, in column order.
    pub fn forms(&self) -> &[Form] {
        &self.cells[1..]
    }
}

/// A full paradigm table: one row per microclass, rectangular, with
/// stable column identity across rows. Read-only for the lifetime of a
/// run.
#[derive(Clone, Debug)]
pub struct Plat {
    rows: Vec<Row>,
}

impl Plat {
    pub fn new(rows: Vec<Row>) -> Result<Self> {
        let expected = match rows.first() {
            Some(first) => first.width(),
            None => return Ok(Plat { rows }),
        };

        for (row_idx, row) in rows.iter().enumerate() {
            if row.width() == 0 {
                return Err(EmptyRowError { row_idx }.into());
            }
            if row.width() != expected {
                return Err(RaggedPlatError {
                    row_idx,
                    expected,
                    found: row.width(),
                }
                .into());
            }
        }

        Ok(Plat { rows })
    }

    pub fn num_rows(&self) -> usize {
        self.rows.len()
    }

    pub fn width(&self) -> usize {
        self.rows.first().map_or(0, Row::width)
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn row(&self, row_idx: usize) -> &Row {
        &self.rows[row_idx]
    }

    /// The non-label column indices shared by every row.
    pub fn columns(&self) -> Range<usize> {
        1..self.width()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(cells: &[&str]) -> Row {
        Row::new(cells.iter().map(|c| Form::new(c)).collect())
    }

    #[test]
    fn test_rectangular_plat() {
        let plat = Plat::new(vec![
            row(&["a", "sing", "sang"]),
            row(&["b", "ring", "rang"]),
        ])
        .unwrap();

        assert_eq!(plat.num_rows(), 2);
        assert_eq!(plat.width(), 3);
        assert_eq!(plat.columns().collect::<Vec<_>>(), vec![1, 2]);
        assert_eq!(plat.row(1).label(), &Form::new("b"));
        assert_eq!(plat.row(1).form(2), &Form::new("rang"));
    }

    #[test]
    fn test_ragged_plat_is_rejected() {
        let result = Plat::new(vec![row(&["a", "sing", "sang"]), row(&["b", "ring"])]);
        assert!(result.is_err());
    }

    #[test]
    fn test_empty_plat() {
        let plat = Plat::new(vec![]).unwrap();
        assert_eq!(plat.num_rows(), 0);
        assert_eq!(plat.columns().count(), 0);
    }
}
