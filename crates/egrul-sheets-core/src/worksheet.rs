//! Worksheet type

use std::collections::BTreeMap;

use crate::cell::{CellAddress, CellRange, CellValue};
use crate::error::{Error, Result};
use crate::number_format::NumberFormat;
use crate::{MAX_COLS, MAX_ROWS};

/// A worksheet (single sheet in a workbook)
///
/// Cells are stored sparsely in row-major order; an absent entry is an
/// empty cell. Number formats are kept apart from values and only for
/// cells whose format is not `General`.
#[derive(Debug, Clone, PartialEq)]
pub struct Worksheet {
    name: String,
    cells: BTreeMap<(u32, u16), CellValue>,
    formats: BTreeMap<(u32, u16), NumberFormat>,
}

impl Worksheet {
    /// Create a new worksheet with the given name
    pub fn new<S: Into<String>>(name: S) -> Self {
        Self {
            name: name.into(),
            cells: BTreeMap::new(),
            formats: BTreeMap::new(),
        }
    }

    /// Get the sheet name
    pub fn name(&self) -> &str {
        &self.name
    }

    // === Cell Access ===

    /// Get cell value by address string (e.g., "E2")
    pub fn get_value(&self, address: &str) -> Result<CellValue> {
        let addr = CellAddress::parse(address)?;
        Ok(self.get_value_at(addr.row, addr.col))
    }

    /// Get cell value by indices
    pub fn get_value_at(&self, row: u32, col: u16) -> CellValue {
        self.cells.get(&(row, col)).cloned().unwrap_or_default()
    }

    /// Borrow a cell value by indices, `None` for empty cells
    pub fn value_ref_at(&self, row: u32, col: u16) -> Option<&CellValue> {
        self.cells.get(&(row, col))
    }

    /// Set cell value by address string
    pub fn set_cell_value<V: Into<CellValue>>(&mut self, address: &str, value: V) -> Result<()> {
        let addr = CellAddress::parse(address)?;
        self.set_cell_value_at(addr.row, addr.col, value)
    }

    /// Set cell value by indices; setting [`CellValue::Empty`] clears the cell
    pub fn set_cell_value_at<V: Into<CellValue>>(
        &mut self,
        row: u32,
        col: u16,
        value: V,
    ) -> Result<()> {
        if row >= MAX_ROWS {
            return Err(Error::RowOutOfBounds(row, MAX_ROWS - 1));
        }
        if col >= MAX_COLS {
            return Err(Error::ColumnOutOfBounds(col as u32, MAX_COLS - 1));
        }

        let value = value.into();
        if value.is_empty() {
            self.cells.remove(&(row, col));
        } else {
            self.cells.insert((row, col), value);
        }
        Ok(())
    }

    /// Clear a cell by indices, value and format
    pub fn clear_cell_at(&mut self, row: u32, col: u16) {
        self.cells.remove(&(row, col));
        self.formats.remove(&(row, col));
    }

    // === Number Formats ===

    /// Number format of a cell
    pub fn number_format_at(&self, row: u32, col: u16) -> &NumberFormat {
        static GENERAL: NumberFormat = NumberFormat::General;
        self.formats.get(&(row, col)).unwrap_or(&GENERAL)
    }

    /// Set the number format of a cell; `General` removes it
    pub fn set_number_format_at(
        &mut self,
        row: u32,
        col: u16,
        format: NumberFormat,
    ) -> Result<()> {
        if row >= MAX_ROWS {
            return Err(Error::RowOutOfBounds(row, MAX_ROWS - 1));
        }
        if col >= MAX_COLS {
            return Err(Error::ColumnOutOfBounds(col as u32, MAX_COLS - 1));
        }

        if format.is_general() {
            self.formats.remove(&(row, col));
        } else {
            self.formats.insert((row, col), format);
        }
        Ok(())
    }

    /// Non-general formats of this sheet's cells, one entry per cell
    pub fn number_formats(&self) -> impl Iterator<Item = &NumberFormat> {
        self.formats.values()
    }

    /// Number of non-empty cells
    pub fn cell_count(&self) -> usize {
        self.cells.len()
    }

    /// Iterate over non-empty cells in row-major order
    pub fn iter_cells(&self) -> impl Iterator<Item = (u32, u16, &CellValue)> {
        self.cells.iter().map(|(&(row, col), value)| (row, col, value))
    }

    // === Range Operations ===

    /// Get the used range (bounds of all non-empty cells)
    pub fn used_range(&self) -> Option<CellRange> {
        let (&(min_row, _), _) = self.cells.iter().next()?;
        let (&(max_row, _), _) = self.cells.iter().next_back()?;
        let min_col = self.cells.keys().map(|&(_, c)| c).min()?;
        let max_col = self.cells.keys().map(|&(_, c)| c).max()?;

        Some(CellRange::from_indices(min_row, min_col, max_row, max_col))
    }

    /// Last used row index, if any
    pub fn max_row(&self) -> Option<u32> {
        self.cells.keys().next_back().map(|&(row, _)| row)
    }

    /// Last used column index, if any
    pub fn max_col(&self) -> Option<u16> {
        self.cells.keys().map(|&(_, col)| col).max()
    }
}
