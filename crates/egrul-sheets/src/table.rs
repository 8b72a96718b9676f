//! Header-row view over a worksheet
//!
//! Registry exports are plain tables: the first row names the columns and
//! every following row is one record. Columns start at A even when the
//! leftmost columns are empty, so positional references ("the fifth column")
//! match what a user sees in Excel.

use std::collections::HashSet;

use egrul_sheets_core::{CellValue, Worksheet};

/// Column names and record rows of a worksheet
#[derive(Debug, Clone)]
pub struct SheetTable<'a> {
    sheet: &'a Worksheet,
    columns: Vec<String>,
    row_count: u32,
}

impl<'a> SheetTable<'a> {
    /// Build the table view; row 1 is the header
    pub fn from_worksheet(sheet: &'a Worksheet) -> Self {
        let width = sheet.max_col().map_or(0, |c| c as usize + 1);
        let row_count = sheet.max_row().unwrap_or(0);

        let mut seen = HashSet::new();
        let columns = (0..width)
            .map(|col| {
                let header = sheet
                    .value_ref_at(0, col as u16)
                    .filter(|v| !v.is_blank())
                    .map(CellValue::to_text)
                    .unwrap_or_else(|| format!("Unnamed: {}", col));
                dedup_name(&mut seen, header)
            })
            .collect();

        Self {
            sheet,
            columns,
            row_count,
        }
    }

    /// Column names in sheet order
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Number of record rows (excluding the header)
    pub fn row_count(&self) -> u32 {
        self.row_count
    }

    /// 0-based index of the column with this exact name
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// Value of record `row` (0-based, header excluded) in column `col`
    pub fn value(&self, row: u32, col: usize) -> Option<&'a CellValue> {
        let col = u16::try_from(col).ok()?;
        self.sheet.value_ref_at(row + 1, col)
    }
}

/// Repeated header names get `.1`, `.2`, ... suffixes
fn dedup_name(seen: &mut HashSet<String>, name: String) -> String {
    if seen.insert(name.clone()) {
        return name;
    }
    let mut n = 1;
    loop {
        let candidate = format!("{}.{}", name, n);
        if seen.insert(candidate.clone()) {
            return candidate;
        }
        n += 1;
    }
}
