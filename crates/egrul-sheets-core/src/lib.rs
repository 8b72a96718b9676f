//! # egrul-sheets-core
//!
//! Core data structures for the egrul-sheets workbook tooling.
//!
//! This crate provides the in-memory model the readers, writers and the
//! enrichment pipeline share:
//! - [`CellValue`] - Represents cell values (numbers, strings, booleans, errors, formulas)
//! - [`CellAddress`] and [`CellRange`] - Cell addressing and ranges
//! - [`NumberFormat`] - Number formats carried from cell styles (dates)
//! - [`Workbook`], [`Worksheet`] - The document structures
//!
//! ## Example
//!
//! ```rust
//! use egrul_sheets_core::{CellValue, Workbook};
//!
//! let mut workbook = Workbook::new();
//! let sheet = workbook.worksheet_mut(0).unwrap();
//!
//! sheet.set_cell_value("A1", "ИНН").unwrap();
//! sheet.set_cell_value_at(1, 0, CellValue::Number(7707083893.0)).unwrap();
//!
//! assert_eq!(sheet.get_value_at(1, 0).to_text(), "7707083893");
//! ```

pub mod cell;
pub mod error;
pub mod number_format;
pub mod workbook;
pub mod worksheet;

pub use cell::{CellAddress, CellError, CellRange, CellValue, SharedString};
pub use error::{Error, Result};
pub use number_format::NumberFormat;
pub use workbook::Workbook;
pub use worksheet::Worksheet;

/// Maximum number of rows in a worksheet (Excel limit)
pub const MAX_ROWS: u32 = 1_048_576;

/// Maximum number of columns in a worksheet (Excel limit)
pub const MAX_COLS: u16 = 16_384;

/// Maximum length of a sheet name
pub const MAX_SHEET_NAME_LEN: usize = 31;
