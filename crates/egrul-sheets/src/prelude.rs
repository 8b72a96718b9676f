//! Prelude module for convenient imports
//!
//! ```rust
//! use egrul_sheets::prelude::*;
//! ```

pub use egrul_sheets_core::{CellAddress, CellRange, CellValue, Workbook, Worksheet};

pub use egrul_sheets_xlsx::{WriteOptions, XlsxReader, XlsxWriter};

pub use egrul_client::{DirectorLookup, EgrulClient, EgrulConfig};

pub use crate::enrich::{EnrichOptions, EnrichReport, Enricher};
pub use crate::table::SheetTable;
pub use crate::WorkbookExt;
