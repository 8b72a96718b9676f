//! # egrul-sheets
//!
//! Fill an organisation registry spreadsheet with the names of the people
//! heading each organisation, as recorded in the Unified State Register of
//! Legal Entities (EGRUL).
//!
//! The registry is read as a table (first row = column names), the INN of
//! every record is taken from a fixed column, looked up through a
//! [`DirectorLookup`], and the names are written to a `ФИО` column.
//!
//! ## Example
//!
//! ```rust,no_run
//! use egrul_sheets::prelude::*;
//! use std::path::Path;
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let client = EgrulClient::new(EgrulConfig::default())?;
//! let enricher = Enricher::new(client, EnrichOptions::default());
//!
//! let input = Path::new("registry.xlsx");
//! let output = egrul_sheets::output_path_for(input);
//! let report = enricher.enrich_file(input, &output).await?;
//! println!("{} of {} rows filled", report.filled, report.rows);
//! # Ok(())
//! # }
//! ```

pub mod enrich;
pub mod prelude;
pub mod table;

pub use enrich::{
    output_path_for, EnrichError, EnrichOptions, EnrichReport, Enricher, DEFAULT_FIO_COLUMN,
};
pub use table::SheetTable;

pub use egrul_client::{DirectorLookup, EgrulClient, EgrulConfig, EgrulError, DEFAULT_BASE_URL};
pub use egrul_sheets_core::{
    CellAddress, CellError, CellRange, CellValue, Error, Result, Workbook, Worksheet,
};
pub use egrul_sheets_xlsx::{WriteOptions, XlsxError, XlsxReader, XlsxWriter};

use std::path::Path;

/// Extension trait for Workbook to add file I/O
pub trait WorkbookExt {
    /// Open a workbook from a file
    fn open<P: AsRef<Path>>(path: P) -> Result<Workbook>;

    /// Save the workbook to a file
    fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        self.save_with_options(path, &WriteOptions::default())
    }

    /// Save the workbook to a file with explicit writer options
    fn save_with_options<P: AsRef<Path>>(&self, path: P, options: &WriteOptions) -> Result<()>;
}

fn extension_of(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
}

impl WorkbookExt for Workbook {
    fn open<P: AsRef<Path>>(path: P) -> Result<Workbook> {
        let path = path.as_ref();

        match extension_of(path).as_deref() {
            Some("xlsx") | Some("xlsm") => XlsxReader::read_file(path)
                .map_err(|e| Error::other(format!("{}: {}", path.display(), e))),
            _ => Err(Error::other(format!(
                "Unsupported file format: {}",
                path.display()
            ))),
        }
    }

    fn save_with_options<P: AsRef<Path>>(&self, path: P, options: &WriteOptions) -> Result<()> {
        let path = path.as_ref();

        match extension_of(path).as_deref() {
            Some("xlsx") => XlsxWriter::write_file_with_options(self, path, options)
                .map_err(|e| Error::other(format!("{}: {}", path.display(), e))),
            _ => Err(Error::other(format!(
                "Unsupported file format: {}",
                path.display()
            ))),
        }
    }
}
