//! Filling a registry sheet with the heads of the listed organisations

use std::path::{Path, PathBuf};
use std::time::Duration;

use egrul_client::DirectorLookup;
use egrul_sheets_core::{CellValue, Worksheet};
use egrul_sheets_xlsx::WriteOptions;
use thiserror::Error;
use tracing::{info, warn};

use crate::table::SheetTable;
use crate::WorkbookExt;

/// Name of the column the full names are written to
pub const DEFAULT_FIO_COLUMN: &str = "ФИО";

/// Suffix inserted before `.xlsx` in the output file name
pub const OUTPUT_SUFFIX: &str = "_с_ФИО";

/// Errors that stop an enrichment run
#[derive(Debug, Error)]
pub enum EnrichError {
    /// The sheet is narrower than the configured INN column
    #[error("sheet has {found} columns, the INN column is number {required}")]
    TooFewColumns { required: usize, found: usize },

    /// Workbook could not be opened, addressed or saved
    #[error(transparent)]
    Workbook(#[from] egrul_sheets_core::Error),
}

/// Options for a run
#[derive(Debug, Clone)]
pub struct EnrichOptions {
    /// 1-based position of the INN column
    pub inn_column: usize,
    /// Header of the column receiving the names
    pub fio_column: String,
    /// Pause after every row that triggered a lookup
    pub row_delay: Duration,
    /// 0-based index of the sheet to process
    pub sheet: usize,
    /// Process at most this many records; later rows are left as they are
    pub limit: Option<usize>,
}

impl Default for EnrichOptions {
    fn default() -> Self {
        Self {
            inn_column: 5,
            fio_column: DEFAULT_FIO_COLUMN.to_string(),
            row_delay: Duration::from_millis(500),
            sheet: 0,
            limit: None,
        }
    }
}

/// Outcome counters of a run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnrichReport {
    /// Records in the sheet
    pub rows: usize,
    /// Records that received a name
    pub filled: usize,
    /// Lookups the register had no answer for
    pub not_found: usize,
    /// Lookups that failed with an error
    pub failed: usize,
    /// Records with a blank INN
    pub skipped: usize,
    /// 0-based column the names were written to
    pub fio_column_index: u16,
    /// Whether that column was appended rather than overwritten
    pub created_column: bool,
}

/// Resolves INNs through a [`DirectorLookup`] and writes the names back
pub struct Enricher<L> {
    lookup: L,
    options: EnrichOptions,
}

impl<L: DirectorLookup> Enricher<L> {
    /// Create an enricher resolving INNs through `lookup`
    pub fn new(lookup: L, options: EnrichOptions) -> Self {
        Self { lookup, options }
    }

    /// Options this enricher runs with
    pub fn options(&self) -> &EnrichOptions {
        &self.options
    }

    /// Open `input`, fill the configured sheet and save it alone to `output`
    pub async fn enrich_file(&self, input: &Path, output: &Path) -> Result<EnrichReport, EnrichError> {
        info!("Reading {}", input.display());
        let mut workbook = egrul_sheets_core::Workbook::open(input)?;

        let count = workbook.sheet_count();
        let sheet = workbook
            .worksheet_mut(self.options.sheet)
            .ok_or(egrul_sheets_core::Error::SheetOutOfBounds(self.options.sheet, count))?;

        let report = self.enrich(sheet).await?;

        workbook.retain_only(self.options.sheet)?;
        info!("Saving result to {}", output.display());
        workbook.save_with_options(output, &WriteOptions::with_bold_header())?;

        Ok(report)
    }

    /// Fill the name column of `sheet`
    pub async fn enrich(&self, sheet: &mut Worksheet) -> Result<EnrichReport, EnrichError> {
        let (inns, fio_col, created) = self.plan(sheet)?;

        let mut report = EnrichReport {
            rows: inns.len(),
            fio_column_index: fio_col,
            created_column: created,
            ..Default::default()
        };

        let budget = self.options.limit.unwrap_or(usize::MAX);
        let mut names: Vec<String> = Vec::with_capacity(inns.len().min(budget));

        for (index, inn) in inns.iter().take(budget).enumerate() {
            let line = index + 1;

            let Some(inn) = inn else {
                info!("Row {}: INN is empty, skipping", line);
                report.skipped += 1;
                names.push(String::new());
                continue;
            };

            info!("Row {}: looking up FIO for INN {}...", line, inn);
            let name = match self.lookup.find_director(inn).await {
                Ok(Some(name)) => {
                    info!("  FIO found: {}", name);
                    report.filled += 1;
                    name
                }
                Ok(None) => {
                    info!("  FIO not found");
                    report.not_found += 1;
                    String::new()
                }
                Err(e) => {
                    warn!("  lookup for INN {} failed: {}", inn, e);
                    report.failed += 1;
                    String::new()
                }
            };
            names.push(name);

            if !self.options.row_delay.is_zero() {
                tokio::time::sleep(self.options.row_delay).await;
            }
        }

        sheet.set_cell_value_at(0, fio_col, self.options.fio_column.as_str())?;
        for (index, name) in names.into_iter().enumerate() {
            let row = index as u32 + 1;
            if name.is_empty() {
                sheet.clear_cell_at(row, fio_col);
            } else {
                sheet.set_cell_value_at(row, fio_col, CellValue::string(name))?;
            }
        }

        info!(
            "Done: {} rows, {} filled, {} not found, {} failed, {} skipped",
            report.rows, report.filled, report.not_found, report.failed, report.skipped
        );
        Ok(report)
    }

    /// Validate the sheet and collect the INNs and the target column
    fn plan(&self, sheet: &Worksheet) -> Result<(Vec<Option<String>>, u16, bool), EnrichError> {
        let table = SheetTable::from_worksheet(sheet);

        info!("Rows loaded: {}", table.row_count());
        info!("Columns in file: {}", table.columns().len());
        info!("Column names:");
        for (i, column) in table.columns().iter().enumerate() {
            info!("  {}. {}", i + 1, column);
        }

        let required = self.options.inn_column.max(1);
        if table.columns().len() < required {
            return Err(EnrichError::TooFewColumns {
                required,
                found: table.columns().len(),
            });
        }

        let inn_col = required - 1;
        info!("INN column: '{}'", table.columns()[inn_col]);

        let fio_name = &self.options.fio_column;
        let (fio_col, created) = match table.column_index(fio_name) {
            Some(index) => {
                info!("Column '{}' already exists and will be overwritten", fio_name);
                (index, false)
            }
            None => {
                info!("Creating column '{}'", fio_name);
                (table.columns().len(), true)
            }
        };
        let fio_col = u16::try_from(fio_col).map_err(|_| {
            egrul_sheets_core::Error::ColumnOutOfBounds(fio_col as u32, egrul_sheets_core::MAX_COLS - 1)
        })?;

        let inns = (0..table.row_count())
            .map(|row| {
                table
                    .value(row, inn_col)
                    .filter(|v| !v.is_blank())
                    .map(|v| v.to_text().trim().to_string())
            })
            .collect();

        Ok((inns, fio_col, created))
    }
}

/// Output file next to the input: `registry.xlsx` -> `registry_с_ФИО.xlsx`
///
/// Every `.xlsx` in the path is rewritten; a path without one gets the suffix
/// and extension appended to its stem so the input is never overwritten.
pub fn output_path_for(input: &Path) -> PathBuf {
    let text = input.to_string_lossy();
    if text.contains(".xlsx") {
        return PathBuf::from(text.replace(".xlsx", &format!("{}.xlsx", OUTPUT_SUFFIX)));
    }

    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    input.with_file_name(format!("{}{}.xlsx", stem, OUTPUT_SUFFIX))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_path_for() {
        assert_eq!(
            output_path_for(Path::new("Список рассылки свод.xlsx")),
            PathBuf::from("Список рассылки свод_с_ФИО.xlsx")
        );
        assert_eq!(
            output_path_for(Path::new("/data/reg.xlsx")),
            PathBuf::from("/data/reg_с_ФИО.xlsx")
        );
        assert_eq!(
            output_path_for(Path::new("/data/reg.xlsm")),
            PathBuf::from("/data/reg_с_ФИО.xlsx")
        );
    }

    #[test]
    fn test_default_options() {
        let options = EnrichOptions::default();
        assert_eq!(options.inn_column, 5);
        assert_eq!(options.fio_column, "ФИО");
        assert_eq!(options.row_delay, Duration::from_millis(500));
        assert_eq!(options.limit, None);
    }
}
