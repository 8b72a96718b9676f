//! # egrul-sheets-xlsx
//!
//! XLSX (Office Open XML) reader and writer for egrul-sheets.

pub mod error;
pub mod reader;
mod styles;
pub mod writer;

pub use error::{XlsxError, XlsxResult};
pub use reader::XlsxReader;
pub use writer::{WriteOptions, XlsxWriter};
