//! # Workbook Reading Module
//!
//! Opens Excel workbooks (`.xlsx`, `.xlsm`) and flattens their first worksheet into
//! rows of cell text. Cells are read as the raw text stored in the workbook: numbers
//! keep their stored digits, booleans read as `0`/`1` and shared strings are resolved.
use crate::error::Sheet2LuaError;
use std::ffi::OsStr;
use std::path::Path;
use thiserror::Error;
use tracing::debug;

mod cell;
pub(crate) mod reference;
mod sheet;
mod xlsx;

pub use reference::index_to_reference;
pub use sheet::Sheet;

/// Errors raised while reading a workbook.
#[derive(Error, Debug)]
pub enum SpreadsheetError {
    /// Required part missing from the archive
    #[error("Missing '{0}' in workbook")]
    FileError(String),

    /// Workbook declares no worksheet
    #[error("No worksheet found in '{0}'")]
    SpreadsheetEmptyError(String),

    /// Unsupported or unrecognized file format
    #[error("Cannot detect file format for '{0}'")]
    InvalidFileFormat(String),

    /// Cell holds an error value or a dangling shared string index
    #[error("Invalid cell value in '{0}' sheet '{1}' at {2}: {3}")]
    CellValueError(String, String, String, String),
}

/// Common interface over workbook formats.
pub(crate) trait Spreadsheet {
    /// File name of the workbook
    fn name(&self) -> String;

    /// Worksheet names in workbook order
    fn sheet_names(&self) -> Vec<String>;

    /// Reads the first worksheet
    fn read_first_sheet(&mut self) -> Result<Sheet, Sheet2LuaError>;
}

/// Opens a workbook, choosing the reader from the file extension.
pub(crate) fn open(path: &Path) -> Result<Box<dyn Spreadsheet>, Sheet2LuaError> {
    let file_name = path.to_string_lossy();
    match path.extension().and_then(OsStr::to_str).map(str::to_ascii_lowercase).as_deref() {
        Some("xlsx") | Some("xlsm") => Ok(Box::new(xlsx::XlsxSpreadsheet::open(&file_name)?)),
        _ => Err(SpreadsheetError::InvalidFileFormat(file_name.to_string()))?,
    }
}

/// Reads the first worksheet of the workbook at `path`.
pub fn read_first_sheet(path: &Path) -> Result<Sheet, Sheet2LuaError> {
    let mut spreadsheet = open(path)?;
    debug!(workbook = %spreadsheet.name(), sheets = ?spreadsheet.sheet_names(), "Reading first sheet");
    spreadsheet.read_first_sheet().map_err(|error| {
        Sheet2LuaError::WithContextError(format!("Read '{}' failed: {}", spreadsheet.name(), error))
    })
}
