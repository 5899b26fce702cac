//! Where sheets come from.
use crate::error::ResultMessage;
use crate::error::Sheet2LuaError;
use crate::spreadsheet;
use crate::spreadsheet::Sheet;
use std::path::PathBuf;

/// Default workbook extension looked up for a table name.
pub const WORKBOOK_EXTENSION: &str = "xlsx";

/// Loads the sheet backing a table, addressed by table name.
///
/// Implementations are shared across concurrent conversions.
pub trait SheetSource: Send + Sync {
    fn load(&self, table: &str) -> Result<Sheet, Sheet2LuaError>;
}

/// Reads `<dir>/<table>.<extension>` and returns its first worksheet.
#[derive(Clone, Debug)]
pub struct WorkbookDirectory {
    dir: PathBuf,
    extension: String,
}

impl WorkbookDirectory {
    pub fn new<P: Into<PathBuf>>(dir: P) -> Self {
        Self::with_extension(dir, WORKBOOK_EXTENSION)
    }

    pub fn with_extension<P: Into<PathBuf>>(dir: P, extension: &str) -> Self {
        Self {
            dir: dir.into(),
            extension: extension.trim_start_matches('.').to_owned(),
        }
    }

    /// Workbook path for a table name.
    pub fn path(&self, table: &str) -> PathBuf {
        self.dir.join(format!("{}.{}", table, self.extension))
    }
}

impl SheetSource for WorkbookDirectory {
    fn load(&self, table: &str) -> Result<Sheet, Sheet2LuaError> {
        let path = self.path(table);
        spreadsheet::read_first_sheet(&path)
            .with_prefix(&format!("Open '{}' failed", path.display()))
    }
}
