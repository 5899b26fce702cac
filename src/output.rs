//! Where generated documents go.
use crate::error::ResultMessage;
use crate::error::Sheet2LuaError;
use std::fs;
use std::path::Path;
use std::path::PathBuf;

/// Extension of generated files.
pub const LUA_EXTENSION: &str = "lua";

/// Writes one finished document for a table.
///
/// Shared by every task of a batch; each table maps to its own file(s), so
/// implementations need no coordination between different tables.
pub trait TableWriter: Send + Sync {
    fn write(&self, table: &str, document: &str) -> Result<(), Sheet2LuaError>;
}

/// Writes `<dir>/<table>.lua` into every configured directory.
///
/// Writes are plain overwrites; a failure can leave a partial file behind.
#[derive(Clone, Debug)]
pub struct LuaDirectoryWriter {
    dirs: Vec<PathBuf>,
}

impl LuaDirectoryWriter {
    pub fn new<I, P>(dirs: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        Self {
            dirs: dirs.into_iter().map(Into::into).collect(),
        }
    }

    pub fn dirs(&self) -> &[PathBuf] {
        &self.dirs
    }

    /// Output path of a table inside `dir`.
    pub fn path(dir: &Path, table: &str) -> PathBuf {
        dir.join(format!("{table}.{LUA_EXTENSION}"))
    }
}

impl TableWriter for LuaDirectoryWriter {
    fn write(&self, table: &str, document: &str) -> Result<(), Sheet2LuaError> {
        for dir in &self.dirs {
            let path = Self::path(dir, table);
            fs::create_dir_all(dir)
                .map_err(Sheet2LuaError::from)
                .and_then(|_| fs::write(&path, document).map_err(Sheet2LuaError::from))
                .with_prefix(&format!("Write '{}' failed", path.display()))?;
        }
        Ok(())
    }
}
