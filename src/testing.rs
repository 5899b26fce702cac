//! In-memory sources and writers for unit tests.
use crate::error::Sheet2LuaError;
use crate::output::TableWriter;
use crate::source::SheetSource;
use crate::spreadsheet::Sheet;
use std::collections::BTreeMap;
use std::io;
use std::sync::Mutex;

#[derive(Default)]
pub(crate) struct MemorySource {
    sheets: BTreeMap<String, Sheet>,
}

impl MemorySource {
    pub(crate) fn with(mut self, table: &str, rows: &[&[&str]]) -> Self {
        let rows: Vec<Vec<&str>> = rows.iter().map(|row| row.to_vec()).collect();
        self.sheets.insert(table.to_owned(), Sheet::from_rows(table, rows));
        self
    }
}

impl SheetSource for MemorySource {
    fn load(&self, table: &str) -> Result<Sheet, Sheet2LuaError> {
        self.sheets.get(table).cloned().ok_or_else(|| {
            io::Error::new(io::ErrorKind::NotFound, format!("no workbook for '{table}'")).into()
        })
    }
}

#[derive(Default)]
pub(crate) struct MemoryWriter {
    pub(crate) documents: Mutex<BTreeMap<String, String>>,
    pub(crate) reject: Option<String>,
}

impl MemoryWriter {
    pub(crate) fn rejecting(table: &str) -> Self {
        Self {
            reject: Some(table.to_owned()),
            ..Self::default()
        }
    }

    pub(crate) fn document(&self, table: &str) -> Option<String> {
        self.documents.lock().unwrap().get(table).cloned()
    }

    pub(crate) fn tables(&self) -> Vec<String> {
        self.documents.lock().unwrap().keys().cloned().collect()
    }
}

impl TableWriter for MemoryWriter {
    fn write(&self, table: &str, document: &str) -> Result<(), Sheet2LuaError> {
        if self.reject.as_deref() == Some(table) {
            return Err(io::Error::new(io::ErrorKind::PermissionDenied, "read-only").into());
        }
        self.documents.lock().unwrap().insert(table.to_owned(), document.to_owned());
        Ok(())
    }
}
