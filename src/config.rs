//! # Configuration
//!
//! The table registry (`config.json`) lists which workbooks feed the server and the
//! client runtimes. [`ExportSettings`] carries the directories and output options of
//! one run; both are built once at startup and passed by reference.
use crate::output::LuaDirectoryWriter;
use crate::schema::Audience;
use crate::serialize::OutputProfile;
use crate::source::WorkbookDirectory;
use crate::source::WORKBOOK_EXTENSION;
use glob::Pattern;
use serde::Deserialize;
use serde::Serialize;
use std::collections::BTreeSet;
use std::fs;
use std::path::Path;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Read config '{path}' failed: {source}")]
    Read { path: String, source: std::io::Error },

    #[error("Parse config '{path}' failed: {source}")]
    Parse { path: String, source: serde_json::Error },

    #[error("Invalid table filter '{pattern}': {source}")]
    Filter { pattern: String, source: glob::PatternError },
}

/// Tables exported for each runtime, as listed in the registry file.
///
/// ```json
/// { "Servers": ["item.xlsx", "monster.xlsx"], "Clients": ["item.xlsx"] }
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableRegistry {
    #[serde(rename = "Servers", default)]
    pub servers: Vec<String>,
    #[serde(rename = "Clients", default)]
    pub clients: Vec<String>,
}

impl TableRegistry {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json(&content).map_err(|source| ConfigError::Parse {
            path: path.display().to_string(),
            source,
        })
    }

    pub fn from_json(content: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(content)
    }

    /// Merged table names for an audience; `All` is the union of both lists.
    pub fn tables(&self, audience: Audience) -> Vec<String> {
        match audience {
            Audience::Client => merge_tables(&[self.clients.as_slice()]),
            Audience::Server => merge_tables(&[self.servers.as_slice()]),
            Audience::All => merge_tables(&[self.servers.as_slice(), self.clients.as_slice()]),
        }
    }

    /// Whether `table` (without extension, case-sensitive) is listed for `audience`.
    pub fn contains(&self, table: &str, audience: Audience) -> bool {
        self.tables(audience).iter().any(|name| name == table)
    }
}

/// Drops the last extension of a registry entry; names without `.` are kept whole.
pub fn strip_extension(name: &str) -> &str {
    match name.rsplit_once('.') {
        Some((stem, _)) => stem,
        None => name,
    }
}

/// Union of table lists: extensions stripped, de-duplicated, sorted.
pub fn merge_tables(lists: &[&[String]]) -> Vec<String> {
    lists
        .iter()
        .flat_map(|list| list.iter())
        .map(|name| strip_extension(name.trim()))
        .filter(|name| !name.is_empty())
        .map(str::to_owned)
        .collect::<BTreeSet<String>>()
        .into_iter()
        .collect()
}

/// Glob patterns restricting which tables a batch converts.
///
/// An empty filter accepts every table.
#[derive(Clone, Debug, Default)]
pub struct TableFilter {
    patterns: Vec<Pattern>,
}

impl TableFilter {
    pub fn new<S: AsRef<str>>(patterns: &[S]) -> Result<Self, ConfigError> {
        let patterns = patterns
            .iter()
            .map(|pattern| {
                Pattern::new(pattern.as_ref()).map_err(|source| ConfigError::Filter {
                    pattern: pattern.as_ref().to_owned(),
                    source,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { patterns })
    }

    pub fn accept(&self, table: &str) -> bool {
        self.patterns.is_empty() || self.patterns.iter().any(|pattern| pattern.matches(table))
    }

    pub fn apply(&self, tables: Vec<String>) -> Vec<String> {
        tables.into_iter().filter(|table| self.accept(table)).collect()
    }
}

/// Output directory set a document is written to.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Destination {
    Client,
    Server,
    Both,
}

impl Destination {
    /// Directory set matching an audience's runtime.
    pub fn for_audience(audience: Audience) -> Self {
        match audience {
            Audience::Client => Self::Client,
            Audience::Server => Self::Server,
            Audience::All => Self::Both,
        }
    }
}

/// Options of one export run.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExportSettings {
    pub source_dir: PathBuf,
    pub client_dir: PathBuf,
    pub server_dir: PathBuf,
    pub profile: OutputProfile,
    pub workbook_extension: String,
    pub threads: Option<usize>,
}

impl Default for ExportSettings {
    fn default() -> Self {
        Self {
            source_dir: PathBuf::from("./excel"),
            client_dir: PathBuf::from("./client"),
            server_dir: PathBuf::from("./server"),
            profile: OutputProfile::default(),
            workbook_extension: WORKBOOK_EXTENSION.to_owned(),
            threads: None,
        }
    }
}

impl ExportSettings {
    pub fn source(&self) -> WorkbookDirectory {
        WorkbookDirectory::with_extension(&self.source_dir, &self.workbook_extension)
    }

    pub fn writer(&self, destination: Destination) -> LuaDirectoryWriter {
        match destination {
            Destination::Client => LuaDirectoryWriter::new([&self.client_dir]),
            Destination::Server => LuaDirectoryWriter::new([&self.server_dir]),
            Destination::Both => LuaDirectoryWriter::new([&self.client_dir, &self.server_dir]),
        }
    }
}
