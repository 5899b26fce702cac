//! # sheet2lua
//!
//! Transpiles game-design tables authored in Excel workbooks into Lua table literals
//! for game client and server runtimes.
//!
//! ## Table layout
//!
//! Each table is one workbook; only its first worksheet is read.
//!
//! - Row 1: free-text description, ignored
//! - Row 2: header, one `name:type[:c|s]` cell per column (`-` or blank skips a column)
//! - Row 3 onwards: data, up to the first blank row
//!
//! Field types are `number`, `bool`, `string` and `array`. A column tagged `c` is only
//! emitted for the client, `s` only for the server.
//!
//! ## Output
//!
//! ```lua
//! return {
//! [7] = {id=7, label="Potion", flag=true},
//! }
//! ```
//!
//! Each entry is keyed by its first non-empty value. See [`OutputProfile`] for the
//! `quoted` dialect.
//!
//! ## Pipeline
//!
//! [`BatchExporter`] fans tables out over a thread pool, [`TableConverter`] converts one
//! table through a [`SheetSource`] and a [`TableWriter`]. A failing table is reported
//! and never affects its siblings.
pub mod batch;
pub mod coerce;
pub mod config;
pub mod convert;
pub mod error;
mod helpers;
pub mod output;
pub mod schema;
pub mod serialize;
pub mod source;
pub mod spreadsheet;

#[cfg(test)]
mod testing;

pub use batch::BatchExporter;
pub use batch::BatchReport;
pub use batch::TableFailure;
pub use config::ConfigError;
pub use config::Destination;
pub use config::ExportSettings;
pub use config::TableFilter;
pub use config::TableRegistry;
pub use convert::ConversionJob;
pub use convert::ConvertError;
pub use convert::TableConverter;
pub use convert::TableReport;
pub use error::Sheet2LuaError;
pub use output::LuaDirectoryWriter;
pub use output::TableWriter;
pub use schema::Audience;
pub use schema::FieldKind;
pub use schema::TableSchema;
pub use serialize::OutputProfile;
pub use source::SheetSource;
pub use source::WorkbookDirectory;
pub use spreadsheet::Sheet;
