//! # Table Conversion
//!
//! Converts one table: loads its sheet, resolves the header row, serializes the data
//! rows and writes the finished Lua document. Every failure stays inside the
//! converter; callers get a report or a [`ConvertError`] and siblings are unaffected.
use crate::error::Sheet2LuaError;
use crate::output::TableWriter;
use crate::schema::Audience;
use crate::schema::SchemaError;
use crate::schema::TableSchema;
use crate::serialize::serialize_row;
use crate::serialize::OutputProfile;
use crate::serialize::SerializeError;
use crate::source::SheetSource;
use crate::spreadsheet::Sheet;
use thiserror::Error;
use tracing::debug;
use tracing::error;
use tracing::info;

/// Row index of the first data row (after description and header rows).
pub const FIRST_DATA_ROW: usize = 2;

/// Reasons a table conversion is abandoned.
#[derive(Error, Debug)]
pub enum ConvertError {
    /// The workbook is missing or unreadable
    #[error("Load workbook failed: {0}")]
    Source(Sheet2LuaError),

    /// The header row is missing or malformed
    #[error("{0}")]
    Schema(#[from] SchemaError),

    /// A data row has fewer cells than the declared fields
    #[error("Row {row} has {cells} cells, fewer than the {expected} declared fields")]
    RowWidthMismatch { row: usize, cells: usize, expected: usize },

    /// A data row could not be serialized
    #[error("Row {row}: {source}")]
    Row { row: usize, source: SerializeError },

    /// The finished document could not be written
    #[error("Write failed: {0}")]
    Write(Sheet2LuaError),
}

impl ConvertError {
    /// 1-based spreadsheet row the failure refers to, if any.
    pub fn row(&self) -> Option<usize> {
        match self {
            Self::RowWidthMismatch { row, .. } | Self::Row { row, .. } => Some(*row),
            _ => None,
        }
    }
}

/// One table awaiting conversion.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ConversionJob {
    pub table: String,
    pub audience: Audience,
}

impl ConversionJob {
    pub fn new<S: Into<String>>(table: S, audience: Audience) -> Self {
        Self {
            table: table.into(),
            audience,
        }
    }
}

/// Summary of a successful conversion.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TableReport {
    pub table: String,
    pub audience: Audience,
    pub entries: usize,
}

/// A rendered Lua document and the number of entries it holds.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Document {
    pub text: String,
    pub entries: usize,
}

/// Converts single tables read from a [`SheetSource`].
#[derive(Clone, Copy)]
pub struct TableConverter<'a> {
    source: &'a dyn SheetSource,
    profile: OutputProfile,
}

impl<'a> TableConverter<'a> {
    pub fn new(source: &'a dyn SheetSource, profile: OutputProfile) -> Self {
        Self { source, profile }
    }

    /// Renders a loaded sheet into a Lua document for `audience`.
    ///
    /// Data rows start at index 2 and are emitted in sheet order. The first row
    /// without cells ends the table; rows after it are ignored.
    ///
    /// # Errors
    ///
    /// - `Schema` when the header row is missing or malformed
    /// - `RowWidthMismatch` when a row has fewer cells than declared fields
    /// - `Row` when a row yields no key
    pub fn render(&self, sheet: &Sheet, audience: Audience) -> Result<Document, ConvertError> {
        let header = sheet
            .row(TableSchema::HEADER_ROW)
            .ok_or(SchemaError::MissingHeaderRow)?;
        let schema = TableSchema::resolve(header)?;

        let mut text = String::with_capacity(4096);
        text.push_str(self.profile.open());
        let mut entries = 0usize;
        for (index, row) in sheet.rows().iter().enumerate().skip(FIRST_DATA_ROW) {
            let row_number = index + 1;
            if row.is_empty() {
                debug!(workbook = sheet.file_name(), sheet = sheet.name(), row = row_number, "Empty row ends the table");
                break;
            }
            if row.len() < schema.declared_width() {
                return Err(ConvertError::RowWidthMismatch {
                    row: row_number,
                    cells: row.len(),
                    expected: schema.declared_width(),
                });
            }
            let line = serialize_row(&schema, audience, self.profile, row)
                .map_err(|source| ConvertError::Row { row: row_number, source })?;
            text.push_str(&line);
            text.push_str(",\n");
            entries += 1;
        }
        text.push_str(self.profile.close());
        Ok(Document { text, entries })
    }

    /// Loads, renders and writes one table.
    pub fn try_convert(&self, job: &ConversionJob, writer: &dyn TableWriter) -> Result<TableReport, ConvertError> {
        let sheet = self.source.load(&job.table).map_err(ConvertError::Source)?;
        let document = self.render(&sheet, job.audience)?;
        writer
            .write(&job.table, &document.text)
            .map_err(ConvertError::Write)?;
        Ok(TableReport {
            table: job.table.to_owned(),
            audience: job.audience,
            entries: document.entries,
        })
    }

    /// Converts one table and logs the outcome.
    ///
    /// # Returns
    ///
    /// * `bool` - True if the document was written
    pub fn convert(&self, job: &ConversionJob, writer: &dyn TableWriter) -> bool {
        let result = self.try_convert(job, writer);
        log_outcome(job, &result);
        result.is_ok()
    }
}

pub(crate) fn log_outcome(job: &ConversionJob, result: &Result<TableReport, ConvertError>) {
    match result {
        Ok(report) => {
            info!(table = %report.table, audience = %report.audience, entries = report.entries, "Write table succeeded");
        }
        Err(error) => {
            error!(table = %job.table, audience = %job.audience, row = error.row(), "Convert table failed: {error}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::FieldError;
    use crate::testing::MemorySource;
    use crate::testing::MemoryWriter;
    use pretty_assertions::assert_eq;

    const DESCRIPTION: &[&str] = &["Item id", "Display name", "Stackable"];
    const HEADER: &[&str] = &["id:number", "label:string", "flag:bool"];

    fn convert(source: &MemorySource, table: &str, audience: Audience) -> (Result<TableReport, ConvertError>, MemoryWriter) {
        let writer = MemoryWriter::default();
        let converter = TableConverter::new(source, OutputProfile::Flat);
        let result = converter.try_convert(&ConversionJob::new(table, audience), &writer);
        (result, writer)
    }

    #[test]
    fn convert_table() {
        let source = MemorySource::default().with("item", &[
            DESCRIPTION,
            HEADER,
            &["7", "Potion", "1"],
            &["8", "Ether", "false"],
        ]);
        let (result, writer) = convert(&source, "item", Audience::All);

        let report = result.unwrap();
        assert_eq!(report.entries, 2);
        assert_eq!(
            writer.document("item").unwrap(),
            "return {\n[7] = {id=7, label=\"Potion\", flag=true},\n[8] = {id=8, label=\"Ether\", flag=false},\n}"
        );
    }

    #[test]
    fn header_only_table_is_empty() {
        let source = MemorySource::default().with("item", &[DESCRIPTION, HEADER]);
        let (result, writer) = convert(&source, "item", Audience::Client);

        assert_eq!(result.unwrap().entries, 0);
        assert_eq!(writer.document("item").unwrap(), "return {\n}");
    }

    #[test]
    fn empty_row_ends_table() {
        let source = MemorySource::default().with("item", &[
            DESCRIPTION,
            HEADER,
            &["1", "a", "1"],
            &[],
            &["2", "b", "0"],
            &["bad"],
        ]);
        let (result, writer) = convert(&source, "item", Audience::All);

        assert_eq!(result.unwrap().entries, 1);
        assert_eq!(writer.document("item").unwrap(), "return {\n[1] = {id=1, label=\"a\", flag=true},\n}");
    }

    #[test]
    fn short_row_fails_table() {
        let source = MemorySource::default().with("item", &[
            DESCRIPTION,
            HEADER,
            &["1", "a", "1"],
            &["2", "b", "0"],
            &["3", "c"],
        ]);
        let (result, writer) = convert(&source, "item", Audience::All);

        let error = result.unwrap_err();
        assert!(matches!(error, ConvertError::RowWidthMismatch { row: 5, cells: 2, expected: 3 }), "{error:?}");
        assert_eq!(error.row(), Some(5));
        assert!(writer.tables().is_empty());
    }

    #[test]
    fn width_counts_declared_fields_only() {
        let source = MemorySource::default().with("item", &[
            &["", "", "", ""],
            &["id:number", "-", "", "hp:number"],
            &["1", "2"],
        ]);
        let (result, writer) = convert(&source, "item", Audience::All);

        assert_eq!(result.unwrap().entries, 1);
        assert_eq!(writer.document("item").unwrap(), "return {\n[1] = {id=1, hp=0},\n}");
    }

    #[test]
    fn missing_key_reports_row() {
        let source = MemorySource::default().with("item", &[
            DESCRIPTION,
            &["model:string:c", "-"],
            &["a.png", "x"],
        ]);
        let (result, _) = convert(&source, "item", Audience::Server);

        let error = result.unwrap_err();
        assert!(matches!(error, ConvertError::Row { row: 3, source: SerializeError::MissingKey }), "{error:?}");
        assert_eq!(error.to_string(), "Row 3: Missing key, every retained field is empty");
    }

    #[test]
    fn malformed_header_fails_table() {
        let source = MemorySource::default().with("item", &[
            DESCRIPTION,
            &["id:number", "label"],
            &["1", "a"],
        ]);
        let (result, writer) = convert(&source, "item", Audience::All);

        match result.unwrap_err() {
            ConvertError::Schema(SchemaError::InvalidHeader { position, source }) => {
                assert_eq!(position, "B2");
                assert_eq!(source, FieldError::InvalidFieldSpec("label".to_owned()));
            }
            other => panic!("unexpected error {other:?}"),
        }
        assert!(writer.tables().is_empty());
    }

    #[test]
    fn missing_header_row() {
        let source = MemorySource::default().with("item", &[DESCRIPTION]);
        let (result, _) = convert(&source, "item", Audience::All);
        assert!(matches!(result, Err(ConvertError::Schema(SchemaError::MissingHeaderRow))));
    }

    #[test]
    fn missing_source_is_reported() {
        let source = MemorySource::default();
        let writer = MemoryWriter::default();
        let converter = TableConverter::new(&source, OutputProfile::Flat);

        assert!(!converter.convert(&ConversionJob::new("nothing", Audience::All), &writer));
        let error = converter
            .try_convert(&ConversionJob::new("nothing", Audience::All), &writer)
            .unwrap_err();
        assert!(matches!(error, ConvertError::Source(_)));
        assert_eq!(error.row(), None);
    }

    #[test]
    fn write_failure_is_reported() {
        let source = MemorySource::default().with("item", &[DESCRIPTION, HEADER, &["1", "a", "1"]]);
        let writer = MemoryWriter::rejecting("item");
        let converter = TableConverter::new(&source, OutputProfile::Flat);

        let error = converter
            .try_convert(&ConversionJob::new("item", Audience::All), &writer)
            .unwrap_err();
        assert!(matches!(error, ConvertError::Write(_)));
        assert!(!converter.convert(&ConversionJob::new("item", Audience::All), &writer));
    }

    #[test]
    fn conversion_is_deterministic() {
        let source = MemorySource::default().with("item", &[
            DESCRIPTION,
            HEADER,
            &["1.00004", "a", "TRUE"],
            &["2", "b", ""],
        ]);
        let (first, writer) = convert(&source, "item", Audience::All);
        let (second, again) = convert(&source, "item", Audience::All);

        assert_eq!(first.unwrap(), second.unwrap());
        assert_eq!(writer.document("item"), again.document("item"));
        assert_eq!(
            writer.document("item").unwrap(),
            "return {\n[1] = {id=1, label=\"a\", flag=true},\n[2] = {id=2, label=\"b\", flag=false},\n}"
        );
    }

    #[test]
    fn quoted_profile_document() {
        let source = MemorySource::default().with("item", &[DESCRIPTION, HEADER, &["7", "Potion", "1"]]);
        let writer = MemoryWriter::default();
        let converter = TableConverter::new(&source, OutputProfile::Quoted);

        assert!(converter.convert(&ConversionJob::new("item", Audience::Server), &writer));
        assert_eq!(
            writer.document("item").unwrap(),
            "return {\n[7] = {[\"id\"] = 7, [\"label\"] = \"Potion\", [\"flag\"] = true},\n}"
        );
    }
}
