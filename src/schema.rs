//! # Table Schema
//!
//! A table's schema is declared by its header row (row index 1; row 0 is a free-text
//! description for designers). Each header cell follows the grammar
//! `name ":" type [ ":" audience ]` where `type` is one of `number`, `bool`,
//! `string`, `array` and `audience` is `c` (client only) or `s` (server only).
//! A cell holding `-` or nothing marks a column that is skipped entirely.
//! Inside a cell only the name is trimmed; padding around `type` or `audience` is kept.
use crate::spreadsheet::index_to_reference;
use std::fmt::Display;
use std::str::FromStr;
use thiserror::Error;

/// Separator between the parts of a header cell.
pub const FIELD_INFO_SPLIT: char = ':';

/// Header cell marking a skipped column.
pub const GAP_MARKER: &str = "-";

/// Errors raised while parsing a single header cell.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FieldError {
    #[error("Invalid field spec '{0}', expected 'name:type[:c|s]'")]
    InvalidFieldSpec(String),

    #[error("Empty field name in '{0}'")]
    EmptyFieldName(String),

    #[error("Unknown field type '{kind}' in '{spec}', expected one of [number, bool, string, array]")]
    UnknownFieldType { spec: String, kind: String },
}

/// Errors raised while resolving a header row.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SchemaError {
    #[error("Missing header row")]
    MissingHeaderRow,

    #[error("Invalid header at {position}: {source}")]
    InvalidHeader { position: String, source: FieldError },
}

/// Declared value type of a column.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum FieldKind {
    Number,
    Bool,
    String,
    Array,
}

impl FieldKind {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Number => "number",
            Self::Bool => "bool",
            Self::String => "string",
            Self::Array => "array",
        }
    }
}

impl FromStr for FieldKind {
    type Err = String;

    /// Case-insensitive parse of the four type tags.
    fn from_str(name: &str) -> Result<Self, Self::Err> {
        match name.to_ascii_lowercase().as_str() {
            "number" => Ok(Self::Number),
            "bool" => Ok(Self::Bool),
            "string" => Ok(Self::String),
            "array" => Ok(Self::Array),
            other => Err(other.to_owned()),
        }
    }
}

impl Display for FieldKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Audience restriction declared on a column.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum Visibility {
    #[default]
    Both,
    ClientOnly,
    ServerOnly,
}

impl Visibility {
    /// `c` and `s` (any case, untrimmed) restrict the column, anything else leaves it shared.
    pub fn parse(tag: &str) -> Self {
        match tag.to_ascii_lowercase().as_str() {
            "c" => Self::ClientOnly,
            "s" => Self::ServerOnly,
            _ => Self::Both,
        }
    }
}

/// Audience a conversion is produced for.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum Audience {
    #[default]
    All,
    Client,
    Server,
}

impl Audience {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::All => "all",
            Self::Client => "client",
            Self::Server => "server",
        }
    }
}

impl Display for Audience {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One declared column.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FieldDescriptor {
    name: String,
    kind: FieldKind,
    visibility: Visibility,
}

impl FieldDescriptor {
    /// Parses one trimmed header cell.
    ///
    /// # Errors
    ///
    /// - `InvalidFieldSpec` when the cell has no `:` separator
    /// - `EmptyFieldName` when the name part is blank
    /// - `UnknownFieldType` when the type is not one of the four tags
    pub fn parse(spec: &str) -> Result<Self, FieldError> {
        let parts: Vec<&str> = spec.split(FIELD_INFO_SPLIT).collect();
        if parts.len() < 2 {
            return Err(FieldError::InvalidFieldSpec(spec.to_owned()));
        }
        let name = parts[0].trim();
        if name.is_empty() {
            return Err(FieldError::EmptyFieldName(spec.to_owned()));
        }
        let kind = parts[1].parse::<FieldKind>().map_err(|kind| FieldError::UnknownFieldType {
            spec: spec.to_owned(),
            kind,
        })?;
        let visibility = parts.get(2).map(|tag| Visibility::parse(tag)).unwrap_or_default();
        Ok(Self {
            name: name.to_owned(),
            kind,
            visibility,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> FieldKind {
        self.kind
    }

    pub fn visibility(&self) -> Visibility {
        self.visibility
    }

    /// Whether the column belongs in output produced for `audience`.
    pub fn visible_to(&self, audience: Audience) -> bool {
        match (audience, self.visibility) {
            (Audience::All, _) | (_, Visibility::Both) => true,
            (Audience::Client, Visibility::ClientOnly) => true,
            (Audience::Server, Visibility::ServerOnly) => true,
            _ => false,
        }
    }
}

/// Column layout of one sheet, aligned with spreadsheet columns.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TableSchema {
    fields: Vec<Option<FieldDescriptor>>,
    declared_width: usize,
}

impl TableSchema {
    /// Row index of the header row.
    pub const HEADER_ROW: usize = 1;

    /// Builds the schema from the header row.
    ///
    /// Cells are trimmed; `-` and empty cells become gaps. The first malformed cell
    /// fails the whole schema, reported with its cell reference (e.g. `C2`).
    pub fn resolve<S: AsRef<str>>(header: &[S]) -> Result<Self, SchemaError> {
        let mut fields = Vec::with_capacity(header.len());
        let mut declared_width = 0usize;
        for (col, cell) in header.iter().enumerate() {
            let spec = cell.as_ref().trim();
            if spec.is_empty() || spec == GAP_MARKER {
                fields.push(None);
                continue;
            }
            let field = FieldDescriptor::parse(spec).map_err(|source| SchemaError::InvalidHeader {
                position: index_to_reference(Self::HEADER_ROW, col),
                source,
            })?;
            fields.push(Some(field));
            declared_width += 1;
        }
        Ok(Self { fields, declared_width })
    }

    /// Positional slots, `None` for skipped columns.
    pub fn fields(&self) -> &[Option<FieldDescriptor>] {
        &self.fields
    }

    /// Present descriptors with their column index.
    pub fn columns(&self) -> impl Iterator<Item = (usize, &FieldDescriptor)> + '_ {
        self.fields
            .iter()
            .enumerate()
            .filter_map(|(col, field)| field.as_ref().map(|field| (col, field)))
    }

    /// Number of declared (non-gap) columns.
    pub fn declared_width(&self) -> usize {
        self.declared_width
    }
}
