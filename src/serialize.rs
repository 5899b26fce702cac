//! Row serialization into Lua table-constructor entries.
use crate::coerce::coerce;
use crate::schema::Audience;
use crate::schema::TableSchema;
use std::fmt::Display;
use thiserror::Error;

/// Separator between the fields of one entry.
pub const FIELD_DELIMITER: &str = ", ";

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SerializeError {
    /// No retained field produced a value to key the entry with
    #[error("Missing key, every retained field is empty")]
    MissingKey,
}

/// Output dialect of the generated Lua documents.
///
/// - `Flat`: `[7] = {id=7, label="Potion"}`, columns may carry `c`/`s` audience tags.
/// - `Quoted`: `[7] = {["id"] = 7, ["label"] = "Potion"}`, audience tags are not part
///   of this dialect and every column is emitted for every audience.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum OutputProfile {
    #[default]
    Flat,
    Quoted,
}

impl OutputProfile {
    /// Opening marker of a document.
    pub const fn open(&self) -> &'static str {
        "return {\n"
    }

    /// Closing marker of a document.
    pub const fn close(&self) -> &'static str {
        "}"
    }

    /// Whether column audience tags filter fields in this dialect.
    pub const fn filters_audience(&self) -> bool {
        matches!(self, Self::Flat)
    }

    fn write_field(&self, out: &mut String, name: &str, value: &str) {
        match self {
            Self::Flat => {
                out.push_str(name);
                out.push('=');
            }
            Self::Quoted => {
                out.push_str("[\"");
                out.push_str(name);
                out.push_str("\"] = ");
            }
        }
        out.push_str(value);
    }
}

/// One table entry: its key literal and `(name, literal)` pairs in column order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SerializedEntry {
    pub key: String,
    pub fields: Vec<(String, String)>,
}

impl SerializedEntry {
    /// Renders the entry as a single line in the given dialect.
    pub fn render(&self, profile: OutputProfile) -> String {
        let mut line = String::with_capacity(64);
        line.push('[');
        line.push_str(&self.key);
        line.push_str("] = {");
        for (index, (name, value)) in self.fields.iter().enumerate() {
            if index > 0 {
                line.push_str(FIELD_DELIMITER);
            }
            profile.write_field(&mut line, name, value);
        }
        line.push('}');
        line
    }
}

impl Display for SerializedEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.render(OutputProfile::Flat))
    }
}

/// Builds the entry for one data row.
///
/// Fields hidden from `audience` are dropped (when the profile honours audience tags),
/// the rest are coerced in column order. Cells past the end of `row` read as empty.
/// The first non-empty coerced value becomes the entry key.
pub fn build_entry<S: AsRef<str>>(
    schema: &TableSchema,
    audience: Audience,
    profile: OutputProfile,
    row: &[S],
) -> Result<SerializedEntry, SerializeError> {
    let mut key: Option<String> = None;
    let mut fields = Vec::with_capacity(schema.declared_width());
    for (col, field) in schema.columns() {
        if profile.filters_audience() && !field.visible_to(audience) {
            continue;
        }
        let raw = row.get(col).map(|cell| cell.as_ref()).unwrap_or("");
        let value = coerce(field.kind(), raw);
        if key.is_none() && !value.is_empty() {
            key = Some(value.clone());
        }
        fields.push((field.name().to_owned(), value));
    }
    let key = key.ok_or(SerializeError::MissingKey)?;
    Ok(SerializedEntry { key, fields })
}

/// Serializes one data row into its rendered entry line.
pub fn serialize_row<S: AsRef<str>>(
    schema: &TableSchema,
    audience: Audience,
    profile: OutputProfile,
    row: &[S],
) -> Result<String, SerializeError> {
    build_entry(schema, audience, profile, row).map(|entry| entry.render(profile))
}
