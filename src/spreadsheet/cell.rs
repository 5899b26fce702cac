use crate::spreadsheet::reference::index_to_reference;

/// Types of cell data stored in a worksheet part.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub(crate) enum CellType {
    #[default]
    Number,
    /// Boolean values stored as "0"/"1"
    Boolean,
    /// Inline strings and cached formula strings
    InlineString,
    /// Index into the shared string table
    SharedString,
    /// Error values such as "#DIV/0!"
    Error,
}

impl CellType {
    /// Maps the `t` attribute of a `<c>` element to a cell type.
    pub(crate) fn from_attribute(value: Option<&str>) -> Self {
        match value {
            Some("inlineStr") | Some("str") | Some("d") => Self::InlineString,
            Some("s") => Self::SharedString,
            Some("b") => Self::Boolean,
            Some("e") => Self::Error,
            _ => Self::Number,
        }
    }
}

/// Represents a single cell in a spreadsheet with position, type, and raw value.
#[derive(Clone, Debug)]
pub(crate) struct Cell {
    /// Row index (0-based)
    pub(crate) row: usize,
    /// Column index (0-based)
    pub(crate) col: usize,
    /// Cell data type
    pub(crate) kind: CellType,
    /// Cell value as stored in the worksheet
    pub(crate) value: String,
}

impl Cell {
    /// Returns the Excel-style cell reference (e.g., "A1", "B2").
    pub(crate) fn reference(&self) -> String {
        index_to_reference(self.row, self.col)
    }

    /// Resolves the text shown for this cell.
    /// Shared strings are looked up in the workbook table; everything else is the stored text.
    pub(crate) fn text(&self, shared_strings: &[String]) -> Option<String> {
        match self.kind {
            CellType::SharedString => self
                .value
                .trim()
                .parse::<usize>()
                .ok()
                .and_then(|index| shared_strings.get(index))
                .cloned(),
            _ => Some(self.value.to_owned()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cell(kind: CellType, value: &str) -> Cell {
        Cell { row: 2, col: 1, kind, value: value.to_owned() }
    }

    #[test]
    fn cell_type_from_attribute() {
        assert_eq!(CellType::from_attribute(None), CellType::Number);
        assert_eq!(CellType::from_attribute(Some("n")), CellType::Number);
        assert_eq!(CellType::from_attribute(Some("s")), CellType::SharedString);
        assert_eq!(CellType::from_attribute(Some("str")), CellType::InlineString);
        assert_eq!(CellType::from_attribute(Some("b")), CellType::Boolean);
        assert_eq!(CellType::from_attribute(Some("e")), CellType::Error);
    }

    #[test]
    fn cell_text() {
        let shared = vec!["Potion".to_owned(), "Sword".to_owned()];
        assert_eq!(cell(CellType::SharedString, "1").text(&shared).as_deref(), Some("Sword"));
        assert_eq!(cell(CellType::SharedString, "7").text(&shared), None);
        assert_eq!(cell(CellType::Number, "0.10000000000000001").text(&shared).as_deref(), Some("0.10000000000000001"));
        assert_eq!(cell(CellType::Boolean, "1").text(&shared).as_deref(), Some("1"));
        assert_eq!(cell(CellType::Number, "1").reference(), "B3");
    }
}
