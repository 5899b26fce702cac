use crate::error::Sheet2LuaError;
use crate::helpers::xml::XmlNodeHelper;
use crate::helpers::xml::XmlReader;
use crate::helpers::xml::XmlTextContextHelper;
use crate::helpers::zip::ZipHelper;
use crate::match_xml_events;
use crate::spreadsheet::cell::Cell;
use crate::spreadsheet::cell::CellType;
use crate::spreadsheet::reference::index_to_reference;
use crate::spreadsheet::reference::reference_to_index;
use crate::spreadsheet::reference::within_bounds;
use crate::spreadsheet::sheet::Sheet;
use crate::spreadsheet::Spreadsheet;
use crate::spreadsheet::SpreadsheetError;
use quick_xml::events::Event;
use quick_xml::name::QName;
use std::borrow::Cow;
use std::collections::HashMap;
use std::fs::File;
use std::io::BufReader;
use std::io::Read;
use std::io::Seek;
use zip::read::ZipFile;
use zip::ZipArchive;

// XML tag names for parsing Excel XLSX format
const TAG_SHARED_STRING_ITEM: QName = QName(b"si");   // Shared string table item
const TAG_PHONETIC_TEXT: QName = QName(b"rPh");       // Phonetic text for Asian languages
const TAG_TEXT: QName = QName(b"t");                  // Text content within strings
const TAG_SHEET: QName = QName(b"sheet");             // Worksheet definition
const TAG_ROW: QName = QName(b"row");                 // Row in worksheet
const TAG_CELL: QName = QName(b"c");                  // Cell in worksheet
const TAG_INLINE_STRING: QName = QName(b"is");        // Inline string value
const TAG_VALUE: QName = QName(b"v");                 // Cell value content
const TAG_RELATIONSHIP: &[u8] = b"Relationship";

/// Represents an Excel XLSX workbook
pub(crate) struct XlsxSpreadsheet<RS: Read + Seek> {
    /// File name of the workbook
    pub(crate) name: String,
    /// ZIP archive containing the workbook parts
    zip: ZipArchive<RS>,
    /// Worksheets in workbook order as (name, zip_path) pairs
    sheets: Vec<(String, String)>,
}

impl XlsxSpreadsheet<BufReader<File>> {
    /// Opens an XLSX workbook from disk and reads its sheet list
    pub(crate) fn open(file_name: &str) -> Result<Self, Sheet2LuaError> {
        let file = File::open(file_name)?;
        Self::from_reader(file_name, BufReader::new(file))
    }
}

impl<RS: Read + Seek> XlsxSpreadsheet<RS> {
    pub(crate) fn from_reader(file_name: &str, reader: RS) -> Result<Self, Sheet2LuaError> {
        let mut zip = ZipArchive::new(reader)?;
        let sheets = load_workbook(&mut zip)?;
        if sheets.is_empty() {
            Err(SpreadsheetError::SpreadsheetEmptyError(file_name.to_owned()))?
        }
        Ok(XlsxSpreadsheet {
            name: file_name.to_owned(),
            zip,
            sheets,
        })
    }

    /// Loads the shared string table, empty when the part is absent
    fn load_shared_strings(&mut self) -> Result<Vec<String>, Sheet2LuaError> {
        let mut shared_strings = Vec::<String>::new();
        let mut reader = match self.zip.xml_reader("xl/sharedStrings.xml")? {
            Some(reader) => reader,
            None => return Ok(shared_strings),
        };

        match_xml_events!(reader => {
            Event::Start(event) if event.name() == TAG_SHARED_STRING_ITEM => {
                let string = read_string_value(&mut reader, TAG_SHARED_STRING_ITEM, false)?;
                shared_strings.push(string);
            }
        });
        Ok(shared_strings)
    }

    /// Parses one worksheet part into raw cells
    fn read_cells(&mut self, sheet_name: &str, zip_path: &str) -> Result<Vec<Cell>, Sheet2LuaError> {
        let mut cells = Vec::<Cell>::new();
        let mut row_count = 0usize;
        let mut col_count = 0usize;
        let mut row = 0usize;
        let mut col = 0usize;
        let mut kind = CellType::default();
        let mut value = String::new();
        let mut reader = self.zip.xml_reader(zip_path)?
            .ok_or_else(|| SpreadsheetError::FileError(zip_path.to_owned()))?;
        match_xml_events!(reader => {
            Event::End(event) if event.name() == TAG_ROW => {
                row_count += 1;
                col_count = 0;
            }
            Event::Start(event) if event.name() == TAG_CELL => {
                (row, col) = match event.get_attribute_value("r")? {
                    Some(reference) => reference_to_index(&reference).ok_or_else(|| {
                        SpreadsheetError::CellValueError(
                            self.name.to_owned(),
                            sheet_name.to_owned(),
                            reference.to_string(),
                            "reference outside the worksheet".to_owned(),
                        )
                    })?,
                    None => (row_count, col_count),
                };
                if !within_bounds(row, col) {
                    return Err(SpreadsheetError::CellValueError(
                        self.name.to_owned(),
                        sheet_name.to_owned(),
                        index_to_reference(row, col),
                        "reference outside the worksheet".to_owned(),
                    ).into());
                }
                row_count = row;
                col_count = col + 1;
                kind = CellType::from_attribute(event.get_attribute_value("t")?.as_deref());
                value.clear();
            }
            Event::Start(event) if event.name() == TAG_INLINE_STRING => {
                value = read_string_value(&mut reader, TAG_INLINE_STRING, false)?;
            }
            Event::Start(event) if event.name() == TAG_VALUE => {
                value = read_string_value(&mut reader, TAG_VALUE, true)?;
            }
            Event::End(event) if !value.is_empty() && event.name() == TAG_CELL => {
                let cell = Cell {
                    row,
                    col,
                    kind,
                    value: std::mem::take(&mut value),
                };
                if kind == CellType::Error {
                    return Err(SpreadsheetError::CellValueError(
                        self.name.to_owned(),
                        sheet_name.to_owned(),
                        cell.reference(),
                        cell.value,
                    ).into());
                }
                cells.push(cell);
            },
        });
        Ok(cells)
    }
}

impl<RS: Read + Seek> Spreadsheet for XlsxSpreadsheet<RS> {
    fn name(&self) -> String {
        self.name.to_owned()
    }

    fn sheet_names(&self) -> Vec<String> {
        self.sheets.iter().map(|(name, _)| name.to_owned()).collect()
    }

    /// Reads the first worksheet in workbook order
    fn read_first_sheet(&mut self) -> Result<Sheet, Sheet2LuaError> {
        let (sheet_name, zip_path) = self.sheets
            .first()
            .cloned()
            .ok_or_else(|| SpreadsheetError::SpreadsheetEmptyError(self.name.to_owned()))?;
        let shared_strings = self.load_shared_strings()?;
        let cells = self.read_cells(&sheet_name, &zip_path)?;

        let mut sheet = Sheet::new(&self.name, &sheet_name);
        for cell in cells {
            let text = cell.text(&shared_strings).ok_or_else(|| {
                SpreadsheetError::CellValueError(
                    self.name.to_owned(),
                    sheet_name.to_owned(),
                    cell.reference(),
                    format!("shared string '{}' not found", cell.value),
                )
            })?;
            sheet.push(cell.row, cell.col, text);
        }
        sheet.finish();
        Ok(sheet)
    }
}

/// Loads worksheet names and their part paths from `xl/workbook.xml`
fn load_workbook<RS: Read + Seek>(zip: &mut ZipArchive<RS>) -> Result<Vec<(String, String)>, Sheet2LuaError> {
    let relationships = load_relationships(zip, "xl/_rels/workbook.xml.rels")?;
    let mut reader = zip.xml_reader("xl/workbook.xml")?
        .ok_or_else(|| SpreadsheetError::FileError("xl/workbook.xml".to_string()))?;
    let mut sheets: Vec<(String, String)> = Vec::new();
    match_xml_events!(reader => {
        Event::Start(event) if event.name() == TAG_SHEET => {
            let mut name = None::<Cow<str>>;
            let mut id = None::<Cow<str>>;
            for result in event.attributes() {
                let attribute = result?;
                let key = attribute.key.local_name();
                if key.as_ref() == b"name" {
                    name = Some(attribute.unescape_value()?);
                } else if key.as_ref() == b"id" {
                    id = Some(attribute.unescape_value()?);
                }
            }
            if let Some((name, id)) = name.zip(id) {
                if let Some(path) = relationships.get(id.as_ref()) {
                    sheets.push((name.to_string(), path.to_owned()));
                }
            }
        }
    });
    Ok(sheets)
}

/// Maps relationship ids to worksheet part paths
fn load_relationships<RS: Read + Seek>(zip: &mut ZipArchive<RS>, path: &str) -> Result<HashMap<String, String>, Sheet2LuaError> {
    let mut reader = zip.xml_reader(path)?
        .ok_or_else(|| SpreadsheetError::FileError(path.to_string()))?;
    let mut relationships: HashMap<String, String> = HashMap::new();
    match_xml_events!(reader => {
        Event::Start(event) if event.local_name().as_ref() == TAG_RELATIONSHIP => {
            let id = event.get_attribute_value("Id")?;
            let kind = event.get_attribute_value("Type")?;
            let target = event.get_attribute_value("Target")?;
            // Only worksheet relationships
            if kind.map(|it| it.ends_with("/worksheet")).unwrap_or(true) {
                if let Some((id, target)) = id.zip(target) {
                    relationships.insert(id.to_string(), to_zip_path(&target));
                }
            }
        }
    });
    Ok(relationships)
}

/// Normalizes a relationship target to a path inside the archive
fn to_zip_path(path: &str) -> String {
    if let Some(stripped) = path.strip_prefix('/') {
        stripped.to_string()
    } else if path.starts_with("xl/") {
        path.to_string()
    } else {
        format!("xl/{path}")
    }
}

/// Reads string content up to `end_tag`, skipping phonetic runs
fn read_string_value<RS: Read + Seek>(
    reader: &mut XmlReader<BufReader<ZipFile<'_, RS>>>,
    end_tag: QName,
    is_text_content: bool,
) -> Result<String, Sheet2LuaError> {
    let mut is_phonetic_text = false;
    let mut is_text = is_text_content;
    let mut text = String::new();
    match_xml_events!(reader => {
        Event::End(event) if event.name() == end_tag => break,
        Event::Start(event) if event.name() == TAG_PHONETIC_TEXT => is_phonetic_text = true,
        Event::End(event) if event.name() == TAG_PHONETIC_TEXT => is_phonetic_text = false,
        Event::Start(event) if !is_phonetic_text && event.name() == TAG_TEXT => is_text = true,
        Event::End(event) if is_text && event.name() == TAG_TEXT => is_text = false,
        Event::Text(event) if is_text => text.push_str(&event.xml_content()?),
        Event::CData(event) if is_text => text.push_str(&event.xml_content()?),
        Event::GeneralRef(event) if is_text => text.push_bytes_ref(&event)?,
    });
    Ok(text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;
    use std::io::Write;
    use zip::write::SimpleFileOptions;
    use zip::ZipWriter;

    const WORKBOOK: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<workbook xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships">
<sheets><sheet name="Items" sheetId="1" r:id="rId1"/><sheet name="Notes" sheetId="2" r:id="rId2"/></sheets>
</workbook>"#;

    const RELATIONSHIPS: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
<Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet" Target="worksheets/sheet1.xml"/>
<Relationship Id="rId2" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet" Target="/xl/worksheets/sheet2.xml"/>
<Relationship Id="rId3" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/styles" Target="styles.xml"/>
</Relationships>"#;

    const SHARED_STRINGS: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<sst xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" count="3" uniqueCount="3">
<si><t>id:number</t></si><si><r><t>label</t></r><r><t>:string</t></r></si><si><t>Potion</t><rPh><t>ぽ</t></rPh></si>
</sst>"#;

    const SHEET1: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<worksheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main"><sheetData>
<row r="1"><c r="A1" t="inlineStr"><is><t>description &amp; notes</t></is></c></row>
<row r="2"><c r="A2" t="s"><v>0</v></c><c r="B2" t="s"><v>1</v></c><c r="C2" t="str"><v>flag:bool</v></c></row>
<row r="3"><c r="A3"><v>7</v></c><c r="B3" t="s"><v>2</v></c><c r="C3" t="b"><v>1</v></c></row>
<row r="5"><c r="A5" s="1"/><c r="B5"><v>0.10000000000000001</v></c></row>
</sheetData></worksheet>"#;

    fn workbook(parts: &[(&str, &str)]) -> XlsxSpreadsheet<Cursor<Vec<u8>>> {
        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
        for (name, content) in parts {
            writer.start_file(*name, SimpleFileOptions::default()).unwrap();
            writer.write_all(content.as_bytes()).unwrap();
        }
        let cursor = writer.finish().unwrap();
        XlsxSpreadsheet::from_reader("items.xlsx", Cursor::new(cursor.into_inner())).unwrap()
    }

    #[test]
    fn workbook_sheet_order() {
        let spreadsheet = workbook(&[
            ("xl/workbook.xml", WORKBOOK),
            ("xl/_rels/workbook.xml.rels", RELATIONSHIPS),
        ]);
        assert_eq!(spreadsheet.sheet_names(), vec!["Items", "Notes"]);
        assert_eq!(spreadsheet.sheets[0].1, "xl/worksheets/sheet1.xml");
        assert_eq!(spreadsheet.sheets[1].1, "xl/worksheets/sheet2.xml");
    }

    #[test]
    fn read_first_sheet_rows() {
        let mut spreadsheet = workbook(&[
            ("xl/workbook.xml", WORKBOOK),
            ("xl/_rels/workbook.xml.rels", RELATIONSHIPS),
            ("xl/sharedStrings.xml", SHARED_STRINGS),
            ("xl/worksheets/sheet1.xml", SHEET1),
        ]);
        let sheet = spreadsheet.read_first_sheet().unwrap();

        assert_eq!(sheet.name(), "Items");
        assert_eq!(sheet.rows().len(), 5);
        assert_eq!(sheet.row(0).unwrap(), ["description & notes", "", ""]);
        assert_eq!(sheet.row(1).unwrap(), ["id:number", "label:string", "flag:bool"]);
        assert_eq!(sheet.row(2).unwrap(), ["7", "Potion", "1"]);
        assert!(sheet.row(3).unwrap().is_empty());
        assert_eq!(sheet.row(4).unwrap(), ["", "0.10000000000000001", ""]);
    }

    #[test]
    fn error_cell_is_rejected() {
        let mut spreadsheet = workbook(&[
            ("xl/workbook.xml", WORKBOOK),
            ("xl/_rels/workbook.xml.rels", RELATIONSHIPS),
            ("xl/worksheets/sheet1.xml", r#"<worksheet><sheetData><row r="1"><c r="B1" t="e"><v>#DIV/0!</v></c></row></sheetData></worksheet>"#),
        ]);
        let error = spreadsheet.read_first_sheet().unwrap_err();
        assert!(error.to_string().contains("B1"), "{error}");
    }

    #[test]
    fn reference_outside_worksheet_is_rejected() {
        for reference in ["AAAAAAAAAAAAAAAAAAAAAAAAA1", "A999999999", "XFE1"] {
            let sheet = format!(
                r#"<worksheet><sheetData><row r="1"><c r="{reference}"><v>1</v></c></row></sheetData></worksheet>"#
            );
            let mut spreadsheet = workbook(&[
                ("xl/workbook.xml", WORKBOOK),
                ("xl/_rels/workbook.xml.rels", RELATIONSHIPS),
                ("xl/worksheets/sheet1.xml", sheet.as_str()),
            ]);
            let error = spreadsheet.read_first_sheet().unwrap_err();
            assert!(error.to_string().contains(reference), "{error}");
            assert!(error.to_string().contains("outside the worksheet"), "{error}");
        }
    }

    #[test]
    fn workbook_without_sheets_is_rejected() {
        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
        writer.start_file("xl/workbook.xml", SimpleFileOptions::default()).unwrap();
        writer.write_all(b"<workbook><sheets/></workbook>").unwrap();
        writer.start_file("xl/_rels/workbook.xml.rels", SimpleFileOptions::default()).unwrap();
        writer.write_all(b"<Relationships/>").unwrap();
        let cursor = writer.finish().unwrap();
        let result = XlsxSpreadsheet::from_reader("empty.xlsx", Cursor::new(cursor.into_inner()));
        assert!(result.is_err());
    }
}
