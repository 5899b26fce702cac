/// A worksheet flattened into rows of cell text.
///
/// Rows that hold no value have zero cells. Every other row is padded with empty
/// strings up to the widest used column of the sheet, so a row's length only
/// falls short of the header when the sheet itself is narrower.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Sheet {
    /// Source file name
    pub(crate) file_name: String,
    /// Sheet name
    pub(crate) name: String,
    /// Collected (row, col, text) triples, drained by `finish`
    cells: Vec<(usize, usize, String)>,
    /// Dense rows, filled by `finish`
    rows: Vec<Vec<String>>,
    /// Actual data range (determined from cell data)
    row_upper_bound: Option<usize>,
    col_upper_bound: Option<usize>,
}

impl Sheet {
    /// Creates an empty sheet that collects cells through `push`.
    pub(crate) fn new(file_name: &str, name: &str) -> Self {
        Self {
            file_name: file_name.to_owned(),
            name: name.to_owned(),
            ..Self::default()
        }
    }

    /// Builds a sheet from rows that are already laid out.
    pub fn from_rows<N, R, C>(name: N, rows: R) -> Self
    where
        N: Into<String>,
        R: IntoIterator<Item = C>,
        C: IntoIterator,
        C::Item: Into<String>,
    {
        let name = name.into();
        Self {
            file_name: name.clone(),
            name,
            rows: rows
                .into_iter()
                .map(|row| row.into_iter().map(Into::into).collect())
                .collect(),
            ..Self::default()
        }
    }

    /// Workbook the sheet was read from.
    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    /// Sheet name as recorded in the workbook.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// All rows, index 0 first.
    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    /// Row at the 0-based index, `None` past the last used row.
    pub fn row(&self, index: usize) -> Option<&[String]> {
        self.rows.get(index).map(Vec::as_slice)
    }

    /// Adds a cell, ignoring empty text.
    pub(crate) fn push(&mut self, row: usize, col: usize, text: String) {
        if text.is_empty() {
            return;
        }
        self.update_bound(row, col);
        self.cells.push((row, col, text));
    }

    fn update_bound(&mut self, row: usize, col: usize) {
        if self.row_upper_bound.map(|row_upper_bound| row_upper_bound < row).unwrap_or(true) {
            self.row_upper_bound = Some(row);
        }
        if self.col_upper_bound.map(|col_upper_bound| col_upper_bound < col).unwrap_or(true) {
            self.col_upper_bound = Some(col);
        }
    }

    /// Lays the collected cells out as dense rows.
    pub(crate) fn finish(&mut self) {
        let (Some(row_upper_bound), Some(col_upper_bound)) = (self.row_upper_bound, self.col_upper_bound) else {
            return;
        };
        let width = col_upper_bound + 1;
        let mut rows = vec![Vec::<String>::new(); row_upper_bound + 1];
        for (row, col, text) in self.cells.drain(..) {
            let record = &mut rows[row];
            if record.is_empty() {
                record.resize(width, String::new());
            }
            record[col] = text;
        }
        self.rows = rows;
    }
}
