//! Conversions between Excel-style cell references ("B3") and 0-based indexes.
use regex::Regex;
use std::sync::OnceLock;

/// Rows a worksheet can hold.
pub(crate) const MAX_ROWS: usize = 1_048_576;

/// Columns a worksheet can hold (`A` to `XFD`).
pub(crate) const MAX_COLS: usize = 16_384;

fn reference_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^\$?([A-Z]+)\$?(\d+)$").expect("Hardcode regex pattern"))
}

/// Whether 0-based (row, col) indexes fall inside a worksheet.
pub(crate) fn within_bounds(row: usize, col: usize) -> bool {
    row < MAX_ROWS && col < MAX_COLS
}

/// Converts column letters ("A", "AB") to a 0-based column index, `None` past `XFD`.
pub(crate) fn col_to_index(letters: &str) -> Option<usize> {
    if letters.is_empty() {
        return None;
    }
    let mut index = 0usize;
    for letter in letters.chars() {
        if !letter.is_ascii_uppercase() {
            return None;
        }
        index = index
            .checked_mul(26)?
            .checked_add(letter as usize - 'A' as usize + 1)?;
        if index > MAX_COLS {
            return None;
        }
    }
    Some(index - 1)
}

/// Converts a 1-based row number string to a 0-based row index, `None` past the last row.
pub(crate) fn row_to_index(digits: &str) -> Option<usize> {
    digits
        .parse::<usize>()
        .ok()
        .filter(|row| (1..=MAX_ROWS).contains(row))
        .map(|row| row - 1)
}

/// Parses a cell reference into 0-based (row, col) indexes.
pub(crate) fn reference_to_index(reference: &str) -> Option<(usize, usize)> {
    let reference = reference.to_ascii_uppercase();
    let captures = reference_pattern().captures(&reference)?;
    let col = captures.get(1).and_then(|matcher| col_to_index(matcher.as_str()))?;
    let row = captures.get(2).and_then(|matcher| row_to_index(matcher.as_str()))?;
    Some((row, col))
}

/// Formats 0-based (row, col) indexes as a cell reference.
pub fn index_to_reference(row: usize, col: usize) -> String {
    let mut column = col + 1;
    let mut letters = String::new();
    while column > 0 {
        column -= 1;
        letters.insert(0, (b'A' + (column % 26) as u8) as char);
        column /= 26;
    }
    format!("{}{}", letters, row + 1)
}
