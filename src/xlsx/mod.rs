//! XLSX (Excel) workbook writing and reading.
//!
//! The writer produces the output workbooks; the reader loads a workbook
//! back into named sheets of string rows, which is how written reports are
//! inspected and verified.
//!
//! # Example
//!
//! ```no_run
//! use ecucsheet::xlsx::WorkbookReader;
//!
//! let reader = WorkbookReader::open("containers.xlsx")?;
//! for sheet in reader.read_all()? {
//!     println!("{}: {} rows", sheet.name, sheet.rows.len());
//! }
//! # Ok::<(), ecucsheet::Error>(())
//! ```

mod reader;
mod shared_strings;
mod writer;

pub use reader::{SheetData, WorkbookReader};
pub use shared_strings::{SharedStrings, SharedStringsBuilder};
pub use writer::{validate_sheet_name, Workbook, Worksheet, MAX_SHEET_NAME_LEN};

/// SpreadsheetML main namespace.
pub(crate) const SPREADSHEETML_NS: &str =
    "http://schemas.openxmlformats.org/spreadsheetml/2006/main";

/// Column letters for a zero-based column index (0 → "A", 26 → "AA").
pub fn column_name(mut index: usize) -> String {
    let mut letters = Vec::new();
    loop {
        letters.push(b'A' + (index % 26) as u8);
        if index < 26 {
            break;
        }
        index = index / 26 - 1;
    }
    letters.reverse();
    String::from_utf8_lossy(&letters).into_owned()
}

/// Zero-based column index of a cell reference such as `"AB12"`.
///
/// Returns `None` when the reference has no column letters.
pub fn column_index(cell_ref: &str) -> Option<usize> {
    let letters: Vec<u8> = cell_ref
        .bytes()
        .take_while(|b| b.is_ascii_alphabetic())
        .map(|b| b.to_ascii_uppercase())
        .collect();
    if letters.is_empty() {
        return None;
    }
    let number = letters
        .iter()
        .fold(0usize, |acc, &b| acc * 26 + (b - b'A' + 1) as usize);
    Some(number - 1)
}
