//! XLSX workbook writer.
//!
//! Produces a minimal SpreadsheetML package: one shared strings table, one
//! stylesheet with a regular and a bold cell format, and one part per
//! worksheet. All cells are strings.

use crate::error::{Error, Result};
use quick_xml::escape::escape;
use std::fmt::Write as FmtWrite;
use std::io::{Cursor, Write};
use std::path::Path;
use tempfile::NamedTempFile;
use zip::write::SimpleFileOptions;
use zip::ZipWriter;

use super::shared_strings::SharedStringsBuilder;
use super::{column_name, SPREADSHEETML_NS};

const RELATIONSHIPS_NS: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships";
const PACKAGE_RELATIONSHIPS_NS: &str =
    "http://schemas.openxmlformats.org/package/2006/relationships";
const XML_DECLARATION: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#;

/// Maximum worksheet name length accepted by Excel.
pub const MAX_SHEET_NAME_LEN: usize = 31;

/// Style index of the bold header format in `xl/styles.xml`.
const BOLD_STYLE: usize = 1;

const STYLES_XML: &str = r#"<styleSheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main"><fonts count="2"><font><sz val="11"/><name val="Calibri"/><family val="2"/></font><font><b/><sz val="11"/><name val="Calibri"/><family val="2"/></font></fonts><fills count="2"><fill><patternFill patternType="none"/></fill><fill><patternFill patternType="gray125"/></fill></fills><borders count="1"><border><left/><right/><top/><bottom/><diagonal/></border></borders><cellStyleXfs count="1"><xf numFmtId="0" fontId="0" fillId="0" borderId="0"/></cellStyleXfs><cellXfs count="2"><xf numFmtId="0" fontId="0" fillId="0" borderId="0" xfId="0"/><xf numFmtId="0" fontId="1" fillId="0" borderId="0" xfId="0" applyFont="1"/></cellXfs><cellStyles count="1"><cellStyle name="Normal" xfId="0" builtinId="0"/></cellStyles></styleSheet>"#;

/// A named worksheet of string rows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Worksheet {
    name: String,
    rows: Vec<Vec<String>>,
    /// Number of leading rows rendered in bold
    header_rows: usize,
}

impl Worksheet {
    /// Create an empty worksheet, validating the name.
    pub fn new(name: impl Into<String>) -> Result<Self> {
        let name = name.into();
        validate_sheet_name(&name)?;
        Ok(Self {
            name,
            rows: Vec::new(),
            header_rows: 0,
        })
    }

    /// Append a bold header row.
    ///
    /// Header rows must come before any data row.
    pub fn push_header<I, S>(&mut self, cells: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        debug_assert_eq!(self.header_rows, self.rows.len(), "header after data row");
        self.push_row(cells);
        self.header_rows += 1;
    }

    /// Append a data row.
    pub fn push_row<I, S>(&mut self, cells: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.rows.push(cells.into_iter().map(Into::into).collect());
    }

    /// Worksheet name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// All rows, header rows first.
    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    /// Number of header rows.
    pub fn header_rows(&self) -> usize {
        self.header_rows
    }

    fn to_xml(&self, strings: &mut SharedStringsBuilder, bold_headers: bool) -> String {
        let mut xml = String::with_capacity(256 + self.rows.len() * 96);
        xml.push_str(XML_DECLARATION);
        xml.push('\n');
        let _ = write!(
            xml,
            r#"<worksheet xmlns="{}" xmlns:r="{}">"#,
            SPREADSHEETML_NS, RELATIONSHIPS_NS
        );

        if self.rows.is_empty() {
            xml.push_str("<sheetData/>");
        } else {
            xml.push_str("<sheetData>");
            for (row_idx, row) in self.rows.iter().enumerate() {
                let row_num = row_idx + 1;
                let style = if bold_headers && row_idx < self.header_rows {
                    Some(BOLD_STYLE)
                } else {
                    None
                };

                let _ = write!(xml, r#"<row r="{}">"#, row_num);
                for (col_idx, value) in row.iter().enumerate() {
                    let sst_idx = strings.add(value);
                    let _ = write!(xml, r#"<c r="{}{}""#, column_name(col_idx), row_num);
                    if let Some(s) = style {
                        let _ = write!(xml, r#" s="{}""#, s);
                    }
                    let _ = write!(xml, r#" t="s"><v>{}</v></c>"#, sst_idx);
                }
                xml.push_str("</row>");
            }
            xml.push_str("</sheetData>");
        }

        xml.push_str("</worksheet>");
        xml
    }
}

/// Check a worksheet name against Excel's rules.
pub fn validate_sheet_name(name: &str) -> Result<()> {
    let invalid = name.is_empty()
        || name.chars().count() > MAX_SHEET_NAME_LEN
        || name.contains(['[', ']', ':', '*', '?', '/', '\\'])
        || name.starts_with('\'')
        || name.ends_with('\'');

    if invalid {
        Err(Error::InvalidSheetName(name.to_string()))
    } else {
        Ok(())
    }
}

/// An ordered collection of worksheets that can be saved as `.xlsx`.
///
/// # Example
///
/// ```no_run
/// use ecucsheet::xlsx::{Workbook, Worksheet};
///
/// let mut sheet = Worksheet::new("Containers")?;
/// sheet.push_header(["Container SHORT-NAME", "Container DEFINITION-REFERENCE"]);
/// sheet.push_row(["EcuC", "/AUTOSAR/EcuC/EcucDef"]);
///
/// let mut workbook = Workbook::new();
/// workbook.add_sheet(sheet)?;
/// workbook.save("containers.xlsx")?;
/// # Ok::<(), ecucsheet::Error>(())
/// ```
#[derive(Debug, Clone)]
pub struct Workbook {
    sheets: Vec<Worksheet>,
    bold_headers: bool,
}

impl Default for Workbook {
    fn default() -> Self {
        Self::new()
    }
}

impl Workbook {
    /// Create an empty workbook.
    pub fn new() -> Self {
        Self {
            sheets: Vec::new(),
            bold_headers: true,
        }
    }

    /// Render header rows in bold (default: true).
    pub fn with_bold_headers(mut self, bold: bool) -> Self {
        self.bold_headers = bold;
        self
    }

    /// Append a worksheet. Names must be unique, ignoring case.
    pub fn add_sheet(&mut self, sheet: Worksheet) -> Result<&mut Worksheet> {
        let taken = self
            .sheets
            .iter()
            .any(|s| s.name.to_lowercase() == sheet.name.to_lowercase());
        if taken {
            return Err(Error::InvalidSheetName(sheet.name));
        }
        self.sheets.push(sheet);
        let idx = self.sheets.len() - 1;
        Ok(&mut self.sheets[idx])
    }

    /// Worksheets in order.
    pub fn sheets(&self) -> &[Worksheet] {
        &self.sheets
    }

    /// Serialize the workbook into `.xlsx` bytes.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut strings = SharedStringsBuilder::new();
        let sheet_parts: Vec<String> = self
            .sheets
            .iter()
            .map(|sheet| sheet.to_xml(&mut strings, self.bold_headers))
            .collect();

        let mut buffer = Vec::new();
        let mut zip = ZipWriter::new(Cursor::new(&mut buffer));
        let options =
            SimpleFileOptions::default().compression_method(zip::CompressionMethod::Deflated);

        zip.start_file("[Content_Types].xml", options)?;
        zip.write_all(self.content_types_xml().as_bytes())?;

        zip.start_file("_rels/.rels", options)?;
        zip.write_all(package_rels_xml().as_bytes())?;

        zip.start_file("xl/workbook.xml", options)?;
        zip.write_all(self.workbook_xml().as_bytes())?;

        zip.start_file("xl/_rels/workbook.xml.rels", options)?;
        zip.write_all(self.workbook_rels_xml().as_bytes())?;

        zip.start_file("xl/styles.xml", options)?;
        zip.write_all(XML_DECLARATION.as_bytes())?;
        zip.write_all(b"\n")?;
        zip.write_all(STYLES_XML.as_bytes())?;

        for (idx, part) in sheet_parts.iter().enumerate() {
            zip.start_file(format!("xl/worksheets/sheet{}.xml", idx + 1), options)?;
            zip.write_all(part.as_bytes())?;
        }

        zip.start_file("xl/sharedStrings.xml", options)?;
        zip.write_all(strings.to_xml().as_bytes())?;

        zip.finish()?;
        Ok(buffer)
    }

    /// Serialize and write the workbook to `path`, replacing any existing
    /// file.
    ///
    /// The package is written to a temporary file next to `path` and renamed
    /// over it once complete, so a failed write leaves the destination as it
    /// was.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let write_error = |message: String| Error::Write {
            path: path.to_path_buf(),
            message,
        };

        let bytes = self.to_bytes().map_err(|e| write_error(e.to_string()))?;

        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        let mut file = NamedTempFile::new_in(dir).map_err(|e| write_error(e.to_string()))?;
        file.write_all(&bytes)
            .and_then(|()| file.as_file().sync_all())
            .map_err(|e| write_error(e.to_string()))?;
        // Dropping the temporary file on any error path deletes it
        file.persist(path)
            .map_err(|e| write_error(e.error.to_string()))?;
        Ok(())
    }

    fn content_types_xml(&self) -> String {
        let mut xml = String::from(XML_DECLARATION);
        xml.push('\n');
        xml.push_str(
            r#"<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/><Default Extension="xml" ContentType="application/xml"/><Override PartName="/xl/workbook.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.sheet.main+xml"/>"#,
        );
        for idx in 1..=self.sheets.len() {
            let _ = write!(
                xml,
                r#"<Override PartName="/xl/worksheets/sheet{}.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.worksheet+xml"/>"#,
                idx
            );
        }
        xml.push_str(
            r#"<Override PartName="/xl/styles.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.styles+xml"/><Override PartName="/xl/sharedStrings.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.sharedStrings+xml"/></Types>"#,
        );
        xml
    }

    fn workbook_xml(&self) -> String {
        let mut xml = String::from(XML_DECLARATION);
        xml.push('\n');
        let _ = write!(
            xml,
            r#"<workbook xmlns="{}" xmlns:r="{}"><sheets>"#,
            SPREADSHEETML_NS, RELATIONSHIPS_NS
        );
        for (idx, sheet) in self.sheets.iter().enumerate() {
            let _ = write!(
                xml,
                r#"<sheet name="{}" sheetId="{}" r:id="rId{}"/>"#,
                escape(sheet.name.as_str()),
                idx + 1,
                idx + 1
            );
        }
        xml.push_str("</sheets></workbook>");
        xml
    }

    /// Worksheets take `rId1..=rIdN`; styles and shared strings follow.
    fn workbook_rels_xml(&self) -> String {
        let count = self.sheets.len();
        let mut xml = String::from(XML_DECLARATION);
        xml.push('\n');
        let _ = write!(xml, r#"<Relationships xmlns="{}">"#, PACKAGE_RELATIONSHIPS_NS);
        for idx in 1..=count {
            let _ = write!(
                xml,
                r#"<Relationship Id="rId{}" Type="{}/worksheet" Target="worksheets/sheet{}.xml"/>"#,
                idx, RELATIONSHIPS_NS, idx
            );
        }
        let _ = write!(
            xml,
            r#"<Relationship Id="rId{}" Type="{}/styles" Target="styles.xml"/>"#,
            count + 1,
            RELATIONSHIPS_NS
        );
        let _ = write!(
            xml,
            r#"<Relationship Id="rId{}" Type="{}/sharedStrings" Target="sharedStrings.xml"/>"#,
            count + 2,
            RELATIONSHIPS_NS
        );
        xml.push_str("</Relationships>");
        xml
    }
}

fn package_rels_xml() -> String {
    format!(
        r#"{}
<Relationships xmlns="{}"><Relationship Id="rId1" Type="{}/officeDocument" Target="xl/workbook.xml"/></Relationships>"#,
        XML_DECLARATION, PACKAGE_RELATIONSHIPS_NS, RELATIONSHIPS_NS
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read;

    fn read_part(bytes: &[u8], name: &str) -> String {
        let mut archive = zip::ZipArchive::new(Cursor::new(bytes)).unwrap();
        let mut file = archive.by_name(name).unwrap();
        let mut content = String::new();
        file.read_to_string(&mut content).unwrap();
        content
    }

    #[test]
    fn test_sheet_name_validation() {
        assert!(Worksheet::new("Containers").is_ok());
        assert!(Worksheet::new("Sub-Containers").is_ok());
        assert!(Worksheet::new("").is_err());
        assert!(Worksheet::new("a/b").is_err());
        assert!(Worksheet::new("x".repeat(32)).is_err());
        assert!(Worksheet::new("x".repeat(31)).is_ok());
    }

    #[test]
    fn test_duplicate_sheet_names() {
        let mut wb = Workbook::new();
        wb.add_sheet(Worksheet::new("Data").unwrap()).unwrap();
        let err = wb.add_sheet(Worksheet::new("DATA").unwrap()).unwrap_err();
        assert!(matches!(err, Error::InvalidSheetName(_)));
    }

    #[test]
    fn test_package_parts() {
        let mut wb = Workbook::new();
        let sheet = wb.add_sheet(Worksheet::new("First").unwrap()).unwrap();
        sheet.push_header(["H1", "H2"]);
        sheet.push_row(["a", "b"]);
        wb.add_sheet(Worksheet::new("Second").unwrap()).unwrap();

        let bytes = wb.to_bytes().unwrap();

        let workbook = read_part(&bytes, "xl/workbook.xml");
        assert!(workbook.contains(r#"<sheet name="First" sheetId="1" r:id="rId1"/>"#));
        assert!(workbook.contains(r#"<sheet name="Second" sheetId="2" r:id="rId2"/>"#));

        let first = read_part(&bytes, "xl/worksheets/sheet1.xml");
        assert!(first.contains(r#"<c r="A1" s="1" t="s"><v>0</v></c>"#));
        assert!(first.contains(r#"<c r="B2" t="s"><v>3</v></c>"#));

        let second = read_part(&bytes, "xl/worksheets/sheet2.xml");
        assert!(second.contains("<sheetData/>"));

        let content_types = read_part(&bytes, "[Content_Types].xml");
        assert!(content_types.contains("/xl/worksheets/sheet2.xml"));
    }

    #[test]
    fn test_plain_headers() {
        let mut wb = Workbook::new().with_bold_headers(false);
        wb.add_sheet(Worksheet::new("S").unwrap())
            .unwrap()
            .push_header(["only"]);
        let sheet = read_part(&wb.to_bytes().unwrap(), "xl/worksheets/sheet1.xml");
        assert!(!sheet.contains(" s=\""));
    }

    #[test]
    fn test_save_into_missing_directory() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("out.xlsx");
        let err = Workbook::new().save(&path).unwrap_err();
        assert!(matches!(err, Error::Write { .. }));
        assert!(!path.exists());
    }

    #[test]
    fn test_failed_save_leaves_destination_untouched() {
        let dir = tempfile::tempdir().unwrap();
        // A directory cannot be replaced by the workbook file
        let path = dir.path().join("report.xlsx");
        std::fs::create_dir(&path).unwrap();
        std::fs::write(path.join("keep.txt"), "previous").unwrap();

        let err = Workbook::new().save(&path).unwrap_err();
        assert!(matches!(err, Error::Write { .. }));
        assert_eq!(std::fs::read_to_string(path.join("keep.txt")).unwrap(), "previous");

        let entries: Vec<_> = std::fs::read_dir(dir.path()).unwrap().collect();
        assert_eq!(entries.len(), 1, "temporary file left behind");
    }

    #[test]
    fn test_save_replaces_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.xlsx");
        std::fs::write(&path, b"stale").unwrap();

        let mut wb = Workbook::new();
        wb.add_sheet(Worksheet::new("S").unwrap())
            .unwrap()
            .push_row(["v"]);
        wb.save(&path).unwrap();

        let sheet = read_part(&std::fs::read(&path).unwrap(), "xl/worksheets/sheet1.xml");
        assert!(sheet.contains("<c r=\"A1\""));
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
    }
}
