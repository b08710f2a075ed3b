//! ZIP container abstraction for OOXML packages.

use crate::decode::decode_xml_bytes;
use crate::error::{Error, Result};
use std::cell::RefCell;
use std::fs::File;
use std::io::{BufReader, Cursor, Read, Seek};
use std::path::Path;

/// OOXML container over a ZIP archive held in memory.
///
/// Provides read access to the XML parts of a package.
#[derive(Debug)]
pub struct OoxmlContainer {
    archive: RefCell<zip::ZipArchive<Cursor<Vec<u8>>>>,
}

impl OoxmlContainer {
    /// Open an OOXML container from a file path.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use ecucsheet::container::OoxmlContainer;
    ///
    /// let container = OoxmlContainer::open("containers.xlsx")?;
    /// assert!(container.exists("xl/workbook.xml"));
    /// # Ok::<(), ecucsheet::Error>(())
    /// ```
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::open(path.as_ref())?;
        Self::from_reader(BufReader::new(file))
    }

    /// Create an OOXML container from a byte vector.
    pub fn from_bytes(data: Vec<u8>) -> Result<Self> {
        let archive = zip::ZipArchive::new(Cursor::new(data))?;
        Ok(Self {
            archive: RefCell::new(archive),
        })
    }

    /// Create an OOXML container from a reader.
    pub fn from_reader<R: Read + Seek>(mut reader: R) -> Result<Self> {
        let mut data = Vec::new();
        reader.read_to_end(&mut data)?;
        Self::from_bytes(data)
    }

    /// Read an XML part from the archive as a string.
    ///
    /// Handles UTF-8 (with or without BOM) and UTF-16 encoded parts.
    pub fn read_xml(&self, path: &str) -> Result<String> {
        let mut archive = self.archive.borrow_mut();
        let mut file = archive
            .by_name(path)
            .map_err(|_| Error::MissingComponent(path.to_string()))?;

        let mut bytes = Vec::new();
        file.read_to_end(&mut bytes)?;

        Ok(decode_xml_bytes(&bytes)?.into_owned())
    }

    /// Check if a part exists in the archive.
    pub fn exists(&self, path: &str) -> bool {
        let archive = self.archive.borrow();
        let found = archive.file_names().any(|n| n == path);
        found
    }

    /// List all parts in the archive.
    pub fn list_files(&self) -> Vec<String> {
        let archive = self.archive.borrow();
        archive.file_names().map(String::from).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::xlsx::{Workbook, Worksheet};

    fn package() -> OoxmlContainer {
        let mut wb = Workbook::new();
        wb.add_sheet(Worksheet::new("Containers").unwrap()).unwrap();
        OoxmlContainer::from_bytes(wb.to_bytes().unwrap()).unwrap()
    }

    #[test]
    fn test_list_and_exists() {
        let container = package();
        let files = container.list_files();
        assert!(files.iter().any(|f| f == "[Content_Types].xml"));
        assert!(container.exists("xl/worksheets/sheet1.xml"));
        assert!(!container.exists("word/document.xml"));
    }

    #[test]
    fn test_read_missing_part() {
        let err = package().read_xml("xl/nope.xml").unwrap_err();
        assert!(matches!(err, Error::MissingComponent(_)));
    }

    #[test]
    fn test_read_xml() {
        let xml = package().read_xml("xl/workbook.xml").unwrap();
        assert!(xml.contains(r#"name="Containers""#));
    }
}
